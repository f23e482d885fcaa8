//! Reservation coordinator: the write path of the booking engine.
//!
//! Orchestrates lock acquisition, availability re-checks, inventory
//! mutation, booking state transitions, payment-gateway interaction, and
//! notification dispatch. Every other surface (HTTP handlers, payment
//! callbacks) delegates booking semantics to [`ReservationCoordinator`].

mod coordinator;
mod error;
mod outcome;

pub use coordinator::{NotificationOutcome, ReservationCoordinator};
pub use error::BookingError;
pub use outcome::{BookingOutcome, CancelOutcome, CreateBookingRequest, ModifyBookingRequest};
