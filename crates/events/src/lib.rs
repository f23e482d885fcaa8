//! Booking event bus and notification dispatch.
//!
//! - [`EventBus`] -- in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`BookingEvent`] -- the canonical booking event envelope.
//! - [`email`] -- SMTP delivery of guest-facing booking emails.
//! - [`Notifier`] -- fire-and-forget dispatch facade used by the
//!   coordinator; delivery failures are logged and never propagated into
//!   booking state changes.

pub mod bus;
pub mod email;
pub mod notifier;

pub use bus::{BookingEvent, BookingEventKind, EventBus};
pub use email::{EmailConfig, EmailDelivery};
pub use notifier::Notifier;
