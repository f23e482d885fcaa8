//! Domain core for the stayhub reservation engine.
//!
//! Pure booking logic with zero internal dependencies: the booking and
//! payment state machines, interval overlap rules, pricing, lock key
//! derivation, and the [`lock::LockStore`] seam that the coordinator
//! acquires mutual exclusion through.

pub mod booking;
pub mod config;
pub mod error;
pub mod lock;
pub mod types;
