//! Fire-and-forget notification dispatch.
//!
//! [`Notifier`] is the collaborator interface the coordinator calls after a
//! state change commits. Every send publishes a [`BookingEvent`] on the bus
//! and, when SMTP is configured, spawns the email delivery. Failures here
//! are logged and swallowed: a notification problem must never roll back or
//! block a booking state change.

use std::sync::Arc;

use crate::bus::{BookingEvent, BookingEventKind, EventBus};
use crate::email::EmailDelivery;

/// Dispatches booking notifications without blocking the caller.
pub struct Notifier {
    bus: Arc<EventBus>,
    email: Option<Arc<EmailDelivery>>,
}

impl Notifier {
    /// Build a notifier. `email` is `None` when SMTP is not configured;
    /// events are still published on the bus.
    pub fn new(bus: Arc<EventBus>, email: Option<Arc<EmailDelivery>>) -> Self {
        Self { bus, email }
    }

    /// Notifier that only publishes bus events. Used by tests and
    /// deployments without SMTP.
    pub fn bus_only(bus: Arc<EventBus>) -> Self {
        Self { bus, email: None }
    }

    pub fn send_booking_confirmation(&self, event: BookingEvent) {
        debug_assert_eq!(event.kind, BookingEventKind::Confirmed);
        self.dispatch(event);
    }

    pub fn send_booking_modification(&self, event: BookingEvent) {
        debug_assert_eq!(event.kind, BookingEventKind::Modified);
        self.dispatch(event);
    }

    pub fn send_booking_cancellation(&self, event: BookingEvent) {
        debug_assert_eq!(event.kind, BookingEventKind::Cancelled);
        self.dispatch(event);
    }

    pub fn send_payment_receipt(&self, event: BookingEvent) {
        debug_assert_eq!(event.kind, BookingEventKind::PaymentReceived);
        self.dispatch(event);
    }

    fn dispatch(&self, event: BookingEvent) {
        self.bus.publish(event.clone());

        if let Some(email) = &self.email {
            let email = Arc::clone(email);
            tokio::spawn(async move {
                if let Err(err) = email.deliver(&event).await {
                    tracing::warn!(
                        booking_id = event.booking_id,
                        event = event.kind.name(),
                        error = %err,
                        "Booking email delivery failed"
                    );
                }
            });
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
