//! In-process event bus backed by a `tokio::sync::broadcast` channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stayhub_core::types::DbId;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// BookingEvent
// ---------------------------------------------------------------------------

/// What happened to a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingEventKind {
    Confirmed,
    Modified,
    Cancelled,
    PaymentReceived,
}

impl BookingEventKind {
    /// Dot-separated event name for logs and payloads.
    pub fn name(self) -> &'static str {
        match self {
            BookingEventKind::Confirmed => "booking.confirmed",
            BookingEventKind::Modified => "booking.modified",
            BookingEventKind::Cancelled => "booking.cancelled",
            BookingEventKind::PaymentReceived => "payment.received",
        }
    }
}

/// A booking lifecycle event published on the bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingEvent {
    pub kind: BookingEventKind,
    pub booking_id: DbId,
    pub room_id: DbId,
    pub user_id: DbId,
    /// Guest address notification emails go to.
    pub guest_email: String,
    /// Free-form JSON payload carrying event-specific data
    /// (amounts, reasons, new dates).
    pub payload: serde_json::Value,
    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl BookingEvent {
    /// Create an event with an empty payload.
    pub fn new(
        kind: BookingEventKind,
        booking_id: DbId,
        room_id: DbId,
        user_id: DbId,
        guest_email: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            booking_id,
            room_id,
            user_id,
            guest_email: guest_email.into(),
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// Set the JSON payload for the event.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`BookingEvent`].
pub struct EventBus {
    sender: broadcast::Sender<BookingEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: BookingEvent) {
        // Ignore the SendError -- it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<BookingEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
