//! Request and outcome DTOs for coordinator operations.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use stayhub_core::types::DbId;
use stayhub_db::models::booking::Booking;

/// Inputs for creating a reservation.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingRequest {
    pub room_id: DbId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: Option<String>,
    pub guest_count: i32,
    /// Client IP forwarded to the payment gateway; defaults to loopback
    /// when the transport does not supply one.
    #[serde(default)]
    pub client_ip: Option<String>,
}

/// Date/guest-count deltas for modifying a confirmed booking.
///
/// Omitted fields keep their current values. A date change triggers the
/// lock-guarded conflict re-scan; a guest-count-only change does not.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModifyBookingRequest {
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub guest_count: Option<i32>,
}

impl ModifyBookingRequest {
    /// Whether the request changes the stay dates.
    pub fn changes_dates(&self) -> bool {
        self.check_in.is_some() || self.check_out.is_some()
    }
}

/// Result of creating a reservation.
#[derive(Debug, Serialize)]
pub struct BookingOutcome {
    pub booking: Booking,
    /// Redirect URL to the payment provider; `None` in instant-confirm
    /// mode, when payments are not configured, or when minting the intent
    /// failed (degraded outcome, booking still stands).
    pub payment_url: Option<String>,
}

/// Result of cancelling a booking.
#[derive(Debug, Serialize)]
pub struct CancelOutcome {
    pub booking: Booking,
    /// Amount refunded in minor units, when a refund was performed.
    pub refunded_amount: Option<i64>,
}
