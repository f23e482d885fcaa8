//! Booking entity model and write DTOs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use stayhub_core::booking::{BookingStatus, PaymentStatus};
use stayhub_core::error::CoreError;
use stayhub_core::types::{DbId, Timestamp};

/// A row from the `bookings` table.
///
/// Status columns are TEXT; use [`Booking::status`] / [`Booking::payment_status`]
/// to get the typed state-machine values.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Booking {
    pub id: DbId,
    pub user_id: DbId,
    pub room_id: DbId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub nights: i32,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: Option<String>,
    pub guest_count: i32,
    pub total_price: i64,
    #[sqlx(rename = "status")]
    #[serde(rename = "status")]
    pub status_text: String,
    #[sqlx(rename = "payment_status")]
    #[serde(rename = "payment_status")]
    pub payment_status_text: String,
    pub payment_ref: Option<String>,
    pub transaction_no: Option<String>,
    pub cancel_reason: Option<String>,
    pub cancelled_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Booking {
    /// Typed booking status.
    pub fn status(&self) -> Result<BookingStatus, CoreError> {
        BookingStatus::parse(&self.status_text)
    }

    /// Typed payment status.
    pub fn payment_status(&self) -> Result<PaymentStatus, CoreError> {
        PaymentStatus::parse(&self.payment_status_text)
    }
}

/// Insert payload for a new booking row.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub user_id: DbId,
    pub room_id: DbId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub nights: i32,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: Option<String>,
    pub guest_count: i32,
    pub total_price: i64,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
}

/// Date/guest changes applied by the modify path.
#[derive(Debug, Clone)]
pub struct BookingStayUpdate {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub nights: i32,
    pub guest_count: i32,
    pub total_price: i64,
}

/// Query parameters for listing a user's bookings.
#[derive(Debug, Deserialize)]
pub struct BookingListQuery {
    /// Filter by status text (`pending`, `confirmed`, `cancelled`).
    pub status: Option<String>,
    /// Maximum number of results. Defaults to 50, capped at 100.
    pub limit: Option<i64>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<i64>,
}
