//! Room entity model.

use serde::Serialize;
use sqlx::FromRow;
use stayhub_core::types::{DbId, Timestamp};

/// A row from the `rooms` table.
///
/// `available_count` is the shared inventory counter; it is mutated only by
/// the reservation coordinator (atomic decrement under the reservation
/// lock, increment on cancellation) and always satisfies
/// `0 <= available_count <= total_count`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Room {
    pub id: DbId,
    pub hotel_id: DbId,
    pub name: String,
    pub capacity: i32,
    /// Minor currency units per night.
    pub nightly_price: i64,
    pub available_count: i32,
    pub total_count: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
