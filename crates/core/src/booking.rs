//! Booking lifecycle rules: status state machines, stay-interval overlap,
//! and flat nightly pricing.
//!
//! Everything here is pure so the coordinator and the repository layer can
//! share one source of truth for what a legal booking looks like.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::StayDate;

// ---------------------------------------------------------------------------
// Booking status
// ---------------------------------------------------------------------------

/// Lifecycle status of a booking, stored as TEXT in the `bookings` table.
///
/// ```text
/// Pending --(payment confirmed)--> Confirmed --(cancel)--> Cancelled
/// Pending --(instant reserve)----> Confirmed
/// ```
///
/// `Cancelled` is terminal; no transition leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    /// Database representation (TEXT column value).
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// Parse the TEXT column value back into a status.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(CoreError::Internal(format!(
                "unknown booking status '{other}'"
            ))),
        }
    }

    /// Whether a booking in this status still holds inventory and therefore
    /// participates in the overlap conflict scan.
    pub fn holds_inventory(self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    /// Check that confirming is legal from this status.
    ///
    /// `Confirmed` is *not* an error here because confirmation is idempotent
    /// (a duplicate gateway callback must not fail); callers short-circuit
    /// on `AlreadyDone`.
    pub fn check_confirm(self) -> Result<Transition, CoreError> {
        match self {
            BookingStatus::Pending => Ok(Transition::Apply),
            BookingStatus::Confirmed => Ok(Transition::AlreadyDone),
            BookingStatus::Cancelled => Err(CoreError::Precondition(
                "cannot confirm a cancelled booking".into(),
            )),
        }
    }

    /// Check that the customer-facing cancel path is legal from this status.
    ///
    /// Only confirmed bookings can be cancelled through that path.
    pub fn check_cancel(self) -> Result<(), CoreError> {
        match self {
            BookingStatus::Confirmed => Ok(()),
            BookingStatus::Pending => Err(CoreError::Precondition(
                "booking must be confirmed before it can be cancelled".into(),
            )),
            BookingStatus::Cancelled => Err(CoreError::Precondition(
                "booking is already cancelled".into(),
            )),
        }
    }

    /// Check that modification is legal from this status.
    pub fn check_modify(self) -> Result<(), CoreError> {
        match self {
            BookingStatus::Confirmed => Ok(()),
            other => Err(CoreError::Precondition(format!(
                "only confirmed bookings can be modified (status is {})",
                other.as_str()
            ))),
        }
    }
}

/// Outcome of an idempotent transition check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The transition should be applied.
    Apply,
    /// The booking is already in the target state; treat as success.
    AlreadyDone,
}

// ---------------------------------------------------------------------------
// Payment status
// ---------------------------------------------------------------------------

/// Payment axis, independent of [`BookingStatus`].
///
/// `Pending -> Completed -> Refunded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "completed" => Ok(PaymentStatus::Completed),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(CoreError::Internal(format!(
                "unknown payment status '{other}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Stay interval
// ---------------------------------------------------------------------------

/// A half-open stay interval `[check_in, check_out)`.
///
/// Half-open means back-to-back stays share a day without conflicting:
/// one guest's checkout date is the next guest's checkin date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StayInterval {
    pub check_in: StayDate,
    pub check_out: StayDate,
}

impl StayInterval {
    /// Build a validated interval. Fails unless `check_out > check_in`.
    pub fn new(check_in: StayDate, check_out: StayDate) -> Result<Self, CoreError> {
        if check_out <= check_in {
            return Err(CoreError::Validation(
                "check-out date must be after check-in date".into(),
            ));
        }
        Ok(Self {
            check_in,
            check_out,
        })
    }

    /// Standard interval-intersection test for half-open intervals:
    /// `a.start < b.end && a.end > b.start`.
    pub fn overlaps(&self, other: &StayInterval) -> bool {
        self.check_in < other.check_out && self.check_out > other.check_in
    }

    /// Number of nights in the stay.
    pub fn nights(&self) -> i32 {
        (self.check_out - self.check_in).num_days() as i32
    }
}

/// Total price for a stay: flat nightly rate times night count.
///
/// Prices are integer minor units (e.g. cents); no rate plans, no
/// seasonal adjustment.
pub fn total_price(nightly_price: i64, interval: &StayInterval) -> i64 {
    nightly_price * i64::from(interval.nights())
}

// ---------------------------------------------------------------------------
// Guest details
// ---------------------------------------------------------------------------

/// Guest identity captured on a booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuestDetails {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub guest_count: i32,
}

impl GuestDetails {
    /// Validate guest details against the room's capacity.
    pub fn validate(&self, room_capacity: i32) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::Validation("guest name is required".into()));
        }
        if !self.email.contains('@') {
            return Err(CoreError::Validation("guest email is invalid".into()));
        }
        if self.guest_count < 1 {
            return Err(CoreError::Validation(
                "guest count must be at least 1".into(),
            ));
        }
        if self.guest_count > room_capacity {
            return Err(CoreError::Validation(format!(
                "guest count {} exceeds room capacity {}",
                self.guest_count, room_capacity
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> StayDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn interval(a: StayDate, b: StayDate) -> StayInterval {
        StayInterval::new(a, b).unwrap()
    }

    // -- Interval overlap --------------------------------------------------

    #[test]
    fn back_to_back_stays_do_not_conflict() {
        let a = interval(d(2026, 2, 1), d(2026, 2, 3));
        let b = interval(d(2026, 2, 3), d(2026, 2, 5));
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn overlapping_stays_conflict() {
        let a = interval(d(2026, 2, 1), d(2026, 2, 3));
        let c = interval(d(2026, 2, 2), d(2026, 2, 4));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&a));
    }

    #[test]
    fn contained_stay_conflicts() {
        let outer = interval(d(2026, 2, 1), d(2026, 2, 10));
        let inner = interval(d(2026, 2, 4), d(2026, 2, 5));
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
    }

    #[test]
    fn identical_stays_conflict() {
        let a = interval(d(2026, 2, 1), d(2026, 2, 3));
        assert!(a.overlaps(&a.clone()));
    }

    #[test]
    fn disjoint_stays_do_not_conflict() {
        let a = interval(d(2026, 2, 1), d(2026, 2, 3));
        let b = interval(d(2026, 2, 10), d(2026, 2, 12));
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn interval_rejects_inverted_and_zero_length() {
        assert!(StayInterval::new(d(2026, 2, 3), d(2026, 2, 1)).is_err());
        assert!(StayInterval::new(d(2026, 2, 3), d(2026, 2, 3)).is_err());
    }

    // -- Pricing -----------------------------------------------------------

    #[test]
    fn two_night_stay_costs_twice_nightly() {
        let stay = interval(d(2026, 3, 1), d(2026, 3, 3));
        assert_eq!(stay.nights(), 2);
        assert_eq!(total_price(120_000, &stay), 240_000);
    }

    #[test]
    fn single_night_stay() {
        let stay = interval(d(2026, 3, 1), d(2026, 3, 2));
        assert_eq!(stay.nights(), 1);
        assert_eq!(total_price(99_00, &stay), 99_00);
    }

    // -- State machine -----------------------------------------------------

    #[test]
    fn pending_confirms() {
        assert_eq!(
            BookingStatus::Pending.check_confirm().unwrap(),
            Transition::Apply
        );
    }

    #[test]
    fn confirm_is_idempotent() {
        assert_eq!(
            BookingStatus::Confirmed.check_confirm().unwrap(),
            Transition::AlreadyDone
        );
    }

    #[test]
    fn cancelled_cannot_confirm() {
        assert!(BookingStatus::Cancelled.check_confirm().is_err());
    }

    #[test]
    fn only_confirmed_cancels() {
        assert!(BookingStatus::Confirmed.check_cancel().is_ok());
        assert!(BookingStatus::Pending.check_cancel().is_err());
        assert!(BookingStatus::Cancelled.check_cancel().is_err());
    }

    #[test]
    fn only_confirmed_modifies() {
        assert!(BookingStatus::Confirmed.check_modify().is_ok());
        assert!(BookingStatus::Pending.check_modify().is_err());
        assert!(BookingStatus::Cancelled.check_modify().is_err());
    }

    #[test]
    fn status_round_trips_through_text() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Cancelled,
        ] {
            assert_eq!(BookingStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(BookingStatus::parse("deleted").is_err());
    }

    #[test]
    fn pending_and_confirmed_hold_inventory() {
        assert!(BookingStatus::Pending.holds_inventory());
        assert!(BookingStatus::Confirmed.holds_inventory());
        assert!(!BookingStatus::Cancelled.holds_inventory());
    }

    // -- Guest validation --------------------------------------------------

    fn guest(count: i32) -> GuestDetails {
        GuestDetails {
            name: "Ana Petrova".into(),
            email: "ana@example.com".into(),
            phone: None,
            guest_count: count,
        }
    }

    #[test]
    fn guest_count_within_capacity_passes() {
        assert!(guest(2).validate(2).is_ok());
    }

    #[test]
    fn guest_count_over_capacity_fails() {
        assert!(guest(3).validate(2).is_err());
    }

    #[test]
    fn zero_guests_fail() {
        assert!(guest(0).validate(2).is_err());
    }
}
