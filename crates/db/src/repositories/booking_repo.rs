//! Repository for the `bookings` table.
//!
//! State transitions are guarded in SQL (`WHERE status = ...`) in addition
//! to the coordinator's state-machine checks, so a racing confirm/cancel on
//! the same row resolves to exactly one applied transition.

use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};
use stayhub_core::booking::{BookingStatus, PaymentStatus};
use stayhub_core::types::DbId;

use crate::models::booking::{Booking, BookingListQuery, BookingStayUpdate, NewBooking};

/// Column list for `bookings` queries.
const COLUMNS: &str = "id, user_id, room_id, check_in, check_out, nights, \
                       guest_name, guest_email, guest_phone, guest_count, total_price, \
                       status, payment_status, payment_ref, transaction_no, \
                       cancel_reason, cancelled_at, created_at, updated_at";

/// Provides CRUD and state transitions for bookings.
pub struct BookingRepo;

impl BookingRepo {
    /// Insert a booking row inside an open transaction, returning the row.
    pub async fn create(
        conn: &mut PgConnection,
        new: &NewBooking,
    ) -> Result<Booking, sqlx::Error> {
        let query = format!(
            "INSERT INTO bookings \
             (user_id, room_id, check_in, check_out, nights, guest_name, guest_email, \
              guest_phone, guest_count, total_price, status, payment_status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Booking>(&query)
            .bind(new.user_id)
            .bind(new.room_id)
            .bind(new.check_in)
            .bind(new.check_out)
            .bind(new.nights)
            .bind(&new.guest_name)
            .bind(&new.guest_email)
            .bind(&new.guest_phone)
            .bind(new.guest_count)
            .bind(new.total_price)
            .bind(new.status.as_str())
            .bind(new.payment_status.as_str())
            .fetch_one(conn)
            .await
    }

    /// Fetch a booking by id.
    pub async fn find_by_id(
        pool: &PgPool,
        booking_id: DbId,
    ) -> Result<Option<Booking>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM bookings WHERE id = $1");
        sqlx::query_as::<_, Booking>(&query)
            .bind(booking_id)
            .fetch_optional(pool)
            .await
    }

    /// Availability conflict scan: does any pending/confirmed booking on
    /// this room overlap the half-open interval `[check_in, check_out)`?
    ///
    /// Back-to-back stays (`existing.check_out = check_in`) do not match.
    /// `exclude_booking_id` removes the booking's own row from the scan on
    /// the modify path.
    ///
    /// Must be re-executed while the reservation lock is held; any earlier
    /// run is advisory only.
    pub async fn has_conflict(
        conn: &mut PgConnection,
        room_id: DbId,
        check_in: NaiveDate,
        check_out: NaiveDate,
        exclude_booking_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS ( \
                SELECT 1 FROM bookings \
                WHERE room_id = $1 \
                  AND status IN ('pending', 'confirmed') \
                  AND check_in < $3 \
                  AND check_out > $2 \
                  AND ($4::BIGINT IS NULL OR id <> $4) \
             )",
        )
        .bind(room_id)
        .bind(check_in)
        .bind(check_out)
        .bind(exclude_booking_id)
        .fetch_one(conn)
        .await
    }

    /// Persist the latest payment-intent reference on a booking.
    pub async fn set_payment_ref(
        pool: &PgPool,
        booking_id: DbId,
        payment_ref: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE bookings SET payment_ref = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(booking_id)
        .bind(payment_ref)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Apply the pending -> confirmed transition, stamping the transaction
    /// number and completing payment.
    ///
    /// Returns `true` if this call applied the transition, `false` if the
    /// booking was no longer pending (already confirmed by a racing path,
    /// or cancelled). The SQL guard makes duplicate callbacks harmless.
    pub async fn confirm(
        conn: &mut PgConnection,
        booking_id: DbId,
        transaction_no: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE bookings \
             SET status = $2, payment_status = $3, transaction_no = $4, updated_at = NOW() \
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(booking_id)
        .bind(BookingStatus::Confirmed.as_str())
        .bind(PaymentStatus::Completed.as_str())
        .bind(transaction_no)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Apply the confirmed -> cancelled transition with audit fields.
    ///
    /// Returns `true` if this call applied the transition.
    pub async fn cancel(
        conn: &mut PgConnection,
        booking_id: DbId,
        reason: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE bookings \
             SET status = 'cancelled', cancel_reason = $2, cancelled_at = NOW(), \
                 updated_at = NOW() \
             WHERE id = $1 AND status = 'confirmed'",
        )
        .bind(booking_id)
        .bind(reason)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Flip payment status to refunded after a successful gateway refund.
    pub async fn mark_refunded(pool: &PgPool, booking_id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE bookings \
             SET payment_status = 'refunded', updated_at = NOW() \
             WHERE id = $1 AND payment_status = 'completed'",
        )
        .bind(booking_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Apply a stay change (dates, nights, guest count, price) from the
    /// modify path.
    pub async fn update_stay(
        conn: &mut PgConnection,
        booking_id: DbId,
        update: &BookingStayUpdate,
    ) -> Result<Booking, sqlx::Error> {
        let query = format!(
            "UPDATE bookings \
             SET check_in = $2, check_out = $3, nights = $4, guest_count = $5, \
                 total_price = $6, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Booking>(&query)
            .bind(booking_id)
            .bind(update.check_in)
            .bind(update.check_out)
            .bind(update.nights)
            .bind(update.guest_count)
            .bind(update.total_price)
            .fetch_one(conn)
            .await
    }

    /// List bookings owned by a user, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        params: &BookingListQuery,
    ) -> Result<Vec<Booking>, sqlx::Error> {
        let limit = params.limit.unwrap_or(50).clamp(1, 100);
        let offset = params.offset.unwrap_or(0).max(0);
        let filter = if params.status.is_some() {
            "AND status = $4"
        } else {
            ""
        };
        let query = format!(
            "SELECT {COLUMNS} FROM bookings \
             WHERE user_id = $1 {filter} \
             ORDER BY created_at DESC \
             LIMIT $2 OFFSET $3"
        );
        let mut q = sqlx::query_as::<_, Booking>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset);
        if let Some(status) = &params.status {
            q = q.bind(status);
        }
        q.fetch_all(pool).await
    }
}
