//! The reservation coordinator.
//!
//! Owns every mutation of booking rows and room inventory. The write path
//! for creation and date changes runs inside a distributed lock keyed by
//! (room, date range) *and* a database transaction: the lock serializes
//! competing service instances, the transaction keeps the conflict scan,
//! inventory decrement, and booking write atomic against partial failure.
//! The lock is released on every exit path after acquisition.

use std::sync::Arc;

use chrono::Utc;
use stayhub_core::booking::{
    total_price, BookingStatus, GuestDetails, PaymentStatus, StayInterval, Transition,
};
use stayhub_core::config::BookingConfig;
use stayhub_core::error::CoreError;
use stayhub_core::lock::{booking_lock_key, LockStore};
use stayhub_core::types::DbId;
use stayhub_db::models::booking::{Booking, BookingStayUpdate, NewBooking};
use stayhub_db::repositories::{BookingRepo, RoomRepo};
use stayhub_db::DbPool;
use stayhub_events::{BookingEvent, BookingEventKind, Notifier};
use stayhub_payments::vnpay::VerifiedCallback;
use stayhub_payments::PaymentGateway;

use crate::error::BookingError;
use crate::outcome::{BookingOutcome, CancelOutcome, CreateBookingRequest, ModifyBookingRequest};

/// Outcome of applying a verified payment notification.
#[derive(Debug)]
pub enum NotificationOutcome {
    /// This notification confirmed the booking.
    Confirmed(Booking),
    /// The booking was already confirmed (duplicate or racing delivery).
    AlreadyConfirmed(Booking),
    /// The provider reported a failed payment; the booking stays pending.
    PaymentFailed(Booking),
}

/// Orchestrates the booking lifecycle.
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
pub struct ReservationCoordinator {
    pool: DbPool,
    locks: Arc<dyn LockStore>,
    /// `None` when payments are not configured: bookings are created
    /// without a payment URL and confirm skips gateway verification.
    gateway: Option<Arc<PaymentGateway>>,
    notifier: Arc<Notifier>,
    config: BookingConfig,
}

impl ReservationCoordinator {
    pub fn new(
        pool: DbPool,
        locks: Arc<dyn LockStore>,
        gateway: Option<Arc<PaymentGateway>>,
        notifier: Arc<Notifier>,
        config: BookingConfig,
    ) -> Self {
        Self {
            pool,
            locks,
            gateway,
            notifier,
            config,
        }
    }

    // -----------------------------------------------------------------------
    // Create
    // -----------------------------------------------------------------------

    /// Create a reservation for `user_id`.
    ///
    /// Validation happens before any lock is taken; the conflict scan,
    /// inventory decrement, and booking insert happen under the
    /// (room, date range) lock inside one transaction. Lock acquisition
    /// failure is a conflict the caller retries; there is no internal
    /// retry or queueing.
    pub async fn create_booking(
        &self,
        user_id: DbId,
        request: CreateBookingRequest,
    ) -> Result<BookingOutcome, BookingError> {
        let interval = StayInterval::new(request.check_in, request.check_out)?;
        if request.check_in < Utc::now().date_naive() {
            return Err(BookingError::validation("check-in date is in the past"));
        }

        let room = RoomRepo::find_by_id(&self.pool, request.room_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Room",
                id: request.room_id,
            })?;

        let guest = GuestDetails {
            name: request.guest_name.clone(),
            email: request.guest_email.clone(),
            phone: request.guest_phone.clone(),
            guest_count: request.guest_count,
        };
        guest.validate(room.capacity)?;

        let key = booking_lock_key(room.id, interval.check_in, interval.check_out);
        if !self.locks.acquire(&key, self.config.lock_ttl).await {
            tracing::info!(room_id = room.id, lock_key = %key, "Reservation lock busy");
            return Err(BookingError::conflict(
                "another reservation for these dates is in progress; please retry",
            ));
        }

        let result = self
            .create_under_lock(user_id, &request, &interval, room.id)
            .await;
        self.locks.release(&key).await;
        let booking = result?;

        tracing::info!(
            booking_id = booking.id,
            room_id = room.id,
            user_id,
            nights = booking.nights,
            total_price = booking.total_price,
            "Booking created"
        );

        if self.config.instant_confirm {
            self.notifier.send_booking_confirmation(
                self.event(BookingEventKind::Confirmed, &booking)
                    .with_payload(serde_json::json!({ "instant": true })),
            );
            return Ok(BookingOutcome {
                booking,
                payment_url: None,
            });
        }

        let payment_url = self.mint_payment_url(&booking, &room.name, &request).await;
        Ok(BookingOutcome {
            booking,
            payment_url,
        })
    }

    /// Critical section of [`create_booking`]: everything here runs with
    /// the reservation lock held, inside a single transaction.
    async fn create_under_lock(
        &self,
        user_id: DbId,
        request: &CreateBookingRequest,
        interval: &StayInterval,
        room_id: DbId,
    ) -> Result<Booking, BookingError> {
        let mut tx = self.pool.begin().await?;

        // Re-check under the lock; any earlier check was advisory.
        let conflict = BookingRepo::has_conflict(
            &mut tx,
            room_id,
            interval.check_in,
            interval.check_out,
            None,
        )
        .await?;
        if conflict {
            return Err(BookingError::conflict(
                "the room is already booked for the requested dates",
            ));
        }

        if !RoomRepo::reserve_one(&mut tx, room_id).await? {
            return Err(BookingError::conflict("no availability left for this room"));
        }

        let room = RoomRepo::find_by_id_tx(&mut tx, room_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Room",
                id: room_id,
            })?;

        let status = if self.config.instant_confirm {
            BookingStatus::Confirmed
        } else {
            BookingStatus::Pending
        };

        let booking = BookingRepo::create(
            &mut tx,
            &NewBooking {
                user_id,
                room_id,
                check_in: interval.check_in,
                check_out: interval.check_out,
                nights: interval.nights(),
                guest_name: request.guest_name.clone(),
                guest_email: request.guest_email.clone(),
                guest_phone: request.guest_phone.clone(),
                guest_count: request.guest_count,
                total_price: total_price(room.nightly_price, interval),
                status,
                payment_status: PaymentStatus::Pending,
            },
        )
        .await?;

        tx.commit().await?;
        Ok(booking)
    }

    /// Mint the payment intent and persist its reference.
    ///
    /// Non-fatal: a failure leaves the booking pending without a payment
    /// URL, logged as a degraded outcome.
    async fn mint_payment_url(
        &self,
        booking: &Booking,
        room_name: &str,
        request: &CreateBookingRequest,
    ) -> Option<String> {
        let gateway = self.gateway.as_ref()?;
        let client_ip = request.client_ip.as_deref().unwrap_or("127.0.0.1");
        let order_info = format!("Stayhub booking {} {room_name}", booking.id);
        let intent = gateway.create_payment_intent(
            booking.id,
            booking.total_price,
            &order_info,
            client_ip,
        );

        match BookingRepo::set_payment_ref(&self.pool, booking.id, &intent.txn_ref).await {
            Ok(()) => Some(intent.redirect_url),
            Err(err) => {
                tracing::warn!(
                    booking_id = booking.id,
                    error = %err,
                    "Failed to persist payment reference; booking stays pending without a payment URL"
                );
                None
            }
        }
    }

    // -----------------------------------------------------------------------
    // Confirm
    // -----------------------------------------------------------------------

    /// Confirm a booking after payment.
    ///
    /// Idempotent: an already-confirmed booking is returned as-is, so
    /// duplicate gateway callbacks and duplicate client calls are harmless.
    /// When payments are configured, the stored intent is verified with the
    /// provider before any state changes; verification failure mutates
    /// nothing.
    pub async fn confirm_booking(&self, booking_id: DbId) -> Result<Booking, BookingError> {
        let booking = self.find_booking(booking_id).await?;

        let mut transaction_no: Option<String> = None;
        match booking.status()?.check_confirm()? {
            Transition::AlreadyDone => return Ok(booking),
            Transition::Apply => {
                if let Some(gateway) = &self.gateway {
                    let payment_ref = booking.payment_ref.as_deref().ok_or_else(|| {
                        CoreError::Precondition(
                            "no payment attempt recorded for this booking".into(),
                        )
                    })?;
                    let state = gateway.query_transaction(payment_ref).await.map_err(|err| {
                        tracing::warn!(booking_id, error = %err, "Payment verification call failed");
                        CoreError::Internal("payment verification unavailable; retry later".into())
                    })?;
                    if !state.is_paid() {
                        return Err(BookingError::Core(CoreError::Precondition(format!(
                            "payment not completed (gateway code {})",
                            state.response_code
                        ))));
                    }
                    transaction_no = state.transaction_no;
                }
            }
        }

        self.apply_confirm(booking_id, transaction_no.as_deref())
            .await
    }

    /// Apply a verified asynchronous payment notification.
    ///
    /// The signature has already been checked by the gateway adapter; this
    /// only decides the state transition. Idempotent, because the provider
    /// retries delivery until acknowledged.
    pub async fn apply_payment_notification(
        &self,
        callback: &VerifiedCallback,
    ) -> Result<NotificationOutcome, BookingError> {
        let booking_id = callback.booking_id.ok_or_else(|| {
            CoreError::Validation(format!("unparseable transaction reference '{}'", callback.txn_ref))
        })?;
        let booking = self.find_booking(booking_id).await?;

        if let Some(amount) = callback.amount_minor {
            if amount != booking.total_price {
                return Err(BookingError::validation(format!(
                    "notification amount {amount} does not match booking total {}",
                    booking.total_price
                )));
            }
        }

        if !callback.is_approved() {
            tracing::info!(
                booking_id,
                response_code = %callback.response_code,
                "Payment notification reports failure; booking stays pending"
            );
            return Ok(NotificationOutcome::PaymentFailed(booking));
        }

        match booking.status()?.check_confirm()? {
            Transition::AlreadyDone => Ok(NotificationOutcome::AlreadyConfirmed(booking)),
            Transition::Apply => {
                let confirmed = self
                    .apply_confirm(booking_id, callback.transaction_no.as_deref())
                    .await?;
                Ok(NotificationOutcome::Confirmed(confirmed))
            }
        }
    }

    /// Run the guarded pending -> confirmed transition and dispatch
    /// notifications. Tolerates losing the race to another confirm path.
    async fn apply_confirm(
        &self,
        booking_id: DbId,
        transaction_no: Option<&str>,
    ) -> Result<Booking, BookingError> {
        let mut tx = self.pool.begin().await?;
        let applied = BookingRepo::confirm(&mut tx, booking_id, transaction_no).await?;
        tx.commit().await?;

        let booking = self.find_booking(booking_id).await?;
        if !applied {
            // A racing path got there first. Already-confirmed is success;
            // anything else (cancelled meanwhile) is a precondition failure.
            return match booking.status()? {
                BookingStatus::Confirmed => Ok(booking),
                _ => Err(BookingError::Core(CoreError::Precondition(format!(
                    "booking is {} and cannot be confirmed",
                    booking.status_text
                )))),
            };
        }

        tracing::info!(booking_id, transaction_no = ?transaction_no, "Booking confirmed");

        self.notifier.send_booking_confirmation(
            self.event(BookingEventKind::Confirmed, &booking)
                .with_payload(serde_json::json!({ "total_price": booking.total_price })),
        );
        if booking.payment_status()? == PaymentStatus::Completed {
            self.notifier.send_payment_receipt(
                self.event(BookingEventKind::PaymentReceived, &booking).with_payload(
                    serde_json::json!({
                        "amount": booking.total_price,
                        "transaction_no": booking.transaction_no,
                    }),
                ),
            );
        }
        Ok(booking)
    }

    // -----------------------------------------------------------------------
    // Modify
    // -----------------------------------------------------------------------

    /// Modify a confirmed booking's dates and/or guest count.
    ///
    /// Only allowed while check-in is still in the future. A date change
    /// takes the lock on the NEW range and re-runs the conflict scan
    /// excluding the booking itself; guest-count-only changes bypass
    /// locking entirely.
    pub async fn modify_booking(
        &self,
        booking_id: DbId,
        user_id: DbId,
        request: ModifyBookingRequest,
    ) -> Result<Booking, BookingError> {
        let booking = self.find_booking(booking_id).await?;
        self.ensure_owner(&booking, user_id)?;
        booking.status()?.check_modify()?;

        let today = Utc::now().date_naive();
        if booking.check_in <= today {
            return Err(BookingError::Core(CoreError::Precondition(
                "the stay has already started and can no longer be modified".into(),
            )));
        }

        let interval = StayInterval::new(
            request.check_in.unwrap_or(booking.check_in),
            request.check_out.unwrap_or(booking.check_out),
        )?;
        if request.changes_dates() && interval.check_in < today {
            return Err(BookingError::validation("new check-in date is in the past"));
        }

        let guest_count = request.guest_count.unwrap_or(booking.guest_count);
        let room = RoomRepo::find_by_id(&self.pool, booking.room_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Room",
                id: booking.room_id,
            })?;
        if guest_count < 1 || guest_count > room.capacity {
            return Err(BookingError::validation(format!(
                "guest count {guest_count} is outside room capacity {}",
                room.capacity
            )));
        }

        let update = BookingStayUpdate {
            check_in: interval.check_in,
            check_out: interval.check_out,
            nights: interval.nights(),
            guest_count,
            total_price: total_price(room.nightly_price, &interval),
        };

        let updated = if request.changes_dates() {
            let key = booking_lock_key(booking.room_id, interval.check_in, interval.check_out);
            if !self.locks.acquire(&key, self.config.lock_ttl).await {
                return Err(BookingError::conflict(
                    "another reservation for these dates is in progress; please retry",
                ));
            }
            let result = self
                .modify_under_lock(&booking, &interval, &update)
                .await;
            self.locks.release(&key).await;
            result?
        } else {
            let mut tx = self.pool.begin().await?;
            let updated = BookingRepo::update_stay(&mut tx, booking.id, &update).await?;
            tx.commit().await?;
            updated
        };

        tracing::info!(
            booking_id,
            check_in = %updated.check_in,
            check_out = %updated.check_out,
            guest_count = updated.guest_count,
            "Booking modified"
        );

        self.notifier.send_booking_modification(
            self.event(BookingEventKind::Modified, &updated)
                .with_payload(serde_json::json!({
                    "check_in": updated.check_in,
                    "check_out": updated.check_out,
                    "guest_count": updated.guest_count,
                    "total_price": updated.total_price,
                })),
        );
        Ok(updated)
    }

    /// Critical section of a date-changing modification.
    async fn modify_under_lock(
        &self,
        booking: &Booking,
        interval: &StayInterval,
        update: &BookingStayUpdate,
    ) -> Result<Booking, BookingError> {
        let mut tx = self.pool.begin().await?;

        let conflict = BookingRepo::has_conflict(
            &mut tx,
            booking.room_id,
            interval.check_in,
            interval.check_out,
            Some(booking.id),
        )
        .await?;
        if conflict {
            return Err(BookingError::conflict(
                "the room is already booked for the requested dates",
            ));
        }

        let updated = BookingRepo::update_stay(&mut tx, booking.id, update).await?;
        tx.commit().await?;
        Ok(updated)
    }

    // -----------------------------------------------------------------------
    // Cancel
    // -----------------------------------------------------------------------

    /// Cancel a confirmed booking.
    ///
    /// Releases the inventory unit and, when payment had completed,
    /// attempts a refund. Refund and notification failures are logged but
    /// never block the cancellation itself.
    pub async fn cancel_booking(
        &self,
        booking_id: DbId,
        user_id: DbId,
        reason: &str,
    ) -> Result<CancelOutcome, BookingError> {
        let booking = self.find_booking(booking_id).await?;
        self.ensure_owner(&booking, user_id)?;
        booking.status()?.check_cancel()?;

        let mut tx = self.pool.begin().await?;
        let applied = BookingRepo::cancel(&mut tx, booking_id, reason).await?;
        if !applied {
            // Raced with another cancel; surface the standard precondition
            // error without touching inventory.
            tx.rollback().await?;
            return Err(BookingError::Core(CoreError::Precondition(
                "booking is already cancelled".into(),
            )));
        }
        // Releasing inventory cannot create a double-booking, so no
        // distributed lock is needed on this path.
        RoomRepo::release_one(&mut tx, booking.room_id).await?;
        tx.commit().await?;

        tracing::info!(booking_id, reason, "Booking cancelled");

        let refunded_amount = self.try_refund(&booking).await;
        let cancelled = self.find_booking(booking_id).await?;

        self.notifier.send_booking_cancellation(
            self.event(BookingEventKind::Cancelled, &cancelled)
                .with_payload(serde_json::json!({
                    "reason": reason,
                    "refunded_amount": refunded_amount,
                })),
        );

        Ok(CancelOutcome {
            booking: cancelled,
            refunded_amount,
        })
    }

    /// Attempt a refund for a cancelled booking with completed payment.
    ///
    /// Returns the refunded amount on success; failures only log.
    async fn try_refund(&self, booking: &Booking) -> Option<i64> {
        let gateway = self.gateway.as_ref()?;
        if booking.payment_status().ok()? != PaymentStatus::Completed {
            return None;
        }
        let payment_ref = booking.payment_ref.as_deref()?;

        match gateway.refund(payment_ref, booking.total_price).await {
            Ok(()) => {
                if let Err(err) = BookingRepo::mark_refunded(&self.pool, booking.id).await {
                    tracing::warn!(booking_id = booking.id, error = %err, "Refund succeeded but status update failed");
                }
                tracing::info!(
                    booking_id = booking.id,
                    amount = booking.total_price,
                    "Refund completed"
                );
                Some(booking.total_price)
            }
            Err(err) => {
                tracing::warn!(
                    booking_id = booking.id,
                    error = %err,
                    "Refund failed; cancellation stands"
                );
                None
            }
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    async fn find_booking(&self, booking_id: DbId) -> Result<Booking, BookingError> {
        Ok(BookingRepo::find_by_id(&self.pool, booking_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Booking",
                id: booking_id,
            })?)
    }

    fn ensure_owner(&self, booking: &Booking, user_id: DbId) -> Result<(), BookingError> {
        if booking.user_id != user_id {
            return Err(BookingError::Core(CoreError::Forbidden(
                "booking belongs to another user".into(),
            )));
        }
        Ok(())
    }

    fn event(&self, kind: BookingEventKind, booking: &Booking) -> BookingEvent {
        BookingEvent::new(
            kind,
            booking.id,
            booking.room_id,
            booking.user_id,
            booking.guest_email.clone(),
        )
    }
}
