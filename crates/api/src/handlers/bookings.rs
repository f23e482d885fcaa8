//! Handlers for the booking lifecycle.
//!
//! Every mutation goes through the reservation coordinator; these handlers
//! only translate between HTTP and coordinator calls.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use stayhub_booking::{CreateBookingRequest, ModifyBookingRequest};
use stayhub_core::error::CoreError;
use stayhub_core::types::DbId;
use stayhub_db::models::booking::{Booking, BookingListQuery};
use stayhub_db::repositories::BookingRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/bookings
///
/// Reserve a room for a date range. Returns 201 with the pending booking
/// and, when payments are configured, the hosted payment page URL.
/// Returns 409 when the room is taken for any night of the range.
pub async fn create_booking(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateBookingRequest>,
) -> AppResult<impl IntoResponse> {
    let outcome = state.coordinator.create_booking(auth.user_id, input).await?;

    tracing::info!(
        user_id = auth.user_id,
        booking_id = outcome.booking.id,
        room_id = outcome.booking.room_id,
        "Booking created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: outcome })))
}

/// POST /api/v1/bookings/{id}/confirm
///
/// Explicitly confirm a pending booking. Idempotent: confirming an
/// already-confirmed booking returns it unchanged.
pub async fn confirm_booking(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(booking_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    ensure_owner(&state, booking_id, auth.user_id).await?;

    let booking = state.coordinator.confirm_booking(booking_id).await?;

    tracing::info!(user_id = auth.user_id, booking_id, "Booking confirmed");

    Ok(Json(DataResponse { data: booking }))
}

/// PATCH /api/v1/bookings/{id}
///
/// Change the stay dates and/or guest count of a confirmed booking.
/// Date changes run the full lock-guarded conflict re-scan.
pub async fn modify_booking(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(booking_id): Path<DbId>,
    Json(input): Json<ModifyBookingRequest>,
) -> AppResult<impl IntoResponse> {
    let booking = state
        .coordinator
        .modify_booking(booking_id, auth.user_id, input)
        .await?;

    tracing::info!(user_id = auth.user_id, booking_id, "Booking modified");

    Ok(Json(DataResponse { data: booking }))
}

/// Body for POST /bookings/{id}/cancel.
#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

/// POST /api/v1/bookings/{id}/cancel
///
/// Cancel a confirmed booking. Releases the room back to inventory and
/// attempts a refund when a completed payment exists; refund failure does
/// not block the cancellation.
pub async fn cancel_booking(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(booking_id): Path<DbId>,
    Json(input): Json<CancelRequest>,
) -> AppResult<impl IntoResponse> {
    let reason = input.reason.as_deref().unwrap_or("cancelled by guest");
    let outcome = state
        .coordinator
        .cancel_booking(booking_id, auth.user_id, reason)
        .await?;

    tracing::info!(user_id = auth.user_id, booking_id, "Booking cancelled");

    Ok(Json(DataResponse { data: outcome }))
}

/// GET /api/v1/bookings/{id}
pub async fn get_booking(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(booking_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let booking = ensure_owner(&state, booking_id, auth.user_id).await?;
    Ok(Json(DataResponse { data: booking }))
}

/// GET /api/v1/bookings
///
/// List the caller's bookings, newest first. Supports `status`, `limit`,
/// and `offset` query parameters.
pub async fn list_bookings(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<BookingListQuery>,
) -> AppResult<impl IntoResponse> {
    let bookings = BookingRepo::list_for_user(&state.pool, auth.user_id, &params).await?;
    Ok(Json(DataResponse { data: bookings }))
}

/// Fetch a booking and verify the caller owns it.
async fn ensure_owner(
    state: &AppState,
    booking_id: DbId,
    user_id: DbId,
) -> Result<Booking, AppError> {
    let booking = BookingRepo::find_by_id(&state.pool, booking_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Booking",
            id: booking_id,
        })?;
    if booking.user_id != user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "booking belongs to another user".into(),
        )));
    }
    Ok(booking)
}
