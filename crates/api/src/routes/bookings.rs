//! Route definitions for the booking lifecycle.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::bookings;
use crate::state::AppState;

/// Booking routes, nested under `/bookings`.
///
/// ```text
/// POST   /                 create_booking
/// GET    /                 list_bookings
/// GET    /{id}             get_booking
/// PATCH  /{id}             modify_booking
/// POST   /{id}/confirm     confirm_booking
/// POST   /{id}/cancel      cancel_booking
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(bookings::create_booking).get(bookings::list_bookings))
        .route(
            "/{id}",
            get(bookings::get_booking).patch(bookings::modify_booking),
        )
        .route("/{id}/confirm", post(bookings::confirm_booking))
        .route("/{id}/cancel", post(bookings::cancel_booking))
}
