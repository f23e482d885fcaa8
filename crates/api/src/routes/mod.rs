pub mod bookings;
pub mod health;
pub mod payments;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /bookings                        create (POST), list own (GET)
/// /bookings/{id}                   get (GET), modify (PATCH)
/// /bookings/{id}/confirm           explicit confirm (POST)
/// /bookings/{id}/cancel            cancel with reason (POST)
///
/// /payments/return                 browser redirect from payment page (GET)
/// /payments/ipn                    provider notification, idempotent (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/bookings", bookings::router())
        .nest("/payments", payments::router())
}
