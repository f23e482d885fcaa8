//! Route definitions for payment gateway callbacks.

use axum::routing::get;
use axum::Router;

use crate::handlers::payments;
use crate::state::AppState;

/// Payment callback routes, nested under `/payments`.
///
/// Both are GET because the provider delivers callback parameters in the
/// query string.
///
/// ```text
/// GET    /return    payment_return (browser redirect)
/// GET    /ipn       payment_ipn (server-to-server, authoritative)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/return", get(payments::payment_return))
        .route("/ipn", get(payments::payment_ipn))
}
