//! Caller-identity extractor for Axum handlers.
//!
//! Session issuance lives in a separate service; requests arrive here with
//! the resolved user id in the `x-user-id` header, set by the edge proxy
//! after token validation.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use stayhub_core::types::DbId;

use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user extracted from the `x-user-id` header.
///
/// Use this as an extractor parameter in any handler that requires an
/// authenticated caller:
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    /// The user's internal database id.
    pub user_id: DbId,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing x-user-id header".into()))?;

        let user_id: DbId = header
            .parse()
            .map_err(|_| AppError::Unauthorized("Invalid x-user-id header".into()))?;

        Ok(AuthUser { user_id })
    }
}
