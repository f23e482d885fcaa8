//! Payment gateway callback handlers.
//!
//! The provider reaches us on two channels after a hosted-page payment:
//! the browser redirect (return URL) and the server-to-server IPN. The IPN
//! is the authoritative one and drives the booking transition; the return
//! handler only reports the result to the user. Both verify the HMAC
//! signature before trusting any parameter.

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use stayhub_booking::NotificationOutcome;
use stayhub_payments::vnpay::{self, CallbackVerification, IpnReceipt, RESPONSE_APPROVED};
use stayhub_payments::PaymentGateway;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// User-facing summary of a payment return redirect.
#[derive(Debug, Serialize)]
pub struct PaymentReturn {
    pub booking_id: Option<stayhub_core::types::DbId>,
    pub paid: bool,
    pub response_code: String,
}

/// GET /api/v1/payments/return
///
/// Synchronous browser redirect from the hosted payment page. Verifies the
/// signature and reports the result; the booking itself is confirmed by the
/// IPN, not here.
pub async fn payment_return(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<impl IntoResponse> {
    let gateway = require_gateway(&state)?;

    match vnpay::verify_callback(gateway.config(), &params) {
        CallbackVerification::Verified(callback) => {
            let paid = callback.response_code == RESPONSE_APPROVED;
            tracing::info!(
                booking_id = callback.booking_id,
                response_code = %callback.response_code,
                "Payment return received"
            );
            Ok(Json(DataResponse {
                data: PaymentReturn {
                    booking_id: callback.booking_id,
                    paid,
                    response_code: callback.response_code,
                },
            }))
        }
        CallbackVerification::InvalidSignature => {
            tracing::warn!("Payment return with invalid signature");
            Err(AppError::BadRequest("invalid payment signature".into()))
        }
    }
}

/// GET /api/v1/payments/ipn
///
/// Asynchronous instant payment notification. Always answers 200 with the
/// provider's structured receipt; the receipt code tells the provider
/// whether to retry. Idempotent: a redelivered notification for an
/// already-confirmed booking is acknowledged without re-applying.
pub async fn payment_ipn(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<IpnReceipt> {
    let Some(gateway) = state.gateway.as_ref() else {
        tracing::error!("IPN received but no payment gateway is configured");
        return Json(IpnReceipt::unknown_error());
    };

    let callback = match vnpay::verify_callback(gateway.config(), &params) {
        CallbackVerification::Verified(callback) => callback,
        CallbackVerification::InvalidSignature => {
            tracing::warn!("IPN with invalid signature");
            return Json(IpnReceipt::invalid_signature());
        }
    };

    match state.coordinator.apply_payment_notification(&callback).await {
        Ok(NotificationOutcome::Confirmed(booking)) => {
            tracing::info!(booking_id = booking.id, "IPN confirmed booking");
            Json(IpnReceipt::success())
        }
        Ok(NotificationOutcome::PaymentFailed(booking)) => {
            // The failure was recorded; acknowledge so the provider
            // stops redelivering.
            tracing::info!(
                booking_id = booking.id,
                response_code = %callback.response_code,
                "IPN reported failed payment"
            );
            Json(IpnReceipt::success())
        }
        Ok(NotificationOutcome::AlreadyConfirmed(booking)) => {
            tracing::info!(booking_id = booking.id, "Duplicate IPN for confirmed booking");
            Json(IpnReceipt::already_confirmed())
        }
        Err(err) => {
            if let stayhub_booking::BookingError::Core(
                stayhub_core::error::CoreError::NotFound { .. },
            ) = err
            {
                tracing::warn!(txn_ref = %callback.txn_ref, "IPN for unknown booking");
                return Json(IpnReceipt::order_not_found());
            }
            tracing::error!(txn_ref = %callback.txn_ref, error = %err, "IPN processing failed");
            Json(IpnReceipt::unknown_error())
        }
    }
}

fn require_gateway(state: &AppState) -> Result<&PaymentGateway, AppError> {
    state
        .gateway
        .as_deref()
        .ok_or_else(|| AppError::InternalError("payment gateway not configured".into()))
}
