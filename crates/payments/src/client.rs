//! Server-to-server gateway client: payment-intent minting, transaction
//! query (payment verification), and refunds.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::Deserialize;
use stayhub_core::types::DbId;

use crate::config::GatewayConfig;
use crate::sign;
use crate::vnpay::{
    self, build_payment_url, make_txn_ref, PaymentUrlRequest, RESPONSE_APPROVED,
};

/// Errors from the gateway API layer.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The HTTP request itself failed (network, DNS, TLS) or timed out.
    #[error("gateway request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The gateway returned a non-2xx status code.
    #[error("gateway API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The gateway answered but declined the operation.
    #[error("gateway declined: response code {code}")]
    Declined { code: String },
}

/// A minted payment intent: the reference we persist and the URL the guest
/// is redirected to.
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    pub txn_ref: String,
    pub redirect_url: String,
}

/// Result of a transaction query.
#[derive(Debug, Clone)]
pub struct TransactionState {
    pub txn_ref: String,
    pub response_code: String,
    pub transaction_no: Option<String>,
}

impl TransactionState {
    pub fn is_paid(&self) -> bool {
        self.response_code == RESPONSE_APPROVED
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(rename = "vnp_ResponseCode", default)]
    response_code: String,
    #[serde(rename = "vnp_TransactionNo", default)]
    transaction_no: Option<String>,
    #[serde(rename = "vnp_TxnRef", default)]
    txn_ref: String,
}

/// Client for the payment provider.
///
/// Holds the merchant credentials and a pooled `reqwest` client with the
/// configured per-request timeout, so a slow provider cannot stall the
/// confirm path indefinitely.
pub struct PaymentGateway {
    config: GatewayConfig,
    client: reqwest::Client,
}

impl PaymentGateway {
    /// Build a gateway client from configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.api_timeout)
            .build()?;
        Ok(Self { config, client })
    }

    /// Mint a payment intent for a booking: a fresh transaction reference
    /// plus the signed redirect URL for its total price.
    pub fn create_payment_intent(
        &self,
        booking_id: DbId,
        amount_minor: i64,
        order_info: &str,
        client_ip: &str,
    ) -> PaymentIntent {
        let now = Utc::now();
        let txn_ref = make_txn_ref(booking_id, now);
        let redirect_url = build_payment_url(
            &self.config,
            &PaymentUrlRequest {
                booking_id,
                txn_ref: txn_ref.clone(),
                amount_minor,
                order_info: order_info.to_string(),
                client_ip: client_ip.to_string(),
            },
            now,
        );
        PaymentIntent {
            txn_ref,
            redirect_url,
        }
    }

    /// Query the provider for the state of a transaction.
    ///
    /// Used by the confirm path to verify that a payment actually completed
    /// before transitioning the booking.
    pub async fn query_transaction(
        &self,
        txn_ref: &str,
    ) -> Result<TransactionState, GatewayError> {
        let body = self.signed_request("querydr", txn_ref, None);
        let response = self
            .client
            .post(&self.config.api_url)
            .json(&body)
            .send()
            .await?;
        let parsed = Self::parse_response(response).await?;
        Ok(TransactionState {
            txn_ref: if parsed.txn_ref.is_empty() {
                txn_ref.to_string()
            } else {
                parsed.txn_ref
            },
            response_code: parsed.response_code,
            transaction_no: parsed.transaction_no,
        })
    }

    /// Request a full refund of a completed transaction.
    ///
    /// Returns `Ok` only when the provider acknowledges the refund; the
    /// caller flips payment status to refunded on success and merely logs
    /// failures (a failed refund never blocks cancellation).
    pub async fn refund(&self, txn_ref: &str, amount_minor: i64) -> Result<(), GatewayError> {
        let body = self.signed_request("refund", txn_ref, Some(amount_minor));
        let response = self
            .client
            .post(&self.config.api_url)
            .json(&body)
            .send()
            .await?;
        let parsed = Self::parse_response(response).await?;
        if parsed.response_code == RESPONSE_APPROVED {
            Ok(())
        } else {
            Err(GatewayError::Declined {
                code: parsed.response_code,
            })
        }
    }

    /// Assemble and sign a server-to-server request body.
    fn signed_request(
        &self,
        command: &str,
        txn_ref: &str,
        amount_minor: Option<i64>,
    ) -> serde_json::Value {
        let now = Utc::now();
        let mut params = BTreeMap::from([
            ("vnp_Version".to_string(), vnpay::VERSION.to_string()),
            ("vnp_Command".to_string(), command.to_string()),
            ("vnp_TmnCode".to_string(), self.config.tmn_code.clone()),
            ("vnp_TxnRef".to_string(), txn_ref.to_string()),
            (
                "vnp_CreateDate".to_string(),
                now.format("%Y%m%d%H%M%S").to_string(),
            ),
        ]);
        if let Some(amount) = amount_minor {
            params.insert(
                "vnp_Amount".to_string(),
                (amount * vnpay::AMOUNT_SCALE).to_string(),
            );
        }
        let signature = sign::sign(&self.config.hash_secret, &params);

        let mut body = serde_json::Map::new();
        for (k, v) in params {
            body.insert(k, serde_json::Value::String(v));
        }
        body.insert(
            "vnp_SecureHash".to_string(),
            serde_json::Value::String(signature),
        );
        serde_json::Value::Object(body)
    }

    async fn parse_response(response: reqwest::Response) -> Result<ApiResponse, GatewayError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<ApiResponse>().await?)
    }

    /// Access to the underlying configuration (verification needs the
    /// secret; handlers need the return URL).
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}
