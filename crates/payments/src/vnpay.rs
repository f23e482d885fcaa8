//! Gateway wire protocol: redirect-URL construction, callback verification,
//! transaction-reference conventions, and IPN acknowledgement codes.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::Serialize;
use stayhub_core::types::DbId;

use crate::config::GatewayConfig;
use crate::sign;

// ---------------------------------------------------------------------------
// Protocol constants
// ---------------------------------------------------------------------------

/// Provider API version sent on every request.
pub const VERSION: &str = "2.1.0";

/// Response code meaning "approved".
pub const RESPONSE_APPROVED: &str = "00";

/// Amounts on the wire are scaled by 100 (minor units x 100).
pub const AMOUNT_SCALE: i64 = 100;

/// Maximum length of the sanitized order description.
const ORDER_INFO_MAX_LEN: usize = 255;

/// Signature fields stripped before re-computing the hash on verification.
const SIGNATURE_FIELDS: [&str; 2] = ["vnp_SecureHash", "vnp_SecureHashType"];

// ---------------------------------------------------------------------------
// Transaction references
// ---------------------------------------------------------------------------

/// Build the merchant transaction reference for a booking payment attempt.
///
/// `{booking_id}_{unix_timestamp}` so retried attempts for the same booking
/// get distinct references while staying correlatable.
pub fn make_txn_ref(booking_id: DbId, now: DateTime<Utc>) -> String {
    format!("{booking_id}_{}", now.timestamp())
}

/// Recover the booking id from a transaction reference.
///
/// Tolerates a missing suffix: `"42"` and `"42_1767225600"` both parse to
/// booking 42. Returns `None` for anything that does not start with an id.
pub fn parse_booking_id(txn_ref: &str) -> Option<DbId> {
    let id_part = txn_ref.split('_').next()?;
    id_part.parse().ok()
}

/// Restrict an order description to the provider's accepted character set
/// (ASCII alphanumerics, space, underscore, hyphen) and bound its length.
pub fn sanitize_order_info(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .collect();
    let trimmed = cleaned.trim();
    trimmed.chars().take(ORDER_INFO_MAX_LEN).collect()
}

// ---------------------------------------------------------------------------
// Payment URL construction
// ---------------------------------------------------------------------------

/// Inputs for building a redirect URL.
#[derive(Debug, Clone)]
pub struct PaymentUrlRequest {
    pub booking_id: DbId,
    pub txn_ref: String,
    /// Total price in minor currency units (scaled x100 on the wire).
    pub amount_minor: i64,
    pub order_info: String,
    pub client_ip: String,
}

/// Build the signed redirect URL to the hosted payment page.
///
/// Parameters are sorted alphabetically, signed over their raw values, and
/// percent-encoded into the final URL with the signature appended.
pub fn build_payment_url(
    config: &GatewayConfig,
    request: &PaymentUrlRequest,
    now: DateTime<Utc>,
) -> String {
    let return_url = format!(
        "{}?booking_id={}",
        config.return_url, request.booking_id
    );

    let params = BTreeMap::from([
        ("vnp_Version".to_string(), VERSION.to_string()),
        ("vnp_Command".to_string(), "pay".to_string()),
        ("vnp_TmnCode".to_string(), config.tmn_code.clone()),
        (
            "vnp_Amount".to_string(),
            (request.amount_minor * AMOUNT_SCALE).to_string(),
        ),
        ("vnp_CurrCode".to_string(), "VND".to_string()),
        ("vnp_TxnRef".to_string(), request.txn_ref.clone()),
        (
            "vnp_OrderInfo".to_string(),
            sanitize_order_info(&request.order_info),
        ),
        ("vnp_OrderType".to_string(), "other".to_string()),
        ("vnp_Locale".to_string(), "en".to_string()),
        ("vnp_ReturnUrl".to_string(), return_url),
        ("vnp_IpAddr".to_string(), request.client_ip.clone()),
        (
            "vnp_CreateDate".to_string(),
            now.format("%Y%m%d%H%M%S").to_string(),
        ),
    ]);

    let signature = sign::sign(&config.hash_secret, &params);
    let query = sign::encoded_query(&params);

    format!("{}?{query}&vnp_SecureHash={signature}", config.pay_url)
}

// ---------------------------------------------------------------------------
// Callback verification
// ---------------------------------------------------------------------------

/// Result of verifying an inbound return/IPN parameter set.
#[derive(Debug, Clone)]
pub enum CallbackVerification {
    /// Signature checked out; fields parsed.
    Verified(VerifiedCallback),
    /// Signature missing or mismatched. Must never be treated as a payment
    /// success regardless of the embedded response code.
    InvalidSignature,
}

/// Fields of a signature-verified callback.
#[derive(Debug, Clone)]
pub struct VerifiedCallback {
    pub txn_ref: String,
    pub booking_id: Option<DbId>,
    /// Provider business response code; `"00"` means approved. Only
    /// meaningful because the signature already verified.
    pub response_code: String,
    /// Amount in minor units (wire value divided by the x100 scale).
    pub amount_minor: Option<i64>,
    /// Provider-assigned transaction number, if present.
    pub transaction_no: Option<String>,
}

impl VerifiedCallback {
    /// Business-level approval, consulted only after signature verification.
    pub fn is_approved(&self) -> bool {
        self.response_code == RESPONSE_APPROVED
    }
}

/// Verify an inbound callback parameter set (decoded query parameters).
///
/// The signature fields are stripped, the remainder re-sorted and re-signed,
/// and the result compared to the received `vnp_SecureHash`.
pub fn verify_callback(
    config: &GatewayConfig,
    params: &HashMap<String, String>,
) -> CallbackVerification {
    let Some(received_hash) = params.get("vnp_SecureHash") else {
        return CallbackVerification::InvalidSignature;
    };

    let signable: BTreeMap<String, String> = params
        .iter()
        .filter(|(k, _)| !SIGNATURE_FIELDS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let expected = sign::sign(&config.hash_secret, &signable);
    if !sign::signature_matches(&expected, received_hash) {
        return CallbackVerification::InvalidSignature;
    }

    let txn_ref = params.get("vnp_TxnRef").cloned().unwrap_or_default();
    CallbackVerification::Verified(VerifiedCallback {
        booking_id: parse_booking_id(&txn_ref),
        txn_ref,
        response_code: params
            .get("vnp_ResponseCode")
            .cloned()
            .unwrap_or_default(),
        amount_minor: params
            .get("vnp_Amount")
            .and_then(|a| a.parse::<i64>().ok())
            .map(|a| a / AMOUNT_SCALE),
        transaction_no: params.get("vnp_TransactionNo").cloned(),
    })
}

// ---------------------------------------------------------------------------
// IPN acknowledgement
// ---------------------------------------------------------------------------

/// Structured acknowledgement returned to the provider's IPN delivery.
///
/// The provider retries delivery until it receives the success code, so the
/// IPN handler must be idempotent.
#[derive(Debug, Clone, Serialize)]
pub struct IpnReceipt {
    #[serde(rename = "RspCode")]
    pub rsp_code: &'static str,
    #[serde(rename = "Message")]
    pub message: &'static str,
}

impl IpnReceipt {
    pub const fn success() -> Self {
        Self {
            rsp_code: "00",
            message: "Confirm success",
        }
    }

    pub const fn order_not_found() -> Self {
        Self {
            rsp_code: "01",
            message: "Order not found",
        }
    }

    pub const fn already_confirmed() -> Self {
        Self {
            rsp_code: "02",
            message: "Order already confirmed",
        }
    }

    pub const fn invalid_signature() -> Self {
        Self {
            rsp_code: "97",
            message: "Invalid signature",
        }
    }

    pub const fn unknown_error() -> Self {
        Self {
            rsp_code: "99",
            message: "Unknown error",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config() -> GatewayConfig {
        GatewayConfig {
            tmn_code: "STAYHUB1".into(),
            hash_secret: "test-secret".into(),
            pay_url: "https://pay.example.com/vpcpay.html".into(),
            api_url: "https://api.example.com/transaction".into(),
            return_url: "http://localhost:3000/api/v1/payments/return".into(),
            api_timeout: Duration::from_secs(10),
        }
    }

    fn signed_callback(config: &GatewayConfig) -> HashMap<String, String> {
        let base = BTreeMap::from([
            ("vnp_TxnRef".to_string(), "12_1767225600".to_string()),
            ("vnp_ResponseCode".to_string(), "00".to_string()),
            ("vnp_Amount".to_string(), "24000000".to_string()),
            ("vnp_TransactionNo".to_string(), "14422574".to_string()),
        ]);
        let hash = crate::sign::sign(&config.hash_secret, &base);
        let mut params: HashMap<String, String> = base.into_iter().collect();
        params.insert("vnp_SecureHash".to_string(), hash);
        params
    }

    // -- Transaction references --------------------------------------------

    #[test]
    fn txn_ref_embeds_booking_id_and_timestamp() {
        let now = DateTime::from_timestamp(1_767_225_600, 0).unwrap();
        assert_eq!(make_txn_ref(12, now), "12_1767225600");
    }

    #[test]
    fn booking_id_parses_with_and_without_suffix() {
        assert_eq!(parse_booking_id("12_1767225600"), Some(12));
        assert_eq!(parse_booking_id("12"), Some(12));
        assert_eq!(parse_booking_id("not-a-ref"), None);
        assert_eq!(parse_booking_id(""), None);
    }

    // -- Order info sanitization -------------------------------------------

    #[test]
    fn order_info_strips_disallowed_characters() {
        assert_eq!(
            sanitize_order_info("Booking #12: Suíte & breakfast!"),
            "Booking 12 Sute  breakfast"
        );
    }

    #[test]
    fn order_info_is_length_bounded() {
        let long = "a".repeat(400);
        assert_eq!(sanitize_order_info(&long).len(), 255);
    }

    // -- URL construction ---------------------------------------------------

    #[test]
    fn payment_url_carries_scaled_amount_and_signature() {
        let now = DateTime::from_timestamp(1_767_225_600, 0).unwrap();
        let url = build_payment_url(
            &config(),
            &PaymentUrlRequest {
                booking_id: 12,
                txn_ref: "12_1767225600".into(),
                amount_minor: 240_000,
                order_info: "Booking 12".into(),
                client_ip: "203.0.113.7".into(),
            },
            now,
        );
        assert!(url.starts_with("https://pay.example.com/vpcpay.html?"));
        assert!(url.contains("vnp_Amount=24000000"));
        assert!(url.contains("vnp_TxnRef=12_1767225600"));
        assert!(url.contains("vnp_SecureHash="));
        // Return URL embeds the booking id, percent-encoded.
        assert!(url.contains("booking_id%3D12"));
    }

    // -- Callback verification ----------------------------------------------

    #[test]
    fn valid_signature_verifies_and_parses() {
        let config = config();
        let params = signed_callback(&config);
        match verify_callback(&config, &params) {
            CallbackVerification::Verified(cb) => {
                assert_eq!(cb.booking_id, Some(12));
                assert!(cb.is_approved());
                assert_eq!(cb.amount_minor, Some(240_000));
                assert_eq!(cb.transaction_no.as_deref(), Some("14422574"));
            }
            CallbackVerification::InvalidSignature => panic!("signature should verify"),
        }
    }

    #[test]
    fn tampering_any_parameter_breaks_verification() {
        let config = config();
        let baseline = signed_callback(&config);

        for field in ["vnp_TxnRef", "vnp_ResponseCode", "vnp_Amount", "vnp_TransactionNo"] {
            let mut tampered = baseline.clone();
            let value = tampered.get_mut(field).unwrap();
            // Flip the first character.
            let flipped = match value.chars().next().unwrap() {
                '0' => '1',
                _ => '0',
            };
            value.replace_range(0..1, &flipped.to_string());

            assert!(
                matches!(
                    verify_callback(&config, &tampered),
                    CallbackVerification::InvalidSignature
                ),
                "tampered {field} must fail verification"
            );
        }
    }

    #[test]
    fn missing_signature_fails_verification() {
        let config = config();
        let mut params = signed_callback(&config);
        params.remove("vnp_SecureHash");
        assert!(matches!(
            verify_callback(&config, &params),
            CallbackVerification::InvalidSignature
        ));
    }

    #[test]
    fn response_code_is_ignored_when_signature_is_bad() {
        let config = config();
        let mut params = signed_callback(&config);
        params.insert("vnp_SecureHash".to_string(), "00".repeat(64));
        // Response code says approved, but the hash does not match.
        assert!(matches!(
            verify_callback(&config, &params),
            CallbackVerification::InvalidSignature
        ));
    }

    #[test]
    fn uppercase_hash_still_verifies() {
        let config = config();
        let mut params = signed_callback(&config);
        let upper = params.get("vnp_SecureHash").unwrap().to_uppercase();
        params.insert("vnp_SecureHash".to_string(), upper);
        assert!(matches!(
            verify_callback(&config, &params),
            CallbackVerification::Verified(_)
        ));
    }

    #[test]
    fn non_approved_response_code_is_not_success() {
        let config = config();
        let base = BTreeMap::from([
            ("vnp_TxnRef".to_string(), "12_1767225600".to_string()),
            ("vnp_ResponseCode".to_string(), "24".to_string()),
        ]);
        let hash = crate::sign::sign(&config.hash_secret, &base);
        let mut params: HashMap<String, String> = base.into_iter().collect();
        params.insert("vnp_SecureHash".to_string(), hash);

        match verify_callback(&config, &params) {
            CallbackVerification::Verified(cb) => assert!(!cb.is_approved()),
            CallbackVerification::InvalidSignature => panic!("signature should verify"),
        }
    }
}
