//! Gateway configuration loaded from environment variables.

use std::time::Duration;

/// Default timeout for server-to-server gateway calls (query/refund).
const DEFAULT_API_TIMEOUT_SECS: u64 = 10;

/// Configuration for the payment gateway integration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Merchant terminal code issued by the provider.
    pub tmn_code: String,
    /// HMAC signing secret. Never logged, never echoed in responses.
    pub hash_secret: String,
    /// Browser redirect base URL (the hosted payment page).
    pub pay_url: String,
    /// Server-to-server API base URL (query / refund).
    pub api_url: String,
    /// Our return URL; the booking id is appended as a query parameter so
    /// the post-payment redirect lands on the right booking.
    pub return_url: String,
    /// Timeout for query/refund calls.
    pub api_timeout: Duration,
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `VNP_TMN_CODE` is not set, signalling that payments
    /// are not configured: bookings are then created without a payment URL.
    ///
    /// | Variable               | Required | Default                          |
    /// |------------------------|----------|----------------------------------|
    /// | `VNP_TMN_CODE`         | yes      | --                                |
    /// | `VNP_HASH_SECRET`      | yes      | --                                |
    /// | `VNP_PAY_URL`          | no       | provider sandbox pay URL         |
    /// | `VNP_API_URL`          | no       | provider sandbox merchant API    |
    /// | `VNP_RETURN_URL`       | no       | `http://localhost:3000/api/v1/payments/return` |
    /// | `VNP_API_TIMEOUT_SECS` | no       | `10`                             |
    pub fn from_env() -> Option<Self> {
        let tmn_code = std::env::var("VNP_TMN_CODE").ok()?;
        let hash_secret = std::env::var("VNP_HASH_SECRET").ok()?;
        Some(Self {
            tmn_code,
            hash_secret,
            pay_url: std::env::var("VNP_PAY_URL").unwrap_or_else(|_| {
                "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html".to_string()
            }),
            api_url: std::env::var("VNP_API_URL").unwrap_or_else(|_| {
                "https://sandbox.vnpayment.vn/merchant_webapi/api/transaction".to_string()
            }),
            return_url: std::env::var("VNP_RETURN_URL").unwrap_or_else(|_| {
                "http://localhost:3000/api/v1/payments/return".to_string()
            }),
            api_timeout: std::env::var("VNP_API_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(Duration::from_secs(DEFAULT_API_TIMEOUT_SECS)),
        })
    }
}
