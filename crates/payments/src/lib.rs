//! Payment gateway adapter.
//!
//! Implements the VNPay-style redirect flow: outbound payment URLs signed
//! with HMAC-SHA512 over a canonical sorted parameter string, verification
//! of inbound return/IPN callbacks, and the server-to-server query/refund
//! API used by the coordinator to verify and unwind payments.

pub mod client;
pub mod config;
pub mod sign;
pub mod vnpay;

pub use client::{GatewayError, PaymentGateway};
pub use config::GatewayConfig;
pub use vnpay::{CallbackVerification, IpnReceipt, PaymentUrlRequest};
