//! Canonical parameter signing for the gateway protocol.
//!
//! The provider signs the alphabetically-sorted `key=value` join of the raw
//! (unencoded) parameter values with HMAC-SHA512; the URL built from those
//! parameters percent-encodes the values separately. Verification therefore
//! works on decoded query parameters, not on the raw query string.

use std::collections::BTreeMap;

use hmac::{Hmac, Mac};
use sha2::Sha512;

type HmacSha512 = Hmac<Sha512>;

/// Join sorted parameters as `k1=v1&k2=v2` over the raw values.
///
/// A `BTreeMap` input guarantees alphabetical key order. Empty values are
/// skipped, matching the provider's convention of omitting blank fields
/// from the signature base.
pub fn canonical_pairs(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Compute the hex HMAC-SHA512 signature of the canonical parameter string.
pub fn sign(secret: &str, params: &BTreeMap<String, String>) -> String {
    let data = canonical_pairs(params);
    let mut mac = HmacSha512::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(data.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Compare a received signature against the expected one.
///
/// Hex case differences are tolerated; anything else is a mismatch.
pub fn signature_matches(expected: &str, received: &str) -> bool {
    expected.eq_ignore_ascii_case(received)
}

/// Build the percent-encoded query string for the redirect URL from the
/// same sorted parameter set the signature was computed over.
pub fn encoded_query(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

mod hex {
    /// Encode bytes as a lowercase hex string.
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{b:02x}")).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
