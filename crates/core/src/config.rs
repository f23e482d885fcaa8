//! Booking engine configuration loaded from environment variables.

use std::time::Duration;

use crate::lock::DEFAULT_LOCK_TTL;

/// Tunables for the reservation coordinator.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct BookingConfig {
    /// TTL for the per-(room, date range) reservation lock.
    pub lock_ttl: Duration,
    /// When `true`, new bookings are confirmed immediately with no payment
    /// step (instant-reserve mode). When `false` (the default) bookings
    /// stay pending until the payment gateway confirms them.
    pub instant_confirm: bool,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            lock_ttl: DEFAULT_LOCK_TTL,
            instant_confirm: false,
        }
    }
}

impl BookingConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default |
    /// |--------------------------|---------|
    /// | `BOOKING_LOCK_TTL_SECS`  | `15`    |
    /// | `BOOKING_INSTANT_CONFIRM`| `false` |
    pub fn from_env() -> Self {
        let lock_ttl = std::env::var("BOOKING_LOCK_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_LOCK_TTL);

        let instant_confirm = std::env::var("BOOKING_INSTANT_CONFIRM")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self {
            lock_ttl,
            instant_confirm,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_payment_gated_with_15s_ttl() {
        let config = BookingConfig::default();
        assert_eq!(config.lock_ttl, Duration::from_secs(15));
        assert!(!config.instant_confirm);
    }
}
