//! Distributed try-lock seam for the reservation critical section.
//!
//! [`LockStore`] is the abstraction the coordinator takes mutual exclusion
//! through; the production backend lives in `stayhub-db` (Postgres), and
//! [`MemoryLockStore`] backs unit tests and single-node deployments.
//!
//! Semantics: `acquire` is a non-blocking try-lock with a server-side TTL.
//! It never waits for a held key, and it fails closed -- a backend error is
//! reported as "not acquired" so callers surface a retryable conflict
//! instead of a 500.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::types::{DbId, StayDate};

/// Default TTL for reservation locks. Bounds maximum staleness if a holder
/// crashes without releasing; must comfortably exceed a database round trip.
pub const DEFAULT_LOCK_TTL: Duration = Duration::from_secs(15);

/// Derive the deterministic lock key for a room and date range.
///
/// Dates are normalized to `YYYY-MM-DD` so two requests for the same room
/// and day range always collide regardless of time-of-day precision in the
/// caller's input.
pub fn booking_lock_key(room_id: DbId, check_in: StayDate, check_out: StayDate) -> String {
    format!(
        "booking:room:{room_id}:{}:{}",
        check_in.format("%Y-%m-%d"),
        check_out.format("%Y-%m-%d")
    )
}

/// A key-scoped distributed try-lock with server-enforced expiry.
#[async_trait::async_trait]
pub trait LockStore: Send + Sync {
    /// Set `key` only if no live holder exists, with automatic expiry after
    /// `ttl`. Returns `false` when another holder is present *or* when the
    /// backend cannot prove exclusivity (fail-closed). Never blocks.
    async fn acquire(&self, key: &str, ttl: Duration) -> bool;

    /// Delete `key` unconditionally. Best-effort: absence of the key is not
    /// an error, and backend failures are only logged.
    async fn release(&self, key: &str);
}

// ---------------------------------------------------------------------------
// MemoryLockStore
// ---------------------------------------------------------------------------

/// In-process [`LockStore`] backed by a mutex-guarded map of key -> expiry.
///
/// Suitable for tests and single-instance deployments; it provides the same
/// at-most-one-holder-per-TTL-window contract as the Postgres backend, just
/// without cross-process reach.
#[derive(Default)]
pub struct MemoryLockStore {
    held: Mutex<HashMap<String, Instant>>,
}

impl MemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl LockStore for MemoryLockStore {
    async fn acquire(&self, key: &str, ttl: Duration) -> bool {
        let now = Instant::now();
        let mut held = match self.held.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                // A panic while holding the map mutex cannot corrupt the
                // key set itself; fail closed anyway.
                tracing::warn!(key, "lock map mutex poisoned; refusing acquire");
                drop(poisoned);
                return false;
            }
        };
        match held.get(key) {
            Some(expires_at) if *expires_at > now => false,
            _ => {
                held.insert(key.to_string(), now + ttl);
                true
            }
        }
    }

    async fn release(&self, key: &str) {
        if let Ok(mut held) = self.held.lock() {
            held.remove(key);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
