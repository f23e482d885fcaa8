//! Postgres-backed [`LockStore`].
//!
//! Locks live in the `booking_locks` table, one row per live key. Acquire
//! is a single atomic statement: the INSERT either creates the row or takes
//! over a row whose TTL has lapsed; a live holder makes the statement affect
//! zero rows. Postgres unique-index semantics give the at-most-one-holder
//! guarantee across service instances.
//!
//! Fail-closed: any database error during acquire is logged and reported as
//! "not acquired", so callers surface a retryable conflict rather than an
//! internal error.

use std::time::Duration;

use stayhub_core::lock::LockStore;
use uuid::Uuid;

use crate::DbPool;

/// Distributed try-lock backed by the `booking_locks` table.
pub struct PgLockStore {
    pool: DbPool,
    /// Identifies this service instance in the `holder` column; useful when
    /// diagnosing stuck locks.
    holder: String,
}

impl PgLockStore {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            holder: format!("stayhub-{}", Uuid::new_v4()),
        }
    }
}

#[async_trait::async_trait]
impl LockStore for PgLockStore {
    async fn acquire(&self, key: &str, ttl: Duration) -> bool {
        let ttl_secs = ttl.as_secs_f64();
        let result = sqlx::query(
            "INSERT INTO booking_locks (lock_key, holder, acquired_at, expires_at) \
             VALUES ($1, $2, NOW(), NOW() + $3 * INTERVAL '1 second') \
             ON CONFLICT (lock_key) DO UPDATE \
             SET holder = EXCLUDED.holder, \
                 acquired_at = EXCLUDED.acquired_at, \
                 expires_at = EXCLUDED.expires_at \
             WHERE booking_locks.expires_at <= NOW()",
        )
        .bind(key)
        .bind(&self.holder)
        .bind(ttl_secs)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => done.rows_affected() > 0,
            Err(err) => {
                tracing::warn!(key, error = %err, "lock store unreachable; refusing acquire");
                false
            }
        }
    }

    async fn release(&self, key: &str) {
        if let Err(err) = sqlx::query("DELETE FROM booking_locks WHERE lock_key = $1")
            .bind(key)
            .execute(&self.pool)
            .await
        {
            // TTL expiry will reclaim the row; nothing else to do here.
            tracing::warn!(key, error = %err, "failed to release lock");
        }
    }
}
