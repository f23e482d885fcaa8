//! Repository for the `rooms` table.
//!
//! Inventory mutation is deliberately narrow: [`RoomRepo::reserve_one`] is
//! the only decrement and it is atomic (`available_count > 0` guard in the
//! UPDATE itself), so even if the distributed lock were bypassed the counter
//! can never go negative.

use sqlx::{PgConnection, PgPool};
use stayhub_core::types::DbId;

use crate::models::room::Room;

/// Column list for `rooms` queries.
const COLUMNS: &str = "id, hotel_id, name, capacity, nightly_price, \
                       available_count, total_count, created_at, updated_at";

/// Provides queries and inventory mutation for rooms.
pub struct RoomRepo;

impl RoomRepo {
    /// Fetch a room by id.
    pub async fn find_by_id(pool: &PgPool, room_id: DbId) -> Result<Option<Room>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM rooms WHERE id = $1");
        sqlx::query_as::<_, Room>(&query)
            .bind(room_id)
            .fetch_optional(pool)
            .await
    }

    /// Fetch a room by id inside an open transaction.
    pub async fn find_by_id_tx(
        conn: &mut PgConnection,
        room_id: DbId,
    ) -> Result<Option<Room>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM rooms WHERE id = $1");
        sqlx::query_as::<_, Room>(&query)
            .bind(room_id)
            .fetch_optional(conn)
            .await
    }

    /// Atomically take one unit of inventory.
    ///
    /// Returns `true` when a unit was taken, `false` when the room had no
    /// availability left. The `available_count > 0` predicate makes the
    /// decrement safe even without the reservation lock.
    pub async fn reserve_one(conn: &mut PgConnection, room_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE rooms \
             SET available_count = available_count - 1, updated_at = NOW() \
             WHERE id = $1 AND available_count > 0",
        )
        .bind(room_id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Return one unit of inventory (cancellation path), capped at
    /// `total_count`.
    ///
    /// Returns `true` if the counter moved. Releasing inventory cannot
    /// create a double-booking, so this runs without the reservation lock.
    pub async fn release_one(conn: &mut PgConnection, room_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE rooms \
             SET available_count = available_count + 1, updated_at = NOW() \
             WHERE id = $1 AND available_count < total_count",
        )
        .bind(room_id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Current `available_count` for a room.
    pub async fn available_count(pool: &PgPool, room_id: DbId) -> Result<Option<i32>, sqlx::Error> {
        sqlx::query_scalar("SELECT available_count FROM rooms WHERE id = $1")
            .bind(room_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a room, returning the generated ID. Used by fixtures and
    /// admin tooling; room CRUD is otherwise outside this service.
    pub async fn create(
        pool: &PgPool,
        hotel_id: DbId,
        name: &str,
        capacity: i32,
        nightly_price: i64,
        total_count: i32,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO rooms (hotel_id, name, capacity, nightly_price, available_count, total_count) \
             VALUES ($1, $2, $3, $4, $5, $5) \
             RETURNING id",
        )
        .bind(hotel_id)
        .bind(name)
        .bind(capacity)
        .bind(nightly_price)
        .bind(total_count)
        .fetch_one(pool)
        .await
    }
}
