//! Integration tests for the booking and room repositories.
//!
//! Exercises the conflict scan, the atomic inventory decrement, and the
//! SQL-guarded state transitions against a real database.

use chrono::NaiveDate;
use sqlx::PgPool;
use stayhub_core::booking::{BookingStatus, PaymentStatus};
use stayhub_core::types::DbId;
use stayhub_db::models::booking::NewBooking;
use stayhub_db::repositories::{BookingRepo, RoomRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn seed_user(pool: &PgPool) -> DbId {
    sqlx::query_scalar(
        "INSERT INTO users (email, full_name) VALUES ('guest@example.com', 'Guest') RETURNING id",
    )
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn seed_room(pool: &PgPool, total_count: i32) -> DbId {
    let hotel_id: DbId =
        sqlx::query_scalar("INSERT INTO hotels (name, city) VALUES ('Harborview', 'Da Nang') RETURNING id")
            .fetch_one(pool)
            .await
            .unwrap();
    RoomRepo::create(pool, hotel_id, "Deluxe King", 2, 120_000, total_count)
        .await
        .unwrap()
}

fn new_booking(user_id: DbId, room_id: DbId, check_in: NaiveDate, check_out: NaiveDate) -> NewBooking {
    let nights = (check_out - check_in).num_days() as i32;
    NewBooking {
        user_id,
        room_id,
        check_in,
        check_out,
        nights,
        guest_name: "Guest".into(),
        guest_email: "guest@example.com".into(),
        guest_phone: None,
        guest_count: 2,
        total_price: 120_000 * i64::from(nights),
        status: BookingStatus::Pending,
        payment_status: PaymentStatus::Pending,
    }
}

async fn insert_booking(
    pool: &PgPool,
    user_id: DbId,
    room_id: DbId,
    check_in: NaiveDate,
    check_out: NaiveDate,
) -> DbId {
    let mut tx = pool.begin().await.unwrap();
    let booking = BookingRepo::create(&mut tx, &new_booking(user_id, room_id, check_in, check_out))
        .await
        .unwrap();
    tx.commit().await.unwrap();
    booking.id
}

// ---------------------------------------------------------------------------
// Conflict scan
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn overlapping_booking_conflicts(pool: PgPool) {
    let user_id = seed_user(&pool).await;
    let room_id = seed_room(&pool, 1).await;
    insert_booking(&pool, user_id, room_id, date(2026, 2, 1), date(2026, 2, 3)).await;

    let mut conn = pool.acquire().await.unwrap();
    let conflict =
        BookingRepo::has_conflict(&mut conn, room_id, date(2026, 2, 2), date(2026, 2, 4), None)
            .await
            .unwrap();
    assert!(conflict);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn back_to_back_stay_does_not_conflict(pool: PgPool) {
    let user_id = seed_user(&pool).await;
    let room_id = seed_room(&pool, 1).await;
    insert_booking(&pool, user_id, room_id, date(2026, 2, 1), date(2026, 2, 3)).await;

    let mut conn = pool.acquire().await.unwrap();
    let conflict =
        BookingRepo::has_conflict(&mut conn, room_id, date(2026, 2, 3), date(2026, 2, 5), None)
            .await
            .unwrap();
    assert!(!conflict);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn cancelled_booking_does_not_conflict(pool: PgPool) {
    let user_id = seed_user(&pool).await;
    let room_id = seed_room(&pool, 1).await;
    let booking_id =
        insert_booking(&pool, user_id, room_id, date(2026, 2, 1), date(2026, 2, 3)).await;

    let mut conn = pool.acquire().await.unwrap();
    BookingRepo::confirm(&mut conn, booking_id, Some("TX1")).await.unwrap();
    BookingRepo::cancel(&mut conn, booking_id, "plans changed").await.unwrap();

    let conflict =
        BookingRepo::has_conflict(&mut conn, room_id, date(2026, 2, 1), date(2026, 2, 3), None)
            .await
            .unwrap();
    assert!(!conflict);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn conflict_scan_excludes_own_booking(pool: PgPool) {
    let user_id = seed_user(&pool).await;
    let room_id = seed_room(&pool, 1).await;
    let booking_id =
        insert_booking(&pool, user_id, room_id, date(2026, 2, 1), date(2026, 2, 3)).await;

    let mut conn = pool.acquire().await.unwrap();
    let conflict = BookingRepo::has_conflict(
        &mut conn,
        room_id,
        date(2026, 2, 1),
        date(2026, 2, 4),
        Some(booking_id),
    )
    .await
    .unwrap();
    assert!(!conflict);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn other_rooms_do_not_conflict(pool: PgPool) {
    let user_id = seed_user(&pool).await;
    let room_a = seed_room(&pool, 1).await;
    let room_b = seed_room(&pool, 1).await;
    insert_booking(&pool, user_id, room_a, date(2026, 2, 1), date(2026, 2, 3)).await;

    let mut conn = pool.acquire().await.unwrap();
    let conflict =
        BookingRepo::has_conflict(&mut conn, room_b, date(2026, 2, 1), date(2026, 2, 3), None)
            .await
            .unwrap();
    assert!(!conflict);
}

// ---------------------------------------------------------------------------
// Inventory counter
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn reserve_one_stops_at_zero(pool: PgPool) {
    let room_id = seed_room(&pool, 2).await;
    let mut conn = pool.acquire().await.unwrap();

    assert!(RoomRepo::reserve_one(&mut conn, room_id).await.unwrap());
    assert!(RoomRepo::reserve_one(&mut conn, room_id).await.unwrap());
    assert!(!RoomRepo::reserve_one(&mut conn, room_id).await.unwrap());

    assert_eq!(RoomRepo::available_count(&pool, room_id).await.unwrap(), Some(0));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn release_one_caps_at_total(pool: PgPool) {
    let room_id = seed_room(&pool, 1).await;
    let mut conn = pool.acquire().await.unwrap();

    // Counter is already at total_count; release must not move it.
    assert!(!RoomRepo::release_one(&mut conn, room_id).await.unwrap());

    assert!(RoomRepo::reserve_one(&mut conn, room_id).await.unwrap());
    assert!(RoomRepo::release_one(&mut conn, room_id).await.unwrap());
    assert_eq!(RoomRepo::available_count(&pool, room_id).await.unwrap(), Some(1));
}

// ---------------------------------------------------------------------------
// Guarded state transitions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn confirm_applies_exactly_once(pool: PgPool) {
    let user_id = seed_user(&pool).await;
    let room_id = seed_room(&pool, 1).await;
    let booking_id =
        insert_booking(&pool, user_id, room_id, date(2026, 2, 1), date(2026, 2, 3)).await;

    let mut conn = pool.acquire().await.unwrap();
    assert!(BookingRepo::confirm(&mut conn, booking_id, Some("TX1")).await.unwrap());
    // Second confirm is a no-op, not an error.
    assert!(!BookingRepo::confirm(&mut conn, booking_id, Some("TX2")).await.unwrap());

    let booking = BookingRepo::find_by_id(&pool, booking_id).await.unwrap().unwrap();
    assert_eq!(booking.status().unwrap(), BookingStatus::Confirmed);
    assert_eq!(booking.payment_status().unwrap(), PaymentStatus::Completed);
    assert_eq!(booking.transaction_no.as_deref(), Some("TX1"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn cancel_requires_confirmed(pool: PgPool) {
    let user_id = seed_user(&pool).await;
    let room_id = seed_room(&pool, 1).await;
    let booking_id =
        insert_booking(&pool, user_id, room_id, date(2026, 2, 1), date(2026, 2, 3)).await;

    let mut conn = pool.acquire().await.unwrap();
    // Still pending: the guarded UPDATE matches no row.
    assert!(!BookingRepo::cancel(&mut conn, booking_id, "changed my mind").await.unwrap());

    BookingRepo::confirm(&mut conn, booking_id, None).await.unwrap();
    assert!(BookingRepo::cancel(&mut conn, booking_id, "changed my mind").await.unwrap());

    let booking = BookingRepo::find_by_id(&pool, booking_id).await.unwrap().unwrap();
    assert_eq!(booking.status().unwrap(), BookingStatus::Cancelled);
    assert_eq!(booking.cancel_reason.as_deref(), Some("changed my mind"));
    assert!(booking.cancelled_at.is_some());
}
