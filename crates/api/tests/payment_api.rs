//! Integration tests for the payment callback endpoints.
//!
//! Queries are signed with the test gateway secret so the handlers run the
//! real verification path.

mod common;

use std::collections::BTreeMap;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{body_json, expect_json, get, post_json_as, seed_room, seed_user};
use serde_json::json;
use sqlx::PgPool;
use stayhub_payments::sign;

const NIGHTLY: i64 = 120_000;

fn future(days: i64) -> String {
    (Utc::now().date_naive() + Duration::days(days)).to_string()
}

/// Build a signed callback query string for the given booking and amount.
fn signed_query(booking_id: i64, amount_minor: i64, response_code: &str) -> String {
    let config = common::test_gateway_config();
    let mut params = BTreeMap::new();
    params.insert("vnp_TmnCode".to_string(), config.tmn_code.clone());
    params.insert("vnp_TxnRef".to_string(), format!("{booking_id}_1767225600"));
    params.insert("vnp_Amount".to_string(), (amount_minor * 100).to_string());
    params.insert("vnp_ResponseCode".to_string(), response_code.to_string());
    params.insert("vnp_TransactionNo".to_string(), "14422574".to_string());

    let hash = sign::sign(&config.hash_secret, &params);
    format!("{}&vnp_SecureHash={hash}", sign::encoded_query(&params))
}

async fn create_booking(app: &axum::Router, pool: &PgPool) -> (i64, i64) {
    let user = seed_user(pool, "a@example.com").await;
    let room = seed_room(pool, NIGHTLY, 1).await;

    let response = post_json_as(
        app.clone(),
        "/api/v1/bookings",
        user,
        json!({
            "room_id": room,
            "check_in": future(30),
            "check_out": future(32),
            "guest_name": "Ana Petrova",
            "guest_email": "ana@example.com",
            "guest_count": 2,
        }),
    )
    .await;
    let created = expect_json(response, StatusCode::CREATED).await;
    let id = created["data"]["booking"]["id"].as_i64().unwrap();
    let total = created["data"]["booking"]["total_price"].as_i64().unwrap();
    (id, total)
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn signed_ipn_confirms_booking(pool: PgPool) {
    let app = common::build_test_app_with_gateway(pool.clone());
    let (booking_id, total) = create_booking(&app, &pool).await;

    let query = signed_query(booking_id, total, "00");
    let response = get(app.clone(), &format!("/api/v1/payments/ipn?{query}")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let receipt = body_json(response).await;
    assert_eq!(receipt["RspCode"], "00");

    let status: String = sqlx::query_scalar("SELECT status FROM bookings WHERE id = $1")
        .bind(booking_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(status, "confirmed");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_ipn_is_acknowledged_as_already_confirmed(pool: PgPool) {
    let app = common::build_test_app_with_gateway(pool.clone());
    let (booking_id, total) = create_booking(&app, &pool).await;

    let query = signed_query(booking_id, total, "00");
    get(app.clone(), &format!("/api/v1/payments/ipn?{query}")).await;
    let response = get(app, &format!("/api/v1/payments/ipn?{query}")).await;

    let receipt = body_json(response).await;
    assert_eq!(receipt["RspCode"], "02");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn tampered_ipn_is_rejected_without_touching_the_booking(pool: PgPool) {
    let app = common::build_test_app_with_gateway(pool.clone());
    let (booking_id, total) = create_booking(&app, &pool).await;

    // Signed for the real amount, then the amount parameter is doubled.
    let query = signed_query(booking_id, total, "00")
        .replace(&format!("vnp_Amount={}", total * 100), &format!("vnp_Amount={}", total * 200));
    let response = get(app, &format!("/api/v1/payments/ipn?{query}")).await;

    let receipt = body_json(response).await;
    assert_eq!(receipt["RspCode"], "97");

    let status: String = sqlx::query_scalar("SELECT status FROM bookings WHERE id = $1")
        .bind(booking_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(status, "pending");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn ipn_for_unknown_booking_reports_order_not_found(pool: PgPool) {
    let app = common::build_test_app_with_gateway(pool);

    let query = signed_query(999_999, 100, "00");
    let response = get(app, &format!("/api/v1/payments/ipn?{query}")).await;

    let receipt = body_json(response).await;
    assert_eq!(receipt["RspCode"], "01");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn ipn_without_gateway_reports_unknown_error(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get(app, "/api/v1/payments/ipn?vnp_TxnRef=1_1").await;
    let receipt = body_json(response).await;
    assert_eq!(receipt["RspCode"], "99");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn payment_return_reports_result_without_confirming(pool: PgPool) {
    let app = common::build_test_app_with_gateway(pool.clone());
    let (booking_id, total) = create_booking(&app, &pool).await;

    let query = signed_query(booking_id, total, "00");
    let response = get(app, &format!("/api/v1/payments/return?{query}")).await;

    let json = expect_json(response, StatusCode::OK).await;
    assert_eq!(json["data"]["paid"], true);
    assert_eq!(json["data"]["booking_id"].as_i64().unwrap(), booking_id);

    // The return leg never drives the transition; only the IPN does.
    let status: String = sqlx::query_scalar("SELECT status FROM bookings WHERE id = $1")
        .bind(booking_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(status, "pending");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn payment_return_with_bad_signature_is_400(pool: PgPool) {
    let app = common::build_test_app_with_gateway(pool);

    let response = get(
        app,
        "/api/v1/payments/return?vnp_TxnRef=1_1&vnp_ResponseCode=00&vnp_SecureHash=deadbeef",
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
