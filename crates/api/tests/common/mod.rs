use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use sqlx::PgPool;
use tower::ServiceExt;

use stayhub_api::config::ServerConfig;
use stayhub_api::router::build_app_router;
use stayhub_api::state::AppState;
use stayhub_booking::ReservationCoordinator;
use stayhub_core::config::BookingConfig;
use stayhub_core::lock::MemoryLockStore;
use stayhub_core::types::DbId;
use stayhub_events::{EventBus, Notifier};
use stayhub_payments::{GatewayConfig, PaymentGateway};

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
    }
}

/// Gateway credentials used by payment callback tests. The URLs are never
/// dialled; only signing and verification run against them.
pub fn test_gateway_config() -> GatewayConfig {
    GatewayConfig {
        tmn_code: "STAYHUB1".into(),
        hash_secret: "integration-test-secret".into(),
        pay_url: "https://sandbox.example/paymentv2/vpcpay.html".into(),
        api_url: "https://sandbox.example/merchant_webapi/api/transaction".into(),
        return_url: "http://localhost:3000/payments/return".into(),
        api_timeout: Duration::from_secs(10),
    }
}

/// Build the full application router with all middleware layers.
///
/// Mirrors router construction in `main.rs` (via `build_app_router`) so
/// integration tests exercise the production middleware stack. Payments are
/// disabled; see [`build_test_app_with_gateway`] for the configured variant.
pub fn build_test_app(pool: PgPool) -> Router {
    build_app(pool, None)
}

/// Same as [`build_test_app`] but with a payment gateway wired in, so the
/// callback endpoints verify real signatures.
pub fn build_test_app_with_gateway(pool: PgPool) -> Router {
    let gateway =
        PaymentGateway::new(test_gateway_config()).expect("test gateway construction failed");
    build_app(pool, Some(Arc::new(gateway)))
}

fn build_app(pool: PgPool, gateway: Option<Arc<PaymentGateway>>) -> Router {
    let config = test_config();
    let event_bus = Arc::new(EventBus::default());
    let notifier = Arc::new(Notifier::bus_only(Arc::clone(&event_bus)));
    let coordinator = Arc::new(ReservationCoordinator::new(
        pool.clone(),
        Arc::new(MemoryLockStore::new()),
        gateway.clone(),
        notifier,
        BookingConfig::default(),
    ));

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        coordinator,
        gateway,
        event_bus,
    };

    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get_as(app: Router, uri: &str, user_id: DbId) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header("x-user-id", user_id.to_string())
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json_as(
    app: Router,
    uri: &str,
    user_id: DbId,
    body: serde_json::Value,
) -> Response<Body> {
    send_json_as(app, Method::POST, uri, user_id, body).await
}

pub async fn patch_json_as(
    app: Router,
    uri: &str,
    user_id: DbId,
    body: serde_json::Value,
) -> Response<Body> {
    send_json_as(app, Method::PATCH, uri, user_id, body).await
}

async fn send_json_as(
    app: Router,
    method: Method,
    uri: &str,
    user_id: DbId,
    body: serde_json::Value,
) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-user-id", user_id.to_string())
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Read a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    use http_body_util::BodyExt;
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert status and return the parsed body in one step.
pub async fn expect_json(response: Response<Body>, status: StatusCode) -> serde_json::Value {
    assert_eq!(response.status(), status);
    body_json(response).await
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub async fn seed_user(pool: &PgPool, email: &str) -> DbId {
    sqlx::query_scalar("INSERT INTO users (email, full_name) VALUES ($1, 'Guest') RETURNING id")
        .bind(email)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn seed_room(pool: &PgPool, nightly_price: i64, total_count: i32) -> DbId {
    let hotel_id: DbId = sqlx::query_scalar(
        "INSERT INTO hotels (name, city) VALUES ('Harborview', 'Da Nang') RETURNING id",
    )
    .fetch_one(pool)
    .await
    .unwrap();
    stayhub_db::repositories::RoomRepo::create(
        pool,
        hotel_id,
        "Deluxe King",
        2,
        nightly_price,
        total_count,
    )
    .await
    .unwrap()
}
