use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stayhub_api::config::ServerConfig;
use stayhub_api::router::build_app_router;
use stayhub_api::state::AppState;
use stayhub_booking::ReservationCoordinator;
use stayhub_core::config::BookingConfig;
use stayhub_db::PgLockStore;
use stayhub_events::{EmailConfig, EmailDelivery, EventBus, Notifier};
use stayhub_payments::{GatewayConfig, PaymentGateway};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stayhub_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    let booking_config = BookingConfig::from_env();

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = stayhub_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    stayhub_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    stayhub_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Distributed lock store ---
    let locks = Arc::new(PgLockStore::new(pool.clone()));

    // --- Payment gateway ---
    let gateway = match GatewayConfig::from_env() {
        Some(gateway_config) => {
            let gateway = PaymentGateway::new(gateway_config)
                .expect("Failed to construct payment gateway client");
            tracing::info!("Payment gateway configured");
            Some(Arc::new(gateway))
        }
        None => {
            tracing::warn!("VNP_TMN_CODE/VNP_HASH_SECRET unset; payments disabled");
            None
        }
    };

    // --- Event bus and notifications ---
    let event_bus = Arc::new(EventBus::default());
    let email = EmailConfig::from_env().map(|email_config| {
        tracing::info!("SMTP configured; booking emails enabled");
        Arc::new(EmailDelivery::new(email_config))
    });
    let notifier = Arc::new(Notifier::new(Arc::clone(&event_bus), email));

    // --- Reservation coordinator ---
    let coordinator = Arc::new(ReservationCoordinator::new(
        pool.clone(),
        locks,
        gateway.clone(),
        notifier,
        booking_config,
    ));

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        coordinator,
        gateway,
        event_bus,
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
