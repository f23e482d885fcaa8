use std::sync::Arc;

use stayhub_booking::ReservationCoordinator;
use stayhub_payments::PaymentGateway;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: stayhub_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// The reservation coordinator; owns every booking mutation.
    pub coordinator: Arc<ReservationCoordinator>,
    /// Payment gateway, `None` when payments are not configured. Shared
    /// with the coordinator so callback verification and URL minting use
    /// the same credentials.
    pub gateway: Option<Arc<PaymentGateway>>,
    /// Broadcast bus carrying booking lifecycle events.
    pub event_bus: Arc<stayhub_events::EventBus>,
}
