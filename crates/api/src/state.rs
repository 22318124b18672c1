use std::sync::Arc;

use pressroom_core::delivery::DeliveryProvider;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: pressroom_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Outbound email delivery.
    pub delivery: Arc<dyn DeliveryProvider>,
}
