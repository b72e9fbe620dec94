use std::sync::Arc;

use crate::config::ServerConfig;
use crate::progress::ProgressStore;
use crate::ws::ControlHub;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: chefboard_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Channel-scoped control message hub (chef daemon listeners).
    pub control_hub: Arc<ControlHub>,
    /// Live run-progress store (redis hash per run id).
    pub progress: ProgressStore,
}
