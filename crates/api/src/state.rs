use std::sync::Arc;

use trainhub_core::engine::LearningEngine;

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: trainhub_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// WebSocket connection manager (browser clients).
    pub ws_manager: Arc<WsManager>,
    /// Assignment and progress engine over the shared pool.
    pub engine: LearningEngine,
}

impl AppState {
    pub fn new(pool: trainhub_db::DbPool, config: ServerConfig, ws_manager: Arc<WsManager>) -> Self {
        let store = Arc::new(trainhub_db::PgLearningStore::new(pool.clone()));
        Self {
            pool,
            config: Arc::new(config),
            ws_manager,
            engine: LearningEngine::new(store),
        }
    }
}
