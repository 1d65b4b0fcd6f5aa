use std::sync::Arc;

use crate::config::ServerConfig;
use crate::engine::locks::SessionLockMap;
use crate::ws::DeviceManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: rollcall_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// WebSocket connection manager (room devices).
    pub device_manager: Arc<DeviceManager>,
    /// Centralized event bus for publishing domain events.
    pub event_bus: Arc<rollcall_events::EventBus>,
    /// Per-occurrence mutual-exclusion locks for session mutations.
    pub session_locks: Arc<SessionLockMap>,
}
