use std::sync::Arc;

use shiftguard_engine::Engine;
use shiftguard_events::EventBus;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Replacement engine wired to the roster store.
    pub engine: Arc<Engine>,
    pub config: Arc<ServerConfig>,
    /// Event bus the engine publishes to; subscribed by persistence.
    pub event_bus: Arc<EventBus>,
}
