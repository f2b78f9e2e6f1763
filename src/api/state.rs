//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use crate::auth::{AuthService, TokenIssuer};
use crate::config::Config;
use crate::query::AnalyticsService;
use crate::storage::EventStore;
use crate::websocket::{ConnectionHub, HubConfig};
use std::sync::Arc;
use std::time::Instant;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Event store for writes and health checks
    pub store: Arc<EventStore>,
    /// Read-side query operations
    pub analytics: AnalyticsService,
    pub config: Arc<Config>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
    /// WebSocket connection hub for invalidation notices
    pub ws_hub: Arc<ConnectionHub>,
    /// Accounts and session tokens, backed by the store's user table
    pub auth: AuthService,
}

impl AppState {
    pub fn new(store: Arc<EventStore>, config: Config) -> Self {
        let analytics =
            AnalyticsService::new(Arc::clone(&store)).with_max_page_size(config.query.max_page_size);
        let auth = AuthService::new(store.clone(), TokenIssuer::from_config(&config.auth));
        let hub_config = HubConfig {
            max_connections: config.api.max_ws_connections,
        };

        Self {
            store,
            analytics,
            config: Arc::new(config),
            start_time: Instant::now(),
            ws_hub: Arc::new(ConnectionHub::new(hub_config)),
            auth,
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
