//! # Analytics Dashboard
//!
//! Backend for an e-commerce analytics dashboard: stores analytics events
//! and answers the filtered read queries a dashboard needs.
//!
//! ## Features
//!
//! - **Aggregates**: totals, averages and distinct dimension counts
//! - **Charts**: per-day, per-hour or per-timestamp series that reconcile
//!   with the aggregates
//! - **Listing**: stable newest-first pagination
//! - **Real-time**: WebSocket invalidation notices after ingest
//! - **Accounts**: register / login with argon2 hashes and JWT sessions
//!
//! ## Modules
//!
//! - [`storage`]: SQLite event store and synthetic seeding
//! - [`query`]: Filter normalization and query operations
//! - [`api`]: REST API server with Axum
//! - [`websocket`]: Invalidation feed
//! - [`auth`]: Accounts and session tokens
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use analytics_dashboard::query::{AnalyticsFilter, AnalyticsService};
//! use analytics_dashboard::storage::{seed_store, EventStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(EventStore::open("./data/analytics.db")?);
//!     if store.is_empty()? {
//!         seed_store(&store, 10_000, 42)?;
//!     }
//!
//!     let service = AnalyticsService::new(store);
//!     let filter = AnalyticsFilter::new().region("Europe");
//!
//!     let totals = service.get_aggregates(&filter).await?;
//!     println!("Europe revenue: {:.2}", totals.total_revenue);
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod query;
pub mod storage;
pub mod websocket;

// Re-export top-level types for convenience
pub use storage::{
    Aggregate, AnalyticsEvent, BucketInterval, ChartBucket, EventPredicate, EventStore, NewEvent,
    StorageError, StorageResult, User, UserRepository,
};

pub use query::{AnalyticsFilter, AnalyticsService, Page, Pagination, QueryError, QueryResult};

pub use api::{build_router, serve, ApiError, AppState};

pub use websocket::{ClientMessage, ConnectionHub, HubConfig, HubError, ServerMessage, WsEvent};

pub use auth::{AuthError, AuthService, Claims, TokenIssuer};

pub use config::{AuthConfig, Config, ConfigError, LoggingConfig};
