//! Analytics Dashboard REST API
//!
//! HTTP API layer, built with Axum.
//!
//! # Endpoints
//!
//! ## Analytics
//! - `GET /api/v1/analytics/aggregates` - Totals, averages, distinct counts
//! - `GET /api/v1/analytics/chart` - Time-bucketed series
//! - `GET /api/v1/analytics` - Paginated records, newest first
//! - `GET /api/v1/analytics/:id` - Single record
//!
//! ## Ingest
//! - `POST /api/v1/analytics/batch` - Store up to 1000 events
//!
//! ## Auth
//! - `POST /api/v1/auth/register` - Create an account
//! - `POST /api/v1/auth/login` - Issue a bearer token
//! - `GET /api/v1/auth/me` - Current user (bearer token required)
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! ## WebSocket
//! - `GET /api/v1/ws` - Invalidation feed
//!
//! Everything under `/api/v1` except WebSocket upgrades counts against a
//! per-IP rate limit (`api.rate_limit_*`).
//!
//! # Example
//!
//! ```rust,ignore
//! use analytics_dashboard::api::{serve, AppState};
//! use analytics_dashboard::config::Config;
//! use analytics_dashboard::storage::EventStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let store = Arc::new(EventStore::open(&config.database.path)?);
//!
//!     serve(AppState::new(store, config)).await?;
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::websocket::{websocket_handler, WsEvent};
use middleware::RateLimiter;

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/analytics", get(routes::analytics::list_analytics))
        .route("/analytics/aggregates", get(routes::analytics::get_aggregates))
        .route("/analytics/chart", get(routes::analytics::get_chart))
        .route(
            "/analytics/batch",
            post(routes::ingest::ingest_batch).get(routes::analytics::get_reserved_batch_id),
        )
        .route("/analytics/:id", get(routes::analytics::get_analytics_by_id))
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/me", get(routes::auth::me))
        .route("/ws", get(websocket_handler));

    let api = &state.config.api;
    let api_routes = if api.rate_limit_max_requests > 0 {
        let limiter = Arc::new(RateLimiter::new(
            api.rate_limit_max_requests,
            Duration::from_secs(api.rate_limit_window_secs.max(1)),
        ));
        api_routes.layer(axum::middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit,
        ))
    } else {
        api_routes
    };

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let cors = cors_layer(&state.config.api.cors_origins);
    let timeout = Duration::from_secs(state.config.api.request_timeout_secs.max(1));
    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

/// CORS policy from configured origins; `*` allows any origin
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}

/// Start the API server
pub async fn serve(state: AppState) -> Result<(), ApiError> {
    let addr = state.config.bind_addr();
    let hub = Arc::clone(&state.ws_hub);
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Analytics API listening on {}", addr);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown_signal().await;
        hub.publish(WsEvent::system("Server shutting down")).await;
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Analytics API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
