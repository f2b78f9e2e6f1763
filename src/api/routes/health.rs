//! Health Routes
//!
//! Health check endpoints for monitoring and Kubernetes probes.
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health/ready - Readiness probe (database answers)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;

/// GET /health/live
///
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
///
/// Returns 200 once the database answers a trivial query.
pub async fn readiness(State(state): State<Arc<AppState>>) -> StatusCode {
    if check_database(&state).await.is_some() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /health
///
/// Full health status with component details.
pub async fn full_health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let events = check_database(&state).await;

    let (status, code) = match events {
        Some(_) => ("healthy", StatusCode::OK),
        None => ("unhealthy", StatusCode::SERVICE_UNAVAILABLE),
    };

    let body = HealthResponse {
        status: status.to_string(),
        database: if events.is_some() { "ok" } else { "error" }.to_string(),
        events,
        ws_connections: state.ws_hub.connection_count().await,
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (code, Json(body))
}

/// Ping the database and count stored events, `None` on failure
async fn check_database(state: &AppState) -> Option<u64> {
    let store = Arc::clone(&state.store);
    let result = tokio::task::spawn_blocking(move || {
        store.ping()?;
        store.len()
    })
    .await;

    match result {
        Ok(Ok(count)) => Some(count),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Database health check failed");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "Health check task failed");
            None
        }
    }
}
