//! Ingest Routes
//!
//! - POST /api/v1/analytics/batch - Store a batch of events
//!
//! Stored events are announced on the `analytics` WebSocket topic so open
//! dashboards can refresh.

use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::{BatchIngestRequest, DataResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::storage::AnalyticsEvent;
use crate::websocket::WsEvent;

/// POST /api/v1/analytics/batch
pub async fn ingest_batch(
    State(state): State<Arc<AppState>>,
    body: Result<Json<BatchIngestRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<DataResponse<Vec<AnalyticsEvent>>>)> {
    let Json(req) = body?;
    req.validate().map_err(ApiError::Validation)?;

    let store = Arc::clone(&state.store);
    let stored = tokio::task::spawn_blocking(move || store.insert_batch(req.events))
        .await
        .map_err(|e| ApiError::Internal(format!("Ingest task failed: {}", e)))??;

    let latest = stored.iter().map(|e| e.timestamp).max();
    let notified = state
        .ws_hub
        .publish(WsEvent::analytics_updated(stored.len(), latest))
        .await;

    tracing::info!(inserted = stored.len(), notified, "Ingested event batch");

    Ok((StatusCode::CREATED, Json(DataResponse::ok(stored))))
}
