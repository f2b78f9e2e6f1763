//! Analytics Routes
//!
//! Read-only dashboard queries. Every endpoint accepts the shared filter
//! parameters (`startDate`, `endDate`, `region`, `category`, `source`).
//!
//! - GET /api/v1/analytics/aggregates - Totals and averages
//! - GET /api/v1/analytics/chart - Time-bucketed series (`interval`)
//! - GET /api/v1/analytics - Paginated records (`page`, `limit`)
//! - GET /api/v1/analytics/:id - Single record
//!
//! `batch` belongs to the ingest route, so `GET /analytics/batch` is answered
//! as a malformed id rather than a 405.

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use std::collections::HashMap;
use std::sync::Arc;

use crate::api::dto::{DataResponse, ListResponse};
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::query::{AnalyticsFilter, QueryError};
use crate::storage::{Aggregate, AnalyticsEvent, ChartBucket};

type Params = Result<Query<HashMap<String, String>>, QueryRejection>;

fn parse_filter(params: Params) -> ApiResult<AnalyticsFilter> {
    let Query(params) = params?;
    Ok(AnalyticsFilter::from_params(&params)?)
}

/// GET /api/v1/analytics/aggregates
pub async fn get_aggregates(
    State(state): State<Arc<AppState>>,
    params: Params,
) -> ApiResult<Json<DataResponse<Aggregate>>> {
    let filter = parse_filter(params)?;
    let aggregate = state.analytics.get_aggregates(&filter).await?;
    Ok(Json(DataResponse::ok(aggregate)))
}

/// GET /api/v1/analytics/chart
pub async fn get_chart(
    State(state): State<Arc<AppState>>,
    params: Params,
) -> ApiResult<Json<DataResponse<Vec<ChartBucket>>>> {
    let filter = parse_filter(params)?;
    let buckets = state.analytics.get_chart_data(&filter).await?;
    Ok(Json(DataResponse::ok(buckets)))
}

/// GET /api/v1/analytics
pub async fn list_analytics(
    State(state): State<Arc<AppState>>,
    params: Params,
) -> ApiResult<Json<ListResponse>> {
    let filter = parse_filter(params)?;
    let page = state.analytics.get_paginated(&filter).await?;
    Ok(Json(page.into()))
}

/// GET /api/v1/analytics/:id
pub async fn get_analytics_by_id(
    State(state): State<Arc<AppState>>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<DataResponse<AnalyticsEvent>>> {
    let Path(id) = path?;
    let event = state.analytics.get_by_id(&id).await?;
    Ok(Json(DataResponse::ok(event)))
}

/// GET /api/v1/analytics/batch
pub async fn get_reserved_batch_id() -> ApiResult<Json<DataResponse<AnalyticsEvent>>> {
    Err(QueryError::InvalidId("batch".to_string()).into())
}
