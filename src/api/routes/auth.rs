//! Auth Routes
//!
//! - POST /api/v1/auth/register - Create an account, returns a token
//! - POST /api/v1/auth/login - Exchange credentials for a token
//! - GET /api/v1/auth/me - Profile of the bearer token's owner

use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::DataResponse;
use crate::api::error::ApiResult;
use crate::api::middleware::AuthUser;
use crate::api::state::AppState;
use crate::auth::{AuthResponse, LoginRequest, RegisterRequest, UserProfile};

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<DataResponse<AuthResponse>>)> {
    let Json(req) = body?;
    let session = state.auth.register(req).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::ok(session))))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<DataResponse<AuthResponse>>> {
    let Json(req) = body?;
    let session = state.auth.login(req).await?;
    Ok(Json(DataResponse::ok(session)))
}

/// GET /api/v1/auth/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> ApiResult<Json<DataResponse<UserProfile>>> {
    let profile = state.auth.me(&claims).await?;
    Ok(Json(DataResponse::ok(profile)))
}
