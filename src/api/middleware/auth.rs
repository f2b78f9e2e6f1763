//! Bearer token guard
//!
//! Handlers that take an [`AuthUser`] only run for requests carrying a
//! valid `Authorization: Bearer <token>` header; anything else is a 401.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use std::sync::Arc;

use crate::api::{ApiError, AppState};
use crate::auth::{AuthError, Claims};

/// Claims of the authenticated caller
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AuthError::MissingToken)?;
        let claims = state.auth.verify_token(token)?;
        Ok(AuthUser(claims))
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
