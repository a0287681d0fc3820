//! Bearer token extractor

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::application::services::Claims;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::state::AppState;

/// The caller, authenticated by `Authorization: Bearer <jwt>`.
/// Usage: `AuthUser(claims)` in handler parameters.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("Invalid Authorization header format"))?;

        let claims = state.auth_service.verify_token(token)?;
        Ok(AuthUser(claims))
    }
}
