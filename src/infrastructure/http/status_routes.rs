//! Health and status routes

use axum::Json;

use crate::application::dto::StatusResponseDto;

pub async fn health_check() -> &'static str {
    "OK"
}

/// Describe the API and its endpoints
pub async fn api_status() -> Json<StatusResponseDto> {
    Json(StatusResponseDto::operational())
}
