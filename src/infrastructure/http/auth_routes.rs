//! Registration and login routes

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::application::dto::{
    LoginRequestDto, LoginResponseDto, RegisterRequestDto, RegisterResponseDto, UserResponseDto,
};
use crate::infrastructure::http::error::{ApiError, ApiJson};
use crate::infrastructure::state::AppState;

/// Register a new user
pub async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<RegisterRequestDto>,
) -> Result<(StatusCode, Json<RegisterResponseDto>), ApiError> {
    let user = state.auth_service.register(req.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponseDto {
            message: "User registered successfully".to_string(),
            user: UserResponseDto::from(user),
        }),
    ))
}

/// Exchange credentials for a bearer token
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequestDto>,
) -> Result<Json<LoginResponseDto>, ApiError> {
    let (token, user) = state.auth_service.login(req.into()).await?;

    Ok(Json(LoginResponseDto {
        token,
        user: UserResponseDto::from(user),
    }))
}
