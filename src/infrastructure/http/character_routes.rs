//! Character API routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::application::dto::{
    CharacterListResponseDto, CharacterResponseDto, CreateCharacterRequestDto,
};
use crate::domain::value_objects::CharacterId;
use crate::infrastructure::http::auth::AuthUser;
use crate::infrastructure::http::error::{ApiError, ApiJson};
use crate::infrastructure::state::AppState;

/// List the caller's characters
pub async fn list_characters(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<CharacterListResponseDto>, ApiError> {
    let characters = state.character_service.list_characters(claims.sub).await?;

    Ok(Json(CharacterListResponseDto {
        characters: characters
            .into_iter()
            .map(CharacterResponseDto::from)
            .collect(),
    }))
}

/// Create a character owned by the caller
pub async fn create_character(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    ApiJson(req): ApiJson<CreateCharacterRequestDto>,
) -> Result<(StatusCode, Json<CharacterResponseDto>), ApiError> {
    let character = state
        .character_service
        .create_character(claims.sub, req.into())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CharacterResponseDto::from(character)),
    ))
}

/// Get one of the caller's characters
pub async fn get_character(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<CharacterResponseDto>, ApiError> {
    let id: CharacterId = id
        .parse()
        .map_err(|_| ApiError::validation("Invalid character ID"))?;

    let character = state.character_service.get_character(claims.sub, id).await?;
    Ok(Json(CharacterResponseDto::from(character)))
}
