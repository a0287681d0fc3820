//! Game API routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::application::dto::{
    CreateGameRequestDto, GameListResponseDto, GameResponseDto, UpdateGameRequestDto,
};
use crate::application::services::{CreateGameRequest, UpdateGameRequest};
use crate::domain::value_objects::GameId;
use crate::infrastructure::http::auth::AuthUser;
use crate::infrastructure::http::error::{ApiError, ApiJson};
use crate::infrastructure::state::AppState;

fn parse_game_id(id: &str) -> Result<GameId, ApiError> {
    id.parse()
        .map_err(|_| ApiError::validation("Invalid game ID"))
}

/// Games the caller runs or plays in
pub async fn list_games(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<GameListResponseDto>, ApiError> {
    let games = state.game_service.list_games(claims.sub).await?;

    Ok(Json(GameListResponseDto {
        games: games.into_iter().map(GameResponseDto::from).collect(),
    }))
}

/// Create a game with the caller as DM
pub async fn create_game(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    ApiJson(req): ApiJson<CreateGameRequestDto>,
) -> Result<(StatusCode, Json<GameResponseDto>), ApiError> {
    let request: CreateGameRequest = req.try_into().map_err(ApiError::validation)?;
    let game = state.game_service.create_game(claims.sub, request).await?;

    Ok((StatusCode::CREATED, Json(GameResponseDto::from(game))))
}

pub async fn get_game(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<GameResponseDto>, ApiError> {
    let id = parse_game_id(&id)?;
    let game = state.game_service.get_game(claims.sub, id).await?;
    Ok(Json(GameResponseDto::from(game)))
}

/// DM only
pub async fn update_game(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateGameRequestDto>,
) -> Result<Json<GameResponseDto>, ApiError> {
    let id = parse_game_id(&id)?;
    let request: UpdateGameRequest = req.try_into().map_err(ApiError::validation)?;
    let game = state
        .game_service
        .update_game(claims.sub, id, request)
        .await?;
    Ok(Json(GameResponseDto::from(game)))
}
