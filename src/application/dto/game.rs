use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::services::{CreateGameRequest, UpdateGameRequest};
use crate::domain::entities::{Game, GameStatus};
use crate::domain::value_objects::UserId;

#[derive(Debug, Deserialize)]
pub struct CreateGameRequestDto {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub player_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateGameRequestDto {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub player_ids: Vec<String>,
    #[serde(default)]
    pub status: Option<GameStatus>,
}

fn parse_players(ids: Vec<String>) -> Result<Vec<UserId>, String> {
    ids.into_iter()
        .map(|id| {
            id.parse::<UserId>()
                .map_err(|_| format!("Invalid player ID: {}", id))
        })
        .collect()
}

impl TryFrom<CreateGameRequestDto> for CreateGameRequest {
    type Error = String;

    fn try_from(dto: CreateGameRequestDto) -> Result<Self, Self::Error> {
        Ok(Self {
            name: dto.name,
            description: dto.description,
            player_ids: parse_players(dto.player_ids)?,
        })
    }
}

impl TryFrom<UpdateGameRequestDto> for UpdateGameRequest {
    type Error = String;

    fn try_from(dto: UpdateGameRequestDto) -> Result<Self, Self::Error> {
        Ok(Self {
            name: dto.name,
            description: dto.description,
            player_ids: parse_players(dto.player_ids)?,
            status: dto.status,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct GameResponseDto {
    pub id: String,
    pub name: String,
    pub description: String,
    pub dm_user_id: String,
    pub player_ids: Vec<String>,
    pub status: GameStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Game> for GameResponseDto {
    fn from(game: Game) -> Self {
        Self {
            id: game.id.to_string(),
            name: game.name,
            description: game.description,
            dm_user_id: game.dm_user_id.to_string(),
            player_ids: game.player_ids.iter().map(ToString::to_string).collect(),
            status: game.status,
            created_at: game.created_at,
            updated_at: game.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GameListResponseDto {
    pub games: Vec<GameResponseDto>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_ids_must_be_uuids() {
        let dto: CreateGameRequestDto = serde_json::from_value(serde_json::json!({
            "name": "Tomb of Annihilation",
            "player_ids": ["not-a-uuid"]
        }))
        .unwrap();
        let error = CreateGameRequest::try_from(dto).unwrap_err();
        assert!(error.contains("not-a-uuid"));
    }

    #[test]
    fn test_update_status_is_optional() {
        let dto: UpdateGameRequestDto =
            serde_json::from_value(serde_json::json!({ "name": "Tomb" })).unwrap();
        let request = UpdateGameRequest::try_from(dto).unwrap();
        assert!(request.status.is_none());
        assert!(request.player_ids.is_empty());

        let dto: UpdateGameRequestDto = serde_json::from_value(
            serde_json::json!({ "name": "Tomb", "status": "completed" }),
        )
        .unwrap();
        assert_eq!(
            UpdateGameRequest::try_from(dto).unwrap().status,
            Some(GameStatus::Completed)
        );
    }
}
