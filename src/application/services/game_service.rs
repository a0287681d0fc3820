//! Game Service - Campaigns run by a dungeon master
//!
//! The DM and the listed players can see a game; only the DM may change it.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument};

use crate::application::ports::outbound::GameRepositoryPort;
use crate::domain::entities::{Game, GameStatus};
use crate::domain::value_objects::{GameId, UserId};

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("{0}")]
    Validation(String),

    #[error("Game not found: {0}")]
    NotFound(GameId),

    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Clone)]
pub struct CreateGameRequest {
    pub name: String,
    pub description: String,
    pub player_ids: Vec<UserId>,
}

/// Replaces the game's details; the status is kept when not given
#[derive(Debug, Clone)]
pub struct UpdateGameRequest {
    pub name: String,
    pub description: String,
    pub player_ids: Vec<UserId>,
    pub status: Option<GameStatus>,
}

#[async_trait]
pub trait GameService: Send + Sync {
    async fn create_game(&self, dm: UserId, request: CreateGameRequest)
        -> Result<Game, GameError>;

    async fn get_game(&self, user_id: UserId, id: GameId) -> Result<Game, GameError>;

    async fn list_games(&self, user_id: UserId) -> Result<Vec<Game>, GameError>;

    async fn update_game(
        &self,
        user_id: UserId,
        id: GameId,
        request: UpdateGameRequest,
    ) -> Result<Game, GameError>;
}

pub struct GameServiceImpl {
    repository: Arc<dyn GameRepositoryPort>,
}

impl GameServiceImpl {
    pub fn new(repository: Arc<dyn GameRepositoryPort>) -> Self {
        Self { repository }
    }

    async fn find(&self, id: GameId) -> Result<Game, GameError> {
        self.repository
            .get(id)
            .await?
            .ok_or(GameError::NotFound(id))
    }
}

#[async_trait]
impl GameService for GameServiceImpl {
    #[instrument(skip(self, request), fields(dm = %dm, name = %request.name))]
    async fn create_game(
        &self,
        dm: UserId,
        request: CreateGameRequest,
    ) -> Result<Game, GameError> {
        let game = Game::new(dm, request.name.trim())
            .with_description(request.description)
            .with_players(request.player_ids);
        game.validate().map_err(GameError::Validation)?;

        self.repository.create(&game).await?;
        info!(game_id = %game.id, players = game.player_ids.len(), "Created game");
        Ok(game)
    }

    #[instrument(skip(self))]
    async fn get_game(&self, user_id: UserId, id: GameId) -> Result<Game, GameError> {
        let game = self.find(id).await?;
        if !game.can_view(user_id) {
            return Err(GameError::Forbidden(
                "You don't have permission to view this game".to_string(),
            ));
        }
        Ok(game)
    }

    #[instrument(skip(self))]
    async fn list_games(&self, user_id: UserId) -> Result<Vec<Game>, GameError> {
        Ok(self.repository.list_for_user(user_id).await?)
    }

    #[instrument(skip(self, request))]
    async fn update_game(
        &self,
        user_id: UserId,
        id: GameId,
        request: UpdateGameRequest,
    ) -> Result<Game, GameError> {
        let mut game = self.find(id).await?;
        if !game.is_dm(user_id) {
            return Err(GameError::Forbidden(
                "Only the DM can update the game".to_string(),
            ));
        }

        game.name = request.name.trim().to_string();
        game.description = request.description;
        game.set_players(request.player_ids);
        if let Some(status) = request.status {
            game.status = status;
        }
        game.validate().map_err(GameError::Validation)?;
        game.touch();

        self.repository.update(&game).await?;
        info!(game_id = %game.id, status = game.status.as_str(), "Updated game");
        Ok(game)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::SqliteGameRepository;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn service() -> GameServiceImpl {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        GameServiceImpl::new(Arc::new(SqliteGameRepository::new(pool).await.unwrap()))
    }

    fn campaign(players: Vec<UserId>) -> CreateGameRequest {
        CreateGameRequest {
            name: "  Storm King's Thunder ".to_string(),
            description: "Giants".to_string(),
            player_ids: players,
        }
    }

    #[tokio::test]
    async fn test_dm_and_players_see_the_game() {
        let service = service().await;
        let dm = UserId::new();
        let player = UserId::new();
        let game = service.create_game(dm, campaign(vec![player])).await.unwrap();
        assert_eq!(game.name, "Storm King's Thunder");
        assert_eq!(game.status, GameStatus::Active);

        assert!(service.get_game(dm, game.id).await.is_ok());
        assert!(service.get_game(player, game.id).await.is_ok());
        assert!(matches!(
            service.get_game(UserId::new(), game.id).await,
            Err(GameError::Forbidden(_))
        ));
        assert!(matches!(
            service.get_game(dm, GameId::new()).await,
            Err(GameError::NotFound(_))
        ));
        assert_eq!(service.list_games(player).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_only_dm_updates() {
        let service = service().await;
        let dm = UserId::new();
        let player = UserId::new();
        let game = service.create_game(dm, campaign(vec![player])).await.unwrap();
        let update = UpdateGameRequest {
            name: "Storm King's Thunder, part 2".to_string(),
            description: String::new(),
            player_ids: vec![],
            status: Some(GameStatus::Paused),
        };

        assert!(matches!(
            service.update_game(player, game.id, update.clone()).await,
            Err(GameError::Forbidden(_))
        ));
        let updated = service.update_game(dm, game.id, update).await.unwrap();
        assert_eq!(updated.status, GameStatus::Paused);
        assert!(updated.player_ids.is_empty());
        // The removed player no longer sees it
        assert!(service.list_games(player).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_name_is_rejected() {
        let service = service().await;
        let mut request = campaign(vec![]);
        request.name = "   ".to_string();
        assert!(matches!(
            service.create_game(UserId::new(), request).await,
            Err(GameError::Validation(_))
        ));
    }
}
