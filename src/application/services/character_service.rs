//! Character Service - Application service for stored player characters
//!
//! Characters belong to the user who created them; other users see them as
//! not found.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::application::ports::outbound::CharacterRepositoryPort;
use crate::domain::entities::Character;
use crate::domain::value_objects::{AbilityScores, CharacterId, UserId};

#[derive(Debug, thiserror::Error)]
pub enum CharacterError {
    #[error("{0}")]
    Validation(String),

    #[error("Character not found: {0}")]
    NotFound(CharacterId),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Request to create a new character
#[derive(Debug, Clone)]
pub struct CreateCharacterRequest {
    pub name: String,
    pub race: String,
    pub class: String,
    pub level: u32,
    pub abilities: AbilityScores,
    /// Defaults to max_hit_points
    pub hit_points: Option<u32>,
    pub max_hit_points: u32,
    pub armor_class: u32,
    pub speed_feet: u32,
    pub equipment: Vec<String>,
    pub spells: Vec<String>,
}

#[async_trait]
pub trait CharacterService: Send + Sync {
    async fn create_character(
        &self,
        owner_id: UserId,
        request: CreateCharacterRequest,
    ) -> Result<Character, CharacterError>;

    async fn get_character(
        &self,
        owner_id: UserId,
        id: CharacterId,
    ) -> Result<Character, CharacterError>;

    async fn list_characters(&self, owner_id: UserId) -> Result<Vec<Character>, CharacterError>;
}

pub struct CharacterServiceImpl {
    repository: Arc<dyn CharacterRepositoryPort>,
}

impl CharacterServiceImpl {
    pub fn new(repository: Arc<dyn CharacterRepositoryPort>) -> Self {
        Self { repository }
    }

    fn validate_create_request(request: &CreateCharacterRequest) -> Result<(), CharacterError> {
        if request.name.len() > 255 {
            return Err(CharacterError::Validation(
                "Character name cannot exceed 255 characters".to_string(),
            ));
        }
        if request.race.trim().is_empty() || request.class.trim().is_empty() {
            return Err(CharacterError::Validation(
                "Character race and class are required".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl CharacterService for CharacterServiceImpl {
    #[instrument(skip(self, request), fields(owner_id = %owner_id, name = %request.name))]
    async fn create_character(
        &self,
        owner_id: UserId,
        request: CreateCharacterRequest,
    ) -> Result<Character, CharacterError> {
        Self::validate_create_request(&request)?;

        let character = Character::new(owner_id, request.name.trim(), request.race, request.class)
            .with_level(request.level)
            .with_abilities(request.abilities)
            .with_hit_points(
                request.hit_points.unwrap_or(request.max_hit_points),
                request.max_hit_points,
            )
            .with_armor_class(request.armor_class)
            .with_speed(request.speed_feet)
            .with_equipment(request.equipment)
            .with_spells(request.spells);
        character.validate().map_err(CharacterError::Validation)?;

        self.repository.create(&character).await?;
        info!(character_id = %character.id, "Created character");
        Ok(character)
    }

    #[instrument(skip(self))]
    async fn get_character(
        &self,
        owner_id: UserId,
        id: CharacterId,
    ) -> Result<Character, CharacterError> {
        debug!("Fetching character");
        self.repository
            .get(id)
            .await?
            .filter(|c| c.owner_id == owner_id)
            .ok_or(CharacterError::NotFound(id))
    }

    #[instrument(skip(self))]
    async fn list_characters(&self, owner_id: UserId) -> Result<Vec<Character>, CharacterError> {
        Ok(self.repository.list_by_owner(owner_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::SqliteCharacterRepository;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn service() -> CharacterServiceImpl {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let repository = SqliteCharacterRepository::new(pool).await.unwrap();
        CharacterServiceImpl::new(Arc::new(repository))
    }

    fn ranger() -> CreateCharacterRequest {
        CreateCharacterRequest {
            name: "Aragorn".to_string(),
            race: "Human".to_string(),
            class: "Ranger".to_string(),
            level: 8,
            abilities: AbilityScores {
                strength: 16,
                dexterity: 18,
                ..Default::default()
            },
            hit_points: Some(75),
            max_hit_points: 80,
            armor_class: 16,
            speed_feet: 30,
            equipment: vec!["Longsword".to_string(), "Longbow".to_string()],
            spells: vec![],
        }
    }

    #[tokio::test]
    async fn test_create_and_fetch_own_characters() {
        let service = service().await;
        let owner = UserId::new();

        let created = service.create_character(owner, ranger()).await.unwrap();
        let fetched = service.get_character(owner, created.id).await.unwrap();
        assert_eq!(fetched.name, "Aragorn");
        assert_eq!(fetched.hit_points, 75);
        assert_eq!(fetched.abilities.dexterity, 18);
        assert_eq!(fetched.equipment, vec!["Longsword", "Longbow"]);

        let listed = service.list_characters(owner).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_other_users_characters_are_not_found() {
        let service = service().await;
        let created = service.create_character(UserId::new(), ranger()).await.unwrap();

        let stranger = UserId::new();
        assert!(matches!(
            service.get_character(stranger, created.id).await,
            Err(CharacterError::NotFound(_))
        ));
        assert!(service.list_characters(stranger).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_validates_sheet() {
        let service = service().await;
        let mut request = ranger();
        request.hit_points = Some(90);
        assert!(matches!(
            service.create_character(UserId::new(), request).await,
            Err(CharacterError::Validation(_))
        ));

        let mut request = ranger();
        request.name = "   ".to_string();
        assert!(matches!(
            service.create_character(UserId::new(), request).await,
            Err(CharacterError::Validation(_))
        ));
    }
}
