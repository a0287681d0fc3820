//! Repository ports - Interfaces for data persistence
//!
//! These traits define the contracts that infrastructure repositories must implement.
//! Application services depend on these traits, not concrete implementations.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::domain::aggregates::{EncounterRetention, EncounterSession};
use crate::domain::entities::{Character, Game, User};
use crate::domain::value_objects::{CharacterId, EncounterId, GameId, UserId};

/// An encounter as held by the store; lock it to read or act
pub type SharedEncounter = Arc<Mutex<EncounterSession>>;

// =============================================================================
// Encounter Repository Port
// =============================================================================

/// Keyed store of live encounters
#[async_trait]
pub trait EncounterRepositoryPort: Send + Sync {
    /// Store a newly started encounter and hand back its shared handle
    async fn insert(&self, session: EncounterSession) -> SharedEncounter;

    async fn get(&self, id: EncounterId) -> Option<SharedEncounter>;

    /// Drop encounters that are stale at `now`; returns how many went
    async fn evict_stale(&self, retention: &EncounterRetention, now: DateTime<Utc>) -> usize;

    async fn count(&self) -> usize;
}

// =============================================================================
// Character Repository Port
// =============================================================================

#[async_trait]
pub trait CharacterRepositoryPort: Send + Sync {
    async fn create(&self, character: &Character) -> Result<()>;

    async fn get(&self, id: CharacterId) -> Result<Option<Character>>;

    /// Characters owned by a user, oldest first
    async fn list_by_owner(&self, owner_id: UserId) -> Result<Vec<Character>>;
}

// =============================================================================
// Game Repository Port
// =============================================================================

#[async_trait]
pub trait GameRepositoryPort: Send + Sync {
    async fn create(&self, game: &Game) -> Result<()>;

    async fn get(&self, id: GameId) -> Result<Option<Game>>;

    async fn update(&self, game: &Game) -> Result<()>;

    /// Games the user runs or plays in, most recently updated first
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Game>>;
}

// =============================================================================
// User Repository Port
// =============================================================================

#[async_trait]
pub trait UserRepositoryPort: Send + Sync {
    /// Fails if the username is already taken
    async fn create(&self, user: &User) -> Result<()>;

    async fn get(&self, id: UserId) -> Result<Option<User>>;

    async fn get_by_username(&self, username: &str) -> Result<Option<User>>;
}
