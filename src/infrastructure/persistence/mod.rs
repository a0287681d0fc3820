//! Persistence adapters
//!
//! Users, characters and games live in SQLite; each repository creates its
//! table on construction. Live encounters are held in memory.

mod character_repository;
mod encounter_repository;
mod game_repository;
mod user_repository;

pub use character_repository::SqliteCharacterRepository;
pub use encounter_repository::InMemoryEncounterRepository;
pub use game_repository::SqliteGameRepository;
pub use user_repository::SqliteUserRepository;
