//! Domain entities - Core business objects with identity

mod battlefield;
mod character;
mod encounter;
mod game;
mod participant;
mod user;

pub use battlefield::{Battlefield, CellOverride, GridObject, Terrain};
pub use character::Character;
pub use encounter::{
    ActionLogEntry, Encounter, EncounterOutcome, EncounterStatus, InitiativeEntry,
};
pub use game::{Game, GameStatus};
pub use participant::{Participant, ParticipantKind, StatusEffect};
pub use user::User;
