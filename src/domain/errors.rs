//! Errors raised by the combat domain

use crate::domain::value_objects::{ParticipantId, Position};

/// Every way a combat operation can be refused.
///
/// All checks happen before any state is touched, so returning one of these
/// guarantees the encounter is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CombatError {
    #[error("Position {0} is outside the battlefield")]
    OutOfBounds(Position),

    #[error("Illegal move: {0}")]
    IllegalMove(String),

    #[error("It is not {actor}'s turn (current turn: {current})")]
    NotYourTurn {
        actor: ParticipantId,
        current: ParticipantId,
    },

    #[error("Encounter is already completed")]
    EncounterCompleted,

    #[error("Participant not found: {0}")]
    ParticipantNotFound(ParticipantId),

    #[error("{0} is incapacitated and cannot act")]
    ActorIncapacitated(ParticipantId),

    #[error("{actor} cannot act while {condition}")]
    ActorRestrained {
        actor: ParticipantId,
        condition: String,
    },

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("{target} is out of range (distance {distance}, range {range})")]
    OutOfRange {
        target: ParticipantId,
        distance: u32,
        range: u32,
    },

    #[error("No line of sight from {from} to {to}")]
    NoLineOfSight { from: Position, to: Position },

    #[error("Unknown weapon: {0}")]
    UnknownWeapon(String),

    #[error("Unknown spell: {0}")]
    UnknownSpell(String),

    #[error("{actor} does not know the spell {spell}")]
    SpellNotKnown { actor: ParticipantId, spell: String },

    #[error("Invalid encounter setup: {0}")]
    InvalidSetup(String),
}

impl CombatError {
    /// Stable machine-readable kind reported to API callers
    pub fn kind(&self) -> &'static str {
        match self {
            Self::OutOfBounds(_) => "out_of_bounds",
            Self::IllegalMove(_) => "illegal_move",
            Self::NotYourTurn { .. } => "not_your_turn",
            Self::EncounterCompleted => "encounter_completed",
            Self::ParticipantNotFound(_) => "not_found",
            Self::ActorIncapacitated(_) => "actor_incapacitated",
            Self::ActorRestrained { .. } => "actor_restrained",
            Self::InvalidTarget(_) => "invalid_target",
            Self::OutOfRange { .. } => "out_of_range",
            Self::NoLineOfSight { .. } => "no_line_of_sight",
            Self::UnknownWeapon(_) => "unknown_weapon",
            Self::UnknownSpell(_) => "unknown_spell",
            Self::SpellNotKnown { .. } => "spell_not_known",
            Self::InvalidSetup(_) => "validation_error",
        }
    }
}
