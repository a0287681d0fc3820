//! Value objects - Immutable objects defined by their attributes

mod abilities;
mod action;
mod combat_rules;
mod dice_formula;
mod ids;
mod position;

pub use abilities::{Ability, AbilityScores};
pub use action::{
    ActionRequest, ActionResult, ActionType, CombatAction, EffectSummary, Movement, TargetEffect,
};
pub use combat_rules::{CombatRules, TurnPolicy};
pub use dice_formula::DiceFormula;
pub use ids::{CharacterId, EncounterId, GameId, ParticipantId, UserId};
pub use position::Position;

#[cfg(test)]
pub(crate) use combat_rules::testing;
