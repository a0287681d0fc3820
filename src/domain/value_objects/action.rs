//! Combat actions and their results

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{ParticipantId, Position};

/// What an actor does on their turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CombatAction {
    Attack {
        targets: Vec<ParticipantId>,
        weapon: Option<String>,
    },
    CastSpell {
        spell: String,
        targets: Vec<ParticipantId>,
    },
    Move {
        destination: Position,
        /// Cells walked through, ending at `destination`. Empty lets the
        /// resolver pick the cheapest route.
        path: Vec<Position>,
    },
    EndTurn,
}

impl CombatAction {
    pub fn action_type(&self) -> ActionType {
        match self {
            Self::Attack { .. } => ActionType::Attack,
            Self::CastSpell { .. } => ActionType::CastSpell,
            Self::Move { .. } => ActionType::Move,
            Self::EndTurn => ActionType::EndTurn,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Attack,
    CastSpell,
    Move,
    EndTurn,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Attack => "attack",
            Self::CastSpell => "cast_spell",
            Self::Move => "move",
            Self::EndTurn => "end_turn",
        }
    }
}

/// An action submitted by (or on behalf of) one participant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest {
    pub actor: ParticipantId,
    pub action: CombatAction,
}

impl ActionRequest {
    pub fn new(actor: impl Into<ParticipantId>, action: CombatAction) -> Self {
        Self {
            actor: actor.into(),
            action,
        }
    }
}

/// Effect of an action on a single target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetEffect {
    pub participant_id: ParticipantId,
    pub hit: bool,
    pub critical: bool,
    pub damage: u32,
    pub healing: u32,
    pub statuses_applied: Vec<String>,
    pub incapacitated: bool,
}

impl TargetEffect {
    pub fn new(participant_id: ParticipantId) -> Self {
        Self {
            participant_id,
            hit: false,
            critical: false,
            damage: 0,
            healing: 0,
            statuses_applied: Vec::new(),
            incapacitated: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub from: Position,
    pub to: Position,
    pub cost: u32,
}

/// Structured summary of what an action changed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectSummary {
    pub damage_dealt: u32,
    pub healing_done: u32,
    pub targets: Vec<TargetEffect>,
    pub statuses_applied: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movement: Option<Movement>,
}

impl EffectSummary {
    pub fn record(&mut self, effect: TargetEffect) {
        self.damage_dealt += effect.damage;
        self.healing_done += effect.healing;
        for status in &effect.statuses_applied {
            if !self.statuses_applied.contains(status) {
                self.statuses_applied.push(status.clone());
            }
        }
        self.targets.push(effect);
    }
}

/// Outcome of one resolved action. Carries no encounter state; callers
/// re-read the encounter for that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub action_type: ActionType,
    pub actor_id: ParticipantId,
    /// False when an attack or spell missed every target
    pub success: bool,
    pub description: String,
    pub effects: EffectSummary,
    pub turn_ended: bool,
    pub encounter_completed: bool,
}
