//! Combat events - Notifications published as encounters change
//!
//! Serialized as `{"type": "...", ...}` for WebSocket subscribers.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::entities::{Encounter, EncounterOutcome};
use crate::domain::value_objects::{ActionResult, EncounterId, ParticipantId};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CombatEvent {
    CombatStarted {
        encounter_id: EncounterId,
        environment: String,
        initiative_order: Vec<ParticipantId>,
        current_turn: ParticipantId,
        timestamp: DateTime<Utc>,
    },
    ActionResolved {
        encounter_id: EncounterId,
        result: ActionResult,
        round_number: u32,
        current_turn: ParticipantId,
        timestamp: DateTime<Utc>,
    },
    CombatCompleted {
        encounter_id: EncounterId,
        outcome: Option<EncounterOutcome>,
        round_number: u32,
        timestamp: DateTime<Utc>,
    },
}

impl CombatEvent {
    pub fn started(encounter: &Encounter) -> Self {
        Self::CombatStarted {
            encounter_id: encounter.id,
            environment: encounter.environment.clone(),
            initiative_order: encounter
                .initiative()
                .iter()
                .map(|e| e.participant_id.clone())
                .collect(),
            current_turn: encounter.current_participant_id().clone(),
            timestamp: Utc::now(),
        }
    }

    pub fn action_resolved(encounter: &Encounter, result: ActionResult) -> Self {
        Self::ActionResolved {
            encounter_id: encounter.id,
            result,
            round_number: encounter.round_number(),
            current_turn: encounter.current_participant_id().clone(),
            timestamp: Utc::now(),
        }
    }

    pub fn completed(encounter: &Encounter) -> Self {
        Self::CombatCompleted {
            encounter_id: encounter.id,
            outcome: encounter.outcome(),
            round_number: encounter.round_number(),
            timestamp: Utc::now(),
        }
    }

    pub fn encounter_id(&self) -> EncounterId {
        match self {
            Self::CombatStarted { encounter_id, .. }
            | Self::ActionResolved { encounter_id, .. }
            | Self::CombatCompleted { encounter_id, .. } => *encounter_id,
        }
    }
}
