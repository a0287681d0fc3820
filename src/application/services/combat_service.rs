//! Combat Service - Use cases for running encounters
//!
//! Encounters live in the encounter store. Each one is changed only while its
//! lock is held, so concurrent requests against the same encounter resolve
//! one at a time while different encounters never wait on each other.
//!
//! Only the creator and the players controlling a participant may see an
//! encounter. Players act for their own participants; the creator acts for
//! the monsters and anyone they did not hand to a player.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

use crate::application::ports::outbound::{CombatEventPort, EncounterRepositoryPort};
use crate::application::services::{CharacterError, CharacterService};
use crate::domain::aggregates::{ActionOutcome, EncounterRetention, EncounterSession};
use crate::domain::entities::{ActionLogEntry, Battlefield, CellOverride, Encounter, Participant};
use crate::domain::errors::CombatError;
use crate::domain::events::CombatEvent;
use crate::domain::services::{ActionResolver, DiceRoller};
use crate::domain::value_objects::{
    ActionRequest, CharacterId, CombatAction, EncounterId, ParticipantId, UserId,
};

/// Builds the dice for each new encounter
pub type DiceFactory = Arc<dyn Fn() -> Box<dyn DiceRoller> + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum CombatServiceError {
    #[error(transparent)]
    Combat(#[from] CombatError),

    #[error("Encounter not found: {0}")]
    NotFound(EncounterId),

    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Character(#[from] CharacterError),
}

#[derive(Debug, Clone)]
pub struct BattlefieldRequest {
    pub width: u32,
    pub height: u32,
    pub overrides: Vec<CellOverride>,
}

impl Default for BattlefieldRequest {
    fn default() -> Self {
        Self {
            width: 10,
            height: 10,
            overrides: Vec::new(),
        }
    }
}

/// Request to start a new encounter
#[derive(Debug, Clone)]
pub struct StartCombatRequest {
    /// Combatants described inline (monsters, ad-hoc characters)
    pub participants: Vec<Participant>,
    /// Stored characters of the caller; each joins under its id
    pub character_ids: Vec<CharacterId>,
    pub environment: String,
    pub battlefield: BattlefieldRequest,
}

/// An action's outcome together with the encounter right after it
#[derive(Debug, Clone)]
pub struct ActionResponse {
    pub outcome: ActionOutcome,
    pub encounter: Encounter,
}

#[async_trait]
pub trait CombatService: Send + Sync {
    async fn start_combat(
        &self,
        user_id: UserId,
        request: StartCombatRequest,
    ) -> Result<Encounter, CombatServiceError>;

    /// Snapshot of an encounter the user takes part in
    async fn get_combat(
        &self,
        id: EncounterId,
        user_id: UserId,
    ) -> Result<Encounter, CombatServiceError>;

    /// Resolve an action for a participant the user controls. A repeated
    /// `idempotency_key` replays the stored result instead of acting again.
    async fn perform_action(
        &self,
        id: EncounterId,
        user_id: UserId,
        request: ActionRequest,
        idempotency_key: Option<String>,
    ) -> Result<ActionResponse, CombatServiceError>;

    async fn end_turn(
        &self,
        id: EncounterId,
        user_id: UserId,
        actor: ParticipantId,
    ) -> Result<ActionResponse, CombatServiceError>;

    async fn action_log(
        &self,
        id: EncounterId,
        user_id: UserId,
    ) -> Result<Vec<ActionLogEntry>, CombatServiceError>;

    /// Forget encounters left alone past their retention; returns how many
    async fn evict_stale(&self, retention: EncounterRetention, now: DateTime<Utc>) -> usize;
}

pub struct CombatServiceImpl {
    encounters: Arc<dyn EncounterRepositoryPort>,
    characters: Arc<dyn CharacterService>,
    events: Arc<dyn CombatEventPort>,
    resolver: ActionResolver,
    dice: DiceFactory,
}

impl CombatServiceImpl {
    pub fn new(
        encounters: Arc<dyn EncounterRepositoryPort>,
        characters: Arc<dyn CharacterService>,
        events: Arc<dyn CombatEventPort>,
        resolver: ActionResolver,
        dice: DiceFactory,
    ) -> Self {
        Self {
            encounters,
            characters,
            events,
            resolver,
            dice,
        }
    }

    async fn snapshot(
        &self,
        id: EncounterId,
        user_id: UserId,
    ) -> Result<Encounter, CombatServiceError> {
        let shared = self
            .encounters
            .get(id)
            .await
            .ok_or(CombatServiceError::NotFound(id))?;
        let session = shared.lock().await;
        ensure_member(session.encounter(), user_id)?;
        Ok(session.encounter().clone())
    }
}

fn ensure_member(encounter: &Encounter, user_id: UserId) -> Result<(), CombatServiceError> {
    if encounter.is_member(user_id) {
        Ok(())
    } else {
        Err(CombatServiceError::Forbidden(
            "You are not taking part in this combat".to_string(),
        ))
    }
}

#[async_trait]
impl CombatService for CombatServiceImpl {
    #[instrument(skip(self, request), fields(user_id = %user_id, environment = %request.environment))]
    async fn start_combat(
        &self,
        user_id: UserId,
        request: StartCombatRequest,
    ) -> Result<Encounter, CombatServiceError> {
        // Inline participants act for the creator unless handed to a player
        let mut participants: Vec<Participant> = request
            .participants
            .into_iter()
            .map(|p| match p.controller {
                Some(_) => p,
                None => p.with_controller(user_id),
            })
            .collect();
        for character_id in request.character_ids {
            let character = self.characters.get_character(user_id, character_id).await?;
            participants.push(character.to_participant(character_id.to_string()));
        }

        let battlefield = Battlefield::for_environment(
            &request.environment,
            request.battlefield.width,
            request.battlefield.height,
            &request.battlefield.overrides,
        )?;

        let mut dice = (self.dice)();
        let encounter = Encounter::start(
            participants,
            battlefield,
            request.environment,
            dice.as_mut(),
        )?
        .with_creator(user_id);

        let snapshot = encounter.clone();
        self.encounters
            .insert(EncounterSession::new(encounter, dice))
            .await;
        self.events.publish(CombatEvent::started(&snapshot));

        info!(
            encounter_id = %snapshot.id,
            participants = snapshot.participants().len(),
            first_turn = %snapshot.current_participant_id(),
            "Encounter started"
        );
        Ok(snapshot)
    }

    #[instrument(skip(self))]
    async fn get_combat(
        &self,
        id: EncounterId,
        user_id: UserId,
    ) -> Result<Encounter, CombatServiceError> {
        self.snapshot(id, user_id).await
    }

    #[instrument(skip(self, request), fields(encounter_id = %id, user_id = %user_id, actor = %request.actor, action = request.action.action_type().as_str()))]
    async fn perform_action(
        &self,
        id: EncounterId,
        user_id: UserId,
        request: ActionRequest,
        idempotency_key: Option<String>,
    ) -> Result<ActionResponse, CombatServiceError> {
        let shared = self
            .encounters
            .get(id)
            .await
            .ok_or(CombatServiceError::NotFound(id))?;
        let mut session = shared.lock().await;

        ensure_member(session.encounter(), user_id)?;
        if !session.encounter().controls(user_id, &request.actor) {
            return Err(CombatServiceError::Forbidden(format!(
                "You do not control {}",
                request.actor
            )));
        }

        let outcome = session.act(&self.resolver, &request, idempotency_key.as_deref())?;
        let encounter = session.encounter().clone();

        if outcome.replayed {
            debug!("Replayed action for repeated idempotency key");
        } else {
            self.events
                .publish(CombatEvent::action_resolved(&encounter, outcome.result.clone()));
            if outcome.result.encounter_completed {
                self.events.publish(CombatEvent::completed(&encounter));
                info!(outcome = ?encounter.outcome(), "Encounter completed");
            }
            debug!(
                success = outcome.result.success,
                round = encounter.round_number(),
                next_turn = %encounter.current_participant_id(),
                "Action resolved"
            );
        }
        Ok(ActionResponse { outcome, encounter })
    }

    #[instrument(skip(self), fields(encounter_id = %id, user_id = %user_id, actor = %actor))]
    async fn end_turn(
        &self,
        id: EncounterId,
        user_id: UserId,
        actor: ParticipantId,
    ) -> Result<ActionResponse, CombatServiceError> {
        self.perform_action(
            id,
            user_id,
            ActionRequest::new(actor, CombatAction::EndTurn),
            None,
        )
        .await
    }

    #[instrument(skip(self))]
    async fn action_log(
        &self,
        id: EncounterId,
        user_id: UserId,
    ) -> Result<Vec<ActionLogEntry>, CombatServiceError> {
        Ok(self.snapshot(id, user_id).await?.log().to_vec())
    }

    #[instrument(skip(self, retention))]
    async fn evict_stale(&self, retention: EncounterRetention, now: DateTime<Utc>) -> usize {
        let evicted = self.encounters.evict_stale(&retention, now).await;
        if evicted > 0 {
            let remaining = self.encounters.count().await;
            info!(
                evicted,
                remaining,
                "Evicted stale encounters"
            );
        }
        evicted
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use crate::application::ports::outbound::CombatEventPort;
    use crate::domain::events::CombatEvent;

    /// Keeps every published event for inspection
    #[derive(Default)]
    pub struct RecordingEvents {
        pub events: Mutex<Vec<CombatEvent>>,
    }

    impl RecordingEvents {
        pub fn kinds(&self) -> Vec<&'static str> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .map(|e| match e {
                    CombatEvent::CombatStarted { .. } => "combat_started",
                    CombatEvent::ActionResolved { .. } => "action_resolved",
                    CombatEvent::CombatCompleted { .. } => "combat_completed",
                })
                .collect()
        }
    }

    impl CombatEventPort for RecordingEvents {
        fn publish(&self, event: CombatEvent) {
            self.events.lock().unwrap().push(event);
        }
    }
}
