//! Encounter Session - The encounter aggregate root
//!
//! Bundles an encounter with the dice it rolls and the results of recently
//! keyed actions. Everything that changes an encounter goes through
//! [`EncounterSession::act`], which the store calls under the encounter's lock.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};

use crate::domain::entities::{Encounter, EncounterStatus};
use crate::domain::errors::CombatError;
use crate::domain::services::{ActionResolver, DiceRoller};
use crate::domain::value_objects::{ActionRequest, ActionResult, EncounterId};

/// How many idempotency keys each encounter remembers
pub const IDEMPOTENCY_CACHE_SIZE: usize = 64;

/// Result of [`EncounterSession::act`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub result: ActionResult,
    /// True when the key had been seen and nothing was resolved
    pub replayed: bool,
}

/// How long an encounter is kept once nothing happens in it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncounterRetention {
    /// After completion
    pub completed: Duration,
    /// While still active
    pub idle: Duration,
}

pub struct EncounterSession {
    encounter: Encounter,
    dice: Box<dyn DiceRoller>,
    recent: VecDeque<(String, ActionResult)>,
}

impl EncounterSession {
    pub fn new(encounter: Encounter, dice: Box<dyn DiceRoller>) -> Self {
        Self {
            encounter,
            dice,
            recent: VecDeque::with_capacity(IDEMPOTENCY_CACHE_SIZE),
        }
    }

    pub fn id(&self) -> EncounterId {
        self.encounter.id
    }

    pub fn encounter(&self) -> &Encounter {
        &self.encounter
    }

    /// Whether the encounter has been left alone past its retention
    pub fn is_stale(&self, retention: &EncounterRetention, now: DateTime<Utc>) -> bool {
        let quiet_for = now - self.encounter.updated_at;
        match self.encounter.status() {
            EncounterStatus::Completed => quiet_for >= retention.completed,
            EncounterStatus::Active => quiet_for >= retention.idle,
        }
    }

    /// Resolve an action, or replay the stored result for a repeated key.
    ///
    /// Refused actions are not remembered; they changed nothing, so a retry
    /// is evaluated afresh.
    pub fn act(
        &mut self,
        resolver: &ActionResolver,
        request: &ActionRequest,
        idempotency_key: Option<&str>,
    ) -> Result<ActionOutcome, CombatError> {
        if let Some(key) = idempotency_key {
            if let Some((_, result)) = self.recent.iter().find(|(k, _)| k == key) {
                return Ok(ActionOutcome {
                    result: result.clone(),
                    replayed: true,
                });
            }
        }

        let result = resolver.resolve(&mut self.encounter, request, self.dice.as_mut())?;

        if let Some(key) = idempotency_key {
            if self.recent.len() == IDEMPOTENCY_CACHE_SIZE {
                self.recent.pop_front();
            }
            self.recent.push_back((key.to_string(), result.clone()));
        }
        Ok(ActionOutcome {
            result,
            replayed: false,
        })
    }
}

impl std::fmt::Debug for EncounterSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncounterSession")
            .field("encounter", &self.encounter.id)
            .field("recent_keys", &self.recent.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::entities::{Battlefield, Participant, ParticipantKind};
    use crate::domain::services::testing::ScriptedDice;
    use crate::domain::value_objects::testing::test_rules;
    use crate::domain::value_objects::{CombatAction, Position};

    fn session(rolls: Vec<u32>) -> EncounterSession {
        let encounter = Encounter::start(
            vec![
                Participant::new("a", "A", ParticipantKind::Character, 10, 10)
                    .with_initiative(20)
                    .with_position(Position::new(2, 2)),
                Participant::new("b", "B", ParticipantKind::Monster, 10, 10)
                    .with_initiative(10)
                    .with_position(Position::new(3, 2)),
            ],
            Battlefield::new(10, 10, &[]).unwrap(),
            "test",
            &mut ScriptedDice::new([]),
        )
        .unwrap();
        EncounterSession::new(encounter, Box::new(ScriptedDice::new(rolls)))
    }

    fn attack(actor: &str, target: &str) -> ActionRequest {
        ActionRequest::new(
            actor,
            CombatAction::Attack {
                targets: vec![target.into()],
                weapon: None,
            },
        )
    }

    #[test]
    fn test_repeated_key_replays_without_resolving() {
        let resolver = ActionResolver::new(Arc::new(test_rules()));
        let mut session = session(vec![15, 5]);

        let first = session
            .act(&resolver, &attack("a", "b"), Some("swing-1"))
            .unwrap();
        assert!(!first.replayed);

        // Would be NotYourTurn (and roll nothing) if resolved again
        let again = session
            .act(&resolver, &attack("a", "b"), Some("swing-1"))
            .unwrap();
        assert!(again.replayed);
        assert_eq!(again.result, first.result);
        assert_eq!(session.encounter().participant(&"b".into()).unwrap().hit_points, 5);
        assert_eq!(session.encounter().log().len(), 1);
    }

    #[test]
    fn test_refused_actions_are_not_cached() {
        let resolver = ActionResolver::new(Arc::new(test_rules()));
        let mut session = session(vec![15, 5]);

        let err = session
            .act(&resolver, &attack("b", "a"), Some("k"))
            .unwrap_err();
        assert!(matches!(err, CombatError::NotYourTurn { .. }));

        let outcome = session.act(&resolver, &attack("a", "b"), Some("k")).unwrap();
        assert!(!outcome.replayed);
    }

    #[test]
    fn test_staleness_depends_on_status() {
        let retention = EncounterRetention {
            completed: Duration::minutes(10),
            idle: Duration::hours(1),
        };
        let resolver = ActionResolver::new(Arc::new(test_rules()));
        let mut session = session(vec![20, 8, 8]);
        let start = session.encounter().updated_at;

        assert!(!session.is_stale(&retention, start + Duration::minutes(30)));
        assert!(session.is_stale(&retention, start + Duration::hours(1)));

        // A critical hit for 16 finishes B
        let outcome = session.act(&resolver, &attack("a", "b"), None).unwrap();
        assert!(outcome.result.encounter_completed);
        let finished = session.encounter().updated_at;
        assert!(!session.is_stale(&retention, finished + Duration::minutes(9)));
        assert!(session.is_stale(&retention, finished + Duration::minutes(10)));
    }

    #[test]
    fn test_cache_is_bounded() {
        let resolver = ActionResolver::new(Arc::new(test_rules()));
        let mut session = session(vec![]);
        for i in 0..IDEMPOTENCY_CACHE_SIZE + 1 {
            let actor = if i % 2 == 0 { "a" } else { "b" };
            let request = ActionRequest::new(actor, CombatAction::EndTurn);
            session
                .act(&resolver, &request, Some(format!("key-{}", i).as_str()))
                .unwrap();
        }
        assert_eq!(session.recent.len(), IDEMPOTENCY_CACHE_SIZE);
        assert!(session.recent.iter().all(|(k, _)| k != "key-0"));
    }
}
