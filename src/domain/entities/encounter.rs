//! Encounter entity - one combat session with its battlefield, initiative
//! order and turn state
//!
//! An encounter is created by [`Encounter::start`] and afterwards only changes
//! through the action resolver. Its fields are private so that the turn
//! pointer always indexes the initiative order and the round counter never
//! goes backwards.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::{Battlefield, Participant, ParticipantKind};
use crate::domain::errors::CombatError;
use crate::domain::services::DiceRoller;
use crate::domain::value_objects::{
    Ability, ActionType, EncounterId, ParticipantId, Position, UserId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncounterStatus {
    Active,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncounterOutcome {
    CharactersVictorious,
    MonstersVictorious,
    /// Both sides fell in the same action
    Draw,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiativeEntry {
    pub participant_id: ParticipantId,
    pub score: i32,
}

/// One resolved action, kept for the encounter's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLogEntry {
    pub round: u32,
    pub actor_id: ParticipantId,
    pub action_type: ActionType,
    pub success: bool,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Encounter {
    pub id: EncounterId,
    pub created_by: Option<UserId>,
    pub environment: String,
    participants: Vec<Participant>,
    initiative: Vec<InitiativeEntry>,
    current_turn_index: usize,
    round_number: u32,
    status: EncounterStatus,
    outcome: Option<EncounterOutcome>,
    battlefield: Battlefield,
    /// Squares of movement spent in the current turn
    movement_used: u32,
    log: Vec<ActionLogEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Encounter {
    /// Start an encounter.
    ///
    /// Participants without a position are placed automatically (characters
    /// towards the left edge, monsters towards the right). Participants
    /// without an initiative score roll d20 + DEX modifier, in submission
    /// order. Turn order is score descending, ties broken by id.
    pub fn start(
        participants: Vec<Participant>,
        battlefield: Battlefield,
        environment: impl Into<String>,
        dice: &mut dyn DiceRoller,
    ) -> Result<Self, CombatError> {
        let mut participants = participants;
        validate_roster(&participants)?;
        place_participants(&mut participants, &battlefield)?;

        for participant in &mut participants {
            if participant.initiative.is_none() {
                let roll = dice.d20() as i32 + participant.ability_modifier(Ability::Dexterity);
                participant.initiative = Some(roll);
            }
        }

        let mut initiative: Vec<InitiativeEntry> = participants
            .iter()
            .map(|p| InitiativeEntry {
                participant_id: p.id.clone(),
                score: p.initiative.unwrap_or_default(),
            })
            .collect();
        initiative.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.participant_id.cmp(&b.participant_id))
        });

        let now = Utc::now();
        let mut encounter = Self {
            id: EncounterId::new(),
            created_by: None,
            environment: environment.into(),
            participants,
            initiative,
            current_turn_index: 0,
            round_number: 1,
            status: EncounterStatus::Active,
            outcome: None,
            battlefield,
            movement_used: 0,
            log: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        // The first turn goes to the highest-ranked conscious participant
        if let Some(first) = encounter
            .initiative
            .iter()
            .position(|entry| !encounter.is_incapacitated(&entry.participant_id))
        {
            encounter.current_turn_index = first;
        }

        Ok(encounter)
    }

    pub fn with_creator(mut self, user_id: UserId) -> Self {
        self.created_by = Some(user_id);
        self
    }

    /// The creator, or the controller of any participant
    pub fn is_member(&self, user_id: UserId) -> bool {
        self.created_by == Some(user_id)
            || self.participants.iter().any(|p| p.controller == Some(user_id))
    }

    /// Whether `user_id` may act for `actor`. The creator runs the monsters;
    /// everyone else acts only for participants they control. Unknown actors
    /// are left for the resolver to report.
    pub fn controls(&self, user_id: UserId, actor: &ParticipantId) -> bool {
        match self.participant(actor) {
            Some(p) => {
                p.controller == Some(user_id)
                    || (p.kind == ParticipantKind::Monster && self.created_by == Some(user_id))
            }
            None => true,
        }
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn participant(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.id == id)
    }

    pub fn participant_mut(&mut self, id: &ParticipantId) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| &p.id == id)
    }

    pub fn initiative(&self) -> &[InitiativeEntry] {
        &self.initiative
    }

    pub fn current_turn_index(&self) -> usize {
        self.current_turn_index
    }

    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    pub fn status(&self) -> EncounterStatus {
        self.status
    }

    pub fn outcome(&self) -> Option<EncounterOutcome> {
        self.outcome
    }

    pub fn battlefield(&self) -> &Battlefield {
        &self.battlefield
    }

    pub fn movement_used(&self) -> u32 {
        self.movement_used
    }

    pub fn log(&self) -> &[ActionLogEntry] {
        &self.log
    }

    pub fn current_participant_id(&self) -> &ParticipantId {
        &self.initiative[self.current_turn_index].participant_id
    }

    pub fn current_participant(&self) -> Option<&Participant> {
        self.participant(self.current_participant_id())
    }

    fn is_incapacitated(&self, id: &ParticipantId) -> bool {
        self.participant(id).map_or(true, Participant::is_incapacitated)
    }

    pub fn ensure_active(&self) -> Result<(), CombatError> {
        match self.status {
            EncounterStatus::Active => Ok(()),
            EncounterStatus::Completed => Err(CombatError::EncounterCompleted),
        }
    }

    /// Positions of every participant except `exclude`
    pub fn occupied_positions(&self, exclude: &ParticipantId) -> Vec<Position> {
        self.participants
            .iter()
            .filter(|p| &p.id != exclude)
            .filter_map(|p| p.position)
            .collect()
    }

    /// Move a participant, keeping it off cells held by anyone else
    pub fn move_participant(
        &mut self,
        id: &ParticipantId,
        destination: Position,
    ) -> Result<(), CombatError> {
        let occupied = self.occupied_positions(id);
        let participant = self
            .participants
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| CombatError::ParticipantNotFound(id.clone()))?;
        participant.move_to(destination, &self.battlefield, &occupied)?;
        self.touch();
        Ok(())
    }

    pub fn spend_movement(&mut self, squares: u32) {
        self.movement_used += squares;
    }

    /// End the current turn and hand it to the next conscious participant.
    ///
    /// The ending participant's statuses tick down, as do those of anyone
    /// skipped for being incapacitated. Wrapping past the end of the order
    /// starts a new round.
    pub fn advance_turn(&mut self) {
        let len = self.initiative.len();
        if len == 0 {
            return;
        }
        let ending = self.current_participant_id().clone();
        if let Some(p) = self.participant_mut(&ending) {
            p.tick_statuses();
        }
        self.movement_used = 0;

        for _ in 0..len {
            self.current_turn_index += 1;
            if self.current_turn_index >= len {
                self.current_turn_index = 0;
                self.round_number += 1;
            }
            let next = self.current_participant_id().clone();
            match self.participant_mut(&next) {
                Some(p) if !p.is_incapacitated() => break,
                Some(p) => p.tick_statuses(),
                None => {}
            }
        }
        self.touch();
    }

    /// Complete the encounter once one side has nobody standing.
    ///
    /// Returns whether the encounter is completed.
    pub fn check_completion(&mut self) -> bool {
        if self.status == EncounterStatus::Completed {
            return true;
        }
        let standing = |kind: ParticipantKind| {
            self.participants
                .iter()
                .any(|p| p.kind == kind && !p.is_incapacitated())
        };
        let characters = standing(ParticipantKind::Character);
        let monsters = standing(ParticipantKind::Monster);

        let outcome = match (characters, monsters) {
            (true, true) => return false,
            (true, false) => EncounterOutcome::CharactersVictorious,
            (false, true) => EncounterOutcome::MonstersVictorious,
            (false, false) => EncounterOutcome::Draw,
        };
        self.status = EncounterStatus::Completed;
        self.outcome = Some(outcome);
        self.touch();
        true
    }

    pub fn record(&mut self, entry: ActionLogEntry) {
        self.log.push(entry);
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

fn validate_roster(participants: &[Participant]) -> Result<(), CombatError> {
    let mut ids = HashSet::new();
    for p in participants {
        if p.id.as_str().trim().is_empty() {
            return Err(CombatError::InvalidSetup("participant id cannot be empty".to_string()));
        }
        if !ids.insert(&p.id) {
            return Err(CombatError::InvalidSetup(format!("duplicate participant id '{}'", p.id)));
        }
        if p.name.trim().is_empty() {
            return Err(CombatError::InvalidSetup(format!("participant '{}' needs a name", p.id)));
        }
        p.validate_sheet()
            .map_err(|e| CombatError::InvalidSetup(format!("participant '{}': {}", p.id, e)))?;
    }

    for kind in [ParticipantKind::Character, ParticipantKind::Monster] {
        let standing = participants
            .iter()
            .any(|p| p.kind == kind && !p.is_incapacitated());
        if !standing {
            return Err(CombatError::InvalidSetup(format!(
                "an encounter needs at least one conscious {}",
                kind.as_str()
            )));
        }
    }
    Ok(())
}

fn place_participants(
    participants: &mut [Participant],
    battlefield: &Battlefield,
) -> Result<(), CombatError> {
    let mut occupied: Vec<Position> = Vec::with_capacity(participants.len());

    for p in participants.iter() {
        let Some(pos) = p.position else {
            continue;
        };
        if !battlefield.is_occupiable(pos, &occupied)? {
            return Err(CombatError::InvalidSetup(format!(
                "participant '{}' cannot stand on {}",
                p.id, pos
            )));
        }
        occupied.push(pos);
    }

    for p in participants.iter_mut().filter(|p| p.position.is_none()) {
        let pos = find_free_cell(p.kind, battlefield, &occupied).ok_or_else(|| {
            CombatError::InvalidSetup("battlefield has no room for every participant".to_string())
        })?;
        p.position = Some(pos);
        occupied.push(pos);
    }
    Ok(())
}

/// Characters fill column 2 then spill left; monsters fill column width-3
/// then spill right. Within a column, rows start at 2 and wrap.
fn find_free_cell(
    kind: ParticipantKind,
    battlefield: &Battlefield,
    occupied: &[Position],
) -> Option<Position> {
    let width = battlefield.width() as i32;
    let height = battlefield.height() as i32;

    let columns: Vec<i32> = match kind {
        ParticipantKind::Character => {
            let start = 2.min(width - 1);
            (0..=start).rev().chain(start + 1..width).collect()
        }
        ParticipantKind::Monster => {
            let start = (width - 3).max(0);
            (start..width).chain((0..start).rev()).collect()
        }
    };
    let first_row = 2.min(height - 1);
    let rows: Vec<i32> = (first_row..height).chain(0..first_row).collect();

    columns.iter().find_map(|&x| {
        rows.iter()
            .map(|&y| Position::new(x, y))
            .find(|&pos| battlefield.is_occupiable(pos, occupied).unwrap_or(false))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{CellOverride, Terrain};
    use crate::domain::services::testing::ScriptedDice;

    fn hero(id: &str) -> Participant {
        Participant::new(id, id.to_uppercase(), ParticipantKind::Character, 10, 10)
    }

    fn goblin(id: &str) -> Participant {
        Participant::new(id, id.to_uppercase(), ParticipantKind::Monster, 10, 10)
    }

    fn field() -> Battlefield {
        Battlefield::new(10, 10, &[]).unwrap()
    }

    fn start(participants: Vec<Participant>) -> Encounter {
        Encounter::start(participants, field(), "plains", &mut ScriptedDice::new([])).unwrap()
    }

    fn order(encounter: &Encounter) -> Vec<&str> {
        encounter
            .initiative()
            .iter()
            .map(|e| e.participant_id.as_str())
            .collect()
    }

    #[test]
    fn test_initiative_sorted_descending_with_id_tiebreak() {
        let encounter = start(vec![
            hero("char2").with_initiative(12),
            goblin("monster1").with_initiative(15),
            hero("char1").with_initiative(18),
            goblin("monster2").with_initiative(12),
        ]);
        assert_eq!(order(&encounter), ["char1", "monster1", "char2", "monster2"]);
        assert_eq!(encounter.current_turn_index(), 0);
        assert_eq!(encounter.round_number(), 1);
        assert_eq!(encounter.status(), EncounterStatus::Active);
    }

    #[test]
    fn test_start_rejects_out_of_range_sheets() {
        let mut dice = ScriptedDice::new([]);
        let bad_sheets = [
            hero("a").with_level(2_147_483_648),
            Participant::new("a", "A", ParticipantKind::Character, 10, u32::MAX),
            Participant::new("a", "A", ParticipantKind::Character, u32::MAX, 10),
        ];
        for sheet in bad_sheets {
            let roster = vec![sheet.with_initiative(2), goblin("b").with_initiative(1)];
            assert!(matches!(
                Encounter::start(roster, field(), "x", &mut dice),
                Err(CombatError::InvalidSetup(_))
            ));
        }
    }

    #[test]
    fn test_membership_and_control() {
        let dm = UserId::new();
        let player = UserId::new();
        let stranger = UserId::new();
        let encounter = start(vec![
            hero("a").with_initiative(3).with_controller(player),
            hero("c").with_initiative(2).with_controller(dm),
            goblin("b").with_initiative(1).with_controller(dm),
        ])
        .with_creator(dm);

        assert!(encounter.is_member(dm));
        assert!(encounter.is_member(player));
        assert!(!encounter.is_member(stranger));

        assert!(encounter.controls(player, &"a".into()));
        assert!(!encounter.controls(player, &"b".into()));
        assert!(!encounter.controls(dm, &"a".into()));
        assert!(encounter.controls(dm, &"b".into()));
        assert!(!encounter.controls(stranger, &"c".into()));
    }

    #[test]
    fn test_rolled_initiative_adds_dexterity_modifier() {
        let quick = hero("a").with_abilities(crate::domain::value_objects::AbilityScores {
            dexterity: 18,
            ..Default::default()
        });
        let mut dice = ScriptedDice::new([10, 13]);
        let encounter =
            Encounter::start(vec![quick, goblin("b")], field(), "plains", &mut dice).unwrap();
        // a: 10 + 4 = 14, b: 13 + 0 = 13
        assert_eq!(order(&encounter), ["a", "b"]);
        assert_eq!(encounter.initiative()[0].score, 14);
        assert_eq!(encounter.participant(&"a".into()).unwrap().initiative, Some(14));
    }

    #[test]
    fn test_start_rejects_bad_rosters() {
        let mut dice = ScriptedDice::new([]);
        let only_heroes = vec![hero("a").with_initiative(1), hero("b").with_initiative(2)];
        assert!(Encounter::start(only_heroes, field(), "x", &mut dice).is_err());

        let duplicate = vec![hero("a").with_initiative(1), goblin("a").with_initiative(2)];
        assert!(Encounter::start(duplicate, field(), "x", &mut dice).is_err());

        let downed = vec![
            hero("a").with_initiative(1).with_hit_points(0),
            goblin("b").with_initiative(2),
        ];
        assert!(Encounter::start(downed, field(), "x", &mut dice).is_err());

        let stacked = vec![
            hero("a").with_initiative(1).with_position(Position::new(1, 1)),
            goblin("b").with_initiative(2).with_position(Position::new(1, 1)),
        ];
        assert!(matches!(
            Encounter::start(stacked, field(), "x", &mut dice),
            Err(CombatError::InvalidSetup(_))
        ));

        let outside = vec![
            hero("a").with_initiative(1).with_position(Position::new(10, 1)),
            goblin("b").with_initiative(2),
        ];
        assert!(matches!(
            Encounter::start(outside, field(), "x", &mut dice),
            Err(CombatError::OutOfBounds(_))
        ));
    }

    #[test]
    fn test_auto_placement_puts_sides_apart_and_avoids_walls() {
        let walled = Battlefield::new(
            10,
            10,
            &[CellOverride::terrain(Position::new(2, 2), Terrain::Impassable)],
        )
        .unwrap();
        let encounter = Encounter::start(
            vec![
                hero("a").with_initiative(3),
                hero("b").with_initiative(2),
                goblin("m").with_initiative(1),
            ],
            walled,
            "x",
            &mut ScriptedDice::new([]),
        )
        .unwrap();
        let pos = |id: &str| encounter.participant(&id.into()).unwrap().position.unwrap();
        assert_eq!(pos("a"), Position::new(2, 3));
        assert_eq!(pos("b"), Position::new(2, 4));
        assert_eq!(pos("m"), Position::new(7, 2));
    }

    #[test]
    fn test_advance_turn_wraps_and_counts_rounds() {
        let mut encounter = start(vec![
            hero("a").with_initiative(3),
            goblin("b").with_initiative(2),
            hero("c").with_initiative(1),
        ]);
        encounter.advance_turn();
        assert_eq!(encounter.current_participant_id().as_str(), "b");
        encounter.advance_turn();
        assert_eq!(encounter.current_participant_id().as_str(), "c");
        encounter.advance_turn();
        assert_eq!(encounter.current_participant_id().as_str(), "a");
        assert_eq!(encounter.round_number(), 2);
    }

    #[test]
    fn test_advance_turn_skips_incapacitated() {
        let mut encounter = start(vec![
            hero("a").with_initiative(4),
            goblin("b").with_initiative(3),
            hero("c").with_initiative(2),
            goblin("d").with_initiative(1),
        ]);
        encounter.participant_mut(&"b".into()).unwrap().apply_damage(100);
        encounter.participant_mut(&"c".into()).unwrap().apply_damage(100);

        encounter.advance_turn();
        assert_eq!(encounter.current_participant_id().as_str(), "d");
        encounter.advance_turn();
        assert_eq!(encounter.current_participant_id().as_str(), "a");
        assert_eq!(encounter.round_number(), 2);
    }

    #[test]
    fn test_first_turn_skips_incapacitated_leader() {
        let encounter = start(vec![
            hero("a").with_initiative(20).with_hit_points(0),
            hero("b").with_initiative(10),
            goblin("c").with_initiative(5),
        ]);
        assert_eq!(encounter.current_participant_id().as_str(), "b");
    }

    #[test]
    fn test_turn_index_stays_valid_and_rounds_never_decrease() {
        let ids = ["a", "b", "c", "d", "e"];
        let roster: Vec<Participant> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let p = if i % 2 == 0 { hero(id) } else { goblin(id) };
                p.with_initiative(i as i32 * 7 % 5)
            })
            .collect();
        let mut encounter = start(roster);
        let mut last_round = encounter.round_number();

        for step in 0..60 {
            // Knock someone out now and then, but keep one per side standing
            if step == 10 {
                encounter.participant_mut(&"c".into()).unwrap().apply_damage(50);
            }
            if step == 25 {
                encounter.participant_mut(&"b".into()).unwrap().apply_damage(50);
            }
            encounter.advance_turn();
            assert!(encounter.current_turn_index() < encounter.initiative().len());
            assert!(encounter.round_number() >= last_round);
            assert!(!encounter.current_participant().unwrap().is_incapacitated());
            last_round = encounter.round_number();
        }
    }

    #[test]
    fn test_statuses_tick_when_turn_ends() {
        let mut encounter = start(vec![hero("a").with_initiative(2), goblin("b").with_initiative(1)]);
        encounter.participant_mut(&"a".into()).unwrap().add_status("stunned", 1);
        encounter.participant_mut(&"b".into()).unwrap().add_status("blessed", 2);

        encounter.advance_turn();
        assert!(!encounter.participant(&"a".into()).unwrap().has_status("stunned"));
        assert!(encounter.participant(&"b".into()).unwrap().has_status("blessed"));
        encounter.advance_turn();
        assert_eq!(
            encounter.participant(&"b".into()).unwrap().status_effects[0].remaining_rounds,
            1
        );
    }

    #[test]
    fn test_check_completion_when_a_side_falls() {
        let mut encounter = start(vec![
            hero("a").with_initiative(3),
            goblin("b").with_initiative(2),
            goblin("c").with_initiative(1),
        ]);
        encounter.participant_mut(&"b".into()).unwrap().apply_damage(10);
        assert!(!encounter.check_completion());
        assert!(encounter.ensure_active().is_ok());

        encounter.participant_mut(&"c".into()).unwrap().apply_damage(10);
        assert!(encounter.check_completion());
        assert_eq!(encounter.status(), EncounterStatus::Completed);
        assert_eq!(encounter.outcome(), Some(EncounterOutcome::CharactersVictorious));
        assert_eq!(encounter.ensure_active(), Err(CombatError::EncounterCompleted));
    }
}
