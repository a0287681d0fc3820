//! Participant entity - a character or monster taking part in an encounter

use serde::{Deserialize, Serialize};

use crate::domain::entities::Battlefield;
use crate::domain::errors::CombatError;
use crate::domain::value_objects::{
    Ability, AbilityScores, CharacterId, CombatRules, ParticipantId, Position, UserId,
};

/// Highest character level
pub const MAX_LEVEL: u32 = 20;
/// Upper bound on armor class accepted from a sheet
pub const MAX_ARMOR_CLASS: u32 = 50;
/// Upper bound on hit points accepted from a sheet
pub const MAX_HIT_POINTS: u32 = 10_000;

/// Which side a participant fights on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantKind {
    Character,
    Monster,
}

impl ParticipantKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Character => "character",
            Self::Monster => "monster",
        }
    }
}

/// A named condition with the number of rounds it has left
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub name: String,
    pub remaining_rounds: u32,
}

/// A combatant. Owned by exactly one encounter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub kind: ParticipantKind,
    pub abilities: AbilityScores,
    pub level: u32,
    pub hit_points: u32,
    pub max_hit_points: u32,
    pub armor_class: u32,
    /// None means "use the rules' default speed"
    pub speed_feet: Option<u32>,
    /// Assigned score, or the rolled one once the encounter has started
    pub initiative: Option<i32>,
    /// None until placed on the battlefield
    pub position: Option<Position>,
    pub status_effects: Vec<StatusEffect>,
    pub equipment: Vec<String>,
    pub spells: Vec<String>,
    /// Stored character this participant was created from, if any
    pub character_id: Option<CharacterId>,
    /// User who may act for this participant
    pub controller: Option<UserId>,
}

impl Participant {
    pub fn new(
        id: impl Into<ParticipantId>,
        name: impl Into<String>,
        kind: ParticipantKind,
        max_hit_points: u32,
        armor_class: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            abilities: AbilityScores::default(),
            level: 1,
            hit_points: max_hit_points,
            max_hit_points,
            armor_class,
            speed_feet: None,
            initiative: None,
            position: None,
            status_effects: Vec::new(),
            equipment: Vec::new(),
            spells: Vec::new(),
            character_id: None,
            controller: None,
        }
    }

    pub fn with_abilities(mut self, abilities: AbilityScores) -> Self {
        self.abilities = abilities;
        self
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level.max(1);
        self
    }

    /// Current hit points, clamped to the maximum
    pub fn with_hit_points(mut self, hit_points: u32) -> Self {
        self.hit_points = hit_points.min(self.max_hit_points);
        self
    }

    pub fn with_speed(mut self, speed_feet: u32) -> Self {
        self.speed_feet = Some(speed_feet);
        self
    }

    pub fn with_initiative(mut self, initiative: i32) -> Self {
        self.initiative = Some(initiative);
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_equipment(mut self, equipment: Vec<String>) -> Self {
        self.equipment = equipment;
        self
    }

    pub fn with_spells(mut self, spells: Vec<String>) -> Self {
        self.spells = spells;
        self
    }

    pub fn with_character_id(mut self, character_id: CharacterId) -> Self {
        self.character_id = Some(character_id);
        self
    }

    pub fn with_controller(mut self, user_id: UserId) -> Self {
        self.controller = Some(user_id);
        self
    }

    /// Sheet values the combat math can rely on
    pub fn validate_sheet(&self) -> Result<(), String> {
        if !(1..=MAX_LEVEL).contains(&self.level) {
            return Err(format!("level must be between 1 and {}", MAX_LEVEL));
        }
        if !(1..=MAX_ARMOR_CLASS).contains(&self.armor_class) {
            return Err(format!("armor class must be between 1 and {}", MAX_ARMOR_CLASS));
        }
        if !(1..=MAX_HIT_POINTS).contains(&self.max_hit_points) {
            return Err(format!("max hit points must be between 1 and {}", MAX_HIT_POINTS));
        }
        self.abilities.validate()
    }

    pub fn is_incapacitated(&self) -> bool {
        self.hit_points == 0
    }

    /// Subtract `amount` (negative heals), clamping to [0, max_hit_points].
    ///
    /// Returns whether the participant is incapacitated afterwards.
    pub fn apply_damage(&mut self, amount: i32) -> bool {
        let updated = i64::from(self.hit_points) - i64::from(amount);
        self.hit_points = updated.clamp(0, i64::from(self.max_hit_points)) as u32;
        self.is_incapacitated()
    }

    /// Restore hit points; returns how many were actually restored
    pub fn heal(&mut self, amount: u32) -> u32 {
        let before = self.hit_points;
        self.apply_damage(-(amount.min(i32::MAX as u32) as i32));
        self.hit_points - before
    }

    /// Move to `destination` if the cell is occupiable.
    ///
    /// `occupied` holds the positions of the other participants. On failure
    /// the position is left unchanged.
    pub fn move_to(
        &mut self,
        destination: Position,
        battlefield: &Battlefield,
        occupied: &[Position],
    ) -> Result<(), CombatError> {
        if !battlefield.contains(destination) {
            return Err(CombatError::OutOfBounds(destination));
        }
        if !battlefield.is_occupiable(destination, occupied)? {
            return Err(CombatError::IllegalMove(format!(
                "{} cannot move to {}: cell is blocked or occupied",
                self.name, destination
            )));
        }
        self.position = Some(destination);
        Ok(())
    }

    /// Add a condition, keeping the longer duration if it is already active
    pub fn add_status(&mut self, name: impl Into<String>, duration_rounds: u32) {
        let name = name.into();
        if duration_rounds == 0 {
            return;
        }
        match self.status_effects.iter_mut().find(|s| s.name == name) {
            Some(existing) => {
                existing.remaining_rounds = existing.remaining_rounds.max(duration_rounds);
            }
            None => self.status_effects.push(StatusEffect {
                name,
                remaining_rounds: duration_rounds,
            }),
        }
    }

    /// One round has elapsed for this participant
    pub fn tick_statuses(&mut self) {
        for status in &mut self.status_effects {
            status.remaining_rounds = status.remaining_rounds.saturating_sub(1);
        }
        self.status_effects.retain(|s| s.remaining_rounds > 0);
    }

    pub fn has_status(&self, name: &str) -> bool {
        self.status_effects.iter().any(|s| s.name == name)
    }

    pub fn ability_modifier(&self, ability: Ability) -> i32 {
        self.abilities.modifier(ability)
    }

    /// +2 at level 1, rising by one every four levels
    pub fn proficiency_bonus(&self) -> i32 {
        let level = i32::try_from(self.level.clamp(1, MAX_LEVEL)).unwrap_or(1);
        2 + (level - 1) / 4
    }

    /// Armor class including bonuses from active conditions
    pub fn effective_armor_class(&self, rules: &CombatRules) -> i32 {
        let bonus: i32 = self
            .status_effects
            .iter()
            .filter_map(|s| rules.condition(&s.name))
            .map(|c| c.armor_class_bonus)
            .sum();
        i32::try_from(self.armor_class)
            .unwrap_or(i32::MAX)
            .saturating_add(bonus)
    }

    /// First active condition that prevents acting, if any
    pub fn restraining_condition(&self, rules: &CombatRules) -> Option<&str> {
        self.status_effects
            .iter()
            .find(|s| rules.condition(&s.name).is_some_and(|c| c.prevents_actions))
            .map(|s| s.name.as_str())
    }

    /// Movement speed in feet, falling back to the rules' default
    pub fn speed(&self, rules: &CombatRules) -> u32 {
        self.speed_feet.unwrap_or(rules.default_speed_feet)
    }

    pub fn knows_spell(&self, spell_id: &str) -> bool {
        self.spells.iter().any(|s| s.eq_ignore_ascii_case(spell_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{CellOverride, Terrain};
    use crate::domain::value_objects::testing::test_rules;

    fn fighter() -> Participant {
        Participant::new("char1", "Aragorn", ParticipantKind::Character, 80, 16)
            .with_hit_points(75)
            .with_position(Position::new(2, 3))
    }

    #[test]
    fn test_apply_damage_clamps_to_bounds() {
        let mut p = fighter();
        for amount in [-1000, -1, 0, 1, 5, 74, 75, 76, 1000, i32::MIN, i32::MAX] {
            let mut q = p.clone();
            let incapacitated = q.apply_damage(amount);
            assert!(q.hit_points <= q.max_hit_points, "amount {}", amount);
            assert_eq!(incapacitated, q.hit_points == 0, "amount {}", amount);
        }

        assert!(!p.apply_damage(0));
        assert_eq!(p.hit_points, 75);
        assert!(!p.apply_damage(-10));
        assert_eq!(p.hit_points, 80);
        assert!(p.apply_damage(200));
        assert_eq!(p.hit_points, 0);
    }

    #[test]
    fn test_heal_reports_actual_amount() {
        let mut p = fighter();
        assert_eq!(p.heal(3), 3);
        assert_eq!(p.heal(10), 2);
        assert_eq!(p.hit_points, 80);
    }

    #[test]
    fn test_with_hit_points_never_exceeds_max() {
        let p = Participant::new("m", "Orc", ParticipantKind::Monster, 30, 13).with_hit_points(99);
        assert_eq!(p.hit_points, 30);
    }

    #[test]
    fn test_move_to_rejects_blocked_cells_and_keeps_position() {
        let field = Battlefield::new(
            10,
            10,
            &[CellOverride::terrain(Position::new(3, 3), Terrain::Impassable)],
        )
        .unwrap();
        let mut p = fighter();
        let occupied = [Position::new(2, 4)];

        let err = p.move_to(Position::new(3, 3), &field, &occupied).unwrap_err();
        assert!(matches!(err, CombatError::IllegalMove(_)));
        assert_eq!(p.position, Some(Position::new(2, 3)));

        let err = p.move_to(Position::new(2, 4), &field, &occupied).unwrap_err();
        assert!(matches!(err, CombatError::IllegalMove(_)));
        assert_eq!(p.position, Some(Position::new(2, 3)));

        assert!(p.move_to(Position::new(3, 4), &field, &occupied).is_ok());
        assert_eq!(p.position, Some(Position::new(3, 4)));
    }

    #[test]
    fn test_status_durations_tick_down_and_expire() {
        let mut p = fighter();
        p.add_status("stunned", 1);
        p.add_status("blessed", 3);
        p.add_status("blessed", 2);
        p.add_status("ignored", 0);
        assert_eq!(p.status_effects.len(), 2);

        p.tick_statuses();
        assert!(!p.has_status("stunned"));
        assert!(p.has_status("blessed"));
        p.tick_statuses();
        p.tick_statuses();
        assert!(p.status_effects.is_empty());
    }

    #[test]
    fn test_conditions_adjust_armor_class_and_actions() {
        let rules = test_rules();
        let mut p = fighter();
        assert_eq!(p.effective_armor_class(&rules), 16);
        p.add_status("shielded", 1);
        assert_eq!(p.effective_armor_class(&rules), 21);
        assert_eq!(p.restraining_condition(&rules), None);
        p.add_status("stunned", 1);
        assert_eq!(p.restraining_condition(&rules), Some("stunned"));
    }

    #[test]
    fn test_proficiency_bonus_by_level() {
        let p = fighter();
        assert_eq!(p.clone().with_level(1).proficiency_bonus(), 2);
        assert_eq!(p.clone().with_level(4).proficiency_bonus(), 2);
        assert_eq!(p.clone().with_level(5).proficiency_bonus(), 3);
        assert_eq!(p.clone().with_level(17).proficiency_bonus(), 6);
        assert_eq!(p.clone().with_level(2_147_483_648).proficiency_bonus(), 6);
    }

    #[test]
    fn test_huge_armor_class_does_not_wrap() {
        let rules = test_rules();
        let p = Participant::new("m", "Golem", ParticipantKind::Monster, 30, u32::MAX);
        assert_eq!(p.effective_armor_class(&rules), i32::MAX);
    }

    #[test]
    fn test_validate_sheet_bounds() {
        assert!(fighter().validate_sheet().is_ok());
        assert!(fighter().with_level(21).validate_sheet().is_err());
        assert!(Participant::new("m", "Orc", ParticipantKind::Monster, 30, 0)
            .validate_sheet()
            .is_err());
        assert!(Participant::new("m", "Orc", ParticipantKind::Monster, 30, u32::MAX)
            .validate_sheet()
            .is_err());
        assert!(Participant::new("m", "Orc", ParticipantKind::Monster, MAX_HIT_POINTS + 1, 12)
            .validate_sheet()
            .is_err());
    }
}
