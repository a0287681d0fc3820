//! Combat rules - weapon, spell and condition tables plus movement and turn policy
//!
//! Nothing here is compiled-in game balance: the defaults ship as
//! `config/combat_rules.toml` and are loaded by the infrastructure layer.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::errors::CombatError;
use crate::domain::value_objects::{Ability, DiceFormula};

/// Which actions end the acting participant's turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TurnPolicy {
    /// Attack, cast_spell and move all end the turn
    #[default]
    EveryAction,
    /// Attack and cast_spell end the turn; moves spend the movement allowance
    MajorActions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponRule {
    pub damage: DiceFormula,
    pub damage_type: String,
    /// Ability whose modifier is added to attack and damage rolls
    pub ability: Ability,
    pub range_feet: u32,
    /// Ranged weapons need line of sight to the target
    #[serde(default)]
    pub ranged: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusRule {
    pub name: String,
    pub duration_rounds: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpellRule {
    pub name: String,
    #[serde(default)]
    pub damage: Option<DiceFormula>,
    #[serde(default)]
    pub damage_type: Option<String>,
    #[serde(default)]
    pub healing: Option<DiceFormula>,
    pub casting_ability: Ability,
    pub range_feet: u32,
    #[serde(default = "default_max_targets")]
    pub max_targets: usize,
    /// Skips the spell attack roll
    #[serde(default)]
    pub auto_hit: bool,
    /// Always targets the caster
    #[serde(default)]
    pub self_only: bool,
    #[serde(default)]
    pub status: Option<StatusRule>,
}

fn default_max_targets() -> usize {
    1
}

impl SpellRule {
    pub fn is_healing(&self) -> bool {
        self.healing.is_some() && self.damage.is_none()
    }
}

/// Mechanical effect of a named status condition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConditionRule {
    #[serde(default)]
    pub armor_class_bonus: i32,
    #[serde(default)]
    pub prevents_actions: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatRules {
    #[serde(default)]
    pub turn_policy: TurnPolicy,
    pub feet_per_square: u32,
    pub default_speed_feet: u32,
    /// Movement cost, in squares, of entering a difficult cell
    pub difficult_terrain_cost: u32,
    pub critical_hit_roll: u32,
    pub critical_miss_roll: u32,
    pub default_weapon: String,
    pub weapons: HashMap<String, WeaponRule>,
    #[serde(default)]
    pub spells: HashMap<String, SpellRule>,
    #[serde(default)]
    pub conditions: HashMap<String, ConditionRule>,
}

impl CombatRules {
    /// Look up a weapon, falling back to the default weapon when none is named
    pub fn weapon(&self, name: Option<&str>) -> Result<(&str, &WeaponRule), CombatError> {
        let key = name.unwrap_or(&self.default_weapon);
        self.weapons
            .get_key_value(&key.to_lowercase())
            .map(|(k, w)| (k.as_str(), w))
            .ok_or_else(|| CombatError::UnknownWeapon(key.to_string()))
    }

    pub fn spell(&self, id: &str) -> Result<&SpellRule, CombatError> {
        self.spells
            .get(&id.to_lowercase())
            .ok_or_else(|| CombatError::UnknownSpell(id.to_string()))
    }

    pub fn condition(&self, name: &str) -> Option<&ConditionRule> {
        self.conditions.get(name)
    }

    /// Range in squares; anything shorter than one square still reaches adjacent cells
    pub fn range_in_squares(&self, range_feet: u32) -> u32 {
        (range_feet / self.feet_per_square.max(1)).max(1)
    }

    /// Squares a participant may move per turn
    pub fn movement_allowance(&self, speed_feet: u32) -> u32 {
        speed_feet / self.feet_per_square.max(1)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.feet_per_square == 0 {
            return Err("feet_per_square must be positive".to_string());
        }
        if self.difficult_terrain_cost == 0 {
            return Err("difficult_terrain_cost must be positive".to_string());
        }
        if !self.weapons.contains_key(&self.default_weapon) {
            return Err(format!(
                "default weapon '{}' is not in the weapon table",
                self.default_weapon
            ));
        }
        for (id, spell) in &self.spells {
            if spell.max_targets == 0 {
                return Err(format!("spell '{}' must allow at least one target", id));
            }
            if spell.damage.is_none() && spell.healing.is_none() && spell.status.is_none() {
                return Err(format!("spell '{}' has no effect", id));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Small rule set with round numbers for deterministic tests
    pub fn test_rules() -> CombatRules {
        let mut weapons = HashMap::new();
        weapons.insert(
            "longsword".to_string(),
            WeaponRule {
                damage: DiceFormula::new(1, 8, 0),
                damage_type: "slashing".to_string(),
                ability: Ability::Strength,
                range_feet: 5,
                ranged: false,
            },
        );
        weapons.insert(
            "longbow".to_string(),
            WeaponRule {
                damage: DiceFormula::new(1, 8, 0),
                damage_type: "piercing".to_string(),
                ability: Ability::Dexterity,
                range_feet: 80,
                ranged: true,
            },
        );

        let mut spells = HashMap::new();
        spells.insert(
            "magic-missile".to_string(),
            SpellRule {
                name: "Magic Missile".to_string(),
                damage: Some(DiceFormula::new(3, 4, 3)),
                damage_type: Some("force".to_string()),
                healing: None,
                casting_ability: Ability::Intelligence,
                range_feet: 120,
                max_targets: 1,
                auto_hit: true,
                self_only: false,
                status: None,
            },
        );
        spells.insert(
            "thunderwave".to_string(),
            SpellRule {
                name: "Thunderwave".to_string(),
                damage: Some(DiceFormula::new(2, 8, 0)),
                damage_type: Some("thunder".to_string()),
                healing: None,
                casting_ability: Ability::Intelligence,
                range_feet: 15,
                max_targets: 3,
                auto_hit: true,
                self_only: false,
                status: Some(StatusRule {
                    name: "stunned".to_string(),
                    duration_rounds: 1,
                }),
            },
        );
        spells.insert(
            "cure-wounds".to_string(),
            SpellRule {
                name: "Cure Wounds".to_string(),
                damage: None,
                damage_type: None,
                healing: Some(DiceFormula::new(1, 8, 0)),
                casting_ability: Ability::Wisdom,
                range_feet: 5,
                max_targets: 1,
                auto_hit: true,
                self_only: false,
                status: None,
            },
        );
        spells.insert(
            "shield".to_string(),
            SpellRule {
                name: "Shield".to_string(),
                damage: None,
                damage_type: None,
                healing: None,
                casting_ability: Ability::Intelligence,
                range_feet: 0,
                max_targets: 1,
                auto_hit: true,
                self_only: true,
                status: Some(StatusRule {
                    name: "shielded".to_string(),
                    duration_rounds: 1,
                }),
            },
        );

        let mut conditions = HashMap::new();
        conditions.insert(
            "shielded".to_string(),
            ConditionRule {
                armor_class_bonus: 5,
                prevents_actions: false,
            },
        );
        conditions.insert(
            "stunned".to_string(),
            ConditionRule {
                armor_class_bonus: 0,
                prevents_actions: true,
            },
        );

        CombatRules {
            turn_policy: TurnPolicy::EveryAction,
            feet_per_square: 5,
            default_speed_feet: 30,
            difficult_terrain_cost: 2,
            critical_hit_roll: 20,
            critical_miss_roll: 1,
            default_weapon: "longsword".to_string(),
            weapons,
            spells,
            conditions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::test_rules;
    use super::*;

    #[test]
    fn test_weapon_lookup_falls_back_to_default() {
        let rules = test_rules();
        let (name, weapon) = rules.weapon(None).unwrap();
        assert_eq!(name, "longsword");
        assert_eq!(weapon.range_feet, 5);
        assert_eq!(rules.weapon(Some("Longbow")).unwrap().0, "longbow");
        assert_eq!(
            rules.weapon(Some("trebuchet")).unwrap_err(),
            CombatError::UnknownWeapon("trebuchet".to_string())
        );
    }

    #[test]
    fn test_ranges_and_allowance_in_squares() {
        let rules = test_rules();
        assert_eq!(rules.range_in_squares(5), 1);
        assert_eq!(rules.range_in_squares(0), 1);
        assert_eq!(rules.range_in_squares(80), 16);
        assert_eq!(rules.movement_allowance(30), 6);
    }

    #[test]
    fn test_validate_catches_missing_default_weapon() {
        let mut rules = test_rules();
        assert!(rules.validate().is_ok());
        rules.default_weapon = "fists".to_string();
        assert!(rules.validate().is_err());
    }
}
