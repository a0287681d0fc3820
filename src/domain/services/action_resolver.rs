//! Action resolver - validates a combat action and applies it to an encounter
//!
//! Every check runs before the first mutation, so a refused action leaves the
//! encounter exactly as it was.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::entities::{ActionLogEntry, Battlefield, Encounter, Participant};
use crate::domain::errors::CombatError;
use crate::domain::services::DiceRoller;
use crate::domain::value_objects::{
    ActionRequest, ActionResult, ActionType, CombatAction, CombatRules, EffectSummary, Movement,
    ParticipantId, Position, TargetEffect, TurnPolicy,
};

/// What a handler produced before turn bookkeeping
struct Resolution {
    success: bool,
    description: String,
    effects: EffectSummary,
}

struct AttackRoll {
    natural: u32,
    total: i32,
    hit: bool,
    critical: bool,
}

pub struct ActionResolver {
    rules: Arc<CombatRules>,
}

impl ActionResolver {
    pub fn new(rules: Arc<CombatRules>) -> Self {
        Self { rules }
    }

    pub fn resolve(
        &self,
        encounter: &mut Encounter,
        request: &ActionRequest,
        dice: &mut dyn DiceRoller,
    ) -> Result<ActionResult, CombatError> {
        let actor_id = &request.actor;
        let action_type = request.action.action_type();
        self.check_preconditions(encounter, actor_id, action_type)?;

        let round = encounter.round_number();
        let resolution = match &request.action {
            CombatAction::Attack { targets, weapon } => {
                self.attack(encounter, actor_id, targets, weapon.as_deref(), dice)?
            }
            CombatAction::CastSpell { spell, targets } => {
                self.cast_spell(encounter, actor_id, spell, targets, dice)?
            }
            CombatAction::Move { destination, path } => {
                self.move_actor(encounter, actor_id, *destination, path)?
            }
            CombatAction::EndTurn => Resolution {
                success: true,
                description: format!("{} ends their turn", display_name(encounter, actor_id)),
                effects: EffectSummary::default(),
            },
        };

        let encounter_completed = encounter.check_completion();
        let turn_ended = !encounter_completed && self.ends_turn(action_type);
        if turn_ended {
            encounter.advance_turn();
        }

        encounter.record(ActionLogEntry {
            round,
            actor_id: actor_id.clone(),
            action_type,
            success: resolution.success,
            description: resolution.description.clone(),
            timestamp: Utc::now(),
        });

        Ok(ActionResult {
            action_type,
            actor_id: actor_id.clone(),
            success: resolution.success,
            description: resolution.description,
            effects: resolution.effects,
            turn_ended,
            encounter_completed,
        })
    }

    fn check_preconditions(
        &self,
        encounter: &Encounter,
        actor_id: &ParticipantId,
        action_type: ActionType,
    ) -> Result<(), CombatError> {
        encounter.ensure_active()?;
        let actor = encounter
            .participant(actor_id)
            .ok_or_else(|| CombatError::ParticipantNotFound(actor_id.clone()))?;

        let current = encounter.current_participant_id();
        if current != actor_id {
            return Err(CombatError::NotYourTurn {
                actor: actor_id.clone(),
                current: current.clone(),
            });
        }
        if actor.is_incapacitated() {
            return Err(CombatError::ActorIncapacitated(actor_id.clone()));
        }
        if action_type != ActionType::EndTurn {
            if let Some(condition) = actor.restraining_condition(&self.rules) {
                return Err(CombatError::ActorRestrained {
                    actor: actor_id.clone(),
                    condition: condition.to_string(),
                });
            }
        }
        Ok(())
    }

    fn ends_turn(&self, action_type: ActionType) -> bool {
        match (action_type, self.rules.turn_policy) {
            (ActionType::Move, TurnPolicy::MajorActions) => false,
            _ => true,
        }
    }

    fn attack(
        &self,
        encounter: &mut Encounter,
        actor_id: &ParticipantId,
        targets: &[ParticipantId],
        weapon: Option<&str>,
        dice: &mut dyn DiceRoller,
    ) -> Result<Resolution, CombatError> {
        let [target_id] = targets else {
            return Err(CombatError::InvalidTarget(
                "an attack needs exactly one target".to_string(),
            ));
        };
        let (weapon_name, weapon) = self.rules.weapon(weapon)?;

        let actor = find(encounter, actor_id)?;
        let target = find(encounter, target_id)?;
        ensure_hostile_target(actor, target)?;
        self.check_reach(
            encounter.battlefield(),
            actor,
            target,
            weapon.range_feet,
            weapon.ranged,
        )?;

        let damage_modifier = actor.ability_modifier(weapon.ability);
        let attack_modifier = damage_modifier + actor.proficiency_bonus();
        let armor_class = target.effective_armor_class(&self.rules);
        let actor_name = actor.name.clone();
        let target_name = target.name.clone();

        let roll = self.attack_roll(dice, attack_modifier, armor_class);
        let mut effect = TargetEffect::new(target_id.clone());
        effect.hit = roll.hit;
        effect.critical = roll.critical;

        let description = if roll.hit {
            let formula = if roll.critical {
                weapon.damage.doubled_dice()
            } else {
                weapon.damage
            };
            let damage = (dice.roll(&formula) + damage_modifier).max(0);
            let target = find_mut(encounter, target_id)?;
            effect.incapacitated = target.apply_damage(damage);
            effect.damage = damage as u32;

            format!(
                "{} {} {} with {} (rolled {}, total {} vs AC {}) for {} {} damage{}",
                actor_name,
                if roll.critical { "critically hits" } else { "hits" },
                target_name,
                weapon_name,
                roll.natural,
                roll.total,
                armor_class,
                damage,
                weapon.damage_type,
                if effect.incapacitated { ", dropping them" } else { "" }
            )
        } else {
            format!(
                "{} misses {} with {} (rolled {}, total {} vs AC {})",
                actor_name, target_name, weapon_name, roll.natural, roll.total, armor_class
            )
        };

        let mut effects = EffectSummary::default();
        effects.record(effect);
        Ok(Resolution {
            success: roll.hit,
            description,
            effects,
        })
    }

    fn cast_spell(
        &self,
        encounter: &mut Encounter,
        actor_id: &ParticipantId,
        spell_id: &str,
        targets: &[ParticipantId],
        dice: &mut dyn DiceRoller,
    ) -> Result<Resolution, CombatError> {
        let spell = self.rules.spell(spell_id)?;
        let actor = find(encounter, actor_id)?;
        if !actor.knows_spell(spell_id) {
            return Err(CombatError::SpellNotKnown {
                actor: actor_id.clone(),
                spell: spell_id.to_string(),
            });
        }

        let target_ids: Vec<ParticipantId> = if spell.self_only {
            if targets.iter().any(|t| t != actor_id) {
                return Err(CombatError::InvalidTarget(format!(
                    "{} can only target the caster",
                    spell.name
                )));
            }
            vec![actor_id.clone()]
        } else {
            if targets.is_empty() || targets.len() > spell.max_targets {
                return Err(CombatError::InvalidTarget(format!(
                    "{} takes between 1 and {} targets",
                    spell.name, spell.max_targets
                )));
            }
            let mut unique = targets.to_vec();
            unique.sort();
            unique.dedup();
            if unique.len() != targets.len() {
                return Err(CombatError::InvalidTarget(
                    "a target cannot be named twice".to_string(),
                ));
            }
            targets.to_vec()
        };

        for target_id in &target_ids {
            let target = find(encounter, target_id)?;
            if spell.self_only {
                continue;
            }
            // Healing may reach allies who are down; harmful spells need a standing foe
            if !spell.is_healing() {
                ensure_hostile_target(actor, target)?;
            }
            self.check_reach(encounter.battlefield(), actor, target, spell.range_feet, true)?;
        }

        let casting_modifier = actor.ability_modifier(spell.casting_ability);
        let attack_modifier = casting_modifier + actor.proficiency_bonus();
        let actor_name = actor.name.clone();
        let needs_roll = !(spell.auto_hit || spell.self_only || spell.is_healing());

        let mut effects = EffectSummary::default();
        let mut outcomes = Vec::with_capacity(target_ids.len());
        for target_id in &target_ids {
            let target = find(encounter, target_id)?;
            let armor_class = target.effective_armor_class(&self.rules);
            let target_name = target.name.clone();

            let mut effect = TargetEffect::new(target_id.clone());
            let (hit, critical) = if needs_roll {
                let roll = self.attack_roll(dice, attack_modifier, armor_class);
                (roll.hit, roll.critical)
            } else {
                (true, false)
            };
            effect.hit = hit;
            effect.critical = critical;

            if !hit {
                outcomes.push(format!("misses {}", target_name));
                effects.record(effect);
                continue;
            }

            let damage = spell.damage.map(|formula| {
                let formula = if critical { formula.doubled_dice() } else { formula };
                (dice.roll(&formula) + casting_modifier).max(0)
            });
            let healing = spell
                .healing
                .map(|formula| (dice.roll(&formula) + casting_modifier).max(0) as u32);

            let target = find_mut(encounter, target_id)?;
            let mut parts = Vec::new();
            if let Some(damage) = damage {
                target.apply_damage(damage);
                effect.damage = damage as u32;
                parts.push(format!(
                    "{} {} damage",
                    damage,
                    spell.damage_type.as_deref().unwrap_or("magical")
                ));
            }
            if let Some(healing) = healing {
                effect.healing = target.heal(healing);
                parts.push(format!("{} healing", effect.healing));
            }
            if let Some(status) = &spell.status {
                // The caster's own end-of-turn tick would otherwise clear it at once
                let duration = if target_id == actor_id {
                    status.duration_rounds + 1
                } else {
                    status.duration_rounds
                };
                target.add_status(status.name.clone(), duration);
                effect.statuses_applied.push(status.name.clone());
                parts.push(status.name.clone());
            }
            effect.incapacitated = target.is_incapacitated();

            let summary = if parts.is_empty() {
                format!("affects {}", target_name)
            } else {
                format!("{}: {}", target_name, parts.join(", "))
            };
            outcomes.push(summary);
            effects.record(effect);
        }

        let success = effects.targets.iter().any(|t| t.hit);
        Ok(Resolution {
            success,
            description: format!("{} casts {} ({})", actor_name, spell.name, outcomes.join("; ")),
            effects,
        })
    }

    fn move_actor(
        &self,
        encounter: &mut Encounter,
        actor_id: &ParticipantId,
        destination: Position,
        path: &[Position],
    ) -> Result<Resolution, CombatError> {
        let battlefield = encounter.battlefield();
        if !battlefield.contains(destination) {
            return Err(CombatError::OutOfBounds(destination));
        }
        let actor = find(encounter, actor_id)?;
        let from = actor.position.ok_or_else(|| {
            CombatError::IllegalMove(format!("{} is not on the battlefield", actor.name))
        })?;
        if from == destination {
            return Err(CombatError::IllegalMove(format!(
                "{} is already at {}",
                actor.name, destination
            )));
        }

        let occupied = encounter.occupied_positions(actor_id);
        if !battlefield.is_occupiable(destination, &occupied)? {
            return Err(CombatError::IllegalMove(format!(
                "{} is blocked or occupied",
                destination
            )));
        }

        let allowance = self
            .rules
            .movement_allowance(actor.speed(&self.rules))
            .saturating_sub(encounter.movement_used());
        let cost = if path.is_empty() {
            battlefield
                .path_cost(
                    from,
                    destination,
                    &occupied,
                    self.rules.difficult_terrain_cost,
                    allowance,
                )
                .ok_or_else(|| {
                    CombatError::IllegalMove(format!(
                        "no path to {} within {} squares of movement",
                        destination, allowance
                    ))
                })?
        } else {
            if path.last() != Some(&destination) {
                return Err(CombatError::IllegalMove(format!(
                    "path does not end at {}",
                    destination
                )));
            }
            let cost = battlefield.walk_cost(
                from,
                path,
                &occupied,
                self.rules.difficult_terrain_cost,
            )?;
            if cost > allowance {
                return Err(CombatError::IllegalMove(format!(
                    "path costs {} squares but only {} remain",
                    cost, allowance
                )));
            }
            cost
        };
        let actor_name = actor.name.clone();

        encounter.move_participant(actor_id, destination)?;
        encounter.spend_movement(cost);

        Ok(Resolution {
            success: true,
            description: format!(
                "{} moves from {} to {} ({} squares of movement)",
                actor_name, from, destination, cost
            ),
            effects: EffectSummary {
                movement: Some(Movement {
                    from,
                    to: destination,
                    cost,
                }),
                ..Default::default()
            },
        })
    }

    /// Chebyshev distance against the range; line of sight when required
    fn check_reach(
        &self,
        battlefield: &Battlefield,
        actor: &Participant,
        target: &Participant,
        range_feet: u32,
        needs_sight: bool,
    ) -> Result<(), CombatError> {
        let (Some(from), Some(to)) = (actor.position, target.position) else {
            return Err(CombatError::InvalidTarget(format!(
                "{} is not on the battlefield",
                target.id
            )));
        };
        let distance = from.chebyshev_distance(&to);
        let range = self.rules.range_in_squares(range_feet);
        if distance > range {
            return Err(CombatError::OutOfRange {
                target: target.id.clone(),
                distance,
                range,
            });
        }
        if needs_sight && !battlefield.has_line_of_sight(from, to) {
            return Err(CombatError::NoLineOfSight { from, to });
        }
        Ok(())
    }

    fn attack_roll(&self, dice: &mut dyn DiceRoller, modifier: i32, armor_class: i32) -> AttackRoll {
        let natural = dice.d20();
        let total = natural as i32 + modifier;
        let critical = natural >= self.rules.critical_hit_roll;
        let hit = natural > self.rules.critical_miss_roll && (critical || total >= armor_class);
        AttackRoll {
            natural,
            total,
            hit,
            critical: critical && hit,
        }
    }
}

fn find<'a>(encounter: &'a Encounter, id: &ParticipantId) -> Result<&'a Participant, CombatError> {
    encounter
        .participant(id)
        .ok_or_else(|| CombatError::ParticipantNotFound(id.clone()))
}

fn find_mut<'a>(
    encounter: &'a mut Encounter,
    id: &ParticipantId,
) -> Result<&'a mut Participant, CombatError> {
    encounter
        .participant_mut(id)
        .ok_or_else(|| CombatError::ParticipantNotFound(id.clone()))
}

fn ensure_hostile_target(actor: &Participant, target: &Participant) -> Result<(), CombatError> {
    if actor.id == target.id {
        return Err(CombatError::InvalidTarget(format!(
            "{} cannot target themselves",
            actor.name
        )));
    }
    if target.is_incapacitated() {
        return Err(CombatError::InvalidTarget(format!(
            "{} is already down",
            target.name
        )));
    }
    Ok(())
}

fn display_name(encounter: &Encounter, id: &ParticipantId) -> String {
    encounter
        .participant(id)
        .map(|p| p.name.clone())
        .unwrap_or_else(|| id.to_string())
}
