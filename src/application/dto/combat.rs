use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::services::{ActionResponse, BattlefieldRequest, StartCombatRequest};
use crate::domain::entities::{
    ActionLogEntry, CellOverride, Encounter, EncounterOutcome, EncounterStatus, GridObject,
    InitiativeEntry, Participant, ParticipantKind, StatusEffect, Terrain,
};
use crate::domain::value_objects::{
    AbilityScores, ActionRequest, ActionResult, ActionType, CharacterId, CombatAction, Movement,
    ParticipantId, Position, TargetEffect, UserId,
};

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct StartCombatRequestDto {
    #[serde(default)]
    pub participants: Vec<ParticipantRequestDto>,
    #[serde(default)]
    pub character_ids: Vec<String>,
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default)]
    pub battlefield: Option<BattlefieldRequestDto>,
}

fn default_environment() -> String {
    "forest".to_string()
}

impl StartCombatRequestDto {
    pub fn into_request(self) -> Result<StartCombatRequest, String> {
        let character_ids = self
            .character_ids
            .iter()
            .map(|id| {
                id.parse::<CharacterId>()
                    .map_err(|_| format!("Invalid character ID: {}", id))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if self.participants.is_empty() && character_ids.is_empty() {
            return Err("An encounter needs participants".to_string());
        }

        let battlefield = self
            .battlefield
            .map(|b| BattlefieldRequest {
                width: b.width,
                height: b.height,
                overrides: b.cells,
            })
            .unwrap_or_default();

        Ok(StartCombatRequest {
            participants: self
                .participants
                .into_iter()
                .map(Participant::try_from)
                .collect::<Result<Vec<_>, _>>()?,
            character_ids,
            environment: self.environment,
            battlefield,
        })
    }
}

/// Inline combatant, using the short field names clients already send
#[derive(Debug, Deserialize)]
pub struct ParticipantRequestDto {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParticipantKind,
    /// Current hit points; defaults to max_hp
    #[serde(default)]
    pub hp: Option<u32>,
    pub max_hp: u32,
    pub ac: u32,
    #[serde(default)]
    pub level: Option<u32>,
    #[serde(default)]
    pub abilities: AbilityScores,
    #[serde(default)]
    pub speed: Option<u32>,
    #[serde(default)]
    pub initiative: Option<i32>,
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default)]
    pub equipment: Vec<String>,
    #[serde(default)]
    pub spells: Vec<String>,
    /// Player who acts for this participant; the encounter's creator otherwise
    #[serde(default)]
    pub user_id: Option<String>,
}

impl TryFrom<ParticipantRequestDto> for Participant {
    type Error = String;

    fn try_from(dto: ParticipantRequestDto) -> Result<Self, Self::Error> {
        let controller = dto
            .user_id
            .as_deref()
            .map(|id| {
                id.parse::<UserId>()
                    .map_err(|_| format!("Invalid user ID for participant '{}': {}", dto.id, id))
            })
            .transpose()?;
        let mut participant = Participant::new(dto.id, dto.name, dto.kind, dto.max_hp, dto.ac)
            .with_abilities(dto.abilities)
            .with_level(dto.level.unwrap_or(1))
            .with_equipment(dto.equipment)
            .with_spells(dto.spells);
        if let Some(hp) = dto.hp {
            participant = participant.with_hit_points(hp);
        }
        if let Some(speed) = dto.speed {
            participant = participant.with_speed(speed);
        }
        if let Some(initiative) = dto.initiative {
            participant = participant.with_initiative(initiative);
        }
        if let Some(position) = dto.position {
            participant = participant.with_position(position);
        }
        if let Some(controller) = controller {
            participant = participant.with_controller(controller);
        }
        Ok(participant)
    }
}

#[derive(Debug, Deserialize)]
pub struct BattlefieldRequestDto {
    #[serde(default = "default_side")]
    pub width: u32,
    #[serde(default = "default_side")]
    pub height: u32,
    /// Terrain/object overrides applied on top of the environment preset
    #[serde(default)]
    pub cells: Vec<CellOverride>,
}

fn default_side() -> u32 {
    10
}

#[derive(Debug, Deserialize)]
pub struct ActionRequestDto {
    pub action_type: ActionType,
    pub actor_id: String,
    #[serde(default)]
    pub target_ids: Vec<String>,
    #[serde(default)]
    pub params: ActionParamsDto,
}

#[derive(Debug, Default, Deserialize)]
pub struct ActionParamsDto {
    #[serde(default)]
    pub weapon: Option<String>,
    #[serde(default)]
    pub spell: Option<String>,
    #[serde(default)]
    pub destination: Option<Position>,
    /// Cells to walk through in order, excluding the starting cell. The last
    /// one is where the actor ends up.
    #[serde(default)]
    pub movement_path: Vec<Position>,
}

impl ActionRequestDto {
    pub fn into_request(self) -> Result<ActionRequest, String> {
        let targets: Vec<ParticipantId> =
            self.target_ids.into_iter().map(ParticipantId::from).collect();
        let action = match self.action_type {
            ActionType::Attack => CombatAction::Attack {
                targets,
                weapon: self.params.weapon,
            },
            ActionType::CastSpell => CombatAction::CastSpell {
                spell: self
                    .params
                    .spell
                    .ok_or_else(|| "params.spell is required to cast a spell".to_string())?,
                targets,
            },
            ActionType::Move => {
                let path = self.params.movement_path;
                let destination = match (self.params.destination, path.last()) {
                    (Some(destination), Some(last)) if destination != *last => {
                        return Err(
                            "params.destination must be the last cell of params.movement_path"
                                .to_string(),
                        )
                    }
                    (Some(destination), _) => destination,
                    (None, Some(last)) => *last,
                    (None, None) => {
                        return Err(
                            "params.destination or params.movement_path is required to move"
                                .to_string(),
                        )
                    }
                };
                CombatAction::Move { destination, path }
            }
            ActionType::EndTurn => CombatAction::EndTurn,
        };
        Ok(ActionRequest::new(self.actor_id, action))
    }
}

#[derive(Debug, Deserialize)]
pub struct EndTurnRequestDto {
    pub actor_id: String,
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ParticipantResponseDto {
    pub id: ParticipantId,
    #[serde(rename = "type")]
    pub kind: ParticipantKind,
    pub name: String,
    pub initiative: Option<i32>,
    pub hp: u32,
    pub max_hp: u32,
    pub ac: u32,
    pub level: u32,
    pub speed: Option<u32>,
    pub position: Option<Position>,
    pub abilities: AbilityScores,
    pub status_effects: Vec<StatusEffect>,
    pub equipment: Vec<String>,
    pub spells: Vec<String>,
    pub character_id: Option<String>,
    pub controller_id: Option<String>,
    pub incapacitated: bool,
}

impl From<&Participant> for ParticipantResponseDto {
    fn from(p: &Participant) -> Self {
        Self {
            id: p.id.clone(),
            kind: p.kind,
            name: p.name.clone(),
            initiative: p.initiative,
            hp: p.hit_points,
            max_hp: p.max_hit_points,
            ac: p.armor_class,
            level: p.level,
            speed: p.speed_feet,
            position: p.position,
            abilities: p.abilities,
            status_effects: p.status_effects.clone(),
            equipment: p.equipment.clone(),
            spells: p.spells.clone(),
            character_id: p.character_id.map(|id| id.to_string()),
            controller_id: p.controller.map(|id| id.to_string()),
            incapacitated: p.is_incapacitated(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BattlefieldResponseDto {
    pub width: u32,
    pub height: u32,
    /// Indexed `[x][y]`
    pub terrain: Vec<Vec<Terrain>>,
    /// Indexed `[x][y]`
    pub objects: Vec<Vec<GridObject>>,
}

/// Full encounter snapshot
#[derive(Debug, Serialize)]
pub struct CombatResponseDto {
    pub id: String,
    /// Participant ids in turn order
    pub initiative: Vec<ParticipantId>,
    pub initiative_scores: Vec<InitiativeEntry>,
    pub participants: Vec<ParticipantResponseDto>,
    pub current_turn_index: usize,
    pub current_turn: ParticipantId,
    pub round_number: u32,
    pub movement_used: u32,
    pub status: EncounterStatus,
    pub outcome: Option<EncounterOutcome>,
    pub environment: String,
    pub battlefield: BattlefieldResponseDto,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Encounter> for CombatResponseDto {
    fn from(encounter: &Encounter) -> Self {
        let battlefield = encounter.battlefield();
        Self {
            id: encounter.id.to_string(),
            initiative: encounter
                .initiative()
                .iter()
                .map(|e| e.participant_id.clone())
                .collect(),
            initiative_scores: encounter.initiative().to_vec(),
            participants: encounter
                .participants()
                .iter()
                .map(ParticipantResponseDto::from)
                .collect(),
            current_turn_index: encounter.current_turn_index(),
            current_turn: encounter.current_participant_id().clone(),
            round_number: encounter.round_number(),
            movement_used: encounter.movement_used(),
            status: encounter.status(),
            outcome: encounter.outcome(),
            environment: encounter.environment.clone(),
            battlefield: BattlefieldResponseDto {
                width: battlefield.width(),
                height: battlefield.height(),
                terrain: battlefield.terrain_grid(),
                objects: battlefield.object_grid(),
            },
            created_by: encounter.created_by.map(|id| id.to_string()),
            created_at: encounter.created_at,
            updated_at: encounter.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ActionResultDto {
    pub action_type: ActionType,
    pub actor_id: ParticipantId,
    pub success: bool,
    /// Total damage dealt
    pub damage: u32,
    pub healing: u32,
    /// Status effects applied
    pub effects: Vec<String>,
    pub description: String,
    pub targets: Vec<TargetEffect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movement: Option<Movement>,
    pub turn_ended: bool,
    pub encounter_completed: bool,
    /// The result was replayed for a repeated Idempotency-Key
    pub replayed: bool,
}

impl ActionResultDto {
    pub fn new(result: ActionResult, replayed: bool) -> Self {
        Self {
            action_type: result.action_type,
            actor_id: result.actor_id,
            success: result.success,
            damage: result.effects.damage_dealt,
            healing: result.effects.healing_done,
            effects: result.effects.statuses_applied,
            description: result.description,
            targets: result.effects.targets,
            movement: result.effects.movement,
            turn_ended: result.turn_ended,
            encounter_completed: result.encounter_completed,
            replayed,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ActionResponseDto {
    pub action_result: ActionResultDto,
    pub combat: CombatResponseDto,
}

impl From<ActionResponse> for ActionResponseDto {
    fn from(response: ActionResponse) -> Self {
        Self {
            combat: CombatResponseDto::from(&response.encounter),
            action_result: ActionResultDto::new(response.outcome.result, response.outcome.replayed),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ActionLogResponseDto {
    pub entries: Vec<ActionLogEntry>,
}
