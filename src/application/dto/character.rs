use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::services::CreateCharacterRequest;
use crate::domain::entities::Character;
use crate::domain::value_objects::AbilityScores;

/// Character sheet as submitted, with flat ability fields
#[derive(Debug, Deserialize)]
pub struct CreateCharacterRequestDto {
    pub name: String,
    pub race: String,
    pub class: String,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default = "default_score")]
    pub strength: i32,
    #[serde(default = "default_score")]
    pub dexterity: i32,
    #[serde(default = "default_score")]
    pub constitution: i32,
    #[serde(default = "default_score")]
    pub intelligence: i32,
    #[serde(default = "default_score")]
    pub wisdom: i32,
    #[serde(default = "default_score")]
    pub charisma: i32,
    #[serde(default)]
    pub hit_points: Option<u32>,
    #[serde(default)]
    pub max_hit_points: Option<u32>,
    #[serde(default = "default_armor_class")]
    pub armor_class: u32,
    #[serde(default = "default_speed")]
    pub speed: u32,
    #[serde(default)]
    pub equipment: Vec<String>,
    #[serde(default)]
    pub spells: Vec<String>,
}

fn default_level() -> u32 {
    1
}

fn default_score() -> i32 {
    10
}

fn default_armor_class() -> u32 {
    10
}

fn default_speed() -> u32 {
    30
}

impl From<CreateCharacterRequestDto> for CreateCharacterRequest {
    fn from(dto: CreateCharacterRequestDto) -> Self {
        // Either hit point field alone sets both
        let max_hit_points = dto.max_hit_points.or(dto.hit_points).unwrap_or(10);
        Self {
            name: dto.name,
            race: dto.race,
            class: dto.class,
            level: dto.level,
            abilities: AbilityScores {
                strength: dto.strength,
                dexterity: dto.dexterity,
                constitution: dto.constitution,
                intelligence: dto.intelligence,
                wisdom: dto.wisdom,
                charisma: dto.charisma,
            },
            hit_points: dto.hit_points,
            max_hit_points,
            armor_class: dto.armor_class,
            speed_feet: dto.speed,
            equipment: dto.equipment,
            spells: dto.spells,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CharacterResponseDto {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub race: String,
    pub class: String,
    pub level: u32,
    pub strength: i32,
    pub dexterity: i32,
    pub constitution: i32,
    pub intelligence: i32,
    pub wisdom: i32,
    pub charisma: i32,
    pub hit_points: u32,
    pub max_hit_points: u32,
    pub armor_class: u32,
    pub speed: u32,
    pub equipment: Vec<String>,
    pub spells: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Character> for CharacterResponseDto {
    fn from(c: Character) -> Self {
        Self {
            id: c.id.to_string(),
            user_id: c.owner_id.to_string(),
            name: c.name,
            race: c.race,
            class: c.class,
            level: c.level,
            strength: c.abilities.strength,
            dexterity: c.abilities.dexterity,
            constitution: c.abilities.constitution,
            intelligence: c.abilities.intelligence,
            wisdom: c.abilities.wisdom,
            charisma: c.abilities.charisma,
            hit_points: c.hit_points,
            max_hit_points: c.max_hit_points,
            armor_class: c.armor_class,
            speed: c.speed_feet,
            equipment: c.equipment,
            spells: c.spells,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CharacterListResponseDto {
    pub characters: Vec<CharacterResponseDto>,
}
