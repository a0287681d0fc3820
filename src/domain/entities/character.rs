//! Character entity - a player character kept between encounters

use chrono::{DateTime, Utc};

use crate::domain::entities::participant::{MAX_ARMOR_CLASS, MAX_HIT_POINTS, MAX_LEVEL};
use crate::domain::entities::{Participant, ParticipantKind};
use crate::domain::value_objects::{AbilityScores, CharacterId, ParticipantId, UserId};

/// A stored player character owned by one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Character {
    pub id: CharacterId,
    pub owner_id: UserId,
    pub name: String,
    pub race: String,
    pub class: String,
    pub level: u32,
    pub abilities: AbilityScores,
    pub hit_points: u32,
    pub max_hit_points: u32,
    pub armor_class: u32,
    pub speed_feet: u32,
    pub equipment: Vec<String>,
    pub spells: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Character {
    pub fn new(
        owner_id: UserId,
        name: impl Into<String>,
        race: impl Into<String>,
        class: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: CharacterId::new(),
            owner_id,
            name: name.into(),
            race: race.into(),
            class: class.into(),
            level: 1,
            abilities: AbilityScores::default(),
            hit_points: 10,
            max_hit_points: 10,
            armor_class: 10,
            speed_feet: 30,
            equipment: Vec::new(),
            spells: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    pub fn with_abilities(mut self, abilities: AbilityScores) -> Self {
        self.abilities = abilities;
        self
    }

    pub fn with_hit_points(mut self, hit_points: u32, max_hit_points: u32) -> Self {
        self.hit_points = hit_points;
        self.max_hit_points = max_hit_points;
        self
    }

    pub fn with_armor_class(mut self, armor_class: u32) -> Self {
        self.armor_class = armor_class;
        self
    }

    pub fn with_speed(mut self, speed_feet: u32) -> Self {
        self.speed_feet = speed_feet;
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

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Character name cannot be empty".to_string());
        }
        if !(1..=MAX_LEVEL).contains(&self.level) {
            return Err(format!("Level must be between 1 and {}", MAX_LEVEL));
        }
        if !(1..=MAX_HIT_POINTS).contains(&self.max_hit_points) {
            return Err(format!("Max hit points must be between 1 and {}", MAX_HIT_POINTS));
        }
        if !(1..=MAX_ARMOR_CLASS).contains(&self.armor_class) {
            return Err(format!("Armor class must be between 1 and {}", MAX_ARMOR_CLASS));
        }
        if self.hit_points > self.max_hit_points {
            return Err("Hit points cannot exceed max hit points".to_string());
        }
        self.abilities.validate()
    }

    /// Combatant built from this character's current sheet, acting for its owner
    pub fn to_participant(&self, id: impl Into<ParticipantId>) -> Participant {
        Participant::new(
            id,
            self.name.clone(),
            ParticipantKind::Character,
            self.max_hit_points,
            self.armor_class,
        )
        .with_hit_points(self.hit_points)
        .with_abilities(self.abilities)
        .with_level(self.level)
        .with_speed(self.speed_feet)
        .with_equipment(self.equipment.clone())
        .with_spells(self.spells.clone())
        .with_character_id(self.id)
        .with_controller(self.owner_id)
    }
}
