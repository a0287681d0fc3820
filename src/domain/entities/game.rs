//! Game entity - a campaign run by one dungeon master for a set of players

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{GameId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Active,
    Paused,
    Completed,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
        }
    }
}

impl std::str::FromStr for GameStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "completed" => Ok(Self::Completed),
            other => Err(format!("Unknown game status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    pub id: GameId,
    pub name: String,
    pub description: String,
    pub dm_user_id: UserId,
    pub player_ids: Vec<UserId>,
    pub status: GameStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Game {
    pub fn new(dm_user_id: UserId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: GameId::new(),
            name: name.into(),
            description: String::new(),
            dm_user_id,
            player_ids: Vec::new(),
            status: GameStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Players, without duplicates and without the DM
    pub fn with_players(mut self, player_ids: Vec<UserId>) -> Self {
        self.set_players(player_ids);
        self
    }

    pub fn set_players(&mut self, player_ids: Vec<UserId>) {
        let mut players: Vec<UserId> = Vec::with_capacity(player_ids.len());
        for id in player_ids {
            if id != self.dm_user_id && !players.contains(&id) {
                players.push(id);
            }
        }
        self.player_ids = players;
    }

    pub fn is_dm(&self, user_id: UserId) -> bool {
        self.dm_user_id == user_id
    }

    /// The DM and the players may see the game
    pub fn can_view(&self, user_id: UserId) -> bool {
        self.is_dm(user_id) || self.player_ids.contains(&user_id)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Game name cannot be empty".to_string());
        }
        if self.name.len() > 255 {
            return Err("Game name cannot exceed 255 characters".to_string());
        }
        Ok(())
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
