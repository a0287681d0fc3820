use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::application::ports::outbound::CharacterRepositoryPort;
use crate::domain::entities::Character;
use crate::domain::value_objects::{AbilityScores, CharacterId, UserId};

/// Characters in SQLite; equipment and spell lists are stored as JSON text
pub struct SqliteCharacterRepository {
    pool: SqlitePool,
}

impl SqliteCharacterRepository {
    pub async fn new(pool: SqlitePool) -> Result<Self, sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS characters (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                race TEXT NOT NULL,
                class TEXT NOT NULL,
                level INTEGER NOT NULL,
                strength INTEGER NOT NULL,
                dexterity INTEGER NOT NULL,
                constitution INTEGER NOT NULL,
                intelligence INTEGER NOT NULL,
                wisdom INTEGER NOT NULL,
                charisma INTEGER NOT NULL,
                hit_points INTEGER NOT NULL,
                max_hit_points INTEGER NOT NULL,
                armor_class INTEGER NOT NULL,
                speed INTEGER NOT NULL,
                equipment TEXT NOT NULL,
                spells TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL
            )
        "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_characters_user_id ON characters (user_id)")
            .execute(&pool)
            .await?;

        Ok(Self { pool })
    }
}

fn row_to_character(row: &SqliteRow) -> Result<Character> {
    let id: String = row.try_get("id")?;
    let user_id: String = row.try_get("user_id")?;
    let equipment: String = row.try_get("equipment")?;
    let spells: String = row.try_get("spells")?;

    Ok(Character {
        id: id
            .parse::<CharacterId>()
            .with_context(|| format!("Stored character id '{}' is not a UUID", id))?,
        owner_id: user_id
            .parse::<UserId>()
            .with_context(|| format!("Stored owner id '{}' is not a UUID", user_id))?,
        name: row.try_get("name")?,
        race: row.try_get("race")?,
        class: row.try_get("class")?,
        level: row.try_get("level")?,
        abilities: AbilityScores {
            strength: row.try_get("strength")?,
            dexterity: row.try_get("dexterity")?,
            constitution: row.try_get("constitution")?,
            intelligence: row.try_get("intelligence")?,
            wisdom: row.try_get("wisdom")?,
            charisma: row.try_get("charisma")?,
        },
        hit_points: row.try_get("hit_points")?,
        max_hit_points: row.try_get("max_hit_points")?,
        armor_class: row.try_get("armor_class")?,
        speed_feet: row.try_get("speed")?,
        equipment: serde_json::from_str(&equipment).context("Invalid equipment JSON")?,
        spells: serde_json::from_str(&spells).context("Invalid spells JSON")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl CharacterRepositoryPort for SqliteCharacterRepository {
    async fn create(&self, character: &Character) -> Result<()> {
        let a = &character.abilities;
        sqlx::query(
            r#"
            INSERT INTO characters (
                id, user_id, name, race, class, level,
                strength, dexterity, constitution, intelligence, wisdom, charisma,
                hit_points, max_hit_points, armor_class, speed,
                equipment, spells, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        )
        .bind(character.id.to_string())
        .bind(character.owner_id.to_string())
        .bind(&character.name)
        .bind(&character.race)
        .bind(&character.class)
        .bind(character.level)
        .bind(a.strength)
        .bind(a.dexterity)
        .bind(a.constitution)
        .bind(a.intelligence)
        .bind(a.wisdom)
        .bind(a.charisma)
        .bind(character.hit_points)
        .bind(character.max_hit_points)
        .bind(character.armor_class)
        .bind(character.speed_feet)
        .bind(serde_json::to_string(&character.equipment)?)
        .bind(serde_json::to_string(&character.spells)?)
        .bind(character.created_at)
        .bind(character.updated_at)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to insert character {}", character.id))?;
        Ok(())
    }

    async fn get(&self, id: CharacterId) -> Result<Option<Character>> {
        let row = sqlx::query("SELECT * FROM characters WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_character).transpose()
    }

    async fn list_by_owner(&self, owner_id: UserId) -> Result<Vec<Character>> {
        let rows = sqlx::query("SELECT * FROM characters WHERE user_id = ? ORDER BY created_at, id")
            .bind(owner_id.to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_character).collect()
    }
}
