use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::application::ports::outbound::GameRepositoryPort;
use crate::domain::entities::{Game, GameStatus};
use crate::domain::value_objects::{GameId, UserId};

/// Games in SQLite; the player list is stored as a JSON array of user ids
pub struct SqliteGameRepository {
    pool: SqlitePool,
}

impl SqliteGameRepository {
    pub async fn new(pool: SqlitePool) -> Result<Self, sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS games (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                dm_user_id TEXT NOT NULL,
                player_ids TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL
            )
        "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_games_dm_user_id ON games (dm_user_id)")
            .execute(&pool)
            .await?;

        Ok(Self { pool })
    }
}

fn row_to_game(row: &SqliteRow) -> Result<Game> {
    let id: String = row.try_get("id")?;
    let dm_user_id: String = row.try_get("dm_user_id")?;
    let player_ids: String = row.try_get("player_ids")?;
    let status: String = row.try_get("status")?;

    let player_ids: Vec<String> =
        serde_json::from_str(&player_ids).context("Invalid player_ids JSON")?;
    let player_ids = player_ids
        .iter()
        .map(|p| {
            p.parse::<UserId>()
                .with_context(|| format!("Stored player id '{}' is not a UUID", p))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Game {
        id: id
            .parse::<GameId>()
            .with_context(|| format!("Stored game id '{}' is not a UUID", id))?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        dm_user_id: dm_user_id
            .parse::<UserId>()
            .with_context(|| format!("Stored DM id '{}' is not a UUID", dm_user_id))?,
        player_ids,
        status: status
            .parse::<GameStatus>()
            .map_err(anyhow::Error::msg)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn player_ids_json(game: &Game) -> Result<String> {
    let ids: Vec<String> = game.player_ids.iter().map(UserId::to_string).collect();
    Ok(serde_json::to_string(&ids)?)
}

#[async_trait]
impl GameRepositoryPort for SqliteGameRepository {
    async fn create(&self, game: &Game) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO games (
                id, name, description, dm_user_id, player_ids, status, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        )
        .bind(game.id.to_string())
        .bind(&game.name)
        .bind(&game.description)
        .bind(game.dm_user_id.to_string())
        .bind(player_ids_json(game)?)
        .bind(game.status.as_str())
        .bind(game.created_at)
        .bind(game.updated_at)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to insert game {}", game.id))?;
        Ok(())
    }

    async fn get(&self, id: GameId) -> Result<Option<Game>> {
        let row = sqlx::query("SELECT * FROM games WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_game).transpose()
    }

    async fn update(&self, game: &Game) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE games
            SET name = ?, description = ?, player_ids = ?, status = ?, updated_at = ?
            WHERE id = ?
        "#,
        )
        .bind(&game.name)
        .bind(&game.description)
        .bind(player_ids_json(game)?)
        .bind(game.status.as_str())
        .bind(game.updated_at)
        .bind(game.id.to_string())
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to update game {}", game.id))?;
        Ok(())
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Game>> {
        let user_id = user_id.to_string();
        let rows = sqlx::query(
            r#"
            SELECT * FROM games
            WHERE dm_user_id = ?
               OR EXISTS (SELECT 1 FROM json_each(games.player_ids) WHERE json_each.value = ?)
            ORDER BY updated_at DESC, id
        "#,
        )
        .bind(&user_id)
        .bind(&user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_game).collect()
    }
}
