//! Shared application state

use std::sync::Arc;

use anyhow::Result;
use sqlx::SqlitePool;

use crate::application::services::{
    AuthService, AuthServiceImpl, CharacterService, CharacterServiceImpl, CombatService,
    CombatServiceImpl, DiceFactory, GameService, GameServiceImpl,
};
use crate::domain::services::{ActionResolver, DiceRoller, SeededDice};
use crate::domain::value_objects::CombatRules;
use crate::infrastructure::combat_events::CombatEventHub;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::persistence::{
    InMemoryEncounterRepository, SqliteCharacterRepository, SqliteGameRepository,
    SqliteUserRepository,
};

/// Shared application state
pub struct AppState {
    pub config: AppConfig,
    pub auth_service: Arc<dyn AuthService>,
    pub character_service: Arc<dyn CharacterService>,
    pub combat_service: Arc<dyn CombatService>,
    pub game_service: Arc<dyn GameService>,
    /// Live combat events for WebSocket subscribers
    pub events: Arc<CombatEventHub>,
}

impl AppState {
    pub async fn new(config: AppConfig, pool: SqlitePool) -> Result<Self> {
        let rules = config.load_combat_rules()?;
        let dice: DiceFactory = match config.dice_seed {
            Some(seed) => {
                tracing::warn!(seed, "Dice are seeded; every encounter rolls the same sequence");
                Arc::new(move || Box::new(SeededDice::from_seed(seed)) as Box<dyn DiceRoller>)
            }
            None => Arc::new(|| Box::new(SeededDice::from_entropy()) as Box<dyn DiceRoller>),
        };
        Self::with_dice(config, pool, rules, dice).await
    }

    /// Wire every service against the given pool, rules and dice
    pub async fn with_dice(
        config: AppConfig,
        pool: SqlitePool,
        rules: CombatRules,
        dice: DiceFactory,
    ) -> Result<Self> {
        let users = Arc::new(SqliteUserRepository::new(pool.clone()).await?);
        let characters = Arc::new(SqliteCharacterRepository::new(pool.clone()).await?);
        let games = Arc::new(SqliteGameRepository::new(pool).await?);
        let encounters = Arc::new(InMemoryEncounterRepository::new());
        let events = Arc::new(CombatEventHub::new());

        let auth_service: Arc<dyn AuthService> = Arc::new(AuthServiceImpl::new(
            users,
            config.jwt_secret.clone(),
            chrono::Duration::hours(config.token_ttl_hours),
        ));
        let character_service: Arc<dyn CharacterService> =
            Arc::new(CharacterServiceImpl::new(characters));
        let combat_service: Arc<dyn CombatService> = Arc::new(CombatServiceImpl::new(
            encounters,
            character_service.clone(),
            events.clone(),
            ActionResolver::new(Arc::new(rules)),
            dice,
        ));

        let game_service: Arc<dyn GameService> = Arc::new(GameServiceImpl::new(games));

        Ok(Self {
            config,
            auth_service,
            character_service,
            combat_service,
            game_service,
            events,
        })
    }
}
