//! Application configuration

use std::env;

use anyhow::{bail, Context, Result};
use chrono::Duration;
use config::{Config, Environment, File, FileFormat};

use crate::domain::aggregates::EncounterRetention;
use crate::domain::value_objects::CombatRules;

/// Combat rules shipped with the binary
const DEFAULT_COMBAT_RULES: &str = include_str!("../../config/combat_rules.toml");

/// Application configuration loaded from environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP server port
    pub server_port: u16,

    /// SQLite connection string for users and characters
    pub database_url: String,
    pub database_max_connections: u32,

    /// `development` relaxes the JWT secret requirement
    pub app_env: String,

    pub jwt_secret: String,
    pub token_ttl_hours: i64,

    pub request_timeout_secs: u64,

    /// Optional TOML file layered over the built-in combat rules
    pub combat_rules_path: Option<String>,
    /// Fixed seed for reproducible dice
    pub dice_seed: Option<u64>,

    /// Encounters are forgotten this long after completing
    pub encounter_completed_ttl_secs: u64,
    /// ...or this long after their last action while still active
    pub encounter_idle_ttl_secs: u64,
    pub encounter_sweep_interval_secs: u64,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ if app_env == "development" => "development-secret-change-me".to_string(),
            _ => bail!("JWT_SECRET environment variable is required outside development"),
        };

        Ok(Self {
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("SERVER_PORT must be a valid port number")?,

            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:dnd_combat.db?mode=rwc".to_string()),
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?,

            app_env,
            jwt_secret,
            token_ttl_hours: env::var("TOKEN_TTL_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .context("TOKEN_TTL_HOURS must be an integer")?,

            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("REQUEST_TIMEOUT_SECS must be an integer")?,

            combat_rules_path: env::var("COMBAT_RULES_PATH").ok().filter(|p| !p.is_empty()),
            dice_seed: env::var("DICE_SEED")
                .ok()
                .map(|s| s.parse().context("DICE_SEED must be an unsigned integer"))
                .transpose()?,

            encounter_completed_ttl_secs: env::var("ENCOUNTER_COMPLETED_TTL_SECS")
                .unwrap_or_else(|_| "600".to_string())
                .parse()
                .context("ENCOUNTER_COMPLETED_TTL_SECS must be an integer")?,
            encounter_idle_ttl_secs: env::var("ENCOUNTER_IDLE_TTL_SECS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .context("ENCOUNTER_IDLE_TTL_SECS must be an integer")?,
            encounter_sweep_interval_secs: env::var("ENCOUNTER_SWEEP_INTERVAL_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .context("ENCOUNTER_SWEEP_INTERVAL_SECS must be an integer")?,
        })
    }

    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }

    pub fn encounter_retention(&self) -> EncounterRetention {
        let seconds = |secs: u64| {
            Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX).min(i64::MAX / 1000))
        };
        EncounterRetention {
            completed: seconds(self.encounter_completed_ttl_secs),
            idle: seconds(self.encounter_idle_ttl_secs),
        }
    }

    /// Built-in rules, then the optional rules file, then `COMBAT_RULES_*`
    /// environment overrides such as `COMBAT_RULES_TURN_POLICY=major_actions`.
    /// Nested keys use `__`, e.g. `COMBAT_RULES_WEAPONS__DAGGER__RANGE_FEET`
    pub fn load_combat_rules(&self) -> Result<CombatRules> {
        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_COMBAT_RULES, FileFormat::Toml));
        if let Some(path) = &self.combat_rules_path {
            builder = builder.add_source(File::with_name(path).required(false));
        }
        let rules: CombatRules = builder
            .add_source(
                Environment::with_prefix("COMBAT_RULES")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to assemble combat rules")?
            .try_deserialize()
            .context("Combat rules are malformed")?;

        if let Err(message) = rules.validate() {
            bail!("Invalid combat rules: {}", message);
        }
        Ok(rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::TurnPolicy;

    fn config() -> AppConfig {
        AppConfig {
            server_port: 3000,
            database_url: "sqlite::memory:".to_string(),
            database_max_connections: 1,
            app_env: "development".to_string(),
            jwt_secret: "secret".to_string(),
            token_ttl_hours: 24,
            request_timeout_secs: 10,
            combat_rules_path: None,
            dice_seed: None,
            encounter_completed_ttl_secs: 600,
            encounter_idle_ttl_secs: 3600,
            encounter_sweep_interval_secs: 60,
        }
    }

    #[test]
    fn test_default_combat_rules_load_and_validate() {
        let rules = config().load_combat_rules().unwrap();
        assert_eq!(rules.turn_policy, TurnPolicy::EveryAction);
        assert_eq!(rules.feet_per_square, 5);
        assert_eq!(rules.critical_hit_roll, 20);
        assert!(rules.weapon(None).is_ok());
        assert!(rules.weapon(Some("longbow")).unwrap().1.ranged);
        assert!(rules.spell("magic-missile").unwrap().auto_hit);
        assert!(rules.spell("cure-wounds").unwrap().is_healing());
        assert!(rules.condition("stunned").unwrap().prevents_actions);
    }

    #[test]
    fn test_encounter_retention_from_seconds() {
        let retention = config().encounter_retention();
        assert_eq!(retention.completed, Duration::minutes(10));
        assert_eq!(retention.idle, Duration::hours(1));
    }

    #[test]
    fn test_missing_rules_file_falls_back_to_defaults() {
        let mut config = config();
        config.combat_rules_path = Some("/nonexistent/combat_rules".to_string());
        assert!(config.load_combat_rules().is_ok());
    }
}
