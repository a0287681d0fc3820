//! D&D Combat Engine - Backend API for turn-based tabletop combat
//!
//! The Engine is the backend server that:
//! - Registers users and stores their characters in SQLite
//! - Runs encounters on a grid battlefield, one action at a time
//! - Streams combat events to WebSocket subscribers

mod application;
mod domain;
mod infrastructure;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::sqlite::SqlitePoolOptions;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::infrastructure::config::AppConfig;
use crate::infrastructure::http;
use crate::infrastructure::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dnd_combat_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting D&D Combat Engine");

    // Load configuration
    let config = AppConfig::from_env()?;
    tracing::info!("Configuration loaded");
    tracing::info!("  Environment: {}", config.app_env);
    tracing::info!("  Database: {}", config.database_url);
    if let Some(path) = &config.combat_rules_path {
        tracing::info!("  Combat rules: {}", path);
    }
    if config.is_development() {
        tracing::warn!("Running in development mode");
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;
    tracing::info!("Database connected");

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let request_timeout = Duration::from_secs(config.request_timeout_secs);

    // Initialize application state
    let state = Arc::new(AppState::new(config, pool).await?);
    tracing::info!("Application state initialized");

    // Cleanup worker (forgets completed and abandoned encounters)
    let cleanup_worker = {
        let service = state.combat_service.clone();
        let retention = state.config.encounter_retention();
        let every = Duration::from_secs(state.config.encounter_sweep_interval_secs.max(1));
        tokio::spawn(async move {
            tracing::info!("Starting encounter cleanup worker");
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                service.evict_stale(retention, chrono::Utc::now()).await;
            }
        })
    };

    // Build the router
    let app = http::create_routes()
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    let server = axum::serve(listener, app);

    // Wait for shutdown signal (Ctrl+C)
    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    cleanup_worker.abort();

    Ok(())
}
