//! HTTP REST API routes

mod auth;
mod auth_routes;
mod character_routes;
mod combat_routes;
mod error;
mod game_routes;
mod status_routes;

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use crate::infrastructure::state::AppState;
use crate::infrastructure::websocket;

pub use error::ApiError;

/// Create all API routes
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Status routes
        .route("/health", get(status_routes::health_check))
        .route("/api/status", get(status_routes::api_status))
        // Auth routes
        .route("/api/v1/auth/register", post(auth_routes::register))
        .route("/api/v1/auth/login", post(auth_routes::login))
        // Character routes
        .route(
            "/api/v1/characters",
            get(character_routes::list_characters).post(character_routes::create_character),
        )
        .route("/api/v1/characters/{id}", get(character_routes::get_character))
        // Game routes
        .route(
            "/api/v1/games",
            get(game_routes::list_games).post(game_routes::create_game),
        )
        .route(
            "/api/v1/games/{id}",
            get(game_routes::get_game).put(game_routes::update_game),
        )
        // Combat routes
        .route("/api/v1/combat", post(combat_routes::start_combat))
        .route("/api/v1/combat/{id}", get(combat_routes::get_combat))
        .route(
            "/api/v1/combat/{id}/action",
            post(combat_routes::perform_action),
        )
        .route("/api/v1/combat/{id}/end-turn", post(combat_routes::end_turn))
        .route("/api/v1/combat/{id}/log", get(combat_routes::get_action_log))
        // Live combat events
        .route("/api/v1/ws/combat/{id}", get(websocket::ws_combat))
}
