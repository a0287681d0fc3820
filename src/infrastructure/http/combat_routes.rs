//! Combat API routes

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;

use crate::application::dto::{
    ActionLogResponseDto, ActionRequestDto, ActionResponseDto, CombatResponseDto,
    EndTurnRequestDto, StartCombatRequestDto,
};
use crate::domain::value_objects::{EncounterId, ParticipantId};
use crate::infrastructure::http::auth::AuthUser;
use crate::infrastructure::http::error::{ApiError, ApiJson};
use crate::infrastructure::state::AppState;

const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";
const MAX_IDEMPOTENCY_KEY_LEN: usize = 255;

fn parse_encounter_id(id: &str) -> Result<EncounterId, ApiError> {
    id.parse()
        .map_err(|_| ApiError::validation("Invalid combat ID"))
}

fn idempotency_key(headers: &HeaderMap) -> Result<Option<String>, ApiError> {
    let Some(value) = headers.get(IDEMPOTENCY_KEY_HEADER) else {
        return Ok(None);
    };
    let key = value
        .to_str()
        .map_err(|_| ApiError::validation("Idempotency-Key must be visible ASCII"))?
        .trim();
    if key.is_empty() || key.len() > MAX_IDEMPOTENCY_KEY_LEN {
        return Err(ApiError::validation(format!(
            "Idempotency-Key must be 1 to {} characters",
            MAX_IDEMPOTENCY_KEY_LEN
        )));
    }
    Ok(Some(key.to_string()))
}

/// Start a new encounter
pub async fn start_combat(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    ApiJson(req): ApiJson<StartCombatRequestDto>,
) -> Result<(StatusCode, Json<CombatResponseDto>), ApiError> {
    let request = req.into_request().map_err(ApiError::validation)?;
    let encounter = state
        .combat_service
        .start_combat(claims.sub, request)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CombatResponseDto::from(&encounter)),
    ))
}

/// Get the current state of an encounter
pub async fn get_combat(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<CombatResponseDto>, ApiError> {
    let encounter = state
        .combat_service
        .get_combat(parse_encounter_id(&id)?, claims.sub)
        .await?;
    Ok(Json(CombatResponseDto::from(&encounter)))
}

/// Resolve one action by the participant whose turn it is
pub async fn perform_action(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<ActionRequestDto>,
) -> Result<Json<ActionResponseDto>, ApiError> {
    let id = parse_encounter_id(&id)?;
    let key = idempotency_key(&headers)?;
    let request = req.into_request().map_err(ApiError::validation)?;

    let response = state
        .combat_service
        .perform_action(id, claims.sub, request, key)
        .await?;
    Ok(Json(ActionResponseDto::from(response)))
}

/// End the current participant's turn without acting
pub async fn end_turn(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<EndTurnRequestDto>,
) -> Result<Json<ActionResponseDto>, ApiError> {
    let id = parse_encounter_id(&id)?;
    if req.actor_id.trim().is_empty() {
        return Err(ApiError::validation("actor_id is required"));
    }

    let response = state
        .combat_service
        .end_turn(id, claims.sub, ParticipantId::from(req.actor_id))
        .await?;
    Ok(Json(ActionResponseDto::from(response)))
}

/// Every action resolved in the encounter so far
pub async fn get_action_log(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ActionLogResponseDto>, ApiError> {
    let entries = state
        .combat_service
        .action_log(parse_encounter_id(&id)?, claims.sub)
        .await?;
    Ok(Json(ActionLogResponseDto { entries }))
}
