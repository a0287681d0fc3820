//! WebSocket streaming of combat events
//!
//! A subscriber first receives a `snapshot` of the encounter, then every
//! event published for that encounter until either side goes away. A
//! completed encounter publishes nothing more, so its stream closes right
//! after the snapshot.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, Query, State, WebSocketUpgrade,
    },
    http::HeaderMap,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;

use crate::application::dto::CombatResponseDto;
use crate::domain::events::CombatEvent;
use crate::domain::entities::{Encounter, EncounterStatus};
use crate::domain::value_objects::{EncounterId, UserId};
use crate::infrastructure::http::ApiError;
use crate::infrastructure::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WsParams {
    /// Browsers cannot set headers on a WebSocket handshake
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum SnapshotMessage {
    Snapshot { combat: CombatResponseDto },
}

/// Upgrade to a WebSocket subscribed to one encounter
pub async fn ws_combat(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<WsParams>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = params
        .token
        .or_else(|| {
            headers
                .get("Authorization")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(str::to_string)
        })
        .ok_or_else(|| ApiError::unauthorized("Missing token"))?;
    let claims = state.auth_service.verify_token(&token)?;

    let id: EncounterId = id
        .parse()
        .map_err(|_| ApiError::validation("Invalid combat ID"))?;
    // Fail the handshake for unknown encounters and outsiders
    state.combat_service.get_combat(id, claims.sub).await?;

    tracing::debug!(encounter_id = %id, user_id = %claims.sub, "Combat subscriber connected");
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, id, claims.sub)))
}

async fn handle_socket(
    mut socket: WebSocket,
    state: Arc<AppState>,
    id: EncounterId,
    user_id: UserId,
) {
    // Subscribe before taking the snapshot so nothing falls between them
    let mut rx = state.events.subscribe();

    let encounter = match state.combat_service.get_combat(id, user_id).await {
        Ok(encounter) => encounter,
        Err(e) => {
            tracing::warn!(encounter_id = %id, "Snapshot failed: {}", e);
            return;
        }
    };
    let (snapshot, more_to_come) = opening_snapshot(&encounter);
    if !send_json(&mut socket, &snapshot).await {
        return;
    }
    if !more_to_come {
        let _ = socket.send(Message::Close(None)).await;
        tracing::debug!(encounter_id = %id, "Encounter already completed; closing stream");
        return;
    }

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(event) => {
                        if event.encounter_id() != id {
                            continue;
                        }
                        let completed = matches!(event, CombatEvent::CombatCompleted { .. });
                        if !send_json(&mut socket, &event).await {
                            break;
                        }
                        if completed {
                            let _ = socket.send(Message::Close(None)).await;
                            break;
                        }
                    }
                    Err(RecvError::Closed) => break,
                    Err(RecvError::Lagged(n)) => {
                        tracing::warn!(encounter_id = %id, "Combat subscriber lagged, skipped {n} events");
                    }
                }
            }
            result = socket.recv() => {
                match result {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    // Clients only listen
                    _ => {}
                }
            }
        }
    }

    tracing::debug!(encounter_id = %id, "Combat subscriber disconnected");
}

/// First message for a subscriber, and whether any event can still follow it
fn opening_snapshot(encounter: &Encounter) -> (SnapshotMessage, bool) {
    let snapshot = SnapshotMessage::Snapshot {
        combat: CombatResponseDto::from(encounter),
    };
    (snapshot, encounter.status() != EncounterStatus::Completed)
}

/// Send a JSON text frame; false once the client is gone
async fn send_json<T: Serialize>(socket: &mut WebSocket, message: &T) -> bool {
    let text = match serde_json::to_string(message) {
        Ok(text) => text,
        Err(e) => {
            tracing::error!("Failed to serialize WebSocket message: {}", e);
            return false;
        }
    };
    socket.send(Message::Text(text.into())).await.is_ok()
}
