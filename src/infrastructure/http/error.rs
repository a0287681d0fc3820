//! HTTP error responses
//!
//! Every failure leaves the API as `{"error": {"kind": ..., "message": ...}}`.

use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::application::services::{AuthError, CharacterError, CombatServiceError, GameError};
use crate::domain::errors::CombatError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub kind: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "validation_error", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "forbidden", message)
    }

    /// Log the cause and hide it from the caller
    fn internal(error: anyhow::Error) -> Self {
        tracing::error!(error = ?error, "Internal error");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "An internal error occurred",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": {
                "kind": self.kind,
                "message": self.message,
            }
        });
        (self.status, Json(body)).into_response()
    }
}

impl From<CombatError> for ApiError {
    fn from(error: CombatError) -> Self {
        let kind = error.kind();
        let status = match kind {
            "not_found" => StatusCode::NOT_FOUND,
            "not_your_turn" => StatusCode::FORBIDDEN,
            "encounter_completed" | "actor_incapacitated" | "actor_restrained" => {
                StatusCode::CONFLICT
            }
            _ => StatusCode::BAD_REQUEST,
        };
        Self::new(status, kind, error.to_string())
    }
}

impl From<CharacterError> for ApiError {
    fn from(error: CharacterError) -> Self {
        match error {
            CharacterError::Validation(message) => Self::validation(message),
            CharacterError::NotFound(_) => Self::not_found(error.to_string()),
            CharacterError::Internal(e) => Self::internal(e),
        }
    }
}

impl From<CombatServiceError> for ApiError {
    fn from(error: CombatServiceError) -> Self {
        match error {
            CombatServiceError::Combat(e) => e.into(),
            CombatServiceError::Character(e) => e.into(),
            CombatServiceError::NotFound(_) => Self::not_found(error.to_string()),
            CombatServiceError::Forbidden(message) => Self::forbidden(message),
        }
    }
}

impl From<GameError> for ApiError {
    fn from(error: GameError) -> Self {
        match error {
            GameError::Validation(message) => Self::validation(message),
            GameError::NotFound(_) => Self::not_found(error.to_string()),
            GameError::Forbidden(message) => Self::forbidden(message),
            GameError::Internal(e) => Self::internal(e),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::Validation(message) => Self::validation(message),
            AuthError::UsernameTaken(_) => {
                Self::new(StatusCode::CONFLICT, "conflict", error.to_string())
            }
            AuthError::InvalidCredentials | AuthError::InvalidToken => {
                Self::unauthorized(error.to_string())
            }
            AuthError::Internal(e) => Self::internal(e),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

/// `Json` whose rejections are reported as validation errors
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
