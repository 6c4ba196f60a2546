//! Error taxonomy: engine rejections bubble up through the service layer and
//! are rendered as JSON HTTP responses carrying the specific rejection kind,
//! so a rejected command is always reported back to its issuer while other
//! clients' views stay untouched.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::engine::EngineError;

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No competition has been loaded into the engine yet.
    #[error("no competition is loaded")]
    NoCompetition,
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Operation cannot be performed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// A round machine rejected the command; state is unchanged.
    #[error(transparent)]
    Rejected(#[from] EngineError),
}

impl ServiceError {
    /// Stable machine-readable label for the rejection kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::NoCompetition => "no_competition",
            ServiceError::Unauthorized(_) => "unauthorized",
            ServiceError::InvalidInput(_) => "validation_failed",
            ServiceError::InvalidState(_) => "invalid_state",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Rejected(engine) => match engine {
                EngineError::InvalidTransition { .. } => "invalid_transition",
                EngineError::WindowClosed(_) => "window_closed",
                EngineError::DuplicatePress(_) => "duplicate_press",
                EngineError::DuplicateAnswer(_) => "duplicate_answer",
                EngineError::AlreadyJudged(_) => "already_judged",
                EngineError::ValidationFailed(_) => "validation_failed",
                EngineError::NotFound(_) => "not_found",
            },
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest {
            kind: "validation_failed",
            message: format!("validation failed: {err}"),
        }
    }
}

/// Application-level errors rendered as HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {message}")]
    BadRequest {
        /// Rejection kind label.
        kind: &'static str,
        /// Human-readable description.
        message: String,
    },
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Requested resource not found.
    #[error("not found: {message}")]
    NotFound {
        /// Rejection kind label.
        kind: &'static str,
        /// Human-readable description.
        message: String,
    },
    /// Conflict with the current state; nothing was applied.
    #[error("conflict: {message}")]
    Conflict {
        /// Rejection kind label.
        kind: &'static str,
        /// Human-readable description.
        message: String,
    },
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let kind = err.kind();
        let message = err.to_string();
        match &err {
            ServiceError::Unauthorized(_) => AppError::Unauthorized(message),
            ServiceError::InvalidInput(_) => AppError::BadRequest { kind, message },
            ServiceError::NotFound(_) | ServiceError::NoCompetition => {
                AppError::NotFound { kind, message }
            }
            ServiceError::InvalidState(_) => AppError::Conflict { kind, message },
            ServiceError::Rejected(engine) => match engine {
                EngineError::ValidationFailed(_) => AppError::BadRequest { kind, message },
                EngineError::NotFound(_) => AppError::NotFound { kind, message },
                // Timing and phase rejections conflict with the current
                // authoritative state rather than with the payload shape.
                _ => AppError::Conflict { kind, message },
            },
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    kind: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, kind) = match &self {
            AppError::BadRequest { kind, .. } => (StatusCode::BAD_REQUEST, *kind),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::NotFound { kind, .. } => (StatusCode::NOT_FOUND, *kind),
            AppError::Conflict { kind, .. } => (StatusCode::CONFLICT, *kind),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };

        let payload = Json(ErrorBody {
            kind: kind.to_string(),
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_rejections_keep_their_kind() {
        let err: ServiceError = EngineError::DuplicatePress(3).into();
        assert_eq!(err.kind(), "duplicate_press");

        let app: AppError = err.into();
        assert!(matches!(app, AppError::Conflict { kind: "duplicate_press", .. }));
    }

    #[test]
    fn validation_failures_map_to_bad_request() {
        let err: ServiceError = EngineError::ValidationFailed("tile spent".into()).into();
        let app: AppError = err.into();
        assert!(matches!(app, AppError::BadRequest { kind: "validation_failed", .. }));
    }
}
