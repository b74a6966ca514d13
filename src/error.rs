use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;
use validator::ValidationErrors;

use crate::state::machine::InvalidTransition;

/// Errors that can occur in service layer operations.
///
/// All variants are recoverable at the caller and leave session state
/// unchanged; there are no fatal errors in the core.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Illegal state-machine move (e.g. starting an active session).
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    /// Answer submitted while the session is still waiting.
    #[error("session has not started yet")]
    SessionNotStarted,
    /// Event received after the session completed.
    #[error("session is closed")]
    SessionClosed,
    /// A (participant, question) pair was already recorded.
    #[error("participant `{participant_id}` already answered question `{question_id}`")]
    DuplicateAnswer {
        /// Participant that resubmitted.
        participant_id: Uuid,
        /// Question targeted by the resubmission.
        question_id: u32,
    },
    /// Answer references a participant that never joined the session.
    #[error("unknown participant `{0}`")]
    UnknownParticipant(Uuid),
    /// Answer references a question outside the session's question sequence.
    #[error("unknown question `{0}`")]
    UnknownQuestion(u32),
    /// No session registered under the given identifier.
    #[error("session `{0}` not found")]
    SessionNotFound(Uuid),
    /// Malformed payload rejected before reaching the core.
    #[error("validation failed: {0}")]
    Validation(String),
}

impl From<ValidationErrors> for ServiceError {
    fn from(err: ValidationErrors) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current session state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidTransition(_)
            | ServiceError::SessionNotStarted
            | ServiceError::SessionClosed
            | ServiceError::DuplicateAnswer { .. } => AppError::Conflict(err.to_string()),
            ServiceError::UnknownParticipant(_)
            | ServiceError::UnknownQuestion(_)
            | ServiceError::SessionNotFound(_) => AppError::NotFound(err.to_string()),
            ServiceError::Validation(message) => AppError::BadRequest(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}
