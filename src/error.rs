use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::{
    dao::storage::StorageError,
    state::{board::BoardError, deck::DeckError},
};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Submitted fields failed validation; nothing was persisted.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    /// A valid score could not be written.
    #[error("score could not be persisted: {0}")]
    Persistence(String),
    /// The Pokémon source is empty.
    #[error("no cards available")]
    NoCards,
    /// The Pokémon source cannot fill the requested deck.
    #[error(transparent)]
    Deck(#[from] DeckError),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<BoardError> for ServiceError {
    fn from(err: BoardError) -> Self {
        ServiceError::InvalidInput(err.to_string())
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Field-level validation failure, rendered as `{ valid: false, errors }`.
    #[error("unprocessable entity")]
    Unprocessable(ValidationErrors),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error with a message body.
    #[error("internal error: {0}")]
    Internal(String),
    /// Internal server error with an empty body.
    #[error("internal error")]
    InternalSilent,
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::Validation(errors) => AppError::Unprocessable(errors),
            ServiceError::Persistence(_) => AppError::InternalSilent,
            ServiceError::NoCards => AppError::ServiceUnavailable("no cards available".into()),
            ServiceError::Deck(deck) => AppError::Internal(deck.to_string()),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::Unprocessable(err)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

#[derive(Serialize)]
struct ValidationBody {
    valid: bool,
    errors: ValidationErrors,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) | AppError::InternalSilent => StatusCode::INTERNAL_SERVER_ERROR,
        };

        match self {
            AppError::Unprocessable(errors) => (
                status,
                Json(ValidationBody {
                    valid: false,
                    errors,
                }),
            )
                .into_response(),
            AppError::InternalSilent => status.into_response(),
            other => {
                let payload = Json(ErrorBody {
                    message: other.to_string(),
                });
                (status, payload).into_response()
            }
        }
    }
}
