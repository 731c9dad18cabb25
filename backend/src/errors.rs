use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use ledger::errors::LedgerError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("engine failure: {0}")]
    Engine(String),

    #[error("internal error")]
    Internal,
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        let msg = e.to_string();
        match e {
            LedgerError::Unauthorized | LedgerError::CannotRemoveOwner => {
                ApiError::Unauthorized(msg)
            }
            LedgerError::SystemPaused
            | LedgerError::AlreadyVerified
            | LedgerError::AlreadyCompleted => ApiError::Conflict(msg),
            LedgerError::NotSubmitted => ApiError::NotFound(msg),
            LedgerError::InvalidRange { .. }
            | LedgerError::InvalidStart { .. }
            | LedgerError::InvalidTarget => ApiError::BadRequest(msg),
            LedgerError::Engine(inner) => ApiError::Engine(inner.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match &self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            ApiError::Unauthorized(m) => (StatusCode::FORBIDDEN, m.clone()),
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
            ApiError::Engine(m) => (StatusCode::BAD_GATEWAY, m.clone()),
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string()),
        };

        (status, Json(ErrorBody { error: msg })).into_response()
    }
}
