use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

use crate::{dao::storage::StorageError, dto::validation::FieldErrors};

/// Message shown when a rank was claimed by a concurrent insert.
pub const RANK_TAKEN_MESSAGE: &str = "That rank is already taken. Try another.";
/// Message shown when a reorder was built from an outdated list.
pub const STALE_ORDER_MESSAGE: &str =
    "The list changed since it was loaded. Refresh the page and try again.";

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend failed while serving the request.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Malformed request that never reached storage.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Form fields failed validation; every failing field is reported.
    #[error("validation failed")]
    Validation(FieldErrors),
    /// The submission disagrees with the stored state (stale client view).
    #[error("conflict: {0}")]
    Conflict(String),
    /// Storage refused a rank because it is taken or no longer adjacent to the last game.
    #[error("rank {rank} is already taken")]
    RankConflict { rank: i64 },
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::RankConflict { rank } => ServiceError::RankConflict { rank },
            StorageError::OrderMismatch => ServiceError::Conflict(STALE_ORDER_MESSAGE.into()),
            other => ServiceError::Unavailable(other),
        }
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Field-level validation failure.
    #[error("validation failed")]
    Unprocessable(FieldErrors),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Status code sent for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => {
                error!(error = %source, "storage failure");
                AppError::Internal("storage failure".into())
            }
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::Validation(fields) => AppError::Unprocessable(fields),
            ServiceError::Conflict(message) => AppError::Conflict(message),
            ServiceError::RankConflict { .. } => AppError::Conflict(RANK_TAKEN_MESSAGE.into()),
        }
    }
}

/// JSON error payload of the `/api` routes.
#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    message: String,
    /// Per-field messages, present on validation failures.
    #[serde(skip_serializing_if = "FieldErrors::is_empty")]
    fields: FieldErrors,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let message = self.to_string();
        let fields = match self {
            AppError::Unprocessable(fields) => fields,
            _ => FieldErrors::new(),
        };

        (status, Json(ErrorBody { message, fields })).into_response()
    }
}
