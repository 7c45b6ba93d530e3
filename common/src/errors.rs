//! Error taxonomy shared by every handler.
//!
//! Each variant maps to exactly one HTTP status; see [`AppError::status_code`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::response::ErrorBody;

/// Result alias used across the workspace.
pub type AppResult<T> = Result<T, AppError>;

/// Message returned with every unclassified server error.
pub const GENERIC_SERVER_ERROR: &str = "Database operation failed";

/// Application error.
#[derive(Debug, Error)]
pub enum AppError {
    /// The `{db}` selector is not whitelisted.
    #[error("Invalid database")]
    InvalidDatabase,

    /// The table is not whitelisted for the selected database.
    #[error("Invalid table")]
    InvalidTable,

    /// Malformed or incomplete request.
    #[error("{0}")]
    Validation(String),

    /// Ad-hoc SQL contained a blacklisted keyword.
    #[error("Blocked SQL keyword: {0}")]
    BlockedOperation(String),

    /// UPDATE/DELETE matched nothing, or an unknown report was requested.
    #[error("{0}")]
    NotFound(String),

    /// Integrity constraint violation reported by the database.
    #[error("{0}")]
    Conflict(String),

    /// Connection could not be acquired.
    #[error("Database connection failed: {0}")]
    DatabaseConnection(String),

    /// Statement failed for a reason that is not an integrity violation.
    #[error("Database query failed: {0}")]
    DatabaseQuery(String),
}

impl AppError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidDatabase | AppError::InvalidTable | AppError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::BlockedOperation(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::DatabaseConnection(_) | AppError::DatabaseQuery(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Builds the JSON body. Server errors carry a generic message and the
    /// diagnostic text in `details`.
    pub fn to_body(&self) -> ErrorBody {
        match self {
            AppError::DatabaseConnection(detail) | AppError::DatabaseQuery(detail) => ErrorBody {
                error: GENERIC_SERVER_ERROR.to_string(),
                details: Some(detail.clone()),
            },
            other => ErrorBody {
                error: other.to_string(),
                details: None,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "request rejected");
        }
        (status, Json(self.to_body())).into_response()
    }
}
