//! JSON response wrappers.
//!
//! The gateway returns bare payloads on success (rows, table lists, report
//! results); these types cover the remaining message and error shapes.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Error response body: `{"error": "...", "details": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Human-readable error message.
    pub error: String,

    /// Diagnostic detail, present on server errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Acknowledgement for write operations.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    /// Outcome message.
    pub message: String,

    /// Rows affected, reported by ad-hoc statements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affected_rows: Option<u64>,
}

impl MessageResponse {
    /// Creates a message without a row count.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            affected_rows: None,
        }
    }

    /// Sets the affected row count.
    pub fn with_affected_rows(mut self, rows: u64) -> Self {
        self.affected_rows = Some(rows);
        self
    }
}
