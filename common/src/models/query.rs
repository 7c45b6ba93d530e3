//! Ad-hoc SQL models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::models::table::Row;
use crate::response::MessageResponse;

/// Request body for executing an ad-hoc SQL statement.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SqlRequest {
    /// SQL statement to execute as-is.
    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "Query is required"))]
    pub query: String,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Result of an ad-hoc statement: rows for SELECT, a message otherwise.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SqlOutcome {
    Rows(Vec<Row>),
    Message(MessageResponse),
}
