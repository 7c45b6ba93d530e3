//! Table browsing and CRUD models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One result row: column name -> value, in result-set column order.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Response of the table listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TablesResponse {
    /// Selector the listing belongs to.
    pub database: String,
    /// Whitelisted tables present in the schema.
    pub tables: Vec<String>,
}

/// Body of the update endpoint.
///
/// Both maps default to empty so a missing key is reported by the service as a
/// malformed body rather than a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateRequest {
    /// Columns to assign.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub data: Row,

    /// Equality conditions, joined with AND.
    #[serde(default, rename = "where")]
    #[schema(value_type = Object)]
    pub filter: Row,
}

/// Body of the delete endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DeleteRequest {
    /// Equality conditions, joined with AND.
    #[serde(default, rename = "where")]
    #[schema(value_type = Object)]
    pub filter: Row,
}
