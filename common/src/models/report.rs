//! Report models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::table::Row;

/// Catalog entry returned by the report listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReportSummary {
    pub id: String,
    pub title: String,
}

/// Output of a report run.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportResult {
    pub title: String,
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<Row>,
}
