//! Request and response models.

pub mod query;
pub mod report;
pub mod table;

pub use query::{SqlOutcome, SqlRequest};
pub use report::{ReportResult, ReportSummary};
pub use table::{DeleteRequest, Row, TablesResponse, UpdateRequest};
