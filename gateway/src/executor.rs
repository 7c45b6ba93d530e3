//! Statement execution seam.
//!
//! The service layer builds SQL and hands it to a [`SqlExecutor`]; the MySQL
//! implementation lives in `pool_manager`. Driver errors cross this boundary as
//! [`DbFailure`] so the service never inspects `sqlx` types.

use async_trait::async_trait;
use common::models::Row;
use serde_json::Value;
use thiserror::Error;

/// Executes one statement against the database behind a selector.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Runs a row-returning statement.
    async fn fetch_rows(
        &self,
        database: &str,
        sql: &str,
        params: &[Value],
    ) -> Result<Vec<Row>, DbFailure>;

    /// Runs a statement inside a transaction and commits it. Returns rows affected.
    async fn execute(&self, database: &str, sql: &str, params: &[Value]) -> Result<u64, DbFailure>;

    /// Like [`SqlExecutor::fetch_rows`], on a connection that is closed afterwards.
    /// Used for caller-supplied SQL, whose session changes must not outlive it.
    async fn fetch_rows_isolated(&self, database: &str, sql: &str) -> Result<Vec<Row>, DbFailure>;

    /// Like [`SqlExecutor::execute`], on a connection that is closed afterwards.
    async fn execute_isolated(&self, database: &str, sql: &str) -> Result<u64, DbFailure>;
}

/// Kind of integrity constraint the database reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityViolation {
    DuplicateKey,
    ForeignKey,
    Other,
}

// MySQL server error numbers.
const ER_DUP_ENTRY: u16 = 1062;
const ER_DUP_ENTRY_WITH_KEY_NAME: u16 = 1586;
const ER_NO_REFERENCED_ROW: u16 = 1216;
const ER_ROW_IS_REFERENCED: u16 = 1217;
const ER_ROW_IS_REFERENCED_2: u16 = 1451;
const ER_NO_REFERENCED_ROW_2: u16 = 1452;

impl IntegrityViolation {
    /// Classifies a server error from its error number and SQLSTATE.
    /// Returns `None` when the error is not an integrity violation.
    pub fn classify(number: Option<u16>, sqlstate: Option<&str>) -> Option<Self> {
        match number {
            Some(ER_DUP_ENTRY | ER_DUP_ENTRY_WITH_KEY_NAME) => Some(Self::DuplicateKey),
            Some(
                ER_NO_REFERENCED_ROW
                | ER_ROW_IS_REFERENCED
                | ER_ROW_IS_REFERENCED_2
                | ER_NO_REFERENCED_ROW_2,
            ) => Some(Self::ForeignKey),
            _ if sqlstate.is_some_and(|state| state.starts_with("23")) => Some(Self::Other),
            _ => None,
        }
    }
}

/// Failure reported by a [`SqlExecutor`].
#[derive(Debug, Clone, Error)]
pub enum DbFailure {
    /// No connection could be acquired.
    #[error("{0}")]
    Connection(String),

    /// Constraint violation; the statement was rolled back.
    #[error("{message}")]
    Integrity {
        kind: IntegrityViolation,
        message: String,
    },

    /// Any other statement failure.
    #[error("{0}")]
    Query(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_key_numbers() {
        assert_eq!(
            IntegrityViolation::classify(Some(1062), Some("23000")),
            Some(IntegrityViolation::DuplicateKey)
        );
        assert_eq!(
            IntegrityViolation::classify(Some(1586), None),
            Some(IntegrityViolation::DuplicateKey)
        );
    }

    #[test]
    fn test_foreign_key_numbers() {
        for number in [1216, 1217, 1451, 1452] {
            assert_eq!(
                IntegrityViolation::classify(Some(number), Some("23000")),
                Some(IntegrityViolation::ForeignKey)
            );
        }
    }

    #[test]
    fn test_other_integrity_by_sqlstate() {
        // ER_BAD_NULL_ERROR
        assert_eq!(
            IntegrityViolation::classify(Some(1048), Some("23000")),
            Some(IntegrityViolation::Other)
        );
    }

    #[test]
    fn test_non_integrity_errors() {
        // ER_BAD_FIELD_ERROR
        assert_eq!(IntegrityViolation::classify(Some(1054), Some("42S22")), None);
        assert_eq!(IntegrityViolation::classify(None, None), None);
    }
}
