//! Keyword guard for ad-hoc SQL.
//!
//! This is a case-insensitive substring match, not a SQL parser. It rejects
//! column names that merely contain a blocked word (`dropped_at`) and does not
//! see through comments or multi-statement payloads. It is a tripwire, not a
//! sandbox.

use crate::errors::AppError;

/// Validates ad-hoc SQL statements.
pub struct SqlValidator;

/// Blocked keywords, lowercase.
pub const BLOCKED_KEYWORDS: [&str; 3] = ["drop", "truncate", "alter"];

impl SqlValidator {
    /// Returns the first blocked keyword contained in `sql`, if any.
    pub fn blocked_keyword(sql: &str) -> Option<&'static str> {
        let lowered = sql.to_lowercase();
        BLOCKED_KEYWORDS
            .into_iter()
            .find(|keyword| lowered.contains(keyword))
    }

    /// Fails with [`AppError::BlockedOperation`] when `sql` contains a blocked keyword.
    pub fn validate(sql: &str) -> Result<(), AppError> {
        match Self::blocked_keyword(sql) {
            Some(keyword) => Err(AppError::BlockedOperation(keyword.to_uppercase())),
            None => Ok(()),
        }
    }

    /// Whether the statement returns rows (starts with SELECT).
    pub fn is_select(sql: &str) -> bool {
        sql.trim_start()
            .get(..6)
            .is_some_and(|head| head.eq_ignore_ascii_case("select"))
    }
}
