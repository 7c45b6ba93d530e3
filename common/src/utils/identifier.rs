//! SQL identifier guard.
//!
//! Identifiers cannot be bound as parameters, so they are interpolated into
//! SQL text. Only names matching [`IDENTIFIER_PATTERN`] are ever interpolated,
//! and always backtick-quoted.

use std::sync::LazyLock;

use regex::Regex;

use crate::errors::AppError;

/// ASCII letter or underscore, then up to 63 letters, digits or underscores.
pub const IDENTIFIER_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]{0,63}$";

static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(IDENTIFIER_PATTERN).expect("identifier pattern is valid"));

pub fn is_safe_identifier(name: &str) -> bool {
    IDENTIFIER_RE.is_match(name)
}

/// Rejects names that are not safe identifiers.
pub fn validate_identifier(name: &str) -> Result<(), AppError> {
    if is_safe_identifier(name) {
        Ok(())
    } else {
        Err(AppError::Validation(format!("Invalid identifier: {}", name)))
    }
}

/// Backtick-quotes an identifier. Callers validate first.
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_names() {
        for name in ["Student", "enrolled_in", "_tmp", "DOB", "Col2"] {
            assert!(is_safe_identifier(name), "{name}");
        }
    }

    #[test]
    fn test_rejects_injection_attempts() {
        for name in [
            "",
            "1abc",
            "Name; DROP TABLE Student",
            "Name`",
            "a b",
            "Name--",
            "tbl.col",
            "Ünïcode",
        ] {
            assert!(!is_safe_identifier(name), "{name}");
        }
    }

    #[test]
    fn test_length_limit() {
        assert!(is_safe_identifier(&"a".repeat(64)));
        assert!(!is_safe_identifier(&"a".repeat(65)));
    }

    #[test]
    fn test_validate_identifier_error() {
        assert!(matches!(validate_identifier("x y"), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("Student"), "`Student`");
    }
}
