//! SQL guards.

pub mod identifier;
pub mod sql_validator;

pub use identifier::{is_safe_identifier, quote_identifier, validate_identifier};
pub use sql_validator::SqlValidator;
