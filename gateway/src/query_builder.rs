//! SQL text builders for table operations.
//!
//! Table names arrive already resolved through the whitelist; column names come
//! from request bodies and are checked against the identifier pattern here.
//! Values never enter the SQL text; they are returned as bind parameters.

use common::errors::{AppError, AppResult};
use common::models::Row;
use common::utils::{quote_identifier, validate_identifier};
use serde_json::Value;

/// SQL text plus its bind parameters, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

/// `DESCRIBE`-shaped column descriptors. Read from information_schema so the
/// table name is bound rather than interpolated.
pub fn describe(table: &str) -> Statement {
    Statement {
        sql: "SELECT CAST(COLUMN_NAME AS CHAR) AS `Field`, \
              CAST(COLUMN_TYPE AS CHAR) AS `Type`, \
              CAST(IS_NULLABLE AS CHAR) AS `Null`, \
              CAST(COLUMN_KEY AS CHAR) AS `Key`, \
              CAST(COLUMN_DEFAULT AS CHAR) AS `Default`, \
              CAST(EXTRA AS CHAR) AS `Extra` \
              FROM information_schema.COLUMNS \
              WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? \
              ORDER BY ORDINAL_POSITION"
            .to_string(),
        params: vec![Value::String(table.to_string())],
    }
}

pub fn select_all(table: &str) -> String {
    format!("SELECT * FROM {}", quote_identifier(table))
}

/// Tables of the connection's current schema.
pub fn list_tables() -> &'static str {
    "SELECT CAST(TABLE_NAME AS CHAR) AS table_name \
     FROM information_schema.TABLES \
     WHERE TABLE_SCHEMA = DATABASE() \
     ORDER BY TABLE_NAME"
}

pub fn insert(table: &str, row: &Row) -> AppResult<Statement> {
    if row.is_empty() {
        return Err(AppError::Validation("No data provided".into()));
    }
    let mut columns = Vec::with_capacity(row.len());
    let mut params = Vec::with_capacity(row.len());
    for (column, value) in row {
        validate_identifier(column)?;
        columns.push(quote_identifier(column));
        params.push(value.clone());
    }
    let placeholders = vec!["?"; columns.len()].join(", ");
    Ok(Statement {
        sql: format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_identifier(table),
            columns.join(", "),
            placeholders
        ),
        params,
    })
}

pub fn update(table: &str, data: &Row, filter: &Row) -> AppResult<Statement> {
    if data.is_empty() || filter.is_empty() {
        return Err(AppError::Validation(
            "Update requires non-empty 'data' and 'where' objects".into(),
        ));
    }
    let mut params = Vec::with_capacity(data.len() + filter.len());
    let mut assignments = Vec::with_capacity(data.len());
    for (column, value) in data {
        validate_identifier(column)?;
        assignments.push(format!("{} = ?", quote_identifier(column)));
        params.push(value.clone());
    }
    let conditions = where_clause(filter, &mut params)?;
    Ok(Statement {
        sql: format!(
            "UPDATE {} SET {} WHERE {}",
            quote_identifier(table),
            assignments.join(", "),
            conditions
        ),
        params,
    })
}

pub fn delete(table: &str, filter: &Row) -> AppResult<Statement> {
    if filter.is_empty() {
        return Err(AppError::Validation(
            "Delete requires a non-empty 'where' condition".into(),
        ));
    }
    let mut params = Vec::with_capacity(filter.len());
    let conditions = where_clause(filter, &mut params)?;
    Ok(Statement {
        sql: format!("DELETE FROM {} WHERE {}", quote_identifier(table), conditions),
        params,
    })
}

/// Equality conjunction. `null` becomes `IS NULL` since `= NULL` never matches.
fn where_clause(filter: &Row, params: &mut Vec<Value>) -> AppResult<String> {
    let mut conditions = Vec::with_capacity(filter.len());
    for (column, value) in filter {
        validate_identifier(column)?;
        if value.is_null() {
            conditions.push(format!("{} IS NULL", quote_identifier(column)));
        } else {
            conditions.push(format!("{} = ?", quote_identifier(column)));
            params.push(value.clone());
        }
    }
    Ok(conditions.join(" AND "))
}
