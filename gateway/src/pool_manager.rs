//! MySQL connection pools, one per whitelisted database selector.
//!
//! Pools are created lazily: nothing connects until the first request for a
//! selector, so an unreachable database only fails the requests that need it.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use common::config::DatabaseConfig;
use common::models::Row;
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::mysql::{
    MySqlArguments, MySqlConnectOptions, MySqlConnection, MySqlDatabaseError, MySqlPoolOptions,
    MySqlRow,
};
use sqlx::query::Query;
use sqlx::{Column, Connection, MySql, MySqlPool, Row as SqlxRow};

use crate::executor::{DbFailure, IntegrityViolation, SqlExecutor};

/// Owns the per-selector pools.
pub struct PoolManager {
    pools: HashMap<String, MySqlPool>,
}

impl PoolManager {
    /// Configures a lazy pool for every selector. Must run inside a Tokio runtime.
    pub fn new<'a, I>(config: &DatabaseConfig, selectors: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let timeout = Duration::from_secs(config.connect_timeout_secs);
        let mut pools = HashMap::new();

        for selector in selectors {
            let schema = config.schema_for(selector);
            let options = MySqlConnectOptions::new()
                .host(&config.host)
                .port(config.port)
                .username(&config.user)
                .password(&config.password)
                .database(&schema);
            let pool = MySqlPoolOptions::new()
                .max_connections(config.max_connections)
                .acquire_timeout(timeout)
                .connect_lazy_with(options);

            tracing::info!(
                database = selector,
                schema = %schema,
                host = %config.host,
                port = config.port,
                "Pool configured"
            );
            pools.insert(selector.to_string(), pool);
        }

        Self { pools }
    }

    fn pool(&self, database: &str) -> Result<&MySqlPool, DbFailure> {
        self.pools
            .get(database)
            .ok_or_else(|| DbFailure::Connection(format!("no pool configured for `{}`", database)))
    }

    /// Takes a connection out of the pool for good; the pool opens a
    /// replacement when it needs one.
    async fn detached(&self, database: &str) -> Result<MySqlConnection, DbFailure> {
        Ok(self.pool(database)?.acquire().await?.detach())
    }

    /// Closes every pool. Used on shutdown.
    pub async fn close(&self) {
        for pool in self.pools.values() {
            pool.close().await;
        }
    }
}

#[async_trait]
impl SqlExecutor for PoolManager {
    async fn fetch_rows(
        &self,
        database: &str,
        sql: &str,
        params: &[Value],
    ) -> Result<Vec<Row>, DbFailure> {
        let pool = self.pool(database)?;
        let query = params.iter().fold(sqlx::query(sql), bind_value);
        let rows = query.fetch_all(pool).await?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    async fn execute(&self, database: &str, sql: &str, params: &[Value]) -> Result<u64, DbFailure> {
        let mut conn = self.pool(database)?.acquire().await?;
        execute_in_transaction(&mut conn, sql, params).await
    }

    async fn fetch_rows_isolated(&self, database: &str, sql: &str) -> Result<Vec<Row>, DbFailure> {
        let mut conn = self.detached(database).await?;
        let result = sqlx::query(sql).fetch_all(&mut conn).await;
        close_detached(conn).await;
        Ok(result?.iter().map(row_to_json).collect())
    }

    async fn execute_isolated(&self, database: &str, sql: &str) -> Result<u64, DbFailure> {
        let mut conn = self.detached(database).await?;
        let result = execute_in_transaction(&mut conn, sql, &[]).await;
        close_detached(conn).await;
        result
    }
}

// Dropping the transaction on an early return rolls it back.
async fn execute_in_transaction(
    conn: &mut MySqlConnection,
    sql: &str,
    params: &[Value],
) -> Result<u64, DbFailure> {
    let mut tx = conn.begin().await?;
    let query = params.iter().fold(sqlx::query(sql), bind_value);
    let result = query.execute(&mut *tx).await?;
    tx.commit().await?;
    Ok(result.rows_affected())
}

async fn close_detached(conn: MySqlConnection) {
    if let Err(err) = conn.close().await {
        tracing::debug!(error = %err, "ad-hoc connection did not close cleanly");
    }
}

/// Binds one JSON value as a MySQL parameter.
fn bind_value<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    value: &Value,
) -> Query<'q, MySql, MySqlArguments> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else if let Some(u) = n.as_u64() {
                query.bind(u)
            } else {
                query.bind(n.as_f64())
            }
        }
        Value::String(s) => query.bind(s.clone()),
        // Arrays and objects are stored as their JSON text.
        other => query.bind(other.to_string()),
    }
}

fn row_to_json(row: &MySqlRow) -> Row {
    row.columns()
        .iter()
        .map(|col| (col.name().to_string(), decode_value(row, col.ordinal())))
        .collect()
}

/// Decodes a column by trying the Rust types MySQL columns map to, most
/// specific first. NULL short-circuits on the first attempt.
fn decode_value(row: &MySqlRow, idx: usize) -> Value {
    if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<u64>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
        return v
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<f32>, _>(idx) {
        return v
            .and_then(|f| serde_json::Number::from_f64(f as f64))
            .map(Value::Number)
            .unwrap_or(Value::Null);
    }
    // DECIMAL keeps its exact text.
    if let Ok(v) = row.try_get::<Option<Decimal>, _>(idx) {
        return v.map(|d| Value::String(d.to_string())).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(idx) {
        return v.map(Value::Bool).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
        return v.map(Value::String).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<NaiveDate>, _>(idx) {
        return v
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
            .unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<NaiveDateTime>, _>(idx) {
        return v
            .map(|d| Value::String(d.format("%Y-%m-%d %H:%M:%S").to_string()))
            .unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<DateTime<Utc>>, _>(idx) {
        return v.map(|d| Value::String(d.to_rfc3339())).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<NaiveTime>, _>(idx) {
        return v
            .map(|t| Value::String(t.format("%H:%M:%S").to_string()))
            .unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<Value>, _>(idx) {
        return v.unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(idx) {
        return v
            .map(|b| Value::String(String::from_utf8_lossy(&b).into_owned()))
            .unwrap_or(Value::Null);
    }

    tracing::debug!(column = idx, "Undecodable column value, returning null");
    Value::Null
}

impl From<sqlx::Error> for DbFailure {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) => {
                let number = db
                    .try_downcast_ref::<MySqlDatabaseError>()
                    .map(MySqlDatabaseError::number);
                match IntegrityViolation::classify(number, db.code().as_deref()) {
                    Some(kind) => DbFailure::Integrity {
                        kind,
                        message: db.message().to_string(),
                    },
                    None => DbFailure::Query(err.to_string()),
                }
            }
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => DbFailure::Connection(err.to_string()),
            _ => DbFailure::Query(err.to_string()),
        }
    }
}
