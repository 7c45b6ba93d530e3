//! In-memory [`SqlExecutor`] for tests: replays scripted outcomes and records
//! every statement it receives.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use common::models::Row;
use serde_json::Value;

use crate::executor::{DbFailure, SqlExecutor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Fetch,
    Execute,
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub kind: CallKind,
    /// Ran on a throwaway connection.
    pub isolated: bool,
    pub database: String,
    pub sql: String,
    pub params: Vec<Value>,
}

/// Next outcome to hand out. When the script is empty, fetches return no rows
/// and executes report one affected row.
#[derive(Debug, Clone)]
pub enum Scripted {
    Rows(Vec<Row>),
    Affected(u64),
    Fail(DbFailure),
}

#[derive(Default)]
pub struct RecordingExecutor {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::default(),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(
        &self,
        kind: CallKind,
        isolated: bool,
        database: &str,
        sql: &str,
        params: &[Value],
    ) -> Option<Scripted> {
        self.calls.lock().unwrap().push(RecordedCall {
            kind,
            isolated,
            database: database.to_string(),
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        self.script.lock().unwrap().pop_front()
    }
}

#[async_trait]
impl SqlExecutor for RecordingExecutor {
    async fn fetch_rows(
        &self,
        database: &str,
        sql: &str,
        params: &[Value],
    ) -> Result<Vec<Row>, DbFailure> {
        self.fetch(false, database, sql, params)
    }

    async fn execute(&self, database: &str, sql: &str, params: &[Value]) -> Result<u64, DbFailure> {
        self.exec(false, database, sql, params)
    }

    async fn fetch_rows_isolated(&self, database: &str, sql: &str) -> Result<Vec<Row>, DbFailure> {
        self.fetch(true, database, sql, &[])
    }

    async fn execute_isolated(&self, database: &str, sql: &str) -> Result<u64, DbFailure> {
        self.exec(true, database, sql, &[])
    }
}

impl RecordingExecutor {
    fn fetch(
        &self,
        isolated: bool,
        database: &str,
        sql: &str,
        params: &[Value],
    ) -> Result<Vec<Row>, DbFailure> {
        match self.record(CallKind::Fetch, isolated, database, sql, params) {
            None => Ok(Vec::new()),
            Some(Scripted::Rows(rows)) => Ok(rows),
            Some(Scripted::Fail(failure)) => Err(failure),
            Some(Scripted::Affected(_)) => panic!("scripted affected-rows for a fetch: {sql}"),
        }
    }

    fn exec(&self, isolated: bool, database: &str, sql: &str, params: &[Value]) -> Result<u64, DbFailure> {
        match self.record(CallKind::Execute, isolated, database, sql, params) {
            None => Ok(1),
            Some(Scripted::Affected(n)) => Ok(n),
            Some(Scripted::Fail(failure)) => Err(failure),
            Some(Scripted::Rows(_)) => panic!("scripted rows for an execute: {sql}"),
        }
    }
}
