//! 网关服务模块
//!
//! Validates selectors and tables, builds SQL, runs it through the
//! [`SqlExecutor`] and maps failures onto the HTTP error taxonomy.

use std::sync::Arc;

use common::errors::{AppError, AppResult};
use common::models::{
    DeleteRequest, ReportResult, ReportSummary, Row, SqlOutcome, SqlRequest, TablesResponse,
    UpdateRequest,
};
use common::response::MessageResponse;
use common::utils::SqlValidator;
use serde_json::Value;
use validator::Validate;

use crate::executor::{DbFailure, IntegrityViolation, SqlExecutor};
use crate::query_builder;
use crate::reports::ReportCatalog;
use crate::whitelist::Whitelist;

pub const MSG_DUPLICATE_KEY: &str = "Duplicate key: a row with the same key already exists";
pub const MSG_FOREIGN_KEY: &str =
    "Foreign key constraint failed: referenced row does not exist or is in use";
pub const MSG_STILL_REFERENCED: &str =
    "Cannot delete: this row is referenced by other records";
pub const MSG_INTEGRITY: &str = "Integrity constraint violation";
pub const MSG_NO_MATCH: &str = "No matching row found";
pub const MSG_REPORT_NOT_FOUND: &str = "Report not found";

/// Write operation, for integrity error wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteOp {
    Insert,
    Update,
    Delete,
    Raw,
}

/// Request-scoped gateway service. Cheap to build: it only clones `Arc`s.
pub struct GatewayService {
    whitelist: Arc<Whitelist>,
    reports: Arc<ReportCatalog>,
    executor: Arc<dyn SqlExecutor>,
}

impl GatewayService {
    pub fn new(
        whitelist: Arc<Whitelist>,
        reports: Arc<ReportCatalog>,
        executor: Arc<dyn SqlExecutor>,
    ) -> Self {
        Self {
            whitelist,
            reports,
            executor,
        }
    }

    /// Whitelisted tables present in the selector's schema.
    pub async fn list_tables(&self, db: &str) -> AppResult<TablesResponse> {
        let database = self.whitelist.database(db)?;
        let rows = self
            .executor
            .fetch_rows(database, query_builder::list_tables(), &[])
            .await
            .map_err(read_failure)?;

        let tables = rows
            .iter()
            .filter_map(|row| row.values().next().and_then(Value::as_str))
            .filter(|name| self.whitelist.allows(database, name))
            .map(str::to_string)
            .collect();

        Ok(TablesResponse {
            database: database.to_string(),
            tables,
        })
    }

    /// `DESCRIBE`-shaped column descriptors.
    pub async fn table_schema(&self, db: &str, table: &str) -> AppResult<Vec<Row>> {
        let (database, table) = self.whitelist.table(db, table)?;
        let stmt = query_builder::describe(table);
        let columns = self
            .executor
            .fetch_rows(database, &stmt.sql, &stmt.params)
            .await
            .map_err(read_failure)?;

        // Whitelisted but absent from the schema: fail like DESCRIBE would.
        if columns.is_empty() {
            return Err(AppError::DatabaseQuery(format!(
                "Table '{}.{}' doesn't exist",
                database, table
            )));
        }
        Ok(columns)
    }

    /// Full table scan.
    pub async fn table_data(&self, db: &str, table: &str) -> AppResult<Vec<Row>> {
        let (database, table) = self.whitelist.table(db, table)?;
        self.executor
            .fetch_rows(database, &query_builder::select_all(table), &[])
            .await
            .map_err(read_failure)
    }

    pub async fn insert(&self, db: &str, table: &str, row: &Row) -> AppResult<MessageResponse> {
        let (database, table) = self.whitelist.table(db, table)?;
        let stmt = query_builder::insert(table, row)?;

        let affected = self
            .executor
            .execute(database, &stmt.sql, &stmt.params)
            .await
            .map_err(|e| write_failure(e, WriteOp::Insert))?;

        tracing::info!(database, table, rows_affected = affected, "row inserted");
        Ok(MessageResponse::new("Inserted successfully"))
    }

    pub async fn update(
        &self,
        db: &str,
        table: &str,
        req: &UpdateRequest,
    ) -> AppResult<MessageResponse> {
        let (database, table) = self.whitelist.table(db, table)?;
        let stmt = query_builder::update(table, &req.data, &req.filter)?;

        let affected = self
            .executor
            .execute(database, &stmt.sql, &stmt.params)
            .await
            .map_err(|e| write_failure(e, WriteOp::Update))?;

        // Connections negotiate CLIENT_FOUND_ROWS, so this counts matched rows.
        if affected == 0 {
            return Err(AppError::NotFound(MSG_NO_MATCH.into()));
        }
        tracing::info!(database, table, rows_affected = affected, "rows updated");
        Ok(MessageResponse::new("Updated successfully"))
    }

    pub async fn delete(
        &self,
        db: &str,
        table: &str,
        req: &DeleteRequest,
    ) -> AppResult<MessageResponse> {
        let (database, table) = self.whitelist.table(db, table)?;
        let stmt = query_builder::delete(table, &req.filter)?;

        let affected = self
            .executor
            .execute(database, &stmt.sql, &stmt.params)
            .await
            .map_err(|e| write_failure(e, WriteOp::Delete))?;

        if affected == 0 {
            return Err(AppError::NotFound(MSG_NO_MATCH.into()));
        }
        tracing::info!(database, table, rows_affected = affected, "rows deleted");
        Ok(MessageResponse::new("Deleted successfully"))
    }

    /// Ad-hoc SQL. The keyword guard runs before the selector is even looked at.
    pub async fn run_sql(&self, db: &str, req: &SqlRequest) -> AppResult<SqlOutcome> {
        if let Err(err) = SqlValidator::validate(&req.query) {
            tracing::warn!(database = db, error = %err, "ad-hoc query blocked");
            return Err(err);
        }
        let database = self.whitelist.database(db)?;
        req.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if SqlValidator::is_select(&req.query) {
            let rows = self
                .executor
                .fetch_rows_isolated(database, &req.query)
                .await
                .map_err(|e| write_failure(e, WriteOp::Raw))?;
            return Ok(SqlOutcome::Rows(rows));
        }

        let affected = self
            .executor
            .execute_isolated(database, &req.query)
            .await
            .map_err(|e| write_failure(e, WriteOp::Raw))?;
        tracing::info!(database, rows_affected = affected, "ad-hoc statement committed");
        Ok(SqlOutcome::Message(
            MessageResponse::new("Query executed").with_affected_rows(affected),
        ))
    }

    pub fn list_reports(&self, db: &str) -> AppResult<Vec<ReportSummary>> {
        let database = self.whitelist.database(db)?;
        Ok(self.reports.list(database))
    }

    pub async fn run_report(&self, db: &str, report_id: &str) -> AppResult<ReportResult> {
        let database = self.whitelist.database(db)?;
        let report = self
            .reports
            .get(database, report_id)
            .ok_or_else(|| AppError::NotFound(MSG_REPORT_NOT_FOUND.into()))?;

        let data = self
            .executor
            .fetch_rows(database, report.sql, &[])
            .await
            .map_err(read_failure)?;

        Ok(ReportResult {
            title: report.title.to_string(),
            data,
        })
    }
}

fn read_failure(failure: DbFailure) -> AppError {
    match failure {
        DbFailure::Connection(detail) => AppError::DatabaseConnection(detail),
        DbFailure::Integrity { message, .. } | DbFailure::Query(message) => {
            AppError::DatabaseQuery(message)
        }
    }
}

fn write_failure(failure: DbFailure, op: WriteOp) -> AppError {
    let DbFailure::Integrity { kind, message } = failure else {
        return read_failure(failure);
    };
    tracing::debug!(?op, ?kind, %message, "integrity violation");

    let text = match (op, kind) {
        (WriteOp::Delete, IntegrityViolation::ForeignKey) => MSG_STILL_REFERENCED,
        (WriteOp::Insert | WriteOp::Update, IntegrityViolation::DuplicateKey) => MSG_DUPLICATE_KEY,
        (WriteOp::Insert | WriteOp::Update, IntegrityViolation::ForeignKey) => MSG_FOREIGN_KEY,
        _ => MSG_INTEGRITY,
    };
    AppError::Conflict(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CallKind, RecordingExecutor, Scripted};
    use serde_json::json;

    fn service(executor: Arc<RecordingExecutor>) -> GatewayService {
        GatewayService::new(
            Arc::new(Whitelist::builtin().unwrap()),
            Arc::new(ReportCatalog::builtin()),
            executor,
        )
    }

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn integrity(kind: IntegrityViolation) -> Scripted {
        Scripted::Fail(DbFailure::Integrity {
            kind,
            message: "constraint".into(),
        })
    }

    #[tokio::test]
    async fn test_unknown_table_issues_no_sql() {
        let executor = Arc::new(RecordingExecutor::new());
        let svc = service(executor.clone());

        assert!(matches!(svc.table_data("university", "mysql_user").await, Err(AppError::InvalidTable)));
        assert!(matches!(svc.table_schema("nope", "student").await, Err(AppError::InvalidDatabase)));
        assert!(matches!(
            svc.insert("university", "journal", &row(json!({"Title": "x"}))).await,
            Err(AppError::InvalidTable)
        ));
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_schema_of_missing_table_is_server_error() {
        let executor = Arc::new(RecordingExecutor::with(vec![Scripted::Rows(vec![])]));
        let err = service(executor)
            .table_schema("research", "lab")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DatabaseQuery(ref m) if m.contains("Lab")), "{err:?}");
    }

    #[tokio::test]
    async fn test_list_tables_filters_to_whitelist() {
        let executor = Arc::new(RecordingExecutor::with(vec![Scripted::Rows(vec![
            row(json!({"table_name": "Course"})),
            row(json!({"table_name": "secrets"})),
            row(json!({"table_name": "Student"})),
        ])]));
        let svc = service(executor.clone());

        let resp = svc.list_tables("University").await.unwrap();
        assert_eq!(resp.database, "university");
        assert_eq!(resp.tables, ["Course", "Student"]);
        assert_eq!(executor.calls()[0].database, "university");
    }

    #[tokio::test]
    async fn test_insert_uses_canonical_table_and_bound_values() {
        let executor = Arc::new(RecordingExecutor::new());
        let svc = service(executor.clone());

        svc.insert("university", "student", &row(json!({"Name": "Alice", "DOB": "2000-01-01"})))
            .await
            .unwrap();

        let calls = executor.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].sql, "INSERT INTO `Student` (`Name`, `DOB`) VALUES (?, ?)");
        assert_eq!(calls[0].params, vec![json!("Alice"), json!("2000-01-01")]);
    }

    #[tokio::test]
    async fn test_insert_integrity_mapping() {
        let cases = [
            (IntegrityViolation::DuplicateKey, MSG_DUPLICATE_KEY),
            (IntegrityViolation::ForeignKey, MSG_FOREIGN_KEY),
            (IntegrityViolation::Other, MSG_INTEGRITY),
        ];
        for (kind, expected) in cases {
            let executor = Arc::new(RecordingExecutor::with(vec![integrity(kind)]));
            let err = service(executor)
                .insert("university", "student", &row(json!({"Name": "Alice"})))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Conflict(ref m) if m == expected), "{kind:?}");
        }
    }

    #[tokio::test]
    async fn test_delete_foreign_key_is_still_referenced() {
        let executor = Arc::new(RecordingExecutor::with(vec![integrity(IntegrityViolation::ForeignKey)]));
        let err = service(executor)
            .delete("university", "academic_department", &DeleteRequest {
                filter: row(json!({"Name": "Physics"})),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m == MSG_STILL_REFERENCED));
    }

    #[tokio::test]
    async fn test_update_zero_rows_is_not_found() {
        let executor = Arc::new(RecordingExecutor::with(vec![Scripted::Affected(0)]));
        let err = service(executor)
            .update("university", "student", &UpdateRequest {
                data: row(json!({"Name": "Bob"})),
                filter: row(json!({"Name": "Nobody", "DOB": "1900-01-01"})),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_query_failure_is_server_error() {
        let executor = Arc::new(RecordingExecutor::with(vec![Scripted::Fail(DbFailure::Query(
            "Unknown column 'Nmae'".into(),
        ))]));
        let err = service(executor)
            .insert("university", "student", &row(json!({"Nmae": "x"})))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DatabaseQuery(_)));
    }

    #[tokio::test]
    async fn test_run_sql_blocked_before_database_check() {
        let executor = Arc::new(RecordingExecutor::new());
        let svc = service(executor.clone());
        let req = SqlRequest {
            query: "Drop TABLE Student".into(),
        };
        assert!(matches!(svc.run_sql("unknowndb", &req).await, Err(AppError::BlockedOperation(_))));
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_run_sql_select_and_write() {
        let executor = Arc::new(RecordingExecutor::with(vec![
            Scripted::Rows(vec![row(json!({"n": 1}))]),
            Scripted::Affected(2),
        ]));
        let svc = service(executor.clone());

        let rows = svc
            .run_sql("research", &SqlRequest { query: "SELECT 1 AS n".into() })
            .await
            .unwrap();
        assert!(matches!(rows, SqlOutcome::Rows(ref r) if r.len() == 1));

        let msg = svc
            .run_sql("research", &SqlRequest { query: "UPDATE Lab SET Name = Name".into() })
            .await
            .unwrap();
        assert!(matches!(msg, SqlOutcome::Message(ref m) if m.affected_rows == Some(2)));

        let calls = executor.calls();
        let kinds: Vec<_> = calls.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, [CallKind::Fetch, CallKind::Execute]);
        assert!(calls.iter().all(|c| c.isolated));
    }

    #[tokio::test]
    async fn test_table_writes_use_pooled_connections() {
        let executor = Arc::new(RecordingExecutor::new());
        let svc = service(executor.clone());

        svc.insert("university", "student", &row(json!({"Name": "Alice"})))
            .await
            .unwrap();
        svc.table_data("university", "student").await.unwrap();
        assert!(executor.calls().iter().all(|c| !c.isolated));
    }

    #[tokio::test]
    async fn test_update_integrity_mapping() {
        let cases = [
            (IntegrityViolation::DuplicateKey, MSG_DUPLICATE_KEY),
            (IntegrityViolation::ForeignKey, MSG_FOREIGN_KEY),
            (IntegrityViolation::Other, MSG_INTEGRITY),
        ];
        for (kind, expected) in cases {
            let executor = Arc::new(RecordingExecutor::with(vec![integrity(kind)]));
            let err = service(executor)
                .update("university", "enrolled_in", &UpdateRequest {
                    data: row(json!({"CourseID": 999})),
                    filter: row(json!({"StudentID": 1})),
                })
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Conflict(ref m) if m == expected), "{kind:?}");
        }
    }

    #[tokio::test]
    async fn test_run_sql_integrity_is_generic_conflict() {
        for kind in [IntegrityViolation::DuplicateKey, IntegrityViolation::ForeignKey] {
            let executor = Arc::new(RecordingExecutor::with(vec![integrity(kind)]));
            let err = service(executor)
                .run_sql("university", &SqlRequest {
                    query: "INSERT INTO Student (StudentID) VALUES (1)".into(),
                })
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Conflict(ref m) if m == MSG_INTEGRITY), "{kind:?}");
        }
    }

    #[tokio::test]
    async fn test_run_sql_empty_query() {
        let executor = Arc::new(RecordingExecutor::new());
        let svc = service(executor.clone());
        let err = svc
            .run_sql("research", &SqlRequest { query: "   ".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_reports() {
        let executor = Arc::new(RecordingExecutor::new());
        let svc = service(executor.clone());

        assert_eq!(svc.list_reports("university").unwrap().len(), 2);
        assert!(matches!(svc.list_reports("nope"), Err(AppError::InvalidDatabase)));
        assert!(matches!(
            svc.run_report("university", "journal-summary").await,
            Err(AppError::NotFound(_))
        ));

        let result = svc.run_report("research", "journal-summary").await.unwrap();
        assert_eq!(result.title, "Journal Publication Summary");
        assert_eq!(executor.calls().len(), 1);
    }
}
