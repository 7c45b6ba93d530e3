//! 网关路由模块

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::handlers;
use crate::state::AppState;

/// 创建网关路由
///
/// Every table, SQL and report route exists twice: under `/api/{db}` and
/// un-prefixed, where it targets the default database.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::health_check))
        .route("/api/health", get(handlers::health_check))
        // 指定数据库
        .route("/api/{db}/tables", get(handlers::list_tables))
        .route("/api/{db}/tables/{table}/schema", get(handlers::table_schema))
        .route("/api/{db}/tables/{table}/data", get(handlers::table_data))
        .route("/api/{db}/tables/{table}/insert", post(handlers::insert_row))
        .route("/api/{db}/tables/{table}/update", put(handlers::update_rows))
        .route("/api/{db}/tables/{table}/delete", delete(handlers::delete_rows))
        .route("/api/{db}/sql", post(handlers::run_sql))
        .route("/api/{db}/reports", get(handlers::list_reports))
        .route("/api/{db}/reports/{report_id}", get(handlers::run_report))
        // 默认数据库
        .route("/api/tables", get(handlers::default_list_tables))
        .route("/api/tables/{table}/schema", get(handlers::table_schema))
        .route("/api/tables/{table}/data", get(handlers::table_data))
        .route("/api/tables/{table}/insert", post(handlers::insert_row))
        .route("/api/tables/{table}/update", put(handlers::update_rows))
        .route("/api/tables/{table}/delete", delete(handlers::delete_rows))
        .route("/api/sql", post(handlers::default_run_sql))
        .route("/api/reports", get(handlers::default_list_reports))
        .route("/api/reports/{report_id}", get(handlers::run_report))
}
