//! Handler模块

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use common::errors::AppError;
use common::extract::JsonBody;
use common::models::{
    DeleteRequest, ReportResult, ReportSummary, Row, SqlOutcome, SqlRequest, TablesResponse,
    UpdateRequest,
};
use common::response::{ErrorBody, MessageResponse};

use crate::state::AppState;

/// 表级路由参数；`db` 缺省时使用默认数据库
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Path)]
pub struct TablePath {
    /// 数据库选择器
    pub db: Option<String>,
    /// 表名
    pub table: String,
}

/// 报表路由参数；`db` 缺省时使用默认数据库
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Path)]
pub struct ReportPath {
    /// 数据库选择器
    pub db: Option<String>,
    /// 报表 ID
    pub report_id: String,
}

/// 列出数据库中的白名单表
#[utoipa::path(
    get,
    path = "/api/{db}/tables",
    tag = "tables",
    params(("db" = String, Path, description = "数据库选择器")),
    responses(
        (status = 200, description = "表列表", body = TablesResponse),
        (status = 400, description = "数据库无效", body = ErrorBody)
    )
)]
pub async fn list_tables(
    State(state): State<AppState>,
    Path(db): Path<String>,
) -> Result<Json<TablesResponse>, AppError> {
    let data = state.service().list_tables(&db).await?;
    Ok(Json(data))
}

pub async fn default_list_tables(
    State(state): State<AppState>,
) -> Result<Json<TablesResponse>, AppError> {
    let db = state.database_or_default(None);
    let data = state.service().list_tables(&db).await?;
    Ok(Json(data))
}

/// 查看表结构
#[utoipa::path(
    get,
    path = "/api/{db}/tables/{table}/schema",
    tag = "tables",
    params(TablePath),
    responses(
        (status = 200, description = "列描述（Field, Type, Null, Key, Default, Extra）"),
        (status = 400, description = "数据库或表无效", body = ErrorBody)
    )
)]
pub async fn table_schema(
    State(state): State<AppState>,
    Path(path): Path<TablePath>,
) -> Result<Json<Vec<Row>>, AppError> {
    let db = state.database_or_default(path.db);
    let data = state.service().table_schema(&db, &path.table).await?;
    Ok(Json(data))
}

/// 查看表数据
#[utoipa::path(
    get,
    path = "/api/{db}/tables/{table}/data",
    tag = "tables",
    params(TablePath),
    responses(
        (status = 200, description = "全部行"),
        (status = 400, description = "数据库或表无效", body = ErrorBody)
    )
)]
pub async fn table_data(
    State(state): State<AppState>,
    Path(path): Path<TablePath>,
) -> Result<Json<Vec<Row>>, AppError> {
    let db = state.database_or_default(path.db);
    let data = state.service().table_data(&db, &path.table).await?;
    Ok(Json(data))
}

/// 插入一行
#[utoipa::path(
    post,
    path = "/api/{db}/tables/{table}/insert",
    tag = "tables",
    params(TablePath),
    responses(
        (status = 201, description = "插入成功", body = MessageResponse),
        (status = 400, description = "请求体为空或无效", body = ErrorBody),
        (status = 409, description = "主键重复或外键约束失败", body = ErrorBody),
        (status = 500, description = "数据库错误", body = ErrorBody)
    )
)]
pub async fn insert_row(
    State(state): State<AppState>,
    Path(path): Path<TablePath>,
    JsonBody(row): JsonBody<Row>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let db = state.database_or_default(path.db);
    let data = state.service().insert(&db, &path.table, &row).await?;
    Ok((StatusCode::CREATED, Json(data)))
}

/// 按条件更新行
#[utoipa::path(
    put,
    path = "/api/{db}/tables/{table}/update",
    tag = "tables",
    params(TablePath),
    request_body = UpdateRequest,
    responses(
        (status = 200, description = "更新成功", body = MessageResponse),
        (status = 400, description = "请求体无效", body = ErrorBody),
        (status = 404, description = "没有匹配的行", body = ErrorBody),
        (status = 409, description = "完整性约束冲突", body = ErrorBody),
        (status = 500, description = "数据库错误", body = ErrorBody)
    )
)]
pub async fn update_rows(
    State(state): State<AppState>,
    Path(path): Path<TablePath>,
    JsonBody(req): JsonBody<UpdateRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let db = state.database_or_default(path.db);
    let data = state.service().update(&db, &path.table, &req).await?;
    Ok(Json(data))
}

/// 按条件删除行
#[utoipa::path(
    delete,
    path = "/api/{db}/tables/{table}/delete",
    tag = "tables",
    params(TablePath),
    request_body = DeleteRequest,
    responses(
        (status = 200, description = "删除成功", body = MessageResponse),
        (status = 400, description = "缺少删除条件", body = ErrorBody),
        (status = 404, description = "没有匹配的行", body = ErrorBody),
        (status = 409, description = "该行仍被其他记录引用", body = ErrorBody),
        (status = 500, description = "数据库错误", body = ErrorBody)
    )
)]
pub async fn delete_rows(
    State(state): State<AppState>,
    Path(path): Path<TablePath>,
    JsonBody(req): JsonBody<DeleteRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let db = state.database_or_default(path.db);
    let data = state.service().delete(&db, &path.table, &req).await?;
    Ok(Json(data))
}

/// 执行自定义 SQL（屏蔽 DROP / TRUNCATE / ALTER）
#[utoipa::path(
    post,
    path = "/api/{db}/sql",
    tag = "sql",
    params(("db" = String, Path, description = "数据库选择器")),
    request_body = SqlRequest,
    responses(
        (status = 200, description = "SELECT 返回行数组，其他语句返回消息"),
        (status = 400, description = "数据库无效或查询为空", body = ErrorBody),
        (status = 403, description = "包含被禁止的关键字", body = ErrorBody)
    )
)]
pub async fn run_sql(
    State(state): State<AppState>,
    Path(db): Path<String>,
    JsonBody(req): JsonBody<SqlRequest>,
) -> Result<Json<SqlOutcome>, AppError> {
    let data = state.service().run_sql(&db, &req).await?;
    Ok(Json(data))
}

pub async fn default_run_sql(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SqlRequest>,
) -> Result<Json<SqlOutcome>, AppError> {
    let db = state.database_or_default(None);
    let data = state.service().run_sql(&db, &req).await?;
    Ok(Json(data))
}

/// 列出数据库的报表
#[utoipa::path(
    get,
    path = "/api/{db}/reports",
    tag = "reports",
    params(("db" = String, Path, description = "数据库选择器")),
    responses(
        (status = 200, description = "报表目录", body = Vec<ReportSummary>),
        (status = 400, description = "数据库无效", body = ErrorBody)
    )
)]
pub async fn list_reports(
    State(state): State<AppState>,
    Path(db): Path<String>,
) -> Result<Json<Vec<ReportSummary>>, AppError> {
    let data = state.service().list_reports(&db)?;
    Ok(Json(data))
}

pub async fn default_list_reports(
    State(state): State<AppState>,
) -> Result<Json<Vec<ReportSummary>>, AppError> {
    let db = state.database_or_default(None);
    let data = state.service().list_reports(&db)?;
    Ok(Json(data))
}

/// 运行报表
#[utoipa::path(
    get,
    path = "/api/{db}/reports/{report_id}",
    tag = "reports",
    params(ReportPath),
    responses(
        (status = 200, description = "报表结果", body = ReportResult),
        (status = 400, description = "数据库无效", body = ErrorBody),
        (status = 404, description = "报表不存在", body = ErrorBody),
        (status = 500, description = "报表执行失败", body = ErrorBody)
    )
)]
pub async fn run_report(
    State(state): State<AppState>,
    Path(path): Path<ReportPath>,
) -> Result<Json<ReportResult>, AppError> {
    let db = state.database_or_default(path.db);
    let data = state.service().run_report(&db, &path.report_id).await?;
    Ok(Json(data))
}

/// 健康检查端点
#[utoipa::path(
    get,
    path = "/",
    tag = "health",
    responses(
        (status = 200, description = "服务运行正常", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: state.config.service_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}
