//! 多数据库 REST 网关
//!
//! 通过 HTTP 暴露白名单内的 MySQL 数据库，提供以下功能：
//! - 表的列举、结构与数据浏览
//! - 参数化的插入、更新、删除
//! - 带关键字屏蔽的自定义 SQL
//! - 预定义报表

mod executor;
mod handlers;
mod pool_manager;
mod query_builder;
mod reports;
mod routes;
mod service;
mod state;
#[cfg(test)]
mod testing;
mod whitelist;

use std::sync::Arc;

use anyhow::Context;
use axum::{middleware, routing::get, Json, Router};
use common::config::{load_dotenv, AppConfig};
use common::middleware::request_id::request_id_middleware;
use pool_manager::PoolManager;
use reports::ReportCatalog;
use state::AppState;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use whitelist::Whitelist;

const SERVICE_NAME: &str = "db-gateway";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "数据库网关 API",
        version = "0.1.0",
        description = "白名单 MySQL 数据库的 REST 网关"
    ),
    paths(
        handlers::health_check,
        handlers::list_tables,
        handlers::table_schema,
        handlers::table_data,
        handlers::insert_row,
        handlers::update_rows,
        handlers::delete_rows,
        handlers::run_sql,
        handlers::list_reports,
        handlers::run_report,
    ),
    components(schemas(
        common::models::TablesResponse,
        common::models::UpdateRequest,
        common::models::DeleteRequest,
        common::models::SqlRequest,
        common::models::ReportSummary,
        common::models::ReportResult,
        common::response::MessageResponse,
        common::response::ErrorBody,
        handlers::HealthResponse,
    )),
    tags(
        (name = "tables", description = "表操作端点"),
        (name = "sql", description = "自定义 SQL 端点"),
        (name = "reports", description = "报表端点"),
        (name = "health", description = "健康检查端点")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 中的值不覆盖已有环境变量
    load_dotenv();

    // 初始化日志追踪
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // 加载配置
    let config = AppConfig::load_with_service(SERVICE_NAME);
    info!(database = ?config.database, "配置已加载");

    let whitelist = Whitelist::builtin().map_err(anyhow::Error::msg)?;
    if whitelist.database(&config.database.default_database).is_err() {
        anyhow::bail!(
            "DB_NAME `{}` is not a whitelisted database",
            config.database.default_database
        );
    }
    let reports = ReportCatalog::builtin();

    // 连接池延迟建立，启动时不连接数据库
    let pools = Arc::new(PoolManager::new(&config.database, whitelist.selectors()));

    // 创建应用状态
    let addr = config.bind_address();
    let state = AppState::new(config, whitelist, reports, pools.clone());

    // 创建路由
    let app = create_router(state);

    // 启动服务
    info!(service = SERVICE_NAME, address = %addr, "启动数据库网关");

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("绑定地址失败: {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("服务运行失败")?;

    pools.close().await;
    info!(service = SERVICE_NAME, "服务已停止");
    Ok(())
}

fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::router())
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "无法监听关闭信号");
        std::future::pending::<()>().await;
    }
    info!("收到关闭信号");
}
