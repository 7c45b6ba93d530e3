//! Application state for the gateway.

use std::sync::Arc;

use common::config::AppConfig;

use crate::executor::SqlExecutor;
use crate::reports::ReportCatalog;
use crate::service::GatewayService;
use crate::whitelist::Whitelist;

/// Application state shared across handlers. Everything here is read-only
/// after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub whitelist: Arc<Whitelist>,
    pub reports: Arc<ReportCatalog>,
    pub executor: Arc<dyn SqlExecutor>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        config: AppConfig,
        whitelist: Whitelist,
        reports: ReportCatalog,
        executor: Arc<dyn SqlExecutor>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            whitelist: Arc::new(whitelist),
            reports: Arc::new(reports),
            executor,
        }
    }

    /// Builds the request-scoped service.
    pub fn service(&self) -> GatewayService {
        GatewayService::new(
            self.whitelist.clone(),
            self.reports.clone(),
            self.executor.clone(),
        )
    }

    /// Selector for a path, falling back to the default database.
    pub fn database_or_default(&self, db: Option<String>) -> String {
        db.unwrap_or_else(|| self.config.database.default_database.clone())
    }
}
