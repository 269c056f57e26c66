//! Application state for the dashboard service.

use std::sync::Arc;

use common::config::AppConfig;

use crate::service::DashboardService;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub dashboard: Arc<DashboardService>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(config: AppConfig) -> Self {
        Self {
            dashboard: Arc::new(DashboardService::new(&config)),
            config,
        }
    }
}
