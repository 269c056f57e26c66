//! 路由模块

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::state::AppState;

/// 创建看板服务路由
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/sessions", post(handlers::create_session))
        .route(
            "/api/sessions/{id}",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .route("/api/sessions/{id}/connect", post(handlers::connect_session))
        .route(
            "/api/sessions/{id}/analysis/{tab}",
            get(handlers::load_analysis),
        )
        .route("/api/analysis/tabs", get(handlers::list_tabs))
        .route("/api/pages", get(handlers::list_pages))
        .route("/api/pages/{id}", get(handlers::get_page))
        .route("/api/health", get(handlers::health_check))
}
