//! Handler模块

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use common::errors::AppError;
use common::models::chart::GroupedBarChart;
use common::models::credentials::ConnectRequest;
use common::models::page::{PageContent, PageSummary};
use common::models::session::SessionInfo;
use common::models::table::QueryTable;
use common::response::ApiResponse;

use crate::state::AppState;

const SERVICE_NAME: &str = "dashboard-service";

/// 创建新会话
#[utoipa::path(
    post,
    path = "/api/sessions",
    tag = "sessions",
    responses(
        (status = 200, description = "会话已创建", body = ApiResponse<SessionInfo>)
    )
)]
pub async fn create_session(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SessionInfo>>, AppError> {
    let data = state.dashboard.create_session().await;
    Ok(Json(ApiResponse::ok_with_service(data, SERVICE_NAME)))
}

/// 查询会话状态
#[utoipa::path(
    get,
    path = "/api/sessions/{id}",
    tag = "sessions",
    params(
        ("id" = String, Path, description = "会话 ID")
    ),
    responses(
        (status = 200, description = "会话状态", body = ApiResponse<SessionInfo>),
        (status = 404, description = "会话未找到")
    )
)]
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<SessionInfo>>, AppError> {
    let data = state.dashboard.session_info(&id).await?;
    Ok(Json(ApiResponse::ok_with_service(data, SERVICE_NAME)))
}

/// 将会话连接到数据库
#[utoipa::path(
    post,
    path = "/api/sessions/{id}/connect",
    tag = "sessions",
    params(
        ("id" = String, Path, description = "会话 ID")
    ),
    request_body = ConnectRequest,
    responses(
        (status = 200, description = "连接成功", body = ApiResponse<SessionInfo>),
        (status = 404, description = "会话未找到"),
        (status = 502, description = "数据库连接失败")
    )
)]
pub async fn connect_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ConnectRequest>,
) -> Result<Json<ApiResponse<SessionInfo>>, AppError> {
    let data = state.dashboard.connect(&id, req).await?;
    Ok(Json(ApiResponse::ok_with_service(data, SERVICE_NAME)))
}

/// 销毁会话
#[utoipa::path(
    delete,
    path = "/api/sessions/{id}",
    tag = "sessions",
    params(
        ("id" = String, Path, description = "会话 ID")
    ),
    responses(
        (status = 200, description = "会话已销毁", body = ApiResponse<bool>),
        (status = 404, description = "会话未找到")
    )
)]
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<bool>>, AppError> {
    state.dashboard.teardown_session(&id).await?;
    Ok(Json(ApiResponse::ok_with_service(true, SERVICE_NAME)))
}

/// 加载分析标签页的对比图表
#[utoipa::path(
    get,
    path = "/api/sessions/{id}/analysis/{tab}",
    tag = "analysis",
    params(
        ("id" = String, Path, description = "会话 ID"),
        ("tab" = String, Path, description = "分析标签页 ID")
    ),
    responses(
        (status = 200, description = "对比图表", body = ApiResponse<ComparisonResponse>),
        (status = 404, description = "会话或标签页未找到"),
        (status = 409, description = "会话尚未连接数据库"),
        (status = 502, description = "查询执行失败")
    )
)]
pub async fn load_analysis(
    State(state): State<AppState>,
    Path((id, tab)): Path<(String, String)>,
) -> Result<Json<ApiResponse<ComparisonResponse>>, AppError> {
    let result = state.dashboard.load_chart(&id, &tab).await?;
    Ok(Json(ApiResponse::ok_with_service(
        ComparisonResponse {
            tab: result.spec.id.to_string(),
            title: result.spec.title.to_string(),
            table: result.table,
            chart: result.chart,
        },
        SERVICE_NAME,
    )))
}

/// 列出分析标签页目录
#[utoipa::path(
    get,
    path = "/api/analysis/tabs",
    tag = "analysis",
    responses(
        (status = 200, description = "标签页目录", body = ApiResponse<Vec<AnalysisTabInfo>>)
    )
)]
pub async fn list_tabs(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<AnalysisTabInfo>>>, AppError> {
    let data = state
        .dashboard
        .tabs()
        .iter()
        .map(|spec| AnalysisTabInfo {
            id: spec.id.to_string(),
            title: spec.title.to_string(),
            description: spec.description.to_string(),
        })
        .collect();
    Ok(Json(ApiResponse::ok_with_service(data, SERVICE_NAME)))
}

/// 列出全部页面
#[utoipa::path(
    get,
    path = "/api/pages",
    tag = "pages",
    responses(
        (status = 200, description = "页面目录", body = ApiResponse<Vec<PageSummary>>)
    )
)]
pub async fn list_pages(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<PageSummary>>>, AppError> {
    Ok(Json(ApiResponse::ok_with_service(
        state.dashboard.pages(),
        SERVICE_NAME,
    )))
}

/// 渲染指定页面
#[utoipa::path(
    get,
    path = "/api/pages/{id}",
    tag = "pages",
    params(
        ("id" = String, Path, description = "页面 ID")
    ),
    responses(
        (status = 200, description = "页面内容", body = ApiResponse<PageContent>),
        (status = 404, description = "页面未找到")
    )
)]
pub async fn get_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<PageContent>>, AppError> {
    let data = state.dashboard.page(&id)?;
    Ok(Json(ApiResponse::ok_with_service(data, SERVICE_NAME)))
}

/// 健康检查端点
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "服务运行正常", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        sessions: state.dashboard.session_count().await,
    })
}

/// 对比分析响应
#[derive(Serialize, ToSchema)]
pub struct ComparisonResponse {
    /// 标签页 ID
    pub tab: String,
    /// 标签页标题
    pub title: String,
    /// 合并后的对比表
    pub table: QueryTable,
    /// 分组柱状图描述
    pub chart: GroupedBarChart,
}

/// 分析标签页信息
#[derive(Serialize, ToSchema)]
pub struct AnalysisTabInfo {
    /// 标签页 ID
    pub id: String,
    /// 标签页标题
    pub title: String,
    /// 标签页说明
    pub description: String,
}

/// 健康检查响应
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// 服务状态
    pub status: String,
    /// 服务名称
    pub service: String,
    /// 服务版本
    pub version: String,
    /// 当前时间戳
    pub timestamp: DateTime<Utc>,
    /// 当前会话数量
    pub sessions: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline;
    use crate::routes;
    use crate::service::DashboardService;
    use crate::testing::{collision_counts, StubConnector};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use common::config::AppConfig;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        let spec = pipeline::find_tab("wet-vs-dry").unwrap();
        let connector = StubConnector::default()
            .with_table(
                &spec.left.query(spec.group_key).unwrap(),
                collision_counts("rdsurf", "count_wet", &[("1", 10)]),
            )
            .with_table(
                &spec.right.query(spec.group_key).unwrap(),
                collision_counts("rdsurf", "count_dry", &[("1", 5)]),
            );
        let config = AppConfig::load_with_service("dashboard-service");
        let state = crate::state::AppState {
            dashboard: Arc::new(DashboardService::with_connector(
                Arc::new(connector),
                &config,
            )),
            config,
        };
        routes::router().with_state(state)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        (status, body_json(response).await)
    }

    fn post(uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json");
        match body {
            Some(json) => builder.body(Body::from(json.to_string())).unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn connect_body() -> Value {
        json!({
            "db_type": "mysql",
            "host": "db.example.org",
            "username": "analyst",
            "password": "pw",
            "database": "collisions"
        })
    }

    #[tokio::test]
    async fn test_guarded_flow_connect_then_load() {
        let app = app();

        let (status, created) = send(&app, post("/api/sessions", None)).await;
        assert_eq!(status, StatusCode::OK);
        let session_id = created["data"]["id"].as_str().unwrap().to_string();
        assert_eq!(created["data"]["state"], "disconnected");

        // loading before connecting short-circuits to the guidance error
        let uri = format!("/api/sessions/{}/analysis/wet-vs-dry", session_id);
        let (status, guarded) = send(&app, get(&uri)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(guarded["success"], false);
        assert_eq!(guarded["error"]["code"], "NOT_CONNECTED");

        let (status, connected) = send(
            &app,
            post(
                &format!("/api/sessions/{}/connect", session_id),
                Some(connect_body()),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(connected["data"]["state"], "connected");

        let (status, loaded) = send(&app, get(&uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(loaded["success"], true);
        assert_eq!(loaded["data"]["chart"]["groups"].as_array().unwrap().len(), 2);
        assert_eq!(loaded["data"]["table"]["row_count"], 2);
    }

    #[tokio::test]
    async fn test_unknown_tab_is_not_found() {
        let app = app();

        let (_, created) = send(&app, post("/api/sessions", None)).await;
        let session_id = created["data"]["id"].as_str().unwrap().to_string();
        send(
            &app,
            post(
                &format!("/api/sessions/{}/connect", session_id),
                Some(connect_body()),
            ),
        )
        .await;

        let uri = format!("/api/sessions/{}/analysis/speed-limits", session_id);
        let (status, body) = send(&app, get(&uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "TAB_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_pages_and_tab_catalog_are_served() {
        let app = app();

        let (status, pages) = send(&app, get("/api/pages")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(pages["data"].as_array().unwrap().len(), 4);

        let (status, page) = send(&app, get("/api/pages/introduction")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(page["data"]["body"]
            .as_str()
            .unwrap()
            .contains("Rear-end collisions"));

        let (status, tabs) = send(&app, get("/api/analysis/tabs")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(tabs["data"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_health_reports_session_count() {
        let app = app();
        send(&app, post("/api/sessions", None)).await;

        let (status, health) = send(&app, get("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(health["status"], "healthy");
        assert_eq!(health["sessions"], 1);
    }
}
