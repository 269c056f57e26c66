//! 看板业务服务模块
//!
//! 将会话、连接缓存、查询缓存与对比分析流水线组合为一个服务入口，
//! 供 HTTP 处理器调用。

use std::sync::Arc;

use common::config::AppConfig;
use common::errors::{AppError, AppResult};
use common::models::chart::GroupedBarChart;
use common::models::credentials::ConnectRequest;
use common::models::page::{PageContent, PageSummary};
use common::models::session::SessionInfo;
use common::models::table::QueryTable;
use validator::Validate;

use crate::connection::{Connector, SqlConnector};
use crate::executor::QueryExecutor;
use crate::pages::PageRegistry;
use crate::pipeline::{self, ComparisonSpec};
use crate::provider::ConnectionProvider;
use crate::session::SessionManager;

/// 一次对比分析的完整结果
#[derive(Debug)]
pub struct ComparisonResult {
    /// 分析标签页定义
    pub spec: &'static ComparisonSpec,
    /// 合并后的对比表
    pub table: QueryTable,
    /// 分组柱状图描述
    pub chart: GroupedBarChart,
}

/// 碰撞数据看板服务
pub struct DashboardService {
    provider: ConnectionProvider,
    executor: QueryExecutor,
    sessions: SessionManager,
    pages: PageRegistry,
}

impl DashboardService {
    /// 创建使用 sqlx 连接器的服务实例
    pub fn new(config: &AppConfig) -> Self {
        Self::with_connector(Arc::new(SqlConnector::new(config)), config)
    }

    /// 创建使用指定连接器的服务实例（测试注入点）
    pub fn with_connector(connector: Arc<dyn Connector>, config: &AppConfig) -> Self {
        Self {
            provider: ConnectionProvider::new(connector),
            executor: QueryExecutor::new(),
            sessions: SessionManager::new(),
            pages: PageRegistry::new(config.data_dir.clone()),
        }
    }

    /// 创建新会话
    pub async fn create_session(&self) -> SessionInfo {
        self.sessions.create().await
    }

    /// 查询会话状态
    pub async fn session_info(&self, session_id: &str) -> AppResult<SessionInfo> {
        self.sessions.info(session_id).await
    }

    /// 将会话连接到数据库
    ///
    /// 相同凭据重复连接复用缓存的连接；凭据变化时替换连接，
    /// 并丢弃旧连接的全部缓存。
    pub async fn connect(&self, session_id: &str, req: ConnectRequest) -> AppResult<SessionInfo> {
        req.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        // 会话必须已存在，才会尝试打开任何连接
        self.sessions.info(session_id).await?;

        let handle = self.provider.get_or_open(session_id, &req).await?;
        let replaced = self
            .sessions
            .attach(session_id, handle.clone(), req.target_label())
            .await?;

        if let Some(old) = replaced {
            if old.id() != handle.id() {
                self.provider.evict_handle(session_id, old.id()).await;
                self.executor.evict_handle(old.id()).await;
            }
        }

        self.sessions.info(session_id).await
    }

    /// 销毁会话并释放其全部缓存
    pub async fn teardown_session(&self, session_id: &str) -> AppResult<()> {
        self.sessions.remove(session_id).await?;
        for handle_id in self.provider.evict_session(session_id).await {
            self.executor.evict_handle(&handle_id).await;
        }
        Ok(())
    }

    /// 加载一个分析标签页的对比图表
    ///
    /// 会话未连接时直接返回指引错误，不触发任何查询。
    pub async fn load_chart(&self, session_id: &str, tab_id: &str) -> AppResult<ComparisonResult> {
        let spec = pipeline::find_tab(tab_id)?;

        let handle = self
            .sessions
            .connection(session_id)
            .await?
            .ok_or(AppError::NotConnected)?;

        let (table, chart) = pipeline::run_comparison(&self.executor, &handle, spec).await?;
        Ok(ComparisonResult { spec, table, chart })
    }

    /// 分析标签页目录
    pub fn tabs(&self) -> &'static [ComparisonSpec] {
        &pipeline::TABS
    }

    /// 页面目录
    pub fn pages(&self) -> Vec<PageSummary> {
        self.pages.list()
    }

    /// 渲染指定页面
    pub fn page(&self, id: &str) -> AppResult<PageContent> {
        self.pages.render(id)
    }

    /// 当前会话数量
    pub async fn session_count(&self) -> usize {
        self.sessions.count().await
    }
}
