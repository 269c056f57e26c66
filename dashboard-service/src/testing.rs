//! Test doubles for the connector and query backend seams.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use common::errors::{AppError, AppResult};
use common::models::credentials::{ConnectRequest, DbType};
use common::models::table::{ColumnInfo, QueryTable};
use serde_json::json;

use crate::connection::{ConnectionHandle, Connector, QueryBackend};

/// Builds a (grouping key, count) table like the aggregate queries return.
pub fn collision_counts(key: &str, count_column: &str, rows: &[(&str, i64)]) -> QueryTable {
    QueryTable::from_parts(
        vec![
            ColumnInfo::new(key, "varchar"),
            ColumnInfo::new(count_column, "bigint"),
        ],
        rows.iter().map(|(k, v)| vec![json!(k), json!(v)]).collect(),
    )
}

/// A credential tuple for tests.
pub fn stub_request() -> ConnectRequest {
    ConnectRequest {
        db_type: DbType::MySQL,
        host: Some("db.example.org".into()),
        port: None,
        username: Some("analyst".into()),
        password: Some("pw".into()),
        database: Some("collisions".into()),
        file_path: None,
    }
}

/// In-memory query backend: serves fixed tables per statement and counts
/// every fetch that reaches it.
pub struct StubBackend {
    tables: HashMap<String, QueryTable>,
    failures: HashMap<String, String>,
    fetches: Arc<AtomicUsize>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
            failures: HashMap::new(),
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Serves `table` for the exact statement text.
    pub fn with_table(mut self, statement: &str, table: QueryTable) -> Self {
        self.tables.insert(statement.to_string(), table);
        self
    }

    /// Fails the exact statement text with a query error.
    pub fn with_failure(mut self, statement: &str, message: &str) -> Self {
        self.failures
            .insert(statement.to_string(), message.to_string());
        self
    }

    fn with_shared_counter(mut self, fetches: Arc<AtomicUsize>) -> Self {
        self.fetches = fetches;
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryBackend for StubBackend {
    async fn fetch(&self, statement: &str) -> AppResult<QueryTable> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.failures.get(statement) {
            return Err(AppError::DatabaseQuery(message.clone()));
        }
        self.tables
            .get(statement)
            .cloned()
            .ok_or_else(|| AppError::DatabaseQuery(format!("unexpected statement: {}", statement)))
    }
}

/// Wraps a stub backend into a connection handle, keeping the backend
/// reachable for assertions.
pub fn stub_handle(backend: StubBackend) -> (ConnectionHandle, Arc<StubBackend>) {
    let backend = Arc::new(backend);
    (ConnectionHandle::new(backend.clone()), backend)
}

/// Connector double: every open yields a fresh stub backend serving the
/// configured tables. Opens and fetches are counted across all backends.
pub struct StubConnector {
    tables: HashMap<String, QueryTable>,
    failures: HashMap<String, String>,
    connect_error: Option<String>,
    opens: AtomicUsize,
    fetches: Arc<AtomicUsize>,
}

impl Default for StubConnector {
    fn default() -> Self {
        Self {
            tables: HashMap::new(),
            failures: HashMap::new(),
            connect_error: None,
            opens: AtomicUsize::new(0),
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl StubConnector {
    pub fn with_table(mut self, statement: &str, table: QueryTable) -> Self {
        self.tables.insert(statement.to_string(), table);
        self
    }

    pub fn with_failure(mut self, statement: &str, message: &str) -> Self {
        self.failures
            .insert(statement.to_string(), message.to_string());
        self
    }

    /// Makes every open fail with a connection error.
    pub fn with_connect_error(mut self, message: &str) -> Self {
        self.connect_error = Some(message.to_string());
        self
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Fetches across every backend this connector has opened.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for StubConnector {
    async fn open(&self, _req: &ConnectRequest) -> AppResult<ConnectionHandle> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.connect_error {
            return Err(AppError::DatabaseConnection(message.clone()));
        }

        let mut backend = StubBackend::new().with_shared_counter(self.fetches.clone());
        for (statement, table) in &self.tables {
            backend = backend.with_table(statement, table.clone());
        }
        for (statement, message) in &self.failures {
            backend = backend.with_failure(statement, message);
        }
        Ok(ConnectionHandle::new(Arc::new(backend)))
    }
}
