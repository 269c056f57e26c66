//! Database connections and query backends.
//!
//! A [`ConnectionHandle`] is a cloneable reference to one open database
//! target; its identity is the `Arc` behind it. The [`Connector`] and
//! [`QueryBackend`] traits are the seams between the dashboard logic and
//! sqlx, so tests can substitute stubs for both.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::config::AppConfig;
use common::errors::{AppError, AppResult};
use common::models::credentials::{ConnectRequest, DbType};
use common::models::table::{ColumnInfo, QueryTable};
use common::utils::sql;
use common::utils::IdGenerator;
use serde_json::Value;
use sqlx::mysql::{MySqlPoolOptions, MySqlRow};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Column, MySqlPool, PgPool, Row, SqlitePool, TypeInfo};

/// Executes statements against one open database target.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// Executes the statement, materializes all rows eagerly, and derives
    /// column names from the result metadata.
    async fn fetch(&self, sql: &str) -> AppResult<QueryTable>;
}

/// Opens a connection for a credential tuple.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens a new connection to the requested target.
    async fn open(&self, req: &ConnectRequest) -> AppResult<ConnectionHandle>;
}

/// A live connection to one database target.
///
/// Cloning shares the underlying backend; two handles are the same
/// connection exactly when they share the backend `Arc`.
#[derive(Clone)]
pub struct ConnectionHandle {
    id: String,
    backend: Arc<dyn QueryBackend>,
}

impl ConnectionHandle {
    /// Wraps a backend into a handle with a fresh identity.
    pub fn new(backend: Arc<dyn QueryBackend>) -> Self {
        Self {
            id: IdGenerator::handle_id(),
            backend,
        }
    }

    /// Handle identity, used as a cache key by the query executor.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The backend this handle wraps.
    pub fn backend(&self) -> &Arc<dyn QueryBackend> {
        &self.backend
    }

    /// True when both handles refer to the same open connection.
    pub fn same_connection(a: &ConnectionHandle, b: &ConnectionHandle) -> bool {
        Arc::ptr_eq(&a.backend, &b.backend)
    }
}

impl std::fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("id", &self.id)
            .finish()
    }
}

/// Connection pool wrapper for the supported database types.
pub enum DatabasePool {
    /// MySQL connection pool.
    MySQL(MySqlPool),
    /// PostgreSQL connection pool.
    Postgres(PgPool),
    /// SQLite connection pool.
    SQLite(SqlitePool),
}

/// Opens sqlx pools from credential tuples.
pub struct SqlConnector {
    connect_timeout: Duration,
    max_connections: u32,
}

impl SqlConnector {
    /// Creates a connector using the service configuration.
    pub fn new(config: &AppConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            max_connections: config.max_connections,
        }
    }
}

#[async_trait]
impl Connector for SqlConnector {
    async fn open(&self, req: &ConnectRequest) -> AppResult<ConnectionHandle> {
        let pool = match req.db_type {
            DbType::MySQL => {
                let url = build_mysql_url(req)?;
                let pool = MySqlPoolOptions::new()
                    .max_connections(self.max_connections)
                    .acquire_timeout(self.connect_timeout)
                    .connect(&url)
                    .await
                    .map_err(|e| AppError::DatabaseConnection(e.to_string()))?;
                DatabasePool::MySQL(pool)
            }
            DbType::Postgres => {
                let url = build_postgres_url(req)?;
                let pool = PgPoolOptions::new()
                    .max_connections(self.max_connections)
                    .acquire_timeout(self.connect_timeout)
                    .connect(&url)
                    .await
                    .map_err(|e| AppError::DatabaseConnection(e.to_string()))?;
                DatabasePool::Postgres(pool)
            }
            DbType::SQLite => {
                let path = req
                    .file_path
                    .as_deref()
                    .ok_or_else(|| AppError::Validation("SQLite requires file_path".into()))?;
                let url = format!("sqlite:{}?mode=ro", path);
                let pool = SqlitePoolOptions::new()
                    .max_connections(1)
                    .connect(&url)
                    .await
                    .map_err(|e| AppError::DatabaseConnection(e.to_string()))?;
                DatabasePool::SQLite(pool)
            }
        };

        Ok(ConnectionHandle::new(Arc::new(SqlBackend { pool })))
    }
}

/// Query backend over a sqlx pool.
pub struct SqlBackend {
    pool: DatabasePool,
}

#[async_trait]
impl QueryBackend for SqlBackend {
    async fn fetch(&self, statement: &str) -> AppResult<QueryTable> {
        sql::ensure_select(statement)?;

        match &self.pool {
            DatabasePool::MySQL(pool) => {
                let rows = sqlx::query(statement)
                    .fetch_all(pool)
                    .await
                    .map_err(|e| AppError::DatabaseQuery(e.to_string()))?;
                Ok(mysql_table(rows))
            }
            DatabasePool::Postgres(pool) => {
                let rows = sqlx::query(statement)
                    .fetch_all(pool)
                    .await
                    .map_err(|e| AppError::DatabaseQuery(e.to_string()))?;
                Ok(postgres_table(rows))
            }
            DatabasePool::SQLite(pool) => {
                let rows = sqlx::query(statement)
                    .fetch_all(pool)
                    .await
                    .map_err(|e| AppError::DatabaseQuery(e.to_string()))?;
                Ok(sqlite_table(rows))
            }
        }
    }
}

// ============== URL Builders ==============

// No credential is ever defaulted here: a missing required field is a
// validation error, not a fallback to a built-in account.

fn build_mysql_url(req: &ConnectRequest) -> AppResult<String> {
    let host = req
        .host
        .as_deref()
        .ok_or_else(|| AppError::Validation("MySQL requires host".into()))?;
    let port = req.port.unwrap_or(3306);
    let username = req
        .username
        .as_deref()
        .ok_or_else(|| AppError::Validation("MySQL requires username".into()))?;
    let password = req.password.as_deref().unwrap_or("");
    let database = req
        .database
        .as_deref()
        .ok_or_else(|| AppError::Validation("MySQL requires database".into()))?;

    Ok(format!(
        "mysql://{}:{}@{}:{}/{}",
        username, password, host, port, database
    ))
}

fn build_postgres_url(req: &ConnectRequest) -> AppResult<String> {
    let host = req
        .host
        .as_deref()
        .ok_or_else(|| AppError::Validation("PostgreSQL requires host".into()))?;
    let port = req.port.unwrap_or(5432);
    let username = req
        .username
        .as_deref()
        .ok_or_else(|| AppError::Validation("PostgreSQL requires username".into()))?;
    let password = req.password.as_deref().unwrap_or("");
    let database = req
        .database
        .as_deref()
        .ok_or_else(|| AppError::Validation("PostgreSQL requires database".into()))?;

    Ok(format!(
        "postgres://{}:{}@{}:{}/{}",
        username, password, host, port, database
    ))
}

// ============== Row Decoding ==============

fn mysql_table(rows: Vec<MySqlRow>) -> QueryTable {
    let Some(first) = rows.first() else {
        return QueryTable::empty();
    };
    let columns: Vec<ColumnInfo> = first
        .columns()
        .iter()
        .map(|c| ColumnInfo::new(c.name(), c.type_info().name().to_lowercase()))
        .collect();
    let data = rows
        .iter()
        .map(|row| (0..columns.len()).map(|i| mysql_value(row, i)).collect())
        .collect();
    QueryTable::from_parts(columns, data)
}

fn mysql_value(row: &MySqlRow, idx: usize) -> Value {
    if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<u64>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    Value::Null
}

fn postgres_table(rows: Vec<PgRow>) -> QueryTable {
    let Some(first) = rows.first() else {
        return QueryTable::empty();
    };
    let columns: Vec<ColumnInfo> = first
        .columns()
        .iter()
        .map(|c| ColumnInfo::new(c.name(), c.type_info().name().to_lowercase()))
        .collect();
    let data = rows
        .iter()
        .map(|row| (0..columns.len()).map(|i| postgres_value(row, i)).collect())
        .collect();
    QueryTable::from_parts(columns, data)
}

fn postgres_value(row: &PgRow, idx: usize) -> Value {
    if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<i32>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    Value::Null
}

fn sqlite_table(rows: Vec<SqliteRow>) -> QueryTable {
    let Some(first) = rows.first() else {
        return QueryTable::empty();
    };
    let columns: Vec<ColumnInfo> = first
        .columns()
        .iter()
        .map(|c| ColumnInfo::new(c.name(), c.type_info().name().to_lowercase()))
        .collect();
    let data = rows
        .iter()
        .map(|row| (0..columns.len()).map(|i| sqlite_value(row, i)).collect())
        .collect();
    QueryTable::from_parts(columns, data)
}

fn sqlite_value(row: &SqliteRow, idx: usize) -> Value {
    if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    Value::Null
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::models::credentials::DbType;

    fn mysql_request() -> ConnectRequest {
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

    #[test]
    fn test_mysql_url_uses_default_port() {
        let url = build_mysql_url(&mysql_request()).unwrap();
        assert_eq!(url, "mysql://analyst:pw@db.example.org:3306/collisions");
    }

    #[test]
    fn test_missing_username_is_not_defaulted() {
        let mut req = mysql_request();
        req.username = None;
        assert!(build_mysql_url(&req).is_err());

        req.db_type = DbType::Postgres;
        assert!(build_postgres_url(&req).is_err());
    }

    #[test]
    fn test_missing_host_fails() {
        let mut req = mysql_request();
        req.host = None;
        assert!(build_mysql_url(&req).is_err());
    }

    #[test]
    fn test_handle_identity_follows_backend_arc() {
        struct NullBackend;

        #[async_trait]
        impl QueryBackend for NullBackend {
            async fn fetch(&self, _sql: &str) -> AppResult<QueryTable> {
                Ok(QueryTable::empty())
            }
        }

        let backend: Arc<dyn QueryBackend> = Arc::new(NullBackend);
        let a = ConnectionHandle::new(backend.clone());
        let b = a.clone();
        let c = ConnectionHandle::new(backend);

        assert!(ConnectionHandle::same_connection(&a, &b));
        assert_eq!(a.id(), b.id());
        // same backend wrapped twice is still the same connection
        assert!(ConnectionHandle::same_connection(&a, &c));
        assert_ne!(a.id(), c.id());
    }
}
