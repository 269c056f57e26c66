//! Query executor.
//!
//! Runs statements through a connection handle's backend and memoizes the
//! materialized tables by `(handle id, exact statement text)`. Any change in
//! the statement text bypasses the cache. Failed fetches are never cached,
//! so a retry after a transient error hits the database again.

use std::collections::HashMap;

use common::errors::AppResult;
use common::models::table::QueryTable;
use tokio::sync::RwLock;

use crate::connection::ConnectionHandle;

type CacheKey = (String, String);

/// Keyed cache of query results.
pub struct QueryExecutor {
    results: RwLock<HashMap<CacheKey, QueryTable>>,
}

impl QueryExecutor {
    /// Creates an executor with an empty cache.
    pub fn new() -> Self {
        Self {
            results: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the cached table for `(handle, statement)`, or fetches it
    /// through the handle's backend and caches the result.
    pub async fn run(&self, handle: &ConnectionHandle, statement: &str) -> AppResult<QueryTable> {
        let key = (handle.id().to_string(), statement.to_string());

        if let Some(table) = self.results.read().await.get(&key) {
            tracing::debug!(handle = %handle.id(), "query cache hit");
            return Ok(table.clone());
        }

        let table = handle.backend().fetch(statement).await?;
        tracing::info!(
            handle = %handle.id(),
            rows = table.row_count,
            "query executed"
        );

        self.results.write().await.insert(key, table.clone());
        Ok(table)
    }

    /// Drops every cached result belonging to a handle.
    pub async fn evict_handle(&self, handle_id: &str) {
        let mut results = self.results.write().await;
        let before = results.len();
        results.retain(|(hid, _), _| hid != handle_id);
        let dropped = before - results.len();
        if dropped > 0 {
            tracing::debug!(handle = %handle_id, dropped, "query results evicted");
        }
    }

    /// Number of cached results (all handles).
    pub async fn cached_count(&self) -> usize {
        self.results.read().await.len()
    }
}

impl Default for QueryExecutor {
    fn default() -> Self {
        Self::new()
    }
}
