//! Connection provider.
//!
//! Memoizes open connections by `(session id, credential tuple)`. Scoping the
//! key to the session means two sessions presenting identical credentials get
//! distinct connections; within one session, repeating the same tuple returns
//! the cached handle without re-opening anything. Entries live until the
//! owning session replaces or tears down its connection.

use std::collections::HashMap;
use std::sync::Arc;

use common::errors::AppResult;
use common::models::credentials::{ConnectRequest, CredentialKey};
use tokio::sync::RwLock;

use crate::connection::{ConnectionHandle, Connector};

type CacheKey = (String, CredentialKey);

/// Keyed cache of open connection handles.
pub struct ConnectionProvider {
    connector: Arc<dyn Connector>,
    handles: RwLock<HashMap<CacheKey, ConnectionHandle>>,
}

impl ConnectionProvider {
    /// Creates a provider that opens connections through the given connector.
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            handles: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the cached handle for this session and credential tuple, or
    /// opens a new connection and caches it.
    pub async fn get_or_open(
        &self,
        session_id: &str,
        req: &ConnectRequest,
    ) -> AppResult<ConnectionHandle> {
        let key = (session_id.to_string(), req.credential_key());

        if let Some(handle) = self.handles.read().await.get(&key) {
            tracing::debug!(session = %session_id, handle = %handle.id(), "connection cache hit");
            return Ok(handle.clone());
        }

        let handle = self.connector.open(req).await?;
        tracing::info!(
            session = %session_id,
            handle = %handle.id(),
            target = %req.target_label(),
            "connection opened"
        );

        // Two concurrent connects with the same tuple may race; the first
        // insert wins and the loser's pool is dropped.
        let mut handles = self.handles.write().await;
        Ok(handles.entry(key).or_insert(handle).clone())
    }

    /// Removes one cached entry of a session by handle identity.
    pub async fn evict_handle(&self, session_id: &str, handle_id: &str) {
        let mut handles = self.handles.write().await;
        handles.retain(|(sid, _), handle| sid != session_id || handle.id() != handle_id);
    }

    /// Removes every cached entry of a session, returning the removed
    /// handle ids so the caller can drop dependent caches.
    pub async fn evict_session(&self, session_id: &str) -> Vec<String> {
        let mut handles = self.handles.write().await;
        let removed: Vec<String> = handles
            .iter()
            .filter(|((sid, _), _)| sid == session_id)
            .map(|(_, handle)| handle.id().to_string())
            .collect();
        handles.retain(|(sid, _), _| sid != session_id);
        if !removed.is_empty() {
            tracing::info!(session = %session_id, count = removed.len(), "connections evicted");
        }
        removed
    }

    /// Number of cached connections (all sessions).
    pub async fn cached_count(&self) -> usize {
        self.handles.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionHandle;
    use crate::testing::{stub_request, StubConnector};

    #[tokio::test]
    async fn test_same_tuple_returns_reference_identical_handle() {
        let connector = Arc::new(StubConnector::default());
        let provider = ConnectionProvider::new(connector.clone());

        let first = provider.get_or_open("s1", &stub_request()).await.unwrap();
        let second = provider.get_or_open("s1", &stub_request()).await.unwrap();

        assert!(ConnectionHandle::same_connection(&first, &second));
        assert_eq!(first.id(), second.id());
        assert_eq!(connector.open_count(), 1);
    }

    #[tokio::test]
    async fn test_sessions_do_not_share_connections() {
        let connector = Arc::new(StubConnector::default());
        let provider = ConnectionProvider::new(connector.clone());

        let a = provider.get_or_open("s1", &stub_request()).await.unwrap();
        let b = provider.get_or_open("s2", &stub_request()).await.unwrap();

        assert!(!ConnectionHandle::same_connection(&a, &b));
        assert_eq!(connector.open_count(), 2);
    }

    #[tokio::test]
    async fn test_changed_tuple_opens_a_new_connection() {
        let connector = Arc::new(StubConnector::default());
        let provider = ConnectionProvider::new(connector.clone());

        let mut other = stub_request();
        other.database = Some("collisions_2017".into());

        let a = provider.get_or_open("s1", &stub_request()).await.unwrap();
        let b = provider.get_or_open("s1", &other).await.unwrap();

        assert!(!ConnectionHandle::same_connection(&a, &b));
        assert_eq!(connector.open_count(), 2);
    }

    #[tokio::test]
    async fn test_eviction_forces_reopen() {
        let connector = Arc::new(StubConnector::default());
        let provider = ConnectionProvider::new(connector.clone());

        let first = provider.get_or_open("s1", &stub_request()).await.unwrap();
        let removed = provider.evict_session("s1").await;
        assert_eq!(removed, vec![first.id().to_string()]);
        assert_eq!(provider.cached_count().await, 0);

        let second = provider.get_or_open("s1", &stub_request()).await.unwrap();
        assert!(!ConnectionHandle::same_connection(&first, &second));
        assert_eq!(connector.open_count(), 2);
    }
}
