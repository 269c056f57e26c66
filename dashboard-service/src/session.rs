//! Session store.
//!
//! One session per end user interaction. A session starts Disconnected,
//! becomes Connected when a handle is attached, and holds that handle until
//! it is replaced by a new connect or the session is torn down. There is no
//! other transition.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::errors::{AppError, AppResult};
use common::models::session::{SessionInfo, SessionState};
use common::utils::IdGenerator;
use tokio::sync::RwLock;

use crate::connection::ConnectionHandle;

struct AttachedConnection {
    handle: ConnectionHandle,
    target: String,
}

struct SessionContext {
    id: String,
    created_at: DateTime<Utc>,
    connection: Option<AttachedConnection>,
}

impl SessionContext {
    fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.id.clone(),
            state: if self.connection.is_some() {
                SessionState::Connected
            } else {
                SessionState::Disconnected
            },
            target: self.connection.as_ref().map(|c| c.target.clone()),
            created_at: self.created_at,
        }
    }
}

/// Process-wide map of live sessions.
pub struct SessionManager {
    sessions: RwLock<HashMap<String, SessionContext>>,
}

impl SessionManager {
    /// Creates an empty session store.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a new disconnected session.
    pub async fn create(&self) -> SessionInfo {
        let context = SessionContext {
            id: IdGenerator::session_id(),
            created_at: Utc::now(),
            connection: None,
        };
        let info = context.info();
        self.sessions.write().await.insert(context.id.clone(), context);
        tracing::info!(session = %info.id, "session created");
        info
    }

    /// Returns the session's status.
    pub async fn info(&self, id: &str) -> AppResult<SessionInfo> {
        self.sessions
            .read()
            .await
            .get(id)
            .map(SessionContext::info)
            .ok_or_else(|| AppError::SessionNotFound(id.to_string()))
    }

    /// Returns the session's connection handle, if one is attached.
    pub async fn connection(&self, id: &str) -> AppResult<Option<ConnectionHandle>> {
        self.sessions
            .read()
            .await
            .get(id)
            .map(|context| context.connection.as_ref().map(|c| c.handle.clone()))
            .ok_or_else(|| AppError::SessionNotFound(id.to_string()))
    }

    /// Attaches a connection handle, returning the handle it replaced.
    pub async fn attach(
        &self,
        id: &str,
        handle: ConnectionHandle,
        target: String,
    ) -> AppResult<Option<ConnectionHandle>> {
        let mut sessions = self.sessions.write().await;
        let context = sessions
            .get_mut(id)
            .ok_or_else(|| AppError::SessionNotFound(id.to_string()))?;
        let replaced = context
            .connection
            .replace(AttachedConnection { handle, target })
            .map(|c| c.handle);
        tracing::info!(session = %id, replaced = replaced.is_some(), "connection attached");
        Ok(replaced)
    }

    /// Removes the session, returning its connection handle if one was
    /// attached.
    pub async fn remove(&self, id: &str) -> AppResult<Option<ConnectionHandle>> {
        let removed = self
            .sessions
            .write()
            .await
            .remove(id)
            .ok_or_else(|| AppError::SessionNotFound(id.to_string()))?;
        tracing::info!(session = %id, "session removed");
        Ok(removed.connection.map(|c| c.handle))
    }

    /// Number of live sessions.
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{stub_handle, StubBackend};

    #[tokio::test]
    async fn test_new_session_is_disconnected() {
        let manager = SessionManager::new();
        let info = manager.create().await;

        assert_eq!(info.state, SessionState::Disconnected);
        assert!(info.target.is_none());
        assert!(manager.connection(&info.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_attach_transitions_to_connected() {
        let manager = SessionManager::new();
        let info = manager.create().await;
        let (handle, _) = stub_handle(StubBackend::new());

        manager
            .attach(&info.id, handle.clone(), "db.example.org/collisions".into())
            .await
            .unwrap();

        let info = manager.info(&info.id).await.unwrap();
        assert_eq!(info.state, SessionState::Connected);
        assert_eq!(info.target.as_deref(), Some("db.example.org/collisions"));

        let attached = manager.connection(&info.id).await.unwrap().unwrap();
        assert_eq!(attached.id(), handle.id());
    }

    #[tokio::test]
    async fn test_attach_returns_replaced_handle() {
        let manager = SessionManager::new();
        let info = manager.create().await;
        let (first, _) = stub_handle(StubBackend::new());
        let (second, _) = stub_handle(StubBackend::new());

        let replaced = manager
            .attach(&info.id, first.clone(), "a".into())
            .await
            .unwrap();
        assert!(replaced.is_none());

        let replaced = manager
            .attach(&info.id, second, "b".into())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(replaced.id(), first.id());
    }

    #[tokio::test]
    async fn test_remove_forgets_the_session() {
        let manager = SessionManager::new();
        let info = manager.create().await;

        manager.remove(&info.id).await.unwrap();
        assert!(manager.info(&info.id).await.is_err());
        assert_eq!(manager.count().await, 0);
    }

    #[tokio::test]
    async fn test_unknown_session_is_an_error() {
        let manager = SessionManager::new();
        assert!(manager.info("missing").await.is_err());
        assert!(manager.remove("missing").await.is_err());
    }
}
