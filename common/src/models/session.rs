//! Session models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Connection state of a session.
///
/// The only transition is Disconnected -> Connected on a successful connect;
/// a session returns to Disconnected only through teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No live connection handle attached.
    Disconnected,
    /// A live connection handle is attached.
    Connected,
}

/// Session status returned to the client.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionInfo {
    /// Session identifier.
    pub id: String,
    /// Current connection state.
    pub state: SessionState,
    /// Connection target label once connected (never includes secrets).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Session creation timestamp.
    pub created_at: DateTime<Utc>,
}
