//! Connection credential models.
//!
//! A credential tuple identifies one connection target. It is supplied per
//! session through the connect endpoint; nothing in the repository ships
//! default credentials.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Database type enumeration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    /// MySQL database.
    MySQL,
    /// PostgreSQL database.
    Postgres,
    /// SQLite database.
    SQLite,
}

impl DbType {
    /// Returns the default port for this database type.
    pub fn default_port(&self) -> Option<u16> {
        match self {
            DbType::MySQL => Some(3306),
            DbType::Postgres => Some(5432),
            DbType::SQLite => None,
        }
    }
}

impl std::fmt::Display for DbType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbType::MySQL => write!(f, "mysql"),
            DbType::Postgres => write!(f, "postgres"),
            DbType::SQLite => write!(f, "sqlite"),
        }
    }
}

/// Request body for connecting a session to a database.
///
/// Deliberately has no `Serialize` impl: the password must never be echoed
/// back in a response.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ConnectRequest {
    /// Database type.
    pub db_type: DbType,
    /// Database host (required for mysql/postgres).
    pub host: Option<String>,
    /// Database port (uses the type's default if not specified).
    pub port: Option<u16>,
    /// Database username.
    pub username: Option<String>,
    /// Database password.
    pub password: Option<String>,
    /// Database name (required for mysql/postgres).
    #[validate(length(max = 128, message = "Database name too long"))]
    pub database: Option<String>,
    /// SQLite file path (required for sqlite).
    pub file_path: Option<String>,
}

impl ConnectRequest {
    /// Derives the cache key for this credential tuple.
    pub fn credential_key(&self) -> CredentialKey {
        CredentialKey {
            db_type: self.db_type.clone(),
            host: self.host.clone(),
            port: self.port.or_else(|| self.db_type.default_port()),
            username: self.username.clone(),
            password: self.password.clone(),
            database: self.database.clone(),
            file_path: self.file_path.clone(),
        }
    }

    /// Human-readable label for the connection target (no secrets).
    pub fn target_label(&self) -> String {
        match self.db_type {
            DbType::SQLite => self
                .file_path
                .clone()
                .unwrap_or_else(|| "sqlite".to_string()),
            _ => format!(
                "{}/{}",
                self.host.as_deref().unwrap_or("?"),
                self.database.as_deref().unwrap_or("?")
            ),
        }
    }
}

/// Hashable identity of a credential tuple.
///
/// Equality covers every field; any change in the tuple is a different
/// connection target and bypasses the connection cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CredentialKey {
    pub db_type: DbType,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub file_path: Option<String>,
}
