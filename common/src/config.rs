//! Application configuration.
//!
//! Loads service configuration from environment variables with sensible
//! defaults. Database credentials are never defaulted here; they arrive
//! per-session through the connect endpoint.

/// Service configuration shared across the workspace.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Service name (used in logs and response metadata).
    pub service_name: String,
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Connect timeout for database pools, in seconds.
    pub connect_timeout_secs: u64,
    /// Maximum connections per database pool.
    pub max_connections: u32,
    /// Directory holding static assets (the E/R diagram PDF lives here).
    pub data_dir: String,
}

impl AppConfig {
    /// Loads configuration for the given service from the environment.
    ///
    /// Recognized variables: `HOST`, `SERVER_PORT`, `CONNECT_TIMEOUT_SECS`,
    /// `MAX_CONNECTIONS`, `DATA_DIR`.
    pub fn load_with_service(service_name: &str) -> Self {
        Self {
            service_name: service_name.to_string(),
            host: env_or("HOST", "0.0.0.0"),
            port: env_parse_or("SERVER_PORT", 8080),
            connect_timeout_secs: env_parse_or("CONNECT_TIMEOUT_SECS", 10),
            max_connections: env_parse_or("MAX_CONNECTIONS", 5),
            data_dir: env_or("DATA_DIR", "data"),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
