//! Error types shared across the workspace.
//!
//! Every failure surfaced to a client goes through [`AppError`], which maps
//! each variant to a stable error code and an HTTP status. Handlers return
//! `AppResult<T>`; axum converts errors into the unified response envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::response::ApiResponse;

/// Result alias used throughout the workspace.
pub type AppResult<T> = Result<T, AppError>;

/// Application error taxonomy.
#[derive(Debug, Error)]
pub enum AppError {
    /// Opening the database connection failed (bad credentials, unreachable
    /// host, unknown database). Carries the driver message.
    #[error("database connection failed: {0}")]
    DatabaseConnection(String),

    /// Executing a query failed (invalid SQL, missing table or column,
    /// invalidated connection). Carries the driver message.
    #[error("query execution failed: {0}")]
    DatabaseQuery(String),

    /// A static resource referenced by a page is absent.
    #[error("missing resource: {0}")]
    MissingResource(String),

    /// No session with the given id exists.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// A chart load was attempted before the session connected.
    #[error("not connected: connect to the database first (see the connection panel)")]
    NotConnected,

    /// Request validation failed.
    #[error("validation error: {0}")]
    Validation(String),

    /// The requested analysis tab does not exist.
    #[error("analysis tab not found: {0}")]
    TabNotFound(String),
}

impl AppError {
    /// Stable error code for client-side handling.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::DatabaseConnection(_) => "CONNECTION_ERROR",
            AppError::DatabaseQuery(_) => "QUERY_ERROR",
            AppError::MissingResource(_) => "MISSING_RESOURCE",
            AppError::SessionNotFound(_) => "SESSION_NOT_FOUND",
            AppError::NotConnected => "NOT_CONNECTED",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::TabNotFound(_) => "TAB_NOT_FOUND",
        }
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::DatabaseConnection(_) | AppError::DatabaseQuery(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::MissingResource(_)
            | AppError::SessionNotFound(_)
            | AppError::TabNotFound(_) => StatusCode::NOT_FOUND,
            AppError::NotConnected => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ApiResponse::err(self.code(), self.to_string());
        (status, Json(body)).into_response()
    }
}
