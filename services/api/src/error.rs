//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and how it is
//! rendered as an HTTP response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use care_directory_core::ports::PortError;
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

use crate::config::ConfigError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents an error from running the schema migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No valid bearer token accompanied the request.
    #[error("Authentication required")]
    Unauthenticated,

    /// The caller is authenticated but lacks the admin role.
    #[error("Admin access required")]
    Forbidden,

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// JSON body of every error response.
#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    pub message: String,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Port(PortError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Port(PortError::Conflict(_)) => StatusCode::CONFLICT,
            ApiError::Port(PortError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            ApiError::Port(PortError::Unauthorized) | ApiError::Unauthenticated => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message shown to the caller. Internal details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            ApiError::Port(PortError::NotFound(msg))
            | ApiError::Port(PortError::Conflict(msg))
            | ApiError::Port(PortError::InvalidInput(msg)) => msg.clone(),
            ApiError::Port(PortError::Unauthorized) | ApiError::Unauthenticated => {
                "Authentication required".to_string()
            }
            ApiError::Forbidden => "Admin access required".to_string(),
            _ => "An unexpected internal error occurred".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        let body = ErrorBody {
            message: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}
