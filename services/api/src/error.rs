//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and how it is rendered
//! as an HTTP response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lucid_lists_core::ports::PortError;
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

    /// Represents a failure while applying the embedded migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// The JSON body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Stable classification, e.g. `not_found`.
    pub error: &'static str,
    pub message: String,
}

impl ApiError {
    fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Port(PortError::NotFound(_)) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Port(PortError::BadRequest(_)) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Port(PortError::NoFieldsToUpdate) => {
                (StatusCode::BAD_REQUEST, "no_fields_to_update")
            }
            ApiError::Port(PortError::Unauthorized) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ApiError::Port(PortError::Forbidden) => (StatusCode::FORBIDDEN, "forbidden"),
            ApiError::Port(PortError::Conflict(_)) => (StatusCode::CONFLICT, "conflict"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }

    fn client_message(&self) -> String {
        match self {
            ApiError::Port(PortError::NotFound(msg))
            | ApiError::Port(PortError::BadRequest(msg))
            | ApiError::Port(PortError::Conflict(msg)) => msg.clone(),
            ApiError::Port(PortError::NoFieldsToUpdate) => "no fields to update".to_string(),
            ApiError::Port(PortError::Unauthorized) => "authentication required".to_string(),
            ApiError::Port(PortError::Forbidden) => {
                "you are not a member of this project".to_string()
            }
            _ => "internal server error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.classify();
        if status.is_server_error() {
            error!("Request failed: {:?}", self);
        }
        let body = ErrorBody {
            error: kind,
            message: self.client_message(),
        };
        (status, Json(body)).into_response()
    }
}
