// src/errors.rs
// DOCUMENTATION: Custom error types and HTTP responses
// PURPOSE: Centralized error handling for the news subsystem

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;

/// Application-specific error types
/// DOCUMENTATION: Three kinds only - client mistakes, missing records and storage failures
/// Each variant maps to one client-facing status category
#[derive(Error, Debug)]
pub enum NewsError {
    /// Empty/missing required field, disallowed extension, oversized file,
    /// empty or over-capacity file batch
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Database or filesystem failure; the cause is logged, not returned
    #[error("Storage error: {0}")]
    StorageError(String),
}

impl NewsError {
    /// Build a storage error from any displayable cause, logging it on the way
    pub fn storage(context: &str, cause: impl std::fmt::Display) -> Self {
        log::error!("{}: {}", context, cause);
        NewsError::StorageError(format!("{}: {}", context, cause))
    }

    /// Message safe to show to API consumers
    pub fn public_message(&self) -> String {
        match self {
            NewsError::ValidationError(msg) => msg.clone(),
            NewsError::NotFound(msg) => msg.clone(),
            NewsError::StorageError(_) => "Internal server error".to_string(),
        }
    }
}

/// Convert NewsError to HTTP response
/// DOCUMENTATION: Renders the {code, status, message} envelope
impl ResponseError for NewsError {
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        let body = json!({
            "code": status.as_u16(),
            "status": status.canonical_reason().unwrap_or("Unknown"),
            "message": self.public_message(),
        });

        HttpResponse::build(status).json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            NewsError::ValidationError(_) => StatusCode::BAD_REQUEST,
            NewsError::NotFound(_) => StatusCode::NOT_FOUND,
            NewsError::StorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<validator::ValidationErrors> for NewsError {
    fn from(errors: validator::ValidationErrors) -> Self {
        NewsError::ValidationError(errors.to_string())
    }
}
