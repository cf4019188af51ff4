//! Error type definitions for the xtream-relay application
//!
//! This module defines all error types used throughout the application,
//! providing a hierarchical error system that makes debugging and error
//! handling more straightforward.

use thiserror::Error;

/// Top-level application error type
///
/// This enum represents all possible errors that can occur in the application.
/// It uses `thiserror` to provide automatic error trait implementations and
/// proper error chaining.
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors (SeaORM)
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Repository layer errors
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Upstream provider errors
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// Stream proxy errors
    #[error("Proxy error: {0}")]
    Proxy(#[from] ProxyError),

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Resource not found errors
    #[error("Not found: {resource} with id {id}")]
    NotFound { resource: String, id: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Operation already in progress errors
    #[error("Operation already in progress: {operation_type} on {resource}")]
    OperationInProgress {
        operation_type: String,
        resource: String,
    },

    /// Background queue at capacity
    #[error("Service overloaded: {message}")]
    Overloaded { message: String },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Repository layer specific errors
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Database errors from SeaORM
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Record not found
    #[error("Record not found: {table} with {field} = {value}")]
    RecordNotFound {
        table: String,
        field: String,
        value: String,
    },

    /// Data serialization/deserialization failures
    #[error("Serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Upstream provider specific errors
///
/// Timeouts are kept distinct from other transport failures because callers
/// use the distinction to decide whether a retry is worthwhile. Parse errors
/// are fatal until the upstream fixes its payload.
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// Request exceeded the fixed upstream timeout
    #[error("Upstream request timed out: {url}")]
    Timeout { url: String },

    /// Network-level failure other than a timeout
    #[error("Upstream transport error: {message}")]
    Transport { message: String },

    /// Non-success HTTP status from the upstream
    #[error("Upstream HTTP error: {status} - {message}")]
    Http { status: u16, message: String },

    /// Response body was present but not valid JSON
    #[error("Upstream parse error: {message}")]
    Parse { message: String },

    /// Authentication rejected or incomplete auth payload
    #[error("Upstream authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// Payload had a shape the sync engine does not recognize
    #[error("Unexpected upstream payload shape: {message}")]
    UnexpectedShape { message: String },
}

/// Stream proxy specific errors
///
/// The player consuming the proxy needs to distinguish "retry the segment"
/// (timeout) from "dead source" (everything else), so the two kinds carry
/// different HTTP status semantics in the web layer.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Upstream media origin timed out
    #[error("Proxy timeout while fetching: {url}")]
    Timeout { url: String },

    /// Any other fetch or status failure
    #[error("Proxy fetch failed: {message}")]
    Upstream { message: String },
}

/// Convenience methods for creating common error types
impl AppError {
    /// Create a validation error with a custom message
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found<R: Into<String>, I: std::fmt::Display>(resource: R, id: I) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.to_string(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an operation in progress error
    pub fn operation_in_progress<O: Into<String>, R: Into<String>>(
        operation_type: O,
        resource: R,
    ) -> Self {
        Self::OperationInProgress {
            operation_type: operation_type.into(),
            resource: resource.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl UpstreamError {
    /// Create an authentication failed error
    pub fn auth_failed<M: Into<String>>(message: M) -> Self {
        Self::AuthenticationFailed {
            message: message.into(),
        }
    }

    /// Create an unexpected payload shape error
    pub fn unexpected_shape<M: Into<String>>(message: M) -> Self {
        Self::UnexpectedShape {
            message: message.into(),
        }
    }
}
