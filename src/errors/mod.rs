//! Error handling for the xtream-relay application
//!
//! All failures are captured at component boundaries and converted into
//! `AppError` values; the web layer maps them onto structured JSON responses
//! so a bare fault never crosses the outward-facing interface.

mod types;

pub use types::{AppError, ProxyError, RepositoryError, UpstreamError};

/// Convenience alias used throughout the application
pub type AppResult<T> = Result<T, AppError>;
