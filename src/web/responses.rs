//! HTTP response types and utilities
//!
//! This module provides standardized response types and error handling
//! for the web layer, ensuring consistent API responses across all endpoints.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult, ProxyError, UpstreamError};

/// Standard API response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the operation was successful
    pub success: bool,
    /// Response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Request timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    /// Create a successful response
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Create an error response
    pub fn error(message: String) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now(),
        }
    }
}

impl<T> IntoResponse for ApiResponse<T>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        let status = if self.success {
            StatusCode::OK
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        (status, Json(self)).into_response()
    }
}

/// Paginated response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    /// The actual data items
    pub items: Vec<T>,
    /// Total number of items (across all pages)
    pub total: u64,
    /// Current page number (1-based)
    pub page: u64,
    /// Number of items per page
    pub per_page: u64,
    /// Total number of pages
    pub total_pages: u64,
    /// Whether there is a next page
    pub has_next: bool,
    /// Whether there is a previous page
    pub has_previous: bool,
}

impl<T> PaginatedResponse<T> {
    /// Create a new paginated response
    pub fn new(items: Vec<T>, total: u64, page: u64, per_page: u64) -> Self {
        let total_pages = if per_page > 0 {
            total.div_ceil(per_page)
        } else {
            1
        };

        Self {
            items,
            total,
            page,
            per_page,
            total_pages,
            has_next: page < total_pages,
            has_previous: page > 1,
        }
    }
}

/// Helper function to convert AppResult to HTTP response
pub fn handle_result<T>(result: AppResult<T>) -> Response
where
    T: Serialize,
{
    match result {
        Ok(data) => (StatusCode::OK, Json(ApiResponse::success(data))).into_response(),
        Err(error) => handle_error(error),
    }
}

/// Convert AppError to appropriate HTTP response
pub fn handle_error(error: AppError) -> Response {
    let (status, message) = match &error {
        AppError::Validation { message } => (StatusCode::BAD_REQUEST, message.clone()),
        AppError::NotFound { resource, id } => (
            StatusCode::NOT_FOUND,
            format!("{resource} with id '{id}' not found"),
        ),
        AppError::OperationInProgress {
            operation_type,
            resource,
        } => (
            StatusCode::CONFLICT,
            format!("{operation_type} already in progress for {resource}"),
        ),
        AppError::Overloaded { message } => (StatusCode::SERVICE_UNAVAILABLE, message.clone()),
        AppError::Upstream(upstream) => match upstream {
            UpstreamError::AuthenticationFailed { message } => {
                (StatusCode::UNAUTHORIZED, message.clone())
            }
            UpstreamError::Timeout { url } => (
                StatusCode::GATEWAY_TIMEOUT,
                format!("Upstream timed out: {url}"),
            ),
            other => (StatusCode::BAD_GATEWAY, other.to_string()),
        },
        AppError::Proxy(proxy) => match proxy {
            ProxyError::Timeout { url } => (
                StatusCode::GATEWAY_TIMEOUT,
                format!("Stream origin timed out: {url}"),
            ),
            ProxyError::Upstream { message } => (StatusCode::BAD_GATEWAY, message.clone()),
        },
        AppError::Database(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Database operation failed".to_string(),
        ),
        AppError::Repository(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Data access failed".to_string(),
        ),
        AppError::Configuration { message } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Configuration error: {message}"),
        ),
        AppError::Internal { message } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Internal error: {message}"),
        ),
    };

    (status, Json(ApiResponse::<()>::error(message))).into_response()
}

/// Success response helpers
pub fn ok<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
}

pub fn created<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(ApiResponse::success(data))).into_response()
}

pub fn accepted<T: Serialize>(data: T) -> Response {
    (StatusCode::ACCEPTED, Json(ApiResponse::success(data))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(error: AppError) -> StatusCode {
        handle_error(error).status()
    }

    #[test]
    fn timeouts_map_to_gateway_timeout() {
        let proxy_timeout = AppError::Proxy(ProxyError::Timeout {
            url: "http://host/seg.ts".into(),
        });
        let upstream_timeout = AppError::Upstream(UpstreamError::Timeout {
            url: "http://host/player_api.php".into(),
        });
        assert_eq!(status_of(proxy_timeout), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(status_of(upstream_timeout), StatusCode::GATEWAY_TIMEOUT);

        // Generic fetch failures stay distinguishable from timeouts
        let generic = AppError::Proxy(ProxyError::Upstream {
            message: "connection reset".into(),
        });
        assert_eq!(status_of(generic), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn conflict_and_overload_have_their_own_statuses() {
        assert_eq!(
            status_of(AppError::operation_in_progress("sync", "1:live")),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(AppError::Overloaded {
                message: "queue full".into()
            }),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(AppError::Upstream(UpstreamError::auth_failed("bad password"))),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn pagination_metadata_is_consistent() {
        let page = PaginatedResponse::new(vec![1, 2, 3], 7, 1, 3);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next);
        assert!(!page.has_previous);

        let last = PaginatedResponse::new(vec![7], 7, 3, 3);
        assert!(!last.has_next);
        assert!(last.has_previous);
    }
}
