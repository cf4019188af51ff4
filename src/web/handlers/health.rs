//! Health and index endpoints

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::web::AppState;

pub async fn index() -> Json<serde_json::Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
    }))
}

/// Basic health status including database connectivity
pub async fn health_check(State(state): State<AppState>) -> Response {
    let database_ok = state.db.ping().await.is_ok();
    let (status, overall) = if database_ok {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };

    (
        status,
        Json(json!({
            "status": overall,
            "database": if database_ok { "connected" } else { "disconnected" },
            "timestamp": chrono::Utc::now(),
        })),
    )
        .into_response()
}
