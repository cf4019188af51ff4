//! Sync trigger endpoint

use axum::{
    extract::{Path, State},
    response::Response,
};
use serde_json::json;

use crate::errors::AppError;
use crate::web::{AppState, handle_error, responses};

/// POST /api/iptv/request_sync/{class}/{connection_id}
///
/// Queues a background sync and returns immediately. A second request for
/// the same (connection, class) while one is pending gets a conflict.
pub async fn request_sync(
    State(state): State<AppState>,
    Path((class, connection_id)): Path<(String, i64)>,
) -> Response {
    let class = match class.parse() {
        Ok(class) => class,
        Err(_) => {
            return handle_error(AppError::validation(format!(
                "invalid content class: {class}"
            )));
        }
    };

    match state.sync.submit(connection_id, class) {
        Ok(()) => responses::accepted(json!({
            "message": format!("{class} sync started in the background"),
        })),
        Err(e) => handle_error(e),
    }
}
