//! Provider connection endpoints
//!
//! Authenticating against a provider both validates the credentials and
//! upserts the connection record, so the same call serves first-time setup
//! and re-authentication.

use axum::{Json, extract::State, response::Response};
use serde::Deserialize;
use tracing::info;

use crate::errors::{AppError, AppResult};
use crate::models::ConnectionView;
use crate::utils::url::normalize_origin;
use crate::web::{AppState, handle_error, handle_result, responses};

#[derive(Debug, Deserialize)]
pub struct AuthRequest {
    pub server_url: String,
    pub username: String,
    pub password: String,
}

/// POST /api/iptv/auth
///
/// Validates credentials against the provider's player_api and stores (or
/// refreshes) the connection with the returned account metadata.
pub async fn authenticate(
    State(state): State<AppState>,
    Json(request): Json<AuthRequest>,
) -> Response {
    match authenticate_inner(&state, request).await {
        Ok(view) => responses::ok(view),
        Err(e) => handle_error(e),
    }
}

async fn authenticate_inner(
    state: &AppState,
    request: AuthRequest,
) -> AppResult<ConnectionView> {
    let server_url = normalize_origin(request.server_url.trim());
    if server_url.is_empty() || request.username.is_empty() || request.password.is_empty() {
        return Err(AppError::validation(
            "server_url, username, and password are all required",
        ));
    }

    let (user_info, server_info) = state
        .upstream
        .authenticate(&server_url, &request.username, &request.password)
        .await?;

    let connection = state
        .connections
        .upsert_from_auth(
            &server_url,
            &request.username,
            &request.password,
            &user_info,
            &server_info,
        )
        .await?;

    info!(
        "Authenticated connection {} for {}",
        connection.id, connection.username
    );
    Ok(connection.into_view())
}

/// GET /api/iptv/connections
pub async fn list_connections(State(state): State<AppState>) -> Response {
    let result = state
        .connections
        .list()
        .await
        .map(|connections| {
            connections
                .into_iter()
                .map(|c| c.into_view())
                .collect::<Vec<_>>()
        })
        .map_err(AppError::from);
    handle_result(result)
}
