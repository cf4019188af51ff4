//! Stream proxy endpoint

use axum::{
    body::Body,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::proxy::ProxiedResponse;
use crate::web::{AppState, handle_error};

#[derive(Debug, Deserialize)]
pub struct ProxyParams {
    pub url: Option<String>,
}

/// GET /api/iptv/proxy?url=
///
/// HLS playlists come back rewritten so every URI points at this endpoint;
/// anything else (media segments, direct streams) is piped through without
/// buffering the body.
pub async fn proxy_stream(
    State(state): State<AppState>,
    Query(params): Query<ProxyParams>,
) -> Response {
    let Some(url) = params.url.filter(|u| !u.is_empty()) else {
        return handle_error(AppError::validation("url parameter is required"));
    };

    match state.proxy.fetch(&url).await {
        Ok(ProxiedResponse::Playlist { content_type, body }) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, content_type)],
            body,
        )
            .into_response(),
        Ok(ProxiedResponse::Passthrough(upstream)) => {
            let status = StatusCode::from_u16(upstream.status().as_u16())
                .unwrap_or(StatusCode::OK);
            let content_type = upstream
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("application/octet-stream")
                .to_string();
            (
                status,
                [(header::CONTENT_TYPE, content_type)],
                Body::from_stream(upstream.bytes_stream()),
            )
                .into_response()
        }
        Err(e) => handle_error(e),
    }
}
