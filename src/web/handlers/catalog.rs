//! Catalog read endpoints
//!
//! Everything here reads from the local cache tables; the only upstream
//! call is `series_info`, which has no cached form and proxies straight
//! through.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::Response,
};
use serde::Deserialize;
use serde_json::json;

use crate::errors::{AppError, AppResult};
use crate::models::ContentClass;
use crate::upstream::CatalogApi;
use crate::web::{AppState, PaginatedResponse, handle_error, handle_result, responses};

const DEFAULT_PAGE_SIZE: u64 = 50;

#[derive(Debug, Deserialize)]
pub struct StreamListParams {
    pub category_id: Option<String>,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct StreamUrlParams {
    /// Content class of the stream, defaults to live
    #[serde(rename = "type")]
    pub stream_type: Option<String>,
}

fn parse_class(raw: &str) -> AppResult<ContentClass> {
    raw.parse::<ContentClass>()
        .map_err(|_| AppError::validation(format!("invalid content class: {raw}")))
}

/// GET /api/iptv/categories/{connection_id}/{class}
pub async fn categories(
    State(state): State<AppState>,
    Path((connection_id, class)): Path<(i64, String)>,
) -> Response {
    let result = async {
        let class = parse_class(&class)?;
        let rows = state.catalog.categories(connection_id, class).await?;
        Ok(rows)
    }
    .await;
    handle_result(result)
}

/// GET /api/iptv/streams/{connection_id}/{class}
pub async fn streams(
    State(state): State<AppState>,
    Path((connection_id, class)): Path<(i64, String)>,
    Query(params): Query<StreamListParams>,
) -> Response {
    match streams_inner(&state, connection_id, &class, params).await {
        Ok(body) => responses::ok(body),
        Err(e) => handle_error(e),
    }
}

async fn streams_inner(
    state: &AppState,
    connection_id: i64,
    class: &str,
    params: StreamListParams,
) -> AppResult<serde_json::Value> {
    let class = parse_class(class)?;
    let category = params.category_id.as_deref();
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, 500);

    let body = match class {
        ContentClass::Live => {
            let page_result = state
                .catalog
                .live_streams_page(connection_id, category, page, limit)
                .await?;
            serde_json::to_value(PaginatedResponse::new(
                page_result.items,
                page_result.total,
                page,
                limit,
            ))
        }
        ContentClass::Vod => {
            let page_result = state
                .catalog
                .vod_streams_page(connection_id, category, page, limit)
                .await?;
            serde_json::to_value(PaginatedResponse::new(
                page_result.items,
                page_result.total,
                page,
                limit,
            ))
        }
        ContentClass::Series => {
            let page_result = state
                .catalog
                .series_page(connection_id, category, page, limit)
                .await?;
            serde_json::to_value(PaginatedResponse::new(
                page_result.items,
                page_result.total,
                page,
                limit,
            ))
        }
    }
    .map_err(|e| AppError::internal(format!("response serialization failed: {e}")))?;
    Ok(body)
}

/// GET /api/iptv/search/{connection_id}/{class}?q=
pub async fn search(
    State(state): State<AppState>,
    Path((connection_id, class)): Path<(i64, String)>,
    Query(params): Query<SearchParams>,
) -> Response {
    let result = async {
        let class = parse_class(&class)?;
        let query = params.q.trim();
        if query.is_empty() {
            return Err(AppError::validation("search query must not be empty"));
        }
        let matches = state.catalog.search(connection_id, class, query).await?;
        Ok(matches)
    }
    .await;
    handle_result(result)
}

#[derive(Debug, Deserialize)]
pub struct StreamDetailsRequest {
    #[serde(default)]
    pub stream_ids: Vec<i64>,
}

/// POST /api/iptv/streams/details
///
/// Batch lookup of full rows for a set of stream ids, e.g. to hydrate a
/// favorites list in one round trip. An empty id list is an empty result,
/// not an error.
pub async fn stream_details(
    State(state): State<AppState>,
    Json(request): Json<StreamDetailsRequest>,
) -> Response {
    let result = state
        .catalog
        .find_by_stream_ids(&request.stream_ids)
        .await
        .map_err(AppError::from);
    handle_result(result)
}

/// GET /api/iptv/all_streams_by_category/{connection_id}/{class}
pub async fn all_streams_by_category(
    State(state): State<AppState>,
    Path((connection_id, class)): Path<(i64, String)>,
) -> Response {
    let result = async {
        let class = parse_class(&class)?;
        let grouped = state
            .catalog
            .streams_by_category(connection_id, class)
            .await?;
        Ok(grouped)
    }
    .await;
    handle_result(result)
}

/// GET /api/iptv/stream-url/{connection_id}/{stream_id}?type=
///
/// Builds the provider's direct playback URL for a stream. The URL embeds
/// the connection's credentials, so it never appears in logs.
pub async fn stream_url(
    State(state): State<AppState>,
    Path((connection_id, stream_id)): Path<(i64, String)>,
    Query(params): Query<StreamUrlParams>,
) -> Response {
    let result = async {
        let class = match params.stream_type.as_deref() {
            Some(raw) => parse_class(raw)?,
            None => ContentClass::Live,
        };
        let connection = state
            .connections
            .find_by_id(connection_id)
            .await?
            .ok_or_else(|| AppError::not_found("connection", connection_id))?;

        let url = format!(
            "{}/{}/{}/{}/{}",
            connection.server_url.trim_end_matches('/'),
            class.stream_path_segment(),
            connection.username,
            connection.password,
            stream_id
        );
        Ok(json!({ "url": url, "type": class.as_str() }))
    }
    .await;
    handle_result(result)
}

/// GET /api/iptv/series_info/{connection_id}/{series_id}
///
/// Episode listings are too volatile to cache, so this proxies the
/// provider's `get_series_info` payload unchanged.
pub async fn series_info(
    State(state): State<AppState>,
    Path((connection_id, series_id)): Path<(i64, i64)>,
) -> Response {
    let result = async {
        let connection = state
            .connections
            .find_by_id(connection_id)
            .await?
            .ok_or_else(|| AppError::not_found("connection", connection_id))?;

        let series_id = series_id.to_string();
        let payload = state
            .upstream
            .fetch(
                &connection,
                "get_series_info",
                &[("series_id", series_id.as_str())],
            )
            .await?;
        Ok(payload)
    }
    .await;
    handle_result(result)
}

/// GET /api/iptv/dashboard/{connection_id}
///
/// Consolidated view for the landing screen: account metadata from the
/// connection record plus row counts from the cache tables. An entirely
/// empty cache flags that a sync is needed.
pub async fn dashboard(
    State(state): State<AppState>,
    Path(connection_id): Path<i64>,
) -> Response {
    let result = async {
        let connection = state
            .connections
            .find_by_id(connection_id)
            .await?
            .ok_or_else(|| AppError::not_found("connection", connection_id))?;
        let view = connection.into_view();

        let stats = state.catalog.counts(connection_id).await?;
        let is_sync_needed =
            stats.total_live_channels + stats.total_vod + stats.total_series == 0;
        let syncs_in_flight: Vec<&str> =
            [ContentClass::Live, ContentClass::Vod, ContentClass::Series]
                .into_iter()
                .filter(|class| state.sync.is_in_flight(connection_id, *class))
                .map(|class| class.as_str())
                .collect();

        Ok(json!({
            "user_info": view.user_info,
            "server_info": view.server_info,
            "statistics": stats,
            "last_synced_at": view.last_synced_at,
            "is_sync_needed": is_sync_needed,
            "syncs_in_flight": syncs_in_flight,
        }))
    }
    .await;
    handle_result(result)
}

/// POST /api/iptv/clear_cache/{connection_id}
pub async fn clear_cache(
    State(state): State<AppState>,
    Path(connection_id): Path<i64>,
) -> Response {
    let result = async {
        state
            .connections
            .find_by_id(connection_id)
            .await?
            .ok_or_else(|| AppError::not_found("connection", connection_id))?;
        state.catalog.clear_connection(connection_id).await?;
        Ok(json!({ "message": "cached catalog data cleared" }))
    }
    .await;
    handle_result(result)
}
