//! Web layer: router, shared state, and HTTP server lifecycle

use anyhow::Result;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::config::Config;
use crate::database::repositories::{CatalogRepository, ConnectionRepository, UserRepository};
use crate::proxy::ProxyService;
use crate::sync::SyncService;
use crate::upstream::XtreamClient;

pub mod handlers;
pub mod responses;

pub use responses::{ApiResponse, PaginatedResponse, handle_error, handle_result};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Arc<sea_orm::DatabaseConnection>,
    pub connections: ConnectionRepository,
    pub catalog: CatalogRepository,
    pub users: UserRepository,
    pub upstream: Arc<XtreamClient>,
    pub sync: Arc<SyncService>,
    pub proxy: Arc<ProxyService>,
}

/// Web server configuration and setup
pub struct WebServer {
    app: Router,
    addr: String,
}

impl WebServer {
    pub fn new(state: AppState) -> Self {
        let addr = format!("{}:{}", state.config.web.host, state.config.web.port);
        let app = Self::create_router(state);
        Self { app, addr }
    }

    fn create_router(state: AppState) -> Router {
        Router::new()
            .route("/", get(handlers::health::index))
            .route("/health", get(handlers::health::health_check))
            .route("/api/user/register", post(handlers::users::register))
            .route("/api/user/login", post(handlers::users::login))
            .route("/api/iptv/auth", post(handlers::connections::authenticate))
            .route(
                "/api/iptv/connections",
                get(handlers::connections::list_connections),
            )
            .route(
                "/api/iptv/request_sync/{class}/{connection_id}",
                post(handlers::sync::request_sync),
            )
            .route(
                "/api/iptv/categories/{connection_id}/{class}",
                get(handlers::catalog::categories),
            )
            .route(
                "/api/iptv/streams/{connection_id}/{class}",
                get(handlers::catalog::streams),
            )
            .route(
                "/api/iptv/streams/details",
                post(handlers::catalog::stream_details),
            )
            .route(
                "/api/iptv/all_streams_by_category/{connection_id}/{class}",
                get(handlers::catalog::all_streams_by_category),
            )
            .route(
                "/api/iptv/search/{connection_id}/{class}",
                get(handlers::catalog::search),
            )
            .route(
                "/api/iptv/stream-url/{connection_id}/{stream_id}",
                get(handlers::catalog::stream_url),
            )
            .route(
                "/api/iptv/series_info/{connection_id}/{series_id}",
                get(handlers::catalog::series_info),
            )
            .route(
                "/api/iptv/dashboard/{connection_id}",
                get(handlers::catalog::dashboard),
            )
            .route(
                "/api/iptv/clear_cache/{connection_id}",
                post(handlers::catalog::clear_cache),
            )
            .route("/api/iptv/proxy", get(handlers::proxy::proxy_stream))
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Router without the listener, for in-process test servers
    pub fn router(state: AppState) -> Router {
        Self::create_router(state)
    }

    /// Start the web server and run until a shutdown signal arrives
    pub async fn serve(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        info!("Listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                return std::future::pending().await;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down gracefully");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down gracefully");
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received Ctrl+C, shutting down gracefully");
    }
}
