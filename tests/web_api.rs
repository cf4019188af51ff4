//! HTTP API tests running the router in-process

use axum_test::TestServer;
use serde_json::json;
use std::sync::Arc;

use xtream_relay::{
    config::{Config, DatabaseConfig},
    database::{
        Database,
        repositories::{CatalogRepository, ConnectionRepository, UserRepository},
    },
    proxy::ProxyService,
    sync::{SyncEngine, SyncService},
    upstream::XtreamClient,
    web::{AppState, WebServer},
};

async fn test_server() -> TestServer {
    let mut config = Config::default();
    config.database = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        // Single connection so the in-memory database is shared
        max_connections: Some(1),
    };

    let database = Database::new(&config.database).await.unwrap();
    database.migrate().await.unwrap();

    let db = database.connection();
    let connections = ConnectionRepository::new(db.clone());
    let catalog = CatalogRepository::new(db.clone());
    let users = UserRepository::new(db);

    let upstream = Arc::new(XtreamClient::new(&config.upstream).unwrap());
    let proxy = Arc::new(ProxyService::new(&config.proxy).unwrap());
    let engine = SyncEngine::new(catalog.clone(), connections.clone(), upstream.clone());
    let sync = Arc::new(SyncService::start(engine, 1, 4));

    let state = AppState {
        config: Arc::new(config),
        db: database.connection(),
        connections,
        catalog,
        users,
        upstream,
        sync,
        proxy,
    };

    TestServer::new(WebServer::router(state)).unwrap()
}

#[tokio::test]
async fn health_check_reports_healthy() {
    let server = test_server().await;

    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn register_then_login_round_trip() {
    let server = test_server().await;

    let response = server
        .post("/api/user/register")
        .json(&json!({
            "username": "alice",
            "email": "alice@example.com",
            "password": "correct horse battery",
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["username"], "alice");
    // The stored hash must never leave the server
    assert!(body["data"].get("password_hash").is_none());

    let login = server
        .post("/api/user/login")
        .json(&json!({"username": "alice", "password": "correct horse battery"}))
        .await;
    login.assert_status_ok();
    let body: serde_json::Value = login.json();
    assert_eq!(body["data"]["username"], "alice");

    let wrong = server
        .post("/api/user/login")
        .json(&json!({"username": "alice", "password": "wrong"}))
        .await;
    wrong.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
    let server = test_server().await;

    let request = json!({"username": "bob", "password": "long enough pw"});
    server
        .post("/api/user/register")
        .json(&request)
        .await
        .assert_status(axum::http::StatusCode::CREATED);
    let response = server.post("/api/user/register").json(&request).await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn short_password_is_rejected() {
    let server = test_server().await;

    let response = server
        .post("/api/user/register")
        .json(&json!({"username": "carol", "password": "short"}))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn proxy_requires_a_url() {
    let server = test_server().await;

    let response = server.get("/api/iptv/proxy").await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn connections_list_starts_empty() {
    let server = test_server().await;

    let response = server.get("/api/iptv/connections").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn catalog_reads_validate_the_content_class() {
    let server = test_server().await;

    let response = server.get("/api/iptv/categories/1/sports").await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);

    // Valid class against an empty cache is fine
    let response = server.get("/api/iptv/categories/1/live").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn stream_details_accepts_an_empty_id_list() {
    let server = test_server().await;

    let response = server
        .post("/api/iptv/streams/details")
        .json(&json!({"stream_ids": []}))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"], json!([]));

    // The field itself is optional
    let response = server
        .post("/api/iptv/streams/details")
        .json(&json!({}))
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn grouped_streams_validate_the_content_class() {
    let server = test_server().await;

    let response = server.get("/api/iptv/all_streams_by_category/1/sports").await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);

    let response = server.get("/api/iptv/all_streams_by_category/1/live").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn sync_request_validates_class_and_connection() {
    let server = test_server().await;

    let response = server.post("/api/iptv/request_sync/sports/1").await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);

    // A valid class is accepted even for a connection id that will fail
    // later; the queue only rejects duplicates and overload
    let response = server.post("/api/iptv/request_sync/live/1").await;
    response.assert_status(axum::http::StatusCode::ACCEPTED);
}

#[tokio::test]
async fn dashboard_for_unknown_connection_is_404() {
    let server = test_server().await;

    let response = server.get("/api/iptv/dashboard/42").await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stream_url_for_unknown_connection_is_404() {
    let server = test_server().await;

    let response = server.get("/api/iptv/stream-url/42/100").await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}
