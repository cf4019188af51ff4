//! Sync engine integration tests against an in-memory SQLite database

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use xtream_relay::{
    config::DatabaseConfig,
    database::{
        Database,
        repositories::{CatalogRepository, ConnectionRepository},
    },
    errors::{AppError, AppResult, UpstreamError},
    models::{Connection, ContentClass},
    sync::{SyncEngine, SyncService},
    upstream::CatalogApi,
};

/// Canned upstream keyed by player_api action
struct StubUpstream {
    responses: HashMap<String, Value>,
    delay: Option<Duration>,
}

impl StubUpstream {
    fn new(responses: HashMap<String, Value>) -> Self {
        Self {
            responses,
            delay: None,
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl CatalogApi for StubUpstream {
    async fn fetch(
        &self,
        _connection: &Connection,
        action: &str,
        _extra: &[(&str, &str)],
    ) -> AppResult<Value> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.responses.get(action) {
            Some(value) => Ok(value.clone()),
            None => Ok(Value::Null),
        }
    }
}

struct TestHarness {
    catalog: CatalogRepository,
    connections: ConnectionRepository,
    connection_id: i64,
}

async fn setup() -> TestHarness {
    let database = Database::new(&DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        // In-memory SQLite gives every pooled connection its own database,
        // so the pool is pinned to a single connection
        max_connections: Some(1),
    })
    .await
    .unwrap();
    database.migrate().await.unwrap();

    let db = database.connection();
    let catalog = CatalogRepository::new(db.clone());
    let connections = ConnectionRepository::new(db);

    let connection = connections
        .upsert_from_auth(
            "http://provider.test:8080",
            "alice",
            "secret",
            &json!({"status": "Active"}),
            &json!({"url": "provider.test"}),
        )
        .await
        .unwrap();

    TestHarness {
        catalog,
        connections,
        connection_id: connection.id,
    }
}

fn engine(harness: &TestHarness, upstream: StubUpstream) -> SyncEngine {
    SyncEngine::new(
        harness.catalog.clone(),
        harness.connections.clone(),
        Arc::new(upstream),
    )
}

fn live_responses() -> HashMap<String, Value> {
    HashMap::from([
        (
            "get_live_categories".to_string(),
            json!([{"category_id": "7", "category_name": "News", "parent_id": 0}]),
        ),
        (
            "get_live_streams".to_string(),
            json!([{
                "stream_id": 42,
                "name": "CNN",
                "stream_icon": "http://provider.test/logo.png",
                "category_id": "7",
                "epg_channel_id": "cnn.us",
            }]),
        ),
    ])
}

#[tokio::test]
async fn live_sync_populates_cache() {
    let harness = setup().await;
    let engine = engine(&harness, StubUpstream::new(live_responses()));

    let outcome = engine
        .sync(harness.connection_id, ContentClass::Live)
        .await
        .unwrap();
    assert_eq!(outcome.categories, 1);
    assert_eq!(outcome.streams, 1);

    let categories = harness
        .catalog
        .categories(harness.connection_id, ContentClass::Live)
        .await
        .unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].category_name, "News");

    let page = harness
        .catalog
        .live_streams_page(harness.connection_id, None, 1, 50)
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].name, "CNN");
    assert_eq!(page.items[0].stream_id, 42);

    let connection = harness
        .connections
        .find_by_id(harness.connection_id)
        .await
        .unwrap()
        .unwrap();
    assert!(connection.last_synced_at.is_some());
}

#[tokio::test]
async fn sync_is_a_full_replace() {
    let harness = setup().await;
    let first = engine(&harness, StubUpstream::new(live_responses()));
    first
        .sync(harness.connection_id, ContentClass::Live)
        .await
        .unwrap();
    first
        .sync(harness.connection_id, ContentClass::Live)
        .await
        .unwrap();

    // Running twice must not duplicate rows
    let page = harness
        .catalog
        .live_streams_page(harness.connection_id, None, 1, 50)
        .await
        .unwrap();
    assert_eq!(page.total, 1);

    // A later sync returning fewer rows shrinks the cache
    let smaller = engine(
        &harness,
        StubUpstream::new(HashMap::from([
            ("get_live_categories".to_string(), json!([])),
            ("get_live_streams".to_string(), json!([])),
        ])),
    );
    smaller
        .sync(harness.connection_id, ContentClass::Live)
        .await
        .unwrap();
    let counts = harness.catalog.counts(harness.connection_id).await.unwrap();
    assert_eq!(counts.total_live_channels, 0);
    assert_eq!(counts.total_categories, 0);
}

#[tokio::test]
async fn series_sync_flattens_map_shaped_payloads() {
    let harness = setup().await;
    let responses = HashMap::from([
        ("get_series_categories".to_string(), json!([])),
        (
            "get_series".to_string(),
            json!({
                "101": {"series_id": 101, "name": "Dark Harbor", "rating_5based": "4.5"},
                "102": {"series_id": 102, "name": "Night Shift", "backdrop_path": ["a.jpg", "b.jpg"]},
            }),
        ),
    ]);
    let engine = engine(&harness, StubUpstream::new(responses));

    let outcome = engine
        .sync(harness.connection_id, ContentClass::Series)
        .await
        .unwrap();
    assert_eq!(outcome.streams, 2);

    let page = harness
        .catalog
        .series_page(harness.connection_id, None, 1, 50)
        .await
        .unwrap();
    assert_eq!(page.total, 2);
}

#[tokio::test]
async fn unrecognized_stream_payload_fails_the_sync() {
    let harness = setup().await;
    let responses = HashMap::from([
        ("get_live_categories".to_string(), json!([])),
        ("get_live_streams".to_string(), json!("banned")),
    ]);
    let engine = engine(&harness, StubUpstream::new(responses));

    let err = engine
        .sync(harness.connection_id, ContentClass::Live)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Upstream(UpstreamError::UnexpectedShape { .. })
    ));

    // The failed class is left empty, not stale
    let counts = harness.catalog.counts(harness.connection_id).await.unwrap();
    assert_eq!(counts.total_live_channels, 0);
}

#[tokio::test]
async fn sync_for_unknown_connection_is_not_found() {
    let harness = setup().await;
    let engine = engine(&harness, StubUpstream::new(HashMap::new()));

    let err = engine.sync(9999, ContentClass::Live).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));
}

#[tokio::test]
async fn stream_details_finds_rows_across_classes() {
    let harness = setup().await;
    let mut responses = live_responses();
    responses.insert(
        "get_series_categories".to_string(),
        serde_json::json!([]),
    );
    responses.insert(
        "get_series".to_string(),
        serde_json::json!([{"series_id": 77, "name": "Dark Harbor"}]),
    );
    let engine = engine(&harness, StubUpstream::new(responses));
    engine
        .sync(harness.connection_id, ContentClass::Live)
        .await
        .unwrap();
    engine
        .sync(harness.connection_id, ContentClass::Series)
        .await
        .unwrap();

    let found = harness
        .catalog
        .find_by_stream_ids(&[42, 77])
        .await
        .unwrap();
    assert_eq!(found.len(), 2);
    let classes: Vec<&str> = found
        .iter()
        .map(|v| v["stream_type"].as_str().unwrap())
        .collect();
    assert!(classes.contains(&"live"));
    assert!(classes.contains(&"series"));

    // Unknown ids and empty input both come back empty
    assert!(harness.catalog.find_by_stream_ids(&[9999]).await.unwrap().is_empty());
    assert!(harness.catalog.find_by_stream_ids(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn streams_group_under_their_categories() {
    let harness = setup().await;
    let responses = HashMap::from([
        (
            "get_live_categories".to_string(),
            serde_json::json!([{"category_id": "7", "category_name": "News"}]),
        ),
        (
            "get_live_streams".to_string(),
            serde_json::json!([
                {"stream_id": 42, "name": "CNN", "category_id": "7"},
                {"stream_id": 43, "name": "Mystery Feed", "category_id": "99"},
            ]),
        ),
    ]);
    let engine = engine(&harness, StubUpstream::new(responses));
    engine
        .sync(harness.connection_id, ContentClass::Live)
        .await
        .unwrap();

    let grouped = harness
        .catalog
        .streams_by_category(harness.connection_id, ContentClass::Live)
        .await
        .unwrap();
    let groups = grouped.as_array().unwrap();
    assert_eq!(groups.len(), 2);

    assert_eq!(groups[0]["category_name"], "News");
    assert_eq!(groups[0]["streams"].as_array().unwrap().len(), 1);
    assert_eq!(groups[0]["streams"][0]["name"], "CNN");

    // A stream pointing at a category the upstream never listed still shows up
    assert_eq!(groups[1]["category_name"], "Uncategorized");
    assert_eq!(groups[1]["streams"][0]["name"], "Mystery Feed");
}

#[tokio::test]
async fn clear_cache_empties_every_class() {
    let harness = setup().await;
    let engine = engine(&harness, StubUpstream::new(live_responses()));
    engine
        .sync(harness.connection_id, ContentClass::Live)
        .await
        .unwrap();

    harness
        .catalog
        .clear_connection(harness.connection_id)
        .await
        .unwrap();

    let counts = harness.catalog.counts(harness.connection_id).await.unwrap();
    assert_eq!(counts.total_live_channels, 0);
    assert_eq!(counts.total_vod, 0);
    assert_eq!(counts.total_series, 0);
    assert_eq!(counts.total_categories, 0);
}

#[tokio::test]
async fn duplicate_submission_is_rejected_while_in_flight() {
    let harness = setup().await;
    let slow = StubUpstream::new(live_responses()).with_delay(Duration::from_millis(500));
    let service = SyncService::start(engine(&harness, slow), 2, 8);

    service
        .submit(harness.connection_id, ContentClass::Live)
        .unwrap();
    assert!(service.is_in_flight(harness.connection_id, ContentClass::Live));
    assert!(!service.is_in_flight(harness.connection_id, ContentClass::Series));

    let err = service
        .submit(harness.connection_id, ContentClass::Live)
        .unwrap_err();
    assert!(matches!(err, AppError::OperationInProgress { .. }));

    // A different class for the same connection is an independent job
    service
        .submit(harness.connection_id, ContentClass::Vod)
        .unwrap();
}
