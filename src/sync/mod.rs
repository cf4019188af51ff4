//! Catalog synchronization
//!
//! A sync is a full replace of one (connection, content class) slice of the
//! cache: delete everything, then bulk-insert what the upstream returned.
//! There is deliberately no merge and no transaction spanning the whole run;
//! a failed sync leaves the slice empty rather than stale, and the next
//! successful run repopulates it.
//!
//! [`SyncService`] fronts the engine with a bounded queue and a small fixed
//! worker pool, rejecting duplicate in-flight jobs so one slow provider
//! cannot be hammered by repeated refresh clicks.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::database::repositories::{CatalogRepository, ConnectionRepository};
use crate::errors::{AppError, AppResult, UpstreamError};
use crate::models::{
    Connection, ContentClass, SeriesPayload, UpstreamCategory, UpstreamLiveStream,
    UpstreamVodStream,
};
use crate::upstream::CatalogApi;

/// Result summary of one completed sync run
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub class: ContentClass,
    pub categories: usize,
    pub streams: usize,
}

impl SyncOutcome {
    pub fn message(&self) -> String {
        format!(
            "Synced {} {} streams and {} categories",
            self.streams, self.class, self.categories
        )
    }
}

/// Executes full-replace syncs against the catalog cache
pub struct SyncEngine {
    store: CatalogRepository,
    connections: ConnectionRepository,
    upstream: Arc<dyn CatalogApi>,
}

impl SyncEngine {
    pub fn new(
        store: CatalogRepository,
        connections: ConnectionRepository,
        upstream: Arc<dyn CatalogApi>,
    ) -> Self {
        Self {
            store,
            connections,
            upstream,
        }
    }

    /// Run one sync for a (connection, class) pair.
    ///
    /// Categories and streams are fetched independently; whichever fetch
    /// succeeded is persisted even when the other fails, and the first
    /// failure is reported after both attempts finish. The cache slice is
    /// cleared before any insert, so a failed run never leaves stale rows.
    pub async fn sync(&self, connection_id: i64, class: ContentClass) -> AppResult<SyncOutcome> {
        let connection = self
            .connections
            .find_by_id(connection_id)
            .await?
            .ok_or_else(|| AppError::not_found("connection", connection_id))?;

        info!(
            "Starting {} sync for connection {} ({})",
            class, connection_id, connection.username
        );

        let categories_result = self.fetch_categories(&connection, class).await;
        let streams_result = self.fetch_streams(&connection, class).await;

        self.store.delete_class(connection_id, class).await?;

        let mut first_error: Option<AppError> = None;
        let mut inserted_categories = 0;
        let mut inserted_streams = 0;

        match categories_result {
            Ok(categories) => {
                inserted_categories = self
                    .store
                    .insert_categories(connection_id, class, &categories)
                    .await?;
            }
            Err(e) => {
                warn!(
                    "Category fetch failed for connection {} ({}): {}",
                    connection_id, class, e
                );
                first_error = Some(e);
            }
        }

        match streams_result {
            Ok(streams) => {
                inserted_streams = self.insert_streams(connection_id, class, streams).await?;
            }
            Err(e) => {
                warn!(
                    "Stream fetch failed for connection {} ({}): {}",
                    connection_id, class, e
                );
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        self.connections.touch_synced(connection_id).await?;

        let outcome = SyncOutcome {
            class,
            categories: inserted_categories,
            streams: inserted_streams,
        };
        info!(
            "Completed {} sync for connection {}: {} streams, {} categories",
            class, connection_id, outcome.streams, outcome.categories
        );
        Ok(outcome)
    }

    async fn fetch_categories(
        &self,
        connection: &Connection,
        class: ContentClass,
    ) -> AppResult<Vec<UpstreamCategory>> {
        let payload = self
            .upstream
            .fetch(connection, class.categories_action(), &[])
            .await?;
        decode_records(payload, "category list")
    }

    async fn fetch_streams(
        &self,
        connection: &Connection,
        class: ContentClass,
    ) -> AppResult<FetchedStreams> {
        let payload = self
            .upstream
            .fetch(connection, class.streams_action(), &[])
            .await?;
        let fetched = match class {
            ContentClass::Live => FetchedStreams::Live(decode_records(payload, "live streams")?),
            ContentClass::Vod => FetchedStreams::Vod(decode_records(payload, "vod streams")?),
            ContentClass::Series => {
                FetchedStreams::Series(SeriesPayload::from_value(payload)?.0)
            }
        };
        Ok(fetched)
    }

    async fn insert_streams(
        &self,
        connection_id: i64,
        class: ContentClass,
        streams: FetchedStreams,
    ) -> AppResult<usize> {
        let inserted = match streams {
            FetchedStreams::Live(records) => {
                self.store.insert_live_streams(connection_id, &records).await?
            }
            FetchedStreams::Vod(records) => {
                self.store.insert_vod_streams(connection_id, &records).await?
            }
            FetchedStreams::Series(records) => {
                self.store.insert_series(connection_id, &records).await?
            }
        };
        debug!("Inserted {} {} rows for connection {}", inserted, class, connection_id);
        Ok(inserted)
    }
}

enum FetchedStreams {
    Live(Vec<UpstreamLiveStream>),
    Vod(Vec<UpstreamVodStream>),
    Series(Vec<crate::models::UpstreamSeries>),
}

/// Decode a payload that is expected to be a JSON array of records.
/// `Null` (an empty upstream body) is an empty list; any other non-array
/// shape is fatal.
fn decode_records<T: serde::de::DeserializeOwned>(
    payload: Value,
    what: &str,
) -> AppResult<Vec<T>> {
    match payload {
        Value::Null => Ok(Vec::new()),
        Value::Array(_) => serde_json::from_value(payload).map_err(|e| {
            UpstreamError::Parse {
                message: format!("failed to decode {what}: {e}"),
            }
            .into()
        }),
        other => Err(UpstreamError::unexpected_shape(format!(
            "{what} payload is {}, expected an array",
            json_type_name(&other)
        ))
        .into()),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Job descriptor flowing through the sync queue
#[derive(Debug, Clone)]
pub struct SyncJob {
    pub connection_id: i64,
    pub class: ContentClass,
}

impl SyncJob {
    fn key(&self) -> String {
        format!("{}:{}", self.connection_id, self.class)
    }
}

/// Bounded background pool running sync jobs
///
/// Duplicate submissions for the same (connection, class) are rejected while
/// the earlier job is queued or running. A full queue rejects outright; the
/// caller retries later.
pub struct SyncService {
    tx: mpsc::Sender<SyncJob>,
    in_flight: Arc<RwLock<HashSet<String>>>,
}

impl SyncService {
    /// Spawn `workers` tasks sharing one bounded queue and return the
    /// submission handle.
    pub fn start(engine: SyncEngine, workers: usize, queue_depth: usize) -> Self {
        let (tx, rx) = mpsc::channel::<SyncJob>(queue_depth.max(1));
        let rx = Arc::new(tokio::sync::Mutex::new(rx));
        let in_flight: Arc<RwLock<HashSet<String>>> = Arc::new(RwLock::new(HashSet::new()));
        let engine = Arc::new(engine);

        for worker_id in 0..workers.max(1) {
            let rx = Arc::clone(&rx);
            let in_flight = Arc::clone(&in_flight);
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                loop {
                    let job = {
                        let mut guard = rx.lock().await;
                        guard.recv().await
                    };
                    let Some(job) = job else {
                        debug!("Sync worker {} shutting down", worker_id);
                        break;
                    };

                    let key = job.key();
                    debug!("Sync worker {} picked up job {}", worker_id, key);
                    match engine.sync(job.connection_id, job.class).await {
                        Ok(outcome) => {
                            info!("Sync worker {}: {}", worker_id, outcome.message());
                        }
                        Err(e) => {
                            error!("Sync worker {}: job {} failed: {}", worker_id, key, e);
                        }
                    }

                    if let Ok(mut set) = in_flight.write() {
                        set.remove(&key);
                    }
                }
            });
        }

        Self { tx, in_flight }
    }

    /// Queue a sync job. Rejects when the same (connection, class) is
    /// already queued or running, or when the queue is full.
    pub fn submit(&self, connection_id: i64, class: ContentClass) -> AppResult<()> {
        let job = SyncJob {
            connection_id,
            class,
        };
        let key = job.key();

        {
            let mut set = self
                .in_flight
                .write()
                .map_err(|_| AppError::internal("sync in-flight registry poisoned"))?;
            if !set.insert(key.clone()) {
                return Err(AppError::operation_in_progress("sync", key));
            }
        }

        match self.tx.try_send(job) {
            Ok(()) => Ok(()),
            Err(e) => {
                if let Ok(mut set) = self.in_flight.write() {
                    set.remove(&key);
                }
                match e {
                    mpsc::error::TrySendError::Full(_) => Err(AppError::Overloaded {
                        message: "sync queue is full, retry later".to_string(),
                    }),
                    mpsc::error::TrySendError::Closed(_) => {
                        Err(AppError::internal("sync workers are not running"))
                    }
                }
            }
        }
    }

    /// Whether a sync for this (connection, class) is queued or running
    pub fn is_in_flight(&self, connection_id: i64, class: ContentClass) -> bool {
        let key = format!("{connection_id}:{class}");
        self.in_flight
            .read()
            .map(|set| set.contains(&key))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_records_accepts_null_and_array() {
        let empty: Vec<UpstreamCategory> = decode_records(Value::Null, "categories").unwrap();
        assert!(empty.is_empty());

        let parsed: Vec<UpstreamCategory> = decode_records(
            serde_json::json!([{"category_id": "7", "category_name": "News"}]),
            "categories",
        )
        .unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].category_id.as_deref(), Some("7"));
    }

    #[test]
    fn decode_records_rejects_objects() {
        let err = decode_records::<UpstreamCategory>(
            serde_json::json!({"error": "blocked"}),
            "categories",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            AppError::Upstream(UpstreamError::UnexpectedShape { .. })
        ));
    }
}
