//! Repository for the per-class catalog cache tables
//!
//! The write path is the sync engine's full-replace contract: bulk
//! delete-by-(connection, class) followed by chunked bulk inserts. The read
//! path serves the REST catalog endpoints straight from the cache.

use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::entities::{
    categories, live_streams,
    prelude::{Categories, LiveStreams, Series, VodStreams},
    series, vod_streams,
};
use crate::errors::RepositoryError;
use crate::models::{
    ContentClass, UpstreamCategory, UpstreamLiveStream, UpstreamSeries, UpstreamVodStream,
};

/// Rows per bulk insert statement; keeps bind-variable counts well under
/// SQLite's limit for the widest table.
const INSERT_BATCH_SIZE: usize = 500;

/// Maximum rows returned by a name search
const SEARCH_LIMIT: u64 = 100;

/// Row counts per class for one connection
#[derive(Debug, Clone, Serialize)]
pub struct CatalogCounts {
    pub total_live_channels: u64,
    pub total_vod: u64,
    pub total_series: u64,
    pub total_categories: u64,
}

/// A page of rows plus the total matching count
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

/// SeaORM-based repository for the catalog cache
#[derive(Clone)]
pub struct CatalogRepository {
    connection: Arc<DatabaseConnection>,
}

impl CatalogRepository {
    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        Self { connection }
    }

    /// Delete every stream and category row for one (connection, class).
    /// First step of a full-replace sync; a crash before the inserts leaves
    /// the class empty, never stale.
    pub async fn delete_class(
        &self,
        connection_id: i64,
        class: ContentClass,
    ) -> Result<(), RepositoryError> {
        match class {
            ContentClass::Live => {
                LiveStreams::delete_many()
                    .filter(live_streams::Column::ConnectionId.eq(connection_id))
                    .exec(&*self.connection)
                    .await?;
            }
            ContentClass::Vod => {
                VodStreams::delete_many()
                    .filter(vod_streams::Column::ConnectionId.eq(connection_id))
                    .exec(&*self.connection)
                    .await?;
            }
            ContentClass::Series => {
                Series::delete_many()
                    .filter(series::Column::ConnectionId.eq(connection_id))
                    .exec(&*self.connection)
                    .await?;
            }
        }

        Categories::delete_many()
            .filter(categories::Column::ConnectionId.eq(connection_id))
            .filter(categories::Column::StreamType.eq(class.as_str()))
            .exec(&*self.connection)
            .await?;

        debug!(
            "Deleted cached {} rows for connection {}",
            class, connection_id
        );
        Ok(())
    }

    /// Delete every cached row for a connection across all classes
    pub async fn clear_connection(&self, connection_id: i64) -> Result<(), RepositoryError> {
        for class in [ContentClass::Live, ContentClass::Vod, ContentClass::Series] {
            self.delete_class(connection_id, class).await?;
        }
        Ok(())
    }

    /// Bulk-insert projected categories, tagged with connection and class.
    /// Returns the number of rows inserted; an empty input inserts nothing.
    pub async fn insert_categories(
        &self,
        connection_id: i64,
        class: ContentClass,
        records: &[UpstreamCategory],
    ) -> Result<usize, RepositoryError> {
        let models: Vec<categories::ActiveModel> = records
            .iter()
            .filter_map(|c| {
                let category_id = c.category_id.clone()?;
                Some(categories::ActiveModel {
                    connection_id: Set(connection_id),
                    category_id: Set(category_id),
                    category_name: Set(c.category_name.clone().unwrap_or_default()),
                    parent_id: Set(c.parent_id),
                    stream_type: Set(class.as_str().to_string()),
                    ..Default::default()
                })
            })
            .collect();

        let inserted = models.len();
        for chunk in chunked(models) {
            Categories::insert_many(chunk).exec(&*self.connection).await?;
        }
        Ok(inserted)
    }

    pub async fn insert_live_streams(
        &self,
        connection_id: i64,
        records: &[UpstreamLiveStream],
    ) -> Result<usize, RepositoryError> {
        let models: Vec<live_streams::ActiveModel> = records
            .iter()
            .map(|s| live_streams::ActiveModel {
                connection_id: Set(connection_id),
                stream_id: Set(s.stream_id),
                name: Set(s.name.clone()),
                stream_icon: Set(s.stream_icon.clone()),
                category_id: Set(s.category_id.clone()),
                epg_channel_id: Set(s.epg_channel_id.clone()),
                added: Set(s.added.clone()),
                is_adult: Set(s.is_adult.clone().or_else(|| Some("0".to_string()))),
                ..Default::default()
            })
            .collect();

        let inserted = models.len();
        for chunk in chunked(models) {
            LiveStreams::insert_many(chunk)
                .exec(&*self.connection)
                .await?;
        }
        Ok(inserted)
    }

    pub async fn insert_vod_streams(
        &self,
        connection_id: i64,
        records: &[UpstreamVodStream],
    ) -> Result<usize, RepositoryError> {
        let models: Vec<vod_streams::ActiveModel> = records
            .iter()
            .map(|s| vod_streams::ActiveModel {
                connection_id: Set(connection_id),
                stream_id: Set(s.stream_id),
                name: Set(s.name.clone()),
                stream_icon: Set(s.stream_icon.clone()),
                category_id: Set(s.category_id.clone()),
                added: Set(s.added.clone()),
                container_extension: Set(s.container_extension.clone()),
                rating: Set(s.rating.clone()),
                rating_5based: Set(s.rating_5based),
                year: Set(s.year.clone()),
                ..Default::default()
            })
            .collect();

        let inserted = models.len();
        for chunk in chunked(models) {
            VodStreams::insert_many(chunk)
                .exec(&*self.connection)
                .await?;
        }
        Ok(inserted)
    }

    pub async fn insert_series(
        &self,
        connection_id: i64,
        records: &[UpstreamSeries],
    ) -> Result<usize, RepositoryError> {
        let models: Vec<series::ActiveModel> = records
            .iter()
            .map(|s| series::ActiveModel {
                connection_id: Set(connection_id),
                series_id: Set(s.series_id),
                name: Set(s.name.clone()),
                cover: Set(s.cover.clone()),
                plot: Set(s.plot.clone()),
                cast: Set(s.cast.clone()),
                director: Set(s.director.clone()),
                genre: Set(s.genre.clone()),
                release_date: Set(s.release_date.clone()),
                last_modified: Set(s.last_modified.clone()),
                rating: Set(s.rating.clone()),
                rating_5based: Set(s.rating_5based),
                backdrop_path: Set(s.backdrop_path.clone()),
                youtube_trailer: Set(s.youtube_trailer.clone()),
                episode_run_time: Set(s.episode_run_time.clone()),
                category_id: Set(s.category_id.clone()),
                year: Set(s.year.clone()),
                ..Default::default()
            })
            .collect();

        let inserted = models.len();
        for chunk in chunked(models) {
            Series::insert_many(chunk).exec(&*self.connection).await?;
        }
        Ok(inserted)
    }

    /// Categories for one (connection, class), ordered by name
    pub async fn categories(
        &self,
        connection_id: i64,
        class: ContentClass,
    ) -> Result<Vec<categories::Model>, RepositoryError> {
        let models = Categories::find()
            .filter(categories::Column::ConnectionId.eq(connection_id))
            .filter(categories::Column::StreamType.eq(class.as_str()))
            .order_by_asc(categories::Column::CategoryName)
            .all(&*self.connection)
            .await?;
        Ok(models)
    }

    /// A page of live channels, optionally filtered by category
    pub async fn live_streams_page(
        &self,
        connection_id: i64,
        category_id: Option<&str>,
        page: u64,
        limit: u64,
    ) -> Result<Page<live_streams::Model>, RepositoryError> {
        let mut query = LiveStreams::find()
            .filter(live_streams::Column::ConnectionId.eq(connection_id));
        if let Some(cat) = category_id {
            query = query.filter(live_streams::Column::CategoryId.eq(cat));
        }
        let paginator = query
            .order_by_asc(live_streams::Column::Name)
            .paginate(&*self.connection, limit.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok(Page { items, total })
    }

    /// A page of VOD titles, optionally filtered by category
    pub async fn vod_streams_page(
        &self,
        connection_id: i64,
        category_id: Option<&str>,
        page: u64,
        limit: u64,
    ) -> Result<Page<vod_streams::Model>, RepositoryError> {
        let mut query =
            VodStreams::find().filter(vod_streams::Column::ConnectionId.eq(connection_id));
        if let Some(cat) = category_id {
            query = query.filter(vod_streams::Column::CategoryId.eq(cat));
        }
        let paginator = query
            .order_by_asc(vod_streams::Column::Name)
            .paginate(&*self.connection, limit.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok(Page { items, total })
    }

    /// A page of series, optionally filtered by category
    pub async fn series_page(
        &self,
        connection_id: i64,
        category_id: Option<&str>,
        page: u64,
        limit: u64,
    ) -> Result<Page<series::Model>, RepositoryError> {
        let mut query = Series::find().filter(series::Column::ConnectionId.eq(connection_id));
        if let Some(cat) = category_id {
            query = query.filter(series::Column::CategoryId.eq(cat));
        }
        let paginator = query
            .order_by_asc(series::Column::Name)
            .paginate(&*self.connection, limit.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok(Page { items, total })
    }

    /// Name-substring search within one class
    pub async fn search(
        &self,
        connection_id: i64,
        class: ContentClass,
        query: &str,
    ) -> Result<serde_json::Value, RepositoryError> {
        let value = match class {
            ContentClass::Live => {
                let items = LiveStreams::find()
                    .filter(live_streams::Column::ConnectionId.eq(connection_id))
                    .filter(live_streams::Column::Name.contains(query))
                    .order_by_asc(live_streams::Column::Name)
                    .limit(SEARCH_LIMIT)
                    .all(&*self.connection)
                    .await?;
                serde_json::to_value(items)?
            }
            ContentClass::Vod => {
                let items = VodStreams::find()
                    .filter(vod_streams::Column::ConnectionId.eq(connection_id))
                    .filter(vod_streams::Column::Name.contains(query))
                    .order_by_asc(vod_streams::Column::Name)
                    .limit(SEARCH_LIMIT)
                    .all(&*self.connection)
                    .await?;
                serde_json::to_value(items)?
            }
            ContentClass::Series => {
                let items = Series::find()
                    .filter(series::Column::ConnectionId.eq(connection_id))
                    .filter(series::Column::Name.contains(query))
                    .order_by_asc(series::Column::Name)
                    .limit(SEARCH_LIMIT)
                    .all(&*self.connection)
                    .await?;
                serde_json::to_value(items)?
            }
        };
        Ok(value)
    }

    /// Full rows for a set of stream ids, across every class. Each entry is
    /// tagged with its class so mixed-id lookups stay unambiguous.
    pub async fn find_by_stream_ids(
        &self,
        stream_ids: &[i64],
    ) -> Result<Vec<serde_json::Value>, RepositoryError> {
        if stream_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut found = Vec::new();

        let live = LiveStreams::find()
            .filter(live_streams::Column::StreamId.is_in(stream_ids.iter().copied()))
            .all(&*self.connection)
            .await?;
        for model in live {
            found.push(tag_with_class(serde_json::to_value(model)?, ContentClass::Live));
        }

        let vod = VodStreams::find()
            .filter(vod_streams::Column::StreamId.is_in(stream_ids.iter().copied()))
            .all(&*self.connection)
            .await?;
        for model in vod {
            found.push(tag_with_class(serde_json::to_value(model)?, ContentClass::Vod));
        }

        let series_rows = Series::find()
            .filter(series::Column::SeriesId.is_in(stream_ids.iter().copied()))
            .all(&*self.connection)
            .await?;
        for model in series_rows {
            found.push(tag_with_class(
                serde_json::to_value(model)?,
                ContentClass::Series,
            ));
        }

        Ok(found)
    }

    /// Every stream of one class, grouped under its category. Streams whose
    /// category id matches no stored category land in an unnamed trailing
    /// group.
    pub async fn streams_by_category(
        &self,
        connection_id: i64,
        class: ContentClass,
    ) -> Result<serde_json::Value, RepositoryError> {
        let categories = self.categories(connection_id, class).await?;

        let rows: Vec<(Option<String>, serde_json::Value)> = match class {
            ContentClass::Live => {
                let items = LiveStreams::find()
                    .filter(live_streams::Column::ConnectionId.eq(connection_id))
                    .order_by_asc(live_streams::Column::Name)
                    .all(&*self.connection)
                    .await?;
                items
                    .into_iter()
                    .map(|m| {
                        let cat = m.category_id.clone();
                        serde_json::to_value(m).map(|v| (cat, v))
                    })
                    .collect::<Result<_, _>>()?
            }
            ContentClass::Vod => {
                let items = VodStreams::find()
                    .filter(vod_streams::Column::ConnectionId.eq(connection_id))
                    .order_by_asc(vod_streams::Column::Name)
                    .all(&*self.connection)
                    .await?;
                items
                    .into_iter()
                    .map(|m| {
                        let cat = m.category_id.clone();
                        serde_json::to_value(m).map(|v| (cat, v))
                    })
                    .collect::<Result<_, _>>()?
            }
            ContentClass::Series => {
                let items = Series::find()
                    .filter(series::Column::ConnectionId.eq(connection_id))
                    .order_by_asc(series::Column::Name)
                    .all(&*self.connection)
                    .await?;
                items
                    .into_iter()
                    .map(|m| {
                        let cat = m.category_id.clone();
                        serde_json::to_value(m).map(|v| (cat, v))
                    })
                    .collect::<Result<_, _>>()?
            }
        };

        let mut grouped: Vec<serde_json::Value> = Vec::with_capacity(categories.len());
        let mut leftovers = rows;
        for category in categories {
            let (matching, rest): (Vec<_>, Vec<_>) = leftovers
                .into_iter()
                .partition(|(cat, _)| cat.as_deref() == Some(category.category_id.as_str()));
            leftovers = rest;
            grouped.push(serde_json::json!({
                "category_id": category.category_id,
                "category_name": category.category_name,
                "streams": matching.into_iter().map(|(_, v)| v).collect::<Vec<_>>(),
            }));
        }
        if !leftovers.is_empty() {
            grouped.push(serde_json::json!({
                "category_id": serde_json::Value::Null,
                "category_name": "Uncategorized",
                "streams": leftovers.into_iter().map(|(_, v)| v).collect::<Vec<_>>(),
            }));
        }

        Ok(serde_json::Value::Array(grouped))
    }

    /// Per-class row counts for the dashboard
    pub async fn counts(&self, connection_id: i64) -> Result<CatalogCounts, RepositoryError> {
        let live = LiveStreams::find()
            .filter(live_streams::Column::ConnectionId.eq(connection_id))
            .count(&*self.connection)
            .await?;
        let vod = VodStreams::find()
            .filter(vod_streams::Column::ConnectionId.eq(connection_id))
            .count(&*self.connection)
            .await?;
        let series_count = Series::find()
            .filter(series::Column::ConnectionId.eq(connection_id))
            .count(&*self.connection)
            .await?;
        let categories_count = Categories::find()
            .filter(categories::Column::ConnectionId.eq(connection_id))
            .count(&*self.connection)
            .await?;

        Ok(CatalogCounts {
            total_live_channels: live,
            total_vod: vod,
            total_series: series_count,
            total_categories: categories_count,
        })
    }
}

fn tag_with_class(mut value: serde_json::Value, class: ContentClass) -> serde_json::Value {
    if let Some(map) = value.as_object_mut() {
        map.insert(
            "stream_type".to_string(),
            serde_json::Value::String(class.as_str().to_string()),
        );
    }
    value
}

/// Split active models into insert-sized chunks, dropping nothing
fn chunked<T>(models: Vec<T>) -> Vec<Vec<T>> {
    if models.is_empty() {
        return Vec::new();
    }
    let mut chunks = Vec::with_capacity(models.len().div_ceil(INSERT_BATCH_SIZE));
    let mut current = Vec::with_capacity(INSERT_BATCH_SIZE.min(models.len()));
    for model in models {
        current.push(model);
        if current.len() == INSERT_BATCH_SIZE {
            chunks.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
