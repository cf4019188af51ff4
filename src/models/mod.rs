//! Domain models and upstream payload types
//!
//! Upstream Xtream servers are notoriously inconsistent about field types:
//! the same field arrives as a string on one server and as a number on
//! another. The deserializers in this module normalize those variations once,
//! at the edge, so the rest of the application works with stable shapes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{AppError, UpstreamError};

/// One of the three catalog content classes served by the upstream provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentClass {
    Live,
    Vod,
    Series,
}

impl ContentClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentClass::Live => "live",
            ContentClass::Vod => "vod",
            ContentClass::Series => "series",
        }
    }

    /// Upstream API action that lists this class's categories.
    pub fn categories_action(&self) -> &'static str {
        match self {
            ContentClass::Live => "get_live_categories",
            ContentClass::Vod => "get_vod_categories",
            ContentClass::Series => "get_series_categories",
        }
    }

    /// Upstream API action that lists this class's full stream set.
    pub fn streams_action(&self) -> &'static str {
        match self {
            ContentClass::Live => "get_live_streams",
            ContentClass::Vod => "get_vod_streams",
            ContentClass::Series => "get_series",
        }
    }

    /// Path segment used when building playback URLs. The upstream exposes
    /// VOD under `/movie/`, everything else under its own class name.
    pub fn stream_path_segment(&self) -> &'static str {
        match self {
            ContentClass::Vod => "movie",
            ContentClass::Live => "live",
            ContentClass::Series => "series",
        }
    }
}

impl fmt::Display for ContentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentClass {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "live" => Ok(ContentClass::Live),
            "vod" | "movie" => Ok(ContentClass::Vod),
            "series" => Ok(ContentClass::Series),
            other => Err(AppError::validation(format!(
                "invalid content class '{other}' (expected live, vod or series)"
            ))),
        }
    }
}

/// A stored upstream account, as held in `xtream_connections`.
#[derive(Debug, Clone)]
pub struct Connection {
    pub id: i64,
    pub server_url: String,
    pub username: String,
    pub password: String,
    pub is_active: bool,
    /// Raw `user_info` blob cached at authentication time (JSON text)
    pub user_info: Option<String>,
    /// Raw `server_info` blob cached at authentication time (JSON text)
    pub server_info: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub last_used: chrono::DateTime<chrono::Utc>,
    pub last_synced_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Connection {
    /// Client-facing view of a connection. The upstream secret stays out of
    /// every response body.
    pub fn into_view(self) -> ConnectionView {
        ConnectionView {
            id: self.id,
            server_url: self.server_url,
            username: self.username,
            is_active: self.is_active,
            user_info: self
                .user_info
                .as_deref()
                .and_then(|s| serde_json::from_str(s).ok()),
            server_info: self
                .server_info
                .as_deref()
                .and_then(|s| serde_json::from_str(s).ok()),
            created_at: self.created_at,
            last_used: self.last_used,
            last_synced_at: self.last_synced_at,
        }
    }
}

/// Serializable projection of [`Connection`] without the password.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionView {
    pub id: i64,
    pub server_url: String,
    pub username: String,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_info: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_info: Option<serde_json::Value>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub last_used: chrono::DateTime<chrono::Utc>,
    pub last_synced_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Category entry as returned by `get_*_categories`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamCategory {
    #[serde(deserialize_with = "deserialize_loose_string_option", default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(deserialize_with = "deserialize_loose_int_option", default)]
    pub parent_id: Option<i64>,
}

/// Live channel entry as returned by `get_live_streams`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamLiveStream {
    #[serde(deserialize_with = "deserialize_loose_int")]
    pub stream_id: i64,
    pub name: String,
    #[serde(default)]
    pub stream_icon: Option<String>,
    #[serde(deserialize_with = "deserialize_loose_string_option", default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub epg_channel_id: Option<String>,
    #[serde(deserialize_with = "deserialize_loose_string_option", default)]
    pub added: Option<String>,
    #[serde(deserialize_with = "deserialize_loose_string_option", default)]
    pub is_adult: Option<String>,
}

/// VOD title entry as returned by `get_vod_streams`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamVodStream {
    #[serde(deserialize_with = "deserialize_loose_int")]
    pub stream_id: i64,
    pub name: String,
    #[serde(default)]
    pub stream_icon: Option<String>,
    #[serde(deserialize_with = "deserialize_loose_string_option", default)]
    pub category_id: Option<String>,
    #[serde(deserialize_with = "deserialize_loose_string_option", default)]
    pub added: Option<String>,
    #[serde(default)]
    pub container_extension: Option<String>,
    #[serde(deserialize_with = "deserialize_loose_string_option", default)]
    pub rating: Option<String>,
    #[serde(deserialize_with = "deserialize_loose_float_option", default)]
    pub rating_5based: Option<f64>,
    #[serde(deserialize_with = "deserialize_loose_string_option", default)]
    pub year: Option<String>,
}

/// Series entry as returned by `get_series`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamSeries {
    #[serde(deserialize_with = "deserialize_loose_int")]
    pub series_id: i64,
    pub name: String,
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(default)]
    pub plot: Option<String>,
    #[serde(default)]
    pub cast: Option<String>,
    #[serde(default)]
    pub director: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(deserialize_with = "deserialize_loose_string_option", default)]
    pub last_modified: Option<String>,
    #[serde(deserialize_with = "deserialize_loose_string_option", default)]
    pub rating: Option<String>,
    #[serde(deserialize_with = "deserialize_loose_float_option", default)]
    pub rating_5based: Option<f64>,
    #[serde(deserialize_with = "deserialize_backdrop_path", default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub youtube_trailer: Option<String>,
    #[serde(deserialize_with = "deserialize_loose_string_option", default)]
    pub episode_run_time: Option<String>,
    #[serde(deserialize_with = "deserialize_loose_string_option", default)]
    pub category_id: Option<String>,
    #[serde(deserialize_with = "deserialize_loose_string_option", default)]
    pub year: Option<String>,
}

/// The `get_series` payload resolved into a single ordered record sequence.
///
/// Some upstream servers return a plain JSON array; others return an object
/// keyed by arbitrary series ids. Both shapes flatten here, once, before any
/// projection logic runs. Anything else is a fatal sync error.
#[derive(Debug)]
pub struct SeriesPayload(pub Vec<UpstreamSeries>);

impl SeriesPayload {
    pub fn from_value(value: serde_json::Value) -> Result<Self, UpstreamError> {
        let records = match value {
            serde_json::Value::Null => Vec::new(),
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(serde_json::from_value)
                .collect::<Result<Vec<UpstreamSeries>, _>>()
                .map_err(|e| UpstreamError::Parse {
                    message: format!("series list entry: {e}"),
                })?,
            serde_json::Value::Object(map) => map
                .into_iter()
                .map(|(_, v)| serde_json::from_value(v))
                .collect::<Result<Vec<UpstreamSeries>, _>>()
                .map_err(|e| UpstreamError::Parse {
                    message: format!("series mapping entry: {e}"),
                })?,
            other => {
                return Err(UpstreamError::unexpected_shape(format!(
                    "get_series returned {}, expected a list or mapping",
                    json_type_name(&other)
                )));
            }
        };
        Ok(SeriesPayload(records))
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "a list",
        serde_json::Value::Object(_) => "a mapping",
    }
}

// Helper deserializers for loosely-typed upstream fields

/// Accept a string or integer and normalize to `i64`.
pub fn deserialize_loose_int<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Unexpected, Visitor};

    struct LooseIntVisitor;

    impl<'de> Visitor<'de> for LooseIntVisitor {
        type Value = i64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer")
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
            Ok(value)
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
            i64::try_from(value)
                .map_err(|_| E::invalid_value(Unexpected::Unsigned(value), &self))
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            value
                .parse()
                .map_err(|_| E::invalid_value(Unexpected::Str(value), &self))
        }
    }

    deserializer.deserialize_any(LooseIntVisitor)
}

/// Accept a string, integer or null and normalize to `Option<i64>`.
pub fn deserialize_loose_int_option<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Unexpected, Visitor};

    struct LooseIntOptionVisitor;

    impl<'de> Visitor<'de> for LooseIntOptionVisitor {
        type Value = Option<i64>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string, integer, or null")
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
            Ok(Some(value))
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
            i64::try_from(value)
                .map(Some)
                .map_err(|_| E::invalid_value(Unexpected::Unsigned(value), &self))
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            if value.is_empty() {
                Ok(None)
            } else {
                value
                    .parse()
                    .map(Some)
                    .map_err(|_| E::invalid_value(Unexpected::Str(value), &self))
            }
        }
    }

    deserializer.deserialize_any(LooseIntOptionVisitor)
}

/// Accept a string, number or null and normalize to `Option<String>`.
///
/// Used wherever the upstream flips between `"category_id": "42"` and
/// `"category_id": 42` depending on the server build.
pub fn deserialize_loose_string_option<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct LooseStringVisitor;

    impl<'de> Visitor<'de> for LooseStringVisitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string, number, or null")
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            if value.is_empty() {
                Ok(None)
            } else {
                Ok(Some(value.to_string()))
            }
        }
    }

    deserializer.deserialize_any(LooseStringVisitor)
}

/// Accept a number, numeric string or null and normalize to `Option<f64>`.
pub fn deserialize_loose_float_option<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct LooseFloatVisitor;

    impl<'de> Visitor<'de> for LooseFloatVisitor {
        type Value = Option<f64>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a number, numeric string, or null")
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
            Ok(Some(value as f64))
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
            Ok(Some(value as f64))
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
            Ok(Some(value))
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            if value.is_empty() {
                Ok(None)
            } else {
                Ok(value.parse().ok())
            }
        }
    }

    deserializer.deserialize_any(LooseFloatVisitor)
}

/// `backdrop_path` arrives as a list of URLs or a single string; lists are
/// joined to a comma-separated string for storage.
pub fn deserialize_backdrop_path<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, SeqAccess, Visitor};

    struct BackdropVisitor;

    impl<'de> Visitor<'de> for BackdropVisitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string, a list of strings, or null")
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            if value.is_empty() {
                Ok(None)
            } else {
                Ok(Some(value.to_string()))
            }
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut parts: Vec<String> = Vec::new();
            while let Some(item) = seq.next_element::<Option<String>>()? {
                if let Some(s) = item {
                    if !s.is_empty() {
                        parts.push(s);
                    }
                }
            }
            if parts.is_empty() {
                Ok(None)
            } else {
                Ok(Some(parts.join(", ")))
            }
        }
    }

    deserializer.deserialize_any(BackdropVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn content_class_round_trips_from_str() {
        assert_eq!("live".parse::<ContentClass>().unwrap(), ContentClass::Live);
        assert_eq!("vod".parse::<ContentClass>().unwrap(), ContentClass::Vod);
        assert_eq!(
            "series".parse::<ContentClass>().unwrap(),
            ContentClass::Series
        );
        assert!("music".parse::<ContentClass>().is_err());
    }

    #[test]
    fn vod_maps_to_movie_path_segment() {
        assert_eq!(ContentClass::Vod.stream_path_segment(), "movie");
        assert_eq!(ContentClass::Live.stream_path_segment(), "live");
        assert_eq!(ContentClass::Series.stream_path_segment(), "series");
    }

    #[test]
    fn live_stream_tolerates_numeric_and_string_ids() {
        let as_number: UpstreamLiveStream =
            serde_json::from_value(json!({"stream_id": 10, "name": "CNN", "category_id": 1}))
                .unwrap();
        let as_string: UpstreamLiveStream = serde_json::from_value(
            json!({"stream_id": "10", "name": "CNN", "category_id": "1"}),
        )
        .unwrap();

        assert_eq!(as_number.stream_id, 10);
        assert_eq!(as_string.stream_id, 10);
        assert_eq!(as_number.category_id.as_deref(), Some("1"));
        assert_eq!(as_string.category_id.as_deref(), Some("1"));
    }

    #[test]
    fn series_payload_flattens_list_and_mapping() {
        let list = json!([{"series_id": 1, "name": "A"}, {"series_id": 2, "name": "B"}]);
        let map = json!({"77": {"series_id": 1, "name": "A"}, "78": {"series_id": 2, "name": "B"}});

        assert_eq!(SeriesPayload::from_value(list).unwrap().0.len(), 2);
        assert_eq!(SeriesPayload::from_value(map).unwrap().0.len(), 2);
        assert!(SeriesPayload::from_value(json!(null)).unwrap().0.is_empty());
    }

    #[test]
    fn series_payload_rejects_scalar_shapes() {
        let err = SeriesPayload::from_value(json!("oops")).unwrap_err();
        assert!(matches!(err, UpstreamError::UnexpectedShape { .. }));
    }

    #[test]
    fn backdrop_path_list_joins_to_string() {
        let series: UpstreamSeries = serde_json::from_value(json!({
            "series_id": "5",
            "name": "Show",
            "backdrop_path": ["http://a/1.jpg", "http://a/2.jpg"]
        }))
        .unwrap();
        assert_eq!(
            series.backdrop_path.as_deref(),
            Some("http://a/1.jpg, http://a/2.jpg")
        );
    }

    #[test]
    fn connection_view_omits_password() {
        let now = chrono::Utc::now();
        let conn = Connection {
            id: 1,
            server_url: "http://example.com".into(),
            username: "user".into(),
            password: "secret".into(),
            is_active: true,
            user_info: Some(r#"{"status":"Active"}"#.into()),
            server_info: None,
            created_at: now,
            last_used: now,
            last_synced_at: None,
        };
        let view = serde_json::to_value(conn.into_view()).unwrap();
        assert!(view.get("password").is_none());
        assert_eq!(view["user_info"]["status"], "Active");
    }
}
