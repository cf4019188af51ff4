//! Xtream Codes upstream client
//!
//! Every catalog request is a GET against the provider's `player_api.php`
//! with `username`, `password`, and an `action` query parameter. Providers
//! are wildly inconsistent about failure signalling, so the client
//! normalizes everything into [`UpstreamError`] variants before the sync
//! engine sees it.

use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::UpstreamConfig;
use crate::errors::{AppError, AppResult, UpstreamError};
use crate::models::Connection;
use crate::utils::url::{normalize_origin, obfuscate_credentials};

/// Catalog API surface the sync engine depends on
///
/// Kept as a trait so tests can substitute a canned upstream without a
/// network in reach.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Perform one player_api action and return the decoded JSON payload.
    /// An empty response body decodes to `Value::Null`.
    async fn fetch(
        &self,
        connection: &Connection,
        action: &str,
        extra: &[(&str, &str)],
    ) -> AppResult<Value>;
}

/// reqwest-backed Xtream Codes client
pub struct XtreamClient {
    client: reqwest::Client,
}

impl XtreamClient {
    pub fn new(config: &UpstreamConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| AppError::configuration(format!("HTTP client build failed: {e}")))?;
        Ok(Self { client })
    }

    /// Build the player_api endpoint for a provider origin. Appending is
    /// idempotent: an origin that already ends in player_api.php is used
    /// as-is.
    pub fn player_api_url(origin: &str) -> AppResult<Url> {
        let base = normalize_origin(origin);
        let endpoint = if base.ends_with("/player_api.php") {
            base
        } else {
            format!("{base}/player_api.php")
        };
        Url::parse(&endpoint)
            .map_err(|e| AppError::validation(format!("Invalid provider URL {origin}: {e}")))
    }

    async fn call(
        &self,
        origin: &str,
        username: &str,
        password: &str,
        action: Option<&str>,
        extra: &[(&str, &str)],
    ) -> AppResult<Value> {
        let mut url = Self::player_api_url(origin)?;
        url.query_pairs_mut()
            .append_pair("username", username)
            .append_pair("password", password);
        if let Some(action) = action {
            url.query_pairs_mut().append_pair("action", action);
        }
        for (key, value) in extra {
            url.query_pairs_mut().append_pair(key, value);
        }

        let safe_url = obfuscate_credentials(url.as_str());
        debug!("Upstream request: {}", safe_url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_request_error(e, &safe_url))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Upstream returned {} for {}", status, safe_url);
            return Err(UpstreamError::Http {
                status: status.as_u16(),
                message: format!("request to {safe_url} failed"),
            }
            .into());
        }

        let body = response.text().await.map_err(|e| UpstreamError::Transport {
            message: format!("failed reading body from {safe_url}: {e}"),
        })?;

        decode_payload(&body).map_err(AppError::from)
    }

    /// Authenticate against a provider and return the raw auth payload.
    /// A payload missing either `user_info` or `server_info` is treated as
    /// an authentication failure, surfacing the provider's own message when
    /// it supplies one.
    pub async fn authenticate(
        &self,
        origin: &str,
        username: &str,
        password: &str,
    ) -> AppResult<(Value, Value)> {
        let payload = self.call(origin, username, password, None, &[]).await?;

        let user_info = payload.get("user_info").cloned();
        let server_info = payload.get("server_info").cloned();

        match (user_info, server_info) {
            (Some(user_info), Some(server_info)) => Ok((user_info, server_info)),
            _ => {
                let message = payload
                    .get("user_info")
                    .and_then(|u| u.get("message"))
                    .and_then(Value::as_str)
                    .unwrap_or("provider did not return user and server information")
                    .to_string();
                Err(UpstreamError::auth_failed(message).into())
            }
        }
    }
}

#[async_trait]
impl CatalogApi for XtreamClient {
    async fn fetch(
        &self,
        connection: &Connection,
        action: &str,
        extra: &[(&str, &str)],
    ) -> AppResult<Value> {
        self.call(
            &connection.server_url,
            &connection.username,
            &connection.password,
            Some(action),
            extra,
        )
        .await
    }
}

fn classify_request_error(error: reqwest::Error, safe_url: &str) -> AppError {
    if error.is_timeout() {
        UpstreamError::Timeout {
            url: safe_url.to_string(),
        }
        .into()
    } else {
        UpstreamError::Transport {
            message: format!("request to {safe_url} failed: {error}"),
        }
        .into()
    }
}

/// Decode a response body. Some providers answer valid requests with an
/// empty body instead of `[]`; that is success with nothing in it. A
/// non-empty body that is not JSON is a hard parse failure.
fn decode_payload(body: &str) -> Result<Value, UpstreamError> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(|e| UpstreamError::Parse {
        message: format!("invalid JSON from upstream: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_api_url_appends_endpoint_once() {
        let from_origin = XtreamClient::player_api_url("http://host:8080").unwrap();
        assert_eq!(from_origin.as_str(), "http://host:8080/player_api.php");

        let trailing_slash = XtreamClient::player_api_url("http://host:8080/").unwrap();
        assert_eq!(trailing_slash.as_str(), "http://host:8080/player_api.php");

        let already_full =
            XtreamClient::player_api_url("http://host:8080/player_api.php").unwrap();
        assert_eq!(already_full.as_str(), "http://host:8080/player_api.php");
    }

    #[test]
    fn player_api_url_rejects_garbage() {
        assert!(XtreamClient::player_api_url("not a url").is_err());
    }

    #[test]
    fn empty_body_decodes_to_null() {
        assert_eq!(decode_payload("").unwrap(), Value::Null);
        assert_eq!(decode_payload("   \n").unwrap(), Value::Null);
    }

    #[test]
    fn malformed_body_is_a_parse_error() {
        let err = decode_payload("<html>banned</html>").unwrap_err();
        assert!(matches!(err, UpstreamError::Parse { .. }));
    }

    #[test]
    fn valid_json_passes_through() {
        let value = decode_payload(r#"[{"category_id":"1"}]"#).unwrap();
        assert!(value.is_array());
    }
}
