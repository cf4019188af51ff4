//! HLS stream proxy
//!
//! Media players cannot always reach IPTV origins directly (mixed content,
//! CORS, geo-fenced CDNs), so playlists and segments are funnelled through
//! one endpoint. HLS playlists are rewritten line by line so every URI
//! points back at the proxy route; everything else streams through without
//! buffering.

use reqwest::Url;
use std::time::Duration;
use tracing::debug;

use crate::config::ProxyConfig;
use crate::errors::{AppError, AppResult, ProxyError};

/// Content types that mark a response as an HLS playlist
const HLS_CONTENT_TYPES: &[&str] = &["application/vnd.apple.mpegurl", "application/x-mpegurl"];

/// Upstream response, either a playlist body ready to rewrite or a raw
/// response to stream through
pub enum ProxiedResponse {
    Playlist {
        content_type: String,
        body: String,
    },
    Passthrough(reqwest::Response),
}

/// reqwest-backed stream proxy
///
/// IPTV origins routinely present self-signed or expired certificates, so
/// certificate validation is disabled on this client only. The catalog
/// client keeps validation on.
pub struct ProxyService {
    client: reqwest::Client,
    route_path: String,
}

impl ProxyService {
    pub fn new(config: &ProxyConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.clone())
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| AppError::configuration(format!("proxy client build failed: {e}")))?;
        Ok(Self {
            client,
            route_path: config.route_path.clone(),
        })
    }

    pub fn route_path(&self) -> &str {
        &self.route_path
    }

    /// Fetch an upstream URL. Playlist responses are buffered for rewriting;
    /// anything else is handed back still streaming.
    pub async fn fetch(&self, url: &str) -> AppResult<ProxiedResponse> {
        let parsed = Url::parse(url)
            .map_err(|e| AppError::validation(format!("invalid proxy target: {e}")))?;

        debug!("Proxying {}", parsed);

        let response = self
            .client
            .get(parsed.clone())
            .header(reqwest::header::REFERER, url)
            .send()
            .await
            .map_err(|e| classify(e, url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProxyError::Upstream {
                message: format!("origin returned {status} for {url}"),
            }
            .into());
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();

        if is_hls_playlist(&content_type) {
            let body = response.text().await.map_err(|e| ProxyError::Upstream {
                message: format!("failed reading playlist from {url}: {e}"),
            })?;
            let rewritten = rewrite_playlist(&body, &parsed, &self.route_path);
            Ok(ProxiedResponse::Playlist {
                content_type,
                body: rewritten,
            })
        } else {
            Ok(ProxiedResponse::Passthrough(response))
        }
    }
}

fn classify(error: reqwest::Error, url: &str) -> AppError {
    if error.is_timeout() {
        ProxyError::Timeout {
            url: url.to_string(),
        }
        .into()
    } else {
        ProxyError::Upstream {
            message: format!("fetch of {url} failed: {error}"),
        }
        .into()
    }
}

/// Whether a Content-Type header names an HLS playlist
pub fn is_hls_playlist(content_type: &str) -> bool {
    let lowered = content_type.to_ascii_lowercase();
    HLS_CONTENT_TYPES.iter().any(|t| lowered.contains(t))
}

/// Rewrite every URI line of an HLS playlist to point back at the proxy.
///
/// Directive lines (starting with `#`) and blank lines pass through
/// byte-identical; URI lines are resolved against the playlist's own URL
/// and become `{route_path}?url=<percent-encoded absolute URL>`. Relative
/// segment paths, absolute paths, and fully qualified URLs all resolve the
/// same way through [`Url::join`].
pub fn rewrite_playlist(playlist: &str, base: &Url, route_path: &str) -> String {
    playlist
        .split('\n')
        .map(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                return line.to_string();
            }
            match base.join(trimmed) {
                Ok(absolute) => {
                    format!("{}?url={}", route_path, urlencoding::encode(absolute.as_str()))
                }
                // Unresolvable lines pass through untouched
                Err(_) => line.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("http://host/path/index.m3u8").unwrap()
    }

    #[test]
    fn rewrites_relative_segment_lines() {
        let playlist = "#EXTM3U\nseg1.ts\n";
        let rewritten = rewrite_playlist(playlist, &base(), "/proxy");
        assert_eq!(
            rewritten,
            "#EXTM3U\n/proxy?url=http%3A%2F%2Fhost%2Fpath%2Fseg1.ts\n"
        );
    }

    #[test]
    fn rewrites_absolute_and_rooted_uris() {
        let playlist = "/other/seg.ts\nhttps://cdn.example.com/seg2.ts";
        let rewritten = rewrite_playlist(playlist, &base(), "/proxy");
        let lines: Vec<&str> = rewritten.split('\n').collect();
        assert_eq!(lines[0], "/proxy?url=http%3A%2F%2Fhost%2Fother%2Fseg.ts");
        assert_eq!(
            lines[1],
            "/proxy?url=https%3A%2F%2Fcdn.example.com%2Fseg2.ts"
        );
    }

    #[test]
    fn directives_and_blank_lines_are_untouched() {
        let playlist = "#EXTM3U\n#EXT-X-TARGETDURATION:10\n\n#EXTINF:10.0,\nseg1.ts";
        let rewritten = rewrite_playlist(playlist, &base(), "/proxy");
        let lines: Vec<&str> = rewritten.split('\n').collect();
        assert_eq!(lines[0], "#EXTM3U");
        assert_eq!(lines[1], "#EXT-X-TARGETDURATION:10");
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], "#EXTINF:10.0,");
    }

    #[test]
    fn trailing_newline_is_preserved() {
        let playlist = "#EXTM3U\nseg1.ts\n";
        let rewritten = rewrite_playlist(playlist, &base(), "/proxy");
        assert!(rewritten.ends_with('\n'));

        let no_trailing = "#EXTM3U\nseg1.ts";
        assert!(!rewrite_playlist(no_trailing, &base(), "/proxy").ends_with('\n'));
    }

    #[test]
    fn content_type_detection_is_case_insensitive() {
        assert!(is_hls_playlist("application/vnd.apple.mpegurl"));
        assert!(is_hls_playlist("Application/X-MPEGURL; charset=utf-8"));
        assert!(!is_hls_playlist("video/mp2t"));
        assert!(!is_hls_playlist("application/octet-stream"));
    }
}
