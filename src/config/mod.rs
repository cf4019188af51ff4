//! Application configuration
//!
//! Configuration is loaded from a TOML file; when the file does not exist a
//! default one is written next to the binary so a first run is zero-setup.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub web: WebConfig,
    pub upstream: UpstreamConfig,
    pub sync: SyncConfig,
    pub proxy: ProxyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Settings for catalog requests against Xtream Codes providers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// User-Agent sent on every player_api call; many providers reject
    /// unknown agents, so a browser string is the safe default
    #[serde(default = "default_upstream_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_upstream_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Settings for the background sync worker pool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Number of concurrent sync workers
    #[serde(default = "default_sync_workers")]
    pub workers: usize,
    /// Jobs the queue holds before submissions are rejected
    #[serde(default = "default_sync_queue_depth")]
    pub queue_depth: usize,
}

/// Settings for the HLS stream proxy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// User-Agent presented to media origins; a player string keeps CDNs
    /// from serving browser-targeted redirects
    #[serde(default = "default_proxy_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_proxy_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Route that rewritten playlist entries point back at
    #[serde(default = "default_proxy_route_path")]
    pub route_path: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_upstream_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_upstream_timeout_secs() -> u64 {
    10
}

fn default_sync_workers() -> usize {
    2
}

fn default_sync_queue_depth() -> usize {
    64
}

fn default_proxy_user_agent() -> String {
    "VLC/3.0.0".to_string()
}

fn default_proxy_timeout_secs() -> u64 {
    30
}

fn default_proxy_route_path() -> String {
    "/api/iptv/proxy".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://./xtream-relay.db".to_string(),
                max_connections: Some(10),
            },
            web: WebConfig {
                host: default_host(),
                port: default_port(),
            },
            upstream: UpstreamConfig::default(),
            sync: SyncConfig::default(),
            proxy: ProxyConfig::default(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            user_agent: default_upstream_user_agent(),
            request_timeout_secs: default_upstream_timeout_secs(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            workers: default_sync_workers(),
            queue_depth: default_sync_queue_depth(),
        }
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            user_agent: default_proxy_user_agent(),
            request_timeout_secs: default_proxy_timeout_secs(),
            route_path: default_proxy_route_path(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_file =
            std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_from_file(&config_file)
    }

    pub fn load_from_file(config_file: &str) -> Result<Self> {
        if std::path::Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(config_file)?;
            Ok(toml::from_str(&contents)?)
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(config_file, contents)?;
            info!("Created default config file: {}", config_file);
            Ok(default_config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = Config::default();
        let rendered = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.web.port, 8080);
        assert_eq!(parsed.sync.workers, 2);
        assert_eq!(parsed.proxy.user_agent, "VLC/3.0.0");
    }

    #[test]
    fn partial_file_uses_field_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            [database]
            url = "sqlite::memory:"

            [web]

            [upstream]

            [sync]
            workers = 4

            [proxy]
            "#,
        )
        .unwrap();
        assert_eq!(parsed.database.url, "sqlite::memory:");
        assert_eq!(parsed.web.host, "0.0.0.0");
        assert_eq!(parsed.sync.workers, 4);
        assert_eq!(parsed.upstream.request_timeout_secs, 10);
    }
}
