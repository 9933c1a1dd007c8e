//! Configuration Module
//!
//! Handles loading and managing gateway configuration from environment variables.

use std::env;
use std::time::Duration;

use url::Url;

use crate::error::{Result, WorkerError};

/// Gateway configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Public origin the worker serves (same-origin reference for classification)
    pub site_origin: String,
    /// Origin that same-origin fetches are forwarded to, if different
    pub upstream_origin: Option<String>,
    /// Prefix shared by every cache store this application owns
    pub cache_prefix: String,
    /// Current store generation
    pub cache_version: String,
    /// Path of the offline fallback document
    pub offline_page: String,
    /// Paths populated into the static store on install
    pub core_assets: Vec<String>,
    /// Network fetch timeout in seconds
    pub fetch_timeout: u64,
    /// Server credential for the Notion API
    pub notion_token: Option<String>,
    /// Base URL of the Notion API
    pub notion_api_base: String,
    /// Value of the `Notion-Version` header
    pub notion_version: String,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `SITE_ORIGIN` - Public origin (default: http://localhost:3000)
    /// - `UPSTREAM_ORIGIN` - Forwarding origin (default: unset)
    /// - `CACHE_PREFIX` - Store name prefix (default: pleiades)
    /// - `CACHE_VERSION` - Store generation (default: v1)
    /// - `OFFLINE_PAGE` - Offline fallback path (default: /offline.html)
    /// - `CORE_ASSETS` - Comma separated install list
    /// - `FETCH_TIMEOUT` - Fetch timeout in seconds (default: 30)
    /// - `NOTION_TOKEN` - Notion integration token (default: unset)
    /// - `NOTION_API_BASE` - Notion API base (default: https://api.notion.com/v1)
    /// - `NOTION_VERSION` - Notion API version (default: 2022-06-28)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            site_origin: env::var("SITE_ORIGIN").unwrap_or(defaults.site_origin),
            upstream_origin: non_empty_var("UPSTREAM_ORIGIN"),
            cache_prefix: env::var("CACHE_PREFIX").unwrap_or(defaults.cache_prefix),
            cache_version: env::var("CACHE_VERSION").unwrap_or(defaults.cache_version),
            offline_page: env::var("OFFLINE_PAGE").unwrap_or(defaults.offline_page),
            core_assets: env::var("CORE_ASSETS")
                .ok()
                .map(|v| parse_list(&v))
                .unwrap_or(defaults.core_assets),
            fetch_timeout: env::var("FETCH_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.fetch_timeout),
            notion_token: non_empty_var("NOTION_TOKEN"),
            notion_api_base: env::var("NOTION_API_BASE").unwrap_or(defaults.notion_api_base),
            notion_version: env::var("NOTION_VERSION").unwrap_or(defaults.notion_version),
        }
    }

    /// Parses the configured site origin.
    pub fn site_origin_url(&self) -> Result<Url> {
        parse_url("SITE_ORIGIN", &self.site_origin)
    }

    /// Parses the configured upstream origin, if any.
    pub fn upstream_origin_url(&self) -> Result<Option<Url>> {
        self.upstream_origin
            .as_deref()
            .map(|v| parse_url("UPSTREAM_ORIGIN", v))
            .transpose()
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            site_origin: "http://localhost:3000".to_string(),
            upstream_origin: None,
            cache_prefix: "pleiades".to_string(),
            cache_version: "v1".to_string(),
            offline_page: "/offline.html".to_string(),
            core_assets: vec![
                "/".to_string(),
                "/index.html".to_string(),
                "/manifest.json".to_string(),
                "/offline.html".to_string(),
            ],
            fetch_timeout: 30,
            notion_token: None,
            notion_api_base: "https://api.notion.com/v1".to_string(),
            notion_version: "2022-06-28".to_string(),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_url(name: &str, value: &str) -> Result<Url> {
    Url::parse(value).map_err(|e| WorkerError::InvalidRequest(format!("{name}: {e}")))
}
