use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::searcher::SearchOptions;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub kat: KatConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// KAT connector configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KatConfig {
    /// Site root, e.g. "https://kat.cr"
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// Search terms queried at the same time (default: 4)
    #[serde(default = "default_max_concurrent_queries")]
    pub max_concurrent_queries: usize,
    /// Skip malformed rows/items instead of dropping the whole payload
    #[serde(default)]
    pub skip_malformed_items: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Connector defaults, overridable per search
    #[serde(default)]
    pub options: SearchOptions,
}

impl Default for KatConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            max_concurrent_queries: default_max_concurrent_queries(),
            skip_malformed_items: false,
            user_agent: None,
            options: SearchOptions::default(),
        }
    }
}

fn default_base_url() -> String {
    "https://kat.cr".to_string()
}

fn default_timeout() -> u32 {
    30
}

fn default_max_concurrent_queries() -> usize {
    4
}
