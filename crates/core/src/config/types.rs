use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub scryfall: ScryfallConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/cardvault.db")
}

/// Scryfall API client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScryfallConfig {
    /// API base URL (default: https://api.scryfall.com)
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// User-Agent sent with every request (Scryfall rejects anonymous clients)
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Minimum delay between two API calls in milliseconds (default: 100)
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,
    /// Connect timeout, and whole-request timeout for API calls, in seconds
    /// (default: 60)
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
    /// Whole-request timeout for the bulk download in seconds; 0 means
    /// unbounded apart from the import deadline (default: 0)
    #[serde(default)]
    pub download_timeout_secs: u64,
}

impl Default for ScryfallConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            rate_limit_ms: default_rate_limit_ms(),
            timeout_secs: default_request_timeout(),
            download_timeout_secs: 0,
        }
    }
}

fn default_base_url() -> String {
    "https://api.scryfall.com".to_string()
}

fn default_user_agent() -> String {
    format!("CardVault/{}", env!("CARGO_PKG_VERSION"))
}

fn default_rate_limit_ms() -> u64 {
    100
}

fn default_request_timeout() -> u64 {
    60
}

/// Bulk import configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImportConfig {
    /// Bulk feed type selected from the catalog listing
    #[serde(default = "default_feed_type")]
    pub feed_type: String,
    /// Directory the downloaded feed is written to
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Rows per write transaction
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Upper bound for one full import run, in seconds
    #[serde(default = "default_import_timeout")]
    pub timeout_secs: u64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            feed_type: default_feed_type(),
            data_dir: default_data_dir(),
            batch_size: default_batch_size(),
            timeout_secs: default_import_timeout(),
        }
    }
}

fn default_feed_type() -> String {
    "default_cards".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data/bulk")
}

fn default_batch_size() -> usize {
    1000
}

fn default_import_timeout() -> u64 {
    300
}

/// Search defaults
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    #[serde(default = "default_page_limit")]
    pub default_limit: u32,
    #[serde(default = "default_max_limit")]
    pub max_limit: u32,
    /// Result cap for card identification lookups
    #[serde(default = "default_identify_limit")]
    pub identify_limit: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_page_limit(),
            max_limit: default_max_limit(),
            identify_limit: default_identify_limit(),
        }
    }
}

fn default_page_limit() -> u32 {
    40
}

fn default_max_limit() -> u32 {
    100
}

fn default_identify_limit() -> u32 {
    20
}

/// Logging configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LogConfig {
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}
