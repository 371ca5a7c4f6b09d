//! Configuration types for cirrus-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default archive root holding one directory per dump date
pub const DEFAULT_BASE_URL: &str = "https://dumps.wikimedia.org/other/cirrus_search_index/";

/// HTTP client settings
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Total timeout for listing requests (default: 60s)
    ///
    /// Shard downloads are only bound by `connect_timeout`; a multi-gigabyte
    /// shard can legitimately take far longer than any fixed request timeout.
    #[serde(default = "default_listing_timeout", with = "duration_secs")]
    pub listing_timeout: Duration,

    /// Connection timeout for every request (default: 30s)
    #[serde(default = "default_connect_timeout", with = "duration_secs")]
    pub connect_timeout: Duration,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listing_timeout: default_listing_timeout(),
            connect_timeout: default_connect_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Main configuration for [`CirrusDownloader`](crate::CirrusDownloader)
///
/// Every field has a serde default, so a configuration file only needs to
/// name the settings it overrides.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Archive root holding the `YYYYMMDD` directories (default: Wikimedia's
    /// cirrus_search_index directory)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Directory receiving the reassembled corpus (default: "../wiki_dumps")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Read size used when decompressing shards (default: 1 MiB)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Sibling index names listed when the index directory is empty (default: 10)
    #[serde(default = "default_hint_limit")]
    pub hint_limit: usize,

    /// Sibling index names listed when the index directory is missing (default: 20)
    #[serde(default = "default_extended_hint_limit")]
    pub extended_hint_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            output_dir: default_output_dir(),
            http: HttpConfig::default(),
            chunk_size: default_chunk_size(),
            hint_limit: default_hint_limit(),
            extended_hint_limit: default_extended_hint_limit(),
        }
    }
}

impl Config {
    /// Load a configuration from a JSON file
    ///
    /// Missing keys fall back to their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read config file '{}': {}", path.display(), e),
            key: None,
        })?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings that would otherwise fail deep inside the pipeline
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.base_url).map_err(|e| Error::Config {
            message: format!("invalid base URL '{}': {}", self.base_url, e),
            key: Some("base_url".to_string()),
        })?;

        if self.chunk_size == 0 {
            return Err(Error::Config {
                message: "chunk size must be greater than zero".to_string(),
                key: Some("chunk_size".to_string()),
            });
        }

        Ok(())
    }

    /// The archive root, always ending in `/` so relative joins stay inside it
    pub fn normalized_base_url(&self) -> String {
        if self.base_url.ends_with('/') {
            self.base_url.clone()
        } else {
            format!("{}/", self.base_url)
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("../wiki_dumps")
}

fn default_listing_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    format!("cirrus-dl/{}", env!("CARGO_PKG_VERSION"))
}

fn default_chunk_size() -> usize {
    1024 * 1024
}

fn default_hint_limit() -> usize {
    10
}

fn default_extended_hint_limit() -> usize {
    20
}

/// Serialize durations as whole seconds
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
