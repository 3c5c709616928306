//! Runtime configuration.
//!
//! Configuration is a plain serde structure that can be loaded from TOML and
//! then overridden from the environment. Every section has sensible defaults,
//! so an empty file (or no file at all) is a valid configuration.
//!
//! ```rust
//! use yomu::config::Config;
//!
//! let config = Config::from_toml_str(
//!     r#"
//!     [reader]
//!     max_segment_height = 4096.0
//!     "#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.reader.max_segment_height, 4096.0);
//! assert_eq!(config.network.max_retries, 3);
//! ```

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Default catalog API root.
pub const DEFAULT_API_BASE_URL: &str = "https://v0-kingofshojo-api.vercel.app";

/// Keeps segments below common GPU texture size limits.
pub const DEFAULT_MAX_SEGMENT_HEIGHT: f64 = 2048.0;

const ENV_API_BASE_URL: &str = "YOMU_API_BASE_URL";
const ENV_MAX_SEGMENT_HEIGHT: &str = "YOMU_MAX_SEGMENT_HEIGHT";
const ENV_STORE_PATH: &str = "YOMU_STORE_PATH";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub network: NetworkConfig,
    pub reader: ReaderConfig,
    pub store: StoreConfig,
}

/// Where the manga catalog API lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub base_url: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

/// HTTP behaviour shared by the catalog and the image probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Minimum delay between requests to the same host, in milliseconds.
    pub rate_limit_ms: u64,
    /// Retries for transport failures and HTTP 429.
    pub max_retries: u32,
    /// Whole-request timeout, in seconds.
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            rate_limit_ms: 200,
            max_retries: 3,
            timeout_secs: 30,
            user_agent: concat!("yomu/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Reader layout settings.
///
/// ```rust
/// use yomu::config::ReaderConfigBuilder;
/// use std::time::Duration;
///
/// let reader = ReaderConfigBuilder::default()
///     .max_segment_height(1024.0)
///     .metrics_timeout(Some(Duration::from_secs(5)))
///     .build()
///     .unwrap();
///
/// assert_eq!(reader.max_segment_height, 1024.0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Builder)]
#[serde(default)]
#[builder(default)]
pub struct ReaderConfig {
    /// Tallest slice, in logical pixels, handed to the image renderer.
    pub max_segment_height: f64,
    /// Upper bound on a single dimension lookup. `None` waits indefinitely.
    #[serde(with = "opt_secs")]
    pub metrics_timeout: Option<Duration>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_segment_height: DEFAULT_MAX_SEGMENT_HEIGHT,
            metrics_timeout: Some(Duration::from_secs(15)),
        }
    }
}

/// User-state snapshot location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Snapshot file. Falls back to [`default_store_path`] when unset.
    pub path: Option<PathBuf>,
}

impl StoreConfig {
    /// The configured snapshot path, or the platform default.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        self.path.clone().or_else(default_store_path)
    }
}

/// `<data_dir>/yomu/store.json`, when the platform has a data directory.
pub fn default_store_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("yomu").join("store.json"))
}

impl Config {
    /// Parses a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path.as_ref()).await?;
        Self::from_toml_str(&contents)
    }

    /// Applies `YOMU_*` environment overrides on top of the current values.
    pub fn apply_env(mut self) -> Result<Self> {
        if let Ok(url) = std::env::var(ENV_API_BASE_URL) {
            self.catalog.base_url = url;
        }
        if let Ok(raw) = std::env::var(ENV_MAX_SEGMENT_HEIGHT) {
            self.reader.max_segment_height = raw.trim().parse().map_err(|_| {
                Error::invalid_input(format!("{ENV_MAX_SEGMENT_HEIGHT} is not a number: {raw}"))
            })?;
        }
        if let Ok(path) = std::env::var(ENV_STORE_PATH) {
            self.store.path = Some(PathBuf::from(path));
        }
        self.validate()?;
        Ok(self)
    }

    /// Checks cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        let segment = self.reader.max_segment_height;
        if !segment.is_finite() || segment <= 0.0 {
            return Err(Error::invalid_input(format!(
                "max_segment_height must be positive, got {segment}"
            )));
        }

        url::Url::parse(&self.catalog.base_url).map_err(|e| {
            Error::invalid_input(format!("invalid base_url {}: {e}", self.catalog.base_url))
        })?;

        if self.network.timeout_secs == 0 {
            return Err(Error::invalid_input("timeout_secs must be at least 1"));
        }
        if self.reader.metrics_timeout == Some(Duration::ZERO) {
            return Err(Error::invalid_input("metrics_timeout must be non-zero"));
        }
        Ok(())
    }
}

/// Serializes `Option<Duration>` as fractional seconds.
mod opt_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub(super) fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(duration) => serializer.serialize_some(&duration.as_secs_f64()),
            None => serializer.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<f64>::deserialize(deserializer)?;
        match secs {
            Some(secs) if secs.is_finite() && secs >= 0.0 => Ok(Some(Duration::from_secs_f64(secs))),
            Some(secs) => Err(serde::de::Error::custom(format!(
                "metrics_timeout must be a non-negative number of seconds, got {secs}"
            ))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.catalog.base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.reader.max_segment_height, DEFAULT_MAX_SEGMENT_HEIGHT);
        assert_eq!(config.reader.metrics_timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.network.rate_limit_ms, 200);
    }

    #[test]
    fn parses_metrics_timeout_in_seconds() {
        let config = Config::from_toml_str("[reader]\nmetrics_timeout = 2.5\n").unwrap();
        assert_eq!(config.reader.metrics_timeout, Some(Duration::from_millis(2500)));
    }

    #[test]
    fn rejects_non_positive_segment_height() {
        let err = Config::from_toml_str("[reader]\nmax_segment_height = 0.0\n").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn rejects_malformed_base_url() {
        let err = Config::from_toml_str("[catalog]\nbase_url = \"not a url\"\n").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn rejects_unknown_types() {
        let err = Config::from_toml_str("[network]\nmax_retries = \"many\"\n").unwrap_err();
        assert!(matches!(err, Error::Toml(_)));
    }
}
