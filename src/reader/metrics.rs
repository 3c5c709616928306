//! Image metrics resolution.
//!
//! Before a page can be laid out, the reader needs its native aspect ratio.
//! [`MetricsResolver::resolve`] asks a [`DimensionProbe`] for the pixel size
//! and turns the answer into a [`ResolvedAspect`]. It never fails: a network
//! error, an undecodable header, zero dimensions or a timeout all resolve to
//! the unit aspect, so a broken page still reserves a square slot instead of
//! collapsing the layout.
//!
//! Results, fallbacks included, are cached per URI in an [`AspectCache`]
//! shared by every clone of the resolver.
//!
//! ```rust
//! use async_trait::async_trait;
//! use yomu::reader::metrics::{DimensionProbe, ImageDimensions, MetricsResolver};
//! use yomu::{Error, Result};
//!
//! struct Fixed;
//!
//! #[async_trait]
//! impl DimensionProbe for Fixed {
//!     async fn dimensions(&self, uri: &str) -> Result<ImageDimensions> {
//!         match uri {
//!             "tall.png" => Ok(ImageDimensions { width: 800, height: 12_000 }),
//!             _ => Err(Error::not_found(uri)),
//!         }
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() {
//! let resolver = MetricsResolver::new(Fixed);
//! assert!((resolver.resolve("tall.png").await.ratio() - 800.0 / 12_000.0).abs() < 1e-12);
//! assert_eq!(resolver.resolve("missing.png").await.ratio(), 1.0);
//! # }
//! ```

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::net::HttpClient;

/// Native pixel size of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

/// Width / height of a page image. Always positive and finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedAspect {
    ratio: f64,
    measured: bool,
}

impl ResolvedAspect {
    /// Square aspect used when measurement fails.
    pub const FALLBACK: ResolvedAspect = ResolvedAspect {
        ratio: 1.0,
        measured: false,
    };

    /// Aspect of measured dimensions, or `None` if either side is zero.
    pub fn from_dimensions(dims: ImageDimensions) -> Option<Self> {
        if dims.width == 0 || dims.height == 0 {
            return None;
        }
        Some(Self {
            ratio: f64::from(dims.width) / f64::from(dims.height),
            measured: true,
        })
    }

    pub fn ratio(self) -> f64 {
        self.ratio
    }

    /// `false` for [`ResolvedAspect::FALLBACK`].
    pub fn is_measured(self) -> bool {
        self.measured
    }
}

impl fmt::Display for ResolvedAspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.measured {
            write!(f, "{:.4}", self.ratio)
        } else {
            write!(f, "{:.4} (fallback)", self.ratio)
        }
    }
}

/// Looks up the native size of a remote image.
#[async_trait]
pub trait DimensionProbe: Send + Sync {
    async fn dimensions(&self, uri: &str) -> Result<ImageDimensions>;
}

/// Reads the size from an image's header bytes.
///
/// Supports the formats the crate's `image` features enable (PNG, JPEG, GIF,
/// WebP).
pub fn dimensions_from_bytes(bytes: &[u8]) -> Result<ImageDimensions> {
    let (width, height) = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_dimensions()?;
    Ok(ImageDimensions { width, height })
}

/// Bytes read from the start of an image when probing its size.
///
/// Headers of the supported formats sit well inside this, though a JPEG with
/// a very large EXIF block may not; such pages fall back like any other
/// decode failure.
pub const HEADER_PREFIX: usize = 256 * 1024;

/// Reads at most `limit` bytes from `reader`.
pub async fn read_prefix<R>(reader: R, limit: usize) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    reader.take(limit as u64).read_to_end(&mut buf).await?;
    Ok(buf)
}

/// [`DimensionProbe`] that reads the first [`HEADER_PREFIX`] bytes of
/// `http(s)` images and local `file://` URIs.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: HttpClient,
}

impl HttpProbe {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

impl Default for HttpProbe {
    fn default() -> Self {
        Self::new(HttpClient::new("images").with_rate_limit(0))
    }
}

#[async_trait]
impl DimensionProbe for HttpProbe {
    async fn dimensions(&self, uri: &str) -> Result<ImageDimensions> {
        let url = url::Url::parse(uri)
            .map_err(|e| Error::invalid_input(format!("invalid image URI {uri}: {e}")))?;

        let bytes = match url.scheme() {
            "http" | "https" => self.client.get_prefix(uri, HEADER_PREFIX).await?,
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|_| Error::invalid_input(format!("not a local path: {uri}")))?;
                read_prefix(tokio::fs::File::open(path).await?, HEADER_PREFIX).await?
            }
            other => {
                return Err(Error::invalid_input(format!(
                    "unsupported image scheme {other}: {uri}"
                )));
            }
        };

        tokio::task::spawn_blocking(move || dimensions_from_bytes(&bytes)).await?
    }
}

/// Resolved aspects keyed by image URI. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct AspectCache {
    entries: Arc<RwLock<HashMap<String, ResolvedAspect>>>,
}

impl AspectCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, uri: &str) -> Option<ResolvedAspect> {
        self.entries.read().get(uri).copied()
    }

    pub fn insert(&self, uri: impl Into<String>, aspect: ResolvedAspect) {
        self.entries.write().insert(uri.into(), aspect);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

/// Turns image URIs into [`ResolvedAspect`]s, never failing.
#[derive(Clone)]
pub struct MetricsResolver {
    probe: Arc<dyn DimensionProbe>,
    timeout: Option<Duration>,
    cache: AspectCache,
}

impl fmt::Debug for MetricsResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricsResolver")
            .field("timeout", &self.timeout)
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl MetricsResolver {
    /// A resolver with no timeout and an empty cache.
    pub fn new(probe: impl DimensionProbe + 'static) -> Self {
        Self {
            probe: Arc::new(probe),
            timeout: None,
            cache: AspectCache::new(),
        }
    }

    /// An [`HttpProbe`]-backed resolver using the `network` and `reader` sections.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = HttpClient::from_config("images", &config.network)?.with_rate_limit(0);
        Ok(Self::new(HttpProbe::new(client)).with_timeout(config.reader.metrics_timeout))
    }

    /// Bounds each probe. A timed-out probe resolves to the fallback aspect.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Shares an existing cache, e.g. across chapters of the same series.
    pub fn with_cache(mut self, cache: AspectCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &AspectCache {
        &self.cache
    }

    /// Previously resolved aspect for `uri`, without probing.
    pub fn cached(&self, uri: &str) -> Option<ResolvedAspect> {
        self.cache.get(uri)
    }

    /// Resolves the aspect of `uri`, probing at most once per cache lifetime.
    pub async fn resolve(&self, uri: &str) -> ResolvedAspect {
        if let Some(aspect) = self.cache.get(uri) {
            debug!(uri, %aspect, "aspect cache hit");
            return aspect;
        }

        let aspect = match self.measure(uri).await {
            Ok(dims) => ResolvedAspect::from_dimensions(dims).unwrap_or_else(|| {
                warn!(uri, ?dims, "image reported empty dimensions, using square fallback");
                ResolvedAspect::FALLBACK
            }),
            Err(e) => {
                warn!(uri, error = %e, "image metrics unavailable, using square fallback");
                ResolvedAspect::FALLBACK
            }
        };

        self.cache.insert(uri, aspect);
        aspect
    }

    async fn measure(&self, uri: &str) -> Result<ImageDimensions> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.probe.dimensions(uri))
                .await
                .map_err(|_| Error::timeout(format!("probing {uri} took longer than {limit:?}")))?,
            None => self.probe.dimensions(uri).await,
        }
    }
}
