//! Error types and result handling for Yomu operations.
//!
//! All fallible operations return a [`Result<T>`], an alias for
//! `std::result::Result<T, Error>`.
//!
//! # Error Categories
//!
//! - **Network Errors**: Connection issues, timeouts, HTTP status failures
//! - **Parse Errors**: Unexpected payload shapes, undecodable images
//! - **Not Found**: Missing catalog entries or store records
//! - **Invalid Input**: Empty slugs, non-positive layout dimensions, bad config values
//! - **IO / JSON / TOML**: Snapshot persistence and configuration loading
//!
//! Image metrics resolution never surfaces these errors; failures resolve to
//! a fallback aspect instead. See [`MetricsResolver`](crate::reader::MetricsResolver).
//!
//! # Examples
//!
//! ```rust
//! use yomu::{Error, Result};
//!
//! fn check_slug(slug: &str) -> Result<()> {
//!     if slug.is_empty() {
//!         return Err(Error::invalid_input("slug must not be empty"));
//!     }
//!     Ok(())
//! }
//!
//! assert!(matches!(check_slug(""), Err(Error::InvalidInput(_))));
//! ```

use thiserror::Error;

/// Type alias for Results with Yomu errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all Yomu operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport errors from the underlying HTTP client (reqwest).
    ///
    /// Connection timeouts, DNS failures, TLS errors and body read failures
    /// all end up here.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status} for {url}")]
    Http { url: String, status: u16 },

    /// The server throttled us and retries were exhausted.
    ///
    /// `retry_after` carries the `Retry-After` header in seconds, if present.
    #[error("Rate limited, retry after {retry_after:?} seconds")]
    RateLimit { retry_after: Option<u64> },

    /// Received data could not be interpreted.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A requested resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An operation did not finish within its deadline.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Caller supplied an argument outside the accepted domain.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// File system errors, mostly from store snapshots and config files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization and deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration file syntax or schema errors.
    #[error("Config error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Image header decoding errors.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Join errors from spawned tokio tasks.
    #[error("Join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl Error {
    /// Creates a parse error with the given message.
    ///
    /// ```rust
    /// use yomu::Error;
    ///
    /// let error = Error::parse("chapter payload has no images");
    /// assert_eq!(error.to_string(), "Parse error: chapter payload has no images");
    /// ```
    pub fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }

    /// Creates a not found error with the given message.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    /// Creates an invalid input error with the given message.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Creates a rate limit error with optional retry-after time.
    pub fn rate_limit(retry_after: Option<u64>) -> Self {
        Error::RateLimit { retry_after }
    }

    /// Creates a timeout error describing what was being waited on.
    pub fn timeout(msg: impl Into<String>) -> Self {
        Error::Timeout(msg.into())
    }

    /// Creates an HTTP status error.
    pub fn http(url: impl Into<String>, status: u16) -> Self {
        Error::Http {
            url: url.into(),
            status,
        }
    }
}
