//! Network utilities for HTTP requests, rate limiting, and payload parsing.
//!
//! - **HTTP Client**: a configured `reqwest` client with connection pooling
//! - **Rate Limiting**: per-host delays so the catalog API is not hammered
//! - **Retry Logic**: back-off on transport failures and HTTP 429
//! - **Payload Parsing**: JSON path helpers in [`json`]
//!
//! # Examples
//!
//! ```rust,no_run
//! use yomu::net::HttpClient;
//!
//! # async fn example() -> yomu::Result<()> {
//! let client = HttpClient::new("catalog")
//!     .with_rate_limit(500)
//!     .with_max_retries(3);
//!
//! let json: serde_json::Value = client.get_json("https://api.example.com/api/home").await?;
//! # Ok(())
//! # }
//! ```

use bytes::Bytes;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use reqwest::{Client, StatusCode, header::HeaderMap};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::config::NetworkConfig;
use crate::error::{Error, Result};

pub mod json;

/// Shared client used when no [`NetworkConfig`] is supplied.
static CLIENT: Lazy<Client> = Lazy::new(|| {
    build_client(&NetworkConfig::default()).unwrap_or_else(|e| {
        warn!(error = %e, "falling back to an unconfigured HTTP client");
        Client::new()
    })
});

fn build_client(config: &NetworkConfig) -> Result<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(config.user_agent.clone())
        .pool_max_idle_per_host(10)
        .gzip(true)
        .brotli(true)
        .build()?)
}

/// Longest wait a `Retry-After` header can impose on a single retry.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// `Retry-After` in whole seconds. HTTP-date values are not supported.
fn retry_after_secs(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}

/// Server-requested delay when given (capped), else exponential back-off.
fn backoff_delay(retry_after: Option<u64>, attempt: u32) -> Duration {
    match retry_after {
        Some(secs) => Duration::from_secs(secs).min(MAX_RETRY_AFTER),
        None => Duration::from_secs(2_u64.saturating_pow(attempt)),
    }
}

/// Per-key rate limiter.
///
/// Tracks the last request time for each key (a host name for [`HttpClient`])
/// and sleeps until the configured delay has elapsed. Clones share state, so
/// every handle to the same limiter sees the same request history.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    last_request: Arc<Mutex<HashMap<String, Instant>>>,
    delay: Duration,
}

impl RateLimiter {
    /// Creates a limiter enforcing `delay_ms` between requests per key.
    pub fn new(delay_ms: u64) -> Self {
        Self {
            last_request: Arc::new(Mutex::new(HashMap::new())),
            delay: Duration::from_millis(delay_ms),
        }
    }

    /// Time left before `key` may issue another request.
    pub fn remaining(&self, key: &str) -> Option<Duration> {
        let last_map = self.last_request.lock();
        let last = last_map.get(key)?;
        self.delay.checked_sub(last.elapsed()).filter(|d| !d.is_zero())
    }

    /// Waits if necessary, then records a request for `key`.
    pub async fn wait(&self, key: &str) {
        if let Some(duration) = self.remaining(key) {
            tokio::time::sleep(duration).await;
        }

        self.last_request
            .lock()
            .insert(key.to_string(), Instant::now());
    }
}

/// HTTP client wrapper with built-in rate limiting and retry logic.
///
/// Rate limiting is keyed by the request's host, so catalog calls and image
/// probes against a CDN do not slow each other down.
#[derive(Clone, Debug)]
pub struct HttpClient {
    name: String,
    client: Client,
    rate_limiter: RateLimiter,
    max_retries: u32,
    headers: HeaderMap,
}

impl HttpClient {
    /// Creates a client with default settings: 200ms rate limit, 3 retries.
    pub fn new(name: impl Into<String>) -> Self {
        let defaults = NetworkConfig::default();
        Self {
            name: name.into(),
            client: CLIENT.clone(),
            rate_limiter: RateLimiter::new(defaults.rate_limit_ms),
            max_retries: defaults.max_retries,
            headers: HeaderMap::new(),
        }
    }

    /// Creates a client from a [`NetworkConfig`].
    pub fn from_config(name: impl Into<String>, config: &NetworkConfig) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            client: build_client(config)?,
            rate_limiter: RateLimiter::new(config.rate_limit_ms),
            max_retries: config.max_retries,
            headers: HeaderMap::new(),
        })
    }

    /// Label used in log events.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn with_rate_limit(mut self, delay_ms: u64) -> Self {
        self.rate_limiter = RateLimiter::new(delay_ms);
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Adds a header to every request. Invalid names or values are ignored.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            name.parse::<reqwest::header::HeaderName>(),
            value.parse::<reqwest::header::HeaderValue>(),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Performs a GET request with rate limiting and retries.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidInput`] - If `url` does not parse
    /// * [`Error::RateLimit`] - If still throttled after all retries
    /// * [`Error::NotFound`] - For HTTP 404
    /// * [`Error::Http`] - For any other non-success status
    /// * [`Error::Network`] - For transport failures after all retries
    pub async fn get(&self, url: &str) -> Result<Bytes> {
        Ok(self.send(url).await?.bytes().await?)
    }

    /// GET at most the first `limit` bytes of the body.
    ///
    /// The rest of the body is never downloaded; the connection is dropped
    /// once enough has arrived. Errors are those of [`get`](Self::get).
    pub async fn get_prefix(&self, url: &str, limit: usize) -> Result<Vec<u8>> {
        let mut response = self.send(url).await?;
        let mut buf = Vec::with_capacity(limit.min(64 * 1024));
        while buf.len() < limit {
            match response.chunk().await? {
                Some(chunk) => {
                    let take = chunk.len().min(limit - buf.len());
                    buf.extend_from_slice(&chunk[..take]);
                }
                None => break,
            }
        }
        Ok(buf)
    }

    /// Sends a GET with rate limiting and retries, returning a successful response.
    async fn send(&self, url: &str) -> Result<reqwest::Response> {
        let parsed = url::Url::parse(url)
            .map_err(|e| Error::invalid_input(format!("invalid URL {url}: {e}")))?;
        let host = parsed.host_str().unwrap_or_default().to_string();
        let mut attempts = 0;

        loop {
            self.rate_limiter.wait(&host).await;
            debug!(client = %self.name, %url, attempt = attempts, "GET");

            match self
                .client
                .get(parsed.clone())
                .headers(self.headers.clone())
                .send()
                .await
            {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        let retry_after = retry_after_secs(response.headers());
                        if attempts < self.max_retries {
                            attempts += 1;
                            let delay = backoff_delay(retry_after, attempts);
                            warn!(client = %self.name, %url, ?delay, "rate limited, backing off");
                            tokio::time::sleep(delay).await;
                            continue;
                        }
                        return Err(Error::rate_limit(retry_after));
                    }

                    warn!(client = %self.name, %url, %status, "request failed");
                    if status == StatusCode::NOT_FOUND {
                        return Err(Error::not_found(url));
                    }
                    return Err(Error::http(url, status.as_u16()));
                }
                Err(e) => {
                    if attempts < self.max_retries {
                        attempts += 1;
                        debug!(client = %self.name, %url, error = %e, "transport error, retrying");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                        continue;
                    }
                    return Err(e.into());
                }
            }
        }
    }

    /// GET and decode the body as UTF-8.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        let bytes = self.get(url).await?;
        String::from_utf8(bytes.to_vec()).map_err(|e| Error::parse(format!("Invalid UTF-8: {e}")))
    }

    /// GET and deserialize the body as JSON.
    pub async fn get_json<T>(&self, url: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let bytes = self.get(url).await?;
        serde_json::from_slice(&bytes).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rate_limiter_tracks_keys_independently() {
        let limiter = RateLimiter::new(10_000);
        limiter.wait("a.example").await;

        assert!(limiter.remaining("a.example").is_some());
        assert!(limiter.remaining("b.example").is_none());
    }

    #[tokio::test]
    async fn rate_limiter_clones_share_history() {
        let limiter = RateLimiter::new(10_000);
        let other = limiter.clone();
        limiter.wait("host").await;
        assert!(other.remaining("host").is_some());
    }

    #[test]
    fn backoff_honours_retry_after() {
        let mut headers = HeaderMap::new();
        headers.insert(reqwest::header::RETRY_AFTER, "7".parse().unwrap());
        let retry_after = retry_after_secs(&headers);

        assert_eq!(retry_after, Some(7));
        assert_eq!(backoff_delay(retry_after, 1), Duration::from_secs(7));
        assert_eq!(backoff_delay(Some(3600), 1), MAX_RETRY_AFTER);
        assert_eq!(backoff_delay(None, 1), Duration::from_secs(2));
        assert_eq!(backoff_delay(None, 3), Duration::from_secs(8));

        headers.insert(
            reqwest::header::RETRY_AFTER,
            "Wed, 21 Oct 2015 07:28:00 GMT".parse().unwrap(),
        );
        assert_eq!(retry_after_secs(&headers), None);
    }

    #[tokio::test]
    async fn rejects_unparseable_urls() {
        let client = HttpClient::new("test").with_max_retries(0);
        let err = client.get("not a url").await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
