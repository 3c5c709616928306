//! Manga catalog access.
//!
//! The catalog is a third-party REST API serving the home feed, search,
//! browse listings, chapter page images and recommendations. Yomu proxies it
//! as-is: every call is a single GET returning the raw JSON payload, with no
//! caching or reshaping.
//!
//! The [`Catalog`] trait is the seam; [`HttpCatalog`] is the real
//! implementation. Tests and alternative backends can implement the trait
//! directly.
//!
//! ```rust,no_run
//! use yomu::catalog::{Catalog, HttpCatalog};
//! use yomu::net::json;
//!
//! # async fn example() -> yomu::Result<()> {
//! let catalog = HttpCatalog::new("https://v0-kingofshojo-api.vercel.app")?;
//!
//! let results = catalog.search("solo leveling", 1).await?;
//! let pages = catalog.chapter_images("solo-leveling", "chapter-1").await?;
//! let urls = json::image_urls(&pages)?;
//! println!("{} results, {} pages", results, urls.len());
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::{
    config::{Config, DEFAULT_API_BASE_URL},
    error::{Error, Result},
    net::HttpClient,
    types::BrowseKind,
};

/// Read-only access to the manga catalog.
///
/// Pages are 1-based; passing 0 is rejected with [`Error::InvalidInput`].
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Home feed (featured, latest updates, popular).
    async fn homepage(&self, page: u32) -> Result<Value>;

    /// Series metadata.
    async fn manga_details(&self, slug: &str) -> Result<Value>;

    /// Chapter list of a series.
    async fn manga_chapters(&self, slug: &str) -> Result<Value>;

    /// Page images of one chapter. See [`crate::net::json::image_urls`].
    async fn chapter_images(&self, manga_slug: &str, chapter_slug: &str) -> Result<Value>;

    /// Free-text search.
    async fn search(&self, query: &str, page: u32) -> Result<Value>;

    /// Listing by publication kind.
    async fn browse(&self, kind: BrowseKind, page: u32) -> Result<Value>;

    /// Listing by genre slug.
    async fn browse_by_genre(&self, genre: &str, page: u32) -> Result<Value>;

    /// Series similar to `slug`.
    async fn series_recommendations(&self, slug: &str) -> Result<Value>;

    /// What to read after a given chapter.
    async fn chapter_recommendations(&self, manga_slug: &str, chapter_slug: &str)
    -> Result<Value>;
}

/// [`Catalog`] backed by the HTTP API.
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    base_url: String,
    client: HttpClient,
}

impl HttpCatalog {
    /// Creates a catalog client with default network settings.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_client(base_url, HttpClient::new("catalog"))
    }

    /// Creates a catalog client from the `catalog` and `network` config sections.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = HttpClient::from_config("catalog", &config.network)?;
        Self::with_client(config.catalog.base_url.clone(), client)
    }

    /// Creates a catalog client around an existing [`HttpClient`].
    pub fn with_client(base_url: impl Into<String>, client: HttpClient) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        url::Url::parse(&base_url)
            .map_err(|e| Error::invalid_input(format!("invalid catalog URL {base_url}: {e}")))?;
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for the given path segments and query pairs.
    ///
    /// Segments are percent-encoded individually, so a slug can never escape
    /// its position in the path.
    pub fn endpoint(&self, segments: &[&str], query: &[(&str, String)]) -> String {
        let mut url = self.base_url.clone();
        url.push_str("/api");
        for segment in segments {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        for (i, (key, value)) in query.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    async fn fetch(&self, url: String) -> Result<Value> {
        debug!(%url, "catalog request");
        self.client.get_json(&url).await
    }
}

impl Default for HttpCatalog {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            client: HttpClient::new("catalog"),
        }
    }
}

fn require(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::invalid_input(format!("{name} must not be empty")));
    }
    Ok(())
}

fn page_param(page: u32) -> Result<(&'static str, String)> {
    if page == 0 {
        return Err(Error::invalid_input("page numbers start at 1"));
    }
    Ok(("page", page.to_string()))
}

#[async_trait]
impl Catalog for HttpCatalog {
    async fn homepage(&self, page: u32) -> Result<Value> {
        let url = self.endpoint(&["home"], &[page_param(page)?]);
        self.fetch(url).await
    }

    async fn manga_details(&self, slug: &str) -> Result<Value> {
        require("manga slug", slug)?;
        self.fetch(self.endpoint(&["manga", slug], &[])).await
    }

    async fn manga_chapters(&self, slug: &str) -> Result<Value> {
        require("manga slug", slug)?;
        self.fetch(self.endpoint(&["manga", slug, "chapters"], &[]))
            .await
    }

    async fn chapter_images(&self, manga_slug: &str, chapter_slug: &str) -> Result<Value> {
        require("manga slug", manga_slug)?;
        require("chapter slug", chapter_slug)?;
        self.fetch(self.endpoint(&["chapter", manga_slug, chapter_slug], &[]))
            .await
    }

    async fn search(&self, query: &str, page: u32) -> Result<Value> {
        require("search query", query)?;
        let url = self.endpoint(&["search"], &[("q", query.to_string()), page_param(page)?]);
        self.fetch(url).await
    }

    async fn browse(&self, kind: BrowseKind, page: u32) -> Result<Value> {
        let url = self.endpoint(
            &["browse"],
            &[("type", kind.as_str().to_string()), page_param(page)?],
        );
        self.fetch(url).await
    }

    async fn browse_by_genre(&self, genre: &str, page: u32) -> Result<Value> {
        require("genre", genre)?;
        let url = self.endpoint(&["genres", genre], &[page_param(page)?]);
        self.fetch(url).await
    }

    async fn series_recommendations(&self, slug: &str) -> Result<Value> {
        require("manga slug", slug)?;
        self.fetch(self.endpoint(&["recommendations", "series", slug], &[]))
            .await
    }

    async fn chapter_recommendations(
        &self,
        manga_slug: &str,
        chapter_slug: &str,
    ) -> Result<Value> {
        require("manga slug", manga_slug)?;
        require("chapter slug", chapter_slug)?;
        self.fetch(self.endpoint(
            &["recommendations", "chapter", manga_slug, chapter_slug],
            &[],
        ))
        .await
    }
}
