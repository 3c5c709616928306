//! Common test utilities
//!
//! Offline fakes for the catalog and the dimension probe, so nothing here
//! touches the network.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::time::Duration;

use yomu::catalog::Catalog;
use yomu::reader::{DimensionProbe, ImageDimensions};
use yomu::types::BrowseKind;
use yomu::{Error, Result};

#[allow(dead_code)]
pub const TEST_USER: &str = "reader-1";
#[allow(dead_code)]
pub const TEST_MANGA: &str = "solo-leveling";
#[allow(dead_code)]
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Probe that parses `"<name>-<w>x<h>"` URIs; anything else fails.
#[allow(dead_code)]
pub struct SizeProbe;

#[async_trait]
impl DimensionProbe for SizeProbe {
    async fn dimensions(&self, uri: &str) -> Result<ImageDimensions> {
        let size = uri.rsplit('-').next().unwrap_or(uri);
        let (w, h) = size
            .split_once('x')
            .ok_or_else(|| Error::parse(format!("no size in {uri}")))?;
        Ok(ImageDimensions {
            width: w.parse().map_err(|_| Error::parse(uri.to_string()))?,
            height: h.parse().map_err(|_| Error::parse(uri.to_string()))?,
        })
    }
}

/// Catalog serving canned chapter payloads keyed by `manga/chapter`.
#[allow(dead_code)]
#[derive(Default)]
pub struct FakeCatalog {
    chapters: HashMap<String, Value>,
}

#[allow(dead_code)]
impl FakeCatalog {
    pub fn with_chapter(mut self, manga: &str, chapter: &str, urls: &[&str]) -> Self {
        let images: Vec<Value> = urls.iter().map(|url| json!({ "url": url })).collect();
        self.chapters
            .insert(format!("{manga}/{chapter}"), json!({ "images": images }));
        self
    }
}

#[async_trait]
impl Catalog for FakeCatalog {
    async fn homepage(&self, page: u32) -> Result<Value> {
        Ok(json!({ "page": page, "items": [] }))
    }

    async fn manga_details(&self, slug: &str) -> Result<Value> {
        Err(Error::not_found(slug))
    }

    async fn manga_chapters(&self, slug: &str) -> Result<Value> {
        Err(Error::not_found(slug))
    }

    async fn chapter_images(&self, manga_slug: &str, chapter_slug: &str) -> Result<Value> {
        self.chapters
            .get(&format!("{manga_slug}/{chapter_slug}"))
            .cloned()
            .ok_or_else(|| Error::not_found(format!("{manga_slug}/{chapter_slug}")))
    }

    async fn search(&self, query: &str, page: u32) -> Result<Value> {
        Ok(json!({ "query": query, "page": page, "results": [] }))
    }

    async fn browse(&self, kind: BrowseKind, page: u32) -> Result<Value> {
        Ok(json!({ "kind": kind.as_str(), "page": page }))
    }

    async fn browse_by_genre(&self, genre: &str, page: u32) -> Result<Value> {
        Ok(json!({ "genre": genre, "page": page }))
    }

    async fn series_recommendations(&self, _slug: &str) -> Result<Value> {
        Ok(json!([]))
    }

    async fn chapter_recommendations(
        &self,
        _manga_slug: &str,
        _chapter_slug: &str,
    ) -> Result<Value> {
        Ok(json!([]))
    }
}
