//! A chapter's reading list.
//!
//! [`ReaderSession`] holds one [`ReaderPosition`] per page. Every page
//! resolves independently and concurrently; a slow or broken page never holds
//! up layout of the others. Dropping the session tears down every position.

use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use super::metrics::{MetricsResolver, ResolvedAspect};
use super::position::{PositionLayout, Priority, ReaderPosition};
use crate::catalog::Catalog;
use crate::config::ReaderConfig;
use crate::error::{Error, Result};
use crate::net::json;
use crate::store::progress::PageUpdate;

/// Layout of one page within the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageLayout {
    pub index: usize,
    pub uri: String,
    pub priority: Priority,
    /// Distance from the top of the chapter to the top of this page.
    pub top: f64,
    pub layout: PositionLayout,
}

/// All pages of one chapter.
#[derive(Debug)]
pub struct ReaderSession {
    max_segment_height: f64,
    positions: Vec<ReaderPosition>,
}

impl ReaderSession {
    /// Creates a position per URI and starts resolving all of them.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new<I, S>(resolver: &MetricsResolver, config: &ReaderConfig, uris: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let max_segment_height = config.max_segment_height;
        if !(max_segment_height.is_finite() && max_segment_height > 0.0) {
            return Err(Error::invalid_input(format!(
                "max_segment_height must be positive, got {max_segment_height}"
            )));
        }

        let positions = uris
            .into_iter()
            .enumerate()
            .map(|(index, uri)| {
                let uri: String = uri.into();
                ReaderPosition::spawn(index, uri, resolver)
            })
            .collect();

        Ok(Self {
            max_segment_height,
            positions,
        })
    }

    /// Builds a session from a chapter-images payload.
    pub fn from_payload(
        resolver: &MetricsResolver,
        config: &ReaderConfig,
        payload: &Value,
    ) -> Result<Self> {
        Self::new(resolver, config, json::image_urls(payload)?)
    }

    /// Fetches a chapter's images from the catalog and opens a session on them.
    pub async fn open(
        catalog: &dyn Catalog,
        resolver: &MetricsResolver,
        config: &ReaderConfig,
        manga_slug: &str,
        chapter_slug: &str,
    ) -> Result<Self> {
        let payload = catalog.chapter_images(manga_slug, chapter_slug).await?;
        let session = Self::from_payload(resolver, config, &payload)?;
        info!(
            manga_slug,
            chapter_slug,
            pages = session.len(),
            "reader session opened"
        );
        Ok(session)
    }

    pub fn positions(&self) -> &[ReaderPosition] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn max_segment_height(&self) -> f64 {
        self.max_segment_height
    }

    /// Changes the segment limit. Plans are recomputed on the next layout.
    pub fn set_max_segment_height(&mut self, max_segment_height: f64) -> Result<()> {
        if !(max_segment_height.is_finite() && max_segment_height > 0.0) {
            return Err(Error::invalid_input(format!(
                "max_segment_height must be positive, got {max_segment_height}"
            )));
        }
        self.max_segment_height = max_segment_height;
        Ok(())
    }

    /// Waits for every page to resolve, in list order.
    ///
    /// Entries are `None` only for positions torn down while waiting.
    pub async fn resolve_all(&self) -> Vec<Option<ResolvedAspect>> {
        join_all(self.positions.iter().map(|p| p.resolved())).await
    }

    /// Current layout of every page at `viewport_width`.
    pub fn layout(&self, viewport_width: f64) -> Vec<PageLayout> {
        let mut top = 0.0;
        self.positions
            .iter()
            .map(|position| {
                let layout = position.layout(viewport_width, self.max_segment_height);
                let page = PageLayout {
                    index: position.index(),
                    uri: position.uri().to_string(),
                    priority: position.priority(),
                    top,
                    layout,
                };
                top += page.layout.height();
                page
            })
            .collect()
    }

    /// Total scrollable height at `viewport_width`, placeholders included.
    pub fn content_height(&self, viewport_width: f64) -> f64 {
        self.positions
            .iter()
            .map(|p| p.layout(viewport_width, self.max_segment_height).height())
            .sum()
    }

    /// Fraction of the chapter scrolled past, in `[0, 1]`.
    ///
    /// Content that fits inside the viewport counts as not scrolled.
    pub fn scroll_progress(&self, offset: f64, viewport_width: f64, viewport_height: f64) -> f64 {
        let scrollable = self.content_height(viewport_width) - viewport_height;
        if !(scrollable > 0.0) || !offset.is_finite() {
            return 0.0;
        }
        (offset / scrollable).clamp(0.0, 1.0)
    }

    /// Index of the page under the top edge of the viewport.
    pub fn page_at(&self, offset: f64, viewport_width: f64) -> Option<usize> {
        let pages = self.layout(viewport_width);
        let last = pages.last()?.index;
        Some(
            pages
                .iter()
                .find(|page| offset < page.top + page.layout.height())
                .map_or(last, |page| page.index),
        )
    }

    /// Progress update for the store, derived from the scroll position.
    ///
    /// Pages are reported 1-based; reaching the bottom marks the chapter
    /// completed.
    pub fn progress_at(
        &self,
        offset: f64,
        viewport_width: f64,
        viewport_height: f64,
    ) -> Option<PageUpdate> {
        let page = self.page_at(offset, viewport_width)?;
        let total_pages = u32::try_from(self.len()).unwrap_or(u32::MAX);
        let is_completed = self.scroll_progress(offset, viewport_width, viewport_height) >= 1.0;
        Some(PageUpdate {
            current_page: if is_completed {
                total_pages
            } else {
                u32::try_from(page + 1).unwrap_or(u32::MAX)
            },
            total_pages,
            is_completed,
        })
    }

    /// Tears down every position, discarding pending resolutions.
    pub fn close(&self) {
        for position in &self.positions {
            position.teardown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::metrics::{DimensionProbe, ImageDimensions};
    use async_trait::async_trait;
    use serde_json::json;

    /// `"<w>x<h>"` URIs resolve to that size; anything else fails.
    struct BySize;

    #[async_trait]
    impl DimensionProbe for BySize {
        async fn dimensions(&self, uri: &str) -> Result<ImageDimensions> {
            let (w, h) = uri
                .split_once('x')
                .ok_or_else(|| Error::parse(uri.to_string()))?;
            Ok(ImageDimensions {
                width: w.parse().map_err(|_| Error::parse(w.to_string()))?,
                height: h.parse().map_err(|_| Error::parse(h.to_string()))?,
            })
        }
    }

    fn config() -> ReaderConfig {
        ReaderConfig {
            max_segment_height: 2048.0,
            metrics_timeout: None,
        }
    }

    #[tokio::test]
    async fn resolves_pages_independently() {
        let resolver = MetricsResolver::new(BySize);
        let session =
            ReaderSession::new(&resolver, &config(), ["1000x1000", "broken", "100x1000"]).unwrap();

        let aspects = session.resolve_all().await;
        let ratios: Vec<f64> = aspects.iter().map(|a| a.unwrap().ratio()).collect();
        assert_eq!(ratios, vec![1.0, 1.0, 0.1]);
        assert!(!aspects[1].unwrap().is_measured());
    }

    #[tokio::test]
    async fn layout_stacks_pages() {
        let resolver = MetricsResolver::new(BySize);
        let session = ReaderSession::new(&resolver, &config(), ["1000x500", "125x1000"]).unwrap();
        session.resolve_all().await;

        let pages = session.layout(500.0);
        assert_eq!(pages[0].top, 0.0);
        assert_eq!(pages[0].layout.height(), 250.0);
        assert_eq!(pages[1].top, 250.0);
        assert_eq!(pages[1].layout.height(), 4000.0);
        assert_eq!(session.content_height(500.0), 4250.0);

        match &pages[1].layout {
            PositionLayout::Ready { plan, .. } => assert_eq!(plan.len(), 2),
            other => panic!("expected ready layout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn scroll_progress_is_clamped() {
        let resolver = MetricsResolver::new(BySize);
        let session = ReaderSession::new(&resolver, &config(), ["250x1000"]).unwrap();
        session.resolve_all().await;

        // 1000 tall content in a 500 tall viewport.
        assert_eq!(session.scroll_progress(250.0, 250.0, 500.0), 0.5);
        assert_eq!(session.scroll_progress(-10.0, 250.0, 500.0), 0.0);
        assert_eq!(session.scroll_progress(9000.0, 250.0, 500.0), 1.0);
        assert_eq!(session.scroll_progress(10.0, 250.0, 2000.0), 0.0);
    }

    #[tokio::test]
    async fn progress_reports_one_based_pages() {
        let resolver = MetricsResolver::new(BySize);
        let session =
            ReaderSession::new(&resolver, &config(), ["100x100", "100x100", "100x100"]).unwrap();
        session.resolve_all().await;

        let update = session.progress_at(150.0, 100.0, 100.0).unwrap();
        assert_eq!(update.current_page, 2);
        assert_eq!(update.total_pages, 3);
        assert!(!update.is_completed);

        let end = session.progress_at(200.0, 100.0, 100.0).unwrap();
        assert!(end.is_completed);
        assert_eq!(end.current_page, 3);
    }

    #[tokio::test]
    async fn builds_from_payload() {
        let resolver = MetricsResolver::new(BySize);
        let payload = json!({"images": [{"url": "10x10"}, {"url": "20x10"}]});
        let session = ReaderSession::from_payload(&resolver, &config(), &payload).unwrap();
        assert_eq!(session.len(), 2);
        assert_eq!(session.positions()[1].uri(), "20x10");
    }

    #[tokio::test]
    async fn rejects_bad_segment_height() {
        let resolver = MetricsResolver::new(BySize);
        let bad = ReaderConfig {
            max_segment_height: 0.0,
            metrics_timeout: None,
        };
        assert!(ReaderSession::new(&resolver, &bad, ["1x1"]).is_err());
    }

    #[tokio::test]
    async fn close_tears_down_positions() {
        let resolver = MetricsResolver::new(BySize);
        let session = ReaderSession::new(&resolver, &config(), ["1x1", "2x1"]).unwrap();
        session.close();
        assert!(session.positions().iter().all(ReaderPosition::is_torn_down));
        assert_eq!(session.resolve_all().await, vec![None, None]);
    }
}
