//! # Yomu - manga reading client core
//!
//! Yomu is the non-UI half of a manga reader. It talks to a manga catalog API,
//! keeps per-user state (library, reading progress, preferences, history) and
//! lays out chapter pages for a vertical scroll reader, splitting very tall
//! pages into segments that stay under GPU texture limits.
//!
//! ## Features
//!
//! - **Catalog Proxy**: home feed, search, browse, chapter images and recommendations
//! - **User-State Store**: upsert-only tables with JSON snapshot persistence
//! - **Tall-Page Segmentation**: exact, gap-free vertical slicing of page images
//! - **Graceful Metrics**: dimension lookups never fail; broken pages fall back to square
//! - **Cancelable Resolution**: torn down pages drop late results instead of writing stale state
//! - **Async/Await Support**: built on tokio, with `tracing` instrumentation throughout
//!
//! ## Quick Start
//!
//! ### Planning a tall page
//!
//! ```rust
//! use yomu::reader::plan;
//!
//! let plan = plan(6100.0, 2048.0);
//! let heights: Vec<f64> = plan.segments().iter().map(|s| s.height).collect();
//! assert_eq!(heights, vec![2048.0, 2048.0, 2004.0]);
//! ```
//!
//! ### Tracking a library
//!
//! ```rust
//! use yomu::prelude::*;
//!
//! let store = Store::in_memory();
//! store.add_to_library("user-1", "omniscient-reader", ReadingStatus::Reading);
//! store.add_to_search_history("user-1", "omniscient");
//!
//! assert_eq!(store.library_stats("user-1").reading, 1);
//! assert_eq!(store.search_history("user-1")[0].query, "omniscient");
//! ```
//!
//! ### Searching the catalog
//!
//! ```rust,no_run
//! use yomu::prelude::*;
//!
//! # async fn example() -> yomu::Result<()> {
//! let catalog = HttpCatalog::from_config(&Config::default())?;
//! let results = catalog.search("tower of god", 1).await?;
//! println!("{results:#}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`catalog`]: [`Catalog`] trait and its HTTP implementation
//! - [`store`]: per-user state tables
//! - [`reader`]: image metrics, segment planning, positions and sessions
//! - [`net`]: HTTP client, rate limiting and JSON helpers
//! - [`config`]: TOML/env configuration
//! - [`logging`]: `tracing-subscriber` setup
//! - [`error`]: error handling

pub mod catalog;
pub mod config;
pub mod error;
pub mod logging;
pub mod net;
pub mod reader;
pub mod store;
pub mod types;

/// Prelude module for convenient imports.
///
/// ```rust
/// use yomu::prelude::*;
///
/// // Catalog, HttpCatalog, Store, Config, ReaderSession, MetricsResolver,
/// // SegmentPlan, ReadingStatus, ... are now in scope.
/// ```
pub mod prelude {
    pub use crate::{
        catalog::{Catalog, HttpCatalog},
        config::{Config, ReaderConfig},
        error::{Error, Result},
        reader::{
            MetricsResolver, PositionLayout, ReaderPosition, ReaderSession, RenderMode,
            ResolvedAspect, Segment, SegmentPlan,
        },
        store::{Store, progress::PageUpdate},
        types::{
            BrowseKind, LibraryEntry, PreferencesPatch, ReadingProgress, ReadingStatus,
            UserPreferences,
        },
    };
}

// Re-export main types at crate root for direct access
pub use catalog::{Catalog, HttpCatalog};
pub use config::Config;
pub use error::{Error, Result};
pub use reader::{MetricsResolver, ReaderSession, SegmentPlan};
pub use store::Store;

/// Crate version, for user agents and diagnostics.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
