//! Page layout for the scroll reader.
//!
//! Pages are laid out at viewport width. Tall pages (long strips are common
//! in manhwa) would exceed the GPU texture limit if drawn as one image, so
//! each page is planned as a stack of clipped segments.
//!
//! - [`metrics`] - resolves a page's native aspect ratio, falling back to square
//! - [`segment`] - pure planner splitting a display height into segments
//! - [`position`] - one page slot with cancelable resolution and derived layout
//! - [`session`] - all pages of a chapter, scroll progress
//!
//! ```rust,no_run
//! use yomu::catalog::HttpCatalog;
//! use yomu::config::Config;
//! use yomu::reader::{MetricsResolver, ReaderSession};
//!
//! # async fn example() -> yomu::Result<()> {
//! let config = Config::default();
//! let catalog = HttpCatalog::from_config(&config)?;
//! let resolver = MetricsResolver::from_config(&config)?;
//!
//! let session =
//!     ReaderSession::open(&catalog, &resolver, &config.reader, "solo-leveling", "chapter-1")
//!         .await?;
//! session.resolve_all().await;
//!
//! for page in session.layout(1080.0) {
//!     println!("page {} at {} is {} tall", page.index, page.top, page.layout.height());
//! }
//! # Ok(())
//! # }
//! ```

pub mod metrics;
pub mod position;
pub mod segment;
pub mod session;

pub use metrics::{
    AspectCache, DimensionProbe, HttpProbe, ImageDimensions, MetricsResolver, ResolvedAspect,
};
pub use position::{PLACEHOLDER_HEIGHT, PositionLayout, Priority, ReaderPosition};
pub use segment::{MAX_SEGMENTS, RenderInstruction, RenderMode, Segment, SegmentPlan, plan, try_plan};
pub use session::{PageLayout, ReaderSession};
