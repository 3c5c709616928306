//! A single page slot in the reading list.
//!
//! A [`ReaderPosition`] owns one image URI and the background task resolving
//! its aspect ratio. Layout values are computed on demand from the resolved
//! aspect and the current viewport, never stored, so a rotation or a new
//! segment limit can't leave them stale.
//!
//! Dropping a position (or calling [`ReaderPosition::teardown`]) cancels its
//! resolution. A result that arrives afterwards is discarded: the state
//! transition from pending to resolved and the transition to torn down share
//! one lock, so nothing is written once teardown has happened.

use parking_lot::Mutex;
use serde::Serialize;
use std::pin::pin;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::metrics::{MetricsResolver, ResolvedAspect};
use super::segment::{self, SegmentPlan};

/// Height reserved for a page whose aspect is not known yet.
pub const PLACEHOLDER_HEIGHT: f64 = 300.0;

/// Positions below this index are loaded with high priority.
pub const HIGH_PRIORITY_PAGES: usize = 3;

/// Loading priority hint for the image renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Pending,
    Resolved(ResolvedAspect),
    TornDown,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<State>,
    changed: Notify,
}

impl Shared {
    fn new(state: State) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(state),
            changed: Notify::new(),
        })
    }

    /// Stores `aspect` unless the position already left the pending state.
    fn complete(&self, aspect: ResolvedAspect) -> bool {
        let mut state = self.state.lock();
        if *state != State::Pending {
            return false;
        }
        *state = State::Resolved(aspect);
        drop(state);
        self.changed.notify_waiters();
        true
    }
}

/// Layout of one position for a given viewport.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PositionLayout {
    /// Aspect still resolving; reserve a fixed-height slot.
    Placeholder { height: f64 },
    /// Aspect known; draw the segments of `plan`.
    Ready {
        aspect: ResolvedAspect,
        plan: SegmentPlan,
    },
}

impl PositionLayout {
    /// Vertical space the position occupies.
    pub fn height(&self) -> f64 {
        match self {
            PositionLayout::Placeholder { height } => *height,
            PositionLayout::Ready { plan, .. } => plan.display_height(),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, PositionLayout::Ready { .. })
    }
}

/// One page image within a chapter's reading list.
#[derive(Debug)]
pub struct ReaderPosition {
    index: usize,
    uri: Arc<str>,
    shared: Arc<Shared>,
    token: CancellationToken,
}

impl ReaderPosition {
    /// Creates a position and starts resolving its aspect.
    ///
    /// A cached aspect is used immediately; otherwise a task is spawned on
    /// the current tokio runtime, so this must be called from within one.
    pub fn spawn(index: usize, uri: impl Into<Arc<str>>, resolver: &MetricsResolver) -> Self {
        let uri: Arc<str> = uri.into();
        let token = CancellationToken::new();

        if let Some(aspect) = resolver.cached(&uri) {
            return Self {
                index,
                uri,
                shared: Shared::new(State::Resolved(aspect)),
                token,
            };
        }

        let shared = Shared::new(State::Pending);
        let task_shared = Arc::clone(&shared);
        let task_token = token.clone();
        let task_uri = Arc::clone(&uri);
        let resolver = resolver.clone();

        tokio::spawn(async move {
            let aspect = tokio::select! {
                biased;
                _ = task_token.cancelled() => {
                    debug!(uri = %task_uri, "aspect resolution cancelled");
                    return;
                }
                aspect = resolver.resolve(&task_uri) => aspect,
            };
            if !task_shared.complete(aspect) {
                debug!(uri = %task_uri, "discarding aspect for torn down position");
            }
        });

        Self {
            index,
            uri,
            shared,
            token,
        }
    }

    /// Zero-based position in the reading list.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn priority(&self) -> Priority {
        if self.index < HIGH_PRIORITY_PAGES {
            Priority::High
        } else {
            Priority::Normal
        }
    }

    /// The resolved aspect, or `None` while pending or after teardown.
    pub fn aspect(&self) -> Option<ResolvedAspect> {
        match *self.shared.state.lock() {
            State::Resolved(aspect) => Some(aspect),
            State::Pending | State::TornDown => None,
        }
    }

    pub fn is_torn_down(&self) -> bool {
        *self.shared.state.lock() == State::TornDown
    }

    /// Waits until the aspect resolves. Returns `None` if the position is
    /// torn down first.
    pub async fn resolved(&self) -> Option<ResolvedAspect> {
        loop {
            let mut notified = pin!(self.shared.changed.notified());
            notified.as_mut().enable();

            let state = *self.shared.state.lock();
            match state {
                State::Resolved(aspect) => return Some(aspect),
                State::TornDown => return None,
                State::Pending => notified.await,
            }
        }
    }

    /// Rendered height at `viewport_width`, once the aspect is known.
    ///
    /// `None` while pending, after teardown, or for a non-positive width.
    pub fn display_height(&self, viewport_width: f64) -> Option<f64> {
        if !(viewport_width.is_finite() && viewport_width > 0.0) {
            return None;
        }
        self.aspect()
            .map(|aspect| segment::display_height(viewport_width, aspect.ratio()))
    }

    /// Segment plan at `viewport_width`, once the aspect is known.
    ///
    /// Pages needing more than [`segment::MAX_SEGMENTS`] windows get no plan
    /// and keep their placeholder.
    pub fn plan(&self, viewport_width: f64, max_segment_height: f64) -> Option<SegmentPlan> {
        let height = self.display_height(viewport_width)?;
        segment::try_plan(height, max_segment_height).ok()
    }

    /// Placeholder or segment plan, whichever applies right now.
    pub fn layout(&self, viewport_width: f64, max_segment_height: f64) -> PositionLayout {
        match (self.aspect(), self.plan(viewport_width, max_segment_height)) {
            (Some(aspect), Some(plan)) => PositionLayout::Ready { aspect, plan },
            _ => PositionLayout::Placeholder {
                height: PLACEHOLDER_HEIGHT,
            },
        }
    }

    /// Cancels resolution and freezes the position. Idempotent.
    pub fn teardown(&self) {
        self.token.cancel();
        let mut state = self.shared.state.lock();
        if *state != State::TornDown {
            *state = State::TornDown;
            drop(state);
            self.shared.changed.notify_waiters();
        }
    }
}

impl Drop for ReaderPosition {
    fn drop(&mut self) {
        self.teardown();
    }
}
