//! Vertical segmentation of tall page images.
//!
//! A page rendered at viewport width can end up taller than the largest
//! texture the platform will upload. Such pages are drawn as a stack of
//! windows onto the same image: each window is at most `max_segment_height`
//! tall and shows the full-height image shifted up by `-offset_y`.
//!
//! ```rust
//! use yomu::reader::segment::{plan, RenderMode};
//!
//! let plan = plan(3000.0, 2048.0);
//! assert_eq!(plan.len(), 2);
//! assert_eq!(plan.segments()[1].offset_y, -2048.0);
//! assert_eq!(plan.segments()[1].height, 952.0);
//! assert_eq!(plan.mode(), RenderMode::Crop);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One vertical window onto a page image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub index: usize,
    /// Where the top of the full image sits relative to this window. Never positive.
    pub offset_y: f64,
    /// Window height. Always positive.
    pub height: f64,
}

/// How the renderer should place the image inside a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Scale the whole image into the window.
    Fit,
    /// Draw the full-height image at `offset_y` and clip to the window.
    Crop,
}

/// Ordered segments covering a page's display height with no gaps or overlaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentPlan {
    display_height: f64,
    max_segment_height: f64,
    segments: Vec<Segment>,
}

impl SegmentPlan {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn display_height(&self) -> f64 {
        self.display_height
    }

    pub fn max_segment_height(&self) -> f64 {
        self.max_segment_height
    }

    /// `Fit` for a single segment, `Crop` when the page is split.
    pub fn mode(&self) -> RenderMode {
        if self.segments.len() > 1 {
            RenderMode::Crop
        } else {
            RenderMode::Fit
        }
    }

    /// Render instructions for every segment, in order.
    pub fn render_instructions(&self) -> Vec<RenderInstruction> {
        let mode = self.mode();
        self.segments
            .iter()
            .map(|&segment| RenderInstruction {
                segment,
                image_height: self.display_height,
                mode,
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a SegmentPlan {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

/// What a platform image view needs to draw one segment.
///
/// The view is `segment.height` tall with overflow clipped. Inside it the
/// image is laid out `image_height` tall at `top = segment.offset_y` when
/// `mode` is [`RenderMode::Crop`], or scaled to fit when it is
/// [`RenderMode::Fit`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderInstruction {
    pub segment: Segment,
    pub image_height: f64,
    pub mode: RenderMode,
}

/// Display height of an image scaled to `viewport_width`.
///
/// `aspect` is width / height and must be positive.
pub fn display_height(viewport_width: f64, aspect: f64) -> f64 {
    debug_assert!(aspect > 0.0, "aspect ratio must be positive, got {aspect}");
    viewport_width / aspect
}

/// Splits `display_height` into windows no taller than `max_segment_height`.
///
/// Both arguments must be positive and finite; violating that is a caller
/// bug (checked in debug builds). Use [`try_plan`] for unchecked input.
pub fn plan(display_height: f64, max_segment_height: f64) -> SegmentPlan {
    debug_assert!(
        valid(display_height) && valid(max_segment_height),
        "plan({display_height}, {max_segment_height}) needs positive finite heights"
    );

    if display_height <= max_segment_height {
        return SegmentPlan {
            display_height,
            max_segment_height,
            segments: vec![Segment {
                index: 0,
                offset_y: 0.0,
                height: display_height,
            }],
        };
    }

    let count = segment_count(display_height, max_segment_height);
    let last = count - 1;
    let segments = (0..count)
        .map(|index| Segment {
            index,
            offset_y: -(index as f64) * max_segment_height,
            height: if index == last {
                display_height - max_segment_height * last as f64
            } else {
                max_segment_height
            },
        })
        .collect();

    SegmentPlan {
        display_height,
        max_segment_height,
        segments,
    }
}

/// Number of windows needed so that every one is at most `max` tall and the
/// last one is non-empty.
///
/// `ceil(display / max)` alone is off by one when the quotient rounds across
/// an integer, so the count is corrected against the products actually used
/// to place the windows.
fn segment_count(display_height: f64, max_segment_height: f64) -> usize {
    let mut count = (display_height / max_segment_height).ceil().max(1.0) as usize;
    while count > 1 && max_segment_height * (count - 1) as f64 >= display_height {
        count -= 1;
    }
    while max_segment_height * (count as f64) < display_height {
        count += 1;
    }
    count
}

/// Largest plan [`try_plan`] will build.
///
/// Image headers are untrusted; a 1 x 50,000,000 px strip would otherwise
/// plan millions of windows.
pub const MAX_SEGMENTS: usize = 4096;

/// Checked variant of [`plan`].
///
/// # Errors
///
/// [`Error::InvalidInput`] when either height is non-positive or not finite,
/// or when the page would need more than [`MAX_SEGMENTS`] windows.
pub fn try_plan(display_height: f64, max_segment_height: f64) -> Result<SegmentPlan> {
    if !valid(display_height) || !valid(max_segment_height) {
        return Err(Error::invalid_input(format!(
            "segment planning needs positive finite heights, got display={display_height} max={max_segment_height}"
        )));
    }
    let needed = display_height / max_segment_height;
    if needed > MAX_SEGMENTS as f64 {
        return Err(Error::invalid_input(format!(
            "page of height {display_height} needs {needed:.0} segments of {max_segment_height}, limit is {MAX_SEGMENTS}"
        )));
    }
    Ok(plan(display_height, max_segment_height))
}

fn valid(height: f64) -> bool {
    height.is_finite() && height > 0.0
}
