//! Eraser hit testing.
//!
//! The spatial index narrows candidates to those whose box meets the eraser
//! square; [`segment_hit`] then decides each candidate precisely.

use crate::config::EraserConfig;
use crate::document::{Document, Segment, SegmentId};
use kurbo::{Point, Rect};

/// Eraser tool state.
#[derive(Debug, Clone, PartialEq)]
pub struct Eraser {
    /// Radius in document units.
    pub size: f64,
    pub endpoint_ratio: f64,
    pub projection_ratio: f64,
    size_scale: f64,
}

impl Default for Eraser {
    fn default() -> Self {
        Self::from_config(&EraserConfig::default())
    }
}

impl Eraser {
    pub fn from_config(config: &EraserConfig) -> Self {
        Self {
            size: config.default_size,
            endpoint_ratio: config.endpoint_ratio,
            projection_ratio: config.projection_ratio,
            size_scale: config.size_scale,
        }
    }

    /// Apply a size chosen in the toolbar.
    pub fn set_size(&mut self, toolbar_size: f64) {
        self.size = toolbar_size * self.size_scale;
    }

    /// Square query box around `center`.
    pub fn query_box(&self, center: Point) -> Rect {
        Rect::new(
            center.x - self.size,
            center.y - self.size,
            center.x + self.size,
            center.y + self.size,
        )
    }

    /// Whether the eraser centered at `center` hits `segment`.
    pub fn hits(&self, segment: &Segment, center: Point) -> bool {
        segment_hit(
            segment.start,
            segment.end,
            center,
            self.size * self.endpoint_ratio,
            self.size * self.projection_ratio,
        )
    }

    /// Segments of `document` hit by the eraser at the document-space `center`.
    pub fn collect_hits(&self, document: &Document, center: Point) -> Vec<SegmentId> {
        document
            .query_range(self.query_box(center))
            .into_iter()
            .filter(|&id| document.segment(id).is_some_and(|s| self.hits(s, center)))
            .collect()
    }
}

/// Canonical segment hit test.
///
/// A segment is hit when `center` lies within `endpoint_radius` of either
/// endpoint, or when its projection falls inside the segment and lies within
/// `projection_radius` of it. Zero-length segments are always hit.
pub fn segment_hit(start: Point, end: Point, center: Point, endpoint_radius: f64, projection_radius: f64) -> bool {
    if center.distance(start) <= endpoint_radius || center.distance(end) <= endpoint_radius {
        return true;
    }

    let line = end - start;
    let length_sq = line.hypot2();
    if length_sq < f64::EPSILON {
        return true;
    }

    let t = (center - start).dot(line) / length_sq;
    if !(0.0..=1.0).contains(&t) {
        return false;
    }
    let projection = start + line * t;
    center.distance(projection) <= projection_radius
}
