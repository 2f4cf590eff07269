//! Idle extraction: cropping pending strokes into a rasterization job.

use crate::camera::ViewTransform;
use crate::config::ExtractConfig;
use crate::document::{Document, SerializableColor};
use kurbo::{Line, Point};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rasterization errors.
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("Failed to allocate surface: {0}")]
    Surface(String),
    #[error("Failed to encode image: {0}")]
    Encode(String),
}

/// Padded screen-space bounding box of one idle cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub width: f64,
    pub height: f64,
    /// Viewport at the moment the region was taken.
    pub view: ViewTransform,
}

impl Region {
    pub fn origin(&self) -> Point {
        Point::new(self.min_x, self.min_y)
    }

    /// Image size in whole pixels.
    pub fn pixel_size(&self) -> (u32, u32) {
        (self.width.ceil().max(1.0) as u32, self.height.ceil().max(1.0) as u32)
    }
}

/// Compute the padded region around screen-space lines.
///
/// Width and height are padded with the unclamped extents; the min corner is
/// then inset and clamped at zero. Returns `None` for no lines.
pub fn compute_region(lines: &[Line], view: ViewTransform, config: &ExtractConfig) -> Option<Region> {
    let first = lines.first()?;
    let (mut min_x, mut min_y) = (first.p0.x, first.p0.y);
    let (mut max_x, mut max_y) = (min_x, min_y);
    for line in lines {
        for p in [line.p0, line.p1] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
    }

    let width = max_x - min_x + config.span_pad;
    let height = max_y - min_y + config.span_pad;
    Some(Region {
        min_x: (min_x - config.corner_inset).max(0.0),
        min_y: (min_y - config.corner_inset).max(0.0),
        max_x,
        max_y,
        width,
        height,
        view,
    })
}

/// Everything a rasterizer needs to draw one extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionJob {
    pub region: Region,
    /// Lines already translated into image space.
    pub lines: Vec<Line>,
    pub line_width: f64,
    pub background: SerializableColor,
    pub ink: SerializableColor,
}

impl ExtractionJob {
    /// Build a job from the document's pending strokes at the given view.
    ///
    /// Returns `None` when nothing is pending.
    pub fn from_pending(document: &Document, view: ViewTransform, config: &ExtractConfig) -> Option<Self> {
        let screen: Vec<Line> = document
            .pending_strokes()
            .flat_map(|stroke| stroke.segments.iter())
            .map(|s| Line::new(view.world_to_screen(s.start), view.world_to_screen(s.end)))
            .collect();
        let region = compute_region(&screen, view, config)?;
        let shift = region.origin().to_vec2();
        let lines = screen.into_iter().map(|l| Line::new(l.p0 - shift, l.p1 - shift)).collect();
        Some(Self {
            region,
            lines,
            line_width: config.line_width,
            background: config.background,
            ink: config.ink,
        })
    }
}

/// Turns a job into a base64-encoded PNG payload.
pub trait Rasterizer {
    fn rasterize(&mut self, job: &ExtractionJob) -> Result<String, RasterError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Vec2;

    fn line(x0: f64, y0: f64, x1: f64, y1: f64) -> Line {
        Line::new(Point::new(x0, y0), Point::new(x1, y1))
    }

    #[test]
    fn test_region_for_single_line() {
        let region = compute_region(&[line(10.0, 10.0, 110.0, 10.0)], ViewTransform::IDENTITY, &ExtractConfig::default())
            .unwrap();
        assert!((region.min_x - 0.0).abs() < f64::EPSILON);
        assert!((region.min_y - 0.0).abs() < f64::EPSILON);
        assert!((region.width - 150.0).abs() < f64::EPSILON);
        assert!((region.height - 50.0).abs() < f64::EPSILON);
        assert_eq!(region.pixel_size(), (150, 50));
    }

    #[test]
    fn test_region_inset_without_clamp() {
        let region = compute_region(
            &[line(100.0, 200.0, 140.0, 260.0), line(140.0, 260.0, 90.0, 210.0)],
            ViewTransform::IDENTITY,
            &ExtractConfig::default(),
        )
        .unwrap();
        assert!((region.min_x - 70.0).abs() < f64::EPSILON);
        assert!((region.min_y - 180.0).abs() < f64::EPSILON);
        assert!((region.max_x - 140.0).abs() < f64::EPSILON);
        assert!((region.width - 100.0).abs() < f64::EPSILON);
        assert!((region.height - 110.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_has_no_region() {
        assert!(compute_region(&[], ViewTransform::IDENTITY, &ExtractConfig::default()).is_none());
        let doc = Document::default();
        assert!(ExtractionJob::from_pending(&doc, ViewTransform::IDENTITY, &ExtractConfig::default()).is_none());
    }

    #[test]
    fn test_job_translates_into_image_space() {
        let mut doc = Document::default();
        doc.begin_stroke();
        doc.push_segment(Point::new(40.0, 50.0), Point::new(60.0, 50.0), SerializableColor::black());
        doc.close_stroke();

        let view = ViewTransform {
            scale: 2.0,
            offset: Vec2::new(10.0, 0.0),
        };
        let job = ExtractionJob::from_pending(&doc, view, &ExtractConfig::default()).unwrap();
        // Screen: (100, 100) -> (140, 100); origin (80, 80).
        assert_eq!(job.region.origin(), Point::new(80.0, 80.0));
        assert_eq!(job.lines, vec![line(20.0, 20.0, 60.0, 20.0)]);
        assert_eq!(job.region.view, view);
        assert!((job.line_width - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_text_is_never_extracted() {
        let mut doc = Document::default();
        doc.add_text("9".to_string(), Point::ZERO, Point::new(10.0, 10.0), SerializableColor::black());
        assert!(ExtractionJob::from_pending(&doc, ViewTransform::IDENTITY, &ExtractConfig::default()).is_none());
    }
}
