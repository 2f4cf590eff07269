//! Viewport module for pan/zoom transforms.

use crate::config::ViewportConfig;
use kurbo::{Point, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Viewport manages the view transform for the drawing surface.
///
/// Document ("true") coordinates map to screen coordinates as
/// `screen = (true + offset) * scale`. The offset lives in the same space as
/// the raw pointer deltas that produce it, which is why panning adds screen
/// deltas without dividing by the scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    /// Shared zoom factor for both axes.
    pub scale: f64,
    /// Accumulated pan offset, per axis.
    pub offset: Vec2,
    /// Last pointer position seen by the input controller (screen space).
    pub prev_cursor: Point,
    /// Smallest accepted scale.
    pub min_scale: f64,
    /// Largest accepted scale.
    pub max_scale: f64,
    /// Wheel delta that corresponds to a 100% zoom step.
    pub zoom_sensitivity: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::from_config(&ViewportConfig::default())
    }
}

impl Viewport {
    /// Create a viewport at identity transform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a viewport using the given limits.
    pub fn from_config(config: &ViewportConfig) -> Self {
        Self {
            scale: 1.0,
            offset: Vec2::ZERO,
            prev_cursor: Point::ZERO,
            min_scale: config.min_scale,
            max_scale: config.max_scale,
            zoom_sensitivity: config.zoom_sensitivity,
        }
    }

    /// Convert a single document coordinate to screen space.
    pub fn to_screen(&self, true_coord: f64, offset: f64) -> f64 {
        (true_coord + offset) * self.scale
    }

    /// Convert a single screen coordinate to document space.
    pub fn to_true(&self, screen_coord: f64, offset: f64) -> f64 {
        screen_coord / self.scale - offset
    }

    /// Convert a document point to screen coordinates.
    pub fn world_to_screen(&self, point: Point) -> Point {
        Point::new(
            self.to_screen(point.x, self.offset.x),
            self.to_screen(point.y, self.offset.y),
        )
    }

    /// Convert a screen point to document coordinates.
    pub fn screen_to_world(&self, point: Point) -> Point {
        Point::new(
            self.to_true(point.x, self.offset.x),
            self.to_true(point.y, self.offset.y),
        )
    }

    /// Freeze the current transform.
    pub fn snapshot(&self) -> ViewTransform {
        ViewTransform {
            scale: self.scale,
            offset: self.offset,
        }
    }

    /// Pan by a raw screen-space delta.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Zoom in response to a wheel event, keeping the pointer region in view.
    ///
    /// `pointer` is relative to the canvas origin. Returns `false` (and leaves
    /// every field untouched) when the resulting scale is out of range.
    pub fn zoom_at(&mut self, pointer: Point, canvas: Size, delta_y: f64) -> bool {
        let scale_amount = -delta_y / self.zoom_sensitivity;
        let new_scale = self.scale * (1.0 + scale_amount);
        if !(self.min_scale..=self.max_scale).contains(&new_scale) {
            log::debug!("Zoom rejected: scale {:.3} out of range", new_scale);
            return false;
        }
        self.scale = new_scale;

        let (dist_x, dist_y) = if canvas.width > 0.0 && canvas.height > 0.0 {
            (pointer.x / canvas.width, pointer.y / canvas.height)
        } else {
            (0.0, 0.0)
        };

        let units_zoomed_x = (canvas.width / new_scale) * scale_amount;
        let units_zoomed_y = (canvas.height / new_scale) * scale_amount;
        self.offset.x -= units_zoomed_x * dist_x;
        self.offset.y -= units_zoomed_y * dist_y;
        true
    }

    /// Reset to identity transform.
    pub fn reset(&mut self) {
        self.scale = 1.0;
        self.offset = Vec2::ZERO;
    }
}

/// A frozen `(scale, offset)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    pub scale: f64,
    pub offset: Vec2,
}

impl ViewTransform {
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        offset: Vec2::ZERO,
    };

    pub fn world_to_screen(&self, point: Point) -> Point {
        Point::new(
            (point.x + self.offset.x) * self.scale,
            (point.y + self.offset.y) * self.scale,
        )
    }

    pub fn screen_to_world(&self, point: Point) -> Point {
        Point::new(
            point.x / self.scale - self.offset.x,
            point.y / self.scale - self.offset.y,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_viewport() {
        let viewport = Viewport::new();
        assert_eq!(viewport.offset, Vec2::ZERO);
        assert!((viewport.scale - 1.0).abs() < f64::EPSILON);
        assert!((viewport.min_scale - 0.3).abs() < f64::EPSILON);
        assert!((viewport.max_scale - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_to_screen_formula() {
        let mut viewport = Viewport::new();
        viewport.scale = 2.0;
        assert!((viewport.to_screen(10.0, 5.0) - 30.0).abs() < f64::EPSILON);
        assert!((viewport.to_true(30.0, 5.0) - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_roundtrip_conversion() {
        let mut viewport = Viewport::new();
        for &(scale, ox, oy) in &[(0.3, -120.5, 40.0), (1.0, 0.0, 0.0), (2.7, 33.3, -999.0)] {
            viewport.scale = scale;
            viewport.offset = Vec2::new(ox, oy);
            for &t in &[-500.0, -1.25, 0.0, 7.5, 1234.5678] {
                let back = viewport.to_true(viewport.to_screen(t, ox), ox);
                assert!((back - t).abs() < 1e-9, "scale {scale} offset {ox} t {t}");
            }
            let original = Point::new(123.0, -456.0);
            let back = viewport.screen_to_world(viewport.world_to_screen(original));
            assert!((back.x - original.x).abs() < 1e-9);
            assert!((back.y - original.y).abs() < 1e-9);
        }
    }

    #[test]
    fn test_pan_adds_raw_delta() {
        let mut viewport = Viewport::new();
        viewport.scale = 2.0;
        viewport.pan(Vec2::new(10.0, -20.0));
        assert!((viewport.offset.x - 10.0).abs() < f64::EPSILON);
        assert!((viewport.offset.y + 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zoom_in_updates_scale_and_offset() {
        let mut viewport = Viewport::new();
        let canvas = Size::new(800.0, 600.0);
        // -deltaY / 500 = 0.1
        assert!(viewport.zoom_at(Point::new(400.0, 300.0), canvas, -50.0));
        assert!((viewport.scale - 1.1).abs() < 1e-12);
        let expected_x = -(800.0 / 1.1) * 0.1 * 0.5;
        let expected_y = -(600.0 / 1.1) * 0.1 * 0.5;
        assert!((viewport.offset.x - expected_x).abs() < 1e-9);
        assert!((viewport.offset.y - expected_y).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_at_origin_keeps_offset() {
        let mut viewport = Viewport::new();
        assert!(viewport.zoom_at(Point::ZERO, Size::new(800.0, 600.0), 100.0));
        assert!((viewport.scale - 0.8).abs() < 1e-12);
        assert_eq!(viewport.offset, Vec2::ZERO);
    }

    #[test]
    fn test_zoom_out_of_range_is_rejected() {
        let mut viewport = Viewport::new();
        viewport.offset = Vec2::new(12.0, 34.0);
        viewport.scale = 2.9;
        let canvas = Size::new(800.0, 600.0);

        // 2.9 * 1.2 = 3.48 > 3.0
        assert!(!viewport.zoom_at(Point::new(100.0, 100.0), canvas, -100.0));
        assert!((viewport.scale - 2.9).abs() < f64::EPSILON);
        assert_eq!(viewport.offset, Vec2::new(12.0, 34.0));

        viewport.scale = 0.31;
        // 0.31 * 0.5 = 0.155 < 0.3
        assert!(!viewport.zoom_at(Point::new(100.0, 100.0), canvas, 250.0));
        assert!((viewport.scale - 0.31).abs() < f64::EPSILON);
        assert_eq!(viewport.offset, Vec2::new(12.0, 34.0));
    }

    #[test]
    fn test_snapshot_matches_live_transform() {
        let mut viewport = Viewport::new();
        viewport.scale = 1.7;
        viewport.offset = Vec2::new(-3.0, 8.0);
        let frozen = viewport.snapshot();
        let p = Point::new(42.0, 17.0);
        assert_eq!(frozen.world_to_screen(p), viewport.world_to_screen(p));
        assert_eq!(frozen.screen_to_world(p), viewport.screen_to_world(p));
    }
}
