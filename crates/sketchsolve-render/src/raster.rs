//! CPU raster surface backed by an RGBA image buffer.

use crate::renderer::{RenderResult, RendererError, encode_png};
use image::{Rgba, RgbaImage};
use kurbo::{Line, Point, Rect, Size};
use peniko::Color;
use sketchsolve_core::RenderSurface;

/// Largest surface we agree to allocate, in pixels.
pub const MAX_PIXELS: u64 = 1 << 26;

/// A text run handed to the surface.
///
/// Glyphs are not rasterized; runs are kept so hosts can overlay them.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub value: String,
    pub origin: Point,
    pub font_size: f64,
    pub color: Color,
}

/// Software render surface.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    image: RgbaImage,
    texts: Vec<TextRun>,
}

impl RasterSurface {
    /// Allocate a transparent surface.
    pub fn new(width: u32, height: u32) -> RenderResult<Self> {
        if u64::from(width) * u64::from(height) > MAX_PIXELS {
            return Err(RendererError::Surface(format!("{}x{} exceeds pixel limit", width, height)));
        }
        Ok(Self {
            image: RgbaImage::new(width, height),
            texts: Vec::new(),
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn texts(&self) -> &[TextRun] {
        &self.texts
    }

    /// Pixel at `(x, y)` as RGBA8, if inside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.image.get_pixel_checked(x, y).map(|p| p.0)
    }

    /// Encode the current contents as PNG.
    pub fn to_png(&self) -> RenderResult<Vec<u8>> {
        encode_png(self.image.as_raw(), self.width(), self.height())
    }

    fn blend(&mut self, x: u32, y: u32, src: [u8; 4]) {
        let dst = self.image.get_pixel_mut(x, y);
        if src[3] == 255 {
            *dst = Rgba(src);
            return;
        }
        let a = u32::from(src[3]);
        for i in 0..3 {
            let mixed = (u32::from(src[i]) * a + u32::from(dst.0[i]) * (255 - a)) / 255;
            dst.0[i] = mixed as u8;
        }
        dst.0[3] = (a + u32::from(dst.0[3]) * (255 - a) / 255) as u8;
    }

    /// Pixel index range covering `[lo, hi)` along an axis of `len` pixels.
    fn span(lo: f64, hi: f64, len: u32) -> std::ops::Range<u32> {
        let start = lo.floor().max(0.0).min(f64::from(len)) as u32;
        let end = hi.ceil().max(0.0).min(f64::from(len)) as u32;
        start..end
    }
}

fn rgba8(color: Color) -> [u8; 4] {
    let c = color.to_rgba8();
    [c.r, c.g, c.b, c.a]
}

/// Distance from `p` to the segment `line`.
fn distance_to_segment(p: Point, line: Line) -> f64 {
    let d = line.p1 - line.p0;
    let len_sq = d.hypot2();
    if len_sq < f64::EPSILON {
        return p.distance(line.p0);
    }
    let t = ((p - line.p0).dot(d) / len_sq).clamp(0.0, 1.0);
    p.distance(line.p0 + d * t)
}

impl RenderSurface for RasterSurface {
    fn size(&self) -> Size {
        Size::new(f64::from(self.width()), f64::from(self.height()))
    }

    fn resize(&mut self, size: Size) {
        let width = size.width.max(0.0).ceil() as u32;
        let height = size.height.max(0.0).ceil() as u32;
        match RasterSurface::new(width, height) {
            Ok(surface) => *self = surface,
            Err(e) => log::error!("Resize rejected: {}", e),
        }
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let src = rgba8(color);
        let rect = rect.abs();
        for y in Self::span(rect.y0, rect.y1, self.height()) {
            for x in Self::span(rect.x0, rect.x1, self.width()) {
                self.blend(x, y, src);
            }
        }
        // Texts fully covered by an opaque fill are gone.
        if src[3] == 255 {
            self.texts.retain(|t| !rect.contains(t.origin));
        }
    }

    fn stroke_line(&mut self, line: Line, color: Color, width: f64) {
        let src = rgba8(color);
        let radius = (width / 2.0).max(0.5);
        let bounds = Rect::from_points(line.p0, line.p1).inflate(radius, radius);
        for y in Self::span(bounds.y0, bounds.y1, self.height()) {
            for x in Self::span(bounds.x0, bounds.x1, self.width()) {
                let center = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                if distance_to_segment(center, line) <= radius {
                    self.blend(x, y, src);
                }
            }
        }
    }

    fn fill_text(&mut self, value: &str, origin: Point, font_size: f64, color: Color) {
        self.texts.push(TextRun {
            value: value.to_string(),
            origin,
            font_size,
            color,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: [u8; 4] = [255, 255, 255, 255];
    const BLACK: [u8; 4] = [0, 0, 0, 255];

    fn white_surface(w: u32, h: u32) -> RasterSurface {
        let mut surface = RasterSurface::new(w, h).unwrap();
        surface.fill_rect(Rect::new(0.0, 0.0, f64::from(w), f64::from(h)), Color::WHITE);
        surface
    }

    #[test]
    fn test_fill_rect_clips() {
        let mut surface = RasterSurface::new(10, 10).unwrap();
        surface.fill_rect(Rect::new(-5.0, 2.0, 4.0, 20.0), Color::BLACK);
        assert_eq!(surface.pixel(0, 2), Some(BLACK));
        assert_eq!(surface.pixel(3, 9), Some(BLACK));
        assert_eq!(surface.pixel(4, 2), Some([0, 0, 0, 0]));
        assert_eq!(surface.pixel(0, 1), Some([0, 0, 0, 0]));
        assert_eq!(surface.pixel(10, 0), None);
    }

    #[test]
    fn test_stroke_line_covers_path() {
        let mut surface = white_surface(40, 20);
        surface.stroke_line(Line::new(Point::new(5.0, 10.0), Point::new(35.0, 10.0)), Color::BLACK, 3.0);
        for x in 5..35 {
            assert_eq!(surface.pixel(x, 9), Some(BLACK), "x = {x}");
            assert_eq!(surface.pixel(x, 10), Some(BLACK), "x = {x}");
        }
        assert_eq!(surface.pixel(20, 5), Some(WHITE));
        assert_eq!(surface.pixel(20, 14), Some(WHITE));
        // Round cap reaches past the end point.
        assert_eq!(surface.pixel(35, 10), Some(BLACK));
        assert_eq!(surface.pixel(38, 10), Some(WHITE));
    }

    #[test]
    fn test_zero_length_line_draws_dot() {
        let mut surface = white_surface(10, 10);
        let p = Point::new(5.0, 5.0);
        surface.stroke_line(Line::new(p, p), Color::BLACK, 4.0);
        assert_eq!(surface.pixel(5, 5), Some(BLACK));
        assert_eq!(surface.pixel(4, 4), Some(BLACK));
        assert_eq!(surface.pixel(0, 0), Some(WHITE));
    }

    #[test]
    fn test_text_runs_recorded_and_cleared() {
        let mut surface = white_surface(50, 50);
        surface.fill_text("42", Point::new(10.0, 20.0), 16.0, Color::BLACK);
        assert_eq!(surface.texts().len(), 1);
        assert_eq!(surface.texts()[0].value, "42");
        surface.fill_rect(Rect::new(0.0, 0.0, 50.0, 50.0), Color::WHITE);
        assert!(surface.texts().is_empty());
    }

    #[test]
    fn test_resize_discards_contents() {
        let mut surface = white_surface(10, 10);
        surface.resize(Size::new(20.5, 8.0));
        assert_eq!((surface.width(), surface.height()), (21, 8));
        assert_eq!(surface.pixel(0, 0), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_too_large_surface_rejected() {
        assert!(matches!(RasterSurface::new(1 << 14, 1 << 14), Err(RendererError::Surface(_))));
    }

    #[test]
    fn test_png_decodes_to_surface_size() {
        let surface = white_surface(7, 3);
        let png = surface.to_png().unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (7, 3));
        assert_eq!(decoded.get_pixel(6, 2).0, WHITE);
    }
}
