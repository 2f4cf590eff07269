//! Drawing the document onto a surface.

use crate::camera::ViewTransform;
use crate::config::RenderStyle;
use crate::document::{Document, Segment, SegmentKind};
use kurbo::{Line, Point, Rect, Size};
use peniko::Color;

/// Target the redraw pass paints into.
pub trait RenderSurface {
    /// Current size in pixels.
    fn size(&self) -> Size;
    /// Resize; contents are discarded.
    fn resize(&mut self, size: Size);
    fn fill_rect(&mut self, rect: Rect, color: Color);
    /// Stroke a round-capped line.
    fn stroke_line(&mut self, line: Line, color: Color, width: f64);
    /// Draw text with its baseline-left corner at `origin`.
    fn fill_text(&mut self, value: &str, origin: Point, font_size: f64, color: Color);
}

/// Clear `surface` and paint the background, dot grid and every visible segment.
pub fn redraw<S: RenderSurface + ?Sized>(surface: &mut S, document: &Document, view: ViewTransform, style: &RenderStyle) {
    let size = surface.size();
    surface.fill_rect(size.to_rect(), style.background.into());
    draw_grid(surface, size, view.scale, style);
    for segment in document.segments() {
        draw_segment(surface, segment, view, style);
    }
}

fn draw_grid<S: RenderSurface + ?Sized>(surface: &mut S, size: Size, scale: f64, style: &RenderStyle) {
    let spacing = style.grid_spacing * scale;
    if spacing <= 0.0 {
        return;
    }
    let color: Color = style.grid_color.into();
    // Dot radius grows with zoom; a zero-length round-capped line is a dot.
    let diameter = 4.0 * scale;
    let mut x = spacing;
    while x < size.width {
        let mut y = spacing;
        while y < size.height {
            let p = Point::new(x, y);
            surface.stroke_line(Line::new(p, p), color, diameter);
            y += spacing;
        }
        x += spacing;
    }
}

/// Draw one segment in screen space, skipping it when it lies wholly
/// outside the surface on either axis.
pub fn draw_segment<S: RenderSurface + ?Sized>(surface: &mut S, segment: &Segment, view: ViewTransform, style: &RenderStyle) -> bool {
    let start = view.world_to_screen(segment.start);
    let end = view.world_to_screen(segment.end);
    if is_culled(start, end, surface.size()) {
        return false;
    }
    match &segment.kind {
        SegmentKind::Freehand => surface.stroke_line(Line::new(start, end), segment.color.into(), style.line_width),
        SegmentKind::Text { value } => {
            let font_size = (end.x - start.x).abs().max((end.y - start.y).abs());
            surface.fill_text(value, start, font_size, segment.color.into());
        }
    }
    true
}

fn is_culled(a: Point, b: Point, size: Size) -> bool {
    (a.x < 0.0 && b.x < 0.0)
        || (a.x > size.width && b.x > size.width)
        || (a.y < 0.0 && b.y < 0.0)
        || (a.y > size.height && b.y > size.height)
}


#[cfg(test)]
mod tests {
    use super::recording::{DrawOp, RecordingSurface};
    use super::*;
    use crate::document::SerializableColor;
    use kurbo::Vec2;

    fn doc_with(lines: &[((f64, f64), (f64, f64))]) -> Document {
        let mut doc = Document::default();
        doc.begin_stroke();
        for &((x0, y0), (x1, y1)) in lines {
            doc.push_segment(Point::new(x0, y0), Point::new(x1, y1), SerializableColor::black());
        }
        doc.close_stroke();
        doc
    }

    #[test]
    fn test_redraw_clears_then_draws_grid() {
        let mut surface = RecordingSurface::new(100.0, 50.0);
        redraw(&mut surface, &Document::default(), ViewTransform::IDENTITY, &RenderStyle::default());
        assert_eq!(surface.ops[0], DrawOp::Rect(Rect::new(0.0, 0.0, 100.0, 50.0)));
        // x in {20,40,60,80}, y in {20,40}
        let dots = surface.ops.iter().filter(|op| matches!(op, DrawOp::Line { .. })).count();
        assert_eq!(dots, 8);
        assert!(surface.strokes().is_empty());
    }

    #[test]
    fn test_grid_spacing_follows_scale() {
        let mut surface = RecordingSurface::new(100.0, 50.0);
        let view = ViewTransform {
            scale: 2.0,
            offset: Vec2::ZERO,
        };
        redraw(&mut surface, &Document::default(), view, &RenderStyle::default());
        // x in {40,80}, y in {40}
        let dots = surface.ops.iter().filter(|op| matches!(op, DrawOp::Line { .. })).count();
        assert_eq!(dots, 2);
    }

    #[test]
    fn test_segments_are_transformed() {
        let doc = doc_with(&[((10.0, 10.0), (20.0, 10.0))]);
        let mut surface = RecordingSurface::new(200.0, 200.0);
        let view = ViewTransform {
            scale: 2.0,
            offset: Vec2::new(5.0, 0.0),
        };
        redraw(&mut surface, &doc, view, &RenderStyle::default());
        assert_eq!(
            surface.strokes(),
            vec![Line::new(Point::new(30.0, 20.0), Point::new(50.0, 20.0))]
        );
    }

    #[test]
    fn test_per_axis_culling() {
        let doc = doc_with(&[
            ((-10.0, 10.0), (-5.0, 20.0)),
            ((10.0, 210.0), (20.0, 220.0)),
            ((-10.0, 10.0), (10.0, 10.0)),
            ((190.0, 190.0), (250.0, 250.0)),
        ]);
        let mut surface = RecordingSurface::new(200.0, 200.0);
        redraw(&mut surface, &doc, ViewTransform::IDENTITY, &RenderStyle::default());
        assert_eq!(surface.strokes().len(), 2);
    }

    #[test]
    fn test_text_font_size_from_span() {
        let mut doc = Document::default();
        doc.add_text("12".to_string(), Point::new(10.0, 10.0), Point::new(30.0, 40.0), SerializableColor::black());
        let mut surface = RecordingSurface::new(200.0, 200.0);
        redraw(&mut surface, &doc, ViewTransform::IDENTITY, &RenderStyle::default());
        assert_eq!(surface.texts(), vec![("12".to_string(), Point::new(10.0, 10.0), 30.0)]);
    }
}
