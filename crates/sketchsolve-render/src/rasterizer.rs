//! PNG rasterizer for idle extractions.

use crate::raster::RasterSurface;
use base64::{Engine, engine::general_purpose::STANDARD};
use sketchsolve_core::{ExtractionJob, RasterError, Rasterizer, RenderSurface};

/// Draws an extraction job onto a fresh surface and returns it as base64 PNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngRasterizer;

impl PngRasterizer {
    pub fn new() -> Self {
        Self
    }

    /// Draw `job` onto a surface of the region's size.
    pub fn render(&self, job: &ExtractionJob) -> Result<RasterSurface, RasterError> {
        let (width, height) = job.region.pixel_size();
        let mut surface = RasterSurface::new(width, height)?;
        surface.fill_rect(surface.size().to_rect(), job.background.into());
        for line in &job.lines {
            surface.stroke_line(*line, job.ink.into(), job.line_width);
        }
        Ok(surface)
    }
}

impl Rasterizer for PngRasterizer {
    fn rasterize(&mut self, job: &ExtractionJob) -> Result<String, RasterError> {
        let surface = self.render(job)?;
        let png = surface.to_png()?;
        log::debug!("Encoded {}x{} extraction, {} bytes", surface.width(), surface.height(), png.len());
        Ok(STANDARD.encode(png))
    }
}
