//! SketchSolve Render Library
//!
//! Software rendering for SketchSolve: an RGBA raster surface for the live
//! canvas and the PNG rasterizer used for idle extractions.

pub mod raster;
pub mod rasterizer;
mod renderer;

pub use raster::{RasterSurface, TextRun};
pub use rasterizer::PngRasterizer;
pub use renderer::{RenderResult, RendererError, encode_png};
