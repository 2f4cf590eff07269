//! Renderer errors and PNG encoding.

use sketchsolve_core::RasterError;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Surface error: {0}")]
    Surface(String),
    #[error("PNG encoding failed: {0}")]
    Encode(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

impl From<RendererError> for RasterError {
    fn from(err: RendererError) -> Self {
        match err {
            RendererError::Surface(msg) => RasterError::Surface(msg),
            RendererError::Encode(msg) => RasterError::Encode(msg),
        }
    }
}

/// Encode tightly packed RGBA8 pixels as PNG.
pub fn encode_png(rgba_data: &[u8], width: u32, height: u32) -> RenderResult<Vec<u8>> {
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder.write_header().map_err(|e| {
            log::error!("Failed to write PNG header: {:?}", e);
            RendererError::Encode(e.to_string())
        })?;

        writer.write_image_data(rgba_data).map_err(|e| {
            log::error!("Failed to write PNG data: {:?}", e);
            RendererError::Encode(e.to_string())
        })?;
    }

    Ok(png_data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_png_signature() {
        let data = encode_png(&[255, 0, 0, 255, 0, 255, 0, 255], 2, 1).unwrap();
        assert_eq!(&data[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_encode_png_wrong_length() {
        assert!(matches!(encode_png(&[0, 0, 0], 2, 2), Err(RendererError::Encode(_))));
    }

    #[test]
    fn test_error_maps_to_raster_error() {
        let err: RasterError = RendererError::Surface("too big".to_string()).into();
        assert!(matches!(err, RasterError::Surface(_)));
    }
}
