//! Compositor and PNG encoder.

use super::error::{PipelineError, Stage};
use super::raster::{Mask, RasterImage};
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, RgbaImage};

/// Destination-in: `alpha = min(alpha, mask)`; RGB untouched.
///
/// Images without alpha get a fully opaque channel first. Consumes the image.
pub fn apply_mask(image: RasterImage, mask: &Mask) -> Result<RgbaImage, PipelineError> {
    if image.dimensions() != mask.dimensions() {
        return Err(PipelineError::processing(
            Stage::Compositor,
            format!(
                "mask is {}x{} but image is {}x{}",
                mask.width(),
                mask.height(),
                image.width(),
                image.height()
            ),
        ));
    }
    let mut rgba = image.into_dynamic().into_rgba8();
    for (px, &m) in rgba.pixels_mut().zip(mask.as_raw()) {
        px.0[3] = px.0[3].min(m);
    }
    Ok(rgba)
}

/// Remove any alpha channel so the encoded output is fully opaque.
pub fn drop_alpha(image: RasterImage) -> RasterImage {
    if !image.has_alpha() {
        return image;
    }
    image.map_pixels(|pixels| DynamicImage::ImageRgb8(pixels.into_rgb8()))
}

/// PNG at maximum compression with adaptive row filtering.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, PipelineError> {
    let mut buf = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut buf, CompressionType::Best, FilterType::Adaptive);
    image
        .write_with_encoder(encoder)
        .map_err(|e| PipelineError::Encode(format!("PNG encode failed: {e}")))?;
    Ok(buf)
}
