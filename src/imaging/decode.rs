//! Decoder/prober: encoded bytes → [`RasterImage`].
//!
//! The container format is sniffed from the magic bytes first; the declared
//! media type is only consulted when sniffing finds nothing. Decoder limits
//! are lifted because uploads are bounded by the host's size limit, not by
//! pixel count.

use super::error::PipelineError;
use super::raster::RasterImage;
use crate::media::essence;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;

/// Decode `bytes` into an 8-bit raster with 1, 3 or 4 channels.
pub fn decode(bytes: &[u8], declared: &str) -> Result<RasterImage, PipelineError> {
    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| PipelineError::Decode(format!("failed to read input: {e}")))?;

    let format = match reader.format() {
        Some(format) => format,
        None => {
            let format = format_from_media_type(declared).ok_or_else(|| {
                PipelineError::Decode(format!("unrecognized image data (declared {declared})"))
            })?;
            reader.set_format(format);
            format
        }
    };
    if !format.reading_enabled() {
        return Err(PipelineError::Decode(format!(
            "no decoder for {format:?} compiled in"
        )));
    }

    reader.no_limits();
    let pixels = reader
        .decode()
        .map_err(|e| PipelineError::Decode(e.to_string()))?;

    if pixels.width() == 0 || pixels.height() == 0 {
        return Err(PipelineError::Decode(format!(
            "zero-area image ({}x{})",
            pixels.width(),
            pixels.height()
        )));
    }

    Ok(RasterImage::new(normalize_samples(pixels), format))
}

/// Map a declared media type to a container format. Accepts the non-standard
/// `image/jpg` that browsers still send.
pub fn format_from_media_type(media_type: &str) -> Option<ImageFormat> {
    match essence(media_type).as_str() {
        "image/jpg" | "image/pjpeg" => Some(ImageFormat::Jpeg),
        other => ImageFormat::from_mime_type(other),
    }
}

/// Collapse every decoded layout onto 8-bit luma, RGB or RGBA.
fn normalize_samples(pixels: DynamicImage) -> DynamicImage {
    match pixels {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => {
            pixels
        }
        other if other.color().has_alpha() => DynamicImage::ImageRgba8(other.to_rgba8()),
        other if other.color().channel_count() == 1 => DynamicImage::ImageLuma8(other.to_luma8()),
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}
