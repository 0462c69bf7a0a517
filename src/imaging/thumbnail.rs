//! Thumbnail generator: fixed 200×200 cover crop, progressive JPEG.
//!
//! Runs against already-stored bytes and never touches the mask chain.

use super::calculations::cover_crop_window;
use super::error::PipelineError;
use super::params::Quality;
use super::raster::{MediaType, ProcessedImage, RasterImage};
use super::resize::filter_for;
use image::{Rgb, RgbImage};
use jpeg_encoder::{ColorType, Encoder};

/// Edge length of every thumbnail.
pub const THUMBNAIL_SIZE: u32 = 200;

/// Center-crop `image` to the thumbnail's aspect ratio, scale the window to
/// the thumbnail box and encode as JPEG. Transparent regions are flattened
/// onto white.
///
/// The crop happens in source coordinates, so no buffer larger than the
/// source is ever allocated, whatever its aspect ratio.
pub fn cover_thumbnail(
    image: RasterImage,
    quality: Quality,
) -> Result<ProcessedImage, PipelineError> {
    let target = (THUMBNAIL_SIZE, THUMBNAIL_SIZE);
    let (x, y, crop_w, crop_h) = cover_crop_window(image.dimensions(), target);

    let window = image.into_dynamic().crop_imm(x, y, crop_w, crop_h);
    let scaled = window.resize_exact(target.0, target.1, filter_for((crop_w, crop_h), target));
    drop(window);

    let rgb = if scaled.color().has_alpha() {
        flatten_onto_white(&scaled.into_rgba8())
    } else {
        scaled.into_rgb8()
    };

    Ok(ProcessedImage {
        bytes: encode_jpeg(&rgb, quality)?,
        media_type: MediaType::Jpeg,
        width: rgb.width(),
        height: rgb.height(),
    })
}

fn flatten_onto_white(rgba: &image::RgbaImage) -> RgbImage {
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let a = a as u32;
        Rgb([r, g, b].map(|c| ((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8))
    })
}

/// Progressive JPEG at the given quality, clamped to 1-100.
pub fn encode_jpeg(rgb: &RgbImage, quality: Quality) -> Result<Vec<u8>, PipelineError> {
    let width = u16::try_from(rgb.width())
        .map_err(|_| PipelineError::Encode(format!("width {} too large for JPEG", rgb.width())))?;
    let height = u16::try_from(rgb.height()).map_err(|_| {
        PipelineError::Encode(format!("height {} too large for JPEG", rgb.height()))
    })?;

    let mut buf = Vec::new();
    let mut encoder = Encoder::new(&mut buf, quality.value().clamp(1, 100) as u8);
    encoder.set_progressive(true);
    encoder
        .encode(rgb.as_raw(), width, height, ColorType::Rgb)
        .map_err(|e| PipelineError::Encode(format!("JPEG encode failed: {e}")))?;
    Ok(buf)
}
