//! Foreground enhancer: brightness and saturation boost ahead of masking.

use super::params::MaskTuning;
use super::raster::RasterImage;
use image::RgbImage;

const LUMA_R: f32 = 0.299;
const LUMA_G: f32 = 0.587;
const LUMA_B: f32 = 0.114;

/// Scale chroma around each pixel's luma by `saturation`, then scale the
/// result by `brightness`. Gray pixels only get the brightness change, so
/// hue is preserved. Alpha, if present, is not carried into the result.
pub fn enhance(image: &RasterImage, tuning: &MaskTuning) -> RgbImage {
    let mut rgb = image.as_dynamic().to_rgb8();
    let (brightness, saturation) = (tuning.brightness, tuning.saturation);

    for px in rgb.pixels_mut() {
        let [r, g, b] = px.0.map(f32::from);
        let luma = LUMA_R * r + LUMA_G * g + LUMA_B * b;
        px.0 = [r, g, b].map(|c| {
            let v = (luma + (c - luma) * saturation) * brightness;
            v.round().clamp(0.0, 255.0) as u8
        });
    }
    rgb
}
