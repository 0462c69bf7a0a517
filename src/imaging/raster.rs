//! Pixel buffers that flow between stages.
//!
//! A [`RasterImage`] is created by the decoder and moved through the chain;
//! no stage keeps a reference to a buffer it has handed on. Pixels are stored
//! interleaved in RGB(A) order (or single-channel luma), 8 bits per sample.

use image::{DynamicImage, GrayImage, ImageFormat};
use std::fmt;

/// A decoded image plus the container format it came from.
///
/// Invariant: the buffer holds `width × height × channels` bytes, with
/// `channels` one of 1, 3 or 4.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pixels: DynamicImage,
    format: ImageFormat,
}

impl RasterImage {
    pub(crate) fn new(pixels: DynamicImage, format: ImageFormat) -> Self {
        Self { pixels, format }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.pixels.width(), self.pixels.height())
    }

    pub fn channels(&self) -> u8 {
        self.pixels.color().channel_count()
    }

    pub fn has_alpha(&self) -> bool {
        self.pixels.color().has_alpha()
    }

    /// Container format detected at decode time.
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.pixels
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.pixels
    }

    /// Replace the pixels, keeping the source format tag.
    pub(crate) fn map_pixels(self, f: impl FnOnce(DynamicImage) -> DynamicImage) -> Self {
        Self {
            pixels: f(self.pixels),
            format: self.format,
        }
    }
}

/// Single-channel opacity contribution: 0 is fully transparent, 255 fully opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask(GrayImage);

impl Mask {
    pub(crate) fn from_gray(gray: GrayImage) -> Self {
        Self(gray)
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    /// Mask value at `(x, y)`. Panics when out of bounds, like `GrayImage`.
    pub fn value(&self, x: u32, y: u32) -> u8 {
        self.0.get_pixel(x, y).0[0]
    }

    pub fn as_raw(&self) -> &[u8] {
        self.0.as_raw()
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.0
    }

    pub fn into_gray(self) -> GrayImage {
        self.0
    }
}

/// Declared media type of a pipeline output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Png,
    Jpeg,
}

impl MediaType {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::Png => "image/png",
            MediaType::Jpeg => "image/jpeg",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final encoded output. Ownership passes to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedImage {
    pub bytes: Vec<u8>,
    pub media_type: MediaType,
    pub width: u32,
    pub height: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, RgbaImage};

    #[test]
    fn raster_reports_layout() {
        let raster = RasterImage::new(
            DynamicImage::ImageRgba8(RgbaImage::new(4, 3)),
            ImageFormat::Png,
        );
        assert_eq!(raster.dimensions(), (4, 3));
        assert_eq!(raster.channels(), 4);
        assert!(raster.has_alpha());
        assert_eq!(raster.format(), ImageFormat::Png);
        assert_eq!(raster.as_dynamic().as_bytes().len(), 4 * 3 * 4);
    }

    #[test]
    fn map_pixels_keeps_format() {
        let raster = RasterImage::new(
            DynamicImage::ImageRgba8(RgbaImage::new(4, 3)),
            ImageFormat::Jpeg,
        );
        let gray = raster.map_pixels(|p| DynamicImage::ImageLuma8(p.to_luma8()));
        assert_eq!(gray.channels(), 1);
        assert!(!gray.has_alpha());
        assert_eq!(gray.format(), ImageFormat::Jpeg);
    }

    #[test]
    fn mask_value_lookup() {
        let mask = Mask::from_gray(GrayImage::from_fn(3, 2, |x, y| Luma([(x + y * 3) as u8])));
        assert_eq!(mask.dimensions(), (3, 2));
        assert_eq!(mask.value(2, 1), 5);
        assert_eq!(mask.as_raw().len(), 6);
    }

    #[test]
    fn media_type_strings() {
        assert_eq!(MediaType::Png.as_str(), "image/png");
        assert_eq!(MediaType::Jpeg.to_string(), "image/jpeg");
    }
}
