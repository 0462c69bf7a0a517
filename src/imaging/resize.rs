//! Resizer: applies the fit policy chosen by `maintainAspectRatio`.
//!
//! Dimensions come from [`calculations::resize_dimensions`]; this module only
//! picks the interpolation kernel and moves pixels.

use super::calculations::resize_dimensions;
use super::params::ProcessingOptions;
use super::raster::RasterImage;
use image::imageops::FilterType;

/// Resize `image` for `options`, consuming the input buffer.
///
/// An image that already has the output dimensions is returned untouched.
pub fn resize(image: RasterImage, options: &ProcessingOptions) -> RasterImage {
    let source = image.dimensions();
    let (width, height) = resize_dimensions(source, options);
    if (width, height) == source {
        return image;
    }
    let filter = filter_for(source, (width, height));
    image.map_pixels(|pixels| pixels.resize_exact(width, height, filter))
}

/// Lanczos3 for a pure downscale, Catmull-Rom as soon as either axis grows.
pub(crate) fn filter_for(source: (u32, u32), output: (u32, u32)) -> FilterType {
    if output.0 > source.0 || output.1 > source.1 {
        FilterType::CatmullRom
    } else {
        FilterType::Lanczos3
    }
}
