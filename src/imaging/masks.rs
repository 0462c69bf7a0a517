//! Mask generators and the combiner.
//!
//! Both generators read the same enhanced image by shared reference and
//! allocate their own buffers, so neither can observe the other's work.

use super::error::{PipelineError, Stage};
use super::filters;
use super::params::MaskTuning;
use super::raster::Mask;
use image::RgbImage;

/// Grayscale → contrast stretch → median → threshold → soften.
pub fn foreground_mask(enhanced: &RgbImage, tuning: &MaskTuning) -> Mask {
    let gray = filters::luminance(enhanced);
    let stretched = filters::linear(gray, tuning.foreground_slope, tuning.foreground_offset);
    let denoised = filters::median_filter(&stretched, tuning.median_radius);
    drop(stretched);
    let binary = filters::threshold(denoised, tuning.threshold);
    Mask::from_gray(filters::gaussian_blur(&binary, tuning.foreground_sigma))
}

/// Grayscale → Laplacian → contrast boost → soften.
pub fn edge_mask(enhanced: &RgbImage, tuning: &MaskTuning) -> Mask {
    let gray = filters::luminance(enhanced);
    let edges = filters::laplacian(&gray, tuning.laplacian_divisor, tuning.laplacian_offset);
    drop(gray);
    let boosted = filters::linear(edges, tuning.edge_slope, tuning.edge_offset);
    Mask::from_gray(filters::gaussian_blur(&boosted, tuning.edge_sigma))
}

/// Overlay-blend the edge mask onto the foreground mask, stretch to the full
/// range, then apply the final soften.
pub fn combine_masks(
    foreground: Mask,
    edges: Mask,
    tuning: &MaskTuning,
) -> Result<Mask, PipelineError> {
    if foreground.dimensions() != edges.dimensions() {
        return Err(PipelineError::processing(
            Stage::Combiner,
            format!(
                "mask sizes differ ({}x{} vs {}x{})",
                foreground.width(),
                foreground.height(),
                edges.width(),
                edges.height()
            ),
        ));
    }
    let blended = filters::overlay(foreground.as_gray(), edges.as_gray());
    drop((foreground, edges));
    let stretched = filters::normalize(blended);
    Ok(Mask::from_gray(filters::gaussian_blur(
        &stretched,
        tuning.combined_sigma,
    )))
}
