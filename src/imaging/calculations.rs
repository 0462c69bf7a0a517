//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::ProcessingOptions;

/// Scale to fit inside the target box, preserving aspect ratio, never enlarging.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `target` - Bounding box (width, height)
///
/// # Returns
/// * `(width, height)` - The original dimensions when they already fit,
///   otherwise the largest aspect-preserving size inside the box.
///
/// # Examples
/// ```
/// # use pixshelf::imaging::calculations::inside_fit_dimensions;
/// // 4000x3000 into 800x600 → exact fit
/// assert_eq!(inside_fit_dimensions((4000, 3000), (800, 600)), (800, 600));
///
/// // Smaller than the box → unchanged
/// assert_eq!(inside_fit_dimensions((100, 100), (800, 600)), (100, 100));
/// ```
pub fn inside_fit_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let scale = (tgt_w as f64 / src_w as f64).min(tgt_h as f64 / src_h as f64);
    if scale >= 1.0 {
        return source;
    }

    let w = ((src_w as f64 * scale).round() as u32).clamp(1, tgt_w);
    let h = ((src_h as f64 * scale).round() as u32).clamp(1, tgt_h);
    (w, h)
}

/// Stretch to exactly the target box, ignoring the source aspect ratio.
pub fn fill_fit_dimensions(_source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    target
}

/// Largest centered window of `source` with the aspect ratio of `target`.
///
/// Cropping this window and then scaling it to `target` gives the same result
/// as scaling to cover and cropping afterwards, but the intermediate buffer
/// is never larger than the source.
///
/// # Returns
/// * `(x, y, width, height)` - Crop rectangle in source coordinates
///
/// # Examples
/// ```
/// # use pixshelf::imaging::calculations::cover_crop_window;
/// // 16:9 into a square → the middle 1080x1080
/// assert_eq!(cover_crop_window((1920, 1080), (200, 200)), (420, 0, 1080, 1080));
/// ```
pub fn cover_crop_window(source: (u32, u32), target: (u32, u32)) -> (u32, u32, u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let (crop_w, crop_h) = if src_w as u64 * tgt_h as u64 > tgt_w as u64 * src_h as u64 {
        // Source is wider: keep the full height, trim the sides
        let w = (src_h as f64 * tgt_w as f64 / tgt_h as f64).round() as u32;
        (w.clamp(1, src_w), src_h)
    } else {
        // Source is taller (or equal): keep the full width, trim top and bottom
        let h = (src_w as f64 * tgt_h as f64 / tgt_w as f64).round() as u32;
        (src_w, h.clamp(1, src_h))
    };
    let (x, y) = center_crop_offset(source, (crop_w, crop_h));
    (x, y, crop_w, crop_h)
}

/// Top-left corner of a centered `window` inside `outer`.
///
/// Odd overflow puts the extra pixel on the right/bottom.
pub fn center_crop_offset(outer: (u32, u32), window: (u32, u32)) -> (u32, u32) {
    (
        outer.0.saturating_sub(window.0) / 2,
        outer.1.saturating_sub(window.1) / 2,
    )
}

/// Output dimensions of the resize stage for the given options.
pub fn resize_dimensions(source: (u32, u32), options: &ProcessingOptions) -> (u32, u32) {
    if options.maintain_aspect_ratio() {
        inside_fit_dimensions(source, options.target())
    } else {
        fill_fit_dimensions(source, options.target())
    }
}
