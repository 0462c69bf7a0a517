//! Single-channel pixel filters used by the mask generators.
//!
//! Every function works on 8-bit `GrayImage`s and is infallible: buffers are
//! allocated with the input's dimensions up front, so there is nothing left
//! to go wrong once a valid image exists. Neighborhood filters replicate the
//! border pixels.

use super::params::MAX_BLUR_SIGMA;
use image::{GrayImage, Luma, RgbImage, imageops};

const MAX: f32 = 255.0;

/// Standard luminance grayscale.
pub fn luminance(image: &RgbImage) -> GrayImage {
    imageops::grayscale(image)
}

/// `clamp(v × slope − offset × 255, 0, 255)` for every pixel, in place.
///
/// `offset` is a fraction of the 8-bit maximum.
pub fn linear(mut image: GrayImage, slope: f32, offset: f32) -> GrayImage {
    let shift = offset * MAX;
    for v in image.iter_mut() {
        *v = to_u8(*v as f32 * slope - shift);
    }
    image
}

/// Hard threshold: `v ≥ level` → 255, otherwise 0.
pub fn threshold(mut image: GrayImage, level: u8) -> GrayImage {
    for v in image.iter_mut() {
        *v = if *v >= level { 255 } else { 0 };
    }
    image
}

/// Median over a `(2r+1)²` square window.
///
/// Uses a per-row sliding histogram, so cost per pixel grows with `r`
/// rather than `r²`.
pub fn median_filter(image: &GrayImage, radius: u32) -> GrayImage {
    if radius == 0 {
        return image.clone();
    }
    let (w, h) = image.dimensions();
    let r = radius as i64;
    let side = 2 * radius as usize + 1;
    let rank = side * side / 2;
    let sample = |x: i64, y: i64| image.get_pixel(clamp_coord(x, w), clamp_coord(y, h)).0[0];

    let mut out = GrayImage::new(w, h);
    for y in 0..h as i64 {
        let mut hist = [0u32; 256];
        for dy in -r..=r {
            for dx in -r..=r {
                hist[sample(dx, y + dy) as usize] += 1;
            }
        }
        out.put_pixel(0, y as u32, Luma([histogram_rank(&hist, rank)]));

        for x in 1..w as i64 {
            for dy in -r..=r {
                hist[sample(x - r - 1, y + dy) as usize] -= 1;
                hist[sample(x + r, y + dy) as usize] += 1;
            }
            out.put_pixel(x as u32, y as u32, Luma([histogram_rank(&hist, rank)]));
        }
    }
    out
}

fn histogram_rank(hist: &[u32; 256], rank: usize) -> u8 {
    let mut seen = 0usize;
    for (value, &count) in hist.iter().enumerate() {
        seen += count as usize;
        if seen > rank {
            return value as u8;
        }
    }
    u8::MAX
}

/// Normalized 1D Gaussian kernel with a `ceil(3σ)` radius (at least 1).
///
/// A non-positive sigma yields the identity kernel. Sigma is capped at
/// [`MAX_BLUR_SIGMA`].
pub fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    if sigma <= 0.0 {
        return vec![1.0];
    }
    let sigma = sigma.min(MAX_BLUR_SIGMA);
    let half = ((sigma * 3.0).ceil() as usize).max(1);
    let mut kernel: Vec<f32> = (0..=2 * half)
        .map(|i| {
            let x = i as f32 - half as f32;
            (-x * x / (2.0 * sigma * sigma)).exp()
        })
        .collect();

    let sum: f32 = kernel.iter().sum();
    for v in kernel.iter_mut() {
        *v /= sum;
    }
    kernel
}

/// Separable Gaussian blur.
pub fn gaussian_blur(image: &GrayImage, sigma: f32) -> GrayImage {
    let kernel = gaussian_kernel(sigma);
    if kernel.len() == 1 {
        return image.clone();
    }
    let (w, h) = image.dimensions();
    let (wu, hu) = (w as usize, h as usize);
    let half = (kernel.len() / 2) as isize;
    let src = image.as_raw();

    // Horizontal pass
    let mut tmp = vec![0f32; wu * hu];
    for y in 0..hu {
        let row = &src[y * wu..(y + 1) * wu];
        for x in 0..wu {
            tmp[y * wu + x] = kernel
                .iter()
                .enumerate()
                .map(|(k, weight)| {
                    let sx = (x as isize + k as isize - half).clamp(0, wu as isize - 1) as usize;
                    weight * row[sx] as f32
                })
                .sum();
        }
    }

    // Vertical pass
    let mut out = GrayImage::new(w, h);
    let dst: &mut [u8] = &mut out;
    for y in 0..hu {
        for x in 0..wu {
            let acc: f32 = kernel
                .iter()
                .enumerate()
                .map(|(k, weight)| {
                    let sy = (y as isize + k as isize - half).clamp(0, hu as isize - 1) as usize;
                    weight * tmp[sy * wu + x]
                })
                .sum();
            dst[y * wu + x] = to_u8(acc);
        }
    }
    out
}

/// 3×3 Laplacian `[0,-1,0; -1,4,-1; 0,-1,0]`, encoded as
/// `response / divisor + offset` so flat regions land on `offset`.
pub fn laplacian(image: &GrayImage, divisor: f32, offset: f32) -> GrayImage {
    let (w, h) = image.dimensions();
    let at = |x: i64, y: i64| image.get_pixel(clamp_coord(x, w), clamp_coord(y, h)).0[0] as i32;

    GrayImage::from_fn(w, h, |x, y| {
        let (x, y) = (x as i64, y as i64);
        let response =
            4 * at(x, y) - at(x, y - 1) - at(x, y + 1) - at(x - 1, y) - at(x + 1, y);
        Luma([to_u8(response as f32 / divisor + offset)])
    })
}

/// Overlay blend of `top` onto `base`. Both images must share dimensions.
pub fn overlay(base: &GrayImage, top: &GrayImage) -> GrayImage {
    let mut out = base.clone();
    for (b, &o) in out.iter_mut().zip(top.as_raw()) {
        *b = overlay_value(*b, o);
    }
    out
}

fn overlay_value(base: u8, top: u8) -> u8 {
    let (b, o) = (base as u32, top as u32);
    let v = if 2 * b <= 255 {
        (2 * b * o + 127) / 255
    } else {
        255 - (2 * (255 - b) * (255 - o) + 127) / 255
    };
    v as u8
}

/// Stretch the value range so the minimum maps to 0 and the maximum to 255.
///
/// A constant image is returned unchanged.
pub fn normalize(mut image: GrayImage) -> GrayImage {
    let (min, max) = image
        .iter()
        .fold((u8::MAX, u8::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if min >= max {
        return image;
    }
    let span = (max - min) as f32;
    for v in image.iter_mut() {
        *v = to_u8((*v - min) as f32 * MAX / span);
    }
    image
}

fn clamp_coord(v: i64, len: u32) -> u32 {
    v.clamp(0, len as i64 - 1) as u32
}

fn to_u8(v: f32) -> u8 {
    v.round().clamp(0.0, MAX) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(w: u32, h: u32, v: u8) -> GrayImage {
        GrayImage::from_pixel(w, h, Luma([v]))
    }

    // =========================================================================
    // Point operations
    // =========================================================================

    #[test]
    fn linear_stretches_and_clamps() {
        let img = GrayImage::from_raw(4, 1, vec![0, 42, 100, 250]).unwrap();
        let out = linear(img, 1.5, 0.25);
        // 100 × 1.5 − 63.75 = 86.25
        assert_eq!(out.as_raw(), &vec![0, 0, 86, 255]);
    }

    #[test]
    fn threshold_is_inclusive() {
        let img = GrayImage::from_raw(3, 1, vec![44, 45, 200]).unwrap();
        assert_eq!(threshold(img, 45).as_raw(), &vec![0, 255, 255]);
    }

    #[test]
    fn luminance_of_white_and_black() {
        let rgb = RgbImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                image::Rgb([255, 255, 255])
            } else {
                image::Rgb([0, 0, 0])
            }
        });
        assert_eq!(luminance(&rgb).as_raw(), &vec![255, 0]);
    }

    // =========================================================================
    // Median
    // =========================================================================

    #[test]
    fn median_removes_isolated_speckle() {
        let mut img = flat(15, 15, 20);
        img.put_pixel(7, 7, Luma([255]));
        img.put_pixel(2, 11, Luma([255]));
        let out = median_filter(&img, 3);
        assert!(out.iter().all(|&v| v == 20));
    }

    #[test]
    fn median_keeps_large_regions() {
        // Left half dark, right half bright: the step survives
        let img = GrayImage::from_fn(20, 10, |x, _| Luma([if x < 10 { 0 } else { 200 }]));
        let out = median_filter(&img, 3);
        assert_eq!(out.get_pixel(2, 5).0[0], 0);
        assert_eq!(out.get_pixel(17, 5).0[0], 200);
    }

    #[test]
    fn median_radius_zero_is_identity() {
        let img = GrayImage::from_fn(5, 5, |x, y| Luma([(x * 7 + y) as u8]));
        assert_eq!(median_filter(&img, 0), img);
    }

    #[test]
    fn median_handles_images_smaller_than_window() {
        let img = GrayImage::from_raw(2, 1, vec![10, 30]).unwrap();
        let out = median_filter(&img, 3);
        assert_eq!(out.dimensions(), (2, 1));
    }

    // =========================================================================
    // Gaussian
    // =========================================================================

    #[test]
    fn gaussian_kernel_is_normalized_and_symmetric() {
        for sigma in [0.3, 0.5, 0.8, 2.0] {
            let k = gaussian_kernel(sigma);
            assert_eq!(k.len() % 2, 1);
            assert!((k.iter().sum::<f32>() - 1.0).abs() < 1e-5);
            assert_eq!(k.first(), k.last());
        }
        assert_eq!(gaussian_kernel(0.0), vec![1.0]);
    }

    #[test]
    fn gaussian_kernel_caps_huge_sigma() {
        let capped = gaussian_kernel(MAX_BLUR_SIGMA);
        assert_eq!(capped.len(), 97);
        assert_eq!(gaussian_kernel(1e30), capped);
    }

    #[test]
    fn blur_preserves_flat_images() {
        let img = flat(9, 7, 137);
        assert_eq!(gaussian_blur(&img, 0.8), img);
    }

    #[test]
    fn blur_softens_a_hard_step() {
        let img = GrayImage::from_fn(10, 3, |x, _| Luma([if x < 5 { 0 } else { 255 }]));
        let out = gaussian_blur(&img, 0.8);
        let left = out.get_pixel(4, 1).0[0];
        let right = out.get_pixel(5, 1).0[0];
        assert!(left > 0 && left < 128, "left of step: {left}");
        assert!(right > 128 && right < 255, "right of step: {right}");
        assert_eq!(out.get_pixel(0, 1).0[0], 0);
        assert_eq!(out.get_pixel(9, 1).0[0], 255);
    }

    // =========================================================================
    // Laplacian
    // =========================================================================

    #[test]
    fn laplacian_flat_maps_to_offset() {
        let out = laplacian(&flat(6, 6, 90), 2.0, 128.0);
        assert!(out.iter().all(|&v| v == 128));
    }

    #[test]
    fn laplacian_edge_swings_both_ways() {
        let img = GrayImage::from_fn(8, 3, |x, _| Luma([if x < 4 { 0 } else { 100 }]));
        let out = laplacian(&img, 2.0, 128.0);
        // Dark side of the step: (0 − 100) / 2 + 128 = 78
        assert_eq!(out.get_pixel(3, 1).0[0], 78);
        // Bright side: (400 − 300) / 2 + 128 = 178
        assert_eq!(out.get_pixel(4, 1).0[0], 178);
    }

    // =========================================================================
    // Overlay and normalize
    // =========================================================================

    #[test]
    fn overlay_formula() {
        assert_eq!(overlay_value(0, 200), 0);
        assert_eq!(overlay_value(255, 10), 255);
        assert_eq!(overlay_value(64, 200), 100);
        assert_eq!(overlay_value(128, 128), 128);
    }

    #[test]
    fn overlay_applies_per_pixel() {
        let base = GrayImage::from_raw(2, 1, vec![0, 255]).unwrap();
        let top = GrayImage::from_raw(2, 1, vec![128, 128]).unwrap();
        assert_eq!(overlay(&base, &top).as_raw(), &vec![0, 255]);
    }

    #[test]
    fn normalize_stretches_to_full_range() {
        let img = GrayImage::from_raw(3, 1, vec![50, 75, 100]).unwrap();
        assert_eq!(normalize(img).as_raw(), &vec![0, 128, 255]);
    }

    #[test]
    fn normalize_leaves_constant_images() {
        let img = flat(3, 3, 42);
        assert_eq!(normalize(img.clone()), img);
    }
}
