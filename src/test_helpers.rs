//! Synthetic images and encoders shared by the unit tests.
//!
//! Every fixture is generated in memory, so tests never depend on files
//! checked into the repo.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

pub const BACKGROUND: Rgb<u8> = Rgb([20, 20, 20]);
pub const SUBJECT: Rgb<u8> = Rgb([230, 220, 210]);

// =========================================================================
// Fixture images
// =========================================================================

/// Smooth horizontal/vertical ramp. Every row and column differs.
pub fn gradient_rgb(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(1)) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        Rgb([r, g, 128])
    })
}

/// A bright filled disc centered on a dark flat background.
pub fn disc_on_background(width: u32, height: u32, radius: u32) -> RgbImage {
    let cx = width as f32 / 2.0;
    let cy = height as f32 / 2.0;
    let r2 = (radius * radius) as f32;
    RgbImage::from_fn(width, height, |x, y| {
        let dx = x as f32 + 0.5 - cx;
        let dy = y as f32 + 0.5 - cy;
        if dx * dx + dy * dy <= r2 {
            SUBJECT
        } else {
            BACKGROUND
        }
    })
}

// =========================================================================
// Encoders
// =========================================================================

pub fn png_bytes(img: &DynamicImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

pub fn jpeg_bytes(img: &RgbImage) -> Vec<u8> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, 90)
        .encode_image(img)
        .unwrap();
    buf
}
