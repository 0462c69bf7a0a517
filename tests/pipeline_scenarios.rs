//! End-to-end checks of the transform and thumbnail paths through the
//! public API.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage};
use pixshelf::imaging::{
    MediaType, Pipeline, PipelineConfig, PipelineError, ProcessingOptions, THUMBNAIL_SIZE,
    TransformGate,
};
use pixshelf::service::{FileService, ServiceError};
use pixshelf::store::{MemoryStore, ObjectStore};
use serde_json::json;
use std::io::Cursor;
use std::thread;

// =========================================================================
// Fixtures
// =========================================================================

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, 96])
    })
}

fn disc(width: u32, height: u32, radius: u32) -> RgbImage {
    let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
    RgbImage::from_fn(width, height, |x, y| {
        let (dx, dy) = (x as f32 + 0.5 - cx, y as f32 + 0.5 - cy);
        if dx * dx + dy * dy <= (radius * radius) as f32 {
            Rgb([230, 220, 210])
        } else {
            Rgb([20, 20, 20])
        }
    })
}

fn png(img: RgbImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

fn jpeg(img: &RgbImage) -> Vec<u8> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, 85)
        .encode_image(img)
        .unwrap();
    buf
}

fn options(w: u32, h: u32, keep_ratio: bool, remove_bg: bool) -> ProcessingOptions {
    ProcessingOptions::new(w, h, keep_ratio, remove_bg).unwrap()
}

fn load(bytes: &[u8]) -> DynamicImage {
    image::load_from_memory(bytes).unwrap()
}

// =========================================================================
// Scenarios
// =========================================================================

#[test]
fn large_jpeg_resized_into_box_and_opaque() {
    let input = jpeg(&gradient(4000, 3000));
    let out = Pipeline::default()
        .process(&input, "image/jpeg", &options(800, 600, true, false))
        .unwrap();

    assert_eq!(out.media_type, MediaType::Png);
    assert_eq!((out.width, out.height), (800, 600));
    assert_eq!(
        image::guess_format(&out.bytes).unwrap(),
        ImageFormat::Png
    );
    let img = load(&out.bytes);
    assert_eq!(img.dimensions(), (800, 600));
    assert!(img.to_rgba8().pixels().all(|p| p.0[3] == 255));
}

#[test]
fn small_image_is_not_enlarged_and_gets_cutout() {
    let input = png(disc(100, 100, 30));
    let out = Pipeline::default()
        .process(&input, "image/png", &options(800, 600, true, true))
        .unwrap();

    assert_eq!((out.width, out.height), (100, 100));
    let img = load(&out.bytes);
    assert!(img.color().has_alpha());
    let rgba = img.to_rgba8();
    let first = rgba.get_pixel(0, 0).0[3];
    assert!(rgba.pixels().any(|p| p.0[3] != first));
}

#[test]
fn wide_image_thumbnail_is_square_jpeg() {
    let input = png(gradient(1920, 1080));
    let thumb = Pipeline::default().thumbnail(&input, "image/png").unwrap();

    assert_eq!(thumb.media_type, MediaType::Jpeg);
    assert_eq!((thumb.width, thumb.height), (THUMBNAIL_SIZE, THUMBNAIL_SIZE));
    assert_eq!(image::guess_format(&thumb.bytes).unwrap(), ImageFormat::Jpeg);
    assert_eq!(load(&thumb.bytes).dimensions(), (200, 200));
}

#[test]
fn thumbnail_is_center_cropped() {
    // Red left third, green middle, blue right third: only green survives
    // a centered square crop of a 3:1 image.
    let img = RgbImage::from_fn(1800, 600, |x, _| match x / 600 {
        0 => Rgb([255, 0, 0]),
        1 => Rgb([0, 255, 0]),
        _ => Rgb([0, 0, 255]),
    });
    let thumb = Pipeline::default()
        .thumbnail(&png(img), "image/png")
        .unwrap();
    let decoded = load(&thumb.bytes).to_rgb8();
    for (x, y) in [(20, 20), (100, 100), (180, 180)] {
        let [r, g, b] = decoded.get_pixel(x, y).0;
        assert!(g > 200 && r < 60 && b < 60, "pixel ({x},{y}) = {r},{g},{b}");
    }
}

#[test]
fn negative_width_rejected_before_decode() {
    let err = ProcessingOptions::from_json(&json!({
        "width": -5,
        "height": 600,
        "maintainAspectRatio": true,
        "removeBackground": false
    }))
    .unwrap_err();
    assert!(matches!(err, PipelineError::Validation(_)));
}

// =========================================================================
// Properties
// =========================================================================

#[test]
fn option_validation() {
    for bad in [
        json!({"width": 0}),
        json!({"height": "600"}),
        json!({"width": 12.5}),
        json!({"removeBackground": "true"}),
        json!({"maintainAspectRatio": 1}),
        json!([800, 600]),
    ] {
        assert!(
            matches!(
                ProcessingOptions::from_json(&bad),
                Err(PipelineError::Validation(_))
            ),
            "{bad}"
        );
    }
    let ok = ProcessingOptions::from_json(&json!({"width": 320.0, "removeBackground": null}))
        .unwrap();
    assert_eq!(ok.target(), (320, 600));
    assert!(ok.remove_background());
}

#[test]
fn inside_fit_stays_in_box_and_keeps_ratio() {
    for (w, h) in [(1000, 400), (400, 1000), (1203, 797)] {
        let out = Pipeline::default()
            .process(&png(gradient(w, h)), "image/png", &options(300, 200, true, false))
            .unwrap();
        assert!(out.width <= 300 && out.height <= 200, "{w}x{h}");
        let expected = out.width as f64 * h as f64 / w as f64;
        assert!((out.height as f64 - expected).abs() <= 1.0, "{w}x{h}");
    }
}

#[test]
fn fill_fit_is_exact_even_when_enlarging() {
    let out = Pipeline::default()
        .process(&png(gradient(50, 80)), "image/png", &options(120, 90, false, false))
        .unwrap();
    assert_eq!((out.width, out.height), (120, 90));
    assert_eq!(load(&out.bytes).dimensions(), (120, 90));
}

#[test]
fn cutout_respects_alpha_contract() {
    let source = disc(60, 60, 18);
    let out = Pipeline::default()
        .process(&png(source.clone()), "image/png", &options(800, 600, true, true))
        .unwrap();
    let rgba = load(&out.bytes).to_rgba8();

    assert_eq!(rgba.get_pixel(30, 30).0[3], 255);
    assert_eq!(rgba.get_pixel(0, 0).0[3], 0);
    for (x, y, px) in rgba.enumerate_pixels() {
        if px.0[3] > 0 {
            assert_eq!(&px.0[..3], &source.get_pixel(x, y).0, "({x},{y})");
        }
    }
}

#[test]
fn corrupt_bytes_are_a_decode_error() {
    let err = Pipeline::default()
        .process(b"\x89PNG\r\n\x1a\nnope", "image/png", &options(10, 10, true, true))
        .unwrap_err();
    assert!(matches!(err, PipelineError::Decode(_)));
}

#[test]
fn thumbnail_of_non_image_is_unsupported() {
    let err = Pipeline::default()
        .thumbnail(b"%PDF-1.4", "application/pdf")
        .unwrap_err();
    assert!(matches!(err, PipelineError::UnsupportedFormat(_)));
}

#[test]
fn parallel_callers_share_one_gate() {
    let gate = TransformGate::new(1);
    let pipeline = Pipeline::new(PipelineConfig {
        gate: gate.clone(),
        ..PipelineConfig::default()
    });
    let input = png(disc(48, 48, 12));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let pipeline = pipeline.clone();
            let input = input.clone();
            thread::spawn(move || {
                pipeline
                    .process(&input, "image/png", &options(32, 32, true, true))
                    .unwrap()
            })
        })
        .collect();
    let outputs: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(outputs.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(gate.active(), 0);
}

// =========================================================================
// File service
// =========================================================================

#[test]
fn service_replaces_image_with_png_and_previews_it() {
    let svc = FileService::new(MemoryStore::new(), Pipeline::default());
    let receipt = svc
        .upload(
            "albums/2024/beach.jpg",
            "image/jpeg",
            jpeg(&gradient(1920, 1080)),
            &options(800, 600, true, false),
        )
        .unwrap();
    assert_eq!(receipt.key, "albums/2024/beach.png");
    assert_eq!(receipt.media_type, "image/png");

    let stat = svc.stat(&receipt.key).unwrap();
    assert_eq!(stat.size, receipt.size);

    let thumb = svc.thumbnail(&receipt.key).unwrap();
    assert_eq!((thumb.width, thumb.height), (200, 200));

    let listed = svc.list("albums/").unwrap();
    assert_eq!(listed.len(), 1);
}

#[test]
fn service_failure_leaves_store_untouched() {
    let svc = FileService::new(MemoryStore::new(), Pipeline::default());
    let err = svc
        .upload(
            "bad.png",
            "image/png",
            b"not a png".to_vec(),
            &options(800, 600, true, true),
        )
        .unwrap_err();
    assert!(matches!(err, ServiceError::Pipeline(PipelineError::Decode(_))));
    assert!(svc.store().list("").unwrap().is_empty());
}
