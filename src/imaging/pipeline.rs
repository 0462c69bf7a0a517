//! Orchestration of the transform chain.
//!
//! ```text
//! decode ─► resize ─┬─► drop alpha ───────────────────────────────────────► PNG
//!                   └─► enhance ─┬─► foreground mask ─┬─► combine ─► composite ─► PNG
//!                                └─► edge mask ───────┘
//! ```
//!
//! Each stage consumes or borrows the previous buffer and finishes before the
//! next one starts. The enhanced image lives only as long as the two mask
//! generators need it. Every run, including thumbnails, holds a
//! [`TransformGate`] permit from decode to encode.

use super::composite::{apply_mask, drop_alpha, encode_png};
use super::decode::decode;
use super::enhance::enhance;
use super::error::{PipelineError, Stage};
use super::gate::TransformGate;
use super::masks::{combine_masks, edge_mask, foreground_mask};
use super::params::{MaskTuning, ProcessingOptions, Quality};
use super::raster::{MediaType, ProcessedImage};
use super::resize::resize;
use super::thumbnail::cover_thumbnail;
use crate::config::Settings;
use crate::media::is_image_content_type;
use image::DynamicImage;
use std::time::Instant;
use tracing::{debug, info_span, warn};

/// Everything a [`Pipeline`] needs, constructed once and passed in.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub gate: TransformGate,
    /// No decode or result cache survives between runs.
    pub cache_disabled: bool,
    pub tuning: MaskTuning,
    pub thumbnail_quality: Quality,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            gate: TransformGate::new(1),
            cache_disabled: true,
            tuning: MaskTuning::default(),
            thumbnail_quality: Quality::default(),
        }
    }
}

impl PipelineConfig {
    pub fn new(gate: TransformGate, tuning: MaskTuning, thumbnail_quality: Quality) -> Self {
        Self {
            gate,
            cache_disabled: true,
            tuning,
            thumbnail_quality,
        }
    }

    /// Build from loaded settings with a fresh gate sized by
    /// `processing.max_concurrent_transforms`.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            TransformGate::new(settings.processing.max_concurrent_transforms),
            settings.mask,
            Quality::new(settings.thumbnail.quality),
        )
    }
}

/// The upload transform and the thumbnail generator behind one gate.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Resize and, when requested, cut out the background. Always PNG.
    pub fn process(
        &self,
        bytes: &[u8],
        media_type: &str,
        options: &ProcessingOptions,
    ) -> Result<ProcessedImage, PipelineError> {
        let _permit = self.config.gate.acquire();
        let span = info_span!(
            "transform",
            media_type,
            target_width = options.width(),
            target_height = options.height(),
            maintain_aspect_ratio = options.maintain_aspect_ratio(),
            remove_background = options.remove_background()
        );
        let _enter = span.enter();

        let result = self.run(bytes, media_type, options);
        if let Err(e) = &result {
            warn!(kind = e.kind(), error = %e, "transform failed");
        }
        result
    }

    fn run(
        &self,
        bytes: &[u8],
        media_type: &str,
        options: &ProcessingOptions,
    ) -> Result<ProcessedImage, PipelineError> {
        let tuning = &self.config.tuning;

        let image = timed("decode", || decode(bytes, media_type))?;
        debug!(
            width = image.width(),
            height = image.height(),
            channels = image.channels(),
            format = ?image.format(),
            "decoded"
        );
        let image = timed("resize", || resize(image, options));
        let (width, height) = image.dimensions();

        if !options.remove_background() {
            let opaque = drop_alpha(image);
            let bytes = timed("encode", || encode_png(opaque.as_dynamic()))?;
            return Ok(png_output(bytes, width, height));
        }

        let (foreground, edges) = {
            let enhanced = timed(Stage::Enhancer.name(), || enhance(&image, tuning));
            let foreground = timed(Stage::ForegroundMask.name(), || {
                foreground_mask(&enhanced, tuning)
            });
            let edges = timed(Stage::EdgeMask.name(), || edge_mask(&enhanced, tuning));
            (foreground, edges)
        };
        let mask = timed(Stage::Combiner.name(), || {
            combine_masks(foreground, edges, tuning)
        })?;
        let cutout = timed(Stage::Compositor.name(), || apply_mask(image, &mask))?;
        drop(mask);

        let bytes = timed("encode", || {
            encode_png(&DynamicImage::ImageRgba8(cutout))
        })?;
        Ok(png_output(bytes, width, height))
    }

    /// 200×200 cover-crop JPEG of an already-stored image.
    ///
    /// Rejects non-image media types before touching the bytes.
    pub fn thumbnail(&self, bytes: &[u8], media_type: &str) -> Result<ProcessedImage, PipelineError> {
        if !is_image_content_type(media_type) {
            return Err(PipelineError::UnsupportedFormat(format!(
                "cannot thumbnail {media_type}"
            )));
        }

        let _permit = self.config.gate.acquire();
        let span = info_span!("thumbnail", media_type);
        let _enter = span.enter();

        let result = timed("decode", || decode(bytes, media_type)).and_then(|image| {
            timed("thumbnail", || {
                cover_thumbnail(image, self.config.thumbnail_quality)
            })
        });
        if let Err(e) = &result {
            warn!(kind = e.kind(), error = %e, "thumbnail failed");
        }
        result
    }
}

fn png_output(bytes: Vec<u8>, width: u32, height: u32) -> ProcessedImage {
    ProcessedImage {
        bytes,
        media_type: MediaType::Png,
        width,
        height,
    }
}

fn timed<T>(stage: &str, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let out = f();
    debug!(stage, elapsed_ms = start.elapsed().as_secs_f64() * 1000.0, "stage finished");
    out
}
