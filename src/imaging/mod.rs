//! Image transform pipeline, pure Rust.
//!
//! | Stage | Crate / function |
//! |---|---|
//! | **Decode** (JPEG, PNG, TIFF, WebP, GIF, BMP) | `image::ImageReader` with limits lifted |
//! | **Resize** | `resize_exact`, Lanczos3 down / Catmull-Rom up |
//! | **Enhance** | per-pixel luma-anchored saturation + brightness |
//! | **Masks** | custom filters: median, Laplacian, Gaussian, overlay |
//! | **Composite → PNG** | destination-in alpha, `PngEncoder` (best, adaptive) |
//! | **Thumbnail → JPEG** | cover crop + `jpeg-encoder` (progressive) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Options and tuning constants describing a run
//! - **Stages**: One module per pixel stage, each a function from buffer to buffer
//! - **Pipeline**: [`Pipeline`] chaining the stages behind a [`TransformGate`]

pub mod calculations;
pub mod composite;
pub mod decode;
pub mod enhance;
mod error;
pub mod filters;
mod gate;
pub mod masks;
mod params;
mod pipeline;
mod raster;
pub mod resize;
pub mod thumbnail;

pub use error::{PipelineError, Stage};
pub use gate::{GatePermit, TransformGate};
pub use params::{
    DEFAULT_TARGET_HEIGHT, DEFAULT_TARGET_WIDTH, MAX_BLUR_SIGMA, MAX_MEDIAN_RADIUS,
    MAX_TARGET_DIMENSION, MaskTuning, ProcessingOptions, Quality,
};
pub use pipeline::{Pipeline, PipelineConfig};
pub use raster::{Mask, MediaType, ProcessedImage, RasterImage};
pub use thumbnail::THUMBNAIL_SIZE;
