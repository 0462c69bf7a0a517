//! Parameter types for the transform pipeline.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between callers (the upload service, the CLI) and the pixel
//! stages.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100). Clamped on construction.
//! - [`ProcessingOptions`]: Target box, fit policy, and background removal toggle.
//!   Validated on construction and immutable afterwards.
//! - [`MaskTuning`]: The heuristic constants of the cutout chain.

use super::error::PipelineError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

pub const DEFAULT_TARGET_WIDTH: u32 = 800;
pub const DEFAULT_TARGET_HEIGHT: u32 = 600;
/// Largest accepted target width or height. A fill-fit output is allocated
/// at the full target size, so the box must stay bounded.
pub const MAX_TARGET_DIMENSION: u32 = 16383;

/// Per-upload transform options.
///
/// Fields are private: the only ways in are [`ProcessingOptions::new`] and
/// [`ProcessingOptions::from_json`], both of which reject zero dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingOptions {
    width: u32,
    height: u32,
    maintain_aspect_ratio: bool,
    remove_background: bool,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            width: DEFAULT_TARGET_WIDTH,
            height: DEFAULT_TARGET_HEIGHT,
            maintain_aspect_ratio: true,
            remove_background: true,
        }
    }
}

impl ProcessingOptions {
    pub fn new(
        width: u32,
        height: u32,
        maintain_aspect_ratio: bool,
        remove_background: bool,
    ) -> Result<Self, PipelineError> {
        if width == 0 {
            return Err(PipelineError::validation("width must be a positive integer"));
        }
        if height == 0 {
            return Err(PipelineError::validation(
                "height must be a positive integer",
            ));
        }
        if width > MAX_TARGET_DIMENSION || height > MAX_TARGET_DIMENSION {
            return Err(PipelineError::validation(format!(
                "width and height must be at most {MAX_TARGET_DIMENSION}, got {width}x{height}"
            )));
        }
        Ok(Self {
            width,
            height,
            maintain_aspect_ratio,
            remove_background,
        })
    }

    /// Parse options from a loosely-typed JSON object, filling gaps from the
    /// stock defaults.
    ///
    /// Accepted keys: `width`, `height` (positive integers), `maintainAspectRatio`,
    /// `removeBackground` (JSON booleans). Missing keys and `null` take the
    /// default. Unknown keys, strings, negative or fractional numbers are rejected.
    pub fn from_json(value: &Value) -> Result<Self, PipelineError> {
        Self::from_json_with_defaults(value, Self::default())
    }

    /// Same as [`from_json`](Self::from_json) with caller-provided defaults.
    pub fn from_json_with_defaults(value: &Value, defaults: Self) -> Result<Self, PipelineError> {
        let map = value
            .as_object()
            .ok_or_else(|| PipelineError::validation("options must be a JSON object"))?;

        if let Some(unknown) = map.keys().find(|k| !OPTION_KEYS.contains(&k.as_str())) {
            return Err(PipelineError::validation(format!(
                "unknown option `{unknown}`"
            )));
        }

        Self::new(
            dimension_field(map, "width", defaults.width)?,
            dimension_field(map, "height", defaults.height)?,
            bool_field(map, "maintainAspectRatio", defaults.maintain_aspect_ratio)?,
            bool_field(map, "removeBackground", defaults.remove_background)?,
        )
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn target(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn maintain_aspect_ratio(&self) -> bool {
        self.maintain_aspect_ratio
    }

    pub fn remove_background(&self) -> bool {
        self.remove_background
    }
}

const OPTION_KEYS: &[&str] = &["width", "height", "maintainAspectRatio", "removeBackground"];

fn dimension_field(map: &Map<String, Value>, key: &str, default: u32) -> Result<u32, PipelineError> {
    let value = match map.get(key) {
        None | Some(Value::Null) => return Ok(default),
        Some(v) => v,
    };
    let parsed = match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 1.0)
                .map(|f| f as u64)
        }),
        _ => None,
    };
    match parsed {
        Some(v) if v >= 1 && v <= u64::from(u32::MAX) => Ok(v as u32),
        _ => Err(PipelineError::validation(format!(
            "{key} must be a positive integer, got {value}"
        ))),
    }
}

fn bool_field(map: &Map<String, Value>, key: &str, default: bool) -> Result<bool, PipelineError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Bool(b)) => Ok(*b),
        Some(other) => Err(PipelineError::validation(format!(
            "{key} must be a boolean, got {other}"
        ))),
    }
}

// =============================================================================
// Cutout heuristics
// =============================================================================

pub const DEFAULT_BRIGHTNESS: f32 = 1.1;
pub const DEFAULT_SATURATION: f32 = 1.2;
pub const DEFAULT_FOREGROUND_SLOPE: f32 = 1.5;
pub const DEFAULT_FOREGROUND_OFFSET: f32 = 0.25;
pub const DEFAULT_MEDIAN_RADIUS: u32 = 3;
pub const DEFAULT_THRESHOLD: u8 = 45;
pub const DEFAULT_FOREGROUND_SIGMA: f32 = 0.5;
pub const DEFAULT_LAPLACIAN_DIVISOR: f32 = 2.0;
pub const DEFAULT_LAPLACIAN_OFFSET: f32 = 128.0;
pub const DEFAULT_EDGE_SLOPE: f32 = 1.5;
pub const DEFAULT_EDGE_OFFSET: f32 = 0.15;
pub const DEFAULT_EDGE_SIGMA: f32 = 0.3;
pub const DEFAULT_COMBINED_SIGMA: f32 = 0.8;

/// Tuned constants for the enhancer and mask generators.
///
/// Offsets are fractions of the 8-bit maximum (`0.25` → `63.75`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MaskTuning {
    pub brightness: f32,
    pub saturation: f32,
    pub foreground_slope: f32,
    pub foreground_offset: f32,
    pub median_radius: u32,
    pub threshold: u8,
    pub foreground_sigma: f32,
    /// Laplacian response is divided by this before the offset is added.
    pub laplacian_divisor: f32,
    pub laplacian_offset: f32,
    pub edge_slope: f32,
    pub edge_offset: f32,
    pub edge_sigma: f32,
    pub combined_sigma: f32,
}

impl Default for MaskTuning {
    fn default() -> Self {
        Self {
            brightness: DEFAULT_BRIGHTNESS,
            saturation: DEFAULT_SATURATION,
            foreground_slope: DEFAULT_FOREGROUND_SLOPE,
            foreground_offset: DEFAULT_FOREGROUND_OFFSET,
            median_radius: DEFAULT_MEDIAN_RADIUS,
            threshold: DEFAULT_THRESHOLD,
            foreground_sigma: DEFAULT_FOREGROUND_SIGMA,
            laplacian_divisor: DEFAULT_LAPLACIAN_DIVISOR,
            laplacian_offset: DEFAULT_LAPLACIAN_OFFSET,
            edge_slope: DEFAULT_EDGE_SLOPE,
            edge_offset: DEFAULT_EDGE_OFFSET,
            edge_sigma: DEFAULT_EDGE_SIGMA,
            combined_sigma: DEFAULT_COMBINED_SIGMA,
        }
    }
}

/// Largest median radius accepted from configuration (a 33×33 window).
pub const MAX_MEDIAN_RADIUS: u32 = 16;

/// Largest blur sigma accepted from configuration (a 97-tap kernel).
pub const MAX_BLUR_SIGMA: f32 = 16.0;

impl MaskTuning {
    /// Check that every constant is finite and inside a usable range.
    pub fn validate(&self) -> Result<(), String> {
        let positive = [
            ("brightness", self.brightness),
            ("foreground_slope", self.foreground_slope),
            ("laplacian_divisor", self.laplacian_divisor),
            ("edge_slope", self.edge_slope),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("mask.{name} must be a positive number"));
            }
        }
        let non_negative = [
            ("saturation", self.saturation),
            ("foreground_sigma", self.foreground_sigma),
            ("edge_sigma", self.edge_sigma),
            ("combined_sigma", self.combined_sigma),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("mask.{name} must be zero or positive"));
            }
        }
        for (name, value) in [
            ("foreground_sigma", self.foreground_sigma),
            ("edge_sigma", self.edge_sigma),
            ("combined_sigma", self.combined_sigma),
        ] {
            if value > MAX_BLUR_SIGMA {
                return Err(format!("mask.{name} must be at most {MAX_BLUR_SIGMA}"));
            }
        }
        for (name, value) in [
            ("foreground_offset", self.foreground_offset),
            ("edge_offset", self.edge_offset),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("mask.{name} must be between 0 and 1"));
            }
        }
        if !(0.0..=255.0).contains(&self.laplacian_offset) {
            return Err("mask.laplacian_offset must be between 0 and 255".into());
        }
        if self.median_radius > MAX_MEDIAN_RADIUS {
            return Err(format!(
                "mask.median_radius must be at most {MAX_MEDIAN_RADIUS}"
            ));
        }
        Ok(())
    }
}
