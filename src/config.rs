//! Settings module.
//!
//! Handles loading, validating, and merging `pixshelf.toml`. Stock defaults
//! are the base layer; a user file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [options]                    # Defaults for uploads that omit a field
//! width = 800
//! height = 600
//! maintain_aspect_ratio = true # false = stretch to exactly width x height
//! remove_background = true
//!
//! [mask]                       # Cutout heuristics
//! brightness = 1.1
//! saturation = 1.2
//! foreground_slope = 1.5
//! foreground_offset = 0.25     # Fraction of 255
//! median_radius = 3
//! threshold = 45
//! foreground_sigma = 0.5
//! laplacian_divisor = 2.0
//! laplacian_offset = 128.0
//! edge_slope = 1.5
//! edge_offset = 0.15
//! edge_sigma = 0.3
//! combined_sigma = 0.8
//!
//! [thumbnail]
//! quality = 80                 # JPEG quality (1-100)
//!
//! [processing]
//! max_concurrent_transforms = 1
//! max_processes = 4            # CLI batch workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{
    DEFAULT_TARGET_HEIGHT, DEFAULT_TARGET_WIDTH, MaskTuning, PipelineError, ProcessingOptions,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File looked up in the working directory when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = "pixshelf.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Settings loaded from `pixshelf.toml`.
///
/// All fields have sensible defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Default transform options.
    pub options: OptionsConfig,
    /// Cutout heuristic constants.
    pub mask: MaskTuning,
    /// Thumbnail encoding.
    pub thumbnail: ThumbnailConfig,
    /// Concurrency limits.
    pub processing: ProcessingConfig,
}

impl Settings {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.options.to_options().map_err(|e| match e {
            PipelineError::Validation(msg) => ConfigError::Validation(format!("options.{msg}")),
            other => ConfigError::Validation(other.to_string()),
        })?;
        self.mask.validate().map_err(ConfigError::Validation)?;
        if !(1..=100).contains(&self.thumbnail.quality) {
            return Err(ConfigError::Validation(
                "thumbnail.quality must be 1-100".into(),
            ));
        }
        if self.processing.max_concurrent_transforms == 0 {
            return Err(ConfigError::Validation(
                "processing.max_concurrent_transforms must be at least 1".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Defaults applied to uploads that leave an option out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptionsConfig {
    pub width: u32,
    pub height: u32,
    pub maintain_aspect_ratio: bool,
    pub remove_background: bool,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_TARGET_WIDTH,
            height: DEFAULT_TARGET_HEIGHT,
            maintain_aspect_ratio: true,
            remove_background: true,
        }
    }
}

impl OptionsConfig {
    pub fn to_options(&self) -> Result<ProcessingOptions, PipelineError> {
        ProcessingOptions::new(
            self.width,
            self.height,
            self.maintain_aspect_ratio,
            self.remove_background,
        )
    }
}

/// Thumbnail encoding settings. The 200×200 size is fixed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailConfig {
    /// JPEG quality (1 = worst, 100 = best).
    pub quality: u32,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self { quality: 80 }
    }
}

/// Concurrency settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Transforms allowed to hold pixel buffers at the same time.
    pub max_concurrent_transforms: usize,
    /// Maximum number of parallel CLI workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_concurrent_transforms: 1,
            max_processes: None,
        }
    }
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default settings as a `toml::Value::Table`.
///
/// This is the base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(Settings::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a settings file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<Settings, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let settings: Settings = merged.try_into()?;
    settings.validate()?;
    Ok(settings)
}

/// Load settings.
///
/// An explicit `path` must exist. Without one, [`CONFIG_FILE_NAME`] in the
/// working directory is used when present, stock defaults otherwise.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let overlay = match path {
        Some(p) => Some(toml::from_str(&fs::read_to_string(p)?)?),
        None => load_raw_config(Path::new(CONFIG_FILE_NAME))?,
    };
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock `pixshelf.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# pixshelf Configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Default transform options (used when an upload omits a field)
# ---------------------------------------------------------------------------
[options]
# Target bounding box in pixels (1-16383 on each side).
width = 800
height = 600

# true  = shrink to fit inside the box, never enlarge.
# false = stretch to exactly width x height.
maintain_aspect_ratio = true

# Cut out the background and write a transparent PNG.
remove_background = true

# ---------------------------------------------------------------------------
# Cutout heuristics
# ---------------------------------------------------------------------------
[mask]
# Enhancer: multiplicative brightness and saturation.
brightness = 1.1
saturation = 1.2

# Foreground mask: v * slope - offset * 255, median, threshold, blur.
foreground_slope = 1.5
foreground_offset = 0.25
median_radius = 3
threshold = 45
foreground_sigma = 0.5

# Edge mask: Laplacian / divisor + offset, then contrast boost and blur.
laplacian_divisor = 2.0
laplacian_offset = 128.0
edge_slope = 1.5
edge_offset = 0.15
edge_sigma = 0.3

# Final soften after the overlay blend and normalize.
combined_sigma = 0.8

# ---------------------------------------------------------------------------
# Thumbnails (always 200x200 JPEG)
# ---------------------------------------------------------------------------
[thumbnail]
# JPEG quality (1 = worst, 100 = best).
quality = 80

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Transforms allowed in memory at once. Each one holds several full-size
# buffers, so raise this only with memory to spare.
max_concurrent_transforms = 1

# Maximum parallel workers for CLI batches.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
