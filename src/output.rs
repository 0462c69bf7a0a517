//! CLI output formatting.
//!
//! Each processed file is shown as a header line with its position, the
//! input name and where the result went, followed by indented detail lines:
//!
//! ```text
//! 001 holiday.jpg → holiday.png
//!     800x600, 312 KB, background removed
//!     Thumbnail: holiday-thumb.jpg
//! 002 notes.txt
//!     Skipped: not a transformable image (text/plain)
//! 003 broken.png
//!     Failed: decode error: ...
//!
//! Processed 1 file, skipped 1, failed 1
//! ```
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure.

use crate::imaging::ProcessedImage;
use std::path::{Path, PathBuf};

/// What happened to one input of the `process` command.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Processed {
        input: PathBuf,
        output: PathBuf,
        width: u32,
        height: u32,
        bytes: u64,
        background_removed: bool,
        thumbnail: Option<PathBuf>,
    },
    Skipped {
        input: PathBuf,
        reason: String,
    },
    Failed {
        input: PathBuf,
        error: String,
    },
}

impl FileOutcome {
    pub fn input(&self) -> &Path {
        match self {
            FileOutcome::Processed { input, .. }
            | FileOutcome::Skipped { input, .. }
            | FileOutcome::Failed { input, .. } => input,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, FileOutcome::Failed { .. })
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Human-readable byte size: `512 B`, `48 KB`, `1.4 MB`.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{} KB", bytes.div_ceil(KB))
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{} {}", n, word)
    } else {
        format!("{} {}s", n, word)
    }
}

// ============================================================================
// process
// ============================================================================

/// Format one file outcome as display lines.
pub fn format_file_outcome(index: usize, outcome: &FileOutcome) -> Vec<String> {
    let mut lines = Vec::new();
    match outcome {
        FileOutcome::Processed {
            input,
            output,
            width,
            height,
            bytes,
            background_removed,
            thumbnail,
        } => {
            lines.push(format!(
                "{} {} \u{2192} {}",
                format_index(index),
                file_name(input),
                file_name(output)
            ));
            let mut detail = format!("    {}x{}, {}", width, height, format_size(*bytes));
            if *background_removed {
                detail.push_str(", background removed");
            }
            lines.push(detail);
            if let Some(thumb) = thumbnail {
                lines.push(format!("    Thumbnail: {}", file_name(thumb)));
            }
        }
        FileOutcome::Skipped { input, reason } => {
            lines.push(format!("{} {}", format_index(index), file_name(input)));
            lines.push(format!("    Skipped: {}", reason));
        }
        FileOutcome::Failed { input, error } => {
            lines.push(format!("{} {}", format_index(index), file_name(input)));
            lines.push(format!("    Failed: {}", error));
        }
    }
    lines
}

/// Format the full `process` report: every outcome, then a summary line.
pub fn format_process_output(outcomes: &[FileOutcome]) -> Vec<String> {
    let mut lines: Vec<String> = outcomes
        .iter()
        .enumerate()
        .flat_map(|(i, outcome)| format_file_outcome(i + 1, outcome))
        .collect();

    let processed = outcomes
        .iter()
        .filter(|o| matches!(o, FileOutcome::Processed { .. }))
        .count();
    let skipped = outcomes
        .iter()
        .filter(|o| matches!(o, FileOutcome::Skipped { .. }))
        .count();
    let failed = outcomes.iter().filter(|o| o.is_failure()).count();

    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!(
        "Processed {}, skipped {}, failed {}",
        plural(processed, "file"),
        skipped,
        failed
    ));
    lines
}

pub fn print_process_output(outcomes: &[FileOutcome]) {
    for line in format_process_output(outcomes) {
        println!("{}", line);
    }
}

// ============================================================================
// thumbnail
// ============================================================================

pub fn format_thumbnail_output(input: &Path, output: &Path, thumb: &ProcessedImage) -> Vec<String> {
    vec![
        format!("{} \u{2192} {}", file_name(input), output.display()),
        format!(
            "    {}x{} {}, {}",
            thumb.width,
            thumb.height,
            thumb.media_type,
            format_size(thumb.bytes.len() as u64)
        ),
    ]
}

pub fn print_thumbnail_output(input: &Path, output: &Path, thumb: &ProcessedImage) {
    for line in format_thumbnail_output(input, output, thumb) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
