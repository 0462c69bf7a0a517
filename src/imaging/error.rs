//! Error taxonomy for the transform pipeline.
//!
//! Every variant is terminal for the invocation that raised it. Nothing is
//! retried inside the pipeline; callers may retry the whole operation.

use std::fmt;
use thiserror::Error;

/// Named stages of the background-removal chain.
///
/// Carried by [`PipelineError::Processing`] so the surrounding service can
/// report *where* a run failed without exposing internals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Enhancer,
    ForegroundMask,
    EdgeMask,
    Combiner,
    Compositor,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Enhancer => "enhancer",
            Stage::ForegroundMask => "foreground mask",
            Stage::EdgeMask => "edge mask",
            Stage::Combiner => "mask combiner",
            Stage::Compositor => "compositor",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid options: {0}")]
    Validation(String),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Processing failed in {stage}: {reason}")]
    Processing { stage: Stage, reason: String },
    #[error("Encode failed: {0}")]
    Encode(String),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl PipelineError {
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    pub fn processing<S: Into<String>>(stage: Stage, reason: S) -> Self {
        Self::Processing {
            stage,
            reason: reason.into(),
        }
    }

    /// Short machine-friendly label for the failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Validation(_) => "validation",
            PipelineError::Decode(_) => "decode",
            PipelineError::Processing { .. } => "processing",
            PipelineError::Encode(_) => "encode",
            PipelineError::UnsupportedFormat(_) => "unsupported-format",
        }
    }
}
