//! Crate-level error aggregating every stage of the pipeline.

use thiserror::Error;

use crate::config::ConfigError;
use crate::decode::{DecodeError, UploadError};
use crate::encode::EncodeError;
use crate::raster::CanvasError;
use crate::removal::RemovalError;
use crate::workflow::Step;

/// Any failure surfaced by a pipeline session.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The upload was rejected before decoding.
    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Canvas(#[from] CanvasError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Removal(#[from] RemovalError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An upload arrived while the workflow was past the upload step.
    #[error("Uploads are only accepted in the upload step (current step: {0})")]
    UploadOutOfStep(Step),
}

impl PipelineError {
    /// Whether the user can simply try again (or skip) to recover.
    pub fn is_recoverable(&self) -> bool {
        match self {
            PipelineError::Upload(_) => true,
            PipelineError::Removal(e) => e.is_retryable(),
            _ => false,
        }
    }
}
