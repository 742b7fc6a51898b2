use std::time::Duration;

use thiserror::Error;

use crate::domain::phase::PhaseName;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("invalid video spec: {reason}")]
    Validation { reason: String },

    #[error("{phase} phase failed: {reason}")]
    ExternalService { phase: PhaseName, reason: String },

    #[error("{phase} phase timed out after {waited:?}")]
    Timeout { phase: PhaseName, waited: Duration },

    #[error("chunk {index} failed after text-to-video fallback: {reason}")]
    ChunkFailed { index: usize, reason: String },

    #[error("run cancelled")]
    Cancelled,
}

impl PipelineError {
    pub fn validation(reason: impl Into<String>) -> Self {
        PipelineError::Validation {
            reason: reason.into(),
        }
    }

    pub fn external(phase: PhaseName, reason: impl Into<String>) -> Self {
        PipelineError::ExternalService {
            phase,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
