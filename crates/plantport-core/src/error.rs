use thiserror::Error;

use crate::DType;

/// Failures of the classification pipeline. None of them are retried;
/// the current request is abandoned and the error is handed to the caller.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("image is {actual_width}x{actual_height}, model expects {expected}x{expected}")]
    ShapeMismatch {
        expected: usize,
        actual_width: u32,
        actual_height: u32,
    },
    #[error("unsupported model input dtype: {0} (expected u8 or f32)")]
    UnsupportedDtype(DType),
    #[error("unsupported model input shape {0} (expected [1,S,S,3] or [1,3,S,S])")]
    UnsupportedInputLayout(String),
    #[error("label set is empty")]
    EmptyLabelSet,
    #[error("probability vector has {probs} entries but there are {labels} labels")]
    DimensionMismatch { probs: usize, labels: usize },
    #[error("probability at index {index} is not a finite non-negative number: {value}")]
    InvalidProbability { index: usize, value: f64 },
    #[error("temperature must be finite and >= 0, got {0}")]
    InvalidTemperature(f64),
    #[error("boost must be finite and > -1, got {0}")]
    InvalidBoost(f64),
    #[error("cannot renormalize a distribution whose mass is {0}")]
    DegenerateDistribution(f64),
    #[error("model backend failed: {0:#}")]
    Backend(#[source] anyhow::Error),
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
