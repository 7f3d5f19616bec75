use thiserror::Error;

/// Errors raised by the scoring and scenario engine.
///
/// Most engine failures are recovered locally (missing model, unknown override
/// path, failed scoring); the sensitivity range variants are the only ones that
/// reach a caller as a validation error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("min_value ({min_value}) must be less than max_value ({max_value})")]
    InvalidSensitivityRange { min_value: f64, max_value: f64 },

    #[error("steps must be between {min} and {max}, got {steps}")]
    InvalidSensitivitySteps { steps: usize, min: usize, max: usize },

    #[error("invalid parameter path '{path}': {reason}")]
    InvalidParameterPath { path: String, reason: String },

    #[error("invalid value for '{path}': {reason}")]
    InvalidParameterValue { path: String, reason: String },

    #[error("feature count mismatch: expected {expected}, got {actual}")]
    FeatureCountMismatch { expected: usize, actual: usize },

    #[error("feature order mismatch at position {index}: expected '{expected}', got '{actual}'")]
    FeatureOrderMismatch {
        index: usize,
        expected: String,
        actual: String,
    },

    #[error("invalid model artifact: {0}")]
    InvalidModel(String),

    #[error("scoring produced a non-finite value")]
    NonFiniteScore,
}

impl EngineError {
    /// True for errors caused by the request itself rather than the engine.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidSensitivityRange { .. }
                | Self::InvalidSensitivitySteps { .. }
                | Self::InvalidParameterPath { .. }
                | Self::InvalidParameterValue { .. }
        )
    }
}
