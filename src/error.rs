use thiserror::Error;

/// Fatal failures of a single inference call. No-detection conditions are
/// not errors; they produce empty results at the scope where they occur.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferenceError {
    #[error("Unsupported inference mode: {0:?}")]
    UnsupportedMode(String),

    #[error("Unsupported channel layout: {channels} channels for mode {mode:?}")]
    UnsupportedChannelLayout { channels: usize, mode: &'static str },

    #[error("Threshold list has {actual} entries but {expected} instruments are inferred")]
    ThresholdLengthMismatch { expected: usize, actual: usize },
}
