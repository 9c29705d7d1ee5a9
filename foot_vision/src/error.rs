use thiserror::Error;

/// Terminal failures of a measurement run.
///
/// Conditions the pipeline recovers from on its own (no foreground on the heel
/// line, an empty width profile) are not errors; they are recorded on the
/// `MeasurementResult` as a `Notice`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeasureError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no foot detected in the rectified image")]
    NoFootDetected,

    #[error("measurement worker failed: {0}")]
    Worker(String),
}

pub type Result<T> = std::result::Result<T, MeasureError>;
