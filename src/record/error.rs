use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum RecordError {
    #[error("Non-finite measurement at position {index}: {value}")]
    NonFiniteMeasurement { index: usize, value: f64 },

    #[error("Mean of the measurements is not finite: {0}")]
    NonFiniteKey(f64),

    #[error("Invalid ISO3 code: {0:?} (expected 3 characters)")]
    InvalidCode(String),
}

pub type RecordResult<T> = Result<T, RecordError>;
