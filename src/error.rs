//! Error types for the wattcast library.

use thiserror::Error;

/// Result type alias for forecasting operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur while preparing data, training, or forecasting.
#[derive(Error, Debug)]
pub enum ForecastError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Timestamp-related error.
    #[error("timestamp error: {0}")]
    TimestampError(String),

    /// Named column is not present in the table.
    #[error("unknown column: {0}")]
    UnknownColumn(String),

    /// Model has not been fitted yet.
    #[error("model must be fitted before prediction")]
    FitRequired,

    /// Feature schema of the caller does not match the schema the model was
    /// trained with. This is a fatal contract violation, never a silent
    /// misalignment.
    #[error("feature schema mismatch: model expects [{expected}], got [{got}]")]
    SchemaMismatch { expected: String, got: String },

    /// Index out of bounds.
    #[error("index out of bounds: {index} (size: {size})")]
    IndexOutOfBounds { index: usize, size: usize },

    /// A row in the input file could not be parsed.
    #[error("parse error at record {record}: {message}")]
    ParseError { record: usize, message: String },

    /// Underlying I/O failure while reading input data.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV decoding failure.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}
