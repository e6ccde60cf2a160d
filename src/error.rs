//! Error types for the stackreg experiment driver

use thiserror::Error;

/// Result type alias for stackreg operations
pub type Result<T> = std::result::Result<T, StackRegError>;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum StackRegError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Search error: {0}")]
    SearchError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Computation error: {0}")]
    ComputationError(String),
}

impl From<polars::error::PolarsError> for StackRegError {
    fn from(err: polars::error::PolarsError) -> Self {
        StackRegError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for StackRegError {
    fn from(err: serde_json::Error) -> Self {
        StackRegError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for StackRegError {
    fn from(err: ndarray::ShapeError) -> Self {
        StackRegError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StackRegError::TrainingError("diverged".to_string());
        assert_eq!(err.to_string(), "Training error: diverged");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: StackRegError = io_err.into();
        assert!(matches!(err, StackRegError::IoError(_)));
    }
}
