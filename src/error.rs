//! Error types for the starliner pipeline and prediction service

use thiserror::Error;

/// Result type alias for starliner operations
pub type Result<T> = std::result::Result<T, StarlinerError>;

/// Main error type for the feature pipeline, classifier and service
#[derive(Error, Debug)]
pub enum StarlinerError {
    #[error("Data error: {0}")]
    DataError(String),

    /// Missing column, malformed split input, or unresolved values at the service boundary
    #[error("{0}")]
    ValidationError(String),

    /// Raised by the classifier during predict
    #[error("Model error: {0}")]
    ModelError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Computation error: {0}")]
    ComputationError(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("HTTP error: {0}")]
    HttpError(String),
}

impl From<polars::error::PolarsError> for StarlinerError {
    fn from(err: polars::error::PolarsError) -> Self {
        StarlinerError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for StarlinerError {
    fn from(err: serde_json::Error) -> Self {
        StarlinerError::SerializationError(err.to_string())
    }
}

impl From<reqwest::Error> for StarlinerError {
    fn from(err: reqwest::Error) -> Self {
        StarlinerError::HttpError(err.to_string())
    }
}
