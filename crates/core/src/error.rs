//! Error types for the PM10 forecasting pipeline.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the forecasting pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// No input file could be parsed.
    #[error("Ingestion error: {0}")]
    Ingestion(String),

    /// No resolvable timestamp or target column.
    #[error("Schema error: {0}")]
    Schema(String),

    /// Too few usable rows after cleaning and feature building.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Unexpected failure during feature building, training or forecasting.
    #[error("Computation error: {0}")]
    Computation(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an ingestion error.
    pub fn ingestion(msg: impl Into<String>) -> Self {
        Error::Ingestion(msg.into())
    }

    /// Create a schema error.
    pub fn schema(msg: impl Into<String>) -> Self {
        Error::Schema(msg.into())
    }

    /// Create an insufficient data error.
    pub fn insufficient_data(msg: impl Into<String>) -> Self {
        Error::InsufficientData(msg.into())
    }

    /// Create a computation error.
    pub fn computation(msg: impl Into<String>) -> Self {
        Error::Computation(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Stable tag for the error category, used in failure responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Ingestion(_) => "ingestion",
            Error::Schema(_) => "schema",
            Error::InsufficientData(_) => "insufficient_data",
            Error::Computation(_) => "computation",
            Error::Config(_) => "config",
            Error::Io(_) => "io",
            Error::Json(_) => "json",
        }
    }
}
