//! Error types for Pulse Sync

use thiserror::Error;

/// Result type alias for Pulse operations
pub type Result<T> = std::result::Result<T, PulseError>;

/// Main error type shared across Pulse crates
#[derive(Error, Debug)]
pub enum PulseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Unknown metric type: {0}")]
    UnknownMetricType(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}
