//! Error types for TIDE

use thiserror::Error;

/// Main error type for TIDE operations
#[derive(Error, Debug)]
pub enum TideError {
    /// Malformed rule or fact text
    #[error("Parse error: {0}")]
    ParseError(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for TIDE operations
pub type Result<T> = std::result::Result<T, TideError>;
