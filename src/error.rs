//! Error types for draftfix.

use thiserror::Error;

/// The main error type for draftfix operations.
///
/// Unmatched or malformed ABAP is never an error: it simply produces no
/// located statement. These variants cover the boundary around the engine.
#[derive(Debug, Error)]
pub enum DraftfixError {
    /// Invalid configuration value or file.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A request batch failed validation.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Server startup or runtime failure.
    #[error("Server error: {0}")]
    Server(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML config parse error.
    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl DraftfixError {
    /// Create an invalid input error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Result type alias for draftfix operations.
pub type DraftfixResult<T> = Result<T, DraftfixError>;
