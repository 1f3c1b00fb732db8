//! Error types for judgeval-mcp.

use thiserror::Error;

/// Result type alias for judgeval-mcp.
pub type Result<T> = std::result::Result<T, JudgmentError>;

/// Judgment adapter error types.
#[derive(Error, Debug)]
pub enum JudgmentError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network/HTTP error.
    #[error("Network error: {0}")]
    Network(String),

    /// Judgment API rejected the request. The status code is part of the
    /// message so boundary code can classify failures from the text alone.
    #[error("Judgment API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// A required tool argument was missing or had the wrong type.
    #[error("missing required argument: {0}")]
    MissingArgument(&'static str),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<reqwest::Error> for JudgmentError {
    fn from(e: reqwest::Error) -> Self {
        JudgmentError::Network(e.to_string())
    }
}

impl From<toml::de::Error> for JudgmentError {
    fn from(e: toml::de::Error) -> Self {
        JudgmentError::Config(e.to_string())
    }
}

impl From<serde_json::Error> for JudgmentError {
    fn from(e: serde_json::Error) -> Self {
        JudgmentError::Serialization(e.to_string())
    }
}
