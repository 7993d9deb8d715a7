//! Error types for jirabridge
//!
//! One error enum covers configuration, storage and transport failures.
//! Uses thiserror for ergonomic error handling.

use thiserror::Error;

/// Result type alias for jirabridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Comprehensive error type for jirabridge operations
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage/database errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Network/HTTP errors
    #[error("Network error: {0}")]
    Network(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// SQLite database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl BridgeError {
    /// True for failures of the persistent mapping store
    pub fn is_storage(&self) -> bool {
        matches!(self, BridgeError::Storage(_) | BridgeError::Database(_))
    }

    /// True when the remote call never produced a response (connect, timeout, body read)
    pub fn is_transport(&self) -> bool {
        match self {
            BridgeError::Network(_) => true,
            BridgeError::Http(e) => e.is_connect() || e.is_timeout() || e.is_request() || e.is_body(),
            _ => false,
        }
    }
}
