//! Error types for novelshelf.
//!
//! Uses `thiserror` for structured error definitions that provide
//! clear context about what went wrong.

use thiserror::Error;

/// Main error type for backend calls made by the store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// HTTP request failed before a response arrived
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("{context}: HTTP {status}")]
    Status {
        context: String,
        status: reqwest::StatusCode,
        body: String,
    },

    /// Response body did not match the expected shape
    #[error("Failed to decode response: {0}")]
    DecodeError(#[from] serde_json::Error),

    /// Cart quantity delta of zero
    #[error("Quantity change must not be zero")]
    InvalidQuantity,
}

impl StoreError {
    /// Returns the HTTP status for status errors.
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            StoreError::Status { status, .. } => Some(*status),
            StoreError::HttpError(e) => e.status(),
            _ => None,
        }
    }
}

/// Error type for configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse config file
    #[error("Failed to parse config: {0}")]
    ParseError(String),

    /// Invalid configuration value
    #[error("Invalid config value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Config directory not found
    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Error type for logger setup.
#[derive(Error, Debug)]
pub enum LoggerError {
    /// Level string or `RUST_LOG` could not be parsed
    #[error("Invalid log level '{level}': {message}")]
    InvalidLevel { level: String, message: String },

    /// A global subscriber was already installed
    #[error("Failed to set subscriber: {0}")]
    AlreadyInitialized(String),
}
