//! Error types for Uplevel
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Uplevel operations
///
/// This enum encompasses all possible errors that can occur in the
/// session store, the completion gateway, the stream relay, and the
/// terminal chat client.
#[derive(Error, Debug)]
pub enum UplevelError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// No valid user context on a request
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Session does not exist or does not belong to the requesting user
    #[error("Session not found: {0}")]
    NotFound(String),

    /// Completion provider errors (transport or upstream API)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Stream closed before the terminal sentinel was received
    #[error("Stream interrupted: {0}")]
    TransportInterrupted(String),

    /// Session storage errors (database operations)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Relay client errors (malformed responses, unexpected statuses)
    #[error("Relay error: {0}")]
    Relay(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Uplevel operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

/// Returns true when `err` wraps [`UplevelError::NotFound`].
///
/// Handlers use this to map store failures onto HTTP 404 instead of 500.
pub fn is_not_found(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<UplevelError>(),
        Some(UplevelError::NotFound(_))
    )
}

/// Returns true when `err` wraps [`UplevelError::NotAuthenticated`].
pub fn is_not_authenticated(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<UplevelError>(),
        Some(UplevelError::NotAuthenticated)
    )
}
