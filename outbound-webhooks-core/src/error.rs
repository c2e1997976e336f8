//! Error types for registry and storage operations

use thiserror::Error;

/// Errors surfaced synchronously by the registry, storage providers and
/// engine construction.
///
/// Delivery failures never appear here; they are reported through the
/// [`DeliveryNotifier`](crate::DeliveryNotifier) as [`DeliveryError`](crate::DeliveryError).
#[derive(Error, Debug)]
pub enum WebhookError {
    /// Malformed subscription-creation request
    #[error("Validation error: {0}")]
    Validation(String),

    /// Backend could not durably record a write
    #[error("Storage write failed: {0}")]
    StorageWrite(String),

    /// Backend could not be read or is corrupt
    #[error("Storage error: {0}")]
    Storage(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl WebhookError {
    /// Shorthand for a validation failure
    pub fn validation(message: impl Into<String>) -> Self {
        WebhookError::Validation(message.into())
    }

    /// Check if this is a validation failure
    pub fn is_validation(&self) -> bool {
        matches!(self, WebhookError::Validation(_))
    }
}

impl From<serde_json::Error> for WebhookError {
    fn from(err: serde_json::Error) -> Self {
        WebhookError::Serialization(err.to_string())
    }
}
