/*
[INPUT]:  Error sources (HTTP, validation, serialization, socket.io channel)
[OUTPUT]: Structured error type shared by every facade and the channel
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use thiserror::Error;

/// Main error type for the Wallex adapter
#[derive(Error, Debug)]
pub enum WallexError {
    /// HTTP request failed at the network layer
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Caller-supplied parameter rejected before any network call
    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    /// Authenticated endpoint called without an API key
    #[error("Missing API key for authenticated endpoint")]
    MissingCredentials,

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Response body could not be decoded as JSON
    #[error("Invalid response (status {status}): {message}")]
    InvalidResponse { status: u16, message: String },

    /// WebSocket transport error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Unexpected socket.io / engine.io frame or handshake failure
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Wait exceeded its configured bound
    #[error("Timed out after {duration_ms}ms waiting for {waiting_for}")]
    Timeout {
        duration_ms: u64,
        waiting_for: &'static str,
    },

    /// Wait aborted through the channel's cancellation token
    #[error("Operation cancelled")]
    Cancelled,
}

impl WallexError {
    /// Build a validation error for `field`
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        WallexError::Validation {
            field,
            message: message.into(),
        }
    }

    /// Check if the error was raised by local parameter validation
    pub fn is_validation_error(&self) -> bool {
        matches!(self, WallexError::Validation { .. })
    }

    /// Check if the error came from the network or the socket
    pub fn is_network_error(&self) -> bool {
        matches!(
            self,
            WallexError::Http(_) | WallexError::WebSocket(_) | WallexError::Timeout { .. }
        )
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for WallexError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        WallexError::WebSocket(err.to_string())
    }
}

/// Result type alias for Wallex operations
pub type Result<T> = std::result::Result<T, WallexError>;

/// Reject empty or whitespace-only required string parameters
pub(crate) fn require_non_empty(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(WallexError::validation(field, "must not be empty"));
    }
    Ok(())
}
