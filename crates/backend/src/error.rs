//! Error types for backend calls.

use thiserror::Error;

/// Result type alias for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BackendError {
    #[error("Backend transport error: {0}")]
    Transport(String),

    #[error("Invalid backend response: {0}")]
    Decode(String),

    #[error("Backend returned status {status} for {context}")]
    Status { status: u16, context: String },

    #[error("Backend configuration error: {0}")]
    Configuration(String),
}

impl BackendError {
    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Create a non-success status error
    pub fn status(status: u16, context: impl Into<String>) -> Self {
        Self::Status {
            status,
            context: context.into(),
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(format!("JSON error: {}", err))
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for BackendError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Transport(format!("realtime connection failed: {}", err))
    }
}
