//! Error types for the chat data-access layer.

use chatline_backend::BackendError;
use thiserror::Error;

/// Result type alias for chat operations
pub type ChatResult<T> = Result<T, ChatError>;

/// Main error type for chat operations
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Permission denied: {reason}")]
    Permission { reason: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("No user is signed in")]
    NotAuthenticated,

    #[error("Decode error: {message}")]
    Decode { message: String },
}

impl ChatError {
    /// Create a permission error
    pub fn permission(reason: impl Into<String>) -> Self {
        Self::Permission {
            reason: reason.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Status code carried by the error, if the backend answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Backend(BackendError::Status { status, .. }) => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode {
            message: format!("JSON error: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_converts() {
        let err: ChatError = BackendError::status(503, "query chats").into();
        assert_eq!(err.status(), Some(503));
        assert!(err.to_string().starts_with("Backend error"));
    }

    #[test]
    fn test_json_error_is_decode() {
        let err: ChatError = serde_json::from_str::<u32>("\"nope\"").unwrap_err().into();
        assert!(matches!(err, ChatError::Decode { .. }));
        assert_eq!(err.status(), None);
    }
}
