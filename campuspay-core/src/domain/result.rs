//! Result and error types for the core library

use thiserror::Error;

use super::Operation;

/// Core library error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// The server kept rejecting the session token after re-authentication
    #[error("Session expired during {operation} after {attempts} attempt(s), please log in again")]
    SessionExpired { operation: Operation, attempts: u32 },

    /// The payment service refused the payment and said why
    #[error("Payment denied: {reason}")]
    PaymentDenied { reason: String },

    #[error("{operation} failed with unexpected status {status}")]
    UnexpectedStatus { operation: Operation, status: u16 },

    #[error("{operation} request failed: {source}")]
    Transport {
        operation: Operation,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to decode {operation} response: {message}")]
    Decode { operation: Operation, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// HTTP status carried by this failure, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UnexpectedStatus { status, .. } => Some(*status),
            Self::SessionExpired { .. } => Some(401),
            Self::PaymentDenied { .. } => Some(403),
            Self::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether a caller may reasonably show a generic "try again" message
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::SessionExpired { .. } => true,
            Self::UnexpectedStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_status_message_names_operation_and_status() {
        let err = Error::UnexpectedStatus {
            operation: Operation::ListTransactions,
            status: 500,
        };
        let msg = err.to_string();
        assert!(msg.contains("list_transactions"));
        assert!(msg.contains("500"));
        assert!(err.is_retryable());
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn test_payment_denied_carries_reason() {
        let err = Error::PaymentDenied {
            reason: "insufficient funds".to_string(),
        };
        assert!(err.to_string().contains("insufficient funds"));
        assert!(!err.is_retryable());
        assert_eq!(err.status(), Some(403));
    }

    #[test]
    fn test_client_errors_are_not_retryable() {
        let err = Error::UnexpectedStatus {
            operation: Operation::SetPin,
            status: 400,
        };
        assert!(!err.is_retryable());
        assert!(!Error::validation("bad pin").is_retryable());
    }

    #[test]
    fn test_session_expired_message() {
        let err = Error::SessionExpired {
            operation: Operation::HasPin,
            attempts: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("has_pin"));
        assert!(msg.contains("log in again"));
    }
}
