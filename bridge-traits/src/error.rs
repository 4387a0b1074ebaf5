//! Errors shared by every bridge implementation.

use std::time::Duration;
use thiserror::Error;

/// Failure reported by a platform bridge.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The host lacks the capability (no audio device, no browser window).
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    /// No response arrived before the request deadline.
    #[error("Request timed out after {} ms", .0.as_millis())]
    Timeout(Duration),

    /// The remote host refused or dropped the connection.
    #[error("Connection failed: {0}")]
    Unreachable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Whether repeating the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, BridgeError::Timeout(_) | BridgeError::Unreachable(_))
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_failures_are_transient() {
        assert!(BridgeError::Timeout(Duration::from_secs(10)).is_transient());
        assert!(BridgeError::Unreachable("refused".into()).is_transient());
        assert!(!BridgeError::NotAvailable("window".into()).is_transient());
        assert!(!BridgeError::OperationFailed("bad header".into()).is_transient());
    }

    #[test]
    fn timeout_message_uses_milliseconds() {
        let err = BridgeError::Timeout(Duration::from_millis(1500));
        assert_eq!(err.to_string(), "Request timed out after 1500 ms");
    }
}
