//! Client error types

use c64ap_core::SlotDataError;
use c64ap_protocol::ProtocolError;
use thiserror::Error;

/// Failures of the underlying frame transport
#[derive(Debug, Error)]
pub enum TransportError {
    /// Could not open a connection
    #[error("Failed to connect to {url}: {message}")]
    Connect { url: String, message: String },

    /// The connection was closed while sending
    #[error("Connection closed")]
    Closed,

    /// Websocket protocol or I/O failure
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Errors returned by `ConnectionManager::connect` and session operations
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Network unreachable or dropped
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The server refused the login
    #[error("Login refused: {}", reasons.join(", "))]
    Auth { reasons: Vec<String> },

    /// The server did not follow the login sequence
    #[error("Handshake failed: {0}")]
    Handshake(String),

    /// Slot data could not be parsed
    #[error("Invalid slot data: {0}")]
    SlotData(#[from] SlotDataError),

    /// A frame could not be encoded or decoded
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The operation needs a ready session
    #[error("Not connected")]
    NotConnected,
}

impl ConnectionError {
    /// Whether a caller may retry the connection
    ///
    /// Refused logins and bad slot data will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ConnectionError::Transport(_) | ConnectionError::Handshake(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_lists_reasons() {
        let err = ConnectionError::Auth {
            reasons: vec!["InvalidSlot".to_string(), "InvalidPassword".to_string()],
        };
        assert_eq!(err.to_string(), "Login refused: InvalidSlot, InvalidPassword");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_transport_errors_are_retryable() {
        assert!(ConnectionError::Transport(TransportError::Closed).is_retryable());
        assert!(!ConnectionError::NotConnected.is_retryable());
    }
}
