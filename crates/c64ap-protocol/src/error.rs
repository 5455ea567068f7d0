//! Protocol error types

use thiserror::Error;

/// Errors that can occur while encoding or decoding packets
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// A frame was not a JSON array of commands
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// Binary frame that was not valid UTF-8
    #[error("Frame is not valid UTF-8")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
