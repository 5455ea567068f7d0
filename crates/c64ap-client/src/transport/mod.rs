//! Frame transports
//!
//! A transport moves whole text frames between client and server. The
//! session code only ever sees frames; encoding lives in the protocol crate.

mod memory;
mod websocket;

pub use memory::{memory_pair, MemoryConnector, MemoryServer, MemoryTransport};
pub use websocket::{WsConnector, WsTransport};

use async_trait::async_trait;

use crate::error::TransportError;

/// An open, bidirectional frame connection
#[async_trait]
pub trait Transport: Send {
    /// Send one text frame
    async fn send(&mut self, frame: String) -> Result<(), TransportError>;

    /// Receive the next text frame; `None` once the peer has closed.
    ///
    /// Must be cancel safe: it is raced against outbound traffic.
    async fn recv(&mut self) -> Option<Result<String, TransportError>>;

    /// Close the connection, ignoring errors
    async fn close(&mut self);
}

/// Opens transports to a server address
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Box<dyn Transport>, TransportError>;
}
