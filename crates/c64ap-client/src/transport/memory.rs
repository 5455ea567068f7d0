//! In-process transport
//!
//! Connects a client to a scripted server end over channels. Used by tests
//! and by anything that wants to drive a session without a socket.

use async_trait::async_trait;
use c64ap_protocol::{ClientPacket, PacketCodec, ProtocolError, ServerPacket};
use std::sync::Mutex;
use tokio::sync::mpsc;

use super::{Connector, Transport};
use crate::error::TransportError;

/// Create a connected client/server pair
pub fn memory_pair() -> (MemoryTransport, MemoryServer) {
    let (to_server, from_client) = mpsc::unbounded_channel();
    let (to_client, from_server) = mpsc::unbounded_channel();

    (
        MemoryTransport {
            tx: Some(to_server),
            rx: from_server,
        },
        MemoryServer {
            tx: to_client,
            rx: from_client,
            codec: PacketCodec::new(),
        },
    )
}

/// Client end of a memory pair
pub struct MemoryTransport {
    tx: Option<mpsc::UnboundedSender<String>>,
    rx: mpsc::UnboundedReceiver<String>,
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&mut self, frame: String) -> Result<(), TransportError> {
        match &self.tx {
            Some(tx) => tx.send(frame).map_err(|_| TransportError::Closed),
            None => Err(TransportError::Closed),
        }
    }

    async fn recv(&mut self) -> Option<Result<String, TransportError>> {
        self.rx.recv().await.map(Ok)
    }

    async fn close(&mut self) {
        self.tx = None;
        self.rx.close();
    }
}

/// Server end of a memory pair
pub struct MemoryServer {
    tx: mpsc::UnboundedSender<String>,
    rx: mpsc::UnboundedReceiver<String>,
    codec: PacketCodec,
}

impl MemoryServer {
    /// Send packets to the client as one frame; false if the client is gone
    pub fn send(&self, packets: &[ServerPacket]) -> Result<bool, ProtocolError> {
        let frame = self.codec.encode(packets)?;
        Ok(self.tx.send(frame).is_ok())
    }

    /// Send a raw frame
    pub fn send_raw(&self, frame: impl Into<String>) -> bool {
        self.tx.send(frame.into()).is_ok()
    }

    /// Next frame from the client, decoded; `None` once the client closed
    pub async fn recv(&mut self) -> Option<Vec<ClientPacket>> {
        let frame = self.rx.recv().await?;
        match self.codec.decode(&frame) {
            Ok(packets) => Some(packets),
            Err(e) => {
                tracing::warn!("Memory server got an undecodable frame: {}", e);
                Some(Vec::new())
            }
        }
    }

    /// Frames already sent by the client, without waiting
    pub fn drain(&mut self) -> Vec<ClientPacket> {
        let mut packets = Vec::new();
        while let Ok(frame) = self.rx.try_recv() {
            if let Ok(decoded) = self.codec.decode::<ClientPacket>(&frame) {
                packets.extend(decoded);
            }
        }
        packets
    }
}

/// Hands out a single pre-built memory transport
///
/// Later connects fail as if the server were unreachable.
pub struct MemoryConnector {
    transport: Mutex<Option<MemoryTransport>>,
}

impl MemoryConnector {
    pub fn new(transport: MemoryTransport) -> Self {
        Self {
            transport: Mutex::new(Some(transport)),
        }
    }

    /// A connector that never connects
    pub fn unreachable() -> Self {
        Self {
            transport: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn Transport>, TransportError> {
        let transport = self.transport.lock().ok().and_then(|mut slot| slot.take());
        match transport {
            Some(transport) => Ok(Box::new(transport)),
            None => Err(TransportError::Connect {
                url: url.to_string(),
                message: "connection refused".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pair_carries_frames_both_ways() {
        let (mut client, mut server) = memory_pair();

        client.send(r#"[{"cmd":"Sync"}]"#.to_string()).await.unwrap();
        assert_eq!(server.recv().await, Some(vec![ClientPacket::Sync]));

        assert!(server.send_raw("[]"));
        assert_eq!(client.recv().await.unwrap().unwrap(), "[]");
    }

    #[tokio::test]
    async fn test_close_ends_server_stream() {
        let (mut client, mut server) = memory_pair();
        client.close().await;
        assert!(server.recv().await.is_none());
        assert!(client.send("[]".to_string()).await.is_err());
    }

    #[tokio::test]
    async fn test_connector_hands_out_once() {
        let (client, _server) = memory_pair();
        let connector = MemoryConnector::new(client);
        assert!(connector.connect("memory").await.is_ok());
        assert!(matches!(
            connector.connect("memory").await,
            Err(TransportError::Connect { .. })
        ));
    }
}
