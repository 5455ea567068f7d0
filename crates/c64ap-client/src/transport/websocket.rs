//! Websocket transport

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::{Connector, Transport};
use crate::error::TransportError;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens websocket connections
///
/// An address without a scheme is tried as `wss://` first and `ws://` if
/// that fails, since servers are commonly given as `host:port`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WsConnector;

impl WsConnector {
    pub fn new() -> Self {
        Self
    }

    async fn open(url: &str) -> Result<Socket, TransportError> {
        tracing::debug!("Opening websocket to {}", url);
        let (socket, _response) = connect_async(url).await?;
        Ok(socket)
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn Transport>, TransportError> {
        let socket = if url.contains("://") {
            Self::open(url).await?
        } else {
            match Self::open(&format!("wss://{}", url)).await {
                Ok(socket) => socket,
                Err(e) => {
                    tracing::debug!("Secure connection to {} failed ({}), trying plain", url, e);
                    Self::open(&format!("ws://{}", url)).await?
                }
            }
        };

        Ok(Box::new(WsTransport { socket }))
    }
}

/// An open websocket
pub struct WsTransport {
    socket: Socket,
}

#[async_trait]
impl Transport for WsTransport {
    async fn send(&mut self, frame: String) -> Result<(), TransportError> {
        self.socket.send(Message::Text(frame)).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<String, TransportError>> {
        loop {
            match self.socket.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                    Ok(text) => return Some(Ok(text)),
                    Err(e) => tracing::warn!("Dropping non-UTF-8 binary frame: {}", e),
                },
                Ok(Message::Close(frame)) => {
                    tracing::debug!("Server closed the websocket: {:?}", frame);
                    return None;
                }
                // Pings are answered by tungstenite on the next write
                Ok(_) => continue,
                Err(e) => return Some(Err(e.into())),
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.socket.close(None).await {
            tracing::debug!("Error while closing websocket: {}", e);
        }
    }
}
