//! Network pump
//!
//! One task per session. Races inbound frames against queued outbound
//! packets until the session is cancelled or the transport fails.

use c64ap_protocol::{ClientPacket, PacketCodec, ServerPacket};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::dispatch::dispatch;
use super::{SessionEvent, Shared};
use crate::error::TransportError;
use crate::transport::Transport;

pub(crate) async fn run(
    mut transport: Box<dyn Transport>,
    mut outbound: mpsc::UnboundedReceiver<ClientPacket>,
    shared: Arc<Shared>,
    events: mpsc::UnboundedSender<SessionEvent>,
    cancel: CancellationToken,
) {
    let codec = PacketCodec::new();

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                tracing::debug!("Session cancelled");
                break;
            }

            packet = outbound.recv() => {
                let Some(first) = packet else {
                    break;
                };

                // Everything queued since the last wakeup goes in one frame
                let mut batch = vec![first];
                while let Ok(packet) = outbound.try_recv() {
                    batch.push(packet);
                }

                if let Err(e) = send_batch(transport.as_mut(), &codec, &batch).await {
                    tracing::warn!("Connection lost while sending {}: {}", batch[0].command(), e);
                    cancel.cancel();
                    break;
                }
            }

            frame = transport.recv() => {
                match frame {
                    Some(Ok(text)) => match codec.decode::<ServerPacket>(&text) {
                        Ok(packets) => {
                            for packet in packets {
                                dispatch(packet, &shared, &events);
                            }
                        }
                        Err(e) => tracing::warn!("Dropping malformed frame: {}", e),
                    },
                    Some(Err(e)) => {
                        tracing::warn!("Connection error: {}", e);
                        cancel.cancel();
                        break;
                    }
                    None => {
                        tracing::info!("Server closed the connection");
                        cancel.cancel();
                        break;
                    }
                }
            }
        }
    }

    transport.close().await;
}

async fn send_batch(
    transport: &mut dyn Transport,
    codec: &PacketCodec,
    batch: &[ClientPacket],
) -> Result<(), TransportError> {
    let frame = match codec.encode(batch) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::error!("Failed to encode {} packet(s): {}", batch.len(), e);
            return Ok(());
        }
    };

    tracing::trace!("Sending {}", frame);
    transport.send(frame).await
}
