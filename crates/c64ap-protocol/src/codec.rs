//! JSON codec for websocket frames
//!
//! A frame is a JSON array of command objects. Decoding is tolerant per
//! command: an unknown or malformed command is logged and skipped so that a
//! newer server cannot break an older client. A frame that is not an array
//! at all is an error.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::ProtocolError;

/// Codec for encoding/decoding packet frames
#[derive(Debug, Default, Clone, Copy)]
pub struct PacketCodec;

impl PacketCodec {
    /// Create a new codec
    pub fn new() -> Self {
        Self
    }

    /// Encode a batch of packets as one text frame
    pub fn encode<T: Serialize>(&self, packets: &[T]) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(packets)?)
    }

    /// Decode a text frame into the packets it carries
    pub fn decode<T: DeserializeOwned>(&self, frame: &str) -> Result<Vec<T>, ProtocolError> {
        let commands: Vec<Value> = match serde_json::from_str(frame)? {
            Value::Array(commands) => commands,
            other => {
                return Err(ProtocolError::MalformedFrame(format!(
                    "expected an array of commands, got {}",
                    kind_of(&other)
                )))
            }
        };

        let mut packets = Vec::with_capacity(commands.len());
        for command in commands {
            let name = command
                .get("cmd")
                .and_then(Value::as_str)
                .unwrap_or("<missing cmd>")
                .to_string();

            match serde_json::from_value::<T>(command) {
                Ok(packet) => packets.push(packet),
                Err(e) => {
                    tracing::warn!("Skipping undecodable {} command: {}", name, e);
                }
            }
        }

        Ok(packets)
    }

    /// Decode a binary frame (UTF-8 JSON sent as binary)
    pub fn decode_bytes<T: DeserializeOwned>(&self, frame: &[u8]) -> Result<Vec<T>, ProtocolError> {
        let text = std::str::from_utf8(frame)?;
        self.decode(text)
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::LocationId;
    use crate::packet::{ClientPacket, ServerPacket};

    #[test]
    fn test_encode_batch() {
        let codec = PacketCodec::new();
        let frame = codec
            .encode(&[
                ClientPacket::Sync,
                ClientPacket::LocationChecks {
                    locations: vec![LocationId(1), LocationId(2)],
                },
            ])
            .unwrap();

        assert_eq!(
            frame,
            r#"[{"cmd":"Sync"},{"cmd":"LocationChecks","locations":[1,2]}]"#
        );
    }

    #[test]
    fn test_decode_skips_unknown_commands() {
        let codec = PacketCodec::new();
        let frame = r#"[
            {"cmd": "SomethingFromTheFuture", "x": 1},
            {"cmd": "ConnectionRefused", "errors": ["InvalidSlot"]}
        ]"#;

        let packets: Vec<ServerPacket> = codec.decode(frame).unwrap();
        assert_eq!(packets.len(), 1);
        assert_eq!(
            packets[0],
            ServerPacket::ConnectionRefused {
                errors: vec!["InvalidSlot".to_string()]
            }
        );
    }

    #[test]
    fn test_decode_rejects_non_array_frame() {
        let codec = PacketCodec::new();
        let result: Result<Vec<ServerPacket>, _> = codec.decode(r#"{"cmd": "RoomInfo"}"#);
        assert!(matches!(result, Err(ProtocolError::MalformedFrame(_))));
    }

    #[test]
    fn test_decode_bytes_requires_utf8() {
        let codec = PacketCodec::new();
        let result: Result<Vec<ServerPacket>, _> = codec.decode_bytes(&[0xff, 0xfe]);
        assert!(matches!(result, Err(ProtocolError::InvalidUtf8(_))));
    }

    #[test]
    fn test_client_packets_decode_for_test_servers() {
        let codec = PacketCodec::new();
        let frame = codec
            .encode(&[ClientPacket::Get {
                keys: vec!["a".to_string()],
            }])
            .unwrap();
        let decoded: Vec<ClientPacket> = codec.decode(&frame).unwrap();
        assert_eq!(decoded[0].command(), "Get");
    }
}
