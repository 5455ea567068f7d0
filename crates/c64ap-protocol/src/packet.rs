//! Packets exchanged with the multiworld server
//!
//! Every websocket text frame carries a JSON array of commands. Each command
//! is an object whose `cmd` field names the packet type.
//!
//! # Session flow
//!
//! 1. Server sends `RoomInfo` as soon as the socket opens
//! 2. Client sends `Connect` (login); server answers `Connected` or
//!    `ConnectionRefused`
//! 3. Server pushes `ReceivedItems` (full list from index 0 right after login,
//!    then increments), `RoomUpdate` (newly checked locations, player changes)
//!    and `PrintJSON` (chat and item-send notices)
//! 4. Client sends `LocationChecks` as objectives complete, `Bounce` for
//!    DeathLink and `Get`/`Set`/`SetNotify` for the shared key-value store

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::ids::{LocationId, SlotId};
use crate::types::{
    ClientStatus, DataPackageObject, DataStorageOperation, JsonMessagePart, NetworkItem,
    NetworkPlayer, NetworkSlot, NetworkVersion, RoomPermissions,
};

/// Commands sent by the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd")]
pub enum ClientPacket {
    /// Login request
    Connect {
        password: String,
        game: String,
        name: String,
        uuid: String,
        version: NetworkVersion,
        items_handling: u8,
        #[serde(default)]
        tags: Vec<String>,
        slot_data: bool,
    },

    /// Change tags or item handling after login
    ConnectUpdate { items_handling: u8, tags: Vec<String> },

    /// Ask the server to resend the full received-item list
    Sync,

    /// Report completed locations
    LocationChecks { locations: Vec<LocationId> },

    /// Ask what items sit at the given locations
    LocationScouts {
        locations: Vec<LocationId>,
        create_as_hint: u8,
    },

    /// Report client status (goal completion)
    StatusUpdate { status: ClientStatus },

    /// Chat message
    Say { text: String },

    /// Request item/location name tables
    GetDataPackage { games: Vec<String> },

    /// Broadcast arbitrary data to matching clients
    Bounce {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        games: Vec<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        slots: Vec<SlotId>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tags: Vec<String>,
        data: Value,
    },

    /// Read keys from the shared data store
    Get { keys: Vec<String> },

    /// Write a key in the shared data store
    Set {
        key: String,
        default: Value,
        want_reply: bool,
        operations: Vec<DataStorageOperation>,
    },

    /// Subscribe to changes of the given keys
    SetNotify { keys: Vec<String> },
}

impl ClientPacket {
    /// Command name, for logging
    pub fn command(&self) -> &'static str {
        match self {
            ClientPacket::Connect { .. } => "Connect",
            ClientPacket::ConnectUpdate { .. } => "ConnectUpdate",
            ClientPacket::Sync => "Sync",
            ClientPacket::LocationChecks { .. } => "LocationChecks",
            ClientPacket::LocationScouts { .. } => "LocationScouts",
            ClientPacket::StatusUpdate { .. } => "StatusUpdate",
            ClientPacket::Say { .. } => "Say",
            ClientPacket::GetDataPackage { .. } => "GetDataPackage",
            ClientPacket::Bounce { .. } => "Bounce",
            ClientPacket::Get { .. } => "Get",
            ClientPacket::Set { .. } => "Set",
            ClientPacket::SetNotify { .. } => "SetNotify",
        }
    }
}

/// Commands sent by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd")]
pub enum ServerPacket {
    /// First packet after the socket opens
    RoomInfo {
        version: NetworkVersion,
        #[serde(default)]
        generator_version: Option<NetworkVersion>,
        #[serde(default)]
        tags: Vec<String>,
        #[serde(default)]
        password: bool,
        #[serde(default)]
        permissions: RoomPermissions,
        #[serde(default)]
        hint_cost: i64,
        #[serde(default)]
        location_check_points: i64,
        #[serde(default)]
        games: Vec<String>,
        #[serde(default)]
        seed_name: String,
        #[serde(default)]
        time: f64,
    },

    /// Login rejected
    ConnectionRefused {
        #[serde(default)]
        errors: Vec<String>,
    },

    /// Login accepted
    Connected {
        team: i64,
        slot: SlotId,
        #[serde(default)]
        players: Vec<NetworkPlayer>,
        #[serde(default)]
        missing_locations: Vec<LocationId>,
        #[serde(default)]
        checked_locations: Vec<LocationId>,
        #[serde(default)]
        slot_data: Value,
        /// Keyed by the slot number rendered as a string
        #[serde(default)]
        slot_info: HashMap<String, NetworkSlot>,
        #[serde(default)]
        hint_points: i64,
    },

    /// Items granted to us, starting at `index` in the full received list
    ReceivedItems { index: u64, items: Vec<NetworkItem> },

    /// Answer to `LocationScouts`
    LocationInfo { locations: Vec<NetworkItem> },

    /// Partial room state change
    RoomUpdate {
        #[serde(default)]
        players: Option<Vec<NetworkPlayer>>,
        #[serde(default)]
        checked_locations: Option<Vec<LocationId>>,
        #[serde(default)]
        hint_points: Option<i64>,
        #[serde(default)]
        permissions: Option<RoomPermissions>,
    },

    /// Chat or notification text
    #[serde(rename = "PrintJSON")]
    PrintJson {
        #[serde(default)]
        data: Vec<JsonMessagePart>,
        #[serde(rename = "type", default)]
        kind: Option<String>,
        #[serde(default)]
        receiving: Option<SlotId>,
        #[serde(default)]
        item: Option<NetworkItem>,
        #[serde(default)]
        found: Option<bool>,
    },

    /// Answer to `GetDataPackage`
    DataPackage { data: DataPackageObject },

    /// A bounce from another (or this) client
    Bounced {
        #[serde(default)]
        games: Vec<String>,
        #[serde(default)]
        slots: Vec<SlotId>,
        #[serde(default)]
        tags: Vec<String>,
        #[serde(default)]
        data: Value,
    },

    /// The server could not process one of our packets
    InvalidPacket {
        #[serde(rename = "type", default)]
        kind: String,
        #[serde(default)]
        original_cmd: Option<String>,
        #[serde(default)]
        text: String,
    },

    /// Answer to `Get`
    Retrieved { keys: HashMap<String, Value> },

    /// Notification for `Set` with `want_reply` or a `SetNotify` subscription
    SetReply {
        key: String,
        #[serde(default)]
        value: Value,
        #[serde(default)]
        original_value: Value,
        #[serde(default)]
        slot: Option<SlotId>,
    },
}

impl ServerPacket {
    /// Command name, for logging
    pub fn command(&self) -> &'static str {
        match self {
            ServerPacket::RoomInfo { .. } => "RoomInfo",
            ServerPacket::ConnectionRefused { .. } => "ConnectionRefused",
            ServerPacket::Connected { .. } => "Connected",
            ServerPacket::ReceivedItems { .. } => "ReceivedItems",
            ServerPacket::LocationInfo { .. } => "LocationInfo",
            ServerPacket::RoomUpdate { .. } => "RoomUpdate",
            ServerPacket::PrintJson { .. } => "PrintJSON",
            ServerPacket::DataPackage { .. } => "DataPackage",
            ServerPacket::Bounced { .. } => "Bounced",
            ServerPacket::InvalidPacket { .. } => "InvalidPacket",
            ServerPacket::Retrieved { .. } => "Retrieved",
            ServerPacket::SetReply { .. } => "SetReply",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ItemId;
    use serde_json::json;

    #[test]
    fn test_connect_wire_shape() {
        let packet = ClientPacket::Connect {
            password: String::new(),
            game: "Celeste 64".to_string(),
            name: "Madeline".to_string(),
            uuid: "abc".to_string(),
            version: NetworkVersion::new(0, 4, 3),
            items_handling: crate::types::ITEMS_HANDLING_ALL,
            tags: vec![],
            slot_data: true,
        };

        let value = serde_json::to_value(&packet).unwrap();
        assert_eq!(value["cmd"], "Connect");
        assert_eq!(value["items_handling"], 7);
        assert_eq!(value["version"]["class"], "Version");
    }

    #[test]
    fn test_sync_is_bare_command() {
        let value = serde_json::to_value(ClientPacket::Sync).unwrap();
        assert_eq!(value, json!({"cmd": "Sync"}));
    }

    #[test]
    fn test_bounce_omits_empty_targets() {
        let value = serde_json::to_value(ClientPacket::Bounce {
            games: vec![],
            slots: vec![],
            tags: vec!["DeathLink".to_string()],
            data: json!({"time": 1.0, "source": "Madeline"}),
        })
        .unwrap();

        assert!(value.get("games").is_none());
        assert!(value.get("slots").is_none());
        assert_eq!(value["tags"], json!(["DeathLink"]));
    }

    #[test]
    fn test_received_items_parse() {
        let packet: ServerPacket = serde_json::from_value(json!({
            "cmd": "ReceivedItems",
            "index": 3,
            "items": [{"item": 13238279, "location": 5, "player": 2, "flags": 1}]
        }))
        .unwrap();

        match packet {
            ServerPacket::ReceivedItems { index, items } => {
                assert_eq!(index, 3);
                assert_eq!(items[0].item, ItemId(0xCA0007));
                assert!(items[0].is_progression());
            }
            other => panic!("Expected ReceivedItems, got {:?}", other),
        }
    }

    #[test]
    fn test_print_json_parse() {
        let packet: ServerPacket = serde_json::from_value(json!({
            "cmd": "PrintJSON",
            "type": "ItemSend",
            "receiving": 1,
            "item": {"item": 1, "location": 2, "player": 2, "flags": 0},
            "data": [{"type": "player_id", "text": "2"}, {"text": " sent "}]
        }))
        .unwrap();

        assert_eq!(packet.command(), "PrintJSON");
        if let ServerPacket::PrintJson { kind, receiving, data, .. } = packet {
            assert_eq!(kind.as_deref(), Some("ItemSend"));
            assert_eq!(receiving, Some(SlotId(1)));
            assert_eq!(data.len(), 2);
        } else {
            panic!("Expected PrintJSON");
        }
    }

    #[test]
    fn test_room_update_partial_fields() {
        let packet: ServerPacket = serde_json::from_value(json!({
            "cmd": "RoomUpdate",
            "checked_locations": [13238272]
        }))
        .unwrap();

        if let ServerPacket::RoomUpdate {
            checked_locations,
            players,
            ..
        } = packet
        {
            assert_eq!(checked_locations, Some(vec![LocationId(0xCA0000)]));
            assert!(players.is_none());
        } else {
            panic!("Expected RoomUpdate");
        }
    }
}
