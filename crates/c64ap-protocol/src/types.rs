//! Value types carried inside packets

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::ids::{ItemId, LocationId, SlotId};

/// Item-handling bits sent during login: receive items from other worlds,
/// from our own world, and our starting inventory.
pub const ITEMS_HANDLING_ALL: u8 = 0b111;

/// Tag that marks a client (and a bounce) as taking part in DeathLink
pub const DEATH_LINK_TAG: &str = "DeathLink";

/// Semantic version triple as the server expects it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkVersion {
    pub major: u32,
    pub minor: u32,
    pub build: u32,
    #[serde(rename = "class", skip_deserializing, default = "NetworkVersion::class_name")]
    class: &'static str,
}

impl NetworkVersion {
    /// Create a new version triple
    pub const fn new(major: u32, minor: u32, build: u32) -> Self {
        Self {
            major,
            minor,
            build,
            class: "Version",
        }
    }

    fn class_name() -> &'static str {
        "Version"
    }
}

impl std::fmt::Display for NetworkVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.build)
    }
}

/// An item placed at a location, owned by a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkItem {
    pub item: ItemId,
    pub location: LocationId,
    /// For received items this is the finding player; for scouts, the owner
    pub player: SlotId,
    #[serde(default)]
    pub flags: u32,
}

impl NetworkItem {
    pub const FLAG_PROGRESSION: u32 = 0b001;
    pub const FLAG_USEFUL: u32 = 0b010;
    pub const FLAG_TRAP: u32 = 0b100;

    /// Whether the item unlocks progression
    pub fn is_progression(&self) -> bool {
        self.flags & Self::FLAG_PROGRESSION != 0
    }

    /// Whether the item is a trap
    pub fn is_trap(&self) -> bool {
        self.flags & Self::FLAG_TRAP != 0
    }
}

/// A connected (or configured) player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkPlayer {
    pub team: i64,
    pub slot: SlotId,
    pub alias: String,
    pub name: String,
}

/// Static information about a slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSlot {
    pub name: String,
    pub game: String,
    #[serde(rename = "type", default)]
    pub kind: u8,
    #[serde(default)]
    pub group_members: Vec<SlotId>,
}

/// One styled fragment of a server print message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonMessagePart {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<SlotId>,
}

/// Room permission level for collect/release/remaining commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum Permission {
    #[default]
    Disabled,
    Enabled,
    Goal,
    Auto,
    AutoEnabled,
}

impl Permission {
    /// Whether the command is usable at all (now or after goal)
    pub fn is_allowed(&self) -> bool {
        matches!(self, Permission::Enabled | Permission::Goal)
    }
}

impl From<u8> for Permission {
    fn from(value: u8) -> Self {
        match value {
            0b001 => Permission::Enabled,
            0b010 => Permission::Goal,
            0b110 => Permission::Auto,
            0b111 => Permission::AutoEnabled,
            _ => Permission::Disabled,
        }
    }
}

impl From<Permission> for u8 {
    fn from(value: Permission) -> Self {
        match value {
            Permission::Disabled => 0,
            Permission::Enabled => 0b001,
            Permission::Goal => 0b010,
            Permission::Auto => 0b110,
            Permission::AutoEnabled => 0b111,
        }
    }
}

/// Permissions advertised by the room
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomPermissions {
    #[serde(default)]
    pub release: Permission,
    #[serde(default)]
    pub collect: Permission,
    #[serde(default)]
    pub remaining: Permission,
}

/// Client progress status reported via `StatusUpdate`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ClientStatus {
    Unknown,
    Connected,
    Ready,
    Playing,
    Goal,
}

impl TryFrom<u8> for ClientStatus {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ClientStatus::Unknown),
            5 => Ok(ClientStatus::Connected),
            10 => Ok(ClientStatus::Ready),
            20 => Ok(ClientStatus::Playing),
            30 => Ok(ClientStatus::Goal),
            other => Err(format!("unknown client status {}", other)),
        }
    }
}

impl From<ClientStatus> for u8 {
    fn from(value: ClientStatus) -> Self {
        match value {
            ClientStatus::Unknown => 0,
            ClientStatus::Connected => 5,
            ClientStatus::Ready => 10,
            ClientStatus::Playing => 20,
            ClientStatus::Goal => 30,
        }
    }
}

/// A single mutation applied by a data-storage `Set`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataStorageOperation {
    pub operation: String,
    pub value: Value,
}

impl DataStorageOperation {
    /// Overwrite the stored value
    pub fn replace(value: Value) -> Self {
        Self {
            operation: "replace".to_string(),
            value,
        }
    }

    /// Set the value only if the key does not exist yet
    pub fn default_value() -> Self {
        Self {
            operation: "default".to_string(),
            value: Value::Null,
        }
    }

    /// Add to a number or append to a list
    pub fn add(value: Value) -> Self {
        Self {
            operation: "add".to_string(),
            value,
        }
    }

    /// Remove a value from a list
    pub fn remove(value: Value) -> Self {
        Self {
            operation: "remove".to_string(),
            value,
        }
    }
}

/// Name tables for one game
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameData {
    #[serde(default)]
    pub item_name_to_id: HashMap<String, ItemId>,
    #[serde(default)]
    pub location_name_to_id: HashMap<String, LocationId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

/// Name tables for every requested game
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataPackageObject {
    #[serde(default)]
    pub games: HashMap<String, GameData>,
}

/// Payload of a DeathLink bounce
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeathLinkData {
    /// Unix time in seconds when the death happened
    pub time: f64,
    /// Alias of the player who died
    pub source: String,
    #[serde(default)]
    pub cause: Option<String>,
}
