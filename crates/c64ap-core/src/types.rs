//! Core domain types

use c64ap_protocol::{ItemId, LocationId, NetworkItem, SlotId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One item grant, tagged with its position in the full received-item list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemEvent {
    /// Position in the received list, gapless from 0
    pub index: u64,
    pub item: ItemId,
    /// Player whose world the item was found in
    pub player: SlotId,
    pub location: LocationId,
    pub flags: u32,
}

impl ItemEvent {
    /// Tag a received network item with its list position
    pub fn from_network(index: u64, item: &NetworkItem) -> Self {
        Self {
            index,
            item: item.item,
            player: item.player,
            location: item.location,
            flags: item.flags,
        }
    }
}

/// Lifecycle state of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionState {
    /// No session
    #[default]
    Disconnected,
    /// Transport is being opened
    Connecting,
    /// Login sent, waiting for the server's answer
    Authenticating,
    /// Logged in and receiving events
    Ready,
    /// The last attempt failed; passes to `Disconnected` once torn down
    Failed,
}

impl SessionState {
    /// Whether the session can send and receive gameplay packets
    pub fn is_ready(&self) -> bool {
        matches!(self, SessionState::Ready)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Disconnected => write!(f, "disconnected"),
            SessionState::Connecting => write!(f, "connecting"),
            SessionState::Authenticating => write!(f, "authenticating"),
            SessionState::Ready => write!(f, "ready"),
            SessionState::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Default hair colour of another player's ghost
pub const GHOST_HAIR_COLOR: u32 = 0xdb2c00;

/// Transient position and appearance of a player, as stored remotely
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceRecord {
    pub name: String,
    /// Map or sub-map the player is currently in
    pub sublevel: String,
    pub facing: Vec2,
    pub position: Vec3,
    #[serde(default = "default_hair_color")]
    pub hair_color: u32,
}

fn default_hair_color() -> u32 {
    GHOST_HAIR_COLOR
}

impl PresenceRecord {
    /// Whether the ghost should be drawn in the given sublevel
    pub fn is_in(&self, sublevel: &str) -> bool {
        self.sublevel == sublevel
    }

    /// Whether every coordinate can be stored as a JSON number
    pub fn is_finite(&self) -> bool {
        [
            self.facing.x,
            self.facing.y,
            self.position.x,
            self.position.y,
            self.position.z,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_state_display() {
        assert_eq!(format!("{}", SessionState::Ready), "ready");
        assert_eq!(format!("{}", SessionState::Disconnected), "disconnected");
        assert!(!SessionState::Authenticating.is_ready());
    }

    #[test]
    fn test_presence_record_defaults_hair_color() {
        let record: PresenceRecord = serde_json::from_str(
            r#"{
                "name": "Theo",
                "sublevel": "Forsaken City",
                "facing": {"x": 0.0, "y": 1.0},
                "position": {"x": 10.0, "y": 20.0, "z": 30.0}
            }"#,
        )
        .unwrap();

        assert_eq!(record.hair_color, GHOST_HAIR_COLOR);
        assert!(record.is_in("Forsaken City"));
        assert_eq!(record.position, Vec3::new(10.0, 20.0, 30.0));
    }

    #[test]
    fn test_item_event_from_network() {
        let item = NetworkItem {
            item: ItemId(0xCA0000),
            location: LocationId(7),
            player: SlotId(2),
            flags: 1,
        };
        let event = ItemEvent::from_network(4, &item);
        assert_eq!(event.index, 4);
        assert_eq!(event.player, SlotId(2));
    }
}
