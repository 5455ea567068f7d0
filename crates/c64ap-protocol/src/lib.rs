//! c64ap-protocol: Multiworld session wire protocol
//!
//! This crate defines the JSON packets exchanged between the Celeste 64
//! randomizer client and a multiworld coordination server over a websocket.

pub mod codec;
pub mod error;
pub mod ids;
pub mod packet;
pub mod types;

pub use codec::PacketCodec;
pub use error::ProtocolError;
pub use ids::{ItemId, LocationId, SlotId};
pub use packet::{ClientPacket, ServerPacket};
pub use types::{
    ClientStatus, DataPackageObject, DataStorageOperation, DeathLinkData, GameData,
    JsonMessagePart, NetworkItem, NetworkPlayer, NetworkSlot, NetworkVersion, Permission,
    RoomPermissions, DEATH_LINK_TAG, ITEMS_HANDLING_ALL,
};
