//! Session with the multiworld server
//!
//! [`ConnectionManager`] owns the login handshake and the lifecycle. Once
//! ready, a pump task moves frames between the transport and the
//! simulation thread:
//!
//! - item grants, checked locations and presence replies are written
//!   straight into [`Shared`]
//! - everything else is forwarded as a [`SessionEvent`] and handled on the
//!   next [`ConnectionManager::tick`]
//! - outbound packets are queued without blocking and sent by the pump

mod dispatch;
mod manager;
mod pump;

pub use manager::{ConnectionManager, RoomState, TickReport, CLIENT_VERSION};

use c64ap_protocol::{
    DataPackageObject, DeathLinkData, JsonMessagePart, LocationId, NetworkItem, NetworkPlayer,
    RoomPermissions, SlotId,
};

use crate::ingest::{CollectedLocations, ItemQueue};
use crate::presence::PresenceStore;

/// State written by the pump and read by the simulation thread
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) items: ItemQueue,
    pub(crate) collected: CollectedLocations,
    /// Present only when presence is enabled
    pub(crate) presence: Option<PresenceStore>,
}

/// Server notifications handed to the simulation thread
#[derive(Debug, Clone)]
pub(crate) enum SessionEvent {
    RoomUpdate {
        players: Option<Vec<NetworkPlayer>>,
        checked_locations: Option<Vec<LocationId>>,
        hint_points: Option<i64>,
        permissions: Option<RoomPermissions>,
    },
    LocationInfo(Vec<NetworkItem>),
    DataPackage(DataPackageObject),
    Print {
        kind: Option<String>,
        receiving: Option<SlotId>,
        item: Option<NetworkItem>,
        data: Vec<JsonMessagePart>,
    },
    DeathLink(DeathLinkData),
    /// The roster we read does not list us yet
    JoinRoster,
}
