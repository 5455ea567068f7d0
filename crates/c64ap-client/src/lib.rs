//! c64ap-client: Multiworld session client for Celeste 64
//!
//! Connects a save to a multiworld server over a websocket. Received items
//! are applied to the save, completed objectives are reported back and
//! locations checked elsewhere are folded into the save. DeathLink and
//! player presence ride on the same session.
//!
//! The game drives everything from its simulation thread through
//! [`ConnectionManager::tick`]; network I/O happens on a background task.

pub mod deathlink;
pub mod error;
pub mod ingest;
pub mod message_log;
pub mod names;
pub mod presence;
pub mod reconcile;
pub mod reconnect;
pub mod session;
pub mod transport;

pub use deathlink::DeathLinkState;
pub use error::{ConnectionError, TransportError};
pub use message_log::MessageLog;
pub use names::{NameBook, GAME_NAME};
pub use reconcile::{CollectedChange, Reconciler};
pub use reconnect::ExponentialBackoff;
pub use session::{ConnectionManager, RoomState, TickReport, CLIENT_VERSION};
pub use transport::{Connector, Transport, WsConnector};
