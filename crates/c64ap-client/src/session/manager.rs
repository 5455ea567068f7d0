//! Connection manager
//!
//! Drives one session at a time: open the transport, wait for the room
//! information, log in, parse the slot settings and start the pump. After
//! that every call is made from the simulation thread and never waits on
//! the network.

use c64ap_core::tables::STRAWBERRIES_FLAG;
use c64ap_core::{ConnectionConfig, ItemEvent, PresenceRecord, SaveRecord, SessionState, SlotSettings};
use c64ap_protocol::{
    ClientPacket, ClientStatus, DataStorageOperation, DeathLinkData, ItemId, LocationId,
    NetworkItem, NetworkPlayer, NetworkSlot, NetworkVersion, PacketCodec, RoomPermissions,
    ServerPacket, SlotId, DEATH_LINK_TAG, ITEMS_HANDLING_ALL,
};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::dispatch::dispatch;
use super::{pump, SessionEvent, Shared};
use crate::deathlink::DeathLinkState;
use crate::error::ConnectionError;
use crate::ingest::{CollectedLocations, ItemQueue};
use crate::message_log::MessageLog;
use crate::names::{NameBook, GAME_NAME};
use crate::presence::PresenceStore;
use crate::reconcile::{CollectedChange, Reconciler, ServerLocations};
use crate::transport::{Connector, Transport, WsConnector};

/// Protocol version we announce at login
pub const CLIENT_VERSION: NetworkVersion = NetworkVersion::new(0, 4, 3);

const DEFAULT_LOG_CAPACITY: usize = 8;
const DEFAULT_LOG_FRAMES: u32 = 300;
const DEFAULT_PRESENCE_POLL_TICKS: u64 = 6;

/// Room-wide information from `RoomInfo` and later `RoomUpdate`s
#[derive(Debug, Clone, Default)]
pub struct RoomState {
    pub seed: String,
    pub server_version: Option<NetworkVersion>,
    pub permissions: RoomPermissions,
    pub hint_cost: i64,
    pub hint_points: i64,
    pub games: Vec<String>,
    pub password_required: bool,
}

/// What one tick changed
#[derive(Debug, Default)]
pub struct TickReport {
    /// Item grants applied to the save, in index order
    pub items: Vec<ItemEvent>,
    /// Save changes from locations checked elsewhere
    pub collected: Vec<CollectedChange>,
    /// Locations sent in this tick's `LocationChecks`
    pub reported: Vec<LocationId>,
    /// A death to apply to the local player
    pub death_link: Option<DeathLinkData>,
    pub goal_sent: bool,
    /// Lines added to the message log
    pub messages: Vec<String>,
    /// The session was lost since the last tick
    pub disconnected: bool,
}

/// Everything `Connected` told us
struct Login {
    room: RoomState,
    team: i64,
    slot: SlotId,
    players: Vec<NetworkPlayer>,
    slot_info: HashMap<String, NetworkSlot>,
    missing_locations: Vec<LocationId>,
    checked_locations: Vec<LocationId>,
    settings: SlotSettings,
    /// Packets that arrived in the same frames after `Connected`
    leftover: Vec<ServerPacket>,
}

struct ActiveSession {
    cancel: CancellationToken,
    outbound: mpsc::UnboundedSender<ClientPacket>,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    shared: Arc<Shared>,
    team: i64,
    slot: SlotId,
    alias: String,
    settings: SlotSettings,
    room: RoomState,
    names: NameBook,
    known_locations: HashSet<LocationId>,
    server_checked: HashSet<LocationId>,
    location_items: HashMap<LocationId, NetworkItem>,
    reconciler: Reconciler,
    death_link: DeathLinkState,
    goal_sent: bool,
    /// Our name was added to the roster during this session
    roster_joined: bool,
    ticks: u64,
}

impl ActiveSession {
    /// Queue a packet for the pump. A closed queue means the pump is gone,
    /// so the session is cancelled; the next tick tears it down.
    fn send(&self, packet: ClientPacket) -> bool {
        let command = packet.command();
        if self.outbound.send(packet).is_err() {
            tracing::warn!("Connection lost while sending {}", command);
            self.cancel.cancel();
            return false;
        }
        true
    }

    /// Apply one event; returns a line for the message log, if any
    fn handle_event(&mut self, event: SessionEvent) -> Option<String> {
        match event {
            SessionEvent::RoomUpdate {
                players,
                checked_locations,
                hint_points,
                permissions,
            } => {
                if let Some(players) = players {
                    self.names.set_players(&players);
                }
                if let Some(checked) = checked_locations {
                    self.server_checked.extend(checked);
                }
                if let Some(points) = hint_points {
                    self.room.hint_points = points;
                }
                if let Some(permissions) = permissions {
                    self.room.permissions = permissions;
                }
            }
            SessionEvent::LocationInfo(items) => {
                for item in items {
                    self.location_items.insert(item.location, item);
                }
            }
            SessionEvent::DataPackage(package) => self.names.load_data_package(&package),
            SessionEvent::Print {
                kind,
                receiving,
                item,
                data,
            } => {
                let text: String = data.iter().filter_map(|part| part.text.as_deref()).collect();
                tracing::debug!("Server message: {}", text);

                // Only items other players found for us are shown
                if kind.as_deref() != Some("ItemSend") || receiving != Some(self.slot) {
                    return None;
                }
                let item = item.filter(|item| item.player != self.slot)?;

                return Some(format!(
                    "{} sent you {} ({})",
                    self.names.player_name(item.player),
                    self.names.item_name(item.item, self.slot),
                    self.names.location_name(item.location, item.player),
                ));
            }
            SessionEvent::DeathLink(death) => self.death_link.on_received(death),
            SessionEvent::JoinRoster => self.join_roster(),
        }
        None
    }

    /// Add our name to the roster, at most once per session
    fn join_roster(&mut self) {
        let Some(presence) = &self.shared.presence else {
            return;
        };
        if self.roster_joined {
            return;
        }
        let packet = ClientPacket::Set {
            key: presence.roster_key(),
            default: json!([]),
            want_reply: false,
            operations: vec![DataStorageOperation::add(json!([presence.own_name()]))],
        };
        self.roster_joined = self.send(packet);
    }

    fn send_death_link_tags(&self) -> bool {
        let tags = if self.death_link.is_enabled() {
            vec![DEATH_LINK_TAG.to_string()]
        } else {
            Vec::new()
        };
        self.send(ClientPacket::ConnectUpdate {
            items_handling: ITEMS_HANDLING_ALL,
            tags,
        })
    }

    fn request_presence_data(&self) -> bool {
        let Some(presence) = &self.shared.presence else {
            return false;
        };
        let keys = presence.poll_keys();
        if keys.is_empty() {
            return false;
        }
        self.send(ClientPacket::Get { keys })
    }
}

/// One session with the multiworld server
pub struct ConnectionManager {
    config: ConnectionConfig,
    connector: Arc<dyn Connector>,
    codec: PacketCodec,
    state: SessionState,
    session: Option<ActiveSession>,
    message_log: MessageLog,
    presence_poll_ticks: u64,
    /// Used for lookups while disconnected
    empty_names: NameBook,
}

impl ConnectionManager {
    pub fn new(config: ConnectionConfig, connector: Arc<dyn Connector>) -> Self {
        Self {
            config,
            connector,
            codec: PacketCodec::new(),
            state: SessionState::Disconnected,
            session: None,
            message_log: MessageLog::new(DEFAULT_LOG_CAPACITY, DEFAULT_LOG_FRAMES),
            presence_poll_ticks: DEFAULT_PRESENCE_POLL_TICKS,
            empty_names: NameBook::new(),
        }
    }

    /// A manager that connects over websockets
    pub fn websocket(config: ConnectionConfig) -> Self {
        Self::new(config, Arc::new(WsConnector::new()))
    }

    pub fn with_message_log(mut self, log: MessageLog) -> Self {
        self.message_log = log;
        self
    }

    /// Poll presence every `ticks` ticks; 0 turns polling off
    pub fn with_presence_poll_ticks(mut self, ticks: u64) -> Self {
        self.presence_poll_ticks = ticks;
        self
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        match &self.session {
            Some(session) if session.cancel.is_cancelled() => SessionState::Disconnected,
            _ => self.state,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state().is_ready()
    }

    /// Connect and log in.
    ///
    /// Any current session is dropped first. On failure the manager is back
    /// in `Disconnected` before this returns. There is no timeout here;
    /// callers that want one wrap this future.
    pub async fn connect(&mut self) -> Result<(), ConnectionError> {
        self.disconnect();

        match self.try_connect().await {
            Ok(session) => {
                tracing::info!(
                    "Connected to {} as {} (slot {}, team {})",
                    self.config.url,
                    session.alias,
                    session.slot.as_i64(),
                    session.team
                );
                self.session = Some(session);
                self.state = SessionState::Ready;
                Ok(())
            }
            Err(e) => {
                self.state = SessionState::Failed;
                tracing::warn!("Connection to {} failed: {}", self.config.url, e);
                self.state = SessionState::Disconnected;
                Err(e)
            }
        }
    }

    async fn try_connect(&mut self) -> Result<ActiveSession, ConnectionError> {
        self.state = SessionState::Connecting;
        let mut transport = self.connector.connect(&self.config.url).await?;

        match self.login(transport.as_mut()).await {
            Ok(login) => Ok(self.start_session(transport, login)),
            Err(e) => {
                transport.close().await;
                Err(e)
            }
        }
    }

    async fn recv_packets(&self, transport: &mut dyn Transport) -> Result<Vec<ServerPacket>, ConnectionError> {
        match transport.recv().await {
            Some(Ok(frame)) => Ok(self.codec.decode(&frame)?),
            Some(Err(e)) => Err(e.into()),
            None => Err(ConnectionError::Handshake(
                "server closed the connection during login".to_string(),
            )),
        }
    }

    async fn login(&mut self, transport: &mut dyn Transport) -> Result<Login, ConnectionError> {
        let mut room = None;
        while room.is_none() {
            for packet in self.recv_packets(transport).await? {
                match packet {
                    ServerPacket::RoomInfo {
                        version,
                        password,
                        permissions,
                        hint_cost,
                        games,
                        seed_name,
                        ..
                    } if room.is_none() => {
                        tracing::debug!("Room {} on server {}", seed_name, version);
                        room = Some(RoomState {
                            seed: seed_name,
                            server_version: Some(version),
                            permissions,
                            hint_cost,
                            hint_points: 0,
                            games,
                            password_required: password,
                        });
                    }
                    other => tracing::debug!("Ignoring {} before RoomInfo", other.command()),
                }
            }
        }
        let mut room = room.unwrap_or_default();

        if room.password_required && self.config.password.is_empty() {
            tracing::warn!("Room requires a password but none is configured");
        }

        self.state = SessionState::Authenticating;
        let connect = ClientPacket::Connect {
            password: self.config.password.clone(),
            game: GAME_NAME.to_string(),
            name: self.config.slot.clone(),
            uuid: uuid::Uuid::new_v4().to_string(),
            version: CLIENT_VERSION,
            items_handling: ITEMS_HANDLING_ALL,
            tags: Vec::new(),
            slot_data: true,
        };
        transport.send(self.codec.encode(&[connect])?).await?;

        let mut login: Option<Login> = None;
        while login.is_none() {
            for packet in self.recv_packets(transport).await? {
                if let Some(login) = login.as_mut() {
                    login.leftover.push(packet);
                    continue;
                }
                match packet {
                    ServerPacket::Connected {
                        team,
                        slot,
                        players,
                        missing_locations,
                        checked_locations,
                        slot_data,
                        slot_info,
                        hint_points,
                    } => {
                        let settings = SlotSettings::from_slot_data(&slot_data)?;
                        tracing::debug!(?settings, "Slot settings");
                        room.hint_points = hint_points;
                        login = Some(Login {
                            room: room.clone(),
                            team,
                            slot,
                            players,
                            slot_info,
                            missing_locations,
                            checked_locations,
                            settings,
                            leftover: Vec::new(),
                        });
                    }
                    ServerPacket::ConnectionRefused { errors } => {
                        return Err(ConnectionError::Auth { reasons: errors });
                    }
                    other => tracing::debug!("Ignoring {} during login", other.command()),
                }
            }
        }

        login.ok_or_else(|| ConnectionError::Handshake("no Connected packet".to_string()))
    }

    fn start_session(&mut self, transport: Box<dyn Transport>, login: Login) -> ActiveSession {
        let presence = self
            .config
            .presence
            .then(|| PresenceStore::new(login.team, self.config.slot.clone()));
        let shared = Arc::new(Shared {
            items: ItemQueue::new(),
            collected: CollectedLocations::new(),
            presence,
        });
        shared.collected.extend(&login.checked_locations);

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        for packet in login.leftover {
            dispatch(packet, &shared, &event_tx);
        }

        let cancel = CancellationToken::new();
        tokio::spawn(pump::run(
            transport,
            outbound_rx,
            Arc::clone(&shared),
            event_tx,
            cancel.clone(),
        ));

        let mut names = NameBook::new();
        names.set_players(&login.players);
        names.set_slot_info(&login.slot_info);
        let alias = names.player_name(login.slot);

        let known_locations: HashSet<LocationId> = login
            .missing_locations
            .iter()
            .chain(login.checked_locations.iter())
            .copied()
            .collect();
        let server_checked = login.checked_locations.iter().copied().collect();

        let settings = login.settings;
        let session = ActiveSession {
            cancel,
            outbound: outbound_tx,
            events: event_rx,
            shared,
            team: login.team,
            slot: login.slot,
            alias,
            death_link: DeathLinkState::new(settings.death_link, settings.death_link_amnesty),
            settings,
            room: login.room,
            names,
            known_locations,
            server_checked,
            location_items: HashMap::new(),
            reconciler: Reconciler::new(),
            goal_sent: false,
            roster_joined: false,
            ticks: 0,
        };

        if session.death_link.is_enabled() {
            session.send_death_link_tags();
        }

        // The name is added once the roster read shows it missing
        if let Some(presence) = &session.shared.presence {
            let roster = presence.roster_key();
            session.send(ClientPacket::SetNotify {
                keys: vec![roster.clone()],
            });
            session.send(ClientPacket::Get { keys: vec![roster] });
        }

        session.send(ClientPacket::GetDataPackage {
            games: session.room.games.clone(),
        });

        if !session.known_locations.is_empty() {
            let mut locations: Vec<_> = session.known_locations.iter().copied().collect();
            locations.sort();
            session.send(ClientPacket::LocationScouts {
                locations,
                create_as_hint: 0,
            });
        }

        session
    }

    /// Drop the session. Safe to call in any state, any number of times.
    ///
    /// The pump closes the transport on its own; nothing is awaited here.
    pub fn disconnect(&mut self) {
        if let Some(session) = self.session.take() {
            session.cancel.cancel();
            tracing::info!("Disconnected from {}", self.config.url);
        }
        self.state = SessionState::Disconnected;
    }

    /// Run one simulation-thread pass against the save.
    pub fn tick(&mut self, save: &mut dyn SaveRecord) -> TickReport {
        let mut report = TickReport::default();

        if self
            .session
            .as_ref()
            .is_some_and(|s| s.cancel.is_cancelled())
        {
            tracing::warn!("Lost connection to {}", self.config.url);
            self.disconnect();
            report.disconnected = true;
            return report;
        }

        let Some(session) = self.session.as_mut() else {
            return report;
        };

        while let Ok(event) = session.events.try_recv() {
            if let Some(line) = session.handle_event(event) {
                self.message_log.push(line.clone());
                report.messages.push(line);
            }
        }

        report.items = session
            .reconciler
            .apply_received_items(save, &session.shared.items);
        report.collected = session
            .reconciler
            .fold_collected(save, &session.shared.collected);

        let server = ServerLocations {
            known: &session.known_locations,
            checked: &session.server_checked,
        };
        let batch = session
            .reconciler
            .report_completed(save, &session.settings, server);
        if !batch.is_empty() {
            session.server_checked.extend(batch.iter().copied());
            session.send(ClientPacket::LocationChecks {
                locations: batch.clone(),
            });
            report.reported = batch;
        }

        let strawberries = u32::try_from(save.get_flag(STRAWBERRIES_FLAG)).unwrap_or(0);
        if !session.goal_sent
            && session.settings.strawberries_required > 0
            && session.settings.goal_reached(strawberries)
        {
            tracing::info!("Goal reached with {} strawberries", strawberries);
            session.goal_sent = session.send(ClientPacket::StatusUpdate {
                status: ClientStatus::Goal,
            });
            report.goal_sent = session.goal_sent;
        }

        report.death_link = session.death_link.take_received();

        session.ticks += 1;
        if self.presence_poll_ticks > 0 && session.ticks % self.presence_poll_ticks == 0 {
            session.request_presence_data();
        }

        report
    }

    /// Slot settings of the current session
    pub fn settings(&self) -> Option<&SlotSettings> {
        self.session.as_ref().map(|s| &s.settings)
    }

    pub fn room(&self) -> Option<&RoomState> {
        self.session.as_ref().map(|s| &s.room)
    }

    pub fn slot(&self) -> Option<SlotId> {
        self.session.as_ref().map(|s| s.slot)
    }

    pub fn team(&self) -> Option<i64> {
        self.session.as_ref().map(|s| s.team)
    }

    pub fn seed(&self) -> Option<&str> {
        self.room().map(|r| r.seed.as_str())
    }

    /// Message log for on-screen rendering
    pub fn messages(&mut self) -> &mut MessageLog {
        &mut self.message_log
    }

    fn names(&self) -> &NameBook {
        self.session
            .as_ref()
            .map(|s| &s.names)
            .unwrap_or(&self.empty_names)
    }

    pub fn player_name(&self, slot: SlotId) -> String {
        self.names().player_name(slot)
    }

    /// Name of an item from our own game
    pub fn item_name(&self, item: ItemId) -> String {
        let owner = self.slot().unwrap_or(SlotId(1));
        self.names().item_name(item, owner)
    }

    /// Name of a location in our own world
    pub fn location_name(&self, location: LocationId) -> String {
        let owner = self.slot().unwrap_or(SlotId(1));
        self.names().location_name(location, owner)
    }

    pub fn can_collect(&self) -> bool {
        self.room().is_some_and(|r| r.permissions.collect.is_allowed())
    }

    pub fn can_release(&self) -> bool {
        self.room().is_some_and(|r| r.permissions.release.is_allowed())
    }

    pub fn can_remaining(&self) -> bool {
        self.room().is_some_and(|r| r.permissions.remaining.is_allowed())
    }

    /// Whether the server has a location as checked.
    ///
    /// Locations not part of our slot count as checked.
    pub fn is_location_checked(&self, location: LocationId) -> bool {
        match &self.session {
            Some(s) => {
                !s.known_locations.contains(&location) || s.server_checked.contains(&location)
            }
            None => false,
        }
    }

    /// The item placed at one of our locations, once scouted
    pub fn location_item(&self, location: LocationId) -> Option<NetworkItem> {
        self.session
            .as_ref()
            .and_then(|s| s.location_items.get(&location).copied())
    }

    fn send(&self, packet: ClientPacket) -> Result<(), ConnectionError> {
        match &self.session {
            Some(session) if session.send(packet) => Ok(()),
            _ => Err(ConnectionError::NotConnected),
        }
    }

    /// Send a chat message
    pub fn say(&mut self, text: impl Into<String>) -> Result<(), ConnectionError> {
        self.send(ClientPacket::Say { text: text.into() })
    }

    /// Report the goal as completed
    pub fn send_goal(&mut self) -> Result<(), ConnectionError> {
        self.send(ClientPacket::StatusUpdate {
            status: ClientStatus::Goal,
        })?;
        if let Some(session) = self.session.as_mut() {
            session.goal_sent = true;
        }
        Ok(())
    }

    /// Ask the server to resend every received item
    pub fn resync(&mut self) -> Result<(), ConnectionError> {
        self.send(ClientPacket::Sync)
    }

    /// Count a local death; broadcasts once the amnesty is used up.
    ///
    /// Returns true if a DeathLink was sent.
    pub fn send_death_link(&mut self, cause: &str) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let now = c64ap_core::time::unix_time_secs_f64();
        let Some(death) = session.death_link.record_local_death(&session.alias, cause, now) else {
            return false;
        };

        let data = match serde_json::to_value(&death) {
            Ok(data) => data,
            Err(e) => {
                tracing::error!("Failed to encode DeathLink: {}", e);
                return false;
            }
        };

        tracing::info!("Sending DeathLink: {}", death.cause.as_deref().unwrap_or_default());
        session.send(ClientPacket::Bounce {
            games: Vec::new(),
            slots: Vec::new(),
            tags: vec![DEATH_LINK_TAG.to_string()],
            data,
        })
    }

    pub fn death_link_enabled(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.death_link.is_enabled())
    }

    /// Turn DeathLink on or off for this session and tell the server
    pub fn set_death_link(&mut self, enabled: bool) -> Result<(), ConnectionError> {
        let session = self.session.as_mut().ok_or(ConnectionError::NotConnected)?;
        session.death_link.set_enabled(enabled);
        if session.send_death_link_tags() {
            Ok(())
        } else {
            Err(ConnectionError::NotConnected)
        }
    }

    /// While safe, received deaths are ignored
    pub fn set_death_link_safe(&mut self, safe: bool) {
        if let Some(session) = self.session.as_mut() {
            session.death_link.set_safe(safe);
        }
    }

    /// Deaths absorbed toward the next broadcast, and the amnesty
    pub fn death_link_amnesty(&self) -> (u32, u32) {
        self.session
            .as_ref()
            .map(|s| s.death_link.amnesty_progress())
            .unwrap_or_default()
    }

    /// Write our presence record
    ///
    /// Records with non-finite coordinates are skipped; they would be
    /// stored as nulls that other clients cannot read.
    pub fn publish_local_presence(&mut self, record: &PresenceRecord) -> Result<(), ConnectionError> {
        let session = self.session.as_ref().ok_or(ConnectionError::NotConnected)?;
        let Some(presence) = &session.shared.presence else {
            return Ok(());
        };

        if !record.is_finite() {
            tracing::warn!("Not publishing presence with non-finite position");
            return Ok(());
        }
        let value = match serde_json::to_value(record) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to encode presence: {}", e);
                return Err(ConnectionError::Protocol(e.into()));
            }
        };
        let packet = ClientPacket::Set {
            key: presence.own_key(),
            default: Value::Null,
            want_reply: false,
            operations: vec![DataStorageOperation::replace(value)],
        };
        self.send(packet)
    }

    /// Read the records of every tracked player in one request
    pub fn request_presence_data(&mut self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.request_presence_data())
    }

    /// Latest records of other players
    pub fn presence_records(&self) -> Vec<PresenceRecord> {
        self.session
            .as_ref()
            .and_then(|s| s.shared.presence.as_ref())
            .map(|p| p.records())
            .unwrap_or_default()
    }

    pub fn tracked_players(&self) -> Vec<String> {
        self.session
            .as_ref()
            .and_then(|s| s.shared.presence.as_ref())
            .map(|p| p.tracked())
            .unwrap_or_default()
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.disconnect();
    }
}
