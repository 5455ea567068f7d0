//! Routing of server packets received after login

use c64ap_protocol::{DeathLinkData, ServerPacket, DEATH_LINK_TAG};
use serde_json::Value;
use tokio::sync::mpsc;

use super::{SessionEvent, Shared};

/// Apply one server packet to the shared state or forward it as an event
pub(crate) fn dispatch(
    packet: ServerPacket,
    shared: &Shared,
    events: &mpsc::UnboundedSender<SessionEvent>,
) {
    let event = match packet {
        ServerPacket::ReceivedItems { index, items } => {
            let added = shared.items.push_batch(index, &items);
            tracing::debug!(
                "Received {} item(s) at index {}, {} new",
                items.len(),
                index,
                added
            );
            None
        }
        ServerPacket::RoomUpdate {
            players,
            checked_locations,
            hint_points,
            permissions,
        } => {
            if let Some(checked) = &checked_locations {
                shared.collected.extend(checked);
            }
            Some(SessionEvent::RoomUpdate {
                players,
                checked_locations,
                hint_points,
                permissions,
            })
        }
        ServerPacket::Retrieved { keys } => {
            for (key, value) in &keys {
                store_value(shared, key, value);
            }
            // Only a read tells us whether we still have to add ourselves
            let presence = shared.presence.as_ref();
            presence
                .and_then(|p| keys.get(&p.roster_key()).map(|roster| p.lists_self(roster)))
                .filter(|listed| !listed)
                .map(|_| SessionEvent::JoinRoster)
        }
        ServerPacket::SetReply { key, value, .. } => {
            store_value(shared, &key, &value);
            None
        }
        ServerPacket::LocationInfo { locations } => Some(SessionEvent::LocationInfo(locations)),
        ServerPacket::DataPackage { data } => Some(SessionEvent::DataPackage(data)),
        ServerPacket::PrintJson {
            data,
            kind,
            receiving,
            item,
            ..
        } => Some(SessionEvent::Print {
            kind,
            receiving,
            item,
            data,
        }),
        ServerPacket::Bounced { tags, data, .. } => {
            if tags.iter().any(|t| t == DEATH_LINK_TAG) {
                match serde_json::from_value::<DeathLinkData>(data) {
                    Ok(death) => Some(SessionEvent::DeathLink(death)),
                    Err(e) => {
                        tracing::warn!("Malformed DeathLink bounce: {}", e);
                        None
                    }
                }
            } else {
                tracing::debug!("Ignoring bounce with tags {:?}", tags);
                None
            }
        }
        ServerPacket::InvalidPacket {
            kind,
            original_cmd,
            text,
        } => {
            tracing::warn!(
                "Server rejected {} ({}): {}",
                original_cmd.as_deref().unwrap_or("a packet"),
                kind,
                text
            );
            None
        }
        other => {
            tracing::debug!("Ignoring {} after login", other.command());
            None
        }
    };

    if let Some(event) = event {
        // The receiver only goes away with the session
        let _ = events.send(event);
    }
}

fn store_value(shared: &Shared, key: &str, value: &Value) {
    let Some(presence) = &shared.presence else {
        return;
    };

    if key == presence.roster_key() {
        presence.merge_roster(value);
    } else if presence.is_presence_key(key) {
        presence.store(key, value);
    } else {
        tracing::debug!("Ignoring data storage key {}", key);
    }
}
