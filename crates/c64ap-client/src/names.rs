//! Player, item and location names for display

use c64ap_core::tables;
use c64ap_protocol::{DataPackageObject, ItemId, LocationId, NetworkPlayer, NetworkSlot, SlotId};
use std::collections::HashMap;

/// Our game's name on the server
pub const GAME_NAME: &str = "Celeste 64";

/// Name lookups built from `Connected`, `RoomUpdate` and `DataPackage`
#[derive(Debug, Default, Clone)]
pub struct NameBook {
    players: HashMap<SlotId, NetworkPlayer>,
    slots: HashMap<SlotId, NetworkSlot>,
    /// Per game
    items: HashMap<String, HashMap<ItemId, String>>,
    locations: HashMap<String, HashMap<LocationId, String>>,
}

impl NameBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_players(&mut self, players: &[NetworkPlayer]) {
        for player in players {
            self.players.insert(player.slot, player.clone());
        }
    }

    /// Slot info is keyed by the slot number as a string on the wire
    pub fn set_slot_info(&mut self, slot_info: &HashMap<String, NetworkSlot>) {
        for (key, slot) in slot_info {
            match key.parse::<i64>() {
                Ok(id) => {
                    self.slots.insert(SlotId(id), slot.clone());
                }
                Err(_) => tracing::debug!("Ignoring slot info under key {:?}", key),
            }
        }
    }

    pub fn load_data_package(&mut self, package: &DataPackageObject) {
        for (game, data) in &package.games {
            self.items.insert(
                game.clone(),
                data.item_name_to_id
                    .iter()
                    .map(|(name, id)| (*id, name.clone()))
                    .collect(),
            );
            self.locations.insert(
                game.clone(),
                data.location_name_to_id
                    .iter()
                    .map(|(name, id)| (*id, name.clone()))
                    .collect(),
            );
        }
        tracing::debug!("Loaded names for {} game(s)", package.games.len());
    }

    fn game_of(&self, slot: SlotId) -> &str {
        self.slots
            .get(&slot)
            .map(|s| s.game.as_str())
            .unwrap_or(GAME_NAME)
    }

    /// Alias of a player; slot 0 is the server
    pub fn player_name(&self, slot: SlotId) -> String {
        if slot.is_server() {
            return "Archipelago".to_string();
        }
        match self.players.get(&slot) {
            Some(player) if !player.alias.is_empty() => player.alias.clone(),
            Some(player) if !player.name.is_empty() => player.name.clone(),
            _ => format!("Unknown Player {}", slot.as_i64()),
        }
    }

    /// Name of an item belonging to `owner`'s game
    pub fn item_name(&self, id: ItemId, owner: SlotId) -> String {
        let game = self.game_of(owner);
        self.items
            .get(game)
            .and_then(|names| names.get(&id))
            .cloned()
            .or_else(|| {
                (game == GAME_NAME)
                    .then(|| tables::items().name_of(id).map(str::to_string))
                    .flatten()
            })
            .unwrap_or_else(|| format!("Unknown Item {}", id.as_i64()))
    }

    /// Name of a location in `owner`'s world
    pub fn location_name(&self, id: LocationId, owner: SlotId) -> String {
        let game = self.game_of(owner);
        self.locations
            .get(game)
            .and_then(|names| names.get(&id))
            .cloned()
            .or_else(|| {
                (game == GAME_NAME)
                    .then(|| tables::locations().name_of(id).map(str::to_string))
                    .flatten()
            })
            .unwrap_or_else(|| format!("Unknown Location {}", id.as_i64()))
    }
}
