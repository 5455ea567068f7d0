//! Static id tables for Celeste 64 items and locations
//!
//! Both tables are built once on first use and are read-only afterwards.
//! Location ids are partitioned into fixed category ranges; item ids map to
//! the save flag they change.

use c64ap_protocol::{ItemId, LocationId};
use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

/// First id used by the game's items and locations
pub const BASE_ID: i64 = 0xCA0000;

/// Save flag holding the number of item grants already applied
pub const ITEM_RECEIVED_FLAG: &str = "ItemRcv";

/// Save flag counting received strawberries
pub const STRAWBERRIES_FLAG: &str = "Strawberries";

/// Checkpoints in the order they appear in the map
pub const CHECKPOINTS: [&str; 10] = [
    "Intro",
    "Granny",
    "South-East Tower",
    "Climb Sign",
    "North-East Tower",
    "Stepping Stones",
    "Feather Maze",
    "Double Dash House",
    "Badeline Tower",
    "Badeline Island",
];

const STRAWBERRY_COUNT: i64 = 30;
const FRIENDS: [&str; 4] = ["Granny", "Theo", "Oshiro", "Badeline"];
const SIGN_COUNT: i64 = 5;
const CARS: [(&str, &str); 2] = [
    ("Car - Centre Island", "Car_Centre_Island"),
    ("Car - Secret Island", "Car_Secret_Island"),
];

/// Location kind, decided by which id range the location falls in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationCategory {
    Strawberry,
    Friend,
    Sign,
    Car,
    Checkpoint,
}

impl LocationCategory {
    const RANGE: i64 = 0x100;

    /// Classify a location id by its numeric range
    pub fn of(id: LocationId) -> Option<Self> {
        let offset = id.as_i64() - BASE_ID;
        if offset < 0 {
            return None;
        }
        match offset / Self::RANGE {
            0 => Some(LocationCategory::Strawberry),
            1 => Some(LocationCategory::Friend),
            2 => Some(LocationCategory::Sign),
            3 => Some(LocationCategory::Car),
            4 => Some(LocationCategory::Checkpoint),
            _ => None,
        }
    }

    fn base(self) -> i64 {
        let slot = match self {
            LocationCategory::Strawberry => 0,
            LocationCategory::Friend => 1,
            LocationCategory::Sign => 2,
            LocationCategory::Car => 3,
            LocationCategory::Checkpoint => 4,
        };
        BASE_ID + slot * Self::RANGE
    }
}

/// A completable objective
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationEntry {
    pub id: LocationId,
    pub name: String,
    pub category: LocationCategory,
    /// Strawberry id for strawberries, save flag for everything else
    pub flag: String,
}

/// What an item grant does to the save
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemEffect {
    /// Add one to a counter flag
    Increment(String),
    /// Set a flag to 1
    Set(String),
}

impl ItemEffect {
    /// Flag the effect touches
    pub fn flag(&self) -> &str {
        match self {
            ItemEffect::Increment(flag) | ItemEffect::Set(flag) => flag,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemEntry {
    pub id: ItemId,
    pub name: String,
    pub effect: ItemEffect,
}

/// Bidirectional location id/name table
#[derive(Debug)]
pub struct LocationTable {
    /// Sorted by id
    entries: Vec<LocationEntry>,
    by_id: HashMap<LocationId, usize>,
    by_name: HashMap<String, LocationId>,
}

impl LocationTable {
    fn build() -> Self {
        let mut entries = Vec::new();

        // Strawberry "1/10" is 0xCA0010: the decimal index is read as hex digits
        for n in 0..STRAWBERRY_COUNT {
            let offset = i64::from_str_radix(&n.to_string(), 16).unwrap_or(n);
            let name = format!("1/{}", n);
            entries.push(LocationEntry {
                id: LocationId(LocationCategory::Strawberry.base() + offset),
                flag: name.clone(),
                name,
                category: LocationCategory::Strawberry,
            });
        }

        for (i, friend) in FRIENDS.iter().enumerate() {
            entries.push(LocationEntry {
                id: LocationId(LocationCategory::Friend.base() + i as i64),
                name: format!("Friend - {}", friend),
                category: LocationCategory::Friend,
                flag: format!("Friend_{}", friend),
            });
        }

        for n in 1..=SIGN_COUNT {
            entries.push(LocationEntry {
                id: LocationId(LocationCategory::Sign.base() + n - 1),
                name: format!("Sign {}", n),
                category: LocationCategory::Sign,
                flag: format!("Sign_{}", n),
            });
        }

        for (i, (name, flag)) in CARS.iter().enumerate() {
            entries.push(LocationEntry {
                id: LocationId(LocationCategory::Car.base() + i as i64),
                name: name.to_string(),
                category: LocationCategory::Car,
                flag: flag.to_string(),
            });
        }

        for (i, checkpoint) in CHECKPOINTS.iter().enumerate() {
            entries.push(LocationEntry {
                id: LocationId(LocationCategory::Checkpoint.base() + i as i64),
                name: format!("Checkpoint - {}", checkpoint),
                category: LocationCategory::Checkpoint,
                flag: checkpoint.to_string(),
            });
        }

        entries.sort_by_key(|e| e.id);
        let by_name = entries.iter().map(|e| (e.name.clone(), e.id)).collect();
        let by_id = entries.iter().enumerate().map(|(i, e)| (e.id, i)).collect();
        Self {
            entries,
            by_id,
            by_name,
        }
    }

    pub fn get(&self, id: LocationId) -> Option<&LocationEntry> {
        self.by_id.get(&id).map(|&i| &self.entries[i])
    }

    pub fn id_of(&self, name: &str) -> Option<LocationId> {
        self.by_name.get(name).copied()
    }

    pub fn name_of(&self, id: LocationId) -> Option<&str> {
        self.get(id).map(|e| e.name.as_str())
    }

    /// All locations, ordered by id
    pub fn iter(&self) -> impl Iterator<Item = &LocationEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Item id table with the save effect of each item
#[derive(Debug)]
pub struct ItemTable {
    by_id: BTreeMap<ItemId, ItemEntry>,
}

impl ItemTable {
    fn build() -> Self {
        let mut entries = vec![ItemEntry {
            id: ItemId(BASE_ID),
            name: "Strawberry".to_string(),
            effect: ItemEffect::Increment(STRAWBERRIES_FLAG.to_string()),
        }];

        let unlocks = [
            (0x01, "Dash Refill", "DashRefill"),
            (0x02, "Double Dash Refill", "DoubleDashRefill"),
            (0x03, "Feather", "Feather"),
            (0x04, "Coin", "Coin"),
            (0x05, "Cassette", "Cassette"),
            (0x06, "Traffic Block", "TrafficBlock"),
            (0x07, "Spring", "Spring"),
            (0x08, "Breakables", "Breakables"),
            (0x20, "Grounded Dash", "Grounded Dash"),
            (0x21, "Air Dash", "Air Dash"),
            (0x22, "Skid Jump", "Skid Jump"),
            (0x23, "Climb", "Climb"),
        ];
        for (offset, name, flag) in unlocks {
            entries.push(ItemEntry {
                id: ItemId(BASE_ID + offset),
                name: name.to_string(),
                effect: ItemEffect::Set(flag.to_string()),
            });
        }

        for (i, checkpoint) in CHECKPOINTS.iter().enumerate() {
            entries.push(ItemEntry {
                id: ItemId(BASE_ID + 0x100 + i as i64),
                name: format!("Checkpoint - {}", checkpoint),
                effect: ItemEffect::Set(format!("Item_{}", checkpoint)),
            });
        }

        Self {
            by_id: entries.into_iter().map(|e| (e.id, e)).collect(),
        }
    }

    pub fn get(&self, id: ItemId) -> Option<&ItemEntry> {
        self.by_id.get(&id)
    }

    pub fn effect_of(&self, id: ItemId) -> Option<&ItemEffect> {
        self.by_id.get(&id).map(|e| &e.effect)
    }

    pub fn name_of(&self, id: ItemId) -> Option<&str> {
        self.by_id.get(&id).map(|e| e.name.as_str())
    }

    /// All items, ordered by id
    pub fn iter(&self) -> impl Iterator<Item = &ItemEntry> {
        self.by_id.values()
    }
}

/// The location table
pub fn locations() -> &'static LocationTable {
    static TABLE: OnceLock<LocationTable> = OnceLock::new();
    TABLE.get_or_init(LocationTable::build)
}

/// The item table
pub fn items() -> &'static ItemTable {
    static TABLE: OnceLock<ItemTable> = OnceLock::new();
    TABLE.get_or_init(ItemTable::build)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strawberry_ids_read_decimal_as_hex() {
        let table = locations();
        assert_eq!(table.id_of("1/0"), Some(LocationId(0xCA0000)));
        assert_eq!(table.id_of("1/9"), Some(LocationId(0xCA0009)));
        assert_eq!(table.id_of("1/10"), Some(LocationId(0xCA0010)));
        assert_eq!(table.id_of("1/29"), Some(LocationId(0xCA0029)));
        assert_eq!(table.id_of("1/30"), None);
    }

    #[test]
    fn test_names_and_ids_are_bidirectional() {
        let table = locations();
        for entry in table.iter() {
            assert_eq!(table.id_of(&entry.name), Some(entry.id));
            assert_eq!(table.name_of(entry.id), Some(entry.name.as_str()));
        }
        assert_eq!(table.len(), 30 + 4 + 5 + 2 + 10);
    }

    #[test]
    fn test_tables_iterate_in_id_order() {
        let ids: Vec<LocationId> = locations().iter().map(|e| e.id).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(locations().iter().next().map(|e| e.name.as_str()), Some("1/0"));
        assert_eq!(
            locations().iter().last().map(|e| e.name.as_str()),
            Some("Checkpoint - Badeline Island")
        );

        let items: Vec<ItemId> = items().iter().map(|e| e.id).collect();
        assert!(items.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(items.first(), Some(&ItemId(0xCA0000)));
    }

    #[test]
    fn test_category_follows_range() {
        for entry in locations().iter() {
            assert_eq!(LocationCategory::of(entry.id), Some(entry.category));
        }
        assert_eq!(LocationCategory::of(LocationId(0xCA0500)), None);
        assert_eq!(LocationCategory::of(LocationId(12)), None);
    }

    #[test]
    fn test_checkpoint_location_uses_checkpoint_flag() {
        let id = locations().id_of("Checkpoint - Granny").unwrap();
        let entry = locations().get(id).unwrap();
        assert_eq!(id, LocationId(0xCA0401));
        assert_eq!(entry.flag, "Granny");
    }

    #[test]
    fn test_item_effects() {
        let table = items();
        assert_eq!(
            table.effect_of(ItemId(0xCA0000)),
            Some(&ItemEffect::Increment("Strawberries".to_string()))
        );
        assert_eq!(
            table.effect_of(ItemId(0xCA0007)),
            Some(&ItemEffect::Set("Spring".to_string()))
        );
        assert_eq!(table.name_of(ItemId(0xCA0021)), Some("Air Dash"));
        assert_eq!(
            table.effect_of(ItemId(0xCA0109)).map(ItemEffect::flag),
            Some("Item_Badeline Island")
        );
        assert!(table.get(ItemId(0xCA00FF)).is_none());
    }
}
