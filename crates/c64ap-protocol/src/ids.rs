//! Identifier newtypes shared by the wire packets

use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-side identifier of a completable objective
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(pub i64);

/// Server-side identifier of a grantable item
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub i64);

/// A player's slot number within the multiworld
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(pub i64);

impl SlotId {
    /// Slot 0 is reserved for the server itself
    pub const SERVER: SlotId = SlotId(0);

    /// Whether this is the server pseudo-slot
    pub fn is_server(&self) -> bool {
        *self == Self::SERVER
    }
}

macro_rules! id_impls {
    ($ty:ident, $fmt:literal) => {
        impl $ty {
            /// Get the raw id value
            pub fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $ty {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, $fmt, self.0)
            }
        }
    };
}

id_impls!(LocationId, "location-{:#x}");
id_impls!(ItemId, "item-{:#x}");
id_impls!(SlotId, "slot-{}");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_id_display() {
        assert_eq!(LocationId(0xCA0010).to_string(), "location-0xca0010");
    }

    #[test]
    fn test_ids_serialize_as_bare_numbers() {
        let json = serde_json::to_string(&vec![LocationId(1), LocationId(2)]).unwrap();
        assert_eq!(json, "[1,2]");

        let slot: SlotId = serde_json::from_str("3").unwrap();
        assert_eq!(slot, SlotId(3));
        assert!(!slot.is_server());
        assert!(SlotId::SERVER.is_server());
    }
}
