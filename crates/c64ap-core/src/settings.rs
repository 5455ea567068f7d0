//! Slot settings sent by the server at login

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::serde_utils::int_or_bool;
use crate::error::SlotDataError;
use crate::tables::LocationCategory;

/// What advances the Badeline chasers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum BadelineSource {
    /// Every checked location counts
    #[default]
    Locations,
    /// Only strawberries count
    Strawberries,
}

impl From<u8> for BadelineSource {
    fn from(value: u8) -> Self {
        match value {
            1 => BadelineSource::Strawberries,
            _ => BadelineSource::Locations,
        }
    }
}

impl From<BadelineSource> for u8 {
    fn from(value: BadelineSource) -> Self {
        match value {
            BadelineSource::Locations => 0,
            BadelineSource::Strawberries => 1,
        }
    }
}

/// Per-slot options, parsed once per successful login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotSettings {
    pub strawberries_required: u32,

    #[serde(deserialize_with = "int_or_bool::deserialize")]
    pub death_link: bool,

    /// Local deaths absorbed before one is broadcast
    pub death_link_amnesty: u32,

    #[serde(deserialize_with = "int_or_bool::deserialize")]
    pub move_shuffle: bool,

    #[serde(deserialize_with = "int_or_bool::deserialize")]
    pub friendsanity: bool,

    #[serde(deserialize_with = "int_or_bool::deserialize")]
    pub signsanity: bool,

    #[serde(deserialize_with = "int_or_bool::deserialize")]
    pub carsanity: bool,

    #[serde(deserialize_with = "int_or_bool::deserialize")]
    pub checkpointsanity: bool,

    pub badeline_chaser_source: BadelineSource,

    /// Checks between chaser spawns; 0 disables chasers
    pub badeline_chaser_frequency: u32,

    pub badeline_chaser_speed: u32,

    pub madeline_one_dash_hair_color: Option<u32>,
    pub madeline_two_dash_hair_color: Option<u32>,
    pub madeline_no_dash_hair_color: Option<u32>,
    pub madeline_feather_hair_color: Option<u32>,
}

impl Default for SlotSettings {
    fn default() -> Self {
        Self {
            strawberries_required: 0,
            death_link: false,
            death_link_amnesty: 0,
            move_shuffle: false,
            friendsanity: false,
            signsanity: false,
            carsanity: false,
            checkpointsanity: false,
            badeline_chaser_source: BadelineSource::Locations,
            badeline_chaser_frequency: 0,
            badeline_chaser_speed: 0,
            madeline_one_dash_hair_color: None,
            madeline_two_dash_hair_color: None,
            madeline_no_dash_hair_color: None,
            madeline_feather_hair_color: None,
        }
    }
}

impl SlotSettings {
    /// Parse the `slot_data` object of a `Connected` packet.
    ///
    /// Missing keys take their defaults; unknown keys are ignored.
    pub fn from_slot_data(slot_data: &Value) -> Result<Self, SlotDataError> {
        match slot_data {
            Value::Object(_) => Ok(serde_json::from_value(slot_data.clone())?),
            Value::Null => Ok(Self::default()),
            other => Err(SlotDataError::NotAnObject(other.to_string())),
        }
    }

    pub fn badelines_disabled(&self) -> bool {
        self.badeline_chaser_frequency == 0
    }

    /// Whether locations of this category are part of the seed
    pub fn category_enabled(&self, category: LocationCategory) -> bool {
        match category {
            LocationCategory::Strawberry => true,
            LocationCategory::Friend => self.friendsanity,
            LocationCategory::Sign => self.signsanity,
            LocationCategory::Car => self.carsanity,
            LocationCategory::Checkpoint => self.checkpointsanity,
        }
    }

    pub fn goal_reached(&self, strawberries: u32) -> bool {
        strawberries >= self.strawberries_required
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_minimal_slot_data() {
        let settings =
            SlotSettings::from_slot_data(&json!({"strawberries_required": 20, "death_link": false}))
                .unwrap();
        assert_eq!(settings.strawberries_required, 20);
        assert!(!settings.death_link);
        assert!(settings.badelines_disabled());
    }

    #[test]
    fn test_parse_full_slot_data() {
        let settings = SlotSettings::from_slot_data(&json!({
            "strawberries_required": 15,
            "death_link": 1,
            "death_link_amnesty": 10,
            "move_shuffle": 1,
            "friendsanity": 1,
            "signsanity": 0,
            "carsanity": true,
            "checkpointsanity": 1,
            "badeline_chaser_source": 1,
            "badeline_chaser_frequency": 8,
            "badeline_chaser_speed": 3,
            "madeline_one_dash_hair_color": 14352384,
            "some_future_option": "ignored"
        }))
        .unwrap();

        assert!(settings.death_link);
        assert_eq!(settings.death_link_amnesty, 10);
        assert!(settings.move_shuffle);
        assert!(settings.category_enabled(LocationCategory::Friend));
        assert!(!settings.category_enabled(LocationCategory::Sign));
        assert!(settings.category_enabled(LocationCategory::Car));
        assert_eq!(settings.badeline_chaser_source, BadelineSource::Strawberries);
        assert!(!settings.badelines_disabled());
        assert_eq!(settings.madeline_one_dash_hair_color, Some(0xDB0000));
        assert_eq!(settings.madeline_feather_hair_color, None);
    }

    #[test]
    fn test_rejects_non_object() {
        assert!(matches!(
            SlotSettings::from_slot_data(&json!([1, 2])),
            Err(SlotDataError::NotAnObject(_))
        ));
    }

    #[test]
    fn test_goal_reached() {
        let settings = SlotSettings {
            strawberries_required: 3,
            ..Default::default()
        };
        assert!(!settings.goal_reached(2));
        assert!(settings.goal_reached(3));
    }
}
