//! Gameplay rules of the randomizer-aware actors
//!
//! Only the decisions live here: whether a pickup does anything, which
//! model or colour to show. Drawing and audio stay with the engine.

use crate::save::SaveRecord;
use crate::types::{PresenceRecord, Vec2, GHOST_HAIR_COLOR};

/// Save flag that unlocks springs
pub const SPRING_FLAG: &str = "Spring";

const SPRING_COOLDOWN: f32 = 1.0;

/// Model alpha while springs are still locked
pub const LOCKED_ALPHA: u8 = 0xA0;
pub const UNLOCKED_ALPHA: u8 = 0xFF;

/// A spring board that only launches once the Spring item is received
#[derive(Debug, Clone, Default)]
pub struct Spring {
    cooldown: f32,
}

impl Spring {
    pub fn new() -> Self {
        Self::default()
    }

    /// Model alpha for the current save
    pub fn alpha(save: &dyn SaveRecord) -> u8 {
        if save.get_flag(SPRING_FLAG) == 0 {
            LOCKED_ALPHA
        } else {
            UNLOCKED_ALPHA
        }
    }

    pub fn update(&mut self, delta: f32) {
        if self.cooldown > 0.0 {
            self.cooldown -= delta;
        }
    }

    /// Whether the spring still runs while off screen
    pub fn is_cooling_down(&self) -> bool {
        self.cooldown > 0.0
    }

    /// Handle the player touching the spring; returns true if it launches
    pub fn pickup(&mut self, save: &dyn SaveRecord) -> bool {
        if save.get_flag(SPRING_FLAG) == 0 {
            return false;
        }

        if self.cooldown <= 0.0 {
            self.cooldown = SPRING_COOLDOWN;
            return true;
        }

        false
    }
}

/// Display status of a checkpoint flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointStatus {
    /// The player last spawned here
    Current,
    /// Reached before, location checked
    Checked,
    Unchecked,
}

impl CheckpointStatus {
    /// Halo colour as 0xRRGGBB
    pub fn halo_color(&self) -> u32 {
        match self {
            CheckpointStatus::Current => 0x7fde46,
            CheckpointStatus::Checked => 0x545cfc,
            CheckpointStatus::Unchecked => 0xdf5ab4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    pub name: String,
}

impl Checkpoint {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn status(&self, save: &dyn SaveRecord, entry_checkpoint: &str) -> CheckpointStatus {
        if self.name == entry_checkpoint {
            CheckpointStatus::Current
        } else if self.is_location_checked(save) {
            CheckpointStatus::Checked
        } else {
            CheckpointStatus::Unchecked
        }
    }

    pub fn is_location_checked(&self, save: &dyn SaveRecord) -> bool {
        save.get_flag(&self.name) != 0
    }

    /// Whether the checkpoint's unlock item was received
    pub fn has_item(&self, save: &dyn SaveRecord) -> bool {
        save.get_flag(&format!("Item_{}", self.name)) != 0
    }

    pub fn pickup(&self, save: &mut dyn SaveRecord) {
        save.enable_flag(&self.name);
    }
}

/// Hair colour of the Badeline chaser
pub const BADELINE_HAIR_COLOR: u32 = 0x9B3FB5;

const ORB_COUNT: usize = 8;

/// One orb of the chaser's spawn-in effect
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orb {
    /// Offset from the orb centre in camera space
    pub offset: Vec2,
    pub size: f32,
    /// Alternates between hair colour and white
    pub use_hair_color: bool,
}

/// A Badeline that chases the player and kills on touch
#[derive(Debug, Clone)]
pub struct BadelineChase {
    orb_ease: f32,
}

impl Default for BadelineChase {
    fn default() -> Self {
        Self::new()
    }
}

impl BadelineChase {
    /// A freshly spawned chaser starts hidden inside its orb effect
    pub fn new() -> Self {
        Self { orb_ease: 1.0 }
    }

    pub fn update(&mut self, delta: f32) {
        if self.orb_ease > 0.0 {
            self.orb_ease = (self.orb_ease - delta * 2.0).max(0.0);
        }
    }

    /// Whether the body and hair are drawn yet
    pub fn draws_model(&self) -> bool {
        self.orb_ease <= 0.0
    }

    /// Returns true if touching the chaser kills the player
    pub fn pickup(&self, mid_transition: bool) -> bool {
        !mid_transition
    }

    /// Orb sprites for the spawn-in effect; empty once it has finished
    pub fn orbs(&self) -> Vec<Orb> {
        let ease = self.orb_ease;
        if ease <= 0.0 {
            return Vec::new();
        }

        let use_hair_color = (ease * 10.0).floor() as i32 % 2 == 0;
        let scale = if ease < 0.5 {
            0.5 + ease
        } else {
            cube_out(1.0 - (ease - 0.5) * 2.0)
        };
        let radius = cube_out(ease) * 16.0;

        (0..ORB_COUNT)
            .map(|i| {
                let rot = (i as f32 / ORB_COUNT as f32 + ease * 0.25) * std::f32::consts::TAU;
                Orb {
                    offset: Vec2::new(rot.cos() * radius, rot.sin() * radius),
                    size: 3.0 * scale,
                    use_hair_color,
                }
            })
            .collect()
    }
}

fn cube_out(t: f32) -> f32 {
    let inv = 1.0 - t;
    1.0 - inv * inv * inv
}

/// Another player's avatar, driven by presence data
#[derive(Debug, Clone, PartialEq)]
pub struct Ghost {
    pub record: PresenceRecord,
}

impl Ghost {
    pub fn new(record: PresenceRecord) -> Self {
        Self { record }
    }

    pub fn hair_color(&self) -> u32 {
        if self.record.hair_color == 0 {
            GHOST_HAIR_COLOR
        } else {
            self.record.hair_color
        }
    }

    /// Hidden when the camera is inside the model
    pub fn is_visible(&self, camera_distance_sq: f32, near_plane: f32) -> bool {
        camera_distance_sq > near_plane * near_plane
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::save::SaveFile;
    use crate::types::Vec3;

    #[test]
    fn test_locked_spring_does_nothing() {
        let save = SaveFile::new();
        let mut spring = Spring::new();
        assert!(!spring.pickup(&save));
        assert!(!spring.is_cooling_down());
        assert_eq!(Spring::alpha(&save), LOCKED_ALPHA);
    }

    #[test]
    fn test_unlocked_spring_has_cooldown() {
        let mut save = SaveFile::new();
        save.enable_flag(SPRING_FLAG);

        let mut spring = Spring::new();
        assert!(spring.pickup(&save));
        assert!(!spring.pickup(&save));

        spring.update(0.5);
        assert!(!spring.pickup(&save));
        spring.update(0.6);
        assert!(spring.pickup(&save));
        assert_eq!(Spring::alpha(&save), UNLOCKED_ALPHA);
    }

    #[test]
    fn test_checkpoint_status() {
        let mut save = SaveFile::new();
        let checkpoint = Checkpoint::new("Granny");

        assert_eq!(checkpoint.status(&save, "Intro"), CheckpointStatus::Unchecked);
        checkpoint.pickup(&mut save);
        assert_eq!(checkpoint.status(&save, "Intro"), CheckpointStatus::Checked);
        assert_eq!(checkpoint.status(&save, "Granny"), CheckpointStatus::Current);
        assert_eq!(CheckpointStatus::Checked.halo_color(), 0x545cfc);
    }

    #[test]
    fn test_checkpoint_item() {
        let mut save = SaveFile::new();
        let checkpoint = Checkpoint::new("Feather Maze");
        assert!(!checkpoint.has_item(&save));
        save.enable_flag("Item_Feather Maze");
        assert!(checkpoint.has_item(&save));
    }

    #[test]
    fn test_badeline_spawn_in() {
        let mut badeline = BadelineChase::new();
        assert!(!badeline.draws_model());
        assert_eq!(badeline.orbs().len(), 8);

        badeline.update(0.6);
        assert!(badeline.draws_model());
        assert!(badeline.orbs().is_empty());
    }

    #[test]
    fn test_badeline_spares_during_transition() {
        let badeline = BadelineChase::new();
        assert!(badeline.pickup(false));
        assert!(!badeline.pickup(true));
    }

    #[test]
    fn test_ghost_defaults_hair() {
        let ghost = Ghost::new(PresenceRecord {
            name: "Theo".to_string(),
            sublevel: String::new(),
            facing: Vec2::default(),
            position: Vec3::default(),
            hair_color: 0,
        });
        assert_eq!(ghost.hair_color(), GHOST_HAIR_COLOR);
        assert!(!ghost.is_visible(1.0, 2.0));
    }
}
