//! c64ap-core: Core types and rules for the Celeste 64 randomizer client
//!
//! This crate provides the static item/location tables, slot settings,
//! the save-state collaborator trait, configuration and the small gameplay
//! rules that depend on received items. It has no network code.

pub mod actors;
pub mod config;
pub mod error;
pub mod hud;
pub mod save;
pub mod settings;
pub mod tables;
pub mod time;
pub mod types;

pub use config::{ClientConfig, ConnectionConfig};
pub use error::{ConfigError, SaveError, SlotDataError};
pub use save::{SaveFile, SaveRecord};
pub use settings::{BadelineSource, SlotSettings};
pub use tables::{ItemEffect, LocationCategory};
pub use types::{ItemEvent, PresenceRecord, SessionState, Vec2, Vec3};
