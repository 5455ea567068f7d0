//! Randomizer client configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::backoff::BackoffConfig;
use super::serde_utils::duration_secs;

/// Server, slot and visibility settings for one session attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Server address. A bare `host:port` is tried over `wss://` first, then `ws://`.
    pub url: String,

    /// Slot (player) name to log in as
    pub slot: String,

    /// Room password, empty when the room has none
    pub password: String,

    /// Publish our position and read other players' ghosts
    pub presence: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: "wss://archipelago.gg:38281".to_string(),
            slot: "Madeline".to_string(),
            password: String::new(),
            presence: true,
        }
    }
}

/// On-screen message log settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageLogConfig {
    /// Number of lines kept
    pub capacity: usize,

    /// Render calls a line stays visible for
    pub display_frames: u32,
}

impl Default for MessageLogConfig {
    fn default() -> Self {
        Self {
            capacity: 8,
            display_frames: 300,
        }
    }
}

/// Configuration for the randomizer client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub connection: ConnectionConfig,

    /// Connection timeout, applied by the caller around `connect`
    #[serde(with = "duration_secs")]
    pub connect_timeout: Duration,

    /// Backoff configuration for reconnections
    pub backoff: BackoffConfig,

    /// Simulation ticks per second for the headless runner
    pub tick_rate_hz: u32,

    pub message_log: MessageLogConfig,

    /// Save file used by the headless runner
    pub save_path: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            connect_timeout: Duration::from_secs(30),
            backoff: BackoffConfig::default(),
            tick_rate_hz: 60,
            message_log: MessageLogConfig::default(),
            save_path: super::default_config_dir().join("save.json"),
        }
    }
}

impl ClientConfig {
    /// Interval between simulation ticks
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_rate_hz.max(1)))
    }
}
