//! Core error types for the randomizer client

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialize error
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Save-record persistence errors
#[derive(Error, Debug)]
pub enum SaveError {
    /// Could not read or write the save file
    #[error("Failed to access save file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Save file contents are not valid
    #[error("Corrupt save file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Slot configuration sent by the server could not be understood
#[derive(Error, Debug)]
pub enum SlotDataError {
    /// Slot data was not a JSON object
    #[error("Slot data must be an object, got {0}")]
    NotAnObject(String),

    /// A field had the wrong shape
    #[error("Invalid slot data: {0}")]
    Invalid(#[from] serde_json::Error),
}
