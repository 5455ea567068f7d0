//! c64ap-cli: Command-line interface for the Celeste 64 randomizer client
//!
//! Provides the `c64ap` binary: a headless session runner against a
//! file-backed save, table dumps and config management.

pub mod commands;
pub mod output;
