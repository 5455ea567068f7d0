//! CLI command implementations

mod config;
mod progress;
mod run;
mod tables;

pub use config::{config_get, config_init, config_set, config_show, load_client_config};
pub use progress::progress_command;
pub use run::{run_command, RunOverrides};
pub use tables::{items_command, locations_command};
