//! c64ap CLI
//!
//! Single binary for the randomizer client tooling:
//! - Headless session runner against a file-backed save
//! - Item and location table dumps
//! - Configuration management

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use c64ap_cli::commands::{self, RunOverrides};
use c64ap_cli::output::print_info;

#[derive(Parser)]
#[command(name = "c64ap")]
#[command(author, version, about = "Celeste 64 multiworld randomizer client")]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, env = "C64AP_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect a save file to a multiworld server and keep it in sync
    Run {
        /// Server address (ws://, wss:// or host:port)
        #[arg(short, long)]
        url: Option<String>,
        /// Slot name to log in as
        #[arg(short, long)]
        slot: Option<String>,
        /// Room password
        #[arg(short, long, env = "C64AP_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// Save file to sync
        #[arg(long)]
        save: Option<PathBuf>,
        /// Do not publish or read player presence
        #[arg(long)]
        no_presence: bool,
    },

    /// List the game's locations
    Locations {
        /// Only one category (strawberry, friend, sign, car, checkpoint)
        #[arg(long)]
        category: Option<String>,
    },

    /// List the game's items
    Items,

    /// Summarize a save file
    Progress {
        /// Save file to read (defaults to the configured save)
        #[arg(long)]
        save: Option<PathBuf>,
        /// Strawberries needed for the goal
        #[arg(short, long, default_value_t = 0)]
        required: u32,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Get specific config value
    Get { key: String },
    /// Set config value
    Set { key: String, value: String },
    /// Write the default configuration
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
    /// Show config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match cli.command {
        Commands::Run {
            url,
            slot,
            password,
            save,
            no_presence,
        } => {
            let mut config = commands::load_client_config(cli.config.as_ref())?;
            RunOverrides {
                url,
                slot,
                password,
                save,
                no_presence,
            }
            .apply(&mut config);

            let cancel = CancellationToken::new();
            spawn_signal_handler(cancel.clone());

            commands::run_command(config, cancel).await?;
            print_info("Stopped");
        }

        Commands::Locations { category } => {
            commands::locations_command(category.as_deref())?;
        }

        Commands::Items => {
            commands::items_command()?;
        }

        Commands::Progress { save, required } => {
            let path = match save {
                Some(path) => path,
                None => commands::load_client_config(cli.config.as_ref())?.save_path,
            };
            commands::progress_command(&path, required)?;
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                commands::config_show(cli.config.as_ref())?;
            }
            ConfigAction::Get { key } => {
                commands::config_get(cli.config.as_ref(), &key)?;
            }
            ConfigAction::Set { key, value } => {
                commands::config_set(cli.config.as_ref(), &key, &value)?;
            }
            ConfigAction::Init { force } => {
                commands::config_init(cli.config.as_ref(), force)?;
            }
            ConfigAction::Path => {
                let path = cli
                    .config
                    .unwrap_or_else(c64ap_core::config::default_config_path);
                println!("{}", path.display());
            }
        },
    }

    Ok(())
}

/// Cancel on Ctrl+C or SIGTERM
fn spawn_signal_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::warn!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                tracing::info!("Received Ctrl+C, shutting down...");
            }
            _ = terminate => {
                tracing::info!("Received SIGTERM, shutting down...");
            }
        }

        cancel.cancel();
    });
}
