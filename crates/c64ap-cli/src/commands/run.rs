//! Headless session runner
//!
//! Connects a save file to a multiworld server and ticks it at the
//! configured rate, reconnecting with backoff until cancelled.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::output::{print_info, print_success, print_warning};
use c64ap_client::{ConnectionManager, ExponentialBackoff, MessageLog, TickReport};
use c64ap_core::{ClientConfig, SaveFile};

/// Command-line values that win over the config file
#[derive(Debug, Default, Clone)]
pub struct RunOverrides {
    pub url: Option<String>,
    pub slot: Option<String>,
    pub password: Option<String>,
    pub save: Option<PathBuf>,
    pub no_presence: bool,
}

impl RunOverrides {
    pub fn apply(self, config: &mut ClientConfig) {
        if let Some(url) = self.url {
            config.connection.url = url;
        }
        if let Some(slot) = self.slot {
            config.connection.slot = slot;
        }
        if let Some(password) = self.password {
            config.connection.password = password;
        }
        if let Some(save) = self.save {
            config.save_path = save;
        }
        if self.no_presence {
            config.connection.presence = false;
        }
    }
}

/// Why the tick loop stopped
enum Stop {
    Cancelled,
    Disconnected,
}

/// Run until cancelled
pub async fn run_command(config: ClientConfig, cancel: CancellationToken) -> Result<()> {
    let save_path = config.save_path.clone();
    let mut save = SaveFile::load_or_default(&save_path)
        .with_context(|| format!("Failed to load save from {:?}", save_path))?;

    let mut manager = ConnectionManager::websocket(config.connection.clone()).with_message_log(
        MessageLog::new(config.message_log.capacity, config.message_log.display_frames),
    );
    let mut backoff = ExponentialBackoff::from_config(&config.backoff);

    let result = loop {
        print_info(&format!(
            "Connecting to {} as {}...",
            config.connection.url, config.connection.slot
        ));

        let attempt = tokio::select! {
            _ = cancel.cancelled() => break Ok(()),
            attempt = tokio::time::timeout(config.connect_timeout, manager.connect()) => attempt,
        };

        match attempt {
            Ok(Ok(())) => {
                backoff.reset();
                print_success(&format!(
                    "Connected to room {}",
                    manager.seed().unwrap_or("(unknown seed)")
                ));
            }
            Ok(Err(e)) if !e.is_retryable() => {
                break Err(anyhow::Error::new(e).context("Connection refused"));
            }
            Ok(Err(e)) => {
                print_warning(&format!("Connection failed: {}", e));
                if !wait(&mut backoff, &cancel).await {
                    break Ok(());
                }
                continue;
            }
            Err(_) => {
                manager.disconnect();
                print_warning(&format!(
                    "Connection timed out after {}s",
                    config.connect_timeout.as_secs()
                ));
                if !wait(&mut backoff, &cancel).await {
                    break Ok(());
                }
                continue;
            }
        }

        match tick_loop(&mut manager, &mut save, &config, &cancel).await {
            Ok(Stop::Cancelled) => break Ok(()),
            Ok(Stop::Disconnected) => {
                print_warning("Disconnected from server");
                if !wait(&mut backoff, &cancel).await {
                    break Ok(());
                }
            }
            Err(e) => break Err(e),
        }
    };

    manager.disconnect();
    if save.is_dirty() {
        save.save(&save_path)
            .with_context(|| format!("Failed to write save to {:?}", save_path))?;
        tracing::info!("Saved progress to {:?}", save_path);
    }

    result
}

/// Sleep for the next backoff delay; false if cancelled meanwhile
async fn wait(backoff: &mut ExponentialBackoff, cancel: &CancellationToken) -> bool {
    let delay = backoff.next_delay();
    tracing::info!("Retrying in {:?} (attempt {})", delay, backoff.attempts());
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

async fn tick_loop(
    manager: &mut ConnectionManager,
    save: &mut SaveFile,
    config: &ClientConfig,
    cancel: &CancellationToken,
) -> Result<Stop> {
    let mut interval = tokio::time::interval(config.tick_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return Ok(Stop::Cancelled),
            _ = interval.tick() => {}
        }

        let report = manager.tick(save);
        if report.disconnected {
            return Ok(Stop::Disconnected);
        }
        show_report(manager, &report);

        if save.is_dirty() {
            save.save(&config.save_path)
                .with_context(|| format!("Failed to write save to {:?}", config.save_path))?;
        }
    }
}

fn show_report(manager: &ConnectionManager, report: &TickReport) {
    for event in &report.items {
        print_info(&format!(
            "Received {} from {}",
            manager.item_name(event.item),
            manager.player_name(event.player)
        ));
    }
    for change in &report.collected {
        print_info(&format!("Collected remotely: {}", change.name));
    }
    if !report.reported.is_empty() {
        let names: Vec<String> = report
            .reported
            .iter()
            .map(|id| manager.location_name(*id))
            .collect();
        print_info(&format!("Checked {}", names.join(", ")));
    }
    for line in &report.messages {
        println!("{}", line);
    }
    if let Some(death) = &report.death_link {
        print_warning(death.cause.as_deref().unwrap_or(&format!("{} died", death.source)));
    }
    if report.goal_sent {
        print_success("Goal complete");
    }
}
