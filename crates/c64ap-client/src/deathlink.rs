//! DeathLink side channel
//!
//! Local deaths are counted against the slot's amnesty; only the death that
//! exceeds it is broadcast. Received deaths that are not newer than our own
//! last broadcast are ours echoing back, or stale.

use c64ap_protocol::DeathLinkData;

#[derive(Debug, Clone, Default)]
pub struct DeathLinkState {
    enabled: bool,
    amnesty: u32,
    /// Local deaths absorbed since the last broadcast
    absorbed: u32,
    /// Unix time of our last broadcast
    last_death: f64,
    /// While set, received deaths are dropped (menus, cutscenes)
    safe: bool,
    received: Option<DeathLinkData>,
}

impl DeathLinkState {
    pub fn new(enabled: bool, amnesty: u32) -> Self {
        Self {
            enabled,
            amnesty,
            ..Default::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_safe(&mut self, safe: bool) {
        self.safe = safe;
    }

    /// Deaths absorbed so far and the amnesty, for the HUD
    pub fn amnesty_progress(&self) -> (u32, u32) {
        (self.absorbed, self.amnesty)
    }

    /// Count a local death; returns the payload to broadcast, if any
    pub fn record_local_death(&mut self, source: &str, cause: &str, now: f64) -> Option<DeathLinkData> {
        if !self.enabled {
            return None;
        }

        if self.absorbed < self.amnesty {
            self.absorbed += 1;
            tracing::debug!("Death absorbed ({}/{})", self.absorbed, self.amnesty);
            return None;
        }

        self.absorbed = 0;
        self.last_death = now;
        Some(DeathLinkData {
            time: now,
            source: source.to_string(),
            cause: Some(format!("{} {}.", source, cause)),
        })
    }

    /// Handle a DeathLink bounce from the server
    pub fn on_received(&mut self, data: DeathLinkData) {
        if !self.enabled || self.safe {
            return;
        }
        if data.time <= self.last_death {
            tracing::debug!("Ignoring stale death from {}", data.source);
            return;
        }

        tracing::info!(
            "Death received from {}: {}",
            data.source,
            data.cause.as_deref().unwrap_or("no cause given")
        );
        self.received = Some(data);
    }

    /// Take a pending received death; the game kills the player once
    pub fn take_received(&mut self) -> Option<DeathLinkData> {
        self.received.take()
    }
}
