//! Cross-player presence
//!
//! Each player writes their own record under a per-team key and appends
//! their name to a shared roster list. Everyone else reads the roster to
//! learn whom to poll, then reads the records in one batched `Get`.

use c64ap_core::PresenceRecord;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::{Mutex, PoisonError};

/// Data-storage key of the team roster
pub fn roster_key(team: i64) -> String {
    format!("Celeste64_Roster_{}", team)
}

/// Data-storage key of one player's presence record
pub fn presence_key(team: i64, name: &str) -> String {
    format!("Celeste64_Presence_{}_{}", team, name)
}

/// Latest presence records of other players
///
/// Written by the network task, read by the simulation thread.
#[derive(Debug)]
pub struct PresenceStore {
    team: i64,
    own_name: String,
    /// Names seen in the roster, in order first seen
    tracked: Mutex<Vec<String>>,
    records: DashMap<String, PresenceRecord>,
}

impl PresenceStore {
    pub fn new(team: i64, own_name: impl Into<String>) -> Self {
        Self {
            team,
            own_name: own_name.into(),
            tracked: Mutex::new(Vec::new()),
            records: DashMap::new(),
        }
    }

    pub fn roster_key(&self) -> String {
        roster_key(self.team)
    }

    pub fn own_key(&self) -> String {
        presence_key(self.team, &self.own_name)
    }

    pub fn own_name(&self) -> &str {
        &self.own_name
    }

    /// Whether a roster value already holds our name
    pub fn lists_self(&self, roster: &Value) -> bool {
        roster
            .as_array()
            .is_some_and(|names| names.iter().any(|n| n.as_str() == Some(self.own_name.as_str())))
    }

    /// Merge a roster value; returns names tracked for the first time.
    ///
    /// Our own name is never tracked and names are never dropped.
    pub fn merge_roster(&self, value: &Value) -> Vec<String> {
        let Some(names) = value.as_array() else {
            tracing::debug!("Ignoring roster value that is not a list");
            return Vec::new();
        };

        let mut tracked = self.tracked.lock().unwrap_or_else(PoisonError::into_inner);
        let mut added = Vec::new();
        for name in names.iter().filter_map(Value::as_str) {
            if name == self.own_name || tracked.iter().any(|t| t == name) {
                continue;
            }
            tracked.push(name.to_string());
            added.push(name.to_string());
        }

        if !added.is_empty() {
            tracing::info!("Tracking presence of {}", added.join(", "));
        }
        added
    }

    /// Keys to read for one poll
    pub fn poll_keys(&self) -> Vec<String> {
        let tracked = self.tracked.lock().unwrap_or_else(PoisonError::into_inner);
        tracked.iter().map(|name| presence_key(self.team, name)).collect()
    }

    pub fn tracked(&self) -> Vec<String> {
        self.tracked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn name_for_key<'a>(&self, key: &'a str) -> Option<&'a str> {
        let prefix = format!("Celeste64_Presence_{}_", self.team);
        key.strip_prefix(prefix.as_str())
    }

    /// Whether a data-storage key belongs to presence
    pub fn is_presence_key(&self, key: &str) -> bool {
        self.name_for_key(key).is_some()
    }

    /// Store a value read from a presence key.
    ///
    /// A missing or undecodable value removes the record.
    pub fn store(&self, key: &str, value: &Value) {
        let Some(name) = self.name_for_key(key) else {
            return;
        };
        if name == self.own_name {
            return;
        }

        match serde_json::from_value::<PresenceRecord>(value.clone()) {
            Ok(record) => {
                self.records.insert(name.to_string(), record);
            }
            Err(e) => {
                if !value.is_null() {
                    tracing::debug!("Undecodable presence for {}: {}", name, e);
                }
                self.records.remove(name);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<PresenceRecord> {
        self.records.get(name).map(|r| r.value().clone())
    }

    /// Snapshot of every known record
    pub fn records(&self) -> Vec<PresenceRecord> {
        self.records.iter().map(|r| r.value().clone()).collect()
    }
}
