//! Save-state collaborator
//!
//! The game owns persistent progress. The client only reads, sets and
//! increments named integer flags and the strawberry list through
//! [`SaveRecord`]. [`SaveFile`] is a JSON-backed implementation for the
//! headless runner and for tests.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::SaveError;

/// Persistent progress flags of the current save
pub trait SaveRecord {
    /// Value of a flag, 0 when unset
    fn get_flag(&self, name: &str) -> i32;

    fn set_flag(&mut self, name: &str, value: i32);

    /// Add one to a flag and return the new value
    fn inc_flag(&mut self, name: &str) -> i32;

    fn enable_flag(&mut self, name: &str) {
        self.set_flag(name, 1);
    }

    fn contains_strawberry(&self, id: &str) -> bool;

    fn add_strawberry(&mut self, id: &str);

    /// Strawberries collected in this save
    fn strawberries(&self) -> Vec<String>;

    /// Sub-maps finished in this save
    fn completed_submaps(&self) -> Vec<String>;
}

/// JSON save file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveFile {
    pub flags: HashMap<String, i32>,
    pub strawberries: Vec<String>,
    pub completed_submaps: Vec<String>,
    #[serde(skip)]
    dirty: bool,
}

impl SaveFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a save file, or start a fresh one if none exists yet
    pub fn load_or_default(path: &Path) -> Result<Self, SaveError> {
        if !path.exists() {
            tracing::info!("No save at {}, starting fresh", path.display());
            return Ok(Self::new());
        }

        let content = std::fs::read_to_string(path).map_err(|source| SaveError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| SaveError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the save and clear the dirty marker
    pub fn save(&mut self, path: &Path) -> Result<(), SaveError> {
        let io_err = |source| SaveError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let content = serde_json::to_string_pretty(self).map_err(|source| SaveError::Corrupt {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, content).map_err(io_err)?;

        self.dirty = false;
        Ok(())
    }

    /// Whether anything changed since the last load or save
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn complete_submap(&mut self, name: &str) {
        if !self.completed_submaps.iter().any(|s| s == name) {
            self.completed_submaps.push(name.to_string());
            self.dirty = true;
        }
    }
}

impl SaveRecord for SaveFile {
    fn get_flag(&self, name: &str) -> i32 {
        self.flags.get(name).copied().unwrap_or(0)
    }

    fn set_flag(&mut self, name: &str, value: i32) {
        if self.flags.insert(name.to_string(), value) != Some(value) {
            self.dirty = true;
        }
    }

    fn inc_flag(&mut self, name: &str) -> i32 {
        let value = self.flags.entry(name.to_string()).or_insert(0);
        *value += 1;
        self.dirty = true;
        *value
    }

    fn contains_strawberry(&self, id: &str) -> bool {
        self.strawberries.iter().any(|s| s == id)
    }

    fn add_strawberry(&mut self, id: &str) {
        if !self.contains_strawberry(id) {
            self.strawberries.push(id.to_string());
            self.dirty = true;
        }
    }

    fn strawberries(&self) -> Vec<String> {
        self.strawberries.clone()
    }

    fn completed_submaps(&self) -> Vec<String> {
        self.completed_submaps.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags() {
        let mut save = SaveFile::new();
        assert_eq!(save.get_flag("Spring"), 0);

        save.enable_flag("Spring");
        assert_eq!(save.get_flag("Spring"), 1);

        assert_eq!(save.inc_flag("Strawberries"), 1);
        assert_eq!(save.inc_flag("Strawberries"), 2);
        assert!(save.is_dirty());
    }

    #[test]
    fn test_strawberries_are_a_set() {
        let mut save = SaveFile::new();
        save.add_strawberry("1/3");
        save.add_strawberry("1/3");
        assert_eq!(save.strawberries(), vec!["1/3".to_string()]);
        assert!(save.contains_strawberry("1/3"));
    }

    #[test]
    fn test_unchanged_set_is_not_dirty() {
        let mut save = SaveFile::new();
        save.set_flag("Coin", 1);
        let dir = tempfile::tempdir().unwrap();
        save.save(&dir.path().join("save.json")).unwrap();

        save.set_flag("Coin", 1);
        assert!(!save.is_dirty());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("save.json");

        let mut save = SaveFile::new();
        save.set_flag("ItemRcv", 4);
        save.add_strawberry("1/12");
        save.complete_submap("Submap A");
        save.save(&path).unwrap();

        let loaded = SaveFile::load_or_default(&path).unwrap();
        assert_eq!(loaded.get_flag("ItemRcv"), 4);
        assert!(loaded.contains_strawberry("1/12"));
        assert_eq!(loaded.completed_submaps(), vec!["Submap A".to_string()]);
    }

    #[test]
    fn test_missing_file_is_fresh_save() {
        let dir = tempfile::tempdir().unwrap();
        let save = SaveFile::load_or_default(&dir.path().join("none.json")).unwrap();
        assert_eq!(save, SaveFile::new());
    }

    #[test]
    fn test_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("save.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            SaveFile::load_or_default(&path),
            Err(SaveError::Corrupt { .. })
        ));
    }
}
