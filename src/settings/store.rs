//! On-disk persistence for connection-target entries

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Key of the dashboard server address entry
pub const SERVER_ADDRESS_KEY: &str = "server";

/// One persisted connection target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressEntry {
    pub key: String,
    pub host: String,
    pub port: String,
}

/// Keyed JSON settings file
///
/// The file holds a list of entries so additional targets can persist next to
/// the server address without a format change.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all entries; a missing or empty file is an empty list
    pub fn load(&self) -> Result<Vec<AddressEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;

        if json.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&json).with_context(|| format!("parsing {}", self.path.display()))
    }

    /// Look up one entry by key
    pub fn load_entry(&self, key: &str) -> Result<Option<AddressEntry>> {
        Ok(self.load()?.into_iter().find(|entry| entry.key == key))
    }

    /// Rewrite the file with the given entries
    pub fn save(&self, entries: &[AddressEntry]) -> Result<()> {
        let json = serde_json::to_string(entries)?;
        fs::write(&self.path, json).with_context(|| format!("writing {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn server_entry() -> AddressEntry {
        AddressEntry {
            key: SERVER_ADDRESS_KEY.into(),
            host: "10.0.0.7".into(),
            port: "9090".into(),
        }
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempdir().expect("tempdir failed");
        let store = SettingsStore::new(dir.path().join("config.json"));

        assert!(store.load().expect("load failed").is_empty());
        assert!(store
            .load_entry(SERVER_ADDRESS_KEY)
            .expect("load failed")
            .is_none());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempdir().expect("tempdir failed");
        let store = SettingsStore::new(dir.path().join("config.json"));

        store.save(&[server_entry()]).expect("save failed");

        let loaded = store
            .load_entry(SERVER_ADDRESS_KEY)
            .expect("load failed")
            .expect("entry missing");
        assert_eq!(loaded, server_entry());
    }

    #[test]
    fn test_empty_file_is_empty() {
        let dir = tempdir().expect("tempdir failed");
        let path = dir.path().join("config.json");
        fs::write(&path, "").expect("write failed");

        let store = SettingsStore::new(path);
        assert!(store.load().expect("load failed").is_empty());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempdir().expect("tempdir failed");
        let path = dir.path().join("config.json");
        fs::write(&path, "{ this is not a list").expect("write failed");

        let store = SettingsStore::new(path);
        assert!(store.load().is_err());
    }
}
