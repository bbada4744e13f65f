//! Durable local state
//!
//! Key/value slots stored as one file per key under the application data
//! directory. Every write replaces the whole slot (temp file + rename) so a
//! reader never sees a half-written value.

mod document;
mod view_store;

pub use document::Document;
pub use view_store::ViewStore;

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::constants::storage;

/// Browser-style local storage backed by a directory
#[derive(Debug, Clone)]
pub struct LocalStorage {
    dir: PathBuf,
    /// Maximum size of a single slot in bytes (None = unlimited)
    quota_bytes: Option<usize>,
}

impl LocalStorage {
    /// Platform data directory for the application
    pub fn default_dir() -> PathBuf {
        let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(storage::APP_DIR);
        path
    }

    pub fn open(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        info!(dir = %dir.display(), "Opened local storage");
        Self {
            dir,
            quota_bytes: None,
        }
    }

    pub fn with_quota(mut self, quota_bytes: Option<usize>) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.dir
            .join(key)
            .with_extension(storage::SLOT_EXTENSION)
    }

    /// Read a slot; `None` when it was never written
    pub fn get_item(&self, key: &str) -> Result<Option<String>> {
        let path = self.slot_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read storage slot {:?}", path))?;
        Ok(Some(contents))
    }

    /// Replace a slot with `value`
    pub fn set_item(&self, key: &str, value: &str) -> Result<()> {
        if let Some(quota) = self.quota_bytes {
            if value.len() > quota {
                anyhow::bail!(
                    "Storage quota exceeded for '{}': {} bytes (max: {})",
                    key,
                    value.len(),
                    quota
                );
            }
        }

        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create storage directory {:?}", self.dir))?;

        let path = self.slot_path(key);
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, value)
            .with_context(|| format!("Failed to write storage slot {:?}", tmp_path))?;
        fs::rename(&tmp_path, &path)
            .with_context(|| format!("Failed to replace storage slot {:?}", path))?;

        debug!(key = key, bytes = value.len(), "Wrote storage slot");
        Ok(())
    }

    /// Move an unreadable slot aside as `<key>.bak` so later writes cannot destroy it
    pub fn quarantine(&self, key: &str) -> Result<PathBuf> {
        let path = self.slot_path(key);
        let backup = path.with_extension("bak");
        fs::rename(&path, &backup)
            .with_context(|| format!("Failed to move storage slot {:?} aside", path))?;
        warn!(key = key, backup = %backup.display(), "Moved unreadable storage slot aside");
        Ok(backup)
    }

    /// Erase a slot; erasing a missing slot is not an error
    pub fn remove_item(&self, key: &str) -> Result<()> {
        let path = self.slot_path(key);
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove storage slot {:?}", path))?;
            info!(key = key, "Removed storage slot");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_slot_reads_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::open(dir.path());
        assert_eq!(storage.get_item("nothing").unwrap(), None);
    }

    #[test]
    fn test_set_get_remove() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::open(dir.path().join("nested"));

        storage.set_item("slot", "{\"a\":1}").unwrap();
        assert_eq!(storage.get_item("slot").unwrap().as_deref(), Some("{\"a\":1}"));

        storage.set_item("slot", "replaced").unwrap();
        assert_eq!(storage.get_item("slot").unwrap().as_deref(), Some("replaced"));

        storage.remove_item("slot").unwrap();
        assert_eq!(storage.get_item("slot").unwrap(), None);
        storage.remove_item("slot").unwrap();
    }

    #[test]
    fn test_quarantine_keeps_old_contents() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::open(dir.path());
        storage.set_item("slot", "{ broken").unwrap();

        let backup = storage.quarantine("slot").unwrap();

        assert_eq!(storage.get_item("slot").unwrap(), None);
        assert_eq!(fs::read_to_string(backup).unwrap(), "{ broken");
    }

    #[test]
    fn test_quota_rejects_large_values() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::open(dir.path()).with_quota(Some(4));

        assert!(storage.set_item("slot", "12345").is_err());
        assert_eq!(storage.get_item("slot").unwrap(), None);
        storage.set_item("slot", "1234").unwrap();
    }
}
