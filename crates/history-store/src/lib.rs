//! Persistent scan history, credential, and preference storage over a
//! pluggable key-value backend.

pub mod kv;

pub use kv::{JsonFileStore, KeyValueStore};

use std::sync::{Arc, Mutex};
use vigil_core::{HistoryEntry, StorageError};

pub const KEY_API_KEY: &str = "apiKey";
pub const KEY_SCAN_HISTORY: &str = "scanHistory";
pub const KEY_THEME: &str = "themePreference";

/// Typed facade over the raw store. History is a single JSON array under one
/// key, newest entry first; appends are serialized so no read-modify-write
/// loses an entry.
pub struct HistoryStore {
    kv: Arc<dyn KeyValueStore>,
    write_lock: Mutex<()>,
}

impl HistoryStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        HistoryStore { kv, write_lock: Mutex::new(()) }
    }

    /// Stored API key. Empty strings count as unset.
    pub fn api_key(&self) -> Result<Option<String>, StorageError> {
        Ok(self.kv.get(KEY_API_KEY)?.filter(|key| !key.is_empty()))
    }

    pub fn set_api_key(&self, key: &str) -> Result<(), StorageError> {
        self.kv.set(KEY_API_KEY, key)
    }

    pub fn clear_api_key(&self) -> Result<(), StorageError> {
        self.kv.remove(KEY_API_KEY)
    }

    pub fn theme(&self) -> Result<Option<String>, StorageError> {
        self.kv.get(KEY_THEME)
    }

    pub fn set_theme(&self, theme: &str) -> Result<(), StorageError> {
        self.kv.set(KEY_THEME, theme)
    }

    /// All recorded scans, newest first.
    pub fn entries(&self) -> Result<Vec<HistoryEntry>, StorageError> {
        match self.kv.get(KEY_SCAN_HISTORY)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    /// Prepend one entry. Single writer at a time.
    pub fn append(&self, entry: HistoryEntry) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|p| p.into_inner());
        let mut entries = self.entries()?;
        entries.insert(0, entry);
        self.kv.set(KEY_SCAN_HISTORY, &serde_json::to_string(&entries)?)
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|p| p.into_inner());
        self.kv.remove(KEY_SCAN_HISTORY)
    }
}
