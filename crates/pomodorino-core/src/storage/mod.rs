//! Key-value persistence.
//!
//! Everything the core persists -- the timer snapshot and the settings
//! record -- goes through the [`KvStore`] capability trait, so the timer
//! and settings code never touch the filesystem directly. Production uses
//! the SQLite-backed [`Database`]; tests use [`MemoryStore`].

pub mod database;

pub use database::Database;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::StorageError;

/// Minimal persistence capability: last-write-wins string slots.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-memory store for tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let slots = self
            .slots
            .lock()
            .map_err(|e| StorageError::QueryFailed(e.to_string()))?;
        Ok(slots.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|e| StorageError::QueryFailed(e.to_string()))?;
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Returns `<platform data dir>/pomodorino[-dev]/` based on POMODORINO_ENV.
///
/// Set POMODORINO_ENV=dev to use a separate development data directory.
///
/// # Errors
/// Returns an error if the data directory cannot be determined or created.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let base_dir = dirs::data_dir().ok_or(StorageError::NoDataDir)?;

    let env = std::env::var("POMODORINO_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("pomodorino-dev")
    } else {
        base_dir.join("pomodorino")
    };

    std::fs::create_dir_all(&dir).map_err(|e| StorageError::QueryFailed(e.to_string()))?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(store.get("missing").unwrap().is_none());
        store.set("k", "v1").unwrap();
        store.set("k", "v2").unwrap();
        assert_eq!(store.get("k").unwrap().unwrap(), "v2");
    }
}
