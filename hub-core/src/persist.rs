//! Hub persistence.
//!
//! The whole hub state is stored as a single JSON record under a fixed key
//! in a [`KeyValueStore`]. Reads are forgiving: a missing record, an
//! unreadable store or a corrupt record all load as "nothing saved", and
//! absent fields fall back to their initial values.

use crate::invention::Invention;
use crate::upgrade::{default_upgrades, Upgrade};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Key the hub record is stored under.
pub const STORAGE_KEY: &str = "quantum_cyber_hub_v3";

/// Essence balance of a fresh hub.
pub const INITIAL_ESSENCE: u64 = 1000;

/// Everything the hub persists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Newest first.
    #[serde(default, deserialize_with = "null_as_default")]
    pub inventions: Vec<Invention>,

    #[serde(default = "initial_essence", deserialize_with = "essence_or_initial")]
    pub essence: u64,

    #[serde(default = "default_upgrades", deserialize_with = "upgrades_or_default")]
    pub upgrades: Vec<Upgrade>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            inventions: Vec::new(),
            essence: INITIAL_ESSENCE,
            upgrades: default_upgrades(),
        }
    }
}

fn initial_essence() -> u64 {
    INITIAL_ESSENCE
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn essence_or_initial<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let essence = Option::<u64>::deserialize(deserializer)?;
    Ok(essence.unwrap_or(INITIAL_ESSENCE))
}

fn upgrades_or_default<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<Upgrade>, D::Error> {
    let upgrades = Option::<Vec<Upgrade>>::deserialize(deserializer)?;
    Ok(upgrades.unwrap_or_else(default_upgrades))
}

/// A string key-value store, the shape of browser local storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistError>;
    fn remove(&mut self, key: &str) -> Result<(), PersistError>;
}

/// In-process store; contents are lost with the value.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let sanitized = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
            .collect::<String>();
        self.dir.join(format!("{sanitized}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistError> {
        match fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Reads and writes the hub [`Snapshot`] in a store.
#[derive(Debug)]
pub struct Persistence<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> Persistence<S> {
    /// Use the standard [`STORAGE_KEY`].
    pub fn new(store: S) -> Self {
        Self::with_key(store, STORAGE_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Load the saved snapshot, if there is a readable one.
    pub fn load(&self) -> Option<Snapshot> {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "could not read saved hub state");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(
                    key = %self.key,
                    error = %e,
                    "storage corruption detected, ignoring saved state"
                );
                None
            }
        }
    }

    /// Overwrite the saved record with `snapshot`.
    pub fn save(&mut self, snapshot: &Snapshot) -> Result<(), PersistError> {
        let content = serde_json::to_string(snapshot)?;
        self.store.set(&self.key, &content)
    }

    /// Remove the saved record.
    pub fn purge(&mut self) -> Result<(), PersistError> {
        self.store.remove(&self.key)
    }
}
