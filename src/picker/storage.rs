//! Best-effort persistence over an opaque string key-value store.
//!
//! One JSON document per key. Reads absorb every failure mode into "absent";
//! writes log and move on. Durability is strictly best-effort.

use crate::picker::normalize;
use crate::picker::state::PersistedState;
use log::{info, warn};
use rand::Rng;
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::fs;
use std::io;
use std::path::PathBuf;

/// Current-schema storage key.
pub const PRIMARY_KEY: &str = "random-items-pro";
/// Oldest format, a bare JSON array of labels. Read-only, migration only.
pub const LEGACY_KEY: &str = "random-items";
/// Backup written by an earlier release. Read-only, migration only.
pub const BACKUP_KEY: &str = "random-items-pro-backup";

/// One string value per key.
pub trait KvStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> io::Result<()>;
}

impl KvStore for Box<dyn KvStore> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        (**self).set(key, value)
    }
}

/// One `<key>.json` file per key under the save directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.key_path(key)).ok()
    }

    fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.key_path(key), value)
    }
}

/// Keeps everything in memory; used when persistence is switched off.
#[derive(Debug, Default)]
pub struct MemStore {
    values: FxHashMap<String, String>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Reads a key as JSON. A missing value, unparseable text, and JSON `null`
/// all count as absent.
pub fn safe_load_raw<S: KvStore + ?Sized>(store: &S, key: &str) -> Option<Value> {
    let raw = store.get(key)?;
    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Null) => None,
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Discarding unparseable value under '{key}': {e}");
            None
        }
    }
}

/// Best-effort write. A storage failure costs durability, nothing else.
pub fn safe_save<S: KvStore + ?Sized>(store: &mut S, key: &str, state: &PersistedState) {
    let payload = match serde_json::to_string(state) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Failed to serialize state: {e}");
            return;
        }
    };
    if let Err(e) = store.set(key, &payload) {
        warn!("Failed to persist state under '{key}': {e}");
    }
}

/// Startup load. The primary key wins whenever it holds anything; otherwise
/// the legacy keys are tried in order and the first candidate that migrates
/// to a non-empty item list is adopted. Runs once per process.
pub fn load_initial<S: KvStore + ?Sized, R: Rng>(store: &S, rng: &mut R) -> PersistedState {
    if let Some(raw) = safe_load_raw(store, PRIMARY_KEY) {
        return normalize::normalize_state(&raw, rng);
    }
    for key in [LEGACY_KEY, BACKUP_KEY] {
        let Some(raw) = safe_load_raw(store, key) else {
            continue;
        };
        let candidate = normalize::normalize_state(&raw, rng);
        if !candidate.items.is_empty() {
            info!(
                "Migrated {} item(s) from legacy key '{key}'",
                candidate.items.len()
            );
            return candidate;
        }
    }
    PersistedState::default()
}
