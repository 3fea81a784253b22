//! Durable client-side storage for the session.
//!
//! Only two values survive a restart: the credential and the current
//! tribe. They live under independent [`StorageKey`]s; clearing one never
//! clears the other. Nothing outside [`SessionStore`](crate::SessionStore)
//! writes to a [`KeyValueStorage`].

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, warn};

const APP_DIR: &str = "eid-portal";
const SESSION_FILE: &str = "session.json";

/// The persisted keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    /// Bearer credential.
    Credential,
    /// Current tribe context.
    CurrentTribe,
}

impl StorageKey {
    /// Name of the key inside the backing store.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Credential => "credential",
            Self::CurrentTribe => "current_tribe",
        }
    }
}

/// A string key/value store that outlives the process.
///
/// Write failures are logged by the implementation and do not abort the
/// caller; the in-memory session stays authoritative for the current run.
pub trait KeyValueStorage: Send + Sync {
    /// Read a value.
    fn get(&self, key: StorageKey) -> Option<String>;
    /// Write a value.
    fn set(&self, key: StorageKey, value: &str);
    /// Delete a value. Deleting a missing key is a no-op.
    fn remove(&self, key: StorageKey);
}

// ---------------------------------------------------------------------------
// MemoryStorage
// ---------------------------------------------------------------------------

/// Process-local storage, for tests and embedders that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<StorageKey, String>>,
}

impl MemoryStorage {
    /// Empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated with `entries`.
    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (StorageKey, &'a str)>) -> Self {
        let values = entries
            .into_iter()
            .map(|(k, v)| (k, v.to_string()))
            .collect();
        Self {
            values: Mutex::new(values),
        }
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: StorageKey) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
    }

    fn set(&self, key: StorageKey, value: &str) {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value.to_string());
    }

    fn remove(&self, key: StorageKey) {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key);
    }
}

// ---------------------------------------------------------------------------
// FileStorage
// ---------------------------------------------------------------------------

/// JSON file storage (`{"credential": "...", "current_tribe": "..."}`).
///
/// The file is read once on construction and rewritten on every change.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    values: Mutex<HashMap<String, String>>,
}

impl FileStorage {
    /// Open (or lazily create) the store at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = load(&path);
        Self {
            path,
            values: Mutex::new(values),
        }
    }

    /// Open the store in the platform config directory
    /// (e.g. `~/.config/eid-portal/session.json`).
    pub fn default_location() -> Option<Self> {
        let dir = dirs::config_dir()?.join(APP_DIR);
        Some(Self::open(dir.join(SESSION_FILE)))
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn update(&self, mutate: impl FnOnce(&mut HashMap<String, String>)) {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        mutate(&mut values);
        save(&self.path, &values);
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: StorageKey) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key.as_str())
            .cloned()
    }

    fn set(&self, key: StorageKey, value: &str) {
        self.update(|values| {
            values.insert(key.as_str().to_string(), value.to_string());
        });
    }

    fn remove(&self, key: StorageKey) {
        self.update(|values| {
            values.remove(key.as_str());
        });
    }
}

fn load(path: &Path) -> HashMap<String, String> {
    if !path.exists() {
        return HashMap::new();
    }

    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<HashMap<String, String>>(&content) {
            Ok(values) => {
                debug!(path = %path.display(), keys = values.len(), "session storage loaded");
                values
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to parse session storage");
                HashMap::new()
            }
        },
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read session storage");
            HashMap::new()
        }
    }
}

fn save(path: &Path, values: &HashMap<String, String>) {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            if let Err(e) = fs::create_dir_all(dir) {
                warn!(path = %dir.display(), error = %e, "failed to create storage directory");
                return;
            }
        }
    }

    match serde_json::to_string_pretty(values) {
        Ok(json) => {
            if let Err(e) = fs::write(path, json) {
                warn!(path = %path.display(), error = %e, "failed to write session storage");
            }
        }
        Err(e) => {
            warn!(error = %e, "failed to serialize session storage");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("eid-sdk-test-{}-{name}", std::process::id()))
            .join(SESSION_FILE)
    }

    #[test]
    fn memory_keys_are_independent() {
        let storage = MemoryStorage::new();
        storage.set(StorageKey::Credential, "tok");
        storage.set(StorageKey::CurrentTribe, "Fire");
        storage.remove(StorageKey::Credential);
        assert_eq!(storage.get(StorageKey::Credential), None);
        assert_eq!(storage.get(StorageKey::CurrentTribe).as_deref(), Some("Fire"));
    }

    #[test]
    fn file_storage_survives_reopen() {
        let path = temp_path("reopen");
        let _ = fs::remove_file(&path);

        let storage = FileStorage::open(&path);
        storage.set(StorageKey::Credential, "tok-1");
        storage.set(StorageKey::CurrentTribe, "Water");
        drop(storage);

        let reopened = FileStorage::open(&path);
        assert_eq!(reopened.get(StorageKey::Credential).as_deref(), Some("tok-1"));
        assert_eq!(reopened.get(StorageKey::CurrentTribe).as_deref(), Some("Water"));

        reopened.remove(StorageKey::Credential);
        let again = FileStorage::open(&path);
        assert_eq!(again.get(StorageKey::Credential), None);
        assert_eq!(again.get(StorageKey::CurrentTribe).as_deref(), Some("Water"));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let path = temp_path("corrupt");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json").unwrap();

        let storage = FileStorage::open(&path);
        assert_eq!(storage.get(StorageKey::Credential), None);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
