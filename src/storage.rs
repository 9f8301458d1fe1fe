//! Persisted session entries with per-key expiry.
//!
//! Each key is stored as `{"value": ..., "expirationTime": <epoch ms>}`.
//! Reads go through [`get_with_expiration_check`], which drops entries whose
//! expiry has passed.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Key of the persisted bearer token.
pub const TOKEN_KEY: &str = "token";
/// Key of the persisted user type.
pub const USER_TYPE_KEY: &str = "userType";
/// Key of the persisted profile payload.
pub const USER_KEY: &str = "user";

/// A stored value with its own expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedEntry {
    pub value: sonic_rs::Value,
    #[serde(rename = "expirationTime")]
    pub expiration_time: i64,
}

impl PersistedEntry {
    pub fn new(value: sonic_rs::Value, expires_at: DateTime<Utc>) -> Self {
        Self {
            value,
            expiration_time: expires_at.timestamp_millis(),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp_millis() > self.expiration_time
    }
}

/// A synchronous key/value backend for persisted entries.
pub trait KeyValueStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<PersistedEntry>>;
    fn save(&self, key: &str, entry: PersistedEntry) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Reads `key`, deleting it and returning `None` if its expiry has passed.
pub fn get_with_expiration_check(
    store: &dyn KeyValueStore,
    key: &str,
    now: DateTime<Utc>,
) -> Result<Option<sonic_rs::Value>> {
    let Some(entry) = store.load(key)? else {
        return Ok(None);
    };

    if entry.is_expired(now) {
        tracing::debug!("⌛ Persisted entry '{}' expired, removing", key);
        store.remove(key)?;
        return Ok(None);
    }

    Ok(Some(entry.value))
}

/// Entries kept in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, PersistedEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, PersistedEntry>>> {
        self.entries
            .lock()
            .map_err(|_| AppError::Storage("memory store lock poisoned".to_string()))
    }

    /// Number of stored keys, expired or not.
    pub fn len(&self) -> usize {
        self.entries().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<PersistedEntry>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn save(&self, key: &str, entry: PersistedEntry) -> Result<()> {
        self.entries()?.insert(key.to_string(), entry);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries()?.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.entries()?.clear();
        Ok(())
    }
}

/// Entries kept in a single JSON file.
///
/// The whole file is rewritten on every change; it only ever holds a
/// handful of keys.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<HashMap<String, PersistedEntry>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(e.into()),
        };

        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(HashMap::new());
        }

        sonic_rs::from_slice(&bytes).map_err(|e| {
            AppError::Storage(format!("corrupt session file {}: {}", self.path.display(), e))
        })
    }

    fn write_all(&self, entries: &HashMap<String, PersistedEntry>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = sonic_rs::to_string(entries)
            .map_err(|e| AppError::Storage(format!("Session serialization failed: {}", e)))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.lock
            .lock()
            .map_err(|_| AppError::Storage("file store lock poisoned".to_string()))
    }
}

impl KeyValueStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<PersistedEntry>> {
        let _guard = self.guard()?;
        Ok(self.read_all()?.remove(key))
    }

    fn save(&self, key: &str, entry: PersistedEntry) -> Result<()> {
        let _guard = self.guard()?;
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), entry);
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.guard()?;
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let _guard = self.guard()?;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
