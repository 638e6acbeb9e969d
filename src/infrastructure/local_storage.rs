use crate::infrastructure::error::TrackerError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const TOKEN_KEY: &str = "workout_tracker.token";
pub const CONFIG_KEY: &str = "workout_tracker.config";
pub const PENDING_WORKOUT_KEY: &str = "workout_tracker.pending_workout";
pub const PENDING_CALORIE_KEY: &str = "workout_tracker.pending_calorie";

/// String-valued key/value storage that survives process restarts.
pub trait LocalStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, TrackerError>;
    fn set(&self, key: &str, value: &str) -> Result<(), TrackerError>;
    fn remove(&self, key: &str) -> Result<(), TrackerError>;
}

pub fn save_json<T: Serialize>(
    storage: &dyn LocalStorage,
    key: &str,
    value: &T,
) -> Result<(), TrackerError> {
    let payload = serde_json::to_string(value)?;
    storage.set(key, &payload)
}

/// Loads and decodes a stored record. A payload that fails to decode is
/// reported as [`TrackerError::CorruptPendingState`] so callers can discard it.
pub fn load_json<T: DeserializeOwned>(
    storage: &dyn LocalStorage,
    key: &str,
) -> Result<Option<T>, TrackerError> {
    let Some(payload) = storage.get(key)? else {
        return Ok(None);
    };
    serde_json::from_str::<T>(&payload)
        .map(Some)
        .map_err(|error| TrackerError::CorruptPendingState(format!("{key}: {error}")))
}

#[derive(Debug, Clone)]
pub struct SqliteLocalStorage {
    db_path: PathBuf,
}

impl SqliteLocalStorage {
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    fn connect(&self) -> Result<Connection, TrackerError> {
        Connection::open(&self.db_path).map_err(TrackerError::from)
    }
}

impl LocalStorage for SqliteLocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, TrackerError> {
        let connection = self.connect()?;
        let value = connection
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), TrackerError> {
        let connection = self.connect()?;
        connection.execute(
            "INSERT INTO local_storage (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
               value = excluded.value,
               updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), TrackerError> {
        let connection = self.connect()?;
        connection.execute("DELETE FROM local_storage WHERE key = ?1", params![key])?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryLocalStorage {
    values: Mutex<HashMap<String, String>>,
}

impl InMemoryLocalStorage {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, TrackerError> {
        self.values
            .lock()
            .map_err(|error| TrackerError::InvalidConfig(format!("local storage lock poisoned: {error}")))
    }
}

impl LocalStorage for InMemoryLocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, TrackerError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), TrackerError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), TrackerError> {
        self.lock()?.remove(key);
        Ok(())
    }
}
