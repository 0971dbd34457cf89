//! Best-effort key-value state store.
//!
//! The timer and the task ledger each save a partial map of fields and
//! load by overlaying stored values onto their own defaults. Nothing here
//! ever fails the caller: backend errors are logged and the caller keeps
//! its in-memory state.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::database::Database;
use crate::error::{Result, StorageError};

/// A partial or complete snapshot of persisted fields, keyed by name.
pub type StateMap = serde_json::Map<String, Value>;

/// Logical field names shared by every backend.
pub mod keys {
    pub const FOCUS_DURATION: &str = "focus_duration";
    pub const BREAK_DURATION: &str = "break_duration";
    pub const REMAINING_SECONDS: &str = "remaining_seconds";
    pub const MODE: &str = "mode";
    pub const COMPLETED_FOCUS_COUNT: &str = "completed_focus_count";
    pub const TASK_HISTORY: &str = "task_history";
    pub const CURRENT_TASK: &str = "current_task";
}

/// Durable storage for JSON values keyed by field name.
pub trait KvBackend: Send + Sync {
    /// Read one key. `Ok(None)` when the key was never written.
    fn read(&self, key: &str) -> Result<Option<Value>, StorageError>;

    /// Merge the given keys into storage, leaving other keys untouched.
    fn write(&self, state: &StateMap) -> Result<(), StorageError>;
}

/// In-process backend. Used by tests and as the fallback when the
/// database cannot be opened.
#[derive(Default)]
pub struct MemoryBackend {
    map: Mutex<StateMap>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let map = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(map.get(key).cloned())
    }

    fn write(&self, state: &StateMap) -> Result<(), StorageError> {
        let mut map = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        for (key, value) in state {
            map.insert(key.clone(), value.clone());
        }
        Ok(())
    }
}

/// Shared handle over a [`KvBackend`] with log-and-degrade semantics.
#[derive(Clone)]
pub struct Store {
    backend: Arc<dyn KvBackend>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

impl Store {
    pub fn new(backend: impl KvBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// A store that forgets everything at process exit.
    pub fn memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    /// Open the SQLite store in the per-user data directory.
    pub fn open() -> Result<Self> {
        let db = Database::open()?;
        info!(path = ?db.path(), "opened state database");
        Ok(Self::new(db))
    }

    /// Open the SQLite store at an explicit file path.
    pub fn open_at(path: &Path) -> Result<Self> {
        Ok(Self::new(Database::open_at(path)?))
    }

    /// Like [`Store::open`], falling back to an in-memory store when the
    /// database cannot be opened.
    pub fn open_default() -> Self {
        match Self::open() {
            Ok(store) => store,
            Err(e) => {
                error!("Failed to open state database, state will not persist: {e}");
                Self::memory()
            }
        }
    }

    /// Merge `state` into durable storage. Returns false if the write
    /// failed; the failure is logged, never raised.
    pub fn save(&self, state: &StateMap) -> bool {
        match self.backend.write(state) {
            Ok(()) => {
                debug!(keys = ?state.keys().collect::<Vec<_>>(), "saved state");
                true
            }
            Err(e) => {
                error!("Failed to save application state: {e}");
                false
            }
        }
    }

    /// Return `defaults` with every key that has a stored value replaced
    /// by that value. Keys that are missing or unreadable keep their
    /// default.
    pub fn load(&self, defaults: StateMap) -> StateMap {
        let mut state = defaults;
        for (key, value) in state.iter_mut() {
            match self.backend.read(key) {
                Ok(Some(stored)) => {
                    debug!(key = %key, "loaded state item");
                    *value = stored;
                }
                Ok(None) => {}
                Err(e) => error!("Failed to load state item '{key}': {e}"),
            }
        }
        state
    }
}

/// Decode one field of a loaded map, falling back to `default` when the
/// field is absent or has the wrong shape.
pub fn field<T: DeserializeOwned>(state: &StateMap, key: &str, default: T) -> T {
    match state.get(key) {
        Some(value) => match serde_json::from_value(value.clone()) {
            Ok(v) => v,
            Err(e) => {
                warn!("Ignoring malformed stored value for '{key}': {e}");
                default
            }
        },
        None => default,
    }
}
