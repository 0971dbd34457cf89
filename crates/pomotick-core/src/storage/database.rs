//! SQLite-backed key-value storage.
//!
//! Every persisted field lives in a single `kv` table as a JSON-encoded
//! value, so partial saves are plain upserts and unknown keys are ignored.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::{params, Connection};
use serde_json::Value;

use super::data_dir;
use super::store::{KvBackend, StateMap};
use crate::error::StorageError;

const DB_FILE: &str = "pomotick.db";

/// SQLite database holding the application state.
///
/// The connection sits behind a mutex so the countdown task and the
/// caller can share one handle.
pub struct Database {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl Database {
    /// Open the database at `<data dir>/pomotick.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory is unavailable or the
    /// database cannot be opened or migrated.
    pub fn open() -> Result<Self, StorageError> {
        let path = data_dir()?.join(DB_FILE);
        Self::open_at(&path)
    }

    /// Open (or create) a database file at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
            path: None,
        };
        db.migrate()?;
        Ok(db)
    }

    /// Location of the database file, `None` for in-memory databases.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn migrate(&self) -> Result<(), StorageError> {
        self.conn().execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Get a raw value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a raw value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn().execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Upsert several values in one transaction.
    pub fn kv_set_many<'a, I>(&self, entries: I) -> Result<(), StorageError>
    where
        I: IntoIterator<Item = (&'a str, String)>,
    {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare("INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)")?;
            for (key, value) in entries {
                stmt.execute(params![key, value])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// All stored keys, sorted.
    pub fn kv_keys(&self) -> Result<Vec<String>, StorageError> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT key FROM kv ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }
}

impl KvBackend for Database {
    fn read(&self, key: &str) -> Result<Option<Value>, StorageError> {
        match self.kv_get(key)? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|source| StorageError::Encoding {
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    fn write(&self, state: &StateMap) -> Result<(), StorageError> {
        let mut encoded = Vec::with_capacity(state.len());
        for (key, value) in state {
            let raw = serde_json::to_string(value).map_err(|source| StorageError::Encoding {
                key: key.clone(),
                source,
            })?;
            encoded.push((key.as_str(), raw));
        }
        self.kv_set_many(encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
    }

    #[test]
    fn write_merges_with_existing_keys() {
        let db = Database::open_memory().unwrap();
        let mut first = StateMap::new();
        first.insert("mode".into(), json!("focus"));
        first.insert("remaining_seconds".into(), json!(1500));
        db.write(&first).unwrap();

        let mut second = StateMap::new();
        second.insert("remaining_seconds".into(), json!(42));
        db.write(&second).unwrap();

        assert_eq!(db.read("mode").unwrap(), Some(json!("focus")));
        assert_eq!(db.read("remaining_seconds").unwrap(), Some(json!(42)));
        assert_eq!(db.kv_keys().unwrap(), vec!["mode", "remaining_seconds"]);
    }

    #[test]
    fn corrupt_value_reports_encoding_error() {
        let db = Database::open_memory().unwrap();
        db.kv_set("mode", "{not json").unwrap();
        assert!(matches!(
            db.read("mode"),
            Err(StorageError::Encoding { ref key, .. }) if key == "mode"
        ));
    }

    #[test]
    fn file_database_survives_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("state.db");
        {
            let db = Database::open_at(&path).unwrap();
            db.kv_set("current_task", "\"write docs\"").unwrap();
        }
        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.path(), Some(path.as_path()));
        assert_eq!(db.read("current_task").unwrap(), Some(json!("write docs")));
    }

    #[test]
    fn open_at_unwritable_path_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("missing").join("nested").join("state.db");
        assert!(matches!(
            Database::open_at(&path),
            Err(StorageError::OpenFailed { .. })
        ));
    }
}
