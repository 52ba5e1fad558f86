//! Key-value storage with browser `localStorage` semantics.
//!
//! Values are opaque strings (JSON documents in practice), always read
//! and written whole. There is no cross-writer transaction: two writers
//! on the same key race and the last write wins.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::{params, Connection};

use super::{open_database, DatabaseError};

/// Whole-value string storage keyed by name.
pub trait KeyValueStore: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, DatabaseError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), DatabaseError>;
    fn remove_item(&self, key: &str) -> Result<(), DatabaseError>;
}

/// Process-local store. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let items = self.items.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        let mut items = self.items.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), DatabaseError> {
        let mut items = self.items.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        items.remove(key);
        Ok(())
    }
}

/// SQLite-backed store. Opens a connection per operation, so several
/// stores (or processes) may point at the same file.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    /// Open (or create) the store, running migrations eagerly so that
    /// schema problems surface at startup.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        open_database(path)?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, DatabaseError> {
        open_database(&self.path)
    }
}

impl KeyValueStore for SqliteStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT value FROM local_storage WHERE key = ?1")?;
        match stmt.query_row([key], |row| row.get::<_, String>(0)) {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DatabaseError::from(e)),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO local_storage (key, value, updated_at)
             VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), DatabaseError> {
        let conn = self.connect()?;
        conn.execute("DELETE FROM local_storage WHERE key = ?1", [key])?;
        Ok(())
    }
}
