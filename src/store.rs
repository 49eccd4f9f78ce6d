// Key-value persistence layer.
//
// Records are stored as JSON values under string keys, namespaced by
// record kind ("holder:<id>", "account:<id>"). The `KvStore` trait is the
// seam the services are injected with; `SqliteStore` is the production
// backend, `MemoryStore` backs tests and ephemeral runs.

use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Primary-key CRUD over JSON values.
pub trait KvStore: Send + Sync {
    /// Insert or overwrite the value stored under `key`.
    fn put(&self, key: &str, value: &serde_json::Value) -> Result<(), StoreError>;

    /// Fetch the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError>;

    /// Fetch all values whose key starts with `prefix`, ordered by key.
    fn scan(&self, prefix: &str) -> Result<Vec<serde_json::Value>, StoreError>;

    /// Remove the value stored under `key`. Returns whether a value existed.
    fn delete(&self, key: &str) -> Result<bool, StoreError>;
}

// ============================================================================
// Typed helpers
// ============================================================================

pub fn put_record<T: Serialize>(
    store: &dyn KvStore,
    key: &str,
    record: &T,
) -> Result<(), StoreError> {
    let value = serde_json::to_value(record)?;
    store.put(key, &value)
}

pub fn get_record<T: DeserializeOwned>(
    store: &dyn KvStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match store.get(key)? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

pub fn scan_records<T: DeserializeOwned>(
    store: &dyn KvStore,
    prefix: &str,
) -> Result<Vec<T>, StoreError> {
    store
        .scan(prefix)?
        .into_iter()
        .map(|value| serde_json::from_value(value).map_err(StoreError::from))
        .collect()
}

// ============================================================================
// SQLite backend
// ============================================================================

/// SQLite-backed store. A single `records` table holds every record kind;
/// the connection is shared behind a mutex, so access is serialized.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS records (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(SqliteStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Backend("connection mutex poisoned".to_string()))
    }
}

impl KvStore for SqliteStore {
    fn put(&self, key: &str, value: &serde_json::Value) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO records (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value.to_string()],
        )?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT value FROM records WHERE key = ?1")?;
        let mut rows = stmt.query(params![key])?;

        match rows.next()? {
            Some(row) => {
                let raw: String = row.get(0)?;
                Ok(Some(serde_json::from_str(&raw)?))
            }
            None => Ok(None),
        }
    }

    fn scan(&self, prefix: &str) -> Result<Vec<serde_json::Value>, StoreError> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT value FROM records WHERE key LIKE ?1 ORDER BY key")?;
        let pattern = format!("{}%", prefix);

        let mut values = Vec::new();
        let mut rows = stmt.query(params![pattern])?;
        while let Some(row) = rows.next()? {
            let raw: String = row.get(0)?;
            values.push(serde_json::from_str(&raw)?);
        }
        Ok(values)
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let affected = conn.execute("DELETE FROM records WHERE key = ?1", params![key])?;
        Ok(affected > 0)
    }
}

// ============================================================================
// In-memory backend
// ============================================================================

/// In-memory store. BTreeMap keeps scans ordered by key, matching the
/// SQLite backend.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<String, serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, BTreeMap<String, serde_json::Value>>, StoreError>
    {
        self.records
            .read()
            .map_err(|_| StoreError::Backend("records lock poisoned".to_string()))
    }

    fn write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, BTreeMap<String, serde_json::Value>>, StoreError>
    {
        self.records
            .write()
            .map_err(|_| StoreError::Backend("records lock poisoned".to_string()))
    }
}

impl KvStore for MemoryStore {
    fn put(&self, key: &str, value: &serde_json::Value) -> Result<(), StoreError> {
        self.write()?.insert(key.to_string(), value.clone());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        Ok(self.read()?.get(key).cloned())
    }

    fn scan(&self, prefix: &str) -> Result<Vec<serde_json::Value>, StoreError> {
        Ok(self
            .read()?
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(_, value)| value.clone())
            .collect())
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.write()?.remove(key).is_some())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        count: u32,
    }

    fn backends() -> Vec<Box<dyn KvStore>> {
        vec![
            Box::new(MemoryStore::new()),
            Box::new(SqliteStore::open_in_memory().unwrap()),
        ]
    }

    #[test]
    fn test_put_get_roundtrip() {
        for store in backends() {
            let sample = Sample {
                name: "alpha".to_string(),
                count: 3,
            };
            put_record(store.as_ref(), "sample:1", &sample).unwrap();

            let loaded: Sample = get_record(store.as_ref(), "sample:1").unwrap().unwrap();
            assert_eq!(loaded, sample);
        }
    }

    #[test]
    fn test_get_missing_returns_none() {
        for store in backends() {
            let loaded: Option<Sample> = get_record(store.as_ref(), "sample:missing").unwrap();
            assert!(loaded.is_none());
        }
    }

    #[test]
    fn test_put_overwrites_existing() {
        for store in backends() {
            let first = Sample {
                name: "alpha".to_string(),
                count: 1,
            };
            let second = Sample {
                name: "alpha".to_string(),
                count: 2,
            };
            put_record(store.as_ref(), "sample:1", &first).unwrap();
            put_record(store.as_ref(), "sample:1", &second).unwrap();

            let loaded: Sample = get_record(store.as_ref(), "sample:1").unwrap().unwrap();
            assert_eq!(loaded.count, 2);
        }
    }

    #[test]
    fn test_scan_respects_prefix() {
        for store in backends() {
            for (key, name) in [
                ("sample:1", "alpha"),
                ("sample:2", "beta"),
                ("other:1", "gamma"),
            ] {
                let record = Sample {
                    name: name.to_string(),
                    count: 0,
                };
                put_record(store.as_ref(), key, &record).unwrap();
            }

            let samples: Vec<Sample> = scan_records(store.as_ref(), "sample:").unwrap();
            assert_eq!(samples.len(), 2);
            assert_eq!(samples[0].name, "alpha");
            assert_eq!(samples[1].name, "beta");
        }
    }

    #[test]
    fn test_scan_empty_prefix_returns_nothing_when_empty() {
        for store in backends() {
            let samples: Vec<Sample> = scan_records(store.as_ref(), "sample:").unwrap();
            assert!(samples.is_empty());
        }
    }

    #[test]
    fn test_delete_removes_record() {
        for store in backends() {
            let sample = Sample {
                name: "alpha".to_string(),
                count: 0,
            };
            put_record(store.as_ref(), "sample:1", &sample).unwrap();

            assert!(store.delete("sample:1").unwrap());
            let loaded: Option<Sample> = get_record(store.as_ref(), "sample:1").unwrap();
            assert!(loaded.is_none());

            // Second delete reports nothing was there
            assert!(!store.delete("sample:1").unwrap());
        }
    }
}
