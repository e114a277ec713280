// 🗄️ Storage - key/value adapter over SQLite
//
// Every store owns one fixed key and persists its whole collection as a JSON
// array under it. Loading is lenient: a record that fails to parse or
// validate is logged and dropped, the rest of the collection survives.

use crate::error::Result;
use crate::schema::Validate;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, warn};

pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Open (or create) a file-backed store in WAL mode
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!(path = %path.display(), journal_mode = %mode, "opened storage");

        let storage = Storage { conn };
        storage.setup()?;
        Ok(storage)
    }

    pub fn open_in_memory() -> Result<Self> {
        let storage = Storage {
            conn: Connection::open_in_memory()?,
        };
        storage.setup()?;
        Ok(storage)
    }

    fn setup(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    // ========================================================================
    // RAW KEY/VALUE ACCESS
    // ========================================================================

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Returns true if the key existed
    pub fn remove(&self, key: &str) -> Result<bool> {
        let removed = self.conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(removed > 0)
    }

    pub fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    pub fn keys(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT key FROM kv ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    // ========================================================================
    // COLLECTIONS
    // ========================================================================

    /// Load the JSON array stored under `key`, dropping invalid records
    pub fn load_collection<T>(&self, key: &str) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Validate,
    {
        let Some(raw) = self.get(key)? else {
            return Ok(Vec::new());
        };

        let values: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(values) => values,
            Err(e) => {
                warn!(key, error = %e, "stored value is not a JSON array, starting empty");
                return Ok(Vec::new());
            }
        };

        let total = values.len();
        let mut records = Vec::with_capacity(total);

        for (index, value) in values.into_iter().enumerate() {
            let record: T = match serde_json::from_value(value) {
                Ok(record) => record,
                Err(e) => {
                    warn!(key, index, error = %e, "dropping unparseable record");
                    continue;
                }
            };

            if let Err(errors) = record.validate() {
                for err in &errors {
                    warn!(key, index, %err, "dropping invalid record");
                }
                continue;
            }

            records.push(record);
        }

        if records.len() < total {
            warn!(key, kept = records.len(), total, "some records were dropped on load");
        }

        Ok(records)
    }

    /// Serialise the whole collection and overwrite `key`
    pub fn save_collection<T: Serialize>(&self, key: &str, records: &[T]) -> Result<()> {
        let json = serde_json::to_string(records)?;
        self.set(key, &json)?;
        debug!(key, count = records.len(), "persisted collection");
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Classroom;

    #[test]
    fn test_get_set_remove() {
        let storage = Storage::open_in_memory().unwrap();

        assert_eq!(storage.get("k").unwrap(), None);
        storage.set("k", "1").unwrap();
        storage.set("k", "2").unwrap();
        assert_eq!(storage.get("k").unwrap(), Some("2".to_string()));
        assert_eq!(storage.keys().unwrap(), vec!["k".to_string()]);

        assert!(storage.remove("k").unwrap());
        assert!(!storage.remove("k").unwrap());
        assert!(!storage.contains("k").unwrap());
    }

    #[test]
    fn test_collection_roundtrip() {
        let storage = Storage::open_in_memory().unwrap();
        let classes = vec![
            Classroom::new("Room 1", "Kim", 10.0).unwrap(),
            Classroom::new("Room 2", "Lee", 5.0).unwrap(),
        ];

        storage.save_collection("classes", &classes).unwrap();
        let loaded: Vec<Classroom> = storage.load_collection("classes").unwrap();

        assert_eq!(loaded, classes);
    }

    #[test]
    fn test_missing_key_loads_empty() {
        let storage = Storage::open_in_memory().unwrap();
        let loaded: Vec<Classroom> = storage.load_collection("nothing").unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_invalid_records_are_dropped() {
        let storage = Storage::open_in_memory().unwrap();
        let good = Classroom::new("Room 1", "Kim", 10.0).unwrap();

        let mut bad_rate = serde_json::to_value(&good).unwrap();
        bad_rate["id"] = serde_json::json!("other");
        bad_rate["taxRate"] = serde_json::json!(250.0);

        let raw = serde_json::json!([
            serde_json::to_value(&good).unwrap(),
            bad_rate,
            {"not": "a classroom"},
        ]);
        storage.set("classes", &raw.to_string()).unwrap();

        let loaded: Vec<Classroom> = storage.load_collection("classes").unwrap();
        assert_eq!(loaded, vec![good]);
    }

    #[test]
    fn test_corrupt_value_loads_empty() {
        let storage = Storage::open_in_memory().unwrap();
        storage.set("classes", "{ definitely not json").unwrap();

        let loaded: Vec<Classroom> = storage.load_collection("classes").unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_file_backed_storage_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("town.db");

        {
            let storage = Storage::open(&path).unwrap();
            storage.set("k", "v").unwrap();
        }

        let storage = Storage::open(&path).unwrap();
        assert_eq!(storage.get("k").unwrap(), Some("v".to_string()));
    }
}
