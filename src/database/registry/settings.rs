//! Settings repository
//!
//! Global key/value settings stored in the registry. Values are plain
//! strings; writes are upserts that refresh `updated_at`.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;

use crate::database::error::{StoreError, StoreResult};
use crate::database::registry::timestamp_from_row;

/// A single settings row
#[derive(Debug, Clone, Serialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

/// Repository for the registry `settings` table
pub struct SettingsRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SettingsRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Get a setting value, `None` when the key is absent
    pub fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let result = self.conn.query_row(
            "SELECT value FROM settings WHERE key = ?1",
            [key],
            |row| row.get(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::op("failed to get setting", e)),
        }
    }

    /// Get all settings ordered by key
    pub fn get_all(&self) -> StoreResult<Vec<Setting>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, value, updated_at FROM settings ORDER BY key")
            .map_err(|e| StoreError::op("failed to prepare settings query", e))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(Setting {
                    key: row.get(0)?,
                    value: row.get(1)?,
                    updated_at: timestamp_from_row(row, 2)?,
                })
            })
            .map_err(|e| StoreError::op("failed to query settings", e))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::op("failed to read settings row", e))
    }

    /// Create or overwrite a setting
    pub fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO settings (key, value, updated_at) \
                 VALUES (?1, ?2, CURRENT_TIMESTAMP)",
                [key, value],
            )
            .map_err(|e| StoreError::op("failed to set setting", e))?;
        Ok(())
    }

    /// Delete a setting; returns whether a row was removed
    pub fn delete(&self, key: &str) -> StoreResult<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM settings WHERE key = ?1", [key])
            .map_err(|e| StoreError::op("failed to delete setting", e))?;
        Ok(rows > 0)
    }

    pub fn exists(&self, key: &str) -> StoreResult<bool> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM settings WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .map_err(|e| StoreError::op("failed to check setting existence", e))?;
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::core::DatabaseConn;
    use crate::database::registry::schema::init_registry_schema;

    fn test_conn() -> DatabaseConn {
        let db = DatabaseConn::open_in_memory().unwrap();
        init_registry_schema(&db.conn).unwrap();
        db
    }

    #[test]
    fn test_set_get_roundtrip() {
        let db = test_conn();
        let repo = SettingsRepository::new(&db.conn);

        repo.set("default_tree", "3").unwrap();
        assert_eq!(repo.get("default_tree").unwrap(), Some("3".to_string()));
        assert_eq!(repo.get("missing").unwrap(), None);
    }

    #[test]
    fn test_set_overwrites() {
        let db = test_conn();
        let repo = SettingsRepository::new(&db.conn);

        repo.set("language", "en").unwrap();
        repo.set("language", "sv").unwrap();
        assert_eq!(repo.get("language").unwrap(), Some("sv".to_string()));
    }

    #[test]
    fn test_delete_and_exists() {
        let db = test_conn();
        let repo = SettingsRepository::new(&db.conn);

        repo.set("language", "en").unwrap();
        assert!(repo.exists("language").unwrap());
        assert!(repo.delete("language").unwrap());
        assert!(!repo.exists("language").unwrap());
        assert!(!repo.delete("language").unwrap());
    }

    #[test]
    fn test_get_all_ordered() {
        let db = test_conn();
        let repo = SettingsRepository::new(&db.conn);

        repo.set("zoom", "1.5").unwrap();
        repo.set("language", "en").unwrap();

        let all = repo.get_all().unwrap();
        let keys: Vec<&str> = all.iter().map(|s| s.key.as_str()).collect();
        // schema_version is stamped by init
        assert_eq!(keys, vec!["language", "schema_version", "zoom"]);
    }
}
