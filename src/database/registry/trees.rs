//! Tree metadata repository
//!
//! Row-level CRUD over the registry `trees` table. These methods operate on
//! an already-open connection; the per-call connection scoping lives in
//! [`crate::database::registry::Registry`].

use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row};
use serde::Serialize;

use crate::database::error::{StoreError, StoreResult};
use crate::database::registry::timestamp_from_row;

/// A registry row describing one tree
///
/// The id is surfaced as a string: callers treat it as an opaque stable
/// identifier even though it is backed by the SQLite rowid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeRecord {
    pub id: String,
    pub name: String,
    pub file_path: String,
    pub created_at: DateTime<Utc>,
    pub description: Option<String>,
}

/// Input for creating a tree record
#[derive(Debug, Clone)]
pub struct CreateTreeInput {
    pub name: String,
    pub description: Option<String>,
}

impl CreateTreeInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Partial update of a tree record; absent fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct UpdateTreeInput {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl UpdateTreeInput {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

const TREE_COLUMNS: &str = "id, name, file_path, created_at, description";

/// Repository for the registry `trees` table
pub struct TreeRepository<'a> {
    conn: &'a Connection,
}

impl<'a> TreeRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert a new tree row and return the stored record
    ///
    /// A unique-constraint collision on the name or the file path surfaces
    /// as [`StoreError::DuplicateName`].
    pub fn insert(
        &self,
        name: &str,
        file_path: &str,
        description: Option<&str>,
    ) -> StoreResult<TreeRecord> {
        self.conn
            .execute(
                "INSERT INTO trees (name, file_path, description) VALUES (?1, ?2, ?3)",
                rusqlite::params![name, file_path, description],
            )
            .map_err(|e| {
                if StoreError::is_constraint_violation(&e) {
                    StoreError::DuplicateName(name.to_string())
                } else {
                    StoreError::op("failed to insert tree record", e)
                }
            })?;

        let id = self.conn.last_insert_rowid();
        self.fetch_by_id(id)?
            .ok_or_else(|| StoreError::TreeNotFound(id.to_string()))
    }

    /// All trees ordered by name
    pub fn fetch_all(&self) -> StoreResult<Vec<TreeRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {TREE_COLUMNS} FROM trees ORDER BY name"
            ))
            .map_err(|e| StoreError::op("failed to prepare tree query", e))?;

        let rows = stmt
            .query_map([], record_from_row)
            .map_err(|e| StoreError::op("failed to query trees", e))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::op("failed to read tree row", e))
    }

    /// One tree by id, `None` when absent
    pub fn fetch_by_id(&self, id: i64) -> StoreResult<Option<TreeRecord>> {
        let result = self.conn.query_row(
            &format!("SELECT {TREE_COLUMNS} FROM trees WHERE id = ?1"),
            [id],
            record_from_row,
        );

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::op("failed to fetch tree by id", e)),
        }
    }

    /// One tree by name, `None` when absent
    pub fn fetch_by_name(&self, name: &str) -> StoreResult<Option<TreeRecord>> {
        let result = self.conn.query_row(
            &format!("SELECT {TREE_COLUMNS} FROM trees WHERE name = ?1"),
            [name],
            record_from_row,
        );

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::op("failed to fetch tree by name", e)),
        }
    }

    /// Apply a partial update and return the stored record
    ///
    /// An empty patch returns the current record unchanged. A missing id
    /// fails with `TreeNotFound`, checked both before and after the update.
    pub fn update(&self, id: i64, input: &UpdateTreeInput) -> StoreResult<TreeRecord> {
        if input.is_empty() {
            return self
                .fetch_by_id(id)?
                .ok_or_else(|| StoreError::TreeNotFound(id.to_string()));
        }

        if self.fetch_by_id(id)?.is_none() {
            return Err(StoreError::TreeNotFound(id.to_string()));
        }

        let mut assignments: Vec<&str> = Vec::new();
        let mut values: Vec<&dyn rusqlite::ToSql> = Vec::new();

        if let Some(name) = &input.name {
            assignments.push("name = ?");
            values.push(name);
        }
        if let Some(description) = &input.description {
            assignments.push("description = ?");
            values.push(description);
        }
        values.push(&id);

        let sql = format!(
            "UPDATE trees SET {} WHERE id = ?{}",
            assignments.join(", "),
            values.len()
        );
        self.conn.execute(&sql, &values[..]).map_err(|e| {
            if StoreError::is_constraint_violation(&e) {
                StoreError::DuplicateName(input.name.clone().unwrap_or_default())
            } else {
                StoreError::op("failed to update tree record", e)
            }
        })?;

        self.fetch_by_id(id)?
            .ok_or_else(|| StoreError::TreeNotFound(id.to_string()))
    }

    /// Remove the row only; never touches the filesystem
    ///
    /// Deleting an absent id is a silent no-op, matching the registry-level
    /// contract. Lifecycle operations that need a not-found signal resolve
    /// the record first.
    pub fn delete(&self, id: i64) -> StoreResult<()> {
        self.conn
            .execute("DELETE FROM trees WHERE id = ?1", [id])
            .map_err(|e| StoreError::op("failed to delete tree record", e))?;
        Ok(())
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<TreeRecord> {
    Ok(TreeRecord {
        id: row.get::<_, i64>(0)?.to_string(),
        name: row.get(1)?,
        file_path: row.get(2)?,
        created_at: timestamp_from_row(row, 3)?,
        description: row.get(4)?,
    })
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
    fn test_insert_roundtrip() {
        let db = test_conn();
        let repo = TreeRepository::new(&db.conn);

        let created = repo
            .insert("Smith", "trees/smith.db", Some("paternal line"))
            .unwrap();
        assert_eq!(created.name, "Smith");
        assert_eq!(created.file_path, "trees/smith.db");
        assert_eq!(created.description.as_deref(), Some("paternal line"));

        let id: i64 = created.id.parse().unwrap();
        let fetched = repo.fetch_by_id(id).unwrap().unwrap();
        assert_eq!(fetched, created);
    }

    #[test]
    fn test_duplicate_name_is_typed() {
        let db = test_conn();
        let repo = TreeRepository::new(&db.conn);

        repo.insert("Smith", "trees/smith.db", None).unwrap();
        let result = repo.insert("Smith", "trees/smith_2.db", None);
        assert!(matches!(result, Err(StoreError::DuplicateName(_))));
    }

    #[test]
    fn test_duplicate_file_path_is_typed() {
        let db = test_conn();
        let repo = TreeRepository::new(&db.conn);

        // "Smith Family" and "smith family" derive the same file path
        repo.insert("Smith Family", "trees/smith_family.db", None)
            .unwrap();
        let result = repo.insert("smith family", "trees/smith_family.db", None);
        assert!(matches!(result, Err(StoreError::DuplicateName(_))));
    }

    #[test]
    fn test_fetch_all_ordered_by_name() {
        let db = test_conn();
        let repo = TreeRepository::new(&db.conn);

        repo.insert("Walker", "trees/walker.db", None).unwrap();
        repo.insert("Andersson", "trees/andersson.db", None).unwrap();

        let names: Vec<String> = repo
            .fetch_all()
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["Andersson", "Walker"]);
    }

    #[test]
    fn test_fetch_missing_is_none() {
        let db = test_conn();
        let repo = TreeRepository::new(&db.conn);

        assert!(repo.fetch_by_id(999).unwrap().is_none());
        assert!(repo.fetch_by_name("Nobody").unwrap().is_none());
    }

    #[test]
    fn test_update_partial() {
        let db = test_conn();
        let repo = TreeRepository::new(&db.conn);

        let created = repo.insert("Smith", "trees/smith.db", None).unwrap();
        let id: i64 = created.id.parse().unwrap();

        let updated = repo
            .update(
                id,
                &UpdateTreeInput {
                    description: Some("maternal line".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.name, "Smith");
        assert_eq!(updated.description.as_deref(), Some("maternal line"));
        // the derived path is fixed at creation time
        assert_eq!(updated.file_path, "trees/smith.db");
    }

    #[test]
    fn test_update_empty_patch_returns_current() {
        let db = test_conn();
        let repo = TreeRepository::new(&db.conn);

        let created = repo.insert("Smith", "trees/smith.db", None).unwrap();
        let id: i64 = created.id.parse().unwrap();

        let unchanged = repo.update(id, &UpdateTreeInput::default()).unwrap();
        assert_eq!(unchanged, created);
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let db = test_conn();
        let repo = TreeRepository::new(&db.conn);

        let result = repo.update(
            42,
            &UpdateTreeInput {
                name: Some("Ghost".to_string()),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(StoreError::TreeNotFound(_))));

        let empty = repo.update(42, &UpdateTreeInput::default());
        assert!(matches!(empty, Err(StoreError::TreeNotFound(_))));
    }

    #[test]
    fn test_delete_is_silent_for_missing_rows() {
        let db = test_conn();
        let repo = TreeRepository::new(&db.conn);

        let created = repo.insert("Smith", "trees/smith.db", None).unwrap();
        let id: i64 = created.id.parse().unwrap();

        repo.delete(id).unwrap();
        assert!(repo.fetch_by_id(id).unwrap().is_none());
        repo.delete(id).unwrap();
    }
}
