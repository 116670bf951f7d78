//! Registry storage
//!
//! The registry is the singleton database tracking which trees exist and
//! where their files live, plus global application settings. All public
//! operations open a scoped connection through the resolver, run, and
//! close it; nothing here holds a connection across calls.

pub mod schema;
mod settings;
mod trees;

pub use settings::{Setting, SettingsRepository};
pub use trees::{CreateTreeInput, TreeRecord, TreeRepository, UpdateTreeInput};

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::Row;

use crate::database::core::ConnectionResolver;
use crate::database::error::StoreResult;
use crate::database::layout::StorageLayout;

/// Parse a SQLite `CURRENT_TIMESTAMP` column ("YYYY-MM-DD HH:MM:SS", UTC)
pub(crate) fn timestamp_from_row(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.and_utc())
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

/// CRUD over tree metadata and settings, one scoped connection per call
pub struct Registry<'a> {
    resolver: &'a ConnectionResolver,
}

impl<'a> Registry<'a> {
    pub fn new(resolver: &'a ConnectionResolver) -> Self {
        Self { resolver }
    }

    /// Create a tree record, deriving its file path from the name
    ///
    /// The backing file is not created here; that is the lifecycle
    /// manager's job.
    pub fn create_tree(&self, input: &CreateTreeInput) -> StoreResult<TreeRecord> {
        let file_path = StorageLayout::tree_file_path(&input.name);
        self.resolver.with_registry(|conn| {
            TreeRepository::new(conn).insert(&input.name, &file_path, input.description.as_deref())
        })
    }

    /// Create a tree record pointing at an explicit, pre-existing file path
    ///
    /// Used when adopting an unregistered file; shares the uniqueness
    /// checks of [`Self::create_tree`].
    pub fn register_tree(
        &self,
        input: &CreateTreeInput,
        file_path: &str,
    ) -> StoreResult<TreeRecord> {
        self.resolver.with_registry(|conn| {
            TreeRepository::new(conn).insert(&input.name, file_path, input.description.as_deref())
        })
    }

    /// All trees ordered by name; empty when none exist
    pub fn get_all_trees(&self) -> StoreResult<Vec<TreeRecord>> {
        self.resolver
            .with_registry(|conn| TreeRepository::new(conn).fetch_all())
    }

    /// One tree by id; `Ok(None)` when absent
    pub fn get_tree_by_id(&self, tree_id: &str) -> StoreResult<Option<TreeRecord>> {
        let id = ConnectionResolver::parse_tree_id(tree_id)?;
        self.resolver
            .with_registry(|conn| TreeRepository::new(conn).fetch_by_id(id))
    }

    /// One tree by name; `Ok(None)` when absent
    pub fn get_tree_by_name(&self, name: &str) -> StoreResult<Option<TreeRecord>> {
        self.resolver
            .with_registry(|conn| TreeRepository::new(conn).fetch_by_name(name))
    }

    /// Partial update of name and/or description
    pub fn update_tree(&self, tree_id: &str, input: &UpdateTreeInput) -> StoreResult<TreeRecord> {
        let id = ConnectionResolver::parse_tree_id(tree_id)?;
        self.resolver
            .with_registry(|conn| TreeRepository::new(conn).update(id, input))
    }

    /// Remove the registry row only; never touches the filesystem
    pub fn delete_tree(&self, tree_id: &str) -> StoreResult<()> {
        let id = ConnectionResolver::parse_tree_id(tree_id)?;
        self.resolver
            .with_registry(|conn| TreeRepository::new(conn).delete(id))
    }

    pub fn get_setting(&self, key: &str) -> StoreResult<Option<String>> {
        self.resolver
            .with_registry(|conn| SettingsRepository::new(conn).get(key))
    }

    pub fn get_all_settings(&self) -> StoreResult<Vec<Setting>> {
        self.resolver
            .with_registry(|conn| SettingsRepository::new(conn).get_all())
    }

    pub fn set_setting(&self, key: &str, value: &str) -> StoreResult<()> {
        self.resolver
            .with_registry(|conn| SettingsRepository::new(conn).set(key, value))
    }

    pub fn delete_setting(&self, key: &str) -> StoreResult<bool> {
        self.resolver
            .with_registry(|conn| SettingsRepository::new(conn).delete(key))
    }

    pub fn setting_exists(&self, key: &str) -> StoreResult<bool> {
        self.resolver
            .with_registry(|conn| SettingsRepository::new(conn).exists(key))
    }
}
