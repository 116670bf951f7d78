//! Registry schema management
//!
//! The registry is the singleton database that maps tree ids to file
//! locations and holds application settings. Creation is idempotent and is
//! applied on every store open.

use rusqlite::Connection;

use crate::database::error::{StoreError, StoreResult};
use crate::database::registry::settings::SettingsRepository;

/// Current registry schema version, stamped into the settings table
pub const REGISTRY_SCHEMA_VERSION: u32 = 1;

/// Settings key under which the schema version is stored
pub const SCHEMA_VERSION_KEY: &str = "schema_version";

/// Schema definitions for the registry database
pub struct RegistrySchema;

impl RegistrySchema {
    /// Trees table: one row per tree, unique name and unique backing file path
    pub const TREES_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS trees (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            file_path TEXT NOT NULL UNIQUE,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            description TEXT
        );
    "#;

    /// Settings table: global key/value pairs
    pub const SETTINGS_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );
    "#;

    pub const INDEXES: &'static [&'static str] = &[
        "CREATE INDEX IF NOT EXISTS trees_name_index ON trees (name)",
        "CREATE INDEX IF NOT EXISTS settings_key_index ON settings (key)",
    ];
}

/// Idempotently create the registry tables and indexes
///
/// Safe to call on every process startup. Also stamps the schema version
/// into the settings table.
pub fn init_registry_schema(conn: &Connection) -> StoreResult<()> {
    conn.execute(RegistrySchema::TREES_TABLE, [])
        .map_err(|e| StoreError::op("failed to create trees table", e))?;

    conn.execute(RegistrySchema::SETTINGS_TABLE, [])
        .map_err(|e| StoreError::op("failed to create settings table", e))?;

    for index_sql in RegistrySchema::INDEXES {
        conn.execute(index_sql, [])
            .map_err(|e| StoreError::op("failed to create registry index", e))?;
    }

    SettingsRepository::new(conn).set(SCHEMA_VERSION_KEY, &REGISTRY_SCHEMA_VERSION.to_string())?;

    Ok(())
}
