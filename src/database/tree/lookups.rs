//! Lookup tables
//!
//! The three lookup tables (place types, event types, event roles) share
//! one shape: `{id, name, key?}` with a unique key when present. One store
//! parameterized by table covers all three.

use rusqlite::{Connection, Row};
use serde::Serialize;

use crate::database::error::{StoreError, StoreResult};
use crate::database::tree::schema::{
    DEFAULT_EVENT_ROLES, DEFAULT_EVENT_TYPES, DEFAULT_PLACE_TYPES,
};

/// Which lookup table a [`LookupStore`] operates on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    PlaceTypes,
    EventTypes,
    EventRoles,
}

impl LookupKind {
    pub fn all() -> [LookupKind; 3] {
        [
            LookupKind::PlaceTypes,
            LookupKind::EventTypes,
            LookupKind::EventRoles,
        ]
    }

    pub fn table(&self) -> &'static str {
        match self {
            LookupKind::PlaceTypes => "place_types",
            LookupKind::EventTypes => "event_types",
            LookupKind::EventRoles => "event_roles",
        }
    }

    /// The default set seeded into a fresh tree
    pub fn defaults(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            LookupKind::PlaceTypes => DEFAULT_PLACE_TYPES,
            LookupKind::EventTypes => DEFAULT_EVENT_TYPES,
            LookupKind::EventRoles => DEFAULT_EVENT_ROLES,
        }
    }
}

impl std::fmt::Display for LookupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.table())
    }
}

/// One lookup row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupEntry {
    pub id: i64,
    pub name: String,
    pub key: Option<String>,
}

/// Repository over one of the three lookup tables
pub struct LookupStore<'a> {
    conn: &'a Connection,
    kind: LookupKind,
}

impl<'a> LookupStore<'a> {
    pub fn new(conn: &'a Connection, kind: LookupKind) -> Self {
        Self { conn, kind }
    }

    pub fn fetch_all(&self) -> StoreResult<Vec<LookupEntry>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT id, name, key FROM {} ORDER BY name",
                self.kind.table()
            ))
            .map_err(|e| StoreError::op("failed to prepare lookup query", e))?;

        let rows = stmt
            .query_map([], entry_from_row)
            .map_err(|e| StoreError::op(format!("failed to query {}", self.kind), e))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::op("failed to read lookup row", e))
    }

    pub fn fetch_by_id(&self, id: i64) -> StoreResult<Option<LookupEntry>> {
        let result = self.conn.query_row(
            &format!("SELECT id, name, key FROM {} WHERE id = ?1", self.kind.table()),
            [id],
            entry_from_row,
        );

        match result {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::op("failed to fetch lookup entry", e)),
        }
    }

    pub fn fetch_by_key(&self, key: &str) -> StoreResult<Option<LookupEntry>> {
        let result = self.conn.query_row(
            &format!("SELECT id, name, key FROM {} WHERE key = ?1", self.kind.table()),
            [key],
            entry_from_row,
        );

        match result {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::op("failed to fetch lookup entry by key", e)),
        }
    }

    /// Insert a custom entry; `key` must be unique when supplied
    pub fn insert(&self, name: &str, key: Option<&str>) -> StoreResult<LookupEntry> {
        self.conn
            .execute(
                &format!("INSERT INTO {} (name, key) VALUES (?1, ?2)", self.kind.table()),
                rusqlite::params![name, key],
            )
            .map_err(|e| {
                StoreError::op(format!("failed to insert into {}", self.kind), e)
            })?;

        Ok(LookupEntry {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            key: key.map(str::to_string),
        })
    }

    /// Delete an entry; fails while rows still reference it (RESTRICT)
    pub fn delete(&self, id: i64) -> StoreResult<bool> {
        let rows = self
            .conn
            .execute(
                &format!("DELETE FROM {} WHERE id = ?1", self.kind.table()),
                [id],
            )
            .map_err(|e| StoreError::op(format!("failed to delete from {}", self.kind), e))?;
        Ok(rows > 0)
    }

    pub fn count(&self) -> StoreResult<u64> {
        crate::database::core::table_count(self.conn, self.kind.table())
    }
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<LookupEntry> {
    Ok(LookupEntry {
        id: row.get(0)?,
        name: row.get(1)?,
        key: row.get(2)?,
    })
}
