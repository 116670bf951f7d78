//! Places
//!
//! Places form a tree through `parent_id` (a city under a county under a
//! country). Deleting a parent nullifies its children's `parent_id` at the
//! schema level.

use rusqlite::{Connection, Row};
use serde::Serialize;

use crate::database::error::{StoreError, StoreResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Place {
    pub id: i64,
    pub name: String,
    pub type_id: i64,
    pub parent_id: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Input for creating or replacing a place
#[derive(Debug, Clone)]
pub struct NewPlace {
    pub name: String,
    pub type_id: i64,
    pub parent_id: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

const PLACE_COLUMNS: &str = "id, name, type_id, parent_id, latitude, longitude";

pub struct PlaceStore<'a> {
    conn: &'a Connection,
}

impl<'a> PlaceStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, place: &NewPlace) -> StoreResult<Place> {
        self.conn
            .execute(
                "INSERT INTO places (name, type_id, parent_id, latitude, longitude) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    place.name,
                    place.type_id,
                    place.parent_id,
                    place.latitude,
                    place.longitude
                ],
            )
            .map_err(|e| StoreError::op("failed to insert place", e))?;

        Ok(Place {
            id: self.conn.last_insert_rowid(),
            name: place.name.clone(),
            type_id: place.type_id,
            parent_id: place.parent_id,
            latitude: place.latitude,
            longitude: place.longitude,
        })
    }

    pub fn fetch_all(&self) -> StoreResult<Vec<Place>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {PLACE_COLUMNS} FROM places ORDER BY name"))
            .map_err(|e| StoreError::op("failed to prepare place query", e))?;

        let rows = stmt
            .query_map([], place_from_row)
            .map_err(|e| StoreError::op("failed to query places", e))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::op("failed to read place row", e))
    }

    pub fn fetch_by_id(&self, id: i64) -> StoreResult<Option<Place>> {
        let result = self.conn.query_row(
            &format!("SELECT {PLACE_COLUMNS} FROM places WHERE id = ?1"),
            [id],
            place_from_row,
        );

        match result {
            Ok(place) => Ok(Some(place)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::op("failed to fetch place", e)),
        }
    }

    /// Direct children of a place
    pub fn fetch_children(&self, parent_id: i64) -> StoreResult<Vec<Place>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {PLACE_COLUMNS} FROM places WHERE parent_id = ?1 ORDER BY name"
            ))
            .map_err(|e| StoreError::op("failed to prepare child place query", e))?;

        let rows = stmt
            .query_map([parent_id], place_from_row)
            .map_err(|e| StoreError::op("failed to query child places", e))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::op("failed to read place row", e))
    }

    /// Replace all mutable fields of a place
    pub fn update(&self, id: i64, place: &NewPlace) -> StoreResult<bool> {
        let rows = self
            .conn
            .execute(
                "UPDATE places SET name = ?1, type_id = ?2, parent_id = ?3, \
                 latitude = ?4, longitude = ?5 WHERE id = ?6",
                rusqlite::params![
                    place.name,
                    place.type_id,
                    place.parent_id,
                    place.latitude,
                    place.longitude,
                    id
                ],
            )
            .map_err(|e| StoreError::op("failed to update place", e))?;
        Ok(rows > 0)
    }

    pub fn delete(&self, id: i64) -> StoreResult<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM places WHERE id = ?1", [id])
            .map_err(|e| StoreError::op("failed to delete place", e))?;
        Ok(rows > 0)
    }
}

fn place_from_row(row: &Row<'_>) -> rusqlite::Result<Place> {
    Ok(Place {
        id: row.get(0)?,
        name: row.get(1)?,
        type_id: row.get(2)?,
        parent_id: row.get(3)?,
        latitude: row.get(4)?,
        longitude: row.get(5)?,
    })
}
