//! Events and participants
//!
//! An event is a dated occurrence of some type, optionally tied to a place.
//! Individuals are attached through `event_participants` with a role; one
//! individual can appear in the same event under several roles, but the
//! `(event, individual, role)` triple is unique.

use rusqlite::{Connection, Row};
use serde::Serialize;

use crate::database::error::{StoreError, StoreResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub id: i64,
    pub type_id: i64,
    pub date: Option<String>,
    pub description: Option<String>,
    pub place_id: Option<i64>,
}

/// Input for creating or replacing an event
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub type_id: i64,
    pub date: Option<String>,
    pub description: Option<String>,
    pub place_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EventParticipant {
    pub id: i64,
    pub event_id: i64,
    pub individual_id: i64,
    pub role_id: i64,
}

const EVENT_COLUMNS: &str = "id, type_id, date, description, place_id";

pub struct EventStore<'a> {
    conn: &'a Connection,
}

impl<'a> EventStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, event: &NewEvent) -> StoreResult<Event> {
        self.conn
            .execute(
                "INSERT INTO events (type_id, date, description, place_id) \
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![event.type_id, event.date, event.description, event.place_id],
            )
            .map_err(|e| StoreError::op("failed to insert event", e))?;

        Ok(Event {
            id: self.conn.last_insert_rowid(),
            type_id: event.type_id,
            date: event.date.clone(),
            description: event.description.clone(),
            place_id: event.place_id,
        })
    }

    pub fn fetch_all(&self) -> StoreResult<Vec<Event>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY id"))
            .map_err(|e| StoreError::op("failed to prepare event query", e))?;

        let rows = stmt
            .query_map([], event_from_row)
            .map_err(|e| StoreError::op("failed to query events", e))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::op("failed to read event row", e))
    }

    pub fn fetch_by_id(&self, id: i64) -> StoreResult<Option<Event>> {
        let result = self.conn.query_row(
            &format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?1"),
            [id],
            event_from_row,
        );

        match result {
            Ok(event) => Ok(Some(event)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::op("failed to fetch event", e)),
        }
    }

    pub fn fetch_by_place(&self, place_id: i64) -> StoreResult<Vec<Event>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {EVENT_COLUMNS} FROM events WHERE place_id = ?1 ORDER BY id"
            ))
            .map_err(|e| StoreError::op("failed to prepare event query", e))?;

        let rows = stmt
            .query_map([place_id], event_from_row)
            .map_err(|e| StoreError::op("failed to query events by place", e))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::op("failed to read event row", e))
    }

    pub fn update(&self, id: i64, event: &NewEvent) -> StoreResult<bool> {
        let rows = self
            .conn
            .execute(
                "UPDATE events SET type_id = ?1, date = ?2, description = ?3, place_id = ?4 \
                 WHERE id = ?5",
                rusqlite::params![
                    event.type_id,
                    event.date,
                    event.description,
                    event.place_id,
                    id
                ],
            )
            .map_err(|e| StoreError::op("failed to update event", e))?;
        Ok(rows > 0)
    }

    /// Delete an event; its participant rows cascade away
    pub fn delete(&self, id: i64) -> StoreResult<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM events WHERE id = ?1", [id])
            .map_err(|e| StoreError::op("failed to delete event", e))?;
        Ok(rows > 0)
    }
}

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<Event> {
    Ok(Event {
        id: row.get(0)?,
        type_id: row.get(1)?,
        date: row.get(2)?,
        description: row.get(3)?,
        place_id: row.get(4)?,
    })
}

pub struct ParticipantStore<'a> {
    conn: &'a Connection,
}

impl<'a> ParticipantStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Attach an individual to an event under a role
    pub fn add(
        &self,
        event_id: i64,
        individual_id: i64,
        role_id: i64,
    ) -> StoreResult<EventParticipant> {
        self.conn
            .execute(
                "INSERT INTO event_participants (event_id, individual_id, role_id) \
                 VALUES (?1, ?2, ?3)",
                [event_id, individual_id, role_id],
            )
            .map_err(|e| StoreError::op("failed to add event participant", e))?;

        Ok(EventParticipant {
            id: self.conn.last_insert_rowid(),
            event_id,
            individual_id,
            role_id,
        })
    }

    pub fn fetch_for_event(&self, event_id: i64) -> StoreResult<Vec<EventParticipant>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, event_id, individual_id, role_id FROM event_participants \
                 WHERE event_id = ?1 ORDER BY id",
            )
            .map_err(|e| StoreError::op("failed to prepare participant query", e))?;

        let rows = stmt
            .query_map([event_id], |row| {
                Ok(EventParticipant {
                    id: row.get(0)?,
                    event_id: row.get(1)?,
                    individual_id: row.get(2)?,
                    role_id: row.get(3)?,
                })
            })
            .map_err(|e| StoreError::op("failed to query participants", e))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::op("failed to read participant row", e))
    }

    pub fn remove(&self, id: i64) -> StoreResult<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM event_participants WHERE id = ?1", [id])
            .map_err(|e| StoreError::op("failed to remove event participant", e))?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::core::DatabaseConn;
    use crate::database::tree::individuals::{Gender, IndividualStore};
    use crate::database::tree::lookups::{LookupKind, LookupStore};
    use crate::database::tree::schema::init_tree_schema;

    fn test_conn() -> DatabaseConn {
        let db = DatabaseConn::open_in_memory().unwrap();
        init_tree_schema(&db.conn).unwrap();
        db
    }

    fn lookup_id(conn: &Connection, kind: LookupKind, key: &str) -> i64 {
        LookupStore::new(conn, kind)
            .fetch_by_key(key)
            .unwrap()
            .unwrap()
            .id
    }

    #[test]
    fn test_event_roundtrip() {
        let db = test_conn();
        let store = EventStore::new(&db.conn);

        let birth = store
            .insert(&NewEvent {
                type_id: lookup_id(&db.conn, LookupKind::EventTypes, "birth"),
                date: Some("1873-04-12".to_string()),
                description: None,
                place_id: None,
            })
            .unwrap();

        let fetched = store.fetch_by_id(birth.id).unwrap().unwrap();
        assert_eq!(fetched, birth);

        assert!(store
            .update(
                birth.id,
                &NewEvent {
                    type_id: birth.type_id,
                    date: Some("1873-04-13".to_string()),
                    description: Some("parish record".to_string()),
                    place_id: None,
                },
            )
            .unwrap());
        let updated = store.fetch_by_id(birth.id).unwrap().unwrap();
        assert_eq!(updated.date.as_deref(), Some("1873-04-13"));
    }

    #[test]
    fn test_participant_uniqueness() {
        let db = test_conn();
        let event = EventStore::new(&db.conn)
            .insert(&NewEvent {
                type_id: lookup_id(&db.conn, LookupKind::EventTypes, "marriage"),
                date: None,
                description: None,
                place_id: None,
            })
            .unwrap();
        let individual = IndividualStore::new(&db.conn).insert(Gender::Male).unwrap();
        let husband = lookup_id(&db.conn, LookupKind::EventRoles, "husband");
        let witness = lookup_id(&db.conn, LookupKind::EventRoles, "witness");

        let participants = ParticipantStore::new(&db.conn);
        participants.add(event.id, individual.id, husband).unwrap();

        // same triple rejected, different role accepted
        assert!(participants.add(event.id, individual.id, husband).is_err());
        participants.add(event.id, individual.id, witness).unwrap();

        assert_eq!(participants.fetch_for_event(event.id).unwrap().len(), 2);
    }

    #[test]
    fn test_delete_event_cascades_participants() {
        let db = test_conn();
        let events = EventStore::new(&db.conn);
        let event = events
            .insert(&NewEvent {
                type_id: lookup_id(&db.conn, LookupKind::EventTypes, "census"),
                date: Some("1900".to_string()),
                description: None,
                place_id: None,
            })
            .unwrap();
        let individual = IndividualStore::new(&db.conn)
            .insert(Gender::Female)
            .unwrap();
        let subject = lookup_id(&db.conn, LookupKind::EventRoles, "subject");

        let participants = ParticipantStore::new(&db.conn);
        participants.add(event.id, individual.id, subject).unwrap();

        assert!(events.delete(event.id).unwrap());
        assert!(participants.fetch_for_event(event.id).unwrap().is_empty());
    }
}
