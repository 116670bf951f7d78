//! Per-tree operation surface
//!
//! `TreeData` is what the domain layer holds to work with one tree. Every
//! method resolves the tree through the registry, opens a scoped
//! connection, runs, and closes it; nothing is cached between calls.

use rusqlite::Connection;

use crate::database::core::ConnectionResolver;
use crate::database::error::StoreResult;
use crate::database::tree::{
    Event, EventParticipant, EventStore, Gender, Individual, IndividualStore, LookupEntry,
    LookupKind, LookupStore, Name, NameStore, NewEvent, NewName, NewPlace, ParticipantStore,
    Place, PlaceStore,
};

/// Scoped access to one tree's data
pub struct TreeData<'a> {
    resolver: &'a ConnectionResolver,
    tree_id: String,
}

impl<'a> TreeData<'a> {
    pub(crate) fn new(resolver: &'a ConnectionResolver, tree_id: &str) -> Self {
        Self {
            resolver,
            tree_id: tree_id.to_string(),
        }
    }

    pub fn tree_id(&self) -> &str {
        &self.tree_id
    }

    /// Run arbitrary statements against this tree under the scoped-close
    /// contract. This is the escape hatch for queries the typed surface
    /// does not cover.
    pub fn with_connection<T>(
        &self,
        op: impl FnOnce(&Connection) -> StoreResult<T>,
    ) -> StoreResult<T> {
        self.resolver.with_tree(&self.tree_id, op)
    }

    pub fn lookup_entries(&self, kind: LookupKind) -> StoreResult<Vec<LookupEntry>> {
        self.with_connection(|conn| LookupStore::new(conn, kind).fetch_all())
    }

    pub fn lookup_by_key(&self, kind: LookupKind, key: &str) -> StoreResult<Option<LookupEntry>> {
        self.with_connection(|conn| LookupStore::new(conn, kind).fetch_by_key(key))
    }

    pub fn add_lookup_entry(
        &self,
        kind: LookupKind,
        name: &str,
        key: Option<&str>,
    ) -> StoreResult<LookupEntry> {
        self.with_connection(|conn| LookupStore::new(conn, kind).insert(name, key))
    }

    pub fn remove_lookup_entry(&self, kind: LookupKind, id: i64) -> StoreResult<bool> {
        self.with_connection(|conn| LookupStore::new(conn, kind).delete(id))
    }

    pub fn places(&self) -> StoreResult<Vec<Place>> {
        self.with_connection(|conn| PlaceStore::new(conn).fetch_all())
    }

    pub fn place(&self, id: i64) -> StoreResult<Option<Place>> {
        self.with_connection(|conn| PlaceStore::new(conn).fetch_by_id(id))
    }

    pub fn place_children(&self, parent_id: i64) -> StoreResult<Vec<Place>> {
        self.with_connection(|conn| PlaceStore::new(conn).fetch_children(parent_id))
    }

    pub fn add_place(&self, place: &NewPlace) -> StoreResult<Place> {
        self.with_connection(|conn| PlaceStore::new(conn).insert(place))
    }

    pub fn update_place(&self, id: i64, place: &NewPlace) -> StoreResult<bool> {
        self.with_connection(|conn| PlaceStore::new(conn).update(id, place))
    }

    pub fn remove_place(&self, id: i64) -> StoreResult<bool> {
        self.with_connection(|conn| PlaceStore::new(conn).delete(id))
    }

    pub fn individuals(&self) -> StoreResult<Vec<Individual>> {
        self.with_connection(|conn| IndividualStore::new(conn).fetch_all())
    }

    pub fn individual(&self, id: i64) -> StoreResult<Option<Individual>> {
        self.with_connection(|conn| IndividualStore::new(conn).fetch_by_id(id))
    }

    pub fn add_individual(&self, gender: Gender) -> StoreResult<Individual> {
        self.with_connection(|conn| IndividualStore::new(conn).insert(gender))
    }

    pub fn remove_individual(&self, id: i64) -> StoreResult<bool> {
        self.with_connection(|conn| IndividualStore::new(conn).delete(id))
    }

    pub fn names_of(&self, individual_id: i64) -> StoreResult<Vec<Name>> {
        self.with_connection(|conn| NameStore::new(conn).fetch_for_individual(individual_id))
    }

    pub fn primary_name_of(&self, individual_id: i64) -> StoreResult<Option<Name>> {
        self.with_connection(|conn| NameStore::new(conn).primary_for_individual(individual_id))
    }

    pub fn add_name(&self, name: &NewName) -> StoreResult<Name> {
        self.with_connection(|conn| NameStore::new(conn).insert(name))
    }

    pub fn set_primary_name(&self, name_id: i64) -> StoreResult<bool> {
        self.with_connection(|conn| NameStore::new(conn).set_primary(name_id))
    }

    pub fn remove_name(&self, id: i64) -> StoreResult<bool> {
        self.with_connection(|conn| NameStore::new(conn).delete(id))
    }

    pub fn events(&self) -> StoreResult<Vec<Event>> {
        self.with_connection(|conn| EventStore::new(conn).fetch_all())
    }

    pub fn event(&self, id: i64) -> StoreResult<Option<Event>> {
        self.with_connection(|conn| EventStore::new(conn).fetch_by_id(id))
    }

    pub fn events_at_place(&self, place_id: i64) -> StoreResult<Vec<Event>> {
        self.with_connection(|conn| EventStore::new(conn).fetch_by_place(place_id))
    }

    pub fn add_event(&self, event: &NewEvent) -> StoreResult<Event> {
        self.with_connection(|conn| EventStore::new(conn).insert(event))
    }

    pub fn update_event(&self, id: i64, event: &NewEvent) -> StoreResult<bool> {
        self.with_connection(|conn| EventStore::new(conn).update(id, event))
    }

    pub fn remove_event(&self, id: i64) -> StoreResult<bool> {
        self.with_connection(|conn| EventStore::new(conn).delete(id))
    }

    pub fn participants_of(&self, event_id: i64) -> StoreResult<Vec<EventParticipant>> {
        self.with_connection(|conn| ParticipantStore::new(conn).fetch_for_event(event_id))
    }

    pub fn add_participant(
        &self,
        event_id: i64,
        individual_id: i64,
        role_id: i64,
    ) -> StoreResult<EventParticipant> {
        self.with_connection(|conn| {
            ParticipantStore::new(conn).add(event_id, individual_id, role_id)
        })
    }

    pub fn remove_participant(&self, id: i64) -> StoreResult<bool> {
        self.with_connection(|conn| ParticipantStore::new(conn).remove(id))
    }
}
