//! Per-tree storage
//!
//! Every tree file carries the same schema: lookup tables (place types,
//! event types, event roles), places, individuals with their names, and
//! events with participants. These repositories operate on an already-open
//! connection; callers reach them through `with_tree` scoped connections.

mod events;
mod individuals;
mod lookups;
mod places;
pub mod schema;

pub use events::{Event, EventParticipant, EventStore, NewEvent, ParticipantStore};
pub use individuals::{
    Gender, Individual, IndividualStore, Name, NameStore, NameType, NewName,
};
pub use lookups::{LookupEntry, LookupKind, LookupStore};
pub use places::{NewPlace, Place, PlaceStore};
pub use schema::{DEFAULT_EVENT_ROLES, DEFAULT_EVENT_TYPES, DEFAULT_PLACE_TYPES};
