#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! Rootline - genealogical tree storage
//!
//! Rootline manages genealogical datasets ("trees"), each persisted as an
//! independent SQLite file, tracked by a singleton registry database. It
//! can be used as both a command-line application and a library.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - **[`database`]**: The two-level storage architecture
//!   - `core`: connection wrapper and scoped per-operation resolution
//!   - `registry`: tree metadata and settings in the singleton registry
//!   - `tree`: per-tree schema, seed data, and entity repositories
//!
//! - **[`lifecycle`]**: Tree creation, deletion, and reconciliation of the
//!   registry against the filesystem (orphan detection, adoption of
//!   unregistered files)
//!
//! - **[`store`]**: The [`RootlineStore`] facade tying everything together
//!
//! - **[`config`]**: Configuration management
//!
//! # Connection model
//!
//! There is no shared connection and no pool. Every logical operation
//! opens a connection to the file it touches, runs, and closes it; a close
//! is attempted if and only if the open succeeded, and close failures are
//! logged and discarded. Concurrent operations on the same tree rely on
//! SQLite's own file locking.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use rootline::{CreateTreeInput, RootlineStore};
//!
//! let store = RootlineStore::open_in_dir("~/.rootline")?;
//!
//! // Create a tree: registry row plus a seeded SQLite file
//! let tree = store.lifecycle().create_new_tree(&CreateTreeInput::new("Smith"))?;
//!
//! // Work with its data through scoped connections
//! let data = store.tree(&tree.id);
//! let individuals = data.individuals()?;
//!
//! // Reconcile registry and filesystem after external changes
//! let inventory = store.lifecycle().tree_inventory()?;
//! for stray in &inventory.unregistered {
//!     println!("found unregistered file: {stray}");
//! }
//! ```

pub mod config;
pub mod database;
pub mod lifecycle;
pub mod store;

// =============================================================================
// Configuration
// =============================================================================

pub use crate::config::RootlineConfig;

// =============================================================================
// Database module re-exports
// =============================================================================

pub use database::{
    sanitize_tree_name, ConnectionResolver, ConnectionStats, CreateTreeInput, DatabaseConn,
    Registry, SchemaInitializer, Setting, StorageLayout, StoreError, StoreResult, TreeData,
    TreeRecord, UpdateTreeInput,
};

// Per-tree entity types
pub use database::tree::{
    Event, EventParticipant, Gender, Individual, LookupEntry, LookupKind, Name, NameType,
    NewEvent, NewName, NewPlace, Place, DEFAULT_EVENT_ROLES, DEFAULT_EVENT_TYPES,
    DEFAULT_PLACE_TYPES,
};

// =============================================================================
// Lifecycle and store
// =============================================================================

pub use lifecycle::{
    OsFilesystem, TreeFilesystem, TreeHealth, TreeInventory, TreeLifecycleManager, TreeWithHealth,
};
pub use store::RootlineStore;
