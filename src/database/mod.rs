//! Database module
//!
//! This module provides the two-level storage architecture, organized into:
//!
//! - **core**: Connection wrapper and scoped per-operation connection
//!   resolution
//! - **registry**: The singleton database tracking trees and settings
//! - **tree**: The per-tree schema, seed data, and entity repositories
//!
//! # Architecture
//!
//! ```text
//! database/
//! ├── core/           # Foundation
//! │   ├── connection  # SQLite DatabaseConn wrapper
//! │   └── resolver    # Scoped open/use/close per logical operation
//! │
//! ├── registry/       # Singleton registry file
//! │   ├── schema      # trees + settings DDL, idempotent init
//! │   ├── trees       # tree metadata repository
//! │   └── settings    # key/value settings repository
//! │
//! └── tree/           # One file per tree, identical schema
//!     ├── schema      # DDL + default lookup seeds
//!     ├── lookups     # place types, event types, event roles
//!     ├── places      # place hierarchy
//!     ├── individuals # individuals and names
//!     └── events      # events and participants
//! ```
//!
//! # Connection model
//!
//! Every logical operation opens its own connection, runs, and closes it.
//! No connection is pooled, cached, or shared across operations; concurrent
//! work on the same file relies on SQLite's own locking. The close is
//! attempted if and only if the open succeeded, and a close failure is
//! logged and discarded so it never masks the operation's result.

pub mod core;
pub mod error;
pub mod layout;
pub mod registry;
pub mod schema;
pub mod tree;
pub mod tree_data;

pub use self::core::{ConnectionResolver, ConnectionStats, DatabaseConn};
pub use error::{StoreError, StoreResult};
pub use layout::{sanitize_tree_name, StorageLayout};
pub use registry::{CreateTreeInput, Registry, Setting, TreeRecord, UpdateTreeInput};
pub use schema::SchemaInitializer;
pub use tree_data::TreeData;
