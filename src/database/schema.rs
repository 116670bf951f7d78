//! Schema initialization entry points
//!
//! Both initializers are idempotent: registry initialization runs on every
//! store open, tree initialization runs on tree creation and on adoption of
//! an unregistered file.

use tracing::{error, info};

use crate::database::core::ConnectionResolver;
use crate::database::error::StoreResult;
use crate::database::{registry, tree};

/// Applies idempotent schema creation to the registry and to tree files
pub struct SchemaInitializer<'a> {
    resolver: &'a ConnectionResolver,
}

impl<'a> SchemaInitializer<'a> {
    pub fn new(resolver: &'a ConnectionResolver) -> Self {
        Self { resolver }
    }

    /// Create the registry tables and indexes; safe to call on every startup
    pub fn init_registry_schema(&self) -> StoreResult<()> {
        self.resolver
            .with_registry(registry::schema::init_registry_schema)?;
        info!("registry schema initialized");
        Ok(())
    }

    /// Create all per-tree tables and indexes, then seed empty lookup tables
    ///
    /// Re-running on an already-populated tree is a no-op for seed data
    /// while still applying any newly introduced table or index.
    pub fn init_tree_schema(&self, tree_id: &str) -> StoreResult<()> {
        match self
            .resolver
            .with_tree(tree_id, tree::schema::init_tree_schema)
        {
            Ok(()) => {
                info!("tree {tree_id} schema initialized");
                Ok(())
            }
            Err(e) => {
                error!("failed to initialize schema for tree {tree_id}: {e}");
                Err(e)
            }
        }
    }
}
