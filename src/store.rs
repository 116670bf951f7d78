//! Top-level store facade
//!
//! `RootlineStore` ties the pieces together: it owns the storage layout and
//! the injected filesystem capability, initializes the registry schema on
//! open, and hands out the per-concern surfaces.

use tracing::info;

use crate::database::core::ConnectionResolver;
use crate::database::error::{StoreError, StoreResult};
use crate::database::layout::StorageLayout;
use crate::database::registry::Registry;
use crate::database::schema::SchemaInitializer;
use crate::database::tree_data::TreeData;
use crate::lifecycle::{OsFilesystem, TreeFilesystem, TreeLifecycleManager};

/// Entry point for all tree storage
///
/// Opening the store initializes the registry schema (idempotent, safe on
/// every startup). The store holds no open connections; every operation on
/// the surfaces it hands out opens and closes its own.
pub struct RootlineStore {
    resolver: ConnectionResolver,
    fs: Box<dyn TreeFilesystem>,
}

impl RootlineStore {
    /// Open the store for a data directory, creating it if absent
    pub fn open(layout: StorageLayout) -> StoreResult<Self> {
        Self::open_with_filesystem(layout, Box::new(OsFilesystem))
    }

    /// Open the store with an injected filesystem capability
    pub fn open_with_filesystem(
        layout: StorageLayout,
        fs: Box<dyn TreeFilesystem>,
    ) -> StoreResult<Self> {
        fs.create_dir_all(layout.data_dir())
            .map_err(|e| StoreError::fs(layout.data_dir(), e))?;

        let store = Self {
            resolver: ConnectionResolver::new(layout),
            fs,
        };
        store.schema().init_registry_schema()?;
        info!(
            "store opened with registry at {}",
            store.resolver.layout().registry_path().display()
        );
        Ok(store)
    }

    /// Open the store rooted at the given data directory
    pub fn open_in_dir(data_dir: &str) -> StoreResult<Self> {
        Self::open(StorageLayout::new(data_dir))
    }

    /// Registry CRUD over tree metadata and settings
    pub fn registry(&self) -> Registry<'_> {
        Registry::new(&self.resolver)
    }

    /// Schema initialization for the registry and for tree files
    pub fn schema(&self) -> SchemaInitializer<'_> {
        SchemaInitializer::new(&self.resolver)
    }

    /// Lifecycle orchestration: create, delete, reconcile
    pub fn lifecycle(&self) -> TreeLifecycleManager<'_> {
        TreeLifecycleManager::new(&self.resolver, self.fs.as_ref())
    }

    /// Scoped data access to one tree
    pub fn tree(&self, tree_id: &str) -> TreeData<'_> {
        TreeData::new(&self.resolver, tree_id)
    }

    /// The underlying resolver (for advanced callers and diagnostics)
    pub fn resolver(&self) -> &ConnectionResolver {
        &self.resolver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::registry::CreateTreeInput;
    use crate::database::tree::{Gender, LookupKind, NameType, NewName};

    #[test]
    fn test_open_initializes_registry() {
        let dir = tempfile::tempdir().unwrap();
        let store = RootlineStore::open(StorageLayout::new(dir.path())).unwrap();

        assert!(dir.path().join("registry.sqlite3").exists());
        assert!(store.registry().get_all_trees().unwrap().is_empty());
    }

    #[test]
    fn test_open_twice_is_safe() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(dir.path());

        let store = RootlineStore::open(layout.clone()).unwrap();
        store
            .lifecycle()
            .create_new_tree(&CreateTreeInput::new("Smith"))
            .unwrap();
        drop(store);

        let reopened = RootlineStore::open(layout).unwrap();
        assert_eq!(reopened.registry().get_all_trees().unwrap().len(), 1);
    }

    #[test]
    fn test_tree_data_through_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = RootlineStore::open(StorageLayout::new(dir.path())).unwrap();
        let record = store
            .lifecycle()
            .create_new_tree(&CreateTreeInput::new("Smith"))
            .unwrap();

        let tree = store.tree(&record.id);
        assert_eq!(tree.lookup_entries(LookupKind::PlaceTypes).unwrap().len(), 10);

        let anna = tree.add_individual(Gender::Female).unwrap();
        tree.add_name(&NewName {
            individual_id: anna.id,
            kind: NameType::Birth,
            first_name: Some("Anna".to_string()),
            last_name: Some("Smith".to_string()),
            is_primary: true,
        })
        .unwrap();

        let primary = tree.primary_name_of(anna.id).unwrap().unwrap();
        assert_eq!(primary.first_name.as_deref(), Some("Anna"));

        // every operation opened and closed its own connection
        assert!(store.resolver().stats().is_balanced());
    }

    #[test]
    fn test_tree_data_missing_tree() {
        let dir = tempfile::tempdir().unwrap();
        let store = RootlineStore::open(StorageLayout::new(dir.path())).unwrap();

        let result = store.tree("999").individuals();
        assert!(matches!(result, Err(StoreError::TreeNotFound(_))));
    }
}
