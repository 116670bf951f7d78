//! Tree lifecycle orchestration
//!
//! Creating a tree is two steps against two different files: insert the
//! registry row, then initialize the tree file's schema. Deleting is the
//! mirror image. Neither pair can be made atomic across files, so the
//! in-between states are first-class and observable:
//!
//! - **Healthy**: registry row exists and its backing file exists
//! - **Orphaned**: registry row exists but the file is missing
//! - **Unregistered**: a tree file exists on disk with no registry row
//!
//! Instead of fragile automatic rollback, repair is an explicit call:
//! [`TreeLifecycleManager::remove_orphaned_tree`] for orphans and
//! [`TreeLifecycleManager::register_unregistered_file`] for strays.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::database::core::ConnectionResolver;
use crate::database::error::{StoreError, StoreResult};
use crate::database::layout::{TREES_DIRECTORY, TREE_FILE_EXTENSION};
use crate::database::registry::{CreateTreeInput, Registry, TreeRecord, UpdateTreeInput};
use crate::database::schema::SchemaInitializer;

/// Filesystem operations the lifecycle manager depends on
///
/// Kept behind a trait so failure modes can be injected in tests and so
/// the manager never reaches into `std::fs` directly. Errors propagate
/// as-is; the manager does not interpret them.
pub trait TreeFilesystem: Send + Sync {
    fn exists(&self, path: &Path) -> io::Result<bool>;
    fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;
    fn remove_file(&self, path: &Path) -> io::Result<()>;
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;
}

/// Production filesystem backed by `std::fs`
pub struct OsFilesystem;

impl TreeFilesystem for OsFilesystem {
    fn exists(&self, path: &Path) -> io::Result<bool> {
        path.try_exists()
    }

    fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(entry.path());
            }
        }
        Ok(files)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }
}

/// Observed state of a registered tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeHealth {
    /// Registry row and backing file both present
    Healthy,
    /// Registry row present, backing file missing
    Orphaned,
}

impl std::fmt::Display for TreeHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TreeHealth::Healthy => write!(f, "healthy"),
            TreeHealth::Orphaned => write!(f, "orphaned"),
        }
    }
}

/// A registered tree together with its observed health
#[derive(Debug, Clone, Serialize)]
pub struct TreeWithHealth {
    #[serde(flatten)]
    pub record: TreeRecord,
    pub health: TreeHealth,
}

/// Full reconciliation view: all registered trees plus stray files
#[derive(Debug, Clone, Serialize)]
pub struct TreeInventory {
    pub trees: Vec<TreeWithHealth>,
    /// Relative paths of tree files with no registry row
    pub unregistered: Vec<String>,
}

/// Orchestrates tree creation, deletion, and registry/filesystem
/// reconciliation
pub struct TreeLifecycleManager<'a> {
    resolver: &'a ConnectionResolver,
    fs: &'a dyn TreeFilesystem,
}

impl<'a> TreeLifecycleManager<'a> {
    pub fn new(resolver: &'a ConnectionResolver, fs: &'a dyn TreeFilesystem) -> Self {
        Self { resolver, fs }
    }

    fn registry(&self) -> Registry<'a> {
        Registry::new(self.resolver)
    }

    fn schema(&self) -> SchemaInitializer<'a> {
        SchemaInitializer::new(self.resolver)
    }

    fn tree_by_id_or_err(&self, tree_id: &str) -> StoreResult<TreeRecord> {
        self.registry()
            .get_tree_by_id(tree_id)?
            .ok_or_else(|| StoreError::TreeNotFound(tree_id.to_string()))
    }

    fn ensure_trees_dir(&self) -> StoreResult<()> {
        let dir = self.resolver.layout().trees_dir();
        self.fs
            .create_dir_all(&dir)
            .map_err(|e| StoreError::fs(dir, e))
    }

    /// Create a tree record and initialize its backing file
    ///
    /// If initialization fails after the registry row was created, the row
    /// is deliberately left in place (an Orphaned tree) rather than rolled
    /// back; [`Self::remove_orphaned_tree`] is the documented repair path.
    pub fn create_new_tree(&self, input: &CreateTreeInput) -> StoreResult<TreeRecord> {
        let record = self.registry().create_tree(input)?;

        let init = self
            .ensure_trees_dir()
            .and_then(|()| self.schema().init_tree_schema(&record.id));
        if let Err(e) = init {
            warn!(
                "tree {} left orphaned after failed initialization; \
                 remove_orphaned_tree is the repair path",
                record.id
            );
            return Err(e);
        }

        info!("created tree {} at {}", record.id, record.file_path);
        Ok(record)
    }

    /// Update name and/or description; never touches the backing file
    pub fn update_tree(&self, tree_id: &str, input: &UpdateTreeInput) -> StoreResult<TreeRecord> {
        self.registry().update_tree(tree_id, input)
    }

    /// Delete the backing file, then the registry row
    ///
    /// If the file removal fails, the registry row is kept so the tree does
    /// not silently become an orphan. If the registry delete fails after
    /// the file was removed, the tree is an orphan and must be cleaned up
    /// via [`Self::remove_orphaned_tree`].
    pub fn delete_complete_tree(&self, tree_id: &str) -> StoreResult<()> {
        let record = self.tree_by_id_or_err(tree_id)?;
        let path = self.resolver.layout().resolve(&record.file_path);

        if self.fs.exists(&path).map_err(|e| StoreError::fs(&path, e))? {
            self.fs
                .remove_file(&path)
                .map_err(|e| StoreError::fs(&path, e))?;
        }

        self.registry().delete_tree(tree_id)?;
        info!("deleted tree {} and its file {}", tree_id, record.file_path);
        Ok(())
    }

    /// Tree files on disk that no registry row references
    ///
    /// Returns paths relative to the data directory, the same form stored
    /// in `TreeRecord::file_path`. Filesystem errors propagate.
    pub fn unregistered_files(&self) -> StoreResult<Vec<String>> {
        self.ensure_trees_dir()?;

        let registered: HashSet<String> = self
            .registry()
            .get_all_trees()?
            .into_iter()
            .map(|tree| tree.file_path)
            .collect();

        let trees_dir = self.resolver.layout().trees_dir();
        let entries = self
            .fs
            .list_files(&trees_dir)
            .map_err(|e| StoreError::fs(&trees_dir, e))?;

        let mut unregistered: Vec<String> = entries
            .iter()
            .filter_map(|path| path.file_name().and_then(|n| n.to_str()))
            .filter(|name| name.ends_with(TREE_FILE_EXTENSION))
            .map(|name| format!("{TREES_DIRECTORY}/{name}"))
            .filter(|relative| !registered.contains(relative))
            .collect();
        unregistered.sort();
        Ok(unregistered)
    }

    /// Remove the registry row of a tree whose file is confirmed missing
    ///
    /// Refuses when the file still exists; this operation performs no file
    /// I/O beyond the existence check.
    pub fn remove_orphaned_tree(&self, tree_id: &str) -> StoreResult<()> {
        let record = self.tree_by_id_or_err(tree_id)?;
        let path = self.resolver.layout().resolve(&record.file_path);

        if self.fs.exists(&path).map_err(|e| StoreError::fs(&path, e))? {
            return Err(StoreError::NotOrphaned {
                id: tree_id.to_string(),
                path,
            });
        }

        self.registry().delete_tree(tree_id)?;
        info!("removed orphaned tree {tree_id}");
        Ok(())
    }

    /// Adopt an existing tree file into the registry
    ///
    /// Inserts a registry row pointing at the given path (sharing
    /// `create_tree`'s uniqueness checks), then initializes the file's
    /// schema: idempotent when the file already carries compatible data,
    /// additive when it predates a newer required table.
    pub fn register_unregistered_file(
        &self,
        file_path: &str,
        name: &str,
        description: Option<&str>,
    ) -> StoreResult<TreeRecord> {
        let absolute = self.resolver.layout().resolve(file_path);
        let exists = self
            .fs
            .exists(&absolute)
            .map_err(|e| StoreError::fs(&absolute, e))?;
        if !exists {
            return Err(StoreError::fs(
                absolute,
                io::Error::new(io::ErrorKind::NotFound, "no such tree file"),
            ));
        }

        let mut input = CreateTreeInput::new(name);
        input.description = description.map(str::to_string);
        let record = self.registry().register_tree(&input, file_path)?;

        self.schema().init_tree_schema(&record.id)?;
        info!("registered existing file {} as tree {}", file_path, record.id);
        Ok(record)
    }

    /// Health of one registered tree
    pub fn tree_health(&self, record: &TreeRecord) -> StoreResult<TreeHealth> {
        let path = self.resolver.layout().resolve(&record.file_path);
        let exists = self.fs.exists(&path).map_err(|e| StoreError::fs(&path, e))?;
        Ok(if exists {
            TreeHealth::Healthy
        } else {
            TreeHealth::Orphaned
        })
    }

    /// Full reconciliation view of the registry against the filesystem
    pub fn tree_inventory(&self) -> StoreResult<TreeInventory> {
        let mut trees = Vec::new();
        for record in self.registry().get_all_trees()? {
            let health = self.tree_health(&record)?;
            trees.push(TreeWithHealth { record, health });
        }

        Ok(TreeInventory {
            trees,
            unregistered: self.unregistered_files()?,
        })
    }
}
