//! On-disk layout of the registry and tree files
//!
//! The registry lives at a fixed path inside the data directory; every tree
//! file lives under the `trees/` subdirectory. Registry rows store the tree
//! file path *relative* to the data directory, so the whole data directory
//! can be moved without rewriting the registry.

use std::path::{Path, PathBuf};

/// File name of the singleton registry database
pub const REGISTRY_FILE_NAME: &str = "registry.sqlite3";

/// Subdirectory of the data directory holding one SQLite file per tree
pub const TREES_DIRECTORY: &str = "trees";

/// File extension for tree database files
pub const TREE_FILE_EXTENSION: &str = ".db";

/// Resolves the well-known registry and tree file locations for a data directory
#[derive(Debug, Clone)]
pub struct StorageLayout {
    data_dir: PathBuf,
}

impl StorageLayout {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Absolute path of the singleton registry database
    pub fn registry_path(&self) -> PathBuf {
        self.data_dir.join(REGISTRY_FILE_NAME)
    }

    /// Absolute path of the directory holding tree files
    pub fn trees_dir(&self) -> PathBuf {
        self.data_dir.join(TREES_DIRECTORY)
    }

    /// Resolve a registry-stored relative file path against the data directory
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.data_dir.join(relative)
    }

    /// Derive the relative file path for a new tree from its display name
    pub fn tree_file_path(name: &str) -> String {
        format!(
            "{}/{}{}",
            TREES_DIRECTORY,
            sanitize_tree_name(name),
            TREE_FILE_EXTENSION
        )
    }
}

/// Lowercase a tree name and replace every character outside `[a-z0-9]` with `_`
pub fn sanitize_tree_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_alphanumeric() {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_tree_name() {
        assert_eq!(sanitize_tree_name("Smith"), "smith");
        assert_eq!(sanitize_tree_name("Smith Family"), "smith_family");
        assert_eq!(sanitize_tree_name("Smith & Co."), "smith___co_");
        assert_eq!(sanitize_tree_name("Årsta 1900"), "_rsta_1900");
    }

    #[test]
    fn test_tree_file_path() {
        assert_eq!(StorageLayout::tree_file_path("Smith"), "trees/smith.db");
        assert_eq!(
            StorageLayout::tree_file_path("Smith Family"),
            "trees/smith_family.db"
        );
    }

    #[test]
    fn test_layout_paths() {
        let layout = StorageLayout::new("/data/rootline");
        assert_eq!(
            layout.registry_path(),
            PathBuf::from("/data/rootline/registry.sqlite3")
        );
        assert_eq!(layout.trees_dir(), PathBuf::from("/data/rootline/trees"));
        assert_eq!(
            layout.resolve("trees/smith.db"),
            PathBuf::from("/data/rootline/trees/smith.db")
        );
    }
}
