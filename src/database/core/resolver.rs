//! Scoped connection resolution
//!
//! Every storage operation opens its own connection, runs, and closes it.
//! There is no shared process-wide handle and no pooling: the resource
//! footprint of one logical operation is exactly one open connection per
//! file touched. `ConnectionResolver` owns that contract for both the
//! registry file and tree files resolved through the registry.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use rusqlite::Connection;

use crate::database::core::connection::DatabaseConn;
use crate::database::error::{StoreError, StoreResult};
use crate::database::layout::StorageLayout;

/// Open/close accounting for scoped connections
///
/// An open is recorded only after the underlying file was opened
/// successfully; a close is recorded whenever a close is attempted,
/// whether or not SQLite reports it as clean. Any batch of completed
/// scoped operations therefore satisfies `closes() == opens()`.
#[derive(Debug, Default)]
pub struct ConnectionStats {
    opens: AtomicU64,
    closes: AtomicU64,
}

impl ConnectionStats {
    fn record_open(&self) {
        self.opens.fetch_add(1, Ordering::Relaxed);
    }

    fn record_close(&self) {
        self.closes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn opens(&self) -> u64 {
        self.opens.load(Ordering::Relaxed)
    }

    pub fn closes(&self) -> u64 {
        self.closes.load(Ordering::Relaxed)
    }

    pub fn is_balanced(&self) -> bool {
        self.opens() == self.closes()
    }
}

/// Opens scoped connections to the registry or to a tree file resolved
/// through the registry
pub struct ConnectionResolver {
    layout: StorageLayout,
    stats: ConnectionStats,
}

impl ConnectionResolver {
    pub fn new(layout: StorageLayout) -> Self {
        Self {
            layout,
            stats: ConnectionStats::default(),
        }
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    pub fn stats(&self) -> &ConnectionStats {
        &self.stats
    }

    /// Open a connection to the singleton registry file, creating it if absent
    pub fn open_registry(&self) -> StoreResult<DatabaseConn> {
        DatabaseConn::open(&self.layout.registry_path())
    }

    /// Run `op` against the registry with the unconditional-close contract
    ///
    /// If the open fails, `op` is never invoked and no close is attempted.
    /// Otherwise a close is attempted exactly once, on success and on error
    /// alike, and a close failure never shadows the result of `op`.
    pub fn with_registry<T>(
        &self,
        op: impl FnOnce(&Connection) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let db = self.open_registry()?;
        self.scoped(db, op)
    }

    /// Parse a tree id string into its backing positive integer
    ///
    /// Fails fast with `InvalidId` before any I/O.
    pub fn parse_tree_id(tree_id: &str) -> StoreResult<i64> {
        match tree_id.parse::<i64>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(StoreError::InvalidId(tree_id.to_string())),
        }
    }

    /// Look up the backing file path of a tree through the registry
    pub fn resolve_tree_path(&self, tree_id: &str) -> StoreResult<PathBuf> {
        let id = Self::parse_tree_id(tree_id)?;

        let relative = self.with_registry(|conn| {
            match conn.query_row(
                "SELECT file_path FROM trees WHERE id = ?1",
                [id],
                |row| row.get::<_, String>(0),
            ) {
                Ok(path) => Ok(path),
                Err(rusqlite::Error::QueryReturnedNoRows) => {
                    Err(StoreError::TreeNotFound(tree_id.to_string()))
                }
                Err(e) => Err(StoreError::op("failed to look up tree file path", e)),
            }
        })?;

        Ok(self.layout.resolve(&relative))
    }

    /// Run `op` against the tree identified by `tree_id`
    ///
    /// Path resolution happens first; if it fails, no tree connection is
    /// ever opened or closed. The scoped close contract is the same as for
    /// [`Self::with_registry`].
    pub fn with_tree<T>(
        &self,
        tree_id: &str,
        op: impl FnOnce(&Connection) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let path = self.resolve_tree_path(tree_id)?;
        let db = DatabaseConn::open(&path)?;
        self.scoped(db, op)
    }

    fn scoped<T>(
        &self,
        db: DatabaseConn,
        op: impl FnOnce(&Connection) -> StoreResult<T>,
    ) -> StoreResult<T> {
        self.stats.record_open();
        let result = op(&db.conn);
        self.stats.record_close();
        db.close();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn resolver_in(dir: &std::path::Path) -> ConnectionResolver {
        ConnectionResolver::new(StorageLayout::new(dir))
    }

    fn seed_registry(resolver: &ConnectionResolver) {
        resolver
            .with_registry(|conn| {
                crate::database::registry::schema::init_registry_schema(conn)
            })
            .unwrap();
    }

    #[test]
    fn test_parse_tree_id() {
        assert_eq!(ConnectionResolver::parse_tree_id("7").unwrap(), 7);
        assert!(matches!(
            ConnectionResolver::parse_tree_id("abc"),
            Err(StoreError::InvalidId(_))
        ));
        assert!(matches!(
            ConnectionResolver::parse_tree_id("0"),
            Err(StoreError::InvalidId(_))
        ));
        assert!(matches!(
            ConnectionResolver::parse_tree_id("-3"),
            Err(StoreError::InvalidId(_))
        ));
        assert!(matches!(
            ConnectionResolver::parse_tree_id(""),
            Err(StoreError::InvalidId(_))
        ));
    }

    #[test]
    fn test_invalid_id_performs_no_io() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = resolver_in(dir.path());

        let result = resolver.resolve_tree_path("abc");
        assert!(matches!(result, Err(StoreError::InvalidId(_))));

        // fails before any connection is opened
        assert_eq!(resolver.stats().opens(), 0);
        assert_eq!(resolver.stats().closes(), 0);
        assert!(!dir.path().join("registry.sqlite3").exists());
    }

    #[test]
    fn test_missing_tree_never_opens_tree_connection() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = resolver_in(dir.path());
        seed_registry(&resolver);

        let before = resolver.stats().opens();
        let result = resolver.with_tree("999", |_conn| Ok(()));
        assert!(matches!(result, Err(StoreError::TreeNotFound(_))));

        // exactly one registry lookup, no tree connection
        assert_eq!(resolver.stats().opens(), before + 1);
        assert!(resolver.stats().is_balanced());
        assert!(!dir.path().join("trees").exists());
    }

    #[test]
    fn test_with_registry_closes_on_success_and_error() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = resolver_in(dir.path());

        let value = resolver
            .with_registry(|conn| {
                conn.query_row("SELECT 40 + 2", [], |row| row.get::<_, i64>(0))
                    .map_err(|e| StoreError::op("select failed", e))
            })
            .unwrap();
        assert_eq!(value, 42);

        let failed: StoreResult<()> = resolver.with_registry(|_conn| {
            Err(StoreError::op(
                "synthetic failure",
                rusqlite::Error::InvalidQuery,
            ))
        });
        assert!(failed.is_err());

        assert_eq!(resolver.stats().opens(), 2);
        assert_eq!(resolver.stats().closes(), 2);
    }

    #[test]
    fn test_open_failure_skips_op_and_close() {
        let dir = tempfile::tempdir().unwrap();
        // a directory at the registry path makes the open itself fail
        std::fs::create_dir(dir.path().join("registry.sqlite3")).unwrap();
        let resolver = resolver_in(dir.path());

        let mut invoked = false;
        let result = resolver.with_registry(|_conn| {
            invoked = true;
            Ok(())
        });

        assert!(matches!(result, Err(StoreError::Connection { .. })));
        assert!(!invoked);
        assert_eq!(resolver.stats().opens(), 0);
        assert_eq!(resolver.stats().closes(), 0);
    }

    #[test]
    fn test_close_count_matches_open_count_across_mixed_batch() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = resolver_in(dir.path());

        for i in 0..50 {
            let result: StoreResult<i64> = resolver.with_registry(|conn| {
                if i % 2 == 0 {
                    conn.query_row("SELECT ?1", [i], |row| row.get(0))
                        .map_err(|e| StoreError::op("select failed", e))
                } else {
                    Err(StoreError::op(
                        "synthetic failure",
                        rusqlite::Error::InvalidQuery,
                    ))
                }
            });
            assert_eq!(result.is_ok(), i % 2 == 0);
        }

        assert_eq!(resolver.stats().opens(), 50);
        assert_eq!(resolver.stats().closes(), 50);
    }

    #[test]
    fn test_close_count_matches_open_count_concurrently() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = Arc::new(resolver_in(dir.path()));
        seed_registry(&resolver);
        let base = resolver.stats().opens();

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let resolver = Arc::clone(&resolver);
                std::thread::spawn(move || {
                    for i in 0..5 {
                        let _ = resolver.with_registry(|conn| {
                            if (worker + i) % 3 == 0 {
                                return Err(StoreError::op(
                                    "synthetic failure",
                                    rusqlite::Error::InvalidQuery,
                                ));
                            }
                            conn.query_row("SELECT COUNT(*) FROM trees", [], |row| {
                                row.get::<_, i64>(0)
                            })
                            .map_err(|e| StoreError::op("count failed", e))
                        });
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(resolver.stats().opens(), base + 40);
        assert!(resolver.stats().is_balanced());
    }
}
