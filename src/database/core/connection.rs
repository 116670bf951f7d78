//! Database connection management
//!
//! This module provides the SQLite connection wrapper used for both the
//! registry file and individual tree files.

use std::path::Path;

use rusqlite::Connection;
use tracing::warn;

use crate::database::error::{StoreError, StoreResult};

/// Core database connection wrapper
///
/// `DatabaseConn` provides a thin wrapper around SQLite connections,
/// handling both file-based and in-memory databases with consistent
/// pragma configuration. Opening a file path creates the file if absent.
pub struct DatabaseConn {
    pub conn: Connection,
}

impl DatabaseConn {
    /// Open a database at the specified path
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path).map_err(|source| StoreError::Connection {
            path: path.to_path_buf(),
            source,
        })?;

        let db = DatabaseConn { conn };
        db.configure().map_err(|source| StoreError::Connection {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(db)
    }

    /// Create an in-memory database (used by tests and throwaway work)
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::Connection {
            path: ":memory:".into(),
            source,
        })?;

        let db = DatabaseConn { conn };
        db.configure().map_err(|source| StoreError::Connection {
            path: ":memory:".into(),
            source,
        })?;
        Ok(db)
    }

    /// Configure the connection-level pragmas
    fn configure(&self) -> Result<(), rusqlite::Error> {
        // WAL for better concurrent read/write behavior across connections
        let _: String = self
            .conn
            .query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;

        self.conn.execute("PRAGMA synchronous=NORMAL", [])?;

        // Foreign keys are off by default in SQLite and the tree schema
        // relies on CASCADE and SET NULL actions
        self.conn.execute("PRAGMA foreign_keys=ON", [])?;

        Ok(())
    }

    /// Explicitly close the connection, discarding any close failure
    ///
    /// SQLite close can fail when statements are still unfinalized. The
    /// primary result of the operation that used this connection must never
    /// be shadowed by that, so the failure is logged and dropped.
    pub fn close(self) {
        if let Err((_conn, e)) = self.conn.close() {
            warn!("discarding database close failure: {e}");
        }
    }
}

/// Check if a table exists in the database
pub fn table_exists(conn: &Connection, table_name: &str) -> StoreResult<bool> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
            [table_name],
            |row| row.get(0),
        )
        .map_err(|e| StoreError::op("failed to check table existence", e))?;
    Ok(count > 0)
}

/// Get the row count for a table
pub fn table_count(conn: &Connection, table_name: &str) -> StoreResult<u64> {
    let query = format!("SELECT COUNT(*) FROM {table_name}");
    conn.query_row(&query, [], |row| row.get(0))
        .map_err(|e| StoreError::op(format!("failed to count rows in {table_name}"), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = DatabaseConn::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn test_open_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.db");
        assert!(!path.exists());

        let db = DatabaseConn::open(&path).unwrap();
        db.close();
        assert!(path.exists());
    }

    #[test]
    fn test_open_failure_on_directory() {
        let dir = tempfile::tempdir().unwrap();
        let result = DatabaseConn::open(dir.path());
        assert!(matches!(result, Err(StoreError::Connection { .. })));
    }

    #[test]
    fn test_table_helpers() {
        let db = DatabaseConn::open_in_memory().unwrap();
        db.conn
            .execute("CREATE TABLE test_table (id INTEGER PRIMARY KEY)", [])
            .unwrap();
        db.conn
            .execute("INSERT INTO test_table (id) VALUES (1), (2), (3)", [])
            .unwrap();

        assert!(table_exists(&db.conn, "test_table").unwrap());
        assert!(!table_exists(&db.conn, "missing_table").unwrap());
        assert_eq!(table_count(&db.conn, "test_table").unwrap(), 3);
    }
}
