//! Storage error taxonomy
//!
//! Every storage operation surfaces one of these kinds so callers can tell
//! "bad input" from "doesn't exist" from "storage failure" without string
//! matching. Close failures during scoped cleanup are the only errors that
//! are deliberately discarded (logged, never returned).

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the storage layer
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors produced by the registry, schema, and lifecycle layers
#[derive(Debug, Error)]
pub enum StoreError {
    /// Identifier did not parse as a positive integer. Raised before any I/O.
    #[error("invalid tree id '{0}': expected a positive integer")]
    InvalidId(String),

    /// No registry row for the given tree id
    #[error("tree with id {0} not found in registry")]
    TreeNotFound(String),

    /// Unique-constraint collision on a tree name or derived file path
    #[error("tree name or file path already in use: {0}")]
    DuplicateName(String),

    /// The database file could not be opened
    #[error("failed to open database at '{}': {source}", path.display())]
    Connection {
        path: PathBuf,
        source: rusqlite::Error,
    },

    /// A statement failed after the connection was successfully opened
    #[error("{context}: {source}")]
    Operation {
        context: String,
        source: rusqlite::Error,
    },

    /// An injected filesystem capability failed; propagated as-is
    #[error("filesystem operation failed on '{}': {source}", path.display())]
    Filesystem {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A registry row still has a backing file and cannot be repaired as an orphan
    #[error("tree {id} still has a backing file at '{}'; not an orphan", path.display())]
    NotOrphaned { id: String, path: PathBuf },
}

impl StoreError {
    /// Wrap a statement failure with a short context line
    pub(crate) fn op(context: impl Into<String>, source: rusqlite::Error) -> Self {
        StoreError::Operation {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// True when the underlying SQLite error is a unique-constraint violation
    pub(crate) fn is_constraint_violation(e: &rusqlite::Error) -> bool {
        matches!(
            e,
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }
}
