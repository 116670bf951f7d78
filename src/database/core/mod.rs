//! Core database infrastructure
//!
//! - `DatabaseConn`: SQLite connection wrapper with pragma configuration
//! - `ConnectionResolver`: scoped per-operation connections to the registry
//!   and to tree files resolved through it

mod connection;
mod resolver;

pub use connection::{table_count, table_exists, DatabaseConn};
pub use resolver::{ConnectionResolver, ConnectionStats};
