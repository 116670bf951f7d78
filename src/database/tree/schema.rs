//! Tree database schema management
//!
//! Every tree file carries an identical schema. Creation is idempotent and
//! additive: re-running it on an existing file applies any newly introduced
//! table or index without disturbing data. The three lookup tables are
//! seeded with their default sets only when they are empty, so
//! re-initialization never duplicates or resurrects lookup rows.

use rusqlite::Connection;
use tracing::info;

use crate::database::core::table_count;
use crate::database::error::{StoreError, StoreResult};

/// Default place types seeded into a fresh tree
pub const DEFAULT_PLACE_TYPES: &[(&str, &str)] = &[
    ("Country", "country"),
    ("State", "state"),
    ("City", "city"),
    ("County", "county"),
    ("Province", "province"),
    ("Region", "region"),
    ("District", "district"),
    ("Village", "village"),
    ("Town", "town"),
    ("Address", "address"),
];

/// Default event types seeded into a fresh tree
pub const DEFAULT_EVENT_TYPES: &[(&str, &str)] = &[
    ("Birth", "birth"),
    ("Death", "death"),
    ("Marriage", "marriage"),
    ("Baptism", "baptism"),
    ("Burial", "burial"),
    ("Immigration", "immigration"),
    ("Census", "census"),
    ("Engagement", "engagement"),
    ("Separation", "separation"),
    ("Retirement", "retirement"),
    ("Other", "other"),
];

/// Default event roles seeded into a fresh tree
pub const DEFAULT_EVENT_ROLES: &[(&str, &str)] = &[
    ("Subject", "subject"),
    ("Husband", "husband"),
    ("Wife", "wife"),
    ("Mother", "mother"),
    ("Father", "father"),
    ("Witness", "witness"),
    ("Godfather", "godfather"),
    ("Godmother", "godmother"),
    ("Officiant", "officiant"),
    ("Father of Husband", "father_of_husband"),
    ("Mother of Husband", "mother_of_husband"),
    ("Father of Wife", "father_of_wife"),
    ("Mother of Wife", "mother_of_wife"),
    ("Other", "other"),
];

/// Schema definitions for tree databases
pub struct TreeSchema;

impl TreeSchema {
    pub const TABLES: &'static [&'static str] = &[
        r#"
        CREATE TABLE IF NOT EXISTS place_types (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            name TEXT NOT NULL,
            key TEXT
        );
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS places (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            name TEXT NOT NULL,
            type_id INTEGER NOT NULL,
            parent_id INTEGER,
            latitude REAL,
            longitude REAL,
            FOREIGN KEY (type_id) REFERENCES place_types(id) ON UPDATE NO ACTION ON DELETE RESTRICT,
            FOREIGN KEY (parent_id) REFERENCES places(id) ON UPDATE NO ACTION ON DELETE SET NULL
        );
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS event_types (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            name TEXT NOT NULL,
            key TEXT
        );
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS event_roles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            name TEXT NOT NULL,
            key TEXT
        );
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS individuals (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            gender TEXT NOT NULL CHECK (gender IN ('male', 'female', 'unknown'))
        );
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS names (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            individual_id INTEGER NOT NULL,
            type TEXT NOT NULL CHECK (type IN ('birth', 'marriage', 'nickname', 'unknown')),
            first_name TEXT,
            last_name TEXT,
            is_primary INTEGER DEFAULT 0 NOT NULL CHECK (is_primary IN (0, 1)),
            FOREIGN KEY (individual_id) REFERENCES individuals(id) ON UPDATE NO ACTION ON DELETE CASCADE
        );
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            type_id INTEGER NOT NULL,
            date TEXT,
            description TEXT,
            place_id INTEGER,
            FOREIGN KEY (type_id) REFERENCES event_types(id) ON UPDATE NO ACTION ON DELETE RESTRICT,
            FOREIGN KEY (place_id) REFERENCES places(id) ON UPDATE NO ACTION ON DELETE SET NULL
        );
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS event_participants (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            event_id INTEGER NOT NULL,
            individual_id INTEGER NOT NULL,
            role_id INTEGER NOT NULL,
            FOREIGN KEY (event_id) REFERENCES events(id) ON UPDATE NO ACTION ON DELETE CASCADE,
            FOREIGN KEY (individual_id) REFERENCES individuals(id) ON UPDATE NO ACTION ON DELETE CASCADE,
            FOREIGN KEY (role_id) REFERENCES event_roles(id) ON UPDATE NO ACTION ON DELETE RESTRICT
        );
        "#,
    ];

    pub const INDEXES: &'static [&'static str] = &[
        "CREATE UNIQUE INDEX IF NOT EXISTS place_types_key_unique ON place_types (key)",
        "CREATE UNIQUE INDEX IF NOT EXISTS event_types_key_unique ON event_types (key)",
        "CREATE UNIQUE INDEX IF NOT EXISTS event_roles_key_unique ON event_roles (key)",
        "CREATE INDEX IF NOT EXISTS places_type_id_index ON places (type_id)",
        "CREATE INDEX IF NOT EXISTS places_parent_id_index ON places (parent_id)",
        "CREATE INDEX IF NOT EXISTS names_individual_id_index ON names (individual_id)",
        "CREATE INDEX IF NOT EXISTS names_is_primary_index ON names (is_primary)",
        "CREATE INDEX IF NOT EXISTS events_type_id_index ON events (type_id)",
        "CREATE INDEX IF NOT EXISTS events_place_id_index ON events (place_id)",
        "CREATE INDEX IF NOT EXISTS event_participants_event_id_index ON event_participants (event_id)",
        "CREATE INDEX IF NOT EXISTS event_participants_individual_id_index ON event_participants (individual_id)",
        "CREATE INDEX IF NOT EXISTS event_participants_role_id_index ON event_participants (role_id)",
        "CREATE UNIQUE INDEX IF NOT EXISTS event_participants_unique ON event_participants (event_id, individual_id, role_id)",
    ];
}

/// The three lookup tables and their default seed sets
const LOOKUP_SEEDS: &[(&str, &[(&str, &str)])] = &[
    ("place_types", DEFAULT_PLACE_TYPES),
    ("event_types", DEFAULT_EVENT_TYPES),
    ("event_roles", DEFAULT_EVENT_ROLES),
];

/// Idempotently create all tree tables and indexes, then seed empty lookups
///
/// Any step failing aborts the whole call; partial schema state is never
/// reported as success.
pub fn init_tree_schema(conn: &Connection) -> StoreResult<()> {
    for table_sql in TreeSchema::TABLES {
        conn.execute(table_sql, [])
            .map_err(|e| StoreError::op("failed to create tree table", e))?;
    }

    for index_sql in TreeSchema::INDEXES {
        conn.execute(index_sql, [])
            .map_err(|e| StoreError::op("failed to create tree index", e))?;
    }

    seed_lookup_defaults(conn)
}

/// Insert the default lookup sets into tables that are still empty
///
/// All seeding happens in one transaction so a partially-seeded table is
/// never observable.
fn seed_lookup_defaults(conn: &Connection) -> StoreResult<()> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| StoreError::op("failed to begin seed transaction", e))?;

    for (table, defaults) in LOOKUP_SEEDS {
        if table_count(&tx, table)? > 0 {
            continue;
        }

        let mut stmt = tx
            .prepare(&format!("INSERT INTO {table} (name, key) VALUES (?1, ?2)"))
            .map_err(|e| StoreError::op("failed to prepare seed statement", e))?;
        for (name, key) in *defaults {
            stmt.execute([name, key])
                .map_err(|e| StoreError::op(format!("failed to seed {table}"), e))?;
        }
        drop(stmt);

        info!("seeded {} default rows into {}", defaults.len(), table);
    }

    tx.commit()
        .map_err(|e| StoreError::op("failed to commit seed transaction", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::core::{table_exists, DatabaseConn};

    #[test]
    fn test_init_seeds_default_lookups() {
        let db = DatabaseConn::open_in_memory().unwrap();
        init_tree_schema(&db.conn).unwrap();

        assert_eq!(table_count(&db.conn, "place_types").unwrap(), 10);
        assert_eq!(table_count(&db.conn, "event_types").unwrap(), 11);
        assert_eq!(table_count(&db.conn, "event_roles").unwrap(), 14);
    }

    #[test]
    fn test_reinit_does_not_reseed() {
        let db = DatabaseConn::open_in_memory().unwrap();
        init_tree_schema(&db.conn).unwrap();
        init_tree_schema(&db.conn).unwrap();

        assert_eq!(table_count(&db.conn, "place_types").unwrap(), 10);
        assert_eq!(table_count(&db.conn, "event_types").unwrap(), 11);
        assert_eq!(table_count(&db.conn, "event_roles").unwrap(), 14);
    }

    #[test]
    fn test_reinit_does_not_resurrect_deleted_rows() {
        let db = DatabaseConn::open_in_memory().unwrap();
        init_tree_schema(&db.conn).unwrap();

        db.conn
            .execute("DELETE FROM event_types WHERE key = 'census'", [])
            .unwrap();
        init_tree_schema(&db.conn).unwrap();

        // non-empty tables are left alone
        assert_eq!(table_count(&db.conn, "event_types").unwrap(), 10);
    }

    #[test]
    fn test_reinit_is_additive_for_missing_tables() {
        let db = DatabaseConn::open_in_memory().unwrap();
        init_tree_schema(&db.conn).unwrap();

        db.conn
            .execute("DROP TABLE event_participants", [])
            .unwrap();
        assert!(!table_exists(&db.conn, "event_participants").unwrap());

        init_tree_schema(&db.conn).unwrap();
        assert!(table_exists(&db.conn, "event_participants").unwrap());
        assert_eq!(table_count(&db.conn, "place_types").unwrap(), 10);
    }
}
