//! Individuals and their names
//!
//! An individual carries only a gender; everything human-readable lives in
//! the `names` table. Invariant: at most one name per individual has
//! `is_primary` set. The schema cannot express that, so every write that
//! promotes a name clears the previous primary inside the same transaction.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::{Connection, Row, ToSql};
use serde::Serialize;

use crate::database::error::{StoreError, StoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Option<Gender> {
        match s {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            "unknown" => Some(Gender::Unknown),
            _ => None,
        }
    }
}

impl ToSql for Gender {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for Gender {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Gender::parse(value.as_str()?).ok_or(FromSqlError::InvalidType)
    }
}

/// Kind of a recorded name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NameType {
    Birth,
    Marriage,
    Nickname,
    Unknown,
}

impl NameType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NameType::Birth => "birth",
            NameType::Marriage => "marriage",
            NameType::Nickname => "nickname",
            NameType::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Option<NameType> {
        match s {
            "birth" => Some(NameType::Birth),
            "marriage" => Some(NameType::Marriage),
            "nickname" => Some(NameType::Nickname),
            "unknown" => Some(NameType::Unknown),
            _ => None,
        }
    }
}

impl ToSql for NameType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for NameType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        NameType::parse(value.as_str()?).ok_or(FromSqlError::InvalidType)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Individual {
    pub id: i64,
    pub gender: Gender,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Name {
    pub id: i64,
    pub individual_id: i64,
    pub kind: NameType,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_primary: bool,
}

/// Input for recording a name
#[derive(Debug, Clone)]
pub struct NewName {
    pub individual_id: i64,
    pub kind: NameType,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_primary: bool,
}

pub struct IndividualStore<'a> {
    conn: &'a Connection,
}

impl<'a> IndividualStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, gender: Gender) -> StoreResult<Individual> {
        self.conn
            .execute("INSERT INTO individuals (gender) VALUES (?1)", [gender])
            .map_err(|e| StoreError::op("failed to insert individual", e))?;

        Ok(Individual {
            id: self.conn.last_insert_rowid(),
            gender,
        })
    }

    pub fn fetch_all(&self) -> StoreResult<Vec<Individual>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, gender FROM individuals ORDER BY id")
            .map_err(|e| StoreError::op("failed to prepare individual query", e))?;

        let rows = stmt
            .query_map([], individual_from_row)
            .map_err(|e| StoreError::op("failed to query individuals", e))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::op("failed to read individual row", e))
    }

    pub fn fetch_by_id(&self, id: i64) -> StoreResult<Option<Individual>> {
        let result = self.conn.query_row(
            "SELECT id, gender FROM individuals WHERE id = ?1",
            [id],
            individual_from_row,
        );

        match result {
            Ok(individual) => Ok(Some(individual)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::op("failed to fetch individual", e)),
        }
    }

    pub fn update_gender(&self, id: i64, gender: Gender) -> StoreResult<bool> {
        let rows = self
            .conn
            .execute(
                "UPDATE individuals SET gender = ?1 WHERE id = ?2",
                rusqlite::params![gender, id],
            )
            .map_err(|e| StoreError::op("failed to update individual", e))?;
        Ok(rows > 0)
    }

    /// Delete an individual; names and event participations cascade away
    pub fn delete(&self, id: i64) -> StoreResult<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM individuals WHERE id = ?1", [id])
            .map_err(|e| StoreError::op("failed to delete individual", e))?;
        Ok(rows > 0)
    }
}

fn individual_from_row(row: &Row<'_>) -> rusqlite::Result<Individual> {
    Ok(Individual {
        id: row.get(0)?,
        gender: row.get(1)?,
    })
}

const NAME_COLUMNS: &str = "id, individual_id, type, first_name, last_name, is_primary";

pub struct NameStore<'a> {
    conn: &'a Connection,
}

impl<'a> NameStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Record a name; when `is_primary` is set, the individual's previous
    /// primary name is cleared in the same transaction
    pub fn insert(&self, name: &NewName) -> StoreResult<Name> {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| StoreError::op("failed to begin name transaction", e))?;

        if name.is_primary {
            tx.execute(
                "UPDATE names SET is_primary = 0 WHERE individual_id = ?1 AND is_primary = 1",
                [name.individual_id],
            )
            .map_err(|e| StoreError::op("failed to clear previous primary name", e))?;
        }

        tx.execute(
            "INSERT INTO names (individual_id, type, first_name, last_name, is_primary) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                name.individual_id,
                name.kind,
                name.first_name,
                name.last_name,
                name.is_primary
            ],
        )
        .map_err(|e| StoreError::op("failed to insert name", e))?;

        let id = tx.last_insert_rowid();
        tx.commit()
            .map_err(|e| StoreError::op("failed to commit name transaction", e))?;

        Ok(Name {
            id,
            individual_id: name.individual_id,
            kind: name.kind,
            first_name: name.first_name.clone(),
            last_name: name.last_name.clone(),
            is_primary: name.is_primary,
        })
    }

    pub fn fetch_for_individual(&self, individual_id: i64) -> StoreResult<Vec<Name>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {NAME_COLUMNS} FROM names WHERE individual_id = ?1 ORDER BY id"
            ))
            .map_err(|e| StoreError::op("failed to prepare name query", e))?;

        let rows = stmt
            .query_map([individual_id], name_from_row)
            .map_err(|e| StoreError::op("failed to query names", e))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::op("failed to read name row", e))
    }

    /// The individual's primary name, `None` when no name is marked primary
    pub fn primary_for_individual(&self, individual_id: i64) -> StoreResult<Option<Name>> {
        let result = self.conn.query_row(
            &format!(
                "SELECT {NAME_COLUMNS} FROM names \
                 WHERE individual_id = ?1 AND is_primary = 1"
            ),
            [individual_id],
            name_from_row,
        );

        match result {
            Ok(name) => Ok(Some(name)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::op("failed to fetch primary name", e)),
        }
    }

    /// Promote a name to primary, demoting its individual's previous primary
    ///
    /// Clear-then-set runs in one transaction; concurrent promotions for
    /// the same individual serialize on the database file and resolve to
    /// last-writer-wins with the invariant intact. Returns `false` when the
    /// name does not exist.
    pub fn set_primary(&self, name_id: i64) -> StoreResult<bool> {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| StoreError::op("failed to begin name transaction", e))?;

        tx.execute(
            "UPDATE names SET is_primary = 0 \
             WHERE individual_id = (SELECT individual_id FROM names WHERE id = ?1) \
             AND is_primary = 1",
            [name_id],
        )
        .map_err(|e| StoreError::op("failed to clear previous primary name", e))?;

        let rows = tx
            .execute("UPDATE names SET is_primary = 1 WHERE id = ?1", [name_id])
            .map_err(|e| StoreError::op("failed to set primary name", e))?;

        tx.commit()
            .map_err(|e| StoreError::op("failed to commit name transaction", e))?;

        Ok(rows > 0)
    }

    pub fn delete(&self, id: i64) -> StoreResult<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM names WHERE id = ?1", [id])
            .map_err(|e| StoreError::op("failed to delete name", e))?;
        Ok(rows > 0)
    }
}

fn name_from_row(row: &Row<'_>) -> rusqlite::Result<Name> {
    Ok(Name {
        id: row.get(0)?,
        individual_id: row.get(1)?,
        kind: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        is_primary: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::core::DatabaseConn;
    use crate::database::tree::schema::init_tree_schema;

    fn test_conn() -> DatabaseConn {
        let db = DatabaseConn::open_in_memory().unwrap();
        init_tree_schema(&db.conn).unwrap();
        db
    }

    fn primary_count(conn: &Connection, individual_id: i64) -> i64 {
        conn.query_row(
            "SELECT COUNT(*) FROM names WHERE individual_id = ?1 AND is_primary = 1",
            [individual_id],
            |row| row.get(0),
        )
        .unwrap()
    }

    fn new_name(individual_id: i64, first: &str, is_primary: bool) -> NewName {
        NewName {
            individual_id,
            kind: NameType::Birth,
            first_name: Some(first.to_string()),
            last_name: Some("Smith".to_string()),
            is_primary,
        }
    }

    #[test]
    fn test_individual_roundtrip() {
        let db = test_conn();
        let store = IndividualStore::new(&db.conn);

        let anna = store.insert(Gender::Female).unwrap();
        assert_eq!(store.fetch_by_id(anna.id).unwrap().unwrap(), anna);

        assert!(store.update_gender(anna.id, Gender::Unknown).unwrap());
        let updated = store.fetch_by_id(anna.id).unwrap().unwrap();
        assert_eq!(updated.gender, Gender::Unknown);
    }

    #[test]
    fn test_insert_primary_demotes_previous() {
        let db = test_conn();
        let individual = IndividualStore::new(&db.conn).insert(Gender::Male).unwrap();
        let names = NameStore::new(&db.conn);

        let first = names.insert(&new_name(individual.id, "John", true)).unwrap();
        names.insert(&new_name(individual.id, "Jack", true)).unwrap();

        assert_eq!(primary_count(&db.conn, individual.id), 1);
        let primary = names.primary_for_individual(individual.id).unwrap().unwrap();
        assert_eq!(primary.first_name.as_deref(), Some("Jack"));
        assert_ne!(primary.id, first.id);
    }

    #[test]
    fn test_set_primary_clears_then_sets() {
        let db = test_conn();
        let individual = IndividualStore::new(&db.conn).insert(Gender::Male).unwrap();
        let names = NameStore::new(&db.conn);

        let birth = names.insert(&new_name(individual.id, "John", true)).unwrap();
        let nickname = names
            .insert(&NewName {
                kind: NameType::Nickname,
                ..new_name(individual.id, "Johnny", false)
            })
            .unwrap();

        assert!(names.set_primary(nickname.id).unwrap());
        assert_eq!(primary_count(&db.conn, individual.id), 1);
        assert_eq!(
            names
                .primary_for_individual(individual.id)
                .unwrap()
                .unwrap()
                .id,
            nickname.id
        );

        // promoting twice in a row keeps the invariant
        assert!(names.set_primary(birth.id).unwrap());
        assert!(names.set_primary(birth.id).unwrap());
        assert_eq!(primary_count(&db.conn, individual.id), 1);
    }

    #[test]
    fn test_set_primary_missing_name() {
        let db = test_conn();
        let names = NameStore::new(&db.conn);
        assert!(!names.set_primary(999).unwrap());
    }

    #[test]
    fn test_delete_individual_cascades_names() {
        let db = test_conn();
        let individuals = IndividualStore::new(&db.conn);
        let names = NameStore::new(&db.conn);

        let individual = individuals.insert(Gender::Female).unwrap();
        names.insert(&new_name(individual.id, "Anna", true)).unwrap();

        assert!(individuals.delete(individual.id).unwrap());
        assert!(names.fetch_for_individual(individual.id).unwrap().is_empty());
    }
}
