//! Storage unit repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Read and replace raw storage units addressed by key.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - A write replaces the whole unit in one statement; readers never see a
//!   partially written payload.
//! - The repository does not interpret payloads; versioning lives in the store.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for storage unit reads and writes.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Connection was not migrated to the layout this binary expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Shared repository handle was poisoned by a panicking writer.
    Poisoned,
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "unit repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::Poisoned => write!(f, "unit repository lock poisoned"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::UninitializedConnection { .. } => None,
            Self::Poisoned => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for raw storage units.
pub trait UnitRepository: Send {
    /// Reads one unit payload, `None` when absent.
    fn read_unit(&self, unit_key: &str) -> RepoResult<Option<String>>;
    /// Inserts or fully replaces one unit payload.
    fn write_unit(&self, unit_key: &str, payload: &str) -> RepoResult<()>;
    /// Removes one unit. Returns whether a unit existed.
    fn delete_unit(&self, unit_key: &str) -> RepoResult<bool>;
}

/// SQLite-backed unit repository owning its connection.
pub struct SqliteUnitRepository {
    conn: Connection,
}

impl SqliteUnitRepository {
    /// Wraps a migrated connection.
    ///
    /// # Errors
    /// - Returns `UninitializedConnection` when migrations were not applied.
    pub fn try_new(conn: Connection) -> RepoResult<Self> {
        let actual_version =
            conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
        let expected_version = latest_version();
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self { conn })
    }
}

impl UnitRepository for SqliteUnitRepository {
    fn read_unit(&self, unit_key: &str) -> RepoResult<Option<String>> {
        let payload = self
            .conn
            .query_row(
                "SELECT payload FROM storage_units WHERE unit_key = ?1;",
                [unit_key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(payload)
    }

    fn write_unit(&self, unit_key: &str, payload: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO storage_units (unit_key, payload, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(unit_key) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at;",
            params![unit_key, payload],
        )?;
        Ok(())
    }

    fn delete_unit(&self, unit_key: &str) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM storage_units WHERE unit_key = ?1;", [unit_key])?;
        Ok(changed > 0)
    }
}
