//! Repository layer: record storage contracts and the generic SQLite
//! implementation.
//!
//! # Responsibility
//! - Define the record capability contract (`Record`) binding a type to its
//!   storage table at compile time.
//! - Provide one generic CRUD repository over that contract.
//!
//! # Invariants
//! - Every write operation runs inside its own transaction and is logged
//!   exactly once.
//! - Repository APIs return semantic errors (`NotFound`, `MissingId`) in
//!   addition to DB transport errors.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod record;
pub mod record_repo;

pub use record::{Record, RecordId};
pub use record_repo::{RecordRepository, SqliteRecordRepository};

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for record persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying persistence failure, surfaced verbatim.
    Db(DbError),
    /// Persisted row state that cannot be decoded into the record type.
    InvalidData(String),
    /// No row with the given id exists in the bound table.
    NotFound { table: &'static str, id: RecordId },
    /// Operation requires a persisted record but the record carries no id.
    MissingId { table: &'static str },
    /// More than one row matched a single-id lookup.
    MultipleRowsForId { table: &'static str, id: RecordId },
    /// Sort column is not part of the registered column set.
    UnknownSortColumn { table: &'static str, column: String },
    /// Connection has no applied schema migrations.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Bound table is missing from the connected database.
    MissingRequiredTable(&'static str),
    /// Bound table exists but lacks a registered column.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted record data: {message}"),
            Self::NotFound { table, id } => write!(f, "record not found in {table}: id {id}"),
            Self::MissingId { table } => {
                write!(f, "record for {table} has no id; save it first")
            }
            Self::MultipleRowsForId { table, id } => {
                write!(f, "multiple rows in {table} share id {id}")
            }
            Self::UnknownSortColumn { table, column } => {
                write!(f, "unknown sort column `{column}` for table {table}")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} is not migrated (expected {expected_version})"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table `{table}` does not exist")
            }
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{column}` missing from table `{table}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
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
