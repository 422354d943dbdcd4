//! Record capability contract for repository-managed types.
//!
//! # Responsibility
//! - Bind a domain type to its storage table, columns and id accessor at
//!   compile time.
//!
//! # Invariants
//! - `TABLE` and `COLUMNS` are fixed for the lifetime of the program.
//! - `COLUMNS`, `to_values()` and `from_row()` agree on column order.

use crate::repo::RepoResult;
use rusqlite::types::Value;
use rusqlite::Row;

/// Storage-assigned identifier for persisted records.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
/// Values come from the engine (SQLite rowid) on first save.
pub type RecordId = i64;

/// Capability contract for types managed by the generic repository.
///
/// Implementors declare their storage binding explicitly; the repository
/// never inspects the type beyond this contract.
pub trait Record: Sized {
    /// Storage table name.
    const TABLE: &'static str;

    /// Data columns in declaration order, excluding the `id` primary key.
    const COLUMNS: &'static [&'static str];

    /// Returns the storage id, or `None` for a record never saved.
    fn id(&self) -> Option<RecordId>;

    /// Binds the storage id after a successful save.
    fn assign_id(&mut self, id: RecordId);

    /// Encodes the data columns in `COLUMNS` order.
    fn to_values(&self) -> Vec<Value>;

    /// Decodes one row shaped as `id` followed by `COLUMNS`.
    ///
    /// Implementations should reject invalid persisted state with
    /// `RepoError::InvalidData` instead of masking it.
    fn from_row(row: &Row<'_>) -> RepoResult<Self>;
}
