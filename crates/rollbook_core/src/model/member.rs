//! Member domain record.
//!
//! # Invariants
//! - `email` is unique per member within one database.
//! - `id` is engine-assigned on first save and never reused.

use crate::repo::record::{Record, RecordId};
use crate::repo::RepoResult;
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

/// One registered member of the organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Storage id, absent until the member is saved.
    pub id: Option<RecordId>,
    /// Display name used for roster sorting.
    pub full_name: String,
    /// Contact address, unique across members.
    pub email: String,
    /// Join timestamp in epoch milliseconds.
    pub joined_at: i64,
}

impl Member {
    /// Creates an unsaved member record.
    pub fn new(full_name: impl Into<String>, email: impl Into<String>, joined_at: i64) -> Self {
        Self {
            id: None,
            full_name: full_name.into(),
            email: email.into(),
            joined_at,
        }
    }
}

impl Record for Member {
    const TABLE: &'static str = "members";
    const COLUMNS: &'static [&'static str] = &["full_name", "email", "joined_at"];

    fn id(&self) -> Option<RecordId> {
        self.id
    }

    fn assign_id(&mut self, id: RecordId) {
        self.id = Some(id);
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.full_name.clone()),
            Value::Text(self.email.clone()),
            Value::Integer(self.joined_at),
        ]
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            id: Some(row.get("id")?),
            full_name: row.get("full_name")?,
            email: row.get("email")?,
            joined_at: row.get("joined_at")?,
        })
    }
}
