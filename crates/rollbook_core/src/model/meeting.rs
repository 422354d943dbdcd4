//! Meeting domain record.

use crate::repo::record::{Record, RecordId};
use crate::repo::RepoResult;
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

/// One scheduled or held meeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    /// Storage id, absent until the meeting is saved.
    pub id: Option<RecordId>,
    /// Meeting title shown in the agenda.
    pub title: String,
    /// Date of the meeting in epoch milliseconds.
    pub held_on: i64,
    /// Recorded minutes, absent until the meeting took place.
    pub minutes: Option<String>,
}

impl Meeting {
    /// Creates an unsaved meeting record without minutes.
    pub fn new(title: impl Into<String>, held_on: i64) -> Self {
        Self {
            id: None,
            title: title.into(),
            held_on,
            minutes: None,
        }
    }
}

impl Record for Meeting {
    const TABLE: &'static str = "meetings";
    const COLUMNS: &'static [&'static str] = &["title", "held_on", "minutes"];

    fn id(&self) -> Option<RecordId> {
        self.id
    }

    fn assign_id(&mut self, id: RecordId) {
        self.id = Some(id);
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.title.clone()),
            Value::Integer(self.held_on),
            match &self.minutes {
                Some(text) => Value::Text(text.clone()),
                None => Value::Null,
            },
        ]
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            id: Some(row.get("id")?),
            title: row.get("title")?,
            held_on: row.get("held_on")?,
            minutes: row.get("minutes")?,
        })
    }
}
