//! Meeting use-case service.
//!
//! # Responsibility
//! - Provide meeting scheduling, minutes and agenda APIs.
//! - Delegate persistence to the generic record repository.
//!
//! # Invariants
//! - The agenda is sorted ascending by `held_on`.

use crate::model::meeting::Meeting;
use crate::repo::record::RecordId;
use crate::repo::record_repo::RecordRepository;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for meeting use-cases.
#[derive(Debug)]
pub enum MeetingServiceError {
    /// Target meeting does not exist.
    MeetingNotFound(RecordId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for MeetingServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MeetingNotFound(id) => write!(f, "meeting not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for MeetingServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::MeetingNotFound(_) => None,
        }
    }
}

impl From<RepoError> for MeetingServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { id, .. } => Self::MeetingNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Meeting service facade over repository implementations.
pub struct MeetingService<R: RecordRepository<Meeting>> {
    repo: R,
}

impl<R: RecordRepository<Meeting>> MeetingService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Schedules one meeting and returns the saved record with its id bound.
    pub fn schedule_meeting(
        &mut self,
        title: impl Into<String>,
        held_on: i64,
    ) -> Result<Meeting, MeetingServiceError> {
        let mut meeting = Meeting::new(title, held_on);
        self.repo.save(&mut meeting)?;
        Ok(meeting)
    }

    /// Attaches minutes to a held meeting and returns the updated record.
    pub fn attach_minutes(
        &mut self,
        id: RecordId,
        minutes: impl Into<String>,
    ) -> Result<Meeting, MeetingServiceError> {
        let mut meeting = self
            .repo
            .get_by_id(id)?
            .ok_or(MeetingServiceError::MeetingNotFound(id))?;
        meeting.minutes = Some(minutes.into());
        self.repo.update(&mut meeting)?;
        Ok(meeting)
    }

    /// Returns all meetings sorted ascending by date.
    pub fn agenda(&self) -> Result<Vec<Meeting>, MeetingServiceError> {
        Ok(self.repo.list_sorted(&["held_on"])?)
    }

    /// Cancels (removes) one meeting by id.
    pub fn cancel_meeting(&mut self, id: RecordId) -> Result<(), MeetingServiceError> {
        let meeting = self
            .repo
            .get_by_id(id)?
            .ok_or(MeetingServiceError::MeetingNotFound(id))?;
        self.repo.remove(&meeting)?;
        Ok(())
    }
}
