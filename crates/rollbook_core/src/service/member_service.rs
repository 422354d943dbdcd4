//! Member use-case service.
//!
//! # Responsibility
//! - Provide member registration, roster and maintenance APIs.
//! - Delegate persistence to the generic record repository.
//!
//! # Invariants
//! - The roster is sorted ascending by `full_name`.
//! - Registration stamps `joined_at` with the current wall clock.

use crate::model::member::Member;
use crate::repo::record::RecordId;
use crate::repo::record_repo::RecordRepository;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

/// Service error for member use-cases.
#[derive(Debug)]
pub enum MemberServiceError {
    /// Target member does not exist.
    MemberNotFound(RecordId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for MemberServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MemberNotFound(id) => write!(f, "member not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for MemberServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::MemberNotFound(_) => None,
        }
    }
}

impl From<RepoError> for MemberServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { id, .. } => Self::MemberNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Member service facade over repository implementations.
pub struct MemberService<R: RecordRepository<Member>> {
    repo: R,
}

impl<R: RecordRepository<Member>> MemberService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers one member and returns the saved record with its id bound.
    pub fn register_member(
        &mut self,
        full_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<Member, MemberServiceError> {
        let mut member = Member::new(full_name, email, now_epoch_ms());
        self.repo.save(&mut member)?;
        Ok(member)
    }

    /// Imports a batch of members atomically and returns them with ids
    /// bound. A failed import persists nothing.
    pub fn import_members(
        &mut self,
        mut members: Vec<Member>,
    ) -> Result<Vec<Member>, MemberServiceError> {
        self.repo.save_all(&mut members)?;
        Ok(members)
    }

    /// Returns all members sorted ascending by full name.
    pub fn roster_by_name(&self) -> Result<Vec<Member>, MemberServiceError> {
        Ok(self.repo.list_sorted(&["full_name"])?)
    }

    /// Returns the total number of registered members.
    pub fn member_count(&self) -> Result<i64, MemberServiceError> {
        Ok(self.repo.count_all()?)
    }

    /// Gets one member by id.
    pub fn get_member(&self, id: RecordId) -> Result<Option<Member>, MemberServiceError> {
        Ok(self.repo.get_by_id(id)?)
    }

    /// Replaces a member's email and returns the updated record.
    pub fn change_email(
        &mut self,
        id: RecordId,
        new_email: impl Into<String>,
    ) -> Result<Member, MemberServiceError> {
        let mut member = self
            .repo
            .get_by_id(id)?
            .ok_or(MemberServiceError::MemberNotFound(id))?;
        member.email = new_email.into();
        self.repo.update(&mut member)?;
        Ok(member)
    }

    /// Removes one member by id.
    pub fn remove_member(&mut self, id: RecordId) -> Result<(), MemberServiceError> {
        let member = self
            .repo
            .get_by_id(id)?
            .ok_or(MemberServiceError::MemberNotFound(id))?;
        self.repo.remove(&member)?;
        Ok(())
    }
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as i64)
}
