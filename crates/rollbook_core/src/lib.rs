//! Core data access for Rollbook.
//! This crate is the single source of truth for record persistence.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::meeting::Meeting;
pub use model::member::Member;
pub use repo::record::{Record, RecordId};
pub use repo::record_repo::{RecordRepository, SqliteRecordRepository};
pub use repo::{RepoError, RepoResult};
pub use service::meeting_service::{MeetingService, MeetingServiceError};
pub use service::member_service::{MemberService, MemberServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
