//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep application callers decoupled from storage details.

pub mod meeting_service;
pub mod member_service;
