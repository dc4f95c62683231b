//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate identity, storage, query and stats into use-case APIs.
//! - Keep presentation layers decoupled from storage details.
//!
//! # See also
//! - `crate::repo::task_repo::TaskRepository`

pub mod dashboard;
pub mod session_service;
pub mod task_service;
