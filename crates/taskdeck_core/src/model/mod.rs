//! Domain model for task tracking.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep wire names compatible with the persisted JSON payloads.
//!
//! # Invariants
//! - Every task record carries exactly one owner identity.
//! - Derived views (stats, filtered lists) are never persisted.
//!
//! # See also
//! - `crate::repo::task_repo` for the persisted collection layout

pub mod task;
pub mod user;
