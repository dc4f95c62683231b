//! Storage abstractions and implementations.
//!
//! # Responsibility
//! - Define the key-value slot capability and its backings.
//! - Define the owner-scoped task item store on top of it.
//!
//! # Invariants
//! - Scoping is applied here, never at the key-value layer.
//! - Task reads degrade to empty instead of surfacing storage errors.
//!
//! # See also
//! - `crate::db::migrations` for the slot table schema

pub mod kv_store;
pub mod task_repo;
