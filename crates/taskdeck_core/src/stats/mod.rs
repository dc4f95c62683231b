//! Dashboard statistics.
//!
//! # Responsibility
//! - Derive summary counts and the recent-activity feed from one owner's
//!   records.
//!
//! # Invariants
//! - Stats are computed fresh per read and never persisted.
//!
//! # See also
//! - `crate::service::dashboard` for the periodic refresh loop

pub mod aggregate;
