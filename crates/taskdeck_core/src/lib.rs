//! Core domain logic for Taskdeck.
//! This crate is the single source of truth for task-tracking invariants:
//! owner scoping, the tag cap, list ordering and dashboard statistics.

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod service;
pub mod stats;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, CoreConfig};
pub use logging::{
    default_log_level, init_logging, init_logging_with_config, logging_status, LoggingError,
};
pub use model::task::{
    Category, OwnerId, Priority, TaskId, TaskPatch, TaskRecord, TaskValidationError, MAX_TAGS,
};
pub use model::user::{Identity, UserAccount};
pub use query::filter::{filter_tasks, sort_for_display, Selection, TaskQuery};
pub use repo::kv_store::{
    KeyValueStore, MemoryStore, SqliteKeyValueStore, StoreError, StoreResult, TODOS_KEY, USER_KEY,
};
pub use repo::task_repo::{KvTaskRepository, RepoError, RepoResult, TaskCollection, TaskRepository};
pub use service::dashboard::{DashboardRefresh, StatsSource};
pub use service::session_service::{
    IdentityProvider, SessionError, SessionResult, SessionService,
};
pub use service::task_service::{TaskService, TaskServiceError, TaskServiceResult};
pub use stats::aggregate::{aggregate, ActivityEntry, ActivityKind, Stats, RECENT_ACTIVITY_LIMIT};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
