//! Task use-case service.
//!
//! # Responsibility
//! - Provide add/edit/delete/toggle/tag entry points for the current owner.
//! - Serve filtered lists and dashboard stats from a scoped load.
//!
//! # Invariants
//! - Every write is a full owner-subset save through the repository.
//! - A rejected mutation saves nothing.
//! - Reads without an identity return empty results, never foreign records.
//! - An identity with a blank email counts as no identity.

use crate::clock::{Clock, SystemClock};
use crate::config::CoreConfig;
use crate::model::task::{
    Category, OwnerId, Priority, TaskId, TaskPatch, TaskRecord, TaskValidationError,
};
use crate::query::filter::{filter_tasks, TaskQuery};
use crate::repo::task_repo::{RepoError, TaskRepository};
use crate::stats::aggregate::{aggregate_with_limit, Stats, RECENT_ACTIVITY_LIMIT};
use crate::service::session_service::IdentityProvider;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type TaskServiceResult<T> = Result<T, TaskServiceError>;

/// Service error for task mutations.
#[derive(Debug)]
pub enum TaskServiceError {
    /// The mutation would break a record invariant.
    Validation(TaskValidationError),
    /// No record with this id for the current owner.
    NotFound(TaskId),
    /// Nobody is signed in.
    NoIdentity,
    Repo(RepoError),
}

impl Display for TaskServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::NoIdentity => write!(f, "no signed-in user"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TaskServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::NotFound(_) | Self::NoIdentity => None,
        }
    }
}

impl From<TaskValidationError> for TaskServiceError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for TaskServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Task service facade over a repository and an identity provider.
pub struct TaskService<R: TaskRepository, I: IdentityProvider, C: Clock = SystemClock> {
    repo: R,
    identity: I,
    clock: C,
    activity_limit: usize,
}

impl<R: TaskRepository, I: IdentityProvider> TaskService<R, I> {
    pub fn new(repo: R, identity: I) -> Self {
        Self::with_clock(repo, identity, SystemClock)
    }
}

impl<R: TaskRepository, I: IdentityProvider, C: Clock> TaskService<R, I, C> {
    pub fn with_clock(repo: R, identity: I, clock: C) -> Self {
        Self {
            repo,
            identity,
            clock,
            activity_limit: RECENT_ACTIVITY_LIMIT,
        }
    }

    /// Applies config-driven limits.
    pub fn with_config(mut self, config: &CoreConfig) -> Self {
        self.activity_limit = config.recent_activity_limit;
        self
    }

    /// Appends a new open task for the current owner.
    ///
    /// Blank text or a missing identity is a no-op returning `Ok(None)`.
    pub fn add(
        &self,
        text: &str,
        category: Category,
        priority: Priority,
    ) -> TaskServiceResult<Option<TaskRecord>> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        let Some(owner) = self.owner() else {
            return Ok(None);
        };

        let mut records = self.repo.load(&owner);
        let now = self.clock.now();
        let id = TaskId::allocate(now, records.iter().map(|record| &record.id));
        let record = TaskRecord::new(id, owner.clone(), text, category, priority, now);
        records.push(record.clone());
        self.repo.save(&owner, &records)?;

        info!(
            "event=task_add module=service status=ok id={id} category={} priority={}",
            category.as_str(),
            priority.as_str()
        );
        Ok(Some(record))
    }

    /// Flips the completion flag.
    pub fn toggle_complete(&self, id: TaskId) -> TaskServiceResult<TaskRecord> {
        self.update("task_toggle", id, |record| {
            let mut next = record.clone();
            next.completed = !next.completed;
            Ok(next)
        })
    }

    /// Removes one record.
    pub fn delete(&self, id: TaskId) -> TaskServiceResult<()> {
        let owner = self.require_owner()?;
        let mut records = self.repo.load(&owner);
        let before = records.len();
        records.retain(|record| record.id != id);
        if records.len() == before {
            return Err(TaskServiceError::NotFound(id));
        }
        self.repo.save(&owner, &records)?;
        info!("event=task_delete module=service status=ok id={id}");
        Ok(())
    }

    /// Merges `patch` onto the record.
    ///
    /// Returns `Validation` (and saves nothing) when the merged record has
    /// blank text or more than three tags.
    pub fn edit(&self, id: TaskId, patch: &TaskPatch) -> TaskServiceResult<TaskRecord> {
        self.update("task_edit", id, |record| record.apply_patch(patch))
    }

    /// Appends one tag; rejected once the record already has three.
    pub fn add_tag(&self, id: TaskId, tag: &str) -> TaskServiceResult<TaskRecord> {
        self.update("task_add_tag", id, |record| {
            let mut next = record.clone();
            next.push_tag(tag)?;
            Ok(next)
        })
    }

    /// Removes every tag equal to `tag`.
    pub fn remove_tag(&self, id: TaskId, tag: &str) -> TaskServiceResult<TaskRecord> {
        self.update("task_remove_tag", id, |record| {
            let mut next = record.clone();
            next.remove_tag(tag);
            Ok(next)
        })
    }

    /// The current owner's records in storage order.
    pub fn records(&self) -> Vec<TaskRecord> {
        match self.owner() {
            Some(owner) => self.repo.load(&owner),
            None => Vec::new(),
        }
    }

    /// Filtered, display-ordered list for the current owner.
    pub fn list(&self, query: &TaskQuery) -> Vec<TaskRecord> {
        filter_tasks(self.records(), query)
    }

    /// Dashboard stats for the current owner.
    pub fn stats(&self) -> Stats {
        aggregate_with_limit(&self.records(), self.clock.now(), self.activity_limit)
    }

    /// An identity with a blank email is treated as signed out.
    fn owner(&self) -> Option<OwnerId> {
        self.identity
            .current_identity()
            .filter(|identity| !identity.email.trim().is_empty())
            .map(|identity| identity.owner_id())
    }

    fn require_owner(&self) -> TaskServiceResult<OwnerId> {
        self.owner().ok_or(TaskServiceError::NoIdentity)
    }

    fn update(
        &self,
        event: &'static str,
        id: TaskId,
        change: impl FnOnce(&TaskRecord) -> Result<TaskRecord, TaskValidationError>,
    ) -> TaskServiceResult<TaskRecord> {
        let owner = self.require_owner()?;
        let mut records = self.repo.load(&owner);
        let slot = records
            .iter()
            .position(|record| record.id == id)
            .ok_or(TaskServiceError::NotFound(id))?;

        let next = match change(&records[slot]) {
            Ok(next) => next,
            Err(err) => {
                warn!("event={event} module=service status=rejected id={id} error={err}");
                return Err(err.into());
            }
        };
        records[slot] = next.clone();
        self.repo.save(&owner, &records)?;
        info!("event={event} module=service status=ok id={id}");
        Ok(next)
    }
}
