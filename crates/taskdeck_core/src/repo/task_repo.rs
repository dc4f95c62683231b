//! Owner-scoped task storage over the shared `todos` slot.
//!
//! # Responsibility
//! - Decode the flat, all-owner task array into an owner-keyed collection.
//! - Serve scoped reads and full-subset replacement writes.
//!
//! # Invariants
//! - `load(owner)` only yields records whose `userEmail` equals `owner`.
//! - Reads never fail: absent, unreadable or unparsable slots load as empty.
//! - `save(owner, ..)` leaves every other owner's raw entries untouched,
//!   including entries this build cannot decode. The owner's own
//!   undecodable entries are kept as well.
//! - `save` never overwrites a slot it cannot parse.
//!
//! # See also
//! - `crate::repo::kv_store` for the slot backends

use crate::model::task::{OwnerId, TaskRecord};
use crate::repo::kv_store::{KeyValueStore, StoreError, TODOS_KEY};
use log::{debug, error, info, warn};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

const OWNER_FIELD: &str = "userEmail";

pub type RepoResult<T> = Result<T, RepoError>;

/// Write-path failure for task persistence.
#[derive(Debug)]
pub enum RepoError {
    Store(StoreError),
    /// The stored collection does not parse; the slot is left as it is.
    Corrupt(serde_json::Error),
    Serialize(serde_json::Error),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Corrupt(err) => write!(f, "stored task collection is unreadable: {err}"),
            Self::Serialize(err) => write!(f, "failed to encode task collection: {err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Corrupt(err) | Self::Serialize(err) => Some(err),
        }
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}

/// Item store contract used by services.
pub trait TaskRepository {
    /// Returns the owner's records. Never fails; problems are logged.
    fn load(&self, owner: &OwnerId) -> Vec<TaskRecord>;
    /// Replaces the owner's full record set and persists every owner.
    ///
    /// Returns `Corrupt` without writing when the stored collection does
    /// not parse.
    fn save(&self, owner: &OwnerId, records: &[TaskRecord]) -> RepoResult<()>;
}

impl<T: TaskRepository + ?Sized> TaskRepository for &T {
    fn load(&self, owner: &OwnerId) -> Vec<TaskRecord> {
        (**self).load(owner)
    }

    fn save(&self, owner: &OwnerId, records: &[TaskRecord]) -> RepoResult<()> {
        (**self).save(owner, records)
    }
}

/// In-memory view of the shared slot, keyed by owner.
///
/// Entries stay as raw JSON so foreign or malformed records survive a
/// rewrite unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskCollection {
    by_owner: BTreeMap<OwnerId, Vec<Value>>,
    unowned: Vec<Value>,
}

impl TaskCollection {
    /// Parses a persisted slot payload. The payload must be a JSON array.
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        let entries: Vec<Value> = serde_json::from_str(raw)?;
        Ok(Self::from_entries(entries))
    }

    pub fn from_entries(entries: impl IntoIterator<Item = Value>) -> Self {
        let mut collection = Self::default();
        for entry in entries {
            match entry.get(OWNER_FIELD).and_then(Value::as_str) {
                Some(owner) => collection
                    .by_owner
                    .entry(OwnerId::new(owner))
                    .or_default()
                    .push(entry),
                None => collection.unowned.push(entry),
            }
        }
        collection
    }

    /// Decodes the owner's entries, skipping any that do not decode.
    ///
    /// Returns the decoded records and the number of skipped entries.
    pub fn records_for(&self, owner: &OwnerId) -> (Vec<TaskRecord>, usize) {
        let Some(entries) = self.by_owner.get(owner) else {
            return (Vec::new(), 0);
        };

        let mut records = Vec::with_capacity(entries.len());
        let mut skipped = 0;
        for entry in entries {
            match TaskRecord::deserialize(entry) {
                Ok(record) if &record.owner == owner => records.push(record),
                Ok(_) => skipped += 1,
                Err(err) => {
                    skipped += 1;
                    debug!("event=todo_decode module=repo status=skipped error={err}");
                }
            }
        }
        (records, skipped)
    }

    /// Replaces the owner's decodable entries with `records`, stamped with
    /// `owner`. Entries of that owner which do not decode are kept first.
    pub fn replace_owner(
        &mut self,
        owner: &OwnerId,
        records: &[TaskRecord],
    ) -> Result<(), serde_json::Error> {
        let mut entries: Vec<Value> = self
            .by_owner
            .remove(owner)
            .unwrap_or_default()
            .into_iter()
            .filter(|entry| TaskRecord::deserialize(entry).is_err())
            .collect();
        if !entries.is_empty() {
            debug!(
                "event=todos_save module=repo status=kept_undecodable count={}",
                entries.len()
            );
        }

        entries.reserve(records.len());
        for record in records {
            let mut value = serde_json::to_value(record)?;
            if let Some(object) = value.as_object_mut() {
                object.insert(OWNER_FIELD.to_string(), Value::String(owner.to_string()));
            }
            entries.push(value);
        }
        if !entries.is_empty() {
            self.by_owner.insert(owner.clone(), entries);
        }
        Ok(())
    }

    /// Total raw entries across all owners, unowned included.
    pub fn len(&self) -> usize {
        self.unowned.len() + self.by_owner.values().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flattens back to the persisted array form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let flat: Vec<&Value> = self
            .unowned
            .iter()
            .chain(self.by_owner.values().flatten())
            .collect();
        serde_json::to_string(&flat)
    }
}

/// Task repository persisting into a [`KeyValueStore`] slot.
pub struct KvTaskRepository<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> KvTaskRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reads the whole collection. An absent slot is an empty collection.
    fn read_collection(&self, operation: &'static str) -> RepoResult<TaskCollection> {
        let raw = match self.store.get(TODOS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(TaskCollection::default()),
            Err(err) => {
                error!(
                    "event={operation} module=repo status=error error_code=store_read_failed error={err}"
                );
                return Err(err.into());
            }
        };

        TaskCollection::parse(&raw).map_err(|err| {
            warn!(
                "event={operation} module=repo status=error error_code=todos_parse_failed payload_len={} error={err}",
                raw.len()
            );
            RepoError::Corrupt(err)
        })
    }
}

impl<S: KeyValueStore> TaskRepository for KvTaskRepository<S> {
    fn load(&self, owner: &OwnerId) -> Vec<TaskRecord> {
        let collection = self.read_collection("todos_load").unwrap_or_default();
        let (records, skipped) = collection.records_for(owner);
        if skipped > 0 {
            warn!(
                "event=todos_load module=repo status=partial records={} skipped={skipped}",
                records.len()
            );
        } else {
            debug!(
                "event=todos_load module=repo status=ok records={}",
                records.len()
            );
        }
        records
    }

    fn save(&self, owner: &OwnerId, records: &[TaskRecord]) -> RepoResult<()> {
        let mut collection = self.read_collection("todos_save")?;
        collection.replace_owner(owner, records)?;
        let payload = collection.to_json()?;
        self.store.set(TODOS_KEY, &payload)?;
        info!(
            "event=todos_save module=repo status=ok owner_records={} total_records={}",
            records.len(),
            collection.len()
        );
        Ok(())
    }
}
