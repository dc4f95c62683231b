//! Statistics aggregation over task records.
//!
//! Counts are taken over distinct task *texts*, not records: two records
//! titled "Pay rent" count once in every bucket they share. Stored data and
//! existing dashboards depend on this, so it is kept as-is (see DESIGN.md,
//! "records or distinct titles").
//!
//! # Invariants
//! - `pending_todos == total_todos - completed_todos`.
//! - `category_stats` only holds categories that occur.
//! - `recent_activity` is newest first and at most the configured limit.

use crate::model::task::{Category, Priority, TaskRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Default length of the recent-activity feed.
pub const RECENT_ACTIVITY_LIMIT: usize = 5;

/// Aggregate dashboard view for one owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_todos: usize,
    pub completed_todos: usize,
    pub pending_todos: usize,
    pub high_priority_todos: usize,
    pub medium_priority_todos: usize,
    pub low_priority_todos: usize,
    pub category_stats: BTreeMap<Category, usize>,
    pub recent_activity: Vec<ActivityEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Created,
    Completed,
}

/// One line of the recent-activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub task_text: String,
    pub kind: ActivityKind,
    pub timestamp: DateTime<Utc>,
}

impl ActivityEntry {
    /// Display line, e.g. `Completed: Pay rent`.
    pub fn label(&self) -> String {
        let verb = match self.kind {
            ActivityKind::Created => "Created",
            ActivityKind::Completed => "Completed",
        };
        format!("{verb}: {}", self.task_text)
    }
}

/// Aggregates `records` with the default activity feed length.
///
/// `now` stamps completed entries; completion time is not stored per record.
pub fn aggregate(records: &[TaskRecord], now: DateTime<Utc>) -> Stats {
    aggregate_with_limit(records, now, RECENT_ACTIVITY_LIMIT)
}

pub fn aggregate_with_limit(
    records: &[TaskRecord],
    now: DateTime<Utc>,
    activity_limit: usize,
) -> Stats {
    let total_todos = distinct_texts(records.iter());
    let completed_todos = distinct_texts(records.iter().filter(|record| record.completed));
    let by_priority =
        |priority: Priority| distinct_texts(records.iter().filter(|r| r.priority == priority));

    let mut per_category: BTreeMap<Category, HashSet<&str>> = BTreeMap::new();
    for record in records {
        per_category
            .entry(record.category)
            .or_default()
            .insert(record.text.as_str());
    }

    Stats {
        total_todos,
        completed_todos,
        pending_todos: total_todos.saturating_sub(completed_todos),
        high_priority_todos: by_priority(Priority::High),
        medium_priority_todos: by_priority(Priority::Medium),
        low_priority_todos: by_priority(Priority::Low),
        category_stats: per_category
            .into_iter()
            .map(|(category, texts)| (category, texts.len()))
            .collect(),
        recent_activity: recent_activity(records, now, activity_limit),
    }
}

fn distinct_texts<'a>(records: impl Iterator<Item = &'a TaskRecord>) -> usize {
    records
        .map(|record| record.text.as_str())
        .collect::<HashSet<_>>()
        .len()
}

/// One entry per distinct text, in first-seen order, then newest first.
fn recent_activity(
    records: &[TaskRecord],
    now: DateTime<Utc>,
    limit: usize,
) -> Vec<ActivityEntry> {
    let mut entries: Vec<ActivityEntry> = Vec::new();
    let mut slot_by_text: HashMap<&str, usize> = HashMap::new();

    for record in records {
        let slot = *slot_by_text.entry(record.text.as_str()).or_insert_with(|| {
            entries.push(ActivityEntry {
                task_text: record.text.clone(),
                kind: ActivityKind::Created,
                timestamp: record.created_at,
            });
            entries.len() - 1
        });
        if record.completed {
            entries[slot].kind = ActivityKind::Completed;
            entries[slot].timestamp = now;
        }
    }

    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    entries.truncate(limit);
    entries
}
