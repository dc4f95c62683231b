//! Task list filtering and display ordering.
//!
//! # Invariants
//! - Filtering never drops a record for a reason other than a failed match.
//! - Ordering is priority-descending and stable.
//! - Within one priority, dated records are ascending by due date across the
//!   positions dated records occupy; undated records keep their positions.

use crate::model::task::{Category, Priority, TaskRecord};
use std::cmp::Reverse;
use std::str::FromStr;

/// Filter token accepted for "no restriction".
pub const SELECT_ALL: &str = "all";

/// Either every value or exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection<T> {
    All,
    Only(T),
}

impl<T> Default for Selection<T> {
    fn default() -> Self {
        Self::All
    }
}

impl<T: PartialEq> Selection<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Self::All => true,
            Self::Only(expected) => expected == value,
        }
    }
}

impl<T: FromStr> FromStr for Selection<T> {
    type Err = T::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == SELECT_ALL {
            return Ok(Self::All);
        }
        s.parse().map(Self::Only)
    }
}

/// List query options, as driven by the list view controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskQuery {
    /// Case-insensitive substring over text and tags. Empty matches all.
    pub search_text: String,
    pub category: Selection<Category>,
    pub priority: Selection<Priority>,
    pub include_completed: bool,
}

impl Default for TaskQuery {
    fn default() -> Self {
        Self {
            search_text: String::new(),
            category: Selection::All,
            priority: Selection::All,
            include_completed: true,
        }
    }
}

impl TaskQuery {
    pub fn matches(&self, record: &TaskRecord) -> bool {
        self.matches_lowered(record, &self.search_text.to_lowercase())
    }

    fn matches_lowered(&self, record: &TaskRecord, needle: &str) -> bool {
        matches_search(record, needle)
            && self.category.matches(&record.category)
            && self.priority.matches(&record.priority)
            && (self.include_completed || !record.completed)
    }
}

fn matches_search(record: &TaskRecord, needle: &str) -> bool {
    needle.is_empty()
        || record.text.to_lowercase().contains(needle)
        || record
            .tags
            .iter()
            .any(|tag| tag.to_lowercase().contains(needle))
}

/// Filters `records` by `query` and returns them in display order.
pub fn filter_tasks(records: Vec<TaskRecord>, query: &TaskQuery) -> Vec<TaskRecord> {
    let needle = query.search_text.to_lowercase();
    let mut matched: Vec<TaskRecord> = records
        .into_iter()
        .filter(|record| query.matches_lowered(record, &needle))
        .collect();
    sort_for_display(&mut matched);
    matched
}

/// Orders records by priority rank descending, then due date ascending.
pub fn sort_for_display(records: &mut [TaskRecord]) {
    records.sort_by_key(|record| Reverse(record.priority.rank()));
    for run in records.chunk_by_mut(|a, b| a.priority == b.priority) {
        order_dated_slots(run);
    }
}

fn order_dated_slots(run: &mut [TaskRecord]) {
    let slots: Vec<usize> = run
        .iter()
        .enumerate()
        .filter(|(_, record)| record.due_date.is_some())
        .map(|(index, _)| index)
        .collect();
    if slots.len() < 2 {
        return;
    }

    let mut dated: Vec<TaskRecord> = slots.iter().map(|&index| run[index].clone()).collect();
    dated.sort_by_key(|record| record.due_date);
    for (slot, record) in slots.into_iter().zip(dated) {
        run[slot] = record;
    }
}
