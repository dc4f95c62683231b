//! Task record domain model.
//!
//! # Responsibility
//! - Define the canonical to-do record persisted in the `todos` slot.
//! - Own record-level validation (text, tag cap) and patch merging.
//!
//! # Invariants
//! - `tags.len() <= MAX_TAGS` after any validated mutation.
//! - `text` is non-blank after any validated mutation.
//! - `owner` is the only field used for scoping.
//!
//! # See also
//! - `crate::service::task_service` for the mutation entry points

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Maximum number of tags a record may carry.
pub const MAX_TAGS: usize = 3;

/// Millisecond-timestamp based record identifier.
///
/// Serialized as a bare JSON number to stay compatible with stored payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub i64);

impl TaskId {
    /// Allocates an id from `now`, bumped past every id in `existing`.
    pub fn allocate<'a>(
        now: DateTime<Utc>,
        existing: impl IntoIterator<Item = &'a TaskId>,
    ) -> Self {
        let candidate = now.timestamp_millis();
        let floor = existing
            .into_iter()
            .map(|id| id.0.saturating_add(1))
            .max()
            .unwrap_or(i64::MIN);
        Self(candidate.max(floor))
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Owner identity used to scope the shared collection (the user's email).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for OwnerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fixed category set for task records.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Category {
    Work,
    Personal,
    Shopping,
    Health,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Work,
        Category::Personal,
        Category::Shopping,
        Category::Health,
        Category::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Work => "Work",
            Self::Personal => "Personal",
            Self::Shopping => "Shopping",
            Self::Health => "Health",
            Self::Other => "Other",
        }
    }
}

impl FromStr for Category {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("category", s))
    }
}

/// Task priority. Ordering follows rank: `Low < Medium < High`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    /// Sort rank used by list ordering (high=3, medium=2, low=1).
    pub fn rank(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|priority| priority.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("priority", s))
    }
}

/// Parse failure for closed string enums.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub field: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(field: &'static str, value: &str) -> Self {
        Self {
            field,
            value: value.to_string(),
        }
    }
}

impl Display for UnknownVariant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown {} `{}`", self.field, self.value)
    }
}

impl Error for UnknownVariant {}

/// Canonical to-do record.
///
/// Field names on the wire are camelCase so existing stored arrays decode
/// without conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: TaskId,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub category: Category,
    pub priority: Priority,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "nullable_tags")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(rename = "userEmail")]
    pub owner: OwnerId,
}

impl TaskRecord {
    /// Creates a fresh, uncompleted record owned by `owner`.
    ///
    /// Does not validate `text`; callers reject blank input first.
    pub fn new(
        id: TaskId,
        owner: OwnerId,
        text: impl Into<String>,
        category: Category,
        priority: Priority,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            text: text.into(),
            completed: false,
            created_at,
            category,
            priority,
            due_date: None,
            tags: Vec::new(),
            notes: Some(String::new()),
            assigned_to: None,
            owner,
        }
    }

    /// Checks record-level invariants.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.text.trim().is_empty() {
            return Err(TaskValidationError::EmptyText);
        }
        if self.tags.len() > MAX_TAGS {
            return Err(TaskValidationError::TooManyTags {
                count: self.tags.len(),
                max: MAX_TAGS,
            });
        }
        Ok(())
    }

    /// Appends one trimmed tag, rejecting blank input and a full tag list.
    pub fn push_tag(&mut self, tag: &str) -> Result<(), TaskValidationError> {
        let trimmed = tag.trim();
        if trimmed.is_empty() {
            return Err(TaskValidationError::EmptyTag);
        }
        if self.tags.len() >= MAX_TAGS {
            return Err(TaskValidationError::TooManyTags {
                count: self.tags.len() + 1,
                max: MAX_TAGS,
            });
        }
        self.tags.push(trimmed.to_string());
        Ok(())
    }

    /// Removes every tag equal to `tag`. Returns whether anything changed.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|existing| existing != tag);
        self.tags.len() != before
    }

    /// Returns a copy with `patch` merged in, or the validation failure.
    ///
    /// `self` is left untouched when the merged record is invalid.
    pub fn apply_patch(&self, patch: &TaskPatch) -> Result<TaskRecord, TaskValidationError> {
        let mut next = self.clone();
        if let Some(text) = &patch.text {
            next.text = text.clone();
        }
        if let Some(completed) = patch.completed {
            next.completed = completed;
        }
        if let Some(category) = patch.category {
            next.category = category;
        }
        if let Some(priority) = patch.priority {
            next.priority = priority;
        }
        if let Some(due_date) = patch.due_date {
            next.due_date = due_date;
        }
        if let Some(tags) = &patch.tags {
            next.tags = tags.clone();
        }
        if let Some(notes) = &patch.notes {
            next.notes = notes.clone();
        }
        if let Some(assigned_to) = &patch.assigned_to {
            next.assigned_to = assigned_to.clone();
        }
        next.validate()?;
        Ok(next)
    }
}

/// Partial update for an existing record.
///
/// `None` leaves a field unchanged; for nullable fields `Some(None)` clears.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub text: Option<String>,
    pub completed: Option<bool>,
    pub category: Option<Category>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub tags: Option<Vec<String>>,
    pub notes: Option<Option<String>>,
    pub assigned_to: Option<Option<String>>,
}

/// Record-level validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    EmptyText,
    EmptyTag,
    TooManyTags { count: usize, max: usize },
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyText => write!(f, "task text cannot be empty"),
            Self::EmptyTag => write!(f, "tag cannot be empty"),
            Self::TooManyTags { count, max } => {
                write!(f, "task cannot have more than {max} tags (got {count})")
            }
        }
    }
}

impl Error for TaskValidationError {}

fn nullable_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> TaskRecord {
        TaskRecord::new(
            TaskId(1),
            OwnerId::new("ann@example.com"),
            "Pay rent",
            Category::Personal,
            Priority::High,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
                .single()
                .expect("fixed timestamp should be valid"),
        )
    }

    #[test]
    fn allocate_bumps_past_existing_ids() {
        let now = Utc
            .timestamp_millis_opt(1_000)
            .single()
            .expect("1s after epoch should be valid");
        assert_eq!(TaskId::allocate(now, std::iter::empty()), TaskId(1_000));
        assert_eq!(TaskId::allocate(now, &[TaskId(1_000)]), TaskId(1_001));
        assert_eq!(TaskId::allocate(now, &[TaskId(5)]), TaskId(1_000));
    }

    #[test]
    fn push_tag_rejects_fourth_tag() {
        let mut record = sample();
        for tag in ["a", "b", "c"] {
            record
                .push_tag(tag)
                .expect("tags below the cap should be accepted");
        }
        let err = record
            .push_tag("d")
            .expect_err("a fourth tag should be rejected");
        assert_eq!(err, TaskValidationError::TooManyTags { count: 4, max: 3 });
        assert_eq!(record.tags.len(), 3);
    }

    #[test]
    fn push_tag_trims_and_rejects_blank() {
        let mut record = sample();
        record
            .push_tag("  home ")
            .expect("padded tag should be accepted");
        assert_eq!(record.tags, vec!["home".to_string()]);
        assert_eq!(record.push_tag("   "), Err(TaskValidationError::EmptyTag));
    }

    #[test]
    fn apply_patch_rejects_oversized_tags_without_mutating() {
        let record = sample();
        let patch = TaskPatch {
            tags: Some(vec!["a".into(), "b".into(), "c".into(), "d".into()]),
            ..TaskPatch::default()
        };
        assert!(matches!(
            record.apply_patch(&patch),
            Err(TaskValidationError::TooManyTags { count: 4, .. })
        ));
        assert!(record.tags.is_empty());
    }

    #[test]
    fn apply_patch_clears_nullable_fields() {
        let mut record = sample();
        record.due_date = Some(record.created_at);
        let patch = TaskPatch {
            due_date: Some(None),
            priority: Some(Priority::Low),
            ..TaskPatch::default()
        };
        let next = record
            .apply_patch(&patch)
            .expect("clearing patch should be valid");
        assert_eq!(next.due_date, None);
        assert_eq!(next.priority, Priority::Low);
        assert_eq!(next.text, "Pay rent");
    }

    #[test]
    fn string_enums_parse_wire_names() {
        assert_eq!("Shopping".parse::<Category>(), Ok(Category::Shopping));
        assert_eq!("high".parse::<Priority>(), Ok(Priority::High));
        assert!("High".parse::<Priority>().is_err());
    }
}
