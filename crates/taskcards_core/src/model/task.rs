//! Task domain model.
//!
//! # Responsibility
//! - Define `ExtractedTask` (pre-dedup) and `TaskRecord` (persisted) shapes.
//! - Validate names, priorities and ISO-8601 timestamps.
//!
//! # Invariants
//! - `TaskRecord::created_at` is RFC 3339 UTC with microsecond precision, so
//!   lexical order equals chronological order.
//! - `TaskRecord` can only be built from a validated `ExtractedTask`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Store-assigned identifier for a persisted task.
pub type RecordId = Uuid;

/// Field-level validation failure for task shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    EmptyName,
    InvalidPriority(i64),
    InvalidDueDate(String),
    InvalidCreatedAt(String),
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "task name cannot be empty"),
            Self::InvalidPriority(value) => {
                write!(f, "priority must be 1, 2 or 3, got {value}")
            }
            Self::InvalidDueDate(value) => {
                write!(f, "due_date `{value}` is not an ISO-8601 date or date-time")
            }
            Self::InvalidCreatedAt(value) => {
                write!(f, "created_at `{value}` is not an RFC 3339 timestamp")
            }
        }
    }
}

impl Error for TaskValidationError {}

/// Task urgency as reported by the reminder source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Priority {
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Priority {
    /// Upper-case label printed on task cards.
    pub fn label(self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }

    pub fn as_i64(self) -> i64 {
        self as i64
    }
}

impl TryFrom<i64> for Priority {
    type Error = TaskValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::High),
            2 => Ok(Self::Medium),
            3 => Ok(Self::Low),
            other => Err(TaskValidationError::InvalidPriority(other)),
        }
    }
}

impl From<Priority> for i64 {
    fn from(value: Priority) -> Self {
        value.as_i64()
    }
}

/// Task as produced by an extractor, before any dedup decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedTask {
    pub name: String,
    pub priority: Priority,
    /// ISO-8601 date or date-time. `None` means no deadline.
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub completed: bool,
    /// Originating reminder list, e.g. `Work`.
    #[serde(default)]
    pub list_name: Option<String>,
}

impl ExtractedTask {
    pub fn new(name: impl Into<String>, priority: Priority) -> Self {
        Self {
            name: name.into(),
            priority,
            due_date: None,
            completed: false,
            list_name: None,
        }
    }

    pub fn with_due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = Some(due_date.into());
        self
    }

    pub fn with_list_name(mut self, list_name: impl Into<String>) -> Self {
        self.list_name = Some(list_name.into());
        self
    }

    pub fn validate(&self) -> Result<(), TaskValidationError> {
        validate_name(&self.name)?;
        validate_due_date(self.due_date.as_deref())
    }

    /// Returns whether the deadline is at or before `now`.
    ///
    /// Naive date-times are read as UTC; tasks without a deadline are never due.
    pub fn is_due_by(&self, now: DateTime<Utc>) -> bool {
        self.due_date
            .as_deref()
            .and_then(parse_iso8601)
            .is_some_and(|due| due <= now.naive_utc())
    }
}

/// Persisted task. Built once, never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskRecord {
    pub name: String,
    pub priority: Priority,
    pub due_date: Option<String>,
    pub completed: bool,
    pub list_name: Option<String>,
    pub created_at: String,
}

impl TaskRecord {
    /// Promotes an accepted extracted task into a record stamped `created_at`.
    ///
    /// # Errors
    /// - Any [`TaskValidationError`] reported by [`ExtractedTask::validate`].
    pub fn from_extracted(
        task: ExtractedTask,
        created_at: DateTime<Utc>,
    ) -> Result<Self, TaskValidationError> {
        task.validate()?;
        Ok(Self {
            name: task.name,
            priority: task.priority,
            due_date: task.due_date,
            completed: task.completed,
            list_name: task.list_name,
            created_at: format_timestamp(created_at),
        })
    }

    pub fn validate(&self) -> Result<(), TaskValidationError> {
        validate_name(&self.name)?;
        validate_due_date(self.due_date.as_deref())?;
        self.created_at_utc().map(|_| ())
    }

    pub fn created_at_utc(&self) -> Result<DateTime<Utc>, TaskValidationError> {
        DateTime::parse_from_rfc3339(&self.created_at)
            .map(|value| value.with_timezone(&Utc))
            .map_err(|_| TaskValidationError::InvalidCreatedAt(self.created_at.clone()))
    }
}

/// Persisted record together with its store-assigned id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredTask {
    pub id: RecordId,
    pub record: TaskRecord,
}

/// Stored record paired with its distance to a queried name.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityResult {
    pub record_id: RecordId,
    pub record: TaskRecord,
    /// `0.0` means identical names; larger means less alike.
    pub similarity_distance: f64,
}

/// Canonical `created_at` text form.
pub fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses the ISO-8601 forms accepted for `due_date`.
///
/// Offsets are converted to UTC; plain dates map to midnight.
pub fn parse_iso8601(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.naive_utc());
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(parsed);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

fn validate_name(name: &str) -> Result<(), TaskValidationError> {
    if name.trim().is_empty() {
        return Err(TaskValidationError::EmptyName);
    }
    Ok(())
}

fn validate_due_date(due_date: Option<&str>) -> Result<(), TaskValidationError> {
    match due_date {
        Some(value) if parse_iso8601(value).is_none() => {
            Err(TaskValidationError::InvalidDueDate(value.to_string()))
        }
        _ => Ok(()),
    }
}
