//! Task sources feeding the dedup cycle.
//!
//! # Responsibility
//! - Define the `Extractor` contract the orchestrator pulls batches from.
//! - Provide a JSON-file source and a fixed in-memory source.
//!
//! # Invariants
//! - An unreachable source is reported as `ExtractError`, never as an empty
//!   batch.
//! - Batch order is preserved; the orchestrator relies on it.

pub mod credentials;

use crate::model::task::{ExtractedTask, Priority};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use log::{error, info};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Failure to obtain a batch from a task source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// Source cannot be reached or read.
    SourceUnavailable(String),
    /// Source answered with something that is not a task batch.
    InvalidPayload(String),
}

impl Display for ExtractError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SourceUnavailable(message) => write!(f, "task source unavailable: {message}"),
            Self::InvalidPayload(message) => write!(f, "invalid task payload: {message}"),
        }
    }
}

impl Error for ExtractError {}

/// External reminder source.
pub trait Extractor {
    fn fetch_tasks(&self) -> Result<Vec<ExtractedTask>, ExtractError>;
}

/// Reads a batch from a JSON file.
///
/// Accepts either a bare array of tasks or an object with a `tasks` array
/// (an optional `summary` string is ignored).
#[derive(Debug, Clone)]
pub struct JsonFileExtractor {
    path: PathBuf,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TaskPayload {
    Bare(Vec<ExtractedTask>),
    Wrapped { tasks: Vec<ExtractedTask> },
}

impl JsonFileExtractor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Extractor for JsonFileExtractor {
    fn fetch_tasks(&self) -> Result<Vec<ExtractedTask>, ExtractError> {
        let contents = std::fs::read_to_string(&self.path).map_err(|err| {
            error!(
                "event=source_fetch module=source status=error source=json_file error_code=source_read_failed error={}",
                err
            );
            ExtractError::SourceUnavailable(format!("{}: {err}", self.path.display()))
        })?;

        let payload = serde_json::from_str::<TaskPayload>(&contents).map_err(|err| {
            error!(
                "event=source_fetch module=source status=error source=json_file error_code=source_parse_failed error={}",
                err
            );
            ExtractError::InvalidPayload(format!("{}: {err}", self.path.display()))
        })?;

        let tasks = match payload {
            TaskPayload::Bare(tasks) | TaskPayload::Wrapped { tasks } => tasks,
        };
        info!(
            "event=source_fetch module=source status=ok source=json_file count={}",
            tasks.len()
        );
        Ok(tasks)
    }
}

/// Fixed in-memory batch, returned on every fetch.
#[derive(Debug, Clone, Default)]
pub struct StaticExtractor {
    tasks: Vec<ExtractedTask>,
}

impl StaticExtractor {
    pub fn new(tasks: Vec<ExtractedTask>) -> Self {
        Self { tasks }
    }

    /// Two sample reminders (one due now, one due tomorrow) for demo runs.
    pub fn sample(now: DateTime<Utc>) -> Self {
        let due = |at: DateTime<Utc>| at.to_rfc3339_opts(SecondsFormat::Secs, true);
        Self::new(vec![
            ExtractedTask::new("Sample reminder 1", Priority::High)
                .with_due_date(due(now))
                .with_list_name("Work"),
            ExtractedTask::new("Sample reminder 2", Priority::Medium)
                .with_due_date(due(now + Duration::days(1)))
                .with_list_name("Personal"),
        ])
    }
}

impl Extractor for StaticExtractor {
    fn fetch_tasks(&self) -> Result<Vec<ExtractedTask>, ExtractError> {
        Ok(self.tasks.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::{ExtractError, Extractor, JsonFileExtractor, StaticExtractor};
    use crate::model::task::Priority;
    use chrono::{TimeZone, Utc};
    use std::io::Write;

    fn write_json(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn json_extractor_reads_bare_array_with_defaults() {
        let file = write_json(r#"[{"name": "Buy milk", "priority": 1}]"#);
        let tasks = JsonFileExtractor::new(file.path()).fetch_tasks().unwrap();

        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].priority, Priority::High);
        assert!(!tasks[0].completed);
        assert_eq!(tasks[0].due_date, None);
    }

    #[test]
    fn json_extractor_reads_wrapped_batch() {
        let file = write_json(
            r#"{"summary": "two tasks", "tasks": [
                {"name": "Buy milk", "priority": 1, "list_name": "Home"},
                {"name": "Call dentist", "priority": 2, "due_date": "2026-11-02"}
            ]}"#,
        );
        let tasks = JsonFileExtractor::new(file.path()).fetch_tasks().unwrap();

        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].list_name.as_deref(), Some("Home"));
        assert_eq!(tasks[1].due_date.as_deref(), Some("2026-11-02"));
    }

    #[test]
    fn json_extractor_rejects_out_of_range_priority() {
        let file = write_json(r#"[{"name": "Buy milk", "priority": 7}]"#);
        let err = JsonFileExtractor::new(file.path()).fetch_tasks().unwrap_err();
        assert!(matches!(err, ExtractError::InvalidPayload(_)));
    }

    #[test]
    fn json_extractor_reports_missing_file_as_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = JsonFileExtractor::new(dir.path().join("absent.json"))
            .fetch_tasks()
            .unwrap_err();
        assert!(matches!(err, ExtractError::SourceUnavailable(_)));
    }

    #[test]
    fn sample_extractor_is_deterministic_for_fixed_clock() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap();
        let tasks = StaticExtractor::sample(now).fetch_tasks().unwrap();

        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].due_date.as_deref(), Some("2026-10-19T08:00:00Z"));
        assert_eq!(tasks[1].due_date.as_deref(), Some("2026-10-20T08:00:00Z"));
        assert!(tasks.iter().all(|task| task.validate().is_ok()));
    }
}
