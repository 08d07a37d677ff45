//! One extraction cycle: fetch → (query → decide → store → forward) per task.
//!
//! # Responsibility
//! - Pull one batch from an `Extractor`.
//! - Run every task through the dedup policy and the store, in batch order.
//! - Forward newly stored tasks to the optional printer.
//! - Summarize the cycle in a `CycleReport`.
//!
//! # Invariants
//! - A task's store write completes before the next task is queried, so
//!   near-duplicates inside one batch dedup against each other.
//! - Counters are per cycle; nothing carries over between cycles.
//! - No error escapes `run_cycle`; every task ends up counted exactly once as
//!   new, duplicate or failed.

use crate::model::task::{ExtractedTask, Priority, RecordId, StoredTask, TaskRecord};
use crate::printer::PrinterService;
use crate::repo::task_store::{StoreError, StoreResult, TaskStore};
use crate::service::dedup::{DedupDecision, DedupPolicy};
use crate::source::Extractor;
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use std::fmt::Write as _;
use std::time::Instant;

/// How a cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed,
    /// The source answered with an empty batch.
    NoTasks,
    /// The source could not be read; nothing was processed.
    SourceUnavailable(String),
}

/// Counts computed over the fetched batch before dedup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub total: usize,
    pub high_priority: usize,
    /// Tasks whose deadline is at or before the fetch time.
    pub due_now: usize,
}

impl BatchStats {
    pub fn from_batch(tasks: &[ExtractedTask], now: DateTime<Utc>) -> Self {
        Self {
            total: tasks.len(),
            high_priority: tasks
                .iter()
                .filter(|task| task.priority == Priority::High)
                .count(),
            due_now: tasks.iter().filter(|task| task.is_due_by(now)).count(),
        }
    }
}

/// Task that could not be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    /// Zero-based position in the fetched batch.
    pub position: usize,
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    pub stats: BatchStats,
    pub processed: usize,
    pub new_count: usize,
    pub duplicate_count: usize,
    pub failed_count: usize,
    pub printed_count: usize,
    pub print_failed_count: usize,
    /// Newly stored tasks, in batch order.
    pub accepted: Vec<StoredTask>,
    /// Names rejected as duplicates, in batch order.
    pub duplicates: Vec<String>,
    pub failures: Vec<TaskFailure>,
}

impl CycleReport {
    fn new(outcome: CycleOutcome) -> Self {
        Self {
            outcome,
            stats: BatchStats::default(),
            processed: 0,
            new_count: 0,
            duplicate_count: 0,
            failed_count: 0,
            printed_count: 0,
            print_failed_count: 0,
            accepted: Vec::new(),
            duplicates: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Human-readable summary for terminal output.
    pub fn render(&self) -> String {
        let mut out = String::new();
        match &self.outcome {
            CycleOutcome::SourceUnavailable(message) => {
                let _ = writeln!(out, "Task source unavailable: {message}");
                let _ = writeln!(out, "0 tasks processed");
                return out;
            }
            CycleOutcome::NoTasks => {
                let _ = writeln!(out, "No actionable tasks found");
                return out;
            }
            CycleOutcome::Completed => {}
        }

        let _ = writeln!(
            out,
            "Found {} tasks ({} high priority, {} due now)",
            self.stats.total, self.stats.high_priority, self.stats.due_now
        );
        let _ = writeln!(out, "Saved {} new tasks", self.new_count);
        for stored in &self.accepted {
            let _ = writeln!(
                out,
                "  + {} [{}]",
                stored.record.name,
                stored.record.priority.label()
            );
        }
        let _ = writeln!(
            out,
            "Skipped {} duplicate tasks",
            self.duplicate_count
        );
        for name in &self.duplicates {
            let _ = writeln!(out, "  - {name}");
        }
        if self.failed_count > 0 {
            let _ = writeln!(out, "Failed {} tasks", self.failed_count);
            for failure in &self.failures {
                let _ = writeln!(
                    out,
                    "  ! #{} {}: {}",
                    failure.position + 1,
                    failure.name,
                    failure.reason
                );
            }
        }
        if self.printed_count + self.print_failed_count > 0 {
            let _ = writeln!(
                out,
                "Printed {} cards ({} failed)",
                self.printed_count, self.print_failed_count
            );
        }
        out
    }
}

enum TaskStep {
    Stored(StoredTask),
    Duplicate { of: RecordId, distance: f64 },
}

/// Drives extraction cycles against one borrowed store.
pub struct Orchestrator<'s, S: TaskStore> {
    store: &'s mut S,
    policy: DedupPolicy,
    printer: Option<&'s dyn PrinterService>,
}

impl<'s, S: TaskStore> Orchestrator<'s, S> {
    pub fn new(store: &'s mut S, policy: DedupPolicy) -> Self {
        Self {
            store,
            policy,
            printer: None,
        }
    }

    /// Forwards every newly stored task to `printer`.
    pub fn with_printer(mut self, printer: &'s dyn PrinterService) -> Self {
        self.printer = Some(printer);
        self
    }

    pub fn policy(&self) -> &DedupPolicy {
        &self.policy
    }

    /// Runs one full cycle. Never fails; problems are reported in the result.
    pub fn run_cycle(&mut self, extractor: &dyn Extractor) -> CycleReport {
        let started_at = Instant::now();
        info!("event=cycle_start module=service status=start");

        let tasks = match extractor.fetch_tasks() {
            Ok(tasks) => tasks,
            Err(err) => {
                warn!(
                    "event=cycle_done module=service status=error duration_ms={} error_code=source_unavailable error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                return CycleReport::new(CycleOutcome::SourceUnavailable(err.to_string()));
            }
        };

        if tasks.is_empty() {
            info!(
                "event=cycle_done module=service status=ok outcome=no_tasks duration_ms={}",
                started_at.elapsed().as_millis()
            );
            return CycleReport::new(CycleOutcome::NoTasks);
        }

        let mut report = CycleReport::new(CycleOutcome::Completed);
        report.stats = BatchStats::from_batch(&tasks, Utc::now());

        for (position, task) in tasks.into_iter().enumerate() {
            self.process_task(position, task, &mut report);
        }

        info!(
            "event=cycle_done module=service status=ok outcome=completed processed={} new={} duplicate={} failed={} printed={} print_failed={} duration_ms={}",
            report.processed,
            report.new_count,
            report.duplicate_count,
            report.failed_count,
            report.printed_count,
            report.print_failed_count,
            started_at.elapsed().as_millis()
        );
        report
    }

    fn process_task(&mut self, position: usize, task: ExtractedTask, report: &mut CycleReport) {
        report.processed += 1;

        match self.dedup_and_store(&task) {
            Ok(TaskStep::Stored(stored)) => {
                debug!(
                    "event=task_decision module=service status=ok position={} decision=new record_id={}",
                    position, stored.id
                );
                report.new_count += 1;
                self.forward(&stored, report);
                report.accepted.push(stored);
            }
            Ok(TaskStep::Duplicate { of, distance }) => {
                debug!(
                    "event=task_decision module=service status=ok position={} decision=duplicate of={} distance={:.4}",
                    position, of, distance
                );
                report.duplicate_count += 1;
                report.duplicates.push(task.name);
            }
            Err(err) => {
                if matches!(err, StoreError::Closed) {
                    error!(
                        "event=task_decision module=service status=error position={} error_code=store_closed error={}",
                        position, err
                    );
                } else {
                    warn!(
                        "event=task_decision module=service status=error position={} error_code=task_skipped error={}",
                        position, err
                    );
                }
                report.failed_count += 1;
                report.failures.push(TaskFailure {
                    position,
                    name: task.name,
                    reason: err.to_string(),
                });
            }
        }
    }

    fn dedup_and_store(&mut self, task: &ExtractedTask) -> StoreResult<TaskStep> {
        task.validate()?;

        let nearest = self
            .store
            .query_by_name(&task.name, self.policy.query_limit())?;

        match self.policy.decide(task, &nearest) {
            DedupDecision::Duplicate { of, distance } => Ok(TaskStep::Duplicate { of, distance }),
            DedupDecision::New => {
                let record = TaskRecord::from_extracted(task.clone(), Utc::now())?;
                Ok(TaskStep::Stored(self.store.insert(record)?))
            }
        }
    }

    fn forward(&self, stored: &StoredTask, report: &mut CycleReport) {
        let Some(printer) = self.printer else {
            return;
        };

        match printer.render_and_print(&stored.record) {
            Ok(()) => {
                info!(
                    "event=task_print module=service status=ok record_id={}",
                    stored.id
                );
                report.printed_count += 1;
            }
            Err(err) => {
                warn!(
                    "event=task_print module=service status=error record_id={} error={}",
                    stored.id, err
                );
                report.print_failed_count += 1;
            }
        }
    }
}
