//! Core of the reminder-to-task-card pipeline.
//! Deduplicates extracted tasks against stored ones by name similarity and
//! persists the rest in SQLite.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod printer;
pub mod repo;
pub mod search;
pub mod service;
pub mod source;

pub use config::{AppConfig, ConfigError, DEFAULT_DEDUP_THRESHOLD};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::task::{
    ExtractedTask, Priority, RecordId, SimilarityResult, StoredTask, TaskRecord,
    TaskValidationError,
};
pub use printer::{PrintError, PrinterService, TaskCard, TextCardPrinter};
pub use repo::task_store::{SqliteTaskStore, StoreError, StoreResult, TaskStore};
pub use search::similarity::{name_distance, normalize_name};
pub use service::cycle::{BatchStats, CycleOutcome, CycleReport, Orchestrator, TaskFailure};
pub use service::dedup::{DedupDecision, DedupPolicy};
pub use source::{ExtractError, Extractor, JsonFileExtractor, StaticExtractor};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
