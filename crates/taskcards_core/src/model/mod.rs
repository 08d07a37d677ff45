//! Domain model for extracted and persisted tasks.
//!
//! # Responsibility
//! - Define the shapes exchanged between extractor, dedup policy and store.
//! - Own field-level validation so every layer enforces the same rules.
//!
//! # Invariants
//! - `priority` is always one of high/medium/low (1/2/3).
//! - A `TaskRecord` is never mutated after it has been stored.

pub mod task;
