//! Repository layer for persisted tasks.
//!
//! # Responsibility
//! - Define the task store contract used by the dedup cycle.
//! - Keep SQL details behind that contract.
//!
//! # Invariants
//! - Write paths validate records before any SQL mutation.
//! - Read paths reject invalid persisted rows instead of masking them.
//! - A closed store rejects every operation except `close`.

pub mod task_store;
