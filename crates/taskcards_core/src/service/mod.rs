//! Dedup decision and cycle orchestration.
//!
//! # Responsibility
//! - Turn nearest-neighbour results into keep/discard decisions.
//! - Sequence one extraction cycle: fetch, dedup, store, forward.
//!
//! # Invariants
//! - Tasks in a batch are handled strictly in order.
//! - One task's failure never aborts the rest of the batch.

pub mod cycle;
pub mod dedup;
