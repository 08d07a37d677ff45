//! Name-similarity lookup over stored tasks.
//!
//! # Responsibility
//! - Score how alike two task names are.
//! - Rank stored records against a candidate name.

pub mod similarity;
