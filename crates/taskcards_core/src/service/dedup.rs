//! Threshold-based duplicate policy.
//!
//! # Invariants
//! - `decide` is a pure function of its inputs.
//! - Only the first (nearest) result is consulted.

use crate::config::{validate_threshold, ConfigError, DEFAULT_DEDUP_THRESHOLD};
use crate::model::task::{ExtractedTask, RecordId, SimilarityResult};

/// Outcome for one extracted task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DedupDecision {
    New,
    Duplicate { of: RecordId, distance: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DedupPolicy {
    threshold: f64,
}

impl Default for DedupPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_DEDUP_THRESHOLD,
        }
    }
}

impl DedupPolicy {
    /// # Errors
    /// - [`ConfigError::InvalidThreshold`] for negative or non-finite values.
    pub fn new(threshold: f64) -> Result<Self, ConfigError> {
        validate_threshold(threshold)?;
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Number of neighbours this policy needs from the store.
    pub fn query_limit(&self) -> usize {
        1
    }

    /// Rejects `task` when its nearest stored name is closer than the threshold.
    pub fn decide(&self, _task: &ExtractedTask, nearest: &[SimilarityResult]) -> DedupDecision {
        match nearest.first() {
            Some(result) if result.similarity_distance < self.threshold => {
                DedupDecision::Duplicate {
                    of: result.record_id,
                    distance: result.similarity_distance,
                }
            }
            _ => DedupDecision::New,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DedupDecision, DedupPolicy};
    use crate::model::task::{ExtractedTask, Priority, SimilarityResult, TaskRecord};
    use chrono::Utc;
    use uuid::Uuid;

    fn result(distance: f64) -> SimilarityResult {
        let task = ExtractedTask::new("Buy milk", Priority::High);
        SimilarityResult {
            record_id: Uuid::new_v4(),
            record: TaskRecord::from_extracted(task, Utc::now()).unwrap(),
            similarity_distance: distance,
        }
    }

    fn candidate() -> ExtractedTask {
        ExtractedTask::new("buy  milk", Priority::High)
    }

    #[test]
    fn empty_neighbourhood_is_new() {
        assert_eq!(
            DedupPolicy::default().decide(&candidate(), &[]),
            DedupDecision::New
        );
    }

    #[test]
    fn distance_below_threshold_is_duplicate() {
        let nearest = result(0.05);
        let decision = DedupPolicy::default().decide(&candidate(), &[nearest.clone()]);
        assert_eq!(
            decision,
            DedupDecision::Duplicate {
                of: nearest.record_id,
                distance: 0.05
            }
        );
    }

    #[test]
    fn distance_at_threshold_is_new() {
        let policy = DedupPolicy::new(0.1).unwrap();
        assert_eq!(policy.decide(&candidate(), &[result(0.1)]), DedupDecision::New);
    }

    #[test]
    fn only_nearest_result_counts() {
        let policy = DedupPolicy::default();
        assert_eq!(
            policy.decide(&candidate(), &[result(0.4), result(0.0)]),
            DedupDecision::New
        );
    }

    #[test]
    fn zero_threshold_never_rejects() {
        let policy = DedupPolicy::new(0.0).unwrap();
        assert_eq!(policy.decide(&candidate(), &[result(0.0)]), DedupDecision::New);
    }

    #[test]
    fn invalid_thresholds_are_rejected() {
        assert!(DedupPolicy::new(-0.1).is_err());
        assert!(DedupPolicy::new(f64::NAN).is_err());
        assert!(DedupPolicy::new(f64::INFINITY).is_err());
    }
}
