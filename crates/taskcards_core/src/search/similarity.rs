//! Normalized edit-distance similarity index.
//!
//! # Responsibility
//! - Normalize task names (case, surrounding and repeated whitespace).
//! - Compute a symmetric distance in `[0, 1]` between two names, with
//!   punctuation-only edits weighted below letter edits.
//! - Return the nearest `k` stored records for a candidate name.
//!
//! # Invariants
//! - `name_distance(a, b) == name_distance(b, a)`.
//! - `name_distance(a, b) == 0.0` exactly when both names normalize to the
//!   same text.
//! - Ranking is ascending distance, then newer `created_at`, then insertion
//!   order. The scan never mutates its input.

use crate::model::task::{SimilarityResult, StoredTask};
use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Lowercases and collapses whitespace runs to one space.
pub fn normalize_name(name: &str) -> String {
    WHITESPACE_RE
        .replace_all(name.trim(), " ")
        .to_lowercase()
}

/// Edit cost of inserting, deleting or swapping a punctuation character.
pub const PUNCTUATION_EDIT_COST: f64 = 0.5;

/// Weighted edit distance of the normalized names divided by the longer length.
///
/// Edits touching only punctuation cost [`PUNCTUATION_EDIT_COST`]; every
/// other edit costs 1.
pub fn name_distance(left: &str, right: &str) -> f64 {
    let left = normalized_chars(left);
    normalized_distance(&left, &normalized_chars(right))
}

/// Ranks `records` against `name` and keeps the closest `k`.
///
/// `records` must be given in insertion order; that order is the final
/// tiebreak.
pub fn nearest(name: &str, records: &[StoredTask], k: usize) -> Vec<SimilarityResult> {
    if k == 0 || records.is_empty() {
        return Vec::new();
    }

    let query = normalized_chars(name);
    let mut scored = records
        .iter()
        .enumerate()
        .map(|(position, stored)| {
            let candidate = normalized_chars(&stored.record.name);
            (
                position,
                SimilarityResult {
                    record_id: stored.id,
                    record: stored.record.clone(),
                    similarity_distance: normalized_distance(&query, &candidate),
                },
            )
        })
        .collect::<Vec<_>>();

    scored.sort_by(|(left_pos, left), (right_pos, right)| {
        left.similarity_distance
            .total_cmp(&right.similarity_distance)
            .then_with(|| right.record.created_at.cmp(&left.record.created_at))
            .then_with(|| left_pos.cmp(right_pos))
    });

    scored
        .into_iter()
        .take(k)
        .map(|(_, result)| result)
        .collect()
}

fn normalized_chars(name: &str) -> Vec<char> {
    normalize_name(name).chars().collect()
}

fn normalized_distance(left: &[char], right: &[char]) -> f64 {
    let longest = left.len().max(right.len());
    if longest == 0 {
        return 0.0;
    }

    weighted_levenshtein(left, right) / longest as f64
}

fn is_punctuation(c: char) -> bool {
    !c.is_alphanumeric() && !c.is_whitespace()
}

fn indel_cost(c: char) -> f64 {
    if is_punctuation(c) {
        PUNCTUATION_EDIT_COST
    } else {
        1.0
    }
}

fn substitution_cost(left: char, right: char) -> f64 {
    if left == right {
        0.0
    } else if is_punctuation(left) && is_punctuation(right) {
        PUNCTUATION_EDIT_COST
    } else {
        1.0
    }
}

fn weighted_levenshtein(left: &[char], right: &[char]) -> f64 {
    let mut previous = Vec::with_capacity(right.len() + 1);
    previous.push(0.0);
    for c in right {
        let last = previous[previous.len() - 1];
        previous.push(last + indel_cost(*c));
    }
    let mut current = vec![0.0; right.len() + 1];

    for left_char in left {
        current[0] = previous[0] + indel_cost(*left_char);
        for (j, right_char) in right.iter().enumerate() {
            let substitution = previous[j] + substitution_cost(*left_char, *right_char);
            let deletion = previous[j + 1] + indel_cost(*left_char);
            let insertion = current[j] + indel_cost(*right_char);
            current[j + 1] = substitution.min(deletion).min(insertion);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[right.len()]
}

#[cfg(test)]
mod tests {
    use super::{name_distance, nearest, normalize_name, PUNCTUATION_EDIT_COST};
    use crate::model::task::{ExtractedTask, Priority, StoredTask, TaskRecord};
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn stored(name: &str, second: u32) -> StoredTask {
        let created_at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, second).unwrap();
        let task = ExtractedTask::new(name, Priority::Medium);
        StoredTask {
            id: Uuid::new_v4(),
            record: TaskRecord::from_extracted(task, created_at).unwrap(),
        }
    }

    #[test]
    fn normalize_name_collapses_case_and_whitespace() {
        assert_eq!(normalize_name("  Buy \t  MILK\n"), "buy milk");
    }

    #[test]
    fn distance_is_zero_for_normalized_equal_names() {
        assert_eq!(name_distance("Buy milk", "buy  milk"), 0.0);
        assert_eq!(name_distance("", "   "), 0.0);
    }

    #[test]
    fn distance_is_symmetric_and_bounded() {
        let pairs = [
            ("Buy milk", "Buy milk!"),
            ("Call dentist", "Buy milk"),
            ("a", ""),
            ("kitten", "sitting"),
        ];
        for (left, right) in pairs {
            let forward = name_distance(left, right);
            let backward = name_distance(right, left);
            assert_eq!(forward, backward, "{left} vs {right}");
            assert!((0.0..=1.0).contains(&forward));
            assert!(forward > 0.0);
        }
    }

    #[test]
    fn distance_uses_longer_name_as_denominator() {
        let distance = name_distance("kitten", "sitting");
        assert!((distance - 3.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn punctuation_variant_stays_under_default_threshold() {
        assert!(name_distance("Renew passport application", "Renew passport application.") < 0.1);

        let short = name_distance("Buy milk", "Buy milk.");
        assert!(short > 0.0);
        assert!(short < 0.1);
        assert!((short - PUNCTUATION_EDIT_COST / 9.0).abs() < 1e-12);
    }

    #[test]
    fn punctuation_swap_costs_less_than_letter_swap() {
        let punctuation = name_distance("Buy milk!", "Buy milk?");
        let letter = name_distance("Buy milk", "Buy silk");
        assert!(punctuation > 0.0);
        assert!(punctuation < letter);
        assert!((letter - 1.0 / 8.0).abs() < 1e-12);
    }

    #[test]
    fn nearest_scores_match_pairwise_distance() {
        let records = vec![
            stored("Buy milk.", 1),
            stored("  CALL   dentist ", 2),
            stored("Water plants", 3),
        ];

        for result in nearest("  buy MILK ", &records, records.len()) {
            assert_eq!(
                result.similarity_distance,
                name_distance("  buy MILK ", &result.record.name)
            );
        }
    }

    #[test]
    fn nearest_orders_by_distance_then_recency_then_insertion() {
        let records = vec![
            stored("Water plants", 1),
            stored("buy milk", 2),
            stored("Buy milk", 3),
            stored("Buy silk", 3),
            stored("Buy silk", 3),
        ];

        let results = nearest("Buy milk", &records, 10);
        let ids = results.iter().map(|r| r.record_id).collect::<Vec<_>>();

        assert_eq!(ids[0], records[2].id);
        assert_eq!(ids[1], records[1].id);
        assert_eq!(ids[2], records[3].id);
        assert_eq!(ids[3], records[4].id);
        assert_eq!(ids[4], records[0].id);
        assert!(results
            .windows(2)
            .all(|pair| pair[0].similarity_distance <= pair[1].similarity_distance));
    }

    #[test]
    fn nearest_respects_k_and_empty_input() {
        let records = vec![stored("one", 1), stored("two", 2)];
        assert_eq!(nearest("one", &records, 1).len(), 1);
        assert!(nearest("one", &records, 0).is_empty());
        assert!(nearest("one", &[], 3).is_empty());
    }
}
