//! Ranked candidate type and its ordering.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::dictionary::CandidateEntry;

/// Lowest score a candidate can carry.
pub const SCORE_FLOOR: f64 = 0.0;
/// Highest score a candidate can carry.
pub const SCORE_CEILING: f64 = f64::MAX;

/// Clamp a raw score into `[SCORE_FLOOR, SCORE_CEILING]`; NaN maps to the floor.
pub fn clamp_score(raw: f64) -> f64 {
    if raw.is_nan() {
        SCORE_FLOOR
    } else {
        raw.clamp(SCORE_FLOOR, SCORE_CEILING)
    }
}

/// A dictionary (or composed) entry scored for the current query.
///
/// Scores are on a relative scale; higher is better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub entry: CandidateEntry,
    pub score: f64,
    /// Syllable count of the segmentation that produced the best score.
    pub syllables: usize,
}

impl RankedCandidate {
    pub fn new(entry: CandidateEntry, score: f64, syllables: usize) -> Self {
        Self {
            entry,
            score: clamp_score(score),
            syllables,
        }
    }

    pub fn text(&self) -> &str {
        &self.entry.text
    }

    /// Final list order: descending score, then descending base frequency,
    /// then ascending text. `Less` means `self` is listed first.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| other.entry.frequency.total_cmp(&self.entry.frequency))
            .then_with(|| self.entry.text.cmp(&other.entry.text))
    }

    /// Whether `self` should replace `other` when both offer the same text.
    pub(crate) fn supersedes(&self, other: &Self) -> bool {
        self.score
            .total_cmp(&other.score)
            .then_with(|| self.entry.frequency.total_cmp(&other.entry.frequency))
            .then_with(|| other.entry.spelling.cmp(&self.entry.spelling))
            == Ordering::Greater
    }
}
