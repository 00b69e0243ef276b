// core/src/ranker.rs
//
// Candidate ranking over a set of segmentations.
//
// For a segmentation of k syllables the preference weight is
// `preference_decay^(k-1)`, and every candidate it yields scores
//
//     frequency * weight + adaptive_weight(context, text)
//
// clamped into the candidate score range. The same text reached through
// several segmentations keeps its best score.

use ahash::AHashMap;
use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::candidate::RankedCandidate;
use crate::dictionary::{CandidateEntry, DictionaryStore};
use crate::segmenter::Segmentation;
use crate::session::SessionState;
use crate::Config;

/// Scores and orders candidates; reads the session, never writes it.
#[derive(Debug, Clone)]
pub struct CandidateRanker {
    store: Arc<DictionaryStore>,
    preference_decay: f64,
    max_combinations: usize,
    masked: HashSet<String>,
}

impl CandidateRanker {
    /// `preference_decay` must lie in (0, 1); see `Config::sanitized`.
    pub fn new(store: Arc<DictionaryStore>, preference_decay: f64, max_combinations: usize) -> Self {
        Self {
            store,
            preference_decay,
            max_combinations: max_combinations.max(1),
            masked: HashSet::new(),
        }
    }

    pub fn from_config(store: Arc<DictionaryStore>, config: &Config) -> Self {
        Self::new(store, config.preference_decay, config.max_combinations)
            .with_masked(config.masked_phrases.clone())
    }

    /// Never offer any of these texts.
    pub fn with_masked(mut self, masked: HashSet<String>) -> Self {
        self.masked = masked;
        self
    }

    /// Weight applied to base frequencies from a segmentation of `syllables`
    /// syllables. Strictly decreasing in `syllables`.
    pub fn preference_weight(&self, syllables: usize) -> f64 {
        let exp = i32::try_from(syllables.saturating_sub(1)).unwrap_or(i32::MAX);
        self.preference_decay.powi(exp)
    }

    /// Rank the candidates of all `segmentations` in the session's current
    /// context, keeping at most `limit`.
    pub fn rank<'a, I>(&self, segmentations: I, session: &SessionState, limit: usize) -> Vec<RankedCandidate>
    where
        I: IntoIterator<Item = &'a Segmentation>,
    {
        let row = session.weights().row(session.last_accepted());
        let mut best: AHashMap<String, RankedCandidate> = AHashMap::new();

        let mut offer = |entry: &CandidateEntry, weight: f64, syllables: usize| {
            if self.masked.contains(&entry.text) {
                return;
            }
            let adaptive = row
                .and_then(|r| r.get(&entry.text))
                .copied()
                .unwrap_or(0.0);
            let cand = RankedCandidate::new(entry.clone(), entry.frequency * weight + adaptive, syllables);
            match best.get_mut(&entry.text) {
                Some(existing) => {
                    if cand.supersedes(existing) {
                        *existing = cand;
                    }
                }
                None => {
                    best.insert(entry.text.clone(), cand);
                }
            }
        };

        let mut seen = 0usize;
        for seg in segmentations {
            if seg.is_empty() {
                continue;
            }
            seen += 1;
            let k = seg.len();
            let weight = self.preference_weight(k);

            if k == 1 {
                for entry in self.store.lookup(&seg.syllables()[0]) {
                    offer(entry, weight, k);
                }
                continue;
            }

            let whole = self.store.lookup(&seg.spelling());
            if whole.is_empty() {
                for entry in self.compose(seg) {
                    offer(&entry, weight, k);
                }
            } else {
                for entry in whole {
                    offer(entry, weight, k);
                }
            }

            // single syllables stay selectable on their own
            for syllable in seg.syllables() {
                for entry in self.store.lookup(syllable) {
                    offer(entry, weight, k);
                }
            }
        }

        let mut out: Vec<RankedCandidate> = best.into_values().collect();
        out.sort_by(|a, b| a.rank_cmp(b));
        let total = out.len();
        out.truncate(limit);
        debug!(segmentations = seen, total, kept = out.len(), "ranked candidates");
        out
    }

    /// Phrases composed from per-syllable candidates, for segmentations the
    /// dictionary has no whole-spelling entry for.
    ///
    /// Each syllable contributes only its top `p` entries, with `p^k` kept
    /// within `max_combinations`. A composed phrase is as frequent as its
    /// rarest part.
    fn compose(&self, seg: &Segmentation) -> Vec<CandidateEntry> {
        let k = seg.len();
        let per = per_syllable_budget(self.max_combinations, k);
        let lists: Vec<&[CandidateEntry]> = seg
            .syllables()
            .iter()
            .map(|s| {
                let all = self.store.lookup(s);
                &all[..all.len().min(per)]
            })
            .collect();
        if lists.iter().any(|l| l.is_empty()) {
            return Vec::new();
        }

        let spelling = seg.spelling();
        let mut out = Vec::new();
        let mut idx = vec![0usize; k];
        loop {
            let text: String = idx
                .iter()
                .zip(&lists)
                .map(|(&i, list)| list[i].text.as_str())
                .collect();
            let frequency = idx
                .iter()
                .zip(&lists)
                .map(|(&i, list)| list[i].frequency)
                .fold(f64::INFINITY, f64::min);
            out.push(CandidateEntry::new(text, spelling.clone(), frequency));

            // odometer step, last syllable fastest
            let mut pos = k;
            loop {
                if pos == 0 {
                    return out;
                }
                pos -= 1;
                idx[pos] += 1;
                if idx[pos] < lists[pos].len() {
                    break;
                }
                idx[pos] = 0;
            }
        }
    }
}

/// Largest `p >= 1` with `p^k <= max`.
fn per_syllable_budget(max: usize, k: usize) -> usize {
    let exp = u32::try_from(k).unwrap_or(u32::MAX);
    let mut p = 1usize;
    while (p + 1).checked_pow(exp).is_some_and(|v| v <= max) {
        p += 1;
    }
    p
}
