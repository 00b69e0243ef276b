//! Per-session learning state.
//!
//! A `SessionState` holds the context word (the last accepted candidate) and
//! the adaptive weight table of one input session. It is owned by exactly one
//! `PredictionEngine`; nothing here is global, so several engines can run side
//! by side over one shared dictionary.

use ahash::AHashMap;

/// Learned score adjustments keyed by (preceding word, candidate text).
///
/// The context `None` stands for "no preceding word". Readers can query any
/// pair; only the selection learner writes.
#[derive(Debug, Clone, Default)]
pub struct AdaptiveWeights {
    table: AHashMap<Option<String>, AHashMap<String, f64>>,
}

impl AdaptiveWeights {
    pub fn new() -> Self {
        Self::default()
    }

    /// Weight for `candidate` after `context`; 0 when nothing was learned.
    pub fn get(&self, context: Option<&str>, candidate: &str) -> f64 {
        self.row(context)
            .and_then(|row| row.get(candidate))
            .copied()
            .unwrap_or(0.0)
    }

    /// All weights learned after `context`.
    pub(crate) fn row(&self, context: Option<&str>) -> Option<&AHashMap<String, f64>> {
        self.table.get(&context.map(str::to_owned))
    }

    /// Add `delta` to one pair, saturating at `cap`. Returns the new weight.
    pub(crate) fn bump(&mut self, context: Option<&str>, candidate: &str, delta: f64, cap: f64) -> f64 {
        let weight = self
            .table
            .entry(context.map(str::to_owned))
            .or_default()
            .entry(candidate.to_string())
            .or_insert(0.0);
        *weight = (*weight + delta).min(cap);
        *weight
    }

    /// Number of (context, candidate) pairs with a learned weight.
    pub fn len(&self) -> usize {
        self.table.values().map(|row| row.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&mut self) {
        self.table.clear();
    }
}

/// Context and adaptive weights of one input session.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    last_accepted: Option<String>,
    weights: AdaptiveWeights,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The context key for the next query.
    pub fn last_accepted(&self) -> Option<&str> {
        self.last_accepted.as_deref()
    }

    pub fn weights(&self) -> &AdaptiveWeights {
        &self.weights
    }

    /// Weight for `candidate` in the current context.
    pub fn adaptive_weight(&self, candidate: &str) -> f64 {
        self.weights.get(self.last_accepted(), candidate)
    }

    /// Replace the context word without touching learned weights.
    pub fn set_context(&mut self, word: Option<String>) {
        self.last_accepted = word;
    }

    /// Forget the context word (start of a new sentence).
    pub fn reset_context(&mut self) {
        self.last_accepted = None;
    }

    /// Forget the context word and every learned weight.
    pub fn reset(&mut self) {
        self.last_accepted = None;
        self.weights.clear();
    }

    pub(crate) fn weights_mut(&mut self) -> &mut AdaptiveWeights {
        &mut self.weights
    }
}
