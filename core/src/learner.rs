//! Selection learning.
//!
//! Accepting a candidate raises its adaptive weight for the current context by
//! a fixed increment and makes it the context for the next query. Competing
//! candidates keep their weights; there is no decay.
//!
//! The learner does not check that the chosen candidate was ever offered, so
//! hosts may report text the user typed or pasted on their own.

use tracing::debug;

use crate::dictionary::CandidateEntry;
use crate::session::SessionState;
use crate::Config;

/// Writes adaptive weights into a `SessionState`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionLearner {
    increment: f64,
    cap: f64,
}

impl SelectionLearner {
    pub fn new(increment: f64, cap: f64) -> Self {
        Self { increment, cap }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.selection_increment, config.max_adaptive_weight)
    }

    pub fn increment(&self) -> f64 {
        self.increment
    }

    /// Record that `chosen` was accepted. Returns its new weight in the context
    /// it was accepted in.
    pub fn record_selection(&self, session: &mut SessionState, chosen: &CandidateEntry) -> f64 {
        let context = session.last_accepted().map(str::to_owned);
        let weight = session
            .weights_mut()
            .bump(context.as_deref(), &chosen.text, self.increment, self.cap);
        debug!(?context, text = %chosen.text, weight, "selection recorded");
        session.set_context(Some(chosen.text.clone()));
        weight
    }
}

impl Default for SelectionLearner {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
