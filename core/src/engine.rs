// core/src/engine.rs
//
// Prediction façade: the one type a host talks to.
//
// Pipeline per query:
// 1. Observe the text left of the cursor (context reset / seeding)
// 2. Prepare the preedit through the language features
// 3. Segment it, via the LRU cache when enabled, with a greedy fallback
// 4. Rank against the session and remember the list for selection lookup
// 5. Publish the prediction to subscribers

use std::num::NonZeroUsize;
use std::sync::{mpsc, Arc};

use lru::LruCache;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::candidate::RankedCandidate;
use crate::dictionary::{CandidateEntry, DictionarySource, DictionaryStore};
use crate::error::LoadError;
use crate::features::{LanguageFeatures, PreparedInput};
use crate::learner::SelectionLearner;
use crate::ranker::CandidateRanker;
use crate::segmenter::{Segmentation, Segmenter};
use crate::session::SessionState;
use crate::utils::normalize;
use crate::Config;

/// "New prediction suggestions" notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    /// The preedit the suggestions were computed for.
    pub word: String,
    /// Candidate texts, best first.
    pub suggestions: Vec<String>,
}

/// Segmentation cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub entries: usize,
    /// 0 when the cache is disabled.
    pub capacity: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Prediction engine for one input session.
///
/// The dictionary is shared; the session state (context word and adaptive
/// weights) belongs to this instance alone.
pub struct PredictionEngine<F> {
    store: Arc<DictionaryStore>,
    segmenter: Segmenter,
    ranker: CandidateRanker,
    learner: SelectionLearner,
    features: F,
    config: Config,
    session: SessionState,
    last_ranked: Vec<RankedCandidate>,
    cache: Option<LruCache<String, Vec<Segmentation>>>,
    cache_hits: usize,
    cache_misses: usize,
    subscribers: Vec<mpsc::Sender<Prediction>>,
}

impl<F: LanguageFeatures> PredictionEngine<F> {
    /// Create an engine over a loaded store. Out-of-range config values are
    /// replaced by defaults.
    pub fn new(store: Arc<DictionaryStore>, features: F, config: Config) -> Self {
        let config = config.sanitized();
        let cache = NonZeroUsize::new(config.segmentation_cache_size).map(LruCache::new);

        Self {
            segmenter: Segmenter::new(Arc::clone(&store), config.max_segmentations)
                .with_max_input_len(config.max_preedit_len),
            ranker: CandidateRanker::from_config(Arc::clone(&store), &config),
            learner: SelectionLearner::from_config(&config),
            store,
            features,
            config,
            session: SessionState::new(),
            last_ranked: Vec::new(),
            cache,
            cache_hits: 0,
            cache_misses: 0,
            subscribers: Vec::new(),
        }
    }

    /// Load a dictionary with the config's duplicate policy and build an engine
    /// over it.
    pub fn from_source(source: DictionarySource, features: F, config: Config) -> Result<Self, LoadError> {
        let store = DictionaryStore::load_with_policy(source, config.duplicate_policy)?;
        Ok(Self::new(Arc::new(store), features, config))
    }

    /// Suggestions for `preedit`, at most `candidate_limit` of them.
    pub fn predict(&mut self, surrounding_left: &str, preedit: &str) -> Prediction {
        let limit = self.config.candidate_limit;
        self.predict_with_limit(surrounding_left, preedit, limit)
    }

    pub fn predict_with_limit(&mut self, surrounding_left: &str, preedit: &str, limit: usize) -> Prediction {
        self.observe_context(surrounding_left);

        let prepared = self.features.prepare_preedit(preedit);
        let segs = self.segmentations(&prepared);
        self.last_ranked = if segs.is_empty() {
            Vec::new()
        } else {
            self.ranker.rank(&segs, &self.session, limit)
        };

        let prediction = Prediction {
            word: preedit.to_string(),
            suggestions: self
                .last_ranked
                .iter()
                .map(|c| c.text().to_string())
                .collect(),
        };
        debug!(
            preedit,
            context = ?self.session.last_accepted(),
            suggestions = prediction.suggestions.len(),
            "prediction"
        );
        self.notify(&prediction);
        prediction
    }

    /// Report that the user accepted `word`. Returns whether it was among the
    /// last suggestions; other words are learned all the same.
    pub fn word_candidate_selected(&mut self, word: &str) -> bool {
        let word = normalize(word);
        if word.is_empty() {
            debug!("ignoring empty selection");
            return false;
        }

        let offered = self
            .last_ranked
            .iter()
            .find(|c| c.text() == word)
            .map(|c| c.entry.clone());
        let was_offered = offered.is_some();
        let entry = offered.unwrap_or_else(|| CandidateEntry::unoffered(word));
        self.learner.record_selection(&mut self.session, &entry);
        was_offered
    }

    pub fn language_features(&self) -> &F {
        &self.features
    }

    /// Receive every future `Prediction`. Dropped receivers are forgotten on
    /// the next publish.
    pub fn subscribe(&mut self) -> mpsc::Receiver<Prediction> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Candidates of the most recent prediction.
    pub fn last_candidates(&self) -> &[RankedCandidate] {
        &self.last_ranked
    }

    pub fn dictionary(&self) -> &Arc<DictionaryStore> {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Forget the context word, learned weights and the last suggestions.
    pub fn reset_session(&mut self) {
        self.session.reset();
        self.last_ranked.clear();
    }

    /// Hide `phrase` from future suggestions.
    pub fn mask_phrase(&mut self, phrase: &str) {
        self.config.mask_phrase(phrase);
        self.ranker = CandidateRanker::from_config(Arc::clone(&self.store), &self.config);
    }

    pub fn unmask_phrase(&mut self, phrase: &str) -> bool {
        let removed = self.config.unmask_phrase(phrase);
        if removed {
            self.ranker = CandidateRanker::from_config(Arc::clone(&self.store), &self.config);
        }
        removed
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            hits: self.cache_hits,
            misses: self.cache_misses,
            entries: self.cache.as_ref().map_or(0, |c| c.len()),
            capacity: self.cache.as_ref().map_or(0, |c| c.cap().get()),
        }
    }

    /// Empty the segmentation cache and zero its counters.
    pub fn clear_cache(&mut self) {
        if let Some(cache) = self.cache.as_mut() {
            cache.clear();
        }
        self.cache_hits = 0;
        self.cache_misses = 0;
    }

    fn observe_context(&mut self, surrounding_left: &str) {
        let text = normalize(surrounding_left);
        if text.is_empty() {
            return;
        }
        if self.features.ends_sentence(&text) {
            self.session.reset_context();
            return;
        }
        if self.session.last_accepted().is_none() {
            if let Some(word) = self.known_suffix(&text) {
                debug!(context = %word, "context seeded from surrounding text");
                self.session.set_context(Some(word));
            }
        }
    }

    /// Longest suffix of `text` that some dictionary entry offers.
    fn known_suffix(&self, text: &str) -> Option<String> {
        let chars: Vec<char> = text.chars().collect();
        let longest = self.store.max_text_len().min(chars.len());
        (1..=longest)
            .rev()
            .map(|len| chars[chars.len() - len..].iter().collect::<String>())
            .find(|suffix| self.store.contains_text(suffix))
    }

    fn segmentations(&mut self, prepared: &PreparedInput) -> Vec<Segmentation> {
        if prepared.is_empty() {
            return Vec::new();
        }

        let key = prepared.cache_key();
        if let Some(cache) = self.cache.as_mut() {
            if let Some(hit) = cache.get(&key) {
                self.cache_hits += 1;
                return hit.clone();
            }
            self.cache_misses += 1;
        }

        let mut segs: Vec<Segmentation> = self
            .segmenter
            .segment_with_boundaries(&prepared.text, &prepared.boundaries)
            .collect();
        if segs.is_empty() {
            segs.extend(
                self.segmenter
                    .greedy_fallback_with_boundaries(&prepared.text, &prepared.boundaries),
            );
        }

        if let Some(cache) = self.cache.as_mut() {
            cache.put(key, segs.clone());
        }
        segs
    }

    fn notify(&mut self, prediction: &Prediction) {
        self.subscribers
            .retain(|tx| tx.send(prediction.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain;

    impl LanguageFeatures for Plain {
        fn always_show_suggestions(&self) -> bool {
            true
        }
        fn auto_caps_available(&self) -> bool {
            false
        }
        fn activate_auto_caps(&self, _preedit: &str) -> bool {
            false
        }
        fn appendix_for_replaced_preedit(&self, _preedit: &str) -> String {
            String::new()
        }
        fn is_separator(&self, text: &str) -> bool {
            text == "."
        }
        fn is_sentence_terminator(&self, c: char) -> bool {
            c == '.'
        }
    }

    const TABLE: &str = "ni 你 100\nhao 好 90\nnihao 你好 200\nmen 们 30\nwo 我 80\n";

    fn engine(config: Config) -> PredictionEngine<Plain> {
        PredictionEngine::from_source(DictionarySource::Text(TABLE.into()), Plain, config).unwrap()
    }

    #[test]
    fn predict_ranks_whole_word_first() {
        let mut e = engine(Config::default());
        let p = e.predict("", "nihao");
        assert_eq!(p.word, "nihao");
        assert_eq!(p.suggestions, vec!["你好", "你", "好"]);
        assert_eq!(e.last_candidates().len(), 3);
    }

    #[test]
    fn fallback_and_empty() {
        let mut e = engine(Config::default());
        assert!(e.predict("", "xyz").suggestions.is_empty());
        assert_eq!(e.predict("", "nix").suggestions, vec!["你"]);
        assert!(e.predict("", "").suggestions.is_empty());
    }

    #[test]
    fn long_preedit_degrades_to_greedy() {
        let mut e = engine(Config {
            max_preedit_len: 8,
            ..Config::default()
        });
        let p = e.predict("", "nihaowo");
        assert_eq!(p.suggestions, vec!["你好", "你好我", "我", "你", "好"]);

        // past the limit only the longest-match split is ranked
        let p = e.predict("", "nihaowomen");
        assert_eq!(p.suggestions, vec!["你好", "我", "们", "你好我们"]);
        assert!(e.last_candidates().iter().all(|c| c.syllables == 3));

        let long = "nihao".repeat(4000);
        let p = e.predict("", &long);
        assert_eq!(p.suggestions[0], "你好");
        assert_eq!(e.last_candidates()[0].syllables, 4000);
    }

    #[test]
    fn selection_reports_whether_offered() {
        let mut e = engine(Config::default());
        e.predict("", "nihao");
        assert!(e.word_candidate_selected("你好"));
        assert_eq!(e.session().last_accepted(), Some("你好"));
        assert!(!e.word_candidate_selected("谢谢"));
        assert_eq!(e.session().weights().get(Some("你好"), "谢谢"), 50.0);
        assert!(!e.word_candidate_selected("  "));
    }

    #[test]
    fn context_from_surrounding_text() {
        let mut e = engine(Config::default());
        e.predict("今天我", "men");
        assert_eq!(e.session().last_accepted(), Some("我"));
        e.predict("今天我.", "men");
        assert_eq!(e.session().last_accepted(), None);
    }

    #[test]
    fn cache_counts_hits() {
        let mut e = engine(Config::default());
        e.predict("", "nihao");
        e.predict("", "nihao");
        let stats = e.cache_stats();
        assert_eq!((stats.hits, stats.misses, stats.entries), (1, 1, 1));
        e.clear_cache();
        assert_eq!(e.cache_stats().entries, 0);

        let mut off = engine(Config {
            segmentation_cache_size: 0,
            ..Config::default()
        });
        off.predict("", "nihao");
        assert_eq!(off.cache_stats(), CacheStats::default());
    }

    #[test]
    fn subscribers_receive_predictions() {
        let mut e = engine(Config::default());
        let rx = e.subscribe();
        let dropped = e.subscribe();
        drop(dropped);
        let p = e.predict("", "wo");
        assert_eq!(rx.try_recv().unwrap(), p);
        assert_eq!(e.subscribers.len(), 1);
    }

    #[test]
    fn masking_at_runtime() {
        let mut e = engine(Config::default());
        e.mask_phrase("你好");
        assert_eq!(e.predict("", "nihao").suggestions, vec!["你", "好"]);
        assert!(e.unmask_phrase("你好"));
        assert_eq!(e.predict("", "nihao").suggestions[0], "你好");
    }

    #[test]
    fn reset_session_forgets_everything() {
        let mut e = engine(Config::default());
        e.predict("", "nihao");
        e.word_candidate_selected("你好");
        e.reset_session();
        assert!(e.session().weights().is_empty());
        assert!(e.last_candidates().is_empty());
    }
}
