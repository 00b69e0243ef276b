//! predict-core
//!
//! Language-agnostic prediction pipeline for phonetic input methods: a
//! read-only dictionary store, syllable segmentation, candidate ranking and
//! per-session selection learning, orchestrated by a single façade.
//!
//! Public API:
//! - `DictionaryStore` - Spelling → candidate lookup (fst index + payloads)
//! - `Segmenter` - Enumerates syllable segmentations of unspaced input
//! - `CandidateRanker` - Scores and orders candidates for a set of segmentations
//! - `SelectionLearner` - Records accepted candidates as adaptive weights
//! - `SessionState` - Context word and adaptive weight table of one session
//! - `PredictionEngine` - Façade exposing predict / select to the host
//! - `LanguageFeatures` - Capability trait implemented by language crates
//! - `Config` - Tunables and feature flags
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

pub mod error;
pub use error::{ConfigError, LoadError};

pub mod dictionary;
pub use dictionary::{CandidateEntry, DictionarySource, DictionaryStore, DuplicatePolicy, SourceEntry};

pub mod segmenter;
pub use segmenter::{Segmentation, Segmentations, Segmenter, DEFAULT_MAX_INPUT_LEN};

pub mod candidate;
pub use candidate::RankedCandidate;

pub mod session;
pub use session::{AdaptiveWeights, SessionState};

pub mod ranker;
pub use ranker::CandidateRanker;

pub mod learner;
pub use learner::SelectionLearner;

pub mod features;
pub use features::{LanguageFeatures, PreparedInput};

pub mod engine;
pub use engine::{CacheStats, Prediction, PredictionEngine};

/// Generic configuration for the prediction pipeline.
///
/// Only language-agnostic fields live here. Language-specific options (pinyin
/// separators and the like) belong in the language crate's config, which
/// flattens this one.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Number of suggestions returned by `predict`
    pub candidate_limit: usize,

    /// Maximum segmentations enumerated per query before stopping early
    pub max_segmentations: usize,

    /// Longest preedit (in chars, after preparation) that is segmented
    /// exhaustively. Longer input only gets the greedy longest-match split.
    pub max_preedit_len: usize,

    /// Segmentation preference is `preference_decay^(syllables - 1)`.
    /// Must lie in (0, 1) so that fewer syllables always weigh more.
    pub preference_decay: f64,

    /// Maximum composed phrases built from per-syllable candidates for one
    /// segmentation that has no whole-spelling dictionary entry
    pub max_combinations: usize,

    // Learning
    /// Amount added to an adaptive weight on each selection
    pub selection_increment: f64,
    /// Upper bound for a single adaptive weight
    pub max_adaptive_weight: f64,

    // Cache Management
    /// Entries in the input -> segmentations cache (0 disables the cache)
    pub segmentation_cache_size: usize,

    /// Resolution of repeated dictionary entries at load time
    pub duplicate_policy: DuplicatePolicy,

    // Phrase Masking
    /// Phrases never offered as suggestions
    pub masked_phrases: HashSet<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            candidate_limit: 20,
            max_segmentations: 64,
            max_preedit_len: segmenter::DEFAULT_MAX_INPUT_LEN,
            preference_decay: 0.5,
            max_combinations: 64,
            selection_increment: 50.0,
            max_adaptive_weight: 1.0e6,
            segmentation_cache_size: 256,
            duplicate_policy: DuplicatePolicy::Reject,
            masked_phrases: HashSet::new(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = ConfigError::read(path.as_ref())?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration from TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize configuration to TOML string.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Return a copy with out-of-range values replaced by their defaults.
    ///
    /// Bad tunables never fail engine construction; they are logged and fixed.
    pub fn sanitized(&self) -> Self {
        let defaults = Config::default();
        let mut cfg = self.clone();
        if cfg.candidate_limit == 0 {
            warn!("candidate_limit must be positive, using {}", defaults.candidate_limit);
            cfg.candidate_limit = defaults.candidate_limit;
        }
        if cfg.max_segmentations == 0 {
            warn!("max_segmentations must be positive, using {}", defaults.max_segmentations);
            cfg.max_segmentations = defaults.max_segmentations;
        }
        if cfg.max_preedit_len == 0 {
            warn!("max_preedit_len must be positive, using {}", defaults.max_preedit_len);
            cfg.max_preedit_len = defaults.max_preedit_len;
        }
        if !(cfg.preference_decay > 0.0 && cfg.preference_decay < 1.0) {
            warn!(
                value = cfg.preference_decay,
                "preference_decay outside (0, 1), using {}", defaults.preference_decay
            );
            cfg.preference_decay = defaults.preference_decay;
        }
        if cfg.max_combinations == 0 {
            warn!("max_combinations must be positive, using {}", defaults.max_combinations);
            cfg.max_combinations = defaults.max_combinations;
        }
        if !(cfg.selection_increment.is_finite() && cfg.selection_increment > 0.0) {
            warn!(
                value = cfg.selection_increment,
                "selection_increment must be positive, using {}", defaults.selection_increment
            );
            cfg.selection_increment = defaults.selection_increment;
        }
        if !(cfg.max_adaptive_weight.is_finite() && cfg.max_adaptive_weight > 0.0) {
            warn!(
                value = cfg.max_adaptive_weight,
                "max_adaptive_weight must be positive, using {}", defaults.max_adaptive_weight
            );
            cfg.max_adaptive_weight = defaults.max_adaptive_weight;
        }
        cfg
    }

    // ========== Phrase Masking API ==========

    /// Add a phrase to the mask list (hide from suggestions).
    pub fn mask_phrase(&mut self, phrase: &str) {
        self.masked_phrases.insert(phrase.to_string());
    }

    /// Remove a phrase from the mask list (allow in suggestions).
    pub fn unmask_phrase(&mut self, phrase: &str) -> bool {
        self.masked_phrases.remove(phrase)
    }

    /// Check if a phrase is masked.
    pub fn is_masked(&self, phrase: &str) -> bool {
        self.masked_phrases.contains(phrase)
    }
}

/// Utility helpers.
pub mod utils {
    /// Normalize input strings (NFC) and trim whitespace.
    pub fn normalize(s: &str) -> String {
        use unicode_normalization::UnicodeNormalization;
        s.nfc().collect::<String>().trim().to_string()
    }
}
