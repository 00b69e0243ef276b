//! Pinyin prediction engine
//!
//! A thin wrapper around `predict_core::PredictionEngine` fixed to
//! `ChineseLanguageFeatures`, with pinyin-specific loading helpers and the
//! bundled demo table.

use std::path::Path;
use std::sync::Arc;

use predict_core::{
    CacheStats, DictionarySource, DictionaryStore, LoadError, Prediction, PredictionEngine,
    RankedCandidate, SessionState,
};
use tracing::info;

use crate::config::PinyinConfig;
use crate::features::ChineseLanguageFeatures;

/// Small pinyin table shipped with the crate for demos and tests.
pub const DEMO_TABLE: &str = include_str!("../data/demo.table");

/// Public engine for pinyin prediction.
///
/// One `Engine` is one input session. Sessions can share a dictionary by
/// building each engine with `Engine::new` over the same `Arc`.
pub struct Engine {
    inner: PredictionEngine<ChineseLanguageFeatures>,
}

impl Engine {
    pub fn new(store: Arc<DictionaryStore>, config: PinyinConfig) -> Self {
        let features = ChineseLanguageFeatures::from_config(&config);
        Self {
            inner: PredictionEngine::new(store, features, config.into_base()),
        }
    }

    pub fn from_source(source: DictionarySource, config: PinyinConfig) -> Result<Self, LoadError> {
        let store = DictionaryStore::load_with_policy(source, config.base.duplicate_policy)?;
        Ok(Self::new(Arc::new(store), config))
    }

    /// Load a line table or, for `.json` files, a JSON dictionary.
    pub fn from_path<P: AsRef<Path>>(path: P, config: PinyinConfig) -> Result<Self, LoadError> {
        info!(path = %path.as_ref().display(), "loading pinyin dictionary");
        Self::from_source(DictionarySource::from_path(path), config)
    }

    /// Engine over the bundled demo table.
    pub fn demo(config: PinyinConfig) -> Result<Self, LoadError> {
        Self::from_source(DictionarySource::Text(DEMO_TABLE.to_string()), config)
    }

    /// Suggestions for `preedit` with no surrounding text.
    pub fn input(&mut self, preedit: &str) -> Prediction {
        self.inner.predict("", preedit)
    }

    pub fn predict(&mut self, surrounding_left: &str, preedit: &str) -> Prediction {
        self.inner.predict(surrounding_left, preedit)
    }

    /// Learn that the user accepted `word`; returns whether it was offered.
    pub fn commit(&mut self, word: &str) -> bool {
        self.inner.word_candidate_selected(word)
    }

    pub fn candidates(&self) -> &[RankedCandidate] {
        self.inner.last_candidates()
    }

    pub fn session(&self) -> &SessionState {
        self.inner.session()
    }

    pub fn reset(&mut self) {
        self.inner.reset_session();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.inner.cache_stats()
    }

    pub fn clear_cache(&mut self) {
        self.inner.clear_cache();
    }

    pub fn inner(&self) -> &PredictionEngine<ChineseLanguageFeatures> {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut PredictionEngine<ChineseLanguageFeatures> {
        &mut self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_table_loads() {
        let engine = Engine::demo(PinyinConfig::default()).unwrap();
        let store = engine.inner().dictionary();
        assert!(store.is_valid_syllable("nihao"));
        assert!(store.is_valid_syllable("zhongguoren"));
        assert!(store.contains_text("朋友们"));
    }

    #[test]
    fn input_uses_no_context() {
        let mut engine = Engine::demo(PinyinConfig::default()).unwrap();
        let p = engine.input("nihao");
        assert_eq!(p.suggestions[0], "你好");
        assert_eq!(engine.session().last_accepted(), None);
    }
}
