//! pinyin-predict crate root
//!
//! This crate provides the pinyin-specific language features, configuration
//! and a high-level `Engine` that composes them with the shared `predict-core`
//! pipeline.
//!
//! Public API exported here:
//! - `ChineseLanguageFeatures` from `features`
//! - `PinyinConfig` from `config`
//! - `Engine` and `DEMO_TABLE` from `engine`

pub mod config;
pub mod engine;
pub mod features;

// Convenience re-exports for common types used by callers.
pub use config::PinyinConfig;
pub use engine::{Engine, DEMO_TABLE};
pub use features::ChineseLanguageFeatures;

pub use predict_core::{
    CacheStats, CandidateEntry, Config, ConfigError, DictionarySource, DictionaryStore, LanguageFeatures,
    LoadError, Prediction, PredictionEngine, RankedCandidate,
};
