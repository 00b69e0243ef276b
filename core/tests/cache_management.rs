// core/tests/cache_management.rs
//
// Integration tests for the façade's segmentation cache.
//
// Tests cover:
// - LRU eviction with real prediction traffic
// - Cache size limits respect Config.segmentation_cache_size
// - Hit/miss tracking statistics
// - Learning does not invalidate cached segmentations
// - A disabled cache changes nothing observable
// - Fallback segmentations are cached with their forced boundaries

use predict_core::{Config, DictionarySource, LanguageFeatures, PredictionEngine, PreparedInput};

struct ApostropheFeatures;

impl LanguageFeatures for ApostropheFeatures {
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
        text == "'"
    }
    fn is_sentence_terminator(&self, c: char) -> bool {
        c == '.'
    }
    fn prepare_preedit(&self, preedit: &str) -> PreparedInput {
        let mut text = String::new();
        let mut boundaries = Vec::new();
        for c in preedit.chars() {
            if c == '\'' {
                boundaries.push(text.chars().count());
            } else {
                text.push(c);
            }
        }
        PreparedInput::with_boundaries(text, boundaries)
    }
}

const TABLE: &str = "ni 你 100\nhao 好 90\nnihao 你好 200\nxi 西 40\nan 安 50\nxian 先 70\n";

fn setup_test_engine(cache_size: usize) -> PredictionEngine<ApostropheFeatures> {
    let cfg = Config {
        segmentation_cache_size: cache_size,
        ..Config::default()
    };
    PredictionEngine::from_source(DictionarySource::Text(TABLE.to_string()), ApostropheFeatures, cfg)
        .unwrap()
}

#[test]
fn test_cache_hit_miss_tracking() {
    let mut engine = setup_test_engine(8);

    engine.predict("", "nihao");
    engine.predict("", "nihao");
    engine.predict("", "xian");

    let stats = engine.cache_stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 2);
    assert_eq!(stats.entries, 2);
    assert_eq!(stats.capacity, 8);
    assert!((stats.hit_rate() - 1.0 / 3.0).abs() < 1e-12);
}

#[test]
fn test_lru_eviction() {
    let mut engine = setup_test_engine(2);

    engine.predict("", "ni");
    engine.predict("", "hao");
    // touch "ni" so "hao" is the least recently used
    engine.predict("", "ni");
    engine.predict("", "xian");
    assert_eq!(engine.cache_stats().entries, 2);

    engine.predict("", "ni");
    let before = engine.cache_stats();
    engine.predict("", "hao");
    let after = engine.cache_stats();
    assert_eq!(after.misses, before.misses + 1, "evicted entry must miss");
}

#[test]
fn test_boundaries_are_part_of_the_key() {
    let mut engine = setup_test_engine(8);

    let score_of_xian = |engine: &PredictionEngine<ApostropheFeatures>| {
        engine.last_candidates().iter().find(|c| c.text() == "先").map(|c| c.score)
    };

    engine.predict("", "xian");
    let plain = score_of_xian(&engine);
    engine.predict("", "xi'an");
    let split = score_of_xian(&engine);

    assert_eq!(engine.cache_stats().misses, 2);
    // only the two-syllable reading survives the apostrophe
    assert_eq!(plain, Some(70.0));
    assert_eq!(split, Some(35.0));
}

#[test]
fn test_fallback_respects_boundaries() {
    let mut engine = setup_test_engine(8);

    // no complete split of xia'n exists; the fallback must not reach xian
    assert_eq!(engine.predict("", "xia'n").suggestions, vec!["西"]);
    assert_eq!(engine.predict("", "xia'n").suggestions, vec!["西"]);
    assert_eq!(engine.cache_stats().hits, 1);
    assert_eq!(engine.predict("", "xian").suggestions[0], "先");
}

#[test]
fn test_selection_keeps_cache_valid() {
    let mut engine = setup_test_engine(8);

    engine.predict("", "nihao");
    engine.word_candidate_selected("好");
    let p = engine.predict(".", "nihao");

    assert_eq!(engine.cache_stats().hits, 1);
    // the learned weight shows up even though segmentation came from the cache
    let hao = engine.last_candidates().iter().find(|c| c.text() == "好").unwrap();
    assert_eq!(hao.score, 45.0 + 50.0);
    assert_eq!(p.suggestions[0], "你好");
}

#[test]
fn test_disabled_cache_matches_enabled() {
    let mut cached = setup_test_engine(4);
    let mut uncached = setup_test_engine(0);

    for input in ["nihao", "xian", "xi'an", "nihao", "nix"] {
        assert_eq!(cached.predict("", input), uncached.predict("", input));
    }
    let stats = uncached.cache_stats();
    assert_eq!((stats.hits, stats.misses, stats.capacity), (0, 0, 0));
}

#[test]
fn test_clear_cache_resets_statistics() {
    let mut engine = setup_test_engine(4);
    engine.predict("", "nihao");
    engine.predict("", "nihao");
    engine.clear_cache();

    let stats = engine.cache_stats();
    assert_eq!((stats.hits, stats.misses, stats.entries), (0, 0, 0));
    assert_eq!(stats.capacity, 4);
}
