//! Pinyin language features
//!
//! Chinese text has no inter-word spaces, so suggestions are always shown and
//! nothing is appended after a replaced preedit. Auto-capitalization does not
//! apply to hanzi.

use phf::phf_set;
use predict_core::{utils, LanguageFeatures, PreparedInput};

use crate::config::PinyinConfig;

/// Punctuation and whitespace that separate words in committed text.
static SEPARATORS: phf::Set<&'static str> = phf_set! {
    " ", "\u{3000}", "\t", "\n",
    "，", "。", "、", "；", "：", "？", "！", "…", "—",
    "“", "”", "‘", "’", "（", "）", "《", "》", "【", "】", "「", "」",
    ",", ".", ";", ":", "?", "!", "\"", "(", ")", "[", "]", "-",
};

/// Characters that end a sentence and reset the prediction context.
const SENTENCE_TERMINATORS: [char; 7] = ['。', '！', '？', '.', '!', '?', '…'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChineseLanguageFeatures {
    apostrophe_separator: bool,
    tone_digits_as_separators: bool,
}

impl ChineseLanguageFeatures {
    pub fn new(apostrophe_separator: bool, tone_digits_as_separators: bool) -> Self {
        Self {
            apostrophe_separator,
            tone_digits_as_separators,
        }
    }

    pub fn from_config(config: &PinyinConfig) -> Self {
        Self::new(config.apostrophe_separator, config.tone_digits_as_separators)
    }
}

impl Default for ChineseLanguageFeatures {
    fn default() -> Self {
        Self::new(true, true)
    }
}

impl LanguageFeatures for ChineseLanguageFeatures {
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
        !text.is_empty() && text.chars().all(|c| SEPARATORS.contains(c.encode_utf8(&mut [0; 4])))
    }

    fn is_sentence_terminator(&self, c: char) -> bool {
        SENTENCE_TERMINATORS.contains(&c)
    }

    /// Lowercase, drop whitespace, and turn apostrophes (and tone digits 1-5)
    /// into forced syllable boundaries. Both are removed from the text even
    /// when they are not configured as boundaries.
    fn prepare_preedit(&self, preedit: &str) -> PreparedInput {
        let normalized = utils::normalize(preedit);
        let mut text = String::with_capacity(normalized.len());
        let mut chars = 0usize;
        let mut boundaries: Vec<usize> = Vec::new();

        for c in normalized.chars() {
            if c.is_whitespace() {
                continue;
            }
            let (marker, enabled) = match c {
                '\'' => (true, self.apostrophe_separator),
                '1'..='5' => (true, self.tone_digits_as_separators),
                _ => (false, false),
            };
            if marker {
                if enabled && chars > 0 && boundaries.last() != Some(&chars) {
                    boundaries.push(chars);
                }
                continue;
            }
            for lower in c.to_lowercase() {
                text.push(lower);
                chars += 1;
            }
        }

        PreparedInput::with_boundaries(text, boundaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_facing_flags() {
        let f = ChineseLanguageFeatures::default();
        assert!(f.always_show_suggestions());
        assert!(!f.auto_caps_available());
        assert!(!f.activate_auto_caps("Ni"));
        assert_eq!(f.appendix_for_replaced_preedit("nihao"), "");
    }

    #[test]
    fn separators() {
        let f = ChineseLanguageFeatures::default();
        assert!(f.is_separator("，"));
        assert!(f.is_separator("。"));
        assert!(f.is_separator("?!"));
        assert!(f.is_separator(" "));
        assert!(!f.is_separator(""));
        assert!(!f.is_separator("你"));
        assert!(!f.is_separator("a,"));
    }

    #[test]
    fn sentence_end() {
        let f = ChineseLanguageFeatures::default();
        assert!(f.ends_sentence("你好。"));
        assert!(f.ends_sentence("真的吗？ "));
        assert!(f.ends_sentence("wait..."));
        assert!(!f.ends_sentence("你好，"));
    }

    #[test]
    fn prepare_marks_boundaries() {
        let f = ChineseLanguageFeatures::default();
        assert_eq!(
            f.prepare_preedit("Xi'An"),
            PreparedInput::with_boundaries("xian", vec![2])
        );
        assert_eq!(
            f.prepare_preedit("ni3hao3"),
            PreparedInput::with_boundaries("nihao", vec![2, 5])
        );
        assert_eq!(f.prepare_preedit(" ni hao "), PreparedInput::new("nihao"));
        assert_eq!(f.prepare_preedit("'ni''hao"), PreparedInput::with_boundaries("nihao", vec![2]));
    }

    #[test]
    fn disabled_markers_are_only_dropped() {
        let f = ChineseLanguageFeatures::new(false, false);
        assert_eq!(f.prepare_preedit("xi'an"), PreparedInput::new("xian"));
        assert_eq!(f.prepare_preedit("ni3hao3"), PreparedInput::new("nihao"));
    }
}
