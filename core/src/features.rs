// core/src/features.rs
//
// Language capability surface the host queries through the façade.
// Language crates implement `LanguageFeatures`; the core only relies on
// `prepare_preedit` and the sentence terminator check.

/// Preedit text ready for segmentation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PreparedInput {
    /// Text handed to the segmenter (separators removed).
    pub text: String,
    /// Char offsets into `text` where a syllable boundary is forced.
    pub boundaries: Vec<usize>,
}

impl PreparedInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            boundaries: Vec::new(),
        }
    }

    pub fn with_boundaries(text: impl Into<String>, boundaries: Vec<usize>) -> Self {
        Self {
            text: text.into(),
            boundaries,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Cache key; boundaries are part of it since they change segmentation.
    pub(crate) fn cache_key(&self) -> String {
        if self.boundaries.is_empty() {
            return self.text.clone();
        }
        let marks: Vec<String> = self.boundaries.iter().map(|b| b.to_string()).collect();
        format!("{}\u{0}{}", self.text, marks.join(","))
    }
}

/// Language-specific behaviour of a prediction engine.
pub trait LanguageFeatures {
    /// Whether the host should show suggestions even when the user has not
    /// started composing.
    fn always_show_suggestions(&self) -> bool;

    fn auto_caps_available(&self) -> bool;

    /// Whether auto-capitalization applies to the given preedit.
    fn activate_auto_caps(&self, preedit: &str) -> bool;

    /// Text appended after a preedit is replaced by a suggestion.
    fn appendix_for_replaced_preedit(&self, preedit: &str) -> String;

    /// Whether `text` consists of a word separator.
    fn is_separator(&self, text: &str) -> bool;

    fn is_sentence_terminator(&self, c: char) -> bool;

    /// Whether `text` ends a sentence, ignoring trailing whitespace.
    fn ends_sentence(&self, text: &str) -> bool {
        text.trim_end()
            .chars()
            .next_back()
            .is_some_and(|c| self.is_sentence_terminator(c))
    }

    /// Turn raw preedit into segmenter input.
    fn prepare_preedit(&self, preedit: &str) -> PreparedInput {
        PreparedInput::new(crate::utils::normalize(preedit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain;

    impl LanguageFeatures for Plain {
        fn always_show_suggestions(&self) -> bool {
            false
        }
        fn auto_caps_available(&self) -> bool {
            true
        }
        fn activate_auto_caps(&self, preedit: &str) -> bool {
            preedit.is_empty()
        }
        fn appendix_for_replaced_preedit(&self, _preedit: &str) -> String {
            " ".to_string()
        }
        fn is_separator(&self, text: &str) -> bool {
            text == " "
        }
        fn is_sentence_terminator(&self, c: char) -> bool {
            c == '.'
        }
    }

    #[test]
    fn default_methods() {
        let f = Plain;
        assert!(f.ends_sentence("done. "));
        assert!(!f.ends_sentence("not yet"));
        assert!(!f.ends_sentence(""));
        assert_eq!(f.prepare_preedit(" nihao "), PreparedInput::new("nihao"));
    }

    #[test]
    fn cache_key_includes_boundaries() {
        let a = PreparedInput::new("xian");
        let b = PreparedInput::with_boundaries("xian", vec![2]);
        assert_ne!(a.cache_key(), b.cache_key());
        assert_eq!(a.cache_key(), "xian");
    }
}
