//! Dictionary store: syllable spelling -> candidate words.
//!
//! The store is built once from a `DictionarySource` and is read-only from then
//! on. Keys are indexed with an `fst::Map` (spelling -> payload index) and the
//! candidate payloads live in a plain vector, the same split used for the
//! on-disk binary format (`index.fst` + `payloads.bincode`).
//!
//! Public API:
//! - `CandidateEntry` - one word/phrase with its base frequency
//! - `SourceEntry` / `DictionarySource` - what a store is loaded from
//! - `DuplicatePolicy` - how repeated `(spelling, text)` pairs are resolved
//! - `DictionaryStore` - lookup / validation API
//!
//! Notes:
//! - Spellings are normalized on load: apostrophes are removed and letters are
//!   lowercased, so `ni'hao` and `nihao` address the same key. After that only
//!   ASCII letters and `ü` are accepted; CJK or accented keys are rejected.
//! - A spelling may cover several syllables (`nihao`); the segmenter treats any
//!   key of the store as a valid syllable.

use ahash::AHashSet;
use fst::{Map, Streamer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::LoadError;
use crate::utils;

/// A single candidate word or phrase for a spelling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateEntry {
    /// Logographic text offered to the user.
    pub text: String,
    /// Normalized spelling this entry is stored under.
    pub spelling: String,
    /// Static base frequency. Finite and non-negative.
    pub frequency: f64,
    /// Optional part-of-speech or context tag.
    pub tag: Option<String>,
}

impl CandidateEntry {
    pub fn new<T: Into<String>, S: Into<String>>(text: T, spelling: S, frequency: f64) -> Self {
        Self {
            text: text.into(),
            spelling: spelling.into(),
            frequency,
            tag: None,
        }
    }

    pub fn with_tag<T: Into<String>>(mut self, tag: T) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Entry for text that was never produced by the dictionary.
    pub fn unoffered<T: Into<String>>(text: T) -> Self {
        Self::new(text, String::new(), 0.0)
    }
}

/// One raw entry of a dictionary source, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceEntry {
    pub spelling: String,
    pub text: String,
    pub frequency: Option<f64>,
    pub tag: Option<String>,
}

impl SourceEntry {
    pub fn new<S: Into<String>, T: Into<String>>(spelling: S, text: T, frequency: f64) -> Self {
        Self {
            spelling: spelling.into(),
            text: text.into(),
            frequency: Some(frequency),
            tag: None,
        }
    }
}

/// Resolution for a `(spelling, text)` pair that appears more than once.
///
/// An exact repeat (same frequency) is always collapsed into one entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// A repeat with a different frequency fails the load.
    #[default]
    Reject,
    /// The later occurrence replaces the earlier one.
    LastWins,
}

/// Where a dictionary is loaded from.
#[derive(Debug, Clone)]
pub enum DictionarySource {
    /// Line table: `spelling text frequency [tag]`, `#` starts a comment.
    Text(String),
    TextFile(PathBuf),
    /// JSON object: `{ "spelling": [{ "text": .., "frequency": .., "tag": .. }] }`.
    Json(String),
    JsonFile(PathBuf),
    Entries(Vec<SourceEntry>),
    /// Files written by `DictionaryStore::save_binary`.
    Binary { index: PathBuf, payloads: PathBuf },
}

impl DictionarySource {
    /// Pick a source format from the file extension (`.json` is JSON, anything
    /// else is the line table).
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => {
                DictionarySource::JsonFile(path.to_path_buf())
            }
            _ => DictionarySource::TextFile(path.to_path_buf()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct JsonEntry {
    text: String,
    #[serde(default)]
    frequency: Option<f64>,
    #[serde(default)]
    tag: Option<String>,
}

/// Immutable mapping from spelling to candidate entries.
#[derive(Debug, Clone)]
pub struct DictionaryStore {
    index: Map<Vec<u8>>,
    payloads: Vec<Vec<CandidateEntry>>,
    texts: AHashSet<String>,
    entry_count: usize,
    max_spelling_len: usize,
    max_text_len: usize,
}

impl DictionaryStore {
    /// Load a store with the default (`Reject`) duplicate policy.
    pub fn load(source: DictionarySource) -> Result<Self, LoadError> {
        Self::load_with_policy(source, DuplicatePolicy::default())
    }

    pub fn load_with_policy(
        source: DictionarySource,
        policy: DuplicatePolicy,
    ) -> Result<Self, LoadError> {
        let store = match source {
            DictionarySource::Text(content) => Self::from_text(&content, policy)?,
            DictionarySource::TextFile(path) => Self::from_text(&read_file(&path)?, policy)?,
            DictionarySource::Json(content) => Self::from_json(&content, policy)?,
            DictionarySource::JsonFile(path) => Self::from_json(&read_file(&path)?, policy)?,
            DictionarySource::Entries(entries) => Self::from_entries(entries, policy)?,
            DictionarySource::Binary { index, payloads } => {
                Self::load_binary(&index, &payloads, policy)?
            }
        };
        info!(
            spellings = store.len(),
            entries = store.entry_count,
            "dictionary loaded"
        );
        Ok(store)
    }

    /// Build a store from already-parsed entries.
    pub fn from_entries<I>(entries: I, policy: DuplicatePolicy) -> Result<Self, LoadError>
    where
        I: IntoIterator<Item = SourceEntry>,
    {
        let mut builder = StoreBuilder::new(policy);
        for entry in entries {
            builder.insert(entry)?;
        }
        builder.finish()
    }

    fn from_text(content: &str, policy: DuplicatePolicy) -> Result<Self, LoadError> {
        let mut builder = StoreBuilder::new(policy);
        for (idx, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let entry = parse_line(line).map_err(|e| e.at_line(idx + 1))?;
            builder.insert(entry).map_err(|e| e.at_line(idx + 1))?;
        }
        builder.finish()
    }

    fn from_json(content: &str, policy: DuplicatePolicy) -> Result<Self, LoadError> {
        let parsed: BTreeMap<String, Vec<JsonEntry>> = serde_json::from_str(content)?;
        let mut builder = StoreBuilder::new(policy);
        for (spelling, list) in parsed {
            for e in list {
                builder.insert(SourceEntry {
                    spelling: spelling.clone(),
                    text: e.text,
                    frequency: e.frequency,
                    tag: e.tag,
                })?;
            }
        }
        builder.finish()
    }

    fn load_binary(
        index_path: &Path,
        payload_path: &Path,
        policy: DuplicatePolicy,
    ) -> Result<Self, LoadError> {
        let mut buf = Vec::new();
        File::open(index_path)
            .and_then(|mut f| f.read_to_end(&mut buf))
            .map_err(|source| LoadError::Io {
                path: index_path.to_path_buf(),
                source,
            })?;
        let index = Map::new(buf)?;

        let file = File::open(payload_path).map_err(|source| LoadError::Io {
            path: payload_path.to_path_buf(),
            source,
        })?;
        let payloads: Vec<Vec<CandidateEntry>> =
            bincode::deserialize_from(BufReader::new(file))?;

        if index.len() != payloads.len() {
            return Err(LoadError::Inconsistent(format!(
                "{} keys but {} payload lists",
                index.len(),
                payloads.len()
            )));
        }

        // every entry goes through the same checks as the text loaders
        let mut builder = StoreBuilder::new(policy);
        let mut stream = index.stream();
        while let Some((key, idx)) = stream.next() {
            let spelling = std::str::from_utf8(key)
                .map_err(|e| LoadError::Inconsistent(format!("non-utf8 key: {}", e)))?;
            let list = payloads.get(idx as usize).ok_or_else(|| {
                LoadError::Inconsistent(format!("key {:?} points past the payloads", spelling))
            })?;
            for entry in list {
                builder.insert(SourceEntry {
                    spelling: spelling.to_string(),
                    text: entry.text.clone(),
                    frequency: Some(entry.frequency),
                    tag: entry.tag.clone(),
                })?;
            }
        }
        builder.finish()
    }

    /// Write the store as an fst index plus a bincode payload file.
    pub fn save_binary<P: AsRef<Path>>(&self, index_path: P, payload_path: P) -> io::Result<()> {
        std::fs::write(index_path.as_ref(), self.index.as_fst().as_bytes())?;
        let writer = BufWriter::new(File::create(payload_path.as_ref())?);
        bincode::serialize_into(writer, &self.payloads).map_err(io::Error::other)?;
        Ok(())
    }

    /// Candidates stored under `spelling`; empty when the spelling is unknown.
    ///
    /// Entries are ordered by descending frequency, then by text.
    pub fn lookup(&self, spelling: &str) -> &[CandidateEntry] {
        self.index
            .get(spelling)
            .and_then(|idx| self.payloads.get(idx as usize))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_valid_syllable(&self, spelling: &str) -> bool {
        self.index.contains_key(spelling)
    }

    /// Number of distinct spellings.
    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }

    /// Number of candidate entries across all spellings.
    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    /// Length in chars of the longest spelling.
    pub fn max_spelling_len(&self) -> usize {
        self.max_spelling_len
    }

    /// True if some entry offers exactly this text.
    pub fn contains_text(&self, text: &str) -> bool {
        self.texts.contains(text)
    }

    /// Length in chars of the longest candidate text.
    pub fn max_text_len(&self) -> usize {
        self.max_text_len
    }

    /// All spellings in byte order.
    pub fn spellings(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.len());
        let mut stream = self.index.stream();
        while let Some((key, _)) = stream.next() {
            out.push(String::from_utf8_lossy(key).into_owned());
        }
        out
    }
}

fn read_file(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse one non-comment table line.
fn parse_line(line: &str) -> Result<SourceEntry, LoadError> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    match parts.as_slice() {
        [spelling, text] => Err(LoadError::MissingFrequency {
            spelling: spelling.to_string(),
            text: text.to_string(),
        }),
        [spelling, text, freq, rest @ ..] if rest.len() <= 1 => {
            let frequency = freq.parse::<f64>().map_err(|_| LoadError::InvalidFrequency {
                spelling: spelling.to_string(),
                text: text.to_string(),
                value: freq.to_string(),
            })?;
            Ok(SourceEntry {
                spelling: spelling.to_string(),
                text: text.to_string(),
                frequency: Some(frequency),
                tag: rest.first().map(|t| t.to_string()),
            })
        }
        _ => Err(LoadError::Malformed(format!(
            "expected `spelling text frequency [tag]`, got {:?}",
            line
        ))),
    }
}

/// Remove apostrophes and lowercase; only ASCII letters and `ü` remain valid.
fn normalize_spelling(raw: &str) -> Result<String, LoadError> {
    let spelling: String = raw
        .trim()
        .chars()
        .filter(|c| *c != '\'')
        .flat_map(char::to_lowercase)
        .collect();
    if spelling.is_empty() {
        return Err(LoadError::EmptySpelling);
    }
    if !spelling.chars().all(is_spelling_char) {
        return Err(LoadError::InvalidSpelling(raw.to_string()));
    }
    Ok(spelling)
}

fn is_spelling_char(c: char) -> bool {
    c.is_ascii_lowercase() || c == 'ü'
}

/// Accumulates validated entries, then freezes them into a store.
struct StoreBuilder {
    policy: DuplicatePolicy,
    buckets: BTreeMap<String, Vec<CandidateEntry>>,
}

impl StoreBuilder {
    fn new(policy: DuplicatePolicy) -> Self {
        Self {
            policy,
            buckets: BTreeMap::new(),
        }
    }

    fn insert(&mut self, entry: SourceEntry) -> Result<(), LoadError> {
        let spelling = normalize_spelling(&entry.spelling)?;
        let text = utils::normalize(&entry.text);
        if text.is_empty() {
            return Err(LoadError::EmptyCandidate(spelling));
        }
        let frequency = entry.frequency.ok_or_else(|| LoadError::MissingFrequency {
            spelling: spelling.clone(),
            text: text.clone(),
        })?;
        if !frequency.is_finite() || frequency < 0.0 {
            return Err(LoadError::InvalidFrequency {
                spelling,
                text,
                value: frequency.to_string(),
            });
        }

        let bucket = self.buckets.entry(spelling.clone()).or_default();
        match bucket.iter_mut().find(|e| e.text == text) {
            Some(existing) if existing.frequency == frequency => {
                if entry.tag.is_some() {
                    existing.tag = entry.tag;
                }
            }
            Some(existing) => match self.policy {
                DuplicatePolicy::Reject => {
                    return Err(LoadError::ConflictingFrequency {
                        spelling,
                        text,
                        first: existing.frequency,
                        second: frequency,
                    });
                }
                DuplicatePolicy::LastWins => {
                    debug!(%spelling, %text, frequency, "duplicate entry replaced");
                    existing.frequency = frequency;
                    existing.tag = entry.tag;
                }
            },
            None => bucket.push(CandidateEntry {
                text,
                spelling,
                frequency,
                tag: entry.tag,
            }),
        }
        Ok(())
    }

    fn finish(self) -> Result<DictionaryStore, LoadError> {
        let mut payloads = Vec::with_capacity(self.buckets.len());
        let mut texts = AHashSet::new();
        let mut entry_count = 0;
        let mut max_spelling_len = 0;
        let mut max_text_len = 0;

        // BTreeMap iterates in byte order, which is what the fst builder needs.
        let index = Map::from_iter(self.buckets.keys().enumerate().map(|(i, k)| (k, i as u64)))?;

        for (spelling, mut bucket) in self.buckets {
            bucket.sort_by(|a, b| {
                b.frequency
                    .total_cmp(&a.frequency)
                    .then_with(|| a.text.cmp(&b.text))
            });
            max_spelling_len = max_spelling_len.max(spelling.chars().count());
            for e in &bucket {
                max_text_len = max_text_len.max(e.text.chars().count());
                texts.insert(e.text.clone());
            }
            entry_count += bucket.len();
            payloads.push(bucket);
        }

        Ok(DictionaryStore {
            index,
            payloads,
            texts,
            entry_count,
            max_spelling_len,
            max_text_len,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo() -> DictionaryStore {
        DictionaryStore::load(DictionarySource::Text(
            "ni 你 100\nni 泥 40 n\nhao 好 90\nni'hao 你好 200\n".to_string(),
        ))
        .unwrap()
    }

    #[test]
    fn lookup_and_validate() {
        let store = demo();
        assert_eq!(store.len(), 3);
        assert_eq!(store.entry_count(), 4);
        assert!(store.is_valid_syllable("ni"));
        assert!(store.is_valid_syllable("nihao"));
        assert!(!store.is_valid_syllable("n"));
        assert!(store.lookup("xyz").is_empty());
        assert_eq!(store.lookup("nihao")[0].text, "你好");
        assert_eq!(store.lookup("nihao")[0].spelling, "nihao");
    }

    #[test]
    fn entries_sorted_by_frequency() {
        let store = demo();
        let texts: Vec<&str> = store.lookup("ni").iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["你", "泥"]);
        assert_eq!(store.lookup("ni")[1].tag.as_deref(), Some("n"));
    }

    #[test]
    fn text_metadata() {
        let store = demo();
        assert!(store.contains_text("你好"));
        assert!(!store.contains_text("好你"));
        assert_eq!(store.max_text_len(), 2);
        assert_eq!(store.max_spelling_len(), 5);
        assert_eq!(store.spellings(), vec!["hao", "ni", "nihao"]);
    }

    #[test]
    fn missing_frequency_reports_line() {
        let err = DictionaryStore::load(DictionarySource::Text("ni 你 1\nhao 好\n".into()))
            .unwrap_err();
        assert!(matches!(err, LoadError::AtLine { line: 2, .. }));
        assert!(matches!(err.root(), LoadError::MissingFrequency { .. }));
    }

    #[test]
    fn rejects_bad_entries() {
        let bad = [
            SourceEntry::new("", "你", 1.0),
            SourceEntry::new("n1", "你", 1.0),
            SourceEntry::new("你", "你", 1.0),
            SourceEntry::new("né", "你", 1.0),
            SourceEntry::new("ni", "  ", 1.0),
            SourceEntry::new("ni", "你", -1.0),
            SourceEntry::new("ni", "你", f64::NAN),
        ];
        for entry in bad {
            assert!(DictionaryStore::from_entries(vec![entry], DuplicatePolicy::Reject).is_err());
        }
    }

    #[test]
    fn spelling_alphabet() {
        let err = DictionaryStore::load(DictionarySource::Text("ni 你 1\n你 你 1\n".into())).unwrap_err();
        assert!(matches!(err, LoadError::AtLine { line: 2, .. }));
        assert!(matches!(err.root(), LoadError::InvalidSpelling(s) if s == "你"));

        let store = DictionaryStore::load(DictionarySource::Text("lü 绿 10\nNV 女 5\n".into())).unwrap();
        assert!(store.is_valid_syllable("lü"));
        assert!(store.is_valid_syllable("nv"));
    }

    #[test]
    fn duplicate_policy() {
        let entries = vec![
            SourceEntry::new("ni", "你", 1.0),
            SourceEntry::new("ni", "你", 5.0),
        ];
        let err = DictionaryStore::from_entries(entries.clone(), DuplicatePolicy::Reject)
            .unwrap_err();
        assert!(matches!(err, LoadError::ConflictingFrequency { .. }));

        let store = DictionaryStore::from_entries(entries, DuplicatePolicy::LastWins).unwrap();
        assert_eq!(store.lookup("ni").len(), 1);
        assert_eq!(store.lookup("ni")[0].frequency, 5.0);

        let same = vec![
            SourceEntry::new("ni", "你", 2.0),
            SourceEntry::new("NI", "你", 2.0),
        ];
        let store = DictionaryStore::from_entries(same, DuplicatePolicy::Reject).unwrap();
        assert_eq!(store.entry_count(), 1);
    }

    #[test]
    fn json_source() {
        let json = r#"{ "ni": [{ "text": "你", "frequency": 100 }], "hao": [{ "text": "好", "frequency": 90, "tag": "a" }] }"#;
        let store = DictionaryStore::load(DictionarySource::Json(json.into())).unwrap();
        assert_eq!(store.lookup("hao")[0].tag.as_deref(), Some("a"));

        let missing = r#"{ "ni": [{ "text": "你" }] }"#;
        let err = DictionaryStore::load(DictionarySource::Json(missing.into())).unwrap_err();
        assert!(matches!(err, LoadError::MissingFrequency { .. }));
    }

    #[test]
    fn save_and_load_binary_roundtrip() {
        let dir = std::env::temp_dir();
        let index = dir.join(format!("predict_core_dict_{}.fst", std::process::id()));
        let payloads = dir.join(format!("predict_core_dict_{}.bincode", std::process::id()));
        let store = demo();
        store.save_binary(&index, &payloads).unwrap();

        let loaded = DictionaryStore::load(DictionarySource::Binary {
            index: index.clone(),
            payloads: payloads.clone(),
        })
        .unwrap();
        assert_eq!(loaded.spellings(), store.spellings());
        assert_eq!(loaded.lookup("ni"), store.lookup("ni"));

        let _ = std::fs::remove_file(index);
        let _ = std::fs::remove_file(payloads);
    }
}
