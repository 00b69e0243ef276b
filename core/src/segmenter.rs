// core/src/segmenter.rs
//
// Syllable segmentation of unspaced phonetic input.
// - Every prefix length at every position is checked against the dictionary
// - A reachability table (suffix from `pos` splits into exactly `k` syllables)
//   keeps the enumeration on complete segmentations only
// - Results come out fewest-syllables-first, then in lexicographic order of
//   the syllable sequence, and stop at a fixed cap
//
// Inputs longer than `max_input_len` chars are not enumerated at all; the
// reachability table is quadratic in the input length. The greedy
// longest-match scan, linear in the input, covers them and every other input
// without a complete segmentation.

use std::fmt;
use std::iter::FusedIterator;
use std::sync::Arc;

use tracing::debug;

use crate::dictionary::DictionaryStore;

/// Longest input, in chars, that `Segmenter::segment` enumerates by default.
pub const DEFAULT_MAX_INPUT_LEN: usize = 64;

/// An ordered split of an input string into dictionary spellings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Segmentation {
    syllables: Vec<String>,
}

impl Segmentation {
    pub fn new(syllables: Vec<String>) -> Self {
        Self { syllables }
    }

    pub fn syllables(&self) -> &[String] {
        &self.syllables
    }

    /// Number of syllables.
    pub fn len(&self) -> usize {
        self.syllables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.syllables.is_empty()
    }

    /// The syllables joined without separators.
    pub fn spelling(&self) -> String {
        self.syllables.concat()
    }
}

impl fmt::Display for Segmentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.syllables.join("'"))
    }
}

/// Splits input into syllable sequences known to a `DictionaryStore`.
#[derive(Debug, Clone)]
pub struct Segmenter {
    store: Arc<DictionaryStore>,
    max_results: usize,
    max_input_len: usize,
}

impl Segmenter {
    /// `max_results` caps how many segmentations one call may yield.
    pub fn new(store: Arc<DictionaryStore>, max_results: usize) -> Self {
        Self {
            store,
            max_results: max_results.max(1),
            max_input_len: DEFAULT_MAX_INPUT_LEN,
        }
    }

    /// Inputs longer than `max_input_len` chars yield no segmentation.
    pub fn with_max_input_len(mut self, max_input_len: usize) -> Self {
        self.max_input_len = max_input_len.max(1);
        self
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    pub fn max_input_len(&self) -> usize {
        self.max_input_len
    }

    /// Enumerate complete segmentations of `input`.
    ///
    /// The returned iterator is lazy and single-use; call again for a fresh
    /// enumeration. It is empty when no complete segmentation exists or the
    /// input is longer than `max_input_len`.
    pub fn segment(&self, input: &str) -> Segmentations {
        self.segment_with_boundaries(input, &[])
    }

    /// Like `segment`, but no syllable may span any of the given char offsets.
    pub fn segment_with_boundaries(&self, input: &str, boundaries: &[usize]) -> Segmentations {
        let bounds = char_bounds(input);
        let n = bounds.len() - 1;
        if n > self.max_input_len {
            debug!(chars = n, max = self.max_input_len, "input too long to enumerate");
            return Segmentations::empty();
        }

        let forced = forced_marks(n, boundaries);
        let max_len = self.store.max_spelling_len();
        let mut options: Vec<Vec<(usize, String)>> = Vec::with_capacity(n);
        for pos in 0..n {
            let mut here = Vec::new();
            for end in pos + 1..=n.min(pos + max_len) {
                let syllable = &input[bounds[pos]..bounds[end]];
                if self.store.is_valid_syllable(syllable) {
                    here.push((end, syllable.to_string()));
                }
                if forced[end] {
                    break;
                }
            }
            here.sort_by(|a, b| a.1.cmp(&b.1));
            options.push(here);
        }

        // reach[pos][k]: the suffix starting at `pos` splits into exactly k syllables
        let mut reach = vec![vec![false; n + 1]; n + 1];
        reach[n][0] = true;
        for pos in (0..n).rev() {
            for &(end, _) in &options[pos] {
                for k in 1..=(n - end + 1) {
                    if reach[end][k - 1] {
                        reach[pos][k] = true;
                    }
                }
            }
        }

        let min_k = (1..=n).find(|&k| reach[0][k]);
        let max_k = (1..=n).rev().find(|&k| reach[0][k]).unwrap_or(0);
        debug!(input, ?min_k, max_k, "segmenting");

        Segmentations {
            options,
            reach,
            n,
            target: min_k.unwrap_or(0),
            max_target: max_k,
            stack: match min_k {
                Some(_) => vec![Frame { pos: 0, next: 0 }],
                None => Vec::new(),
            },
            path: Vec::new(),
            remaining: self.max_results,
            done: min_k.is_none(),
        }
    }

    /// Left-to-right longest-match scan that skips characters no syllable
    /// starts with.
    ///
    /// The result does not reconstruct `input`; it only collects what could be
    /// matched. `None` when nothing matched at all.
    pub fn greedy_fallback(&self, input: &str) -> Option<Segmentation> {
        self.greedy_fallback_with_boundaries(input, &[])
    }

    /// Like `greedy_fallback`, but no match spans a forced boundary.
    pub fn greedy_fallback_with_boundaries(&self, input: &str, boundaries: &[usize]) -> Option<Segmentation> {
        let bounds = char_bounds(input);
        let n = bounds.len() - 1;
        let forced = forced_marks(n, boundaries);
        let max_len = self.store.max_spelling_len();

        let mut out = Vec::new();
        let mut pos = 0;
        while pos < n {
            let mut matched = None;
            for end in pos + 1..=n.min(pos + max_len) {
                if self.store.is_valid_syllable(&input[bounds[pos]..bounds[end]]) {
                    matched = Some(end);
                }
                if forced[end] {
                    break;
                }
            }
            match matched {
                Some(end) => {
                    out.push(input[bounds[pos]..bounds[end]].to_string());
                    pos = end;
                }
                None => pos += 1,
            }
        }

        if out.is_empty() {
            None
        } else {
            debug!(input, matched = out.len(), "greedy fallback segmentation");
            Some(Segmentation::new(out))
        }
    }
}

/// Byte offset of every char boundary, including the end of the string.
fn char_bounds(input: &str) -> Vec<usize> {
    input
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(input.len()))
        .collect()
}

/// `marks[i]` is set when char offset `i` is a forced boundary.
fn forced_marks(n: usize, boundaries: &[usize]) -> Vec<bool> {
    let mut marks = vec![false; n + 1];
    for &b in boundaries {
        if b <= n {
            marks[b] = true;
        }
    }
    marks
}

struct Frame {
    pos: usize,
    next: usize,
}

/// Lazy enumeration of complete segmentations, see `Segmenter::segment`.
pub struct Segmentations {
    options: Vec<Vec<(usize, String)>>,
    reach: Vec<Vec<bool>>,
    n: usize,
    target: usize,
    max_target: usize,
    stack: Vec<Frame>,
    path: Vec<String>,
    remaining: usize,
    done: bool,
}

impl Segmentations {
    fn empty() -> Self {
        Self {
            options: Vec::new(),
            reach: Vec::new(),
            n: 0,
            target: 0,
            max_target: 0,
            stack: Vec::new(),
            path: Vec::new(),
            remaining: 0,
            done: true,
        }
    }
}

impl Iterator for Segmentations {
    type Item = Segmentation;

    fn next(&mut self) -> Option<Segmentation> {
        if self.done || self.remaining == 0 {
            self.done = true;
            return None;
        }

        loop {
            let frame = match self.stack.last_mut() {
                Some(frame) => frame,
                None => {
                    // every split into `target` syllables has been produced
                    self.target += 1;
                    while self.target <= self.max_target && !self.reach[0][self.target] {
                        self.target += 1;
                    }
                    if self.target > self.max_target {
                        self.done = true;
                        return None;
                    }
                    self.stack.push(Frame { pos: 0, next: 0 });
                    continue;
                }
            };

            let left = self.target - self.path.len();
            let opts = &self.options[frame.pos];
            let mut chosen = None;
            while frame.next < opts.len() {
                let (end, syllable) = &opts[frame.next];
                frame.next += 1;
                if self.reach[*end][left - 1] {
                    chosen = Some((*end, syllable.clone()));
                    break;
                }
            }

            match chosen {
                Some((end, syllable)) => {
                    self.path.push(syllable);
                    if end == self.n {
                        let seg = Segmentation::new(self.path.clone());
                        self.path.pop();
                        self.remaining -= 1;
                        return Some(seg);
                    }
                    self.stack.push(Frame { pos: end, next: 0 });
                }
                None => {
                    self.stack.pop();
                    self.path.pop();
                }
            }
        }
    }
}

impl FusedIterator for Segmentations {}
