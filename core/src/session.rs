//! Search session state.
//!
//! Tracks the unconverted pinyin buffer, the current segmentation and
//! candidate list, and the committed region. Only `choose` and
//! `reset_search` (via the decoder) move the commit boundary; once chosen,
//! committed text never changes short of a full reset.

use crate::candidate::Candidate;
use crate::syllable::Syllable;

/// Per-decoder session state. Created empty, mutated by search/choose,
/// cleared by reset.
#[derive(Debug, Clone, Default)]
pub struct SearchSession {
    /// Pinyin not yet converted, already normalized and truncated.
    buffer: String,

    /// Best segmentation of `buffer`.
    segmentation: Vec<Syllable>,

    /// Ranked candidates for `buffer`.
    candidates: Vec<Candidate>,

    /// Hanzi locked in by previous choices.
    committed_text: String,

    /// Pinyin consumed by previous choices.
    committed_pinyin: String,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to the empty state: nothing pending, nothing committed.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.segmentation.clear();
        self.candidates.clear();
        self.committed_text.clear();
        self.committed_pinyin.clear();
    }

    /// No pinyin typed and nothing committed.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty() && self.committed_pinyin.is_empty()
    }

    /// There is unconverted pinyin awaiting a choice.
    pub fn is_searching(&self) -> bool {
        !self.buffer.is_empty()
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn segmentation(&self) -> &[Syllable] {
        &self.segmentation
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    pub fn candidate(&self, index: usize) -> Option<&Candidate> {
        self.candidates.get(index)
    }

    /// Hanzi committed so far.
    pub fn committed_text(&self) -> &str {
        &self.committed_text
    }

    /// Pinyin characters committed so far; the value `choose` reports.
    pub fn commit_length(&self) -> usize {
        self.committed_pinyin.chars().count()
    }

    /// Pinyin consumed by previous choices.
    pub fn committed_pinyin(&self) -> &str {
        &self.committed_pinyin
    }

    pub(crate) fn set_results(
        &mut self,
        buffer: String,
        segmentation: Vec<Syllable>,
        candidates: Vec<Candidate>,
    ) {
        self.buffer = buffer;
        self.segmentation = segmentation;
        self.candidates = candidates;
    }

    pub(crate) fn clear_pending(&mut self) {
        self.buffer.clear();
        self.segmentation.clear();
        self.candidates.clear();
    }

    /// Record a choice: `text` is locked in, `consumed` pinyin characters
    /// move from the buffer to the committed region. Returns the remaining
    /// unconverted suffix.
    pub(crate) fn push_commit(&mut self, text: &str, consumed: usize) -> String {
        let consumed_pinyin: String = self.buffer.chars().take(consumed).collect();
        let rest: String = self.buffer.chars().skip(consumed).collect();
        self.committed_text.push_str(text);
        self.committed_pinyin.push_str(&consumed_pinyin);
        self.clear_pending();
        rest
    }
}
