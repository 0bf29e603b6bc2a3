/// Prefix trie over the legal pinyin syllable table.
use std::collections::HashMap;

/// A character trie used for syllable validation during segmentation.
///
/// Three queries drive the segmenter:
/// - `contains_word`: is this exact string a legal syllable?
/// - `walk_prefixes`: from a position in the input, which legal syllables
///   start here?
/// - `is_strict_prefix`: could the user still be in the middle of typing a
///   longer syllable?
#[derive(Debug, Default)]
pub struct SyllableTrie {
    children: HashMap<char, Box<SyllableTrie>>,
    /// Set when a complete syllable ends at this node.
    word: Option<String>,
}

impl SyllableTrie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a trie from a slice of syllables.
    pub fn from_syllables<T: AsRef<str>>(syllables: &[T]) -> Self {
        let mut trie = Self::new();
        for s in syllables {
            trie.insert(s.as_ref());
        }
        trie
    }

    /// Insert one syllable. Input is lowercased; empty strings are ignored.
    pub fn insert(&mut self, syllable: &str) {
        let key = syllable.trim().to_ascii_lowercase();
        if key.is_empty() {
            return;
        }
        let mut node = self;
        for ch in key.chars() {
            node = node
                .children
                .entry(ch)
                .or_insert_with(|| Box::new(SyllableTrie::new()));
        }
        node.word = Some(key);
    }

    /// True only if `word` is a complete syllable, not just a prefix of one.
    pub fn contains_word(&self, word: &str) -> bool {
        let mut node = self;
        for ch in word.chars() {
            match node.children.get(&ch) {
                Some(child) => node = child,
                None => return false,
            }
        }
        node.word.is_some()
    }

    /// True if `chars` is a proper prefix of at least one syllable, i.e. the
    /// walk succeeds and longer syllables continue past it. Used to accept a
    /// partial trailing syllable while the user is still typing.
    pub fn is_strict_prefix(&self, chars: &[char]) -> bool {
        if chars.is_empty() {
            return false;
        }
        let mut node = self;
        for ch in chars {
            match node.children.get(ch) {
                Some(child) => node = child,
                None => return false,
            }
        }
        !node.children.is_empty()
    }

    /// Walk from `start` in `input` and collect every complete syllable that
    /// begins there, as `(end_index, syllable)` pairs in order of increasing
    /// length.
    pub fn walk_prefixes(&self, input: &[char], start: usize) -> Vec<(usize, String)> {
        let mut out = Vec::new();
        let mut node = self;
        let mut idx = start;
        while idx < input.len() {
            match node.children.get(&input[idx]) {
                Some(child) => {
                    node = child;
                    idx += 1;
                    if let Some(w) = &node.word {
                        out.push((idx, w.clone()));
                    }
                }
                None => break,
            }
        }
        out
    }
}
