//! Candidate type produced by lattice search.

use serde::{Deserialize, Serialize};

/// A proposed hanzi decoding of some leading portion of the unconverted
/// pinyin buffer.
///
/// `pinyin_len` is the number of buffer characters the candidate covers;
/// choosing the candidate commits exactly that many. `key` is the
/// apostrophe-joined syllable key that produced it, kept so a choice can be
/// reinforced in the user dictionary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub text: String,
    pub score: f32,
    pub key: String,
    pub pinyin_len: usize,
    pub from_user: bool,
}

impl Candidate {
    pub fn new<T: Into<String>, K: Into<String>>(
        text: T,
        score: f32,
        key: K,
        pinyin_len: usize,
        from_user: bool,
    ) -> Self {
        Self {
            text: text.into(),
            score,
            key: key.into(),
            pinyin_len,
            from_user,
        }
    }

    /// Hanzi length in characters, for the configured output limit.
    pub fn hanzi_len(&self) -> usize {
        self.text.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hanzi_len_counts_chars_not_bytes() {
        let c = Candidate::new("你好", 1.0, "ni'hao", 5, false);
        assert_eq!(c.hanzi_len(), 2);
        assert_eq!(c.pinyin_len, 5);
    }
}
