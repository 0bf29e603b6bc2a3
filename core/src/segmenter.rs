// core/src/segmenter.rs
//
// Syllable segmentation for raw, undelimited pinyin.
// - segment_best: backward DP over boundary positions
// - segment_top_k: left-to-right beam search for alternative splits
//
// Boundaries are ambiguous ("xian" vs "xi"+"an"), so both entrypoints score
// hypotheses with a cost model that prefers fewer, longer syllables. A
// trailing fragment that is a proper prefix of a legal syllable is kept as a
// partial syllable instead of being rejected; the user may still be typing.

use crate::syllable::{syllable_trie, Syllable};
use crate::trie::SyllableTrie;

/// Per-segment cost by matched length. Longer syllables are cheaper, and
/// every extra segment pays the base again, which is what gives the
/// maximal-match bias.
fn segment_cost(len: usize) -> f32 {
    match len {
        1 => 0.9,
        2 => 0.8,
        3 => 0.7,
        4 => 0.6,
        _ => 0.5,
    }
}

/// Cost of a partial trailing syllable.
const PARTIAL_COST: f32 = 1.2;

/// Cost of swallowing one unrecognizable character. High enough that any
/// legal split wins, low enough that segmentation always completes.
const UNKNOWN_COST: f32 = 8.0;

/// Pinyin syllable segmenter backed by the shared syllable trie.
#[derive(Debug)]
pub struct Segmenter {
    trie: &'static SyllableTrie,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Segmenter {
    pub fn new() -> Self {
        Self {
            trie: syllable_trie(),
        }
    }

    /// Lowercase and drop everything outside the pinyin alphabet.
    fn normalize(input: &str) -> Vec<char> {
        input
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_lowercase())
            .collect()
    }

    /// Single best segmentation of `input`.
    ///
    /// DP over positions, walking backward: at each position choose among
    /// every legal syllable starting there, a partial syllable reaching the
    /// end of input, and (only when nothing else fits) a one-character
    /// unknown token. Lower total cost wins; on a near-tie, fewer segments.
    pub fn segment_best(&self, input: &str) -> Vec<Syllable> {
        let chars = Self::normalize(input);
        let n = chars.len();
        if n == 0 {
            return Vec::new();
        }

        let mut best_cost = vec![f32::INFINITY; n + 1];
        let mut best_keys = vec![usize::MAX; n + 1];
        // (end, text, partial)
        let mut choice: Vec<Option<(usize, String, bool)>> = vec![None; n + 1];
        best_cost[n] = 0.0;
        best_keys[n] = 0;

        for pos in (0..n).rev() {
            let mut relax = |end: usize,
                             text: String,
                             partial: bool,
                             cost: f32,
                             best_cost: &mut Vec<f32>,
                             best_keys: &mut Vec<usize>,
                             choice: &mut Vec<Option<(usize, String, bool)>>| {
                if best_cost[end].is_infinite() {
                    return;
                }
                let cand_cost = cost + best_cost[end];
                let cand_keys = 1 + best_keys[end];
                let better = cand_cost < best_cost[pos] - 1e-6
                    || ((cand_cost - best_cost[pos]).abs() < 1e-6 && cand_keys < best_keys[pos]);
                if better {
                    best_cost[pos] = cand_cost;
                    best_keys[pos] = cand_keys;
                    choice[pos] = Some((end, text, partial));
                }
            };

            for (end, word) in self.trie.walk_prefixes(&chars, pos) {
                let cost = segment_cost(end - pos);
                relax(
                    end, word, false, cost, &mut best_cost, &mut best_keys, &mut choice,
                );
            }

            // The tail of the input may be an unfinished syllable.
            if self.trie.is_strict_prefix(&chars[pos..]) {
                let text: String = chars[pos..].iter().collect();
                relax(
                    n,
                    text,
                    true,
                    PARTIAL_COST,
                    &mut best_cost,
                    &mut best_keys,
                    &mut choice,
                );
            }

            if choice[pos].is_none() {
                let text: String = chars[pos..pos + 1].iter().collect();
                relax(
                    pos + 1,
                    text,
                    false,
                    UNKNOWN_COST,
                    &mut best_cost,
                    &mut best_keys,
                    &mut choice,
                );
            }
        }

        let mut out = Vec::new();
        let mut cur = 0usize;
        while cur < n {
            match &choice[cur] {
                Some((next, text, partial)) => {
                    out.push(Syllable::new(text.clone(), *partial));
                    cur = *next;
                }
                None => {
                    // unreachable with the unknown fallback, but never panic here
                    out.push(Syllable::new(chars[cur].to_string(), false));
                    cur += 1;
                }
            }
        }
        out
    }

    /// Top-k segmentation hypotheses, best first.
    ///
    /// Left-to-right beam search expanding the same transitions as
    /// `segment_best`. States are ranked by (cost ascending, fewer segments);
    /// the beam keeps slack beyond `k` so alternative splits like
    /// `["xi","an"]` next to `["xian"]` survive pruning.
    pub fn segment_top_k(&self, input: &str, k: usize) -> Vec<Vec<Syllable>> {
        let chars = Self::normalize(input);
        let n = chars.len();
        if n == 0 || k == 0 {
            return Vec::new();
        }

        #[derive(Clone)]
        struct State {
            pos: usize,
            tokens: Vec<Syllable>,
            cost: f32,
        }

        fn state_cmp(a: &State, b: &State) -> std::cmp::Ordering {
            if (a.cost - b.cost).abs() > 1e-6 {
                return a
                    .cost
                    .partial_cmp(&b.cost)
                    .unwrap_or(std::cmp::Ordering::Equal);
            }
            a.tokens.len().cmp(&b.tokens.len())
        }

        let beam_width = std::cmp::max(8, k.saturating_mul(4));
        let mut beam = vec![State {
            pos: 0,
            tokens: Vec::new(),
            cost: 0.0,
        }];
        let mut completed: Vec<State> = Vec::new();

        while !beam.is_empty() {
            let mut next_beam: Vec<State> = Vec::new();

            for st in beam.into_iter() {
                if st.pos == n {
                    completed.push(st);
                    continue;
                }

                let prefixes = self.trie.walk_prefixes(&chars, st.pos);
                let had_match = !prefixes.is_empty();
                for (end, word) in prefixes {
                    let mut tokens = st.tokens.clone();
                    tokens.push(Syllable::new(word, false));
                    next_beam.push(State {
                        pos: end,
                        tokens,
                        cost: st.cost + segment_cost(end - st.pos),
                    });
                }

                let tail_is_partial = self.trie.is_strict_prefix(&chars[st.pos..]);
                if tail_is_partial {
                    let text: String = chars[st.pos..].iter().collect();
                    let mut tokens = st.tokens.clone();
                    tokens.push(Syllable::new(text, true));
                    next_beam.push(State {
                        pos: n,
                        tokens,
                        cost: st.cost + PARTIAL_COST,
                    });
                }

                if !had_match && !tail_is_partial {
                    let text: String = chars[st.pos..st.pos + 1].iter().collect();
                    let mut tokens = st.tokens.clone();
                    tokens.push(Syllable::new(text, false));
                    next_beam.push(State {
                        pos: st.pos + 1,
                        tokens,
                        cost: st.cost + UNKNOWN_COST,
                    });
                }
            }

            if next_beam.is_empty() {
                break;
            }
            next_beam.sort_by(state_cmp);
            next_beam.truncate(beam_width);
            beam = next_beam;
        }

        completed.sort_by(state_cmp);
        completed.truncate(k);
        completed.into_iter().map(|st| st.tokens).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(seg: &[Syllable]) -> Vec<&str> {
        seg.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn best_segmentation_basic() {
        let seg = Segmenter::new();
        assert_eq!(texts(&seg.segment_best("nihao")), vec!["ni", "hao"]);
        assert_eq!(texts(&seg.segment_best("zhongguo")), vec!["zhong", "guo"]);
        assert_eq!(texts(&seg.segment_best("pinyin")), vec!["pin", "yin"]);
    }

    #[test]
    fn maximal_match_preferred() {
        let seg = Segmenter::new();
        // one syllable beats the two-way split on cost
        assert_eq!(texts(&seg.segment_best("xian")), vec!["xian"]);
    }

    #[test]
    fn top_k_keeps_ambiguous_split() {
        let seg = Segmenter::new();
        let alts = seg.segment_top_k("xian", 4);
        assert!(!alts.is_empty());
        assert_eq!(texts(&alts[0]), vec!["xian"]);
        assert!(alts.iter().any(|s| texts(s) == vec!["xi", "an"]));
    }

    #[test]
    fn partial_trailing_syllable_kept() {
        let seg = Segmenter::new();
        let out = seg.segment_best("nizh");
        assert_eq!(texts(&out), vec!["ni", "zh"]);
        assert!(out[1].partial);
        assert!(!out[0].partial);
    }

    #[test]
    fn unknown_character_does_not_panic() {
        let seg = Segmenter::new();
        // no syllable starts with a bare "i"
        let out = seg.segment_best("i");
        assert_eq!(texts(&out), vec!["i"]);
        assert!(!out[0].partial);
    }

    #[test]
    fn empty_input_yields_no_segments() {
        let seg = Segmenter::new();
        assert!(seg.segment_best("").is_empty());
        assert!(seg.segment_top_k("", 4).is_empty());
    }

    #[test]
    fn normalization_strips_non_letters() {
        let seg = Segmenter::new();
        assert_eq!(texts(&seg.segment_best("Ni Hao!")), vec!["ni", "hao"]);
    }
}
