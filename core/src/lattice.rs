// core/src/lattice.rs
//
// Scored search over segmentation boundaries.
//
// For every segmentation hypothesis the decoder runs a forward DP over
// syllable positions: best[j] is the best-scoring hanzi decoding of
// syllables[0..j], extended by dictionary lookups over spans ending at j.
// Position-indexed DP, not recursive backtracking, so long inputs stay
// predictable.

use ahash::AHashMap;

use crate::candidate::Candidate;
use crate::store::DictStore;
use crate::syllable::{join_key, Syllable};
use crate::Config;

/// Penalty per extra span in a path. Keeps a single 200-frequency phrase
/// ahead of two 100-frequency words covering the same pinyin, which is the
/// ranking the engine promises.
const SPAN_PENALTY: f32 = 5.0;

/// Longest phrase span, in syllables, the DP will look up.
const MAX_SPAN: usize = 8;

#[derive(Debug, Clone)]
struct PathNode {
    score: f32,
    spans: usize,
    text: String,
    key: String,
    from_user: bool,
}

/// Lattice search over one or more segmentations of the unconverted buffer.
pub struct Lattice<'a> {
    store: &'a DictStore,
    config: &'a Config,
}

impl<'a> Lattice<'a> {
    pub fn new(store: &'a DictStore, config: &'a Config) -> Self {
        Self { store, config }
    }

    /// Produce the ranked candidate list for the given segmentation
    /// hypotheses (best hypothesis first, as returned by the segmenter).
    ///
    /// The list is: full-buffer decodings from every hypothesis, deduped and
    /// sorted by score, followed by prefix-span candidates from the best
    /// hypothesis (longest span first) so the user can convert one word at a
    /// time. Candidates longer than the configured hanzi limit are dropped.
    pub fn decode(&self, segmentations: &[Vec<Syllable>]) -> Vec<Candidate> {
        let mut full: AHashMap<String, Candidate> = AHashMap::new();

        for syllables in segmentations {
            // alternatives over the whole span, not just the DP-best path
            for entry in self
                .store
                .lookup(syllables, self.config.lookup_limit)
                .into_iter()
            {
                let cand = Candidate::new(
                    entry.hanzi,
                    entry.score,
                    join_key(syllables),
                    buffer_chars(syllables),
                    entry.from_user,
                );
                merge_best(&mut full, cand);
            }

            if let Some(cand) = self.best_path(syllables) {
                merge_best(&mut full, cand);
            }
        }

        let mut out: Vec<Candidate> = full
            .into_values()
            .filter(|c| c.hanzi_len() <= self.config.max_hanzi_len)
            .collect();
        out.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.from_user.cmp(&a.from_user))
                .then_with(|| a.text.cmp(&b.text))
        });

        if let Some(best) = segmentations.first() {
            self.append_prefix_candidates(best, &mut out);
        }
        out
    }

    /// Forward DP over one segmentation. Returns the best full decoding, or
    /// None when some stretch of the input matches nothing in either
    /// dictionary.
    fn best_path(&self, syllables: &[Syllable]) -> Option<Candidate> {
        let n = syllables.len();
        if n == 0 {
            return None;
        }

        let mut best: Vec<Option<PathNode>> = vec![None; n + 1];
        best[0] = Some(PathNode {
            score: 0.0,
            spans: 0,
            text: String::new(),
            key: String::new(),
            from_user: false,
        });

        for j in 1..=n {
            for i in j.saturating_sub(MAX_SPAN)..j {
                let Some(prev) = best[i].clone() else { continue };
                let span = &syllables[i..j];
                // a partial syllable is only meaningful at the very end
                if span.iter().any(|s| s.partial) && j != n {
                    continue;
                }

                let entries = if j == n {
                    self.store.lookup(span, self.config.lookup_limit)
                } else {
                    self.store.lookup_exact(span, self.config.lookup_limit)
                };
                let Some(entry) = entries.into_iter().next() else {
                    continue;
                };

                let join_penalty = if i > 0 { SPAN_PENALTY } else { 0.0 };
                let cand = PathNode {
                    score: prev.score + entry.score - join_penalty,
                    spans: prev.spans + 1,
                    text: format!("{}{}", prev.text, entry.hanzi),
                    key: if prev.key.is_empty() {
                        join_key(span)
                    } else {
                        format!("{}'{}", prev.key, join_key(span))
                    },
                    from_user: prev.from_user || entry.from_user,
                };

                let better = match &best[j] {
                    None => true,
                    Some(cur) => {
                        cand.score > cur.score + 1e-6
                            || ((cand.score - cur.score).abs() <= 1e-6
                                && (cand.spans < cur.spans
                                    || (cand.spans == cur.spans
                                        && cand.from_user
                                        && !cur.from_user)))
                    }
                };
                if better {
                    best[j] = Some(cand);
                }
            }
        }

        best[n].take().map(|node| {
            Candidate::new(
                node.text,
                node.score,
                node.key,
                buffer_chars(syllables),
                node.from_user,
            )
        })
    }

    /// Exact-match candidates for leading spans, longest first, so index 0..
    /// stays the best full decoding and later indices offer split points.
    fn append_prefix_candidates(&self, syllables: &[Syllable], out: &mut Vec<Candidate>) {
        let n = syllables.len();
        if n < 2 {
            return;
        }
        for span_len in (1..n).rev() {
            let span = &syllables[..span_len];
            if span.iter().any(|s| s.partial) {
                continue;
            }
            let pinyin_len = buffer_chars(span);
            for entry in self
                .store
                .lookup_exact(span, self.config.lookup_limit)
                .into_iter()
            {
                if entry.hanzi.chars().count() > self.config.max_hanzi_len {
                    continue;
                }
                let duplicate = out
                    .iter()
                    .any(|c| c.text == entry.hanzi && c.pinyin_len == pinyin_len);
                if !duplicate {
                    out.push(Candidate::new(
                        entry.hanzi,
                        entry.score,
                        join_key(span),
                        pinyin_len,
                        entry.from_user,
                    ));
                }
            }
        }
    }
}

fn buffer_chars(syllables: &[Syllable]) -> usize {
    syllables.iter().map(|s| s.len()).sum()
}

fn merge_best(map: &mut AHashMap<String, Candidate>, cand: Candidate) {
    match map.get(&cand.text) {
        Some(existing) if existing.score >= cand.score => {}
        _ => {
            map.insert(cand.text.clone(), cand);
        }
    }
}
