// core/src/decoder.rs
//
// The decoder: explicit, caller-owned object carrying the dictionary store
// and one search session. The operation surface mirrors the classic native
// decoder contract (open / set_limits / reset_search / search /
// get_candidate / choose / close) but with value-typed results instead of
// global state: failures at this boundary are booleans, zero counts, or
// empty strings, never panics or half-open state.

use std::cell::RefCell;
use std::fs::File;
use std::num::NonZeroUsize;
use std::path::Path;

use lru::LruCache;

use crate::candidate::Candidate;
use crate::lattice::Lattice;
use crate::segmenter::Segmenter;
use crate::session::SearchSession;
use crate::store::DictStore;
use crate::syllable::Syllable;
use crate::Config;

type CachedResult = (Vec<Syllable>, Vec<Candidate>);

/// An incremental pinyin decoding session.
///
/// Lifecycle: `open` -> `set_limits` -> repeated `search` / `get_candidate`
/// / `choose` -> `close`. All calls are safe in any state; operations before
/// a successful `open` simply report empty results.
pub struct Decoder {
    store: Option<DictStore>,
    segmenter: Segmenter,
    config: Config,
    session: SearchSession,
    cache: RefCell<LruCache<String, CachedResult>>,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let cap = NonZeroUsize::new(config.candidate_cache_size)
            .unwrap_or_else(|| NonZeroUsize::new(256).unwrap());
        Self {
            store: None,
            segmenter: Segmenter::new(),
            config,
            session: SearchSession::new(),
            cache: RefCell::new(LruCache::new(cap)),
        }
    }

    /// Open the system dictionary from `[offset, offset+len)` of `dict_file`
    /// and the user dictionary at `user_dict_path` (created if absent).
    ///
    /// Returns false on an invalid range, corrupt or version-mismatched
    /// blob, or an unwritable user-dictionary path; in every failure case
    /// the decoder stays closed.
    pub fn open<P: AsRef<Path>>(
        &mut self,
        dict_file: &File,
        offset: u64,
        len: u64,
        user_dict_path: P,
    ) -> bool {
        self.close();
        match DictStore::open(dict_file, offset, len, user_dict_path) {
            Ok(store) => {
                tracing::debug!(offset, len, "decoder opened");
                self.store = Some(store);
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "decoder open failed");
                false
            }
        }
    }

    pub fn is_open(&self) -> bool {
        self.store.is_some()
    }

    /// Release the dictionaries and all session state. Safe to call when
    /// nothing is open.
    pub fn close(&mut self) -> bool {
        if self.store.take().is_some() {
            tracing::debug!("decoder closed");
        }
        self.session.reset();
        self.cache.borrow_mut().clear();
        true
    }

    /// Configure the maximum pinyin input length and maximum hanzi output
    /// length. Non-positive values are clamped; never fails.
    pub fn set_limits(&mut self, max_pinyin_len: usize, max_hanzi_len: usize) {
        self.config.set_limits(max_pinyin_len, max_hanzi_len);
        self.cache.borrow_mut().clear();
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Drop the buffer and the commit boundary, returning the session to
    /// the empty state. Idempotent.
    pub fn reset_search(&mut self) {
        self.session.reset();
    }

    /// Decode `pinyin` as the unconverted buffer and return the number of
    /// available candidates.
    ///
    /// The input replaces whatever was pending beyond the commit boundary.
    /// Hosts that resend the whole composing string are tolerated: a leading
    /// match against the already committed pinyin is stripped first. Input
    /// is normalized to lowercase letters and truncated to the configured
    /// maximum length; unrecognizable input yields 0 candidates, not an
    /// error.
    pub fn search(&mut self, pinyin: &str) -> usize {
        if self.store.is_none() {
            return 0;
        }

        let mut input: String = pinyin
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let committed = self.session.committed_pinyin();
        if !committed.is_empty() && input.starts_with(committed) {
            input = input.split_off(committed.len());
        }
        input.truncate(self.config.max_pinyin_len);

        self.run_search(input)
    }

    fn run_search(&mut self, buffer: String) -> usize {
        if buffer.is_empty() {
            self.session.clear_pending();
            return 0;
        }

        if let Some((seg, cands)) = self.cache.borrow_mut().get(&buffer).cloned() {
            self.session.set_results(buffer, seg, cands);
            return self.session.candidate_count();
        }

        let segmentations = self
            .segmenter
            .segment_top_k(&buffer, self.config.top_segmentations);
        if segmentations.is_empty() {
            self.session.clear_pending();
            return 0;
        }

        let store = self
            .store
            .as_ref()
            .expect("run_search is only reached while open");
        let candidates = Lattice::new(store, &self.config).decode(&segmentations);
        let best_seg = segmentations.into_iter().next().unwrap_or_default();

        self.cache
            .borrow_mut()
            .put(buffer.clone(), (best_seg.clone(), candidates.clone()));
        self.session.set_results(buffer, best_seg, candidates);
        self.session.candidate_count()
    }

    pub fn candidate_count(&self) -> usize {
        self.session.candidate_count()
    }

    /// Candidate text at `index`; the empty string when the index is out of
    /// range. Index 0 is the best full decoding of the unconverted buffer.
    pub fn get_candidate(&self, index: usize) -> String {
        self.session
            .candidate(index)
            .map(|c| c.text.clone())
            .unwrap_or_default()
    }

    /// UTF-16 code units of the candidate, for hosts that consume them.
    pub fn get_candidate_utf16(&self, index: usize) -> Vec<u16> {
        self.session
            .candidate(index)
            .map(|c| c.text.encode_utf16().collect())
            .unwrap_or_default()
    }

    pub fn candidates(&self) -> &[Candidate] {
        self.session.candidates()
    }

    /// Commit candidate `index`: its hanzi is locked in, the boundary
    /// advances past the pinyin it covers, the choice reinforces the user
    /// dictionary, and search re-runs over the remaining suffix. Returns the
    /// total committed pinyin length, or 0 for an invalid index (no-op).
    pub fn choose(&mut self, index: usize) -> usize {
        let Some(cand) = self.session.candidate(index).cloned() else {
            return 0;
        };

        if let Some(store) = &self.store {
            if let Err(e) = store.user().learn(&cand.key, &cand.text) {
                tracing::warn!(key = %cand.key, error = %e, "user dictionary learn failed");
            }
        }
        // learning shifts ranking; cached results are stale now
        self.cache.borrow_mut().clear();

        let rest = self.session.push_commit(&cand.text, cand.pinyin_len);
        if !rest.is_empty() {
            self.run_search(rest);
        }
        self.session.commit_length()
    }

    /// Total pinyin characters committed by choices so far.
    pub fn commit_length(&self) -> usize {
        self.session.commit_length()
    }

    /// Hanzi committed so far.
    pub fn committed_text(&self) -> &str {
        self.session.committed_text()
    }

    /// The pending (not yet converted) pinyin.
    pub fn composing_text(&self) -> &str {
        self.session.buffer()
    }

    pub fn session(&self) -> &SearchSession {
        &self.session
    }

    /// Access to the user dictionary while open, for inspection and export.
    pub fn user_dict(&self) -> Option<&crate::userdict::UserDict> {
        self.store.as_ref().map(|s| s.user())
    }

    /// Convenience mirroring the original host wrapper: search `pinyin` and
    /// return up to `max` candidate strings in one call.
    pub fn candidate_strings(&mut self, pinyin: &str, max: usize) -> Vec<String> {
        let n = self.search(pinyin).min(max);
        (0..n).map(|i| self.get_candidate(i)).collect()
    }
}
