//! pinyin-ime-core
//!
//! Incremental pinyin-to-hanzi decoding engine. The system dictionary is a
//! packed, read-only blob addressed by a byte range inside a larger file and
//! reached through a memory map; a redb-backed user dictionary overlays it
//! and learns from the choices the user makes.
//!
//! Public API:
//! - `Decoder` - caller-owned decoding session (open/search/choose lifecycle)
//! - `DictStore` - merged system + user dictionary lookup
//! - `SystemDict` / `DictBuilder` - packed dictionary reader and writer
//! - `UserDict` - persistent per-user learning overlay
//! - `Segmenter` - pinyin syllable segmentation
//! - `Config` - limits and tuning knobs
use serde::{Deserialize, Serialize};

pub mod trie;
pub use trie::SyllableTrie;

pub mod syllable;
pub use syllable::{join_key, syllable_trie, Syllable, PINYIN_SYLLABLES};

pub mod segmenter;
pub use segmenter::Segmenter;

pub mod sysdict;
pub use sysdict::{DictBuilder, PhraseEntry, SystemDict};

pub mod userdict;
pub use userdict::UserDict;

pub mod store;
pub use store::{DictEntry, DictStore};

pub mod candidate;
pub use candidate::Candidate;

pub mod lattice;
pub use lattice::Lattice;

pub mod session;
pub use session::SearchSession;

pub mod decoder;
pub use decoder::Decoder;

/// Engine configuration: length limits and search tuning.
///
/// Deserializable from TOML so hosts can ship a config file next to the
/// dictionary data. Defaults match the limits the original host requested
/// when opening the decoder (64/64).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Maximum accepted pinyin length in characters. Longer input is
    /// truncated, never rejected.
    pub max_pinyin_len: usize,

    /// Maximum hanzi length a candidate may have; longer candidates are
    /// dropped from the ranked list.
    pub max_hanzi_len: usize,

    /// How many alternative segmentations the beam search keeps.
    pub top_segmentations: usize,

    /// Cap on merged dictionary entries returned per lookup key.
    pub lookup_limit: usize,

    /// Entries in the unconverted-buffer -> candidates cache.
    pub candidate_cache_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_pinyin_len: 64,
            max_hanzi_len: 64,
            top_segmentations: 4,
            lookup_limit: 16,
            candidate_cache_size: 256,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> anyhow::Result<()> {
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Load configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Set the pinyin/hanzi length limits. Zero values are clamped to 1;
    /// limits never cause an error at this layer.
    pub fn set_limits(&mut self, max_pinyin_len: usize, max_hanzi_len: usize) {
        self.max_pinyin_len = max_pinyin_len.max(1);
        self.max_hanzi_len = max_hanzi_len.max(1);
    }
}
