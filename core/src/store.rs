// core/src/store.rs
//
// Merged dictionary lookup: read-only system dictionary plus the writable
// user overlay. This is the scoring primitive the lattice search runs on.

use std::fs::File;
use std::path::Path;

use ahash::AHashMap;
use anyhow::{Context, Result};

use crate::syllable::{join_key, Syllable};
use crate::sysdict::SystemDict;
use crate::userdict::UserDict;

/// Score discount applied to prefix-expanded matches (the key found in the
/// index is longer than what the user typed so far).
const PREFIX_DISCOUNT: f32 = 2.0;

/// Cap on expanded keys considered per prefix query.
const PREFIX_KEYS: usize = 16;

/// One merged lookup result.
#[derive(Debug, Clone, PartialEq)]
pub struct DictEntry {
    pub hanzi: String,
    pub score: f32,
    pub from_user: bool,
}

/// `ln(1 + freq)`: frequencies compress logarithmically so common phrases
/// lead without drowning everything else.
fn freq_score(freq: u64) -> f32 {
    (1.0 + freq as f32).ln()
}

/// System dictionary plus user overlay, opened and closed together.
pub struct DictStore {
    system: SystemDict,
    user: UserDict,
}

impl DictStore {
    /// Open both dictionaries. Either failure aborts the whole open; no
    /// partially initialized store is ever returned.
    pub fn open<P: AsRef<Path>>(
        dict_file: &File,
        offset: u64,
        len: u64,
        user_dict_path: P,
    ) -> Result<Self> {
        let system = SystemDict::open(dict_file, offset, len)?;
        let user = UserDict::open(user_dict_path.as_ref())
            .map_err(anyhow::Error::from)
            .with_context(|| {
                format!("open user dictionary {}", user_dict_path.as_ref().display())
            })?;
        Ok(Self { system, user })
    }

    pub fn system(&self) -> &SystemDict {
        &self.system
    }

    pub fn user(&self) -> &UserDict {
        &self.user
    }

    /// Entries whose key exactly matches the syllable sequence.
    pub fn lookup_exact(&self, syllables: &[Syllable], limit: usize) -> Vec<DictEntry> {
        self.lookup_key(&join_key(syllables), limit, false)
    }

    /// Entries matching the syllable sequence exactly or as a valid prefix
    /// of a longer key. Prefix hits are discounted; they are predictions,
    /// not matches.
    pub fn lookup(&self, syllables: &[Syllable], limit: usize) -> Vec<DictEntry> {
        self.lookup_key(&join_key(syllables), limit, true)
    }

    fn lookup_key(&self, key: &str, limit: usize, expand_prefix: bool) -> Vec<DictEntry> {
        if key.is_empty() || limit == 0 {
            return Vec::new();
        }

        let mut merged: AHashMap<String, DictEntry> = AHashMap::new();
        let mut absorb = |hanzi: &str, score: f32, from_user: bool| {
            match merged.get_mut(hanzi) {
                Some(existing) => {
                    if score > existing.score {
                        existing.score = score;
                    }
                    existing.from_user |= from_user;
                }
                None => {
                    merged.insert(
                        hanzi.to_string(),
                        DictEntry {
                            hanzi: hanzi.to_string(),
                            score,
                            from_user,
                        },
                    );
                }
            }
        };

        if let Some(entries) = self.system.get(key) {
            for e in entries {
                absorb(&e.hanzi, freq_score(e.freq as u64), false);
            }
        }

        if expand_prefix {
            for (_, entries) in self.system.search_prefix(key, PREFIX_KEYS) {
                for e in entries.iter().take(4) {
                    absorb(&e.hanzi, freq_score(e.freq as u64) - PREFIX_DISCOUNT, false);
                }
            }
        }

        // User reinforcement: boost known entries, surface user-only ones.
        match self.user.lookup(key) {
            Ok(pairs) => {
                for (hanzi, count) in pairs {
                    let boost = freq_score(count);
                    match merged.get_mut(&hanzi) {
                        Some(existing) => {
                            existing.score += boost;
                            existing.from_user = true;
                        }
                        None => {
                            merged.insert(
                                hanzi.clone(),
                                DictEntry {
                                    hanzi,
                                    score: boost,
                                    from_user: true,
                                },
                            );
                        }
                    }
                }
            }
            Err(e) => tracing::warn!(key, error = %e, "user dictionary lookup failed"),
        }

        let mut out: Vec<DictEntry> = merged.into_values().collect();
        out.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.from_user.cmp(&a.from_user))
                .then_with(|| a.hanzi.chars().count().cmp(&b.hanzi.chars().count()))
                .then_with(|| a.hanzi.cmp(&b.hanzi))
        });
        out.truncate(limit);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sysdict::DictBuilder;
    use crate::syllable::Syllable;

    fn temp_store(tag: &str) -> (DictStore, Vec<std::path::PathBuf>) {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dict_path = std::env::temp_dir().join(format!("store_{}_{}.dat", tag, nanos));
        let user_path = std::env::temp_dir().join(format!("store_{}_{}.redb", tag, nanos));

        let mut b = DictBuilder::new();
        b.push("ni", "你", 100);
        b.push("ni", "尼", 40);
        b.push("hao", "好", 100);
        b.push("ni'hao", "你好", 200);
        b.push("pin", "拼", 50);
        b.push("pin'yin", "拼音", 150);
        b.write_to_file(&dict_path).unwrap();

        let len = std::fs::metadata(&dict_path).unwrap().len();
        let file = File::open(&dict_path).unwrap();
        let store = DictStore::open(&file, 0, len, &user_path).unwrap();
        (store, vec![dict_path, user_path])
    }

    fn syl(text: &str) -> Syllable {
        Syllable::new(text, false)
    }

    #[test]
    fn exact_lookup_orders_by_frequency() {
        let (store, paths) = temp_store("exact");
        let out = store.lookup_exact(&[syl("ni")], 8);
        assert_eq!(out[0].hanzi, "你");
        assert_eq!(out[1].hanzi, "尼");
        assert!(out[0].score > out[1].score);
        for p in paths {
            let _ = std::fs::remove_file(p);
        }
    }

    #[test]
    fn prefix_expansion_is_discounted() {
        let (store, paths) = temp_store("prefix");
        let out = store.lookup(&[syl("pin")], 8);
        // exact 拼 beats the discounted 拼音 prediction
        assert_eq!(out[0].hanzi, "拼");
        assert!(out.iter().any(|e| e.hanzi == "拼音"));
        // exact-only lookup never predicts
        assert!(store
            .lookup_exact(&[syl("pin")], 8)
            .iter()
            .all(|e| e.hanzi != "拼音"));
        for p in paths {
            let _ = std::fs::remove_file(p);
        }
    }

    #[test]
    fn partial_tail_reaches_longer_keys() {
        let (store, paths) = temp_store("partial");
        let out = store.lookup(&[syl("ni"), Syllable::new("h", true)], 8);
        assert!(out.iter().any(|e| e.hanzi == "你好"));
        for p in paths {
            let _ = std::fs::remove_file(p);
        }
    }

    #[test]
    fn user_choices_promote_entries() {
        let (store, paths) = temp_store("boost");
        // 尼 starts below 你
        let before = store.lookup_exact(&[syl("ni")], 8);
        assert_eq!(before[0].hanzi, "你");

        for _ in 0..200 {
            store.user().learn("ni", "尼").unwrap();
        }
        let after = store.lookup_exact(&[syl("ni")], 8);
        assert_eq!(after[0].hanzi, "尼");
        assert!(after[0].from_user);
        for p in paths {
            let _ = std::fs::remove_file(p);
        }
    }

    #[test]
    fn user_only_entries_surface() {
        let (store, paths) = temp_store("useronly");
        store.user().learn("hao", "郝").unwrap();
        let out = store.lookup_exact(&[syl("hao")], 8);
        assert!(out.iter().any(|e| e.hanzi == "郝" && e.from_user));
        assert_eq!(out[0].hanzi, "好");
        for p in paths {
            let _ = std::fs::remove_file(p);
        }
    }
}
