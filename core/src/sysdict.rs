// core/src/sysdict.rs
//
// Packed, read-only system dictionary.
//
// On disk the dictionary is a versioned blob addressed by a byte range
// [offset, offset+len) of a containing file:
//
//   magic    [u8; 4]  "PYDC"
//   version  u32 le
//   fst_len  u32 le
//   pay_len  u32 le
//   crc32    u32 le   over the fst and payload sections
//   fst      fst_len bytes   fst::Map, key -> payload index
//   payload  pay_len bytes   bincode Vec<Vec<PhraseEntry>>
//
// Keys are pinyin syllables joined with apostrophes ("ni'hao"). The file is
// memory-mapped; the fst reads straight out of the mapping, payloads are
// decoded up front so lookups never touch the disk.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::ops::Range;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use fst::automaton::Str;
use fst::{Automaton, IntoStreamer, Map, MapBuilder, Streamer};
use memmap2::Mmap;
use serde::{Deserialize, Serialize};

pub const MAGIC: [u8; 4] = *b"PYDC";
pub const VERSION: u32 = 1;
pub const HEADER_LEN: usize = 20;

/// One dictionary entry for a key: the hanzi string and its corpus frequency.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PhraseEntry {
    pub hanzi: String,
    pub freq: u32,
}

/// Fixed-layout blob header.
#[derive(Debug, Clone, Copy)]
struct DictHeader {
    version: u32,
    fst_len: u32,
    pay_len: u32,
    crc32: u32,
}

impl DictHeader {
    fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            bail!("dictionary blob shorter than header ({} bytes)", bytes.len());
        }
        if bytes[0..4] != MAGIC {
            bail!("bad dictionary magic {:02x?}", &bytes[0..4]);
        }
        let u32_at = |off: usize| u32::from_le_bytes([bytes[off], bytes[off + 1], bytes[off + 2], bytes[off + 3]]);
        Ok(Self {
            version: u32_at(4),
            fst_len: u32_at(8),
            pay_len: u32_at(12),
            crc32: u32_at(16),
        })
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&self.fst_len.to_le_bytes());
        out.extend_from_slice(&self.pay_len.to_le_bytes());
        out.extend_from_slice(&self.crc32.to_le_bytes());
    }
}

/// A byte range of a shared memory map. Lets the fst borrow straight from
/// the mapping without copying the index out.
struct MmapRegion {
    mmap: Arc<Mmap>,
    range: Range<usize>,
}

impl AsRef<[u8]> for MmapRegion {
    fn as_ref(&self) -> &[u8] {
        &self.mmap[self.range.clone()]
    }
}

/// The loaded system dictionary. Read-only after `open`; never mutated by
/// searches or choices.
#[derive(Debug)]
pub struct SystemDict {
    fst: Map<MmapRegion>,
    payloads: Vec<Vec<PhraseEntry>>,
}

impl SystemDict {
    /// Map `[offset, offset+len)` of `file` and parse the packed dictionary.
    ///
    /// Validates the range against the file size, then magic, version,
    /// section lengths and checksum. Any failure returns an error without
    /// retaining the mapping (atomic open).
    pub fn open(file: &File, offset: u64, len: u64) -> Result<Self> {
        let meta = file.metadata().context("stat dictionary file")?;
        let end = offset
            .checked_add(len)
            .filter(|end| *end <= meta.len())
            .with_context(|| {
                format!(
                    "byte range {}+{} exceeds file size {}",
                    offset,
                    len,
                    meta.len()
                )
            })?;
        if len < HEADER_LEN as u64 {
            bail!("byte range too small for a dictionary header");
        }

        let mmap = Arc::new(unsafe { Mmap::map(file) }.context("mmap dictionary file")?);
        let start = offset as usize;
        let blob = &mmap[start..end as usize];

        let header = DictHeader::parse(&blob[..HEADER_LEN])?;
        if header.version != VERSION {
            bail!(
                "dictionary version mismatch: file has {}, engine expects {}",
                header.version,
                VERSION
            );
        }
        let fst_len = header.fst_len as usize;
        let pay_len = header.pay_len as usize;
        let body_len = fst_len
            .checked_add(pay_len)
            .filter(|body| HEADER_LEN + body == blob.len());
        if body_len.is_none() {
            bail!(
                "dictionary section lengths {}+{} do not match range length {}",
                fst_len,
                pay_len,
                blob.len()
            );
        }

        let body = &blob[HEADER_LEN..];
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(body);
        let crc = hasher.finalize();
        if crc != header.crc32 {
            bail!(
                "dictionary checksum mismatch: computed {:08x}, header says {:08x}",
                crc,
                header.crc32
            );
        }

        let payloads: Vec<Vec<PhraseEntry>> = bincode::deserialize(&body[fst_len..])
            .context("decode dictionary payload table")?;

        let fst_range = (start + HEADER_LEN)..(start + HEADER_LEN + fst_len);
        let fst = Map::new(MmapRegion {
            mmap,
            range: fst_range,
        })
        .context("load dictionary key index")?;

        tracing::debug!(
            keys = fst.len(),
            payloads = payloads.len(),
            "system dictionary loaded"
        );
        Ok(Self { fst, payloads })
    }

    /// Entries for an exact key, best frequency first (the builder sorts).
    pub fn get(&self, key: &str) -> Option<&[PhraseEntry]> {
        let idx = self.fst.get(key)? as usize;
        self.payloads.get(idx).map(|v| v.as_slice())
    }

    /// Keys starting with `key`, excluding the exact match, capped at
    /// `limit`. This is what surfaces "ni'hao" while the user has only
    /// typed "ni" or "ni'h".
    pub fn search_prefix(&self, key: &str, limit: usize) -> Vec<(String, &[PhraseEntry])> {
        let mut out = Vec::new();
        let matcher = Str::new(key).starts_with();
        let mut stream = self.fst.search(matcher).into_stream();
        while let Some((k, idx)) = stream.next() {
            if out.len() >= limit {
                break;
            }
            if k == key.as_bytes() {
                continue;
            }
            if let (Ok(k), Some(entries)) = (std::str::from_utf8(k), self.payloads.get(idx as usize))
            {
                out.push((k.to_string(), entries.as_slice()));
            }
        }
        out
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.fst.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fst.is_empty()
    }
}

/// Assembles packed dictionary blobs from `(key, hanzi, freq)` triples.
/// Used by the `pack_dict` tool and by tests.
#[derive(Debug, Default)]
pub struct DictBuilder {
    entries: BTreeMap<String, Vec<PhraseEntry>>,
}

impl DictBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one phrase under an apostrophe-joined syllable key.
    pub fn push<K: Into<String>, H: Into<String>>(&mut self, key: K, hanzi: H, freq: u32) {
        self.entries.entry(key.into()).or_default().push(PhraseEntry {
            hanzi: hanzi.into(),
            freq,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize to a complete blob. Keys land in the fst in sorted order
    /// (the BTreeMap guarantees that), entries per key sorted by descending
    /// frequency.
    pub fn build(mut self) -> Result<Vec<u8>> {
        let mut fst_builder = MapBuilder::memory();
        let mut payloads: Vec<Vec<PhraseEntry>> = Vec::with_capacity(self.entries.len());

        for (key, mut entries) in std::mem::take(&mut self.entries) {
            entries.sort_by(|a, b| b.freq.cmp(&a.freq).then_with(|| a.hanzi.cmp(&b.hanzi)));
            fst_builder
                .insert(&key, payloads.len() as u64)
                .with_context(|| format!("index key {:?}", key))?;
            payloads.push(entries);
        }

        let fst_bytes = fst_builder.into_inner().context("finish key index")?;
        let pay_bytes = bincode::serialize(&payloads).context("encode payload table")?;

        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&fst_bytes);
        hasher.update(&pay_bytes);

        let header = DictHeader {
            version: VERSION,
            fst_len: fst_bytes.len() as u32,
            pay_len: pay_bytes.len() as u32,
            crc32: hasher.finalize(),
        };

        let mut out = Vec::with_capacity(HEADER_LEN + fst_bytes.len() + pay_bytes.len());
        header.write_to(&mut out);
        out.extend_from_slice(&fst_bytes);
        out.extend_from_slice(&pay_bytes);
        Ok(out)
    }

    /// Build and write the blob to `path`.
    pub fn write_to_file<P: AsRef<std::path::Path>>(self, path: P) -> Result<()> {
        let blob = self.build()?;
        let mut f = File::create(path.as_ref())
            .with_context(|| format!("create {}", path.as_ref().display()))?;
        f.write_all(&blob)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_blob() -> Vec<u8> {
        let mut b = DictBuilder::new();
        b.push("ni", "你", 100);
        b.push("ni", "尼", 40);
        b.push("hao", "好", 100);
        b.push("ni'hao", "你好", 200);
        b.build().unwrap()
    }

    fn write_temp(bytes: &[u8], tag: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "sysdict_{}_{}.dat",
            tag,
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn roundtrip_exact_lookup() {
        let blob = demo_blob();
        let path = write_temp(&blob, "roundtrip");
        let file = File::open(&path).unwrap();
        let dict = SystemDict::open(&file, 0, blob.len() as u64).unwrap();

        let ni = dict.get("ni").unwrap();
        assert_eq!(ni[0].hanzi, "你");
        assert_eq!(ni[0].freq, 100);
        assert_eq!(ni[1].hanzi, "尼");
        assert_eq!(dict.get("ni'hao").unwrap()[0].hanzi, "你好");
        assert!(dict.get("bu").is_none());
        assert_eq!(dict.len(), 3);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn blob_embedded_at_offset() {
        let blob = demo_blob();
        let mut bytes = vec![0xAAu8; 37];
        bytes.extend_from_slice(&blob);
        bytes.extend_from_slice(&[0xBB; 11]);
        let path = write_temp(&bytes, "offset");
        let file = File::open(&path).unwrap();

        let dict = SystemDict::open(&file, 37, blob.len() as u64).unwrap();
        assert!(dict.get("hao").is_some());

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn prefix_search_excludes_exact() {
        let blob = demo_blob();
        let path = write_temp(&blob, "prefix");
        let file = File::open(&path).unwrap();
        let dict = SystemDict::open(&file, 0, blob.len() as u64).unwrap();

        let hits = dict.search_prefix("ni", 8);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, "ni'hao");
        assert!(dict.search_prefix("zzz", 8).is_empty());

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn corrupt_blobs_are_rejected() {
        let blob = demo_blob();

        // bad magic
        let mut bad = blob.clone();
        bad[0] = b'X';
        let path = write_temp(&bad, "magic");
        let file = File::open(&path).unwrap();
        assert!(SystemDict::open(&file, 0, bad.len() as u64).is_err());
        let _ = std::fs::remove_file(path);

        // flipped payload bit fails the checksum
        let mut bad = blob.clone();
        let last = bad.len() - 1;
        bad[last] ^= 0xFF;
        let path = write_temp(&bad, "crc");
        let file = File::open(&path).unwrap();
        assert!(SystemDict::open(&file, 0, bad.len() as u64).is_err());
        let _ = std::fs::remove_file(path);

        // range beyond end of file
        let path = write_temp(&blob, "range");
        let file = File::open(&path).unwrap();
        assert!(SystemDict::open(&file, 0, blob.len() as u64 + 1).is_err());
        assert!(SystemDict::open(&file, 5, blob.len() as u64).is_err());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn version_mismatch_rejected() {
        let mut blob = demo_blob();
        blob[4] = 9; // version field
        let path = write_temp(&blob, "version");
        let file = File::open(&path).unwrap();
        let err = SystemDict::open(&file, 0, blob.len() as u64).unwrap_err();
        assert!(err.to_string().contains("version"));
        let _ = std::fs::remove_file(path);
    }
}
