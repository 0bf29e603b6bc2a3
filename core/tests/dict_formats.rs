//! Packed system dictionary and user dictionary storage tests: byte-range
//! embedding, corruption rejection, and persistence across reopen.

use std::fs::File;
use std::path::PathBuf;

use pinyin_ime_core::{DictBuilder, SystemDict, UserDict};

fn unique(tag: &str, ext: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "dictfmt_{}_{}.{}",
        tag,
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos(),
        ext
    ))
}

fn sample_blob() -> Vec<u8> {
    let mut b = DictBuilder::new();
    b.push("ni", "你", 100);
    b.push("ni", "尼", 40);
    b.push("hao", "好", 100);
    b.push("ni'hao", "你好", 200);
    b.push("ni'hao'ma", "你好吗", 30);
    b.build().unwrap()
}

#[test]
fn blob_embedded_mid_file_round_trips() {
    let path = unique("embed", "dat");
    let blob = sample_blob();

    // surround the blob with unrelated bytes; only the range matters
    let mut bytes = vec![0xA5u8; 123];
    bytes.extend_from_slice(&blob);
    bytes.extend_from_slice(&[0x5A; 57]);
    std::fs::write(&path, &bytes).unwrap();

    let file = File::open(&path).unwrap();
    let dict = SystemDict::open(&file, 123, blob.len() as u64).unwrap();

    let entries = dict.get("ni").unwrap();
    assert_eq!(entries.len(), 2);
    // within a key, higher frequency first
    assert_eq!(entries[0].hanzi, "你");
    assert_eq!(entries[0].freq, 100);
    assert_eq!(entries[1].hanzi, "尼");

    assert_eq!(dict.get("ni'hao").unwrap()[0].hanzi, "你好");
    assert!(dict.get("nonexistent").is_none());
    let _ = std::fs::remove_file(&path);
}

#[test]
fn prefix_search_excludes_exact_key() {
    let path = unique("prefix", "dat");
    let blob = sample_blob();
    std::fs::write(&path, &blob).unwrap();

    let file = File::open(&path).unwrap();
    let dict = SystemDict::open(&file, 0, blob.len() as u64).unwrap();

    let hits = dict.search_prefix("ni'hao", 8);
    let keys: Vec<&str> = hits.iter().map(|(k, _)| k.as_str()).collect();
    assert!(keys.contains(&"ni'hao'ma"));
    assert!(!keys.contains(&"ni'hao"));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn corrupted_body_is_rejected() {
    let path = unique("corrupt", "dat");
    let mut blob = sample_blob();
    let mid = blob.len() / 2;
    blob[mid] ^= 0xFF;
    std::fs::write(&path, &blob).unwrap();

    let file = File::open(&path).unwrap();
    assert!(SystemDict::open(&file, 0, blob.len() as u64).is_err());
    let _ = std::fs::remove_file(&path);
}

#[test]
fn bad_magic_is_rejected() {
    let path = unique("magic", "dat");
    let mut blob = sample_blob();
    blob[0] = b'X';
    std::fs::write(&path, &blob).unwrap();

    let file = File::open(&path).unwrap();
    assert!(SystemDict::open(&file, 0, blob.len() as u64).is_err());
    let _ = std::fs::remove_file(&path);
}

#[test]
fn range_outside_file_is_rejected() {
    let path = unique("range", "dat");
    let blob = sample_blob();
    std::fs::write(&path, &blob).unwrap();

    let file = File::open(&path).unwrap();
    // offset past EOF
    assert!(SystemDict::open(&file, blob.len() as u64 + 10, 100).is_err());
    // length overruns EOF
    assert!(SystemDict::open(&file, 0, blob.len() as u64 + 1).is_err());
    // range shorter than the header
    assert!(SystemDict::open(&file, 0, 4).is_err());
    let _ = std::fs::remove_file(&path);
}

#[test]
fn user_dict_persists_across_reopen() {
    let path = unique("persist", "redb");
    {
        let user = UserDict::open(&path).unwrap();
        user.learn("ni'hao", "你好").unwrap();
        user.learn("ni'hao", "你好").unwrap();
        user.learn_with_count("zhong'guo", "中国", 5).unwrap();
    }
    {
        let user = UserDict::open(&path).unwrap();
        assert_eq!(user.count("ni'hao", "你好").unwrap(), 2);
        assert_eq!(user.count("zhong'guo", "中国").unwrap(), 5);
        assert_eq!(user.count("zhong'guo", "中").unwrap(), 0);
    }
    let _ = std::fs::remove_file(&path);
}

#[test]
fn user_dict_lookup_is_key_scoped() {
    let path = unique("scope", "redb");
    let user = UserDict::open(&path).unwrap();
    user.learn("ni", "你").unwrap();
    user.learn("ni'hao", "你好").unwrap();
    user.learn("ning", "宁").unwrap();

    let hits = user.lookup("ni").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].0, "你");
    let _ = std::fs::remove_file(&path);
}

#[test]
fn user_dict_export_lists_everything() {
    let path = unique("export", "redb");
    let user = UserDict::open(&path).unwrap();
    user.learn("ni'hao", "你好").unwrap();
    user.learn_with_count("pin'yin", "拼音", 3).unwrap();

    let mut all = user.entries().unwrap();
    all.sort();
    assert_eq!(
        all,
        vec![
            ("ni'hao".to_string(), "你好".to_string(), 1),
            ("pin'yin".to_string(), "拼音".to_string(), 3),
        ]
    );
    let _ = std::fs::remove_file(&path);
}
