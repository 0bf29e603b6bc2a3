//! Persistent user dictionary.
//!
//! A redb database owned exclusively by the engine while the decoder is
//! open. Every `choose` reinforces the picked (pinyin key, hanzi) pair;
//! counts feed back into ranking so the engine adapts to the user.
//!
//! Storage model: one table mapping `"<key>\u{1}<hanzi>"` to a u64 count.
//! The `\u{1}` separator never occurs in pinyin keys or hanzi, so a range
//! scan over `"<key>\u{1}".."<key>\u{2}"` yields exactly the entries for one
//! key.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use redb::{Database, ReadableTable, TableDefinition};

const TABLE: TableDefinition<&str, u64> = TableDefinition::new("user_phrases");

const SEP: char = '\u{1}';
const SEP_END: char = '\u{2}';

/// Redb-backed user dictionary keyed by (pinyin key, hanzi).
pub struct UserDict {
    db: Database,
    path: PathBuf,
}

impl std::fmt::Debug for UserDict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserDict").field("path", &self.path).finish()
    }
}

impl UserDict {
    /// Create or open the database at `path`, creating parent directories
    /// as needed. Fails if the path is unwritable.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, redb::Error> {
        if let Some(parent) = path.as_ref().parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let db = Database::create(path.as_ref())?;
        Ok(Self {
            db,
            path: path.as_ref().to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn composite(key: &str, hanzi: &str) -> String {
        format!("{}{}{}", key, SEP, hanzi)
    }

    /// Increment the count for (key, hanzi) by 1, inserting on first use.
    pub fn learn(&self, key: &str, hanzi: &str) -> Result<(), redb::Error> {
        self.learn_with_count(key, hanzi, 1)
    }

    /// Increment by `delta`; used for imports and merges.
    pub fn learn_with_count(&self, key: &str, hanzi: &str, delta: u64) -> Result<(), redb::Error> {
        if delta == 0 {
            return Ok(());
        }
        let composite = Self::composite(key, hanzi);
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(TABLE)?;
            let current = table.get(composite.as_str())?.map(|v| v.value()).unwrap_or(0);
            table.insert(composite.as_str(), current.saturating_add(delta))?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Count for one (key, hanzi) pair; 0 when never chosen.
    pub fn count(&self, key: &str, hanzi: &str) -> Result<u64, redb::Error> {
        let composite = Self::composite(key, hanzi);
        let read_txn = self.db.begin_read()?;
        let table = match read_txn.open_table(TABLE) {
            Ok(t) => t,
            // table does not exist before the first learn
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        Ok(table.get(composite.as_str())?.map(|v| v.value()).unwrap_or(0))
    }

    /// All learned (hanzi, count) pairs for a pinyin key.
    pub fn lookup(&self, key: &str) -> Result<Vec<(String, u64)>, redb::Error> {
        let start = format!("{}{}", key, SEP);
        let end = format!("{}{}", key, SEP_END);
        let read_txn = self.db.begin_read()?;
        let table = match read_txn.open_table(TABLE) {
            Ok(t) => t,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut out = Vec::new();
        for item in table.range(start.as_str()..end.as_str())? {
            let (k, v) = item?;
            if let Some(hanzi) = k.value().strip_prefix(start.as_str()) {
                out.push((hanzi.to_string(), v.value()));
            }
        }
        Ok(out)
    }

    /// Snapshot of the full contents keyed by the composite string.
    pub fn snapshot(&self) -> Result<HashMap<String, u64>, redb::Error> {
        Ok(self.iter_all()?.into_iter().collect())
    }

    /// Every (pinyin key, hanzi, count) triple; used by the export tool.
    pub fn entries(&self) -> Result<Vec<(String, String, u64)>, redb::Error> {
        Ok(self
            .iter_all()?
            .into_iter()
            .filter_map(|(composite, count)| {
                composite
                    .split_once(SEP)
                    .map(|(key, hanzi)| (key.to_string(), hanzi.to_string(), count))
            })
            .collect())
    }

    fn iter_all(&self) -> Result<Vec<(String, u64)>, redb::Error> {
        let read_txn = self.db.begin_read()?;
        let table = match read_txn.open_table(TABLE) {
            Ok(t) => t,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut out = Vec::new();
        for item in table.iter()? {
            let (k, v) = item?;
            out.push((k.value().to_string(), v.value()));
        }
        Ok(out)
    }
}
