//! Local key-value persistence for drafts.
//!
//! Values are plain strings. [`FileStore`] keeps everything in a single JSON
//! object on disk and writes it through on every change, so a draft saved
//! before a failing network call survives the process.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tempfile::NamedTempFile;

use crate::error::{MeetbookError, MeetbookResult};

/// String key-value store injected into the draft cache.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> MeetbookResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> MeetbookResult<()>;
    fn remove(&self, key: &str) -> MeetbookResult<()>;
    fn keys_with_prefix(&self, prefix: &str) -> MeetbookResult<Vec<String>>;
}

fn lock<T>(m: &Mutex<T>) -> MeetbookResult<MutexGuard<'_, T>> {
    m.lock()
        .map_err(|_| MeetbookError::Store("draft store lock poisoned".into()))
}

/// Volatile store, mostly for tests.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> MeetbookResult<Option<String>> {
        Ok(lock(&self.entries)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> MeetbookResult<()> {
        lock(&self.entries)?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> MeetbookResult<()> {
        lock(&self.entries)?.remove(key);
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> MeetbookResult<Vec<String>> {
        Ok(lock(&self.entries)?
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

/// JSON-file backed store.
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, starting empty if the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> MeetbookResult<Self> {
        let path = path.into();

        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content).map_err(|e| {
                    MeetbookError::Store(format!("{} is not a draft store: {}", path.display(), e))
                })?
            }
        } else {
            BTreeMap::new()
        };

        tracing::debug!(path = %path.display(), entries = entries.len(), "opened draft store");

        Ok(FileStore {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and release the store.
    pub fn close(self) -> MeetbookResult<()> {
        let entries = lock(&self.entries)?;
        write_atomic(&self.path, &entries)
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> MeetbookResult<()> {
        write_atomic(&self.path, entries)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> MeetbookResult<Option<String>> {
        Ok(lock(&self.entries)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> MeetbookResult<()> {
        let mut entries = lock(&self.entries)?;
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> MeetbookResult<()> {
        let mut entries = lock(&self.entries)?;
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> MeetbookResult<Vec<String>> {
        Ok(lock(&self.entries)?
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

/// Write the store via temp file + rename.
fn write_atomic(path: &Path, entries: &BTreeMap<String, String>) -> MeetbookResult<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir)?;

    let content = serde_json::to_vec_pretty(entries)
        .map_err(|e| MeetbookError::Store(e.to_string()))?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(&content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_basic_ops() {
        let store = MemoryStore::new();
        store.set("meeting:title:new", "Standup").unwrap();
        store.set("meeting:notes:new", "").unwrap();
        store.set("other", "x").unwrap();

        assert_eq!(store.get("meeting:title:new").unwrap().as_deref(), Some("Standup"));
        assert_eq!(
            store.keys_with_prefix("meeting:").unwrap(),
            vec!["meeting:notes:new".to_string(), "meeting:title:new".to_string()]
        );

        store.remove("meeting:title:new").unwrap();
        assert_eq!(store.get("meeting:title:new").unwrap(), None);
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("drafts.json");

        let store = FileStore::open(&path).unwrap();
        store.set("meeting:title:new", "Retro").unwrap();
        drop(store);

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("meeting:title:new").unwrap().as_deref(), Some("Retro"));

        reopened.remove("meeting:title:new").unwrap();
        reopened.close().unwrap();

        let again = FileStore::open(&path).unwrap();
        assert_eq!(again.get("meeting:title:new").unwrap(), None);
    }

    #[test]
    fn file_store_rejects_foreign_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drafts.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(FileStore::open(&path), Err(MeetbookError::Store(_))));
    }
}
