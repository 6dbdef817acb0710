//! Locally persisted inbox state.
//!
//! The inbox keeps two id sets across restarts: posts the viewer archived and
//! posts currently favorited. They live in a small string key-value store
//! under fixed keys, each value being a JSON-encoded array of ids. The
//! on-disk backend is a single JSON object file.
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

pub const ARCHIVED_KEY: &str = "archivedPosts";
pub const FAVORITED_KEY: &str = "favoritedPosts";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("store encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Synchronous string key-value storage.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;
}

/// In-memory backend, used by tests and as a fallback.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// JSON object file backend. The whole file is rewritten on every `set`.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open the store at `path`. A missing file starts empty; an unreadable
    /// or corrupt one is logged and treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "Ignoring corrupt store file");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot read store file");
                BTreeMap::new()
            }
        };
        debug!(path = %path.display(), keys = entries.len(), "Opened store");
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StoreError> {
        let io_err = |source: io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let bytes = serde_json::to_vec_pretty(&self.entries)?;
        // write-then-rename so a crash never leaves a half-written file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, bytes).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        let previous = self.entries.insert(key.to_string(), value);
        if let Err(e) = self.flush() {
            match previous {
                Some(old) => self.entries.insert(key.to_string(), old),
                None => self.entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }
}

/// The archived and favorited id sets, backed by a [`KeyValueStore`].
///
/// Every mutation persists its set with a single write.
#[derive(Debug)]
pub struct ClientStore<S> {
    kv: S,
    archived: HashSet<String>,
    favorited: HashSet<String>,
}

impl<S: KeyValueStore> ClientStore<S> {
    pub fn load(kv: S) -> Self {
        let archived = read_set(&kv, ARCHIVED_KEY);
        let favorited = read_set(&kv, FAVORITED_KEY);
        debug!(
            archived = archived.len(),
            favorited = favorited.len(),
            "Loaded client store"
        );
        Self {
            kv,
            archived,
            favorited,
        }
    }

    pub fn backend(&self) -> &S {
        &self.kv
    }

    pub fn is_archived(&self, id: &str) -> bool {
        self.archived.contains(id)
    }

    pub fn archived(&self) -> &HashSet<String> {
        &self.archived
    }

    pub fn archive(&mut self, id: &str) -> Result<(), StoreError> {
        self.archive_all([id]).map(|_| ())
    }

    /// Union `ids` into the archived set. Returns how many were new.
    pub fn archive_all<I>(&mut self, ids: I) -> Result<usize, StoreError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut next = self.archived.clone();
        next.extend(ids.into_iter().map(Into::into));
        let added = next.len() - self.archived.len();
        write_set(&mut self.kv, ARCHIVED_KEY, &next)?;
        self.archived = next;
        Ok(added)
    }

    pub fn is_favorited(&self, id: &str) -> bool {
        self.favorited.contains(id)
    }

    pub fn favorited(&self) -> &HashSet<String> {
        &self.favorited
    }

    pub fn set_favorited(&mut self, id: &str, favorited: bool) -> Result<(), StoreError> {
        let mut next = self.favorited.clone();
        if favorited {
            next.insert(id.to_string());
        } else {
            next.remove(id);
        }
        self.replace_favorited(next)
    }

    /// Replace the favorited set with the server's view of it.
    pub fn reconcile_favorites<I>(&mut self, ids: I) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = String>,
    {
        self.replace_favorited(ids.into_iter().collect())
    }

    // the in-memory set only changes once the backend accepted it
    fn replace_favorited(&mut self, next: HashSet<String>) -> Result<(), StoreError> {
        write_set(&mut self.kv, FAVORITED_KEY, &next)?;
        self.favorited = next;
        Ok(())
    }
}

fn read_set<S: KeyValueStore>(kv: &S, key: &str) -> HashSet<String> {
    let Some(raw) = kv.get(key) else {
        return HashSet::new();
    };
    match serde_json::from_str::<Vec<String>>(&raw) {
        Ok(ids) => ids.into_iter().collect(),
        Err(e) => {
            warn!(key, error = %e, "Ignoring malformed stored id list");
            HashSet::new()
        }
    }
}

fn write_set<S: KeyValueStore>(
    kv: &mut S,
    key: &str,
    set: &HashSet<String>,
) -> Result<(), StoreError> {
    let mut ids: Vec<&String> = set.iter().collect();
    ids.sort();
    kv.set(key, serde_json::to_string(&ids)?)
}
