//! In-memory vault.
//!
//! Holds file contents in a map and emits the same events a disk-backed
//! vault would. Useful for embedding the cache in a host that owns its own
//! storage, and for exercising the cache deterministically.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use super::store::{FileMeta, FileStore, VaultEntry, VaultError, VaultEvent, is_markdown_path};

const EVENT_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
struct MemFile {
    content: String,
    mtime: DateTime<Utc>,
    ctime: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct MemState {
    files: BTreeMap<String, MemFile>,
    folders: BTreeSet<String>,
    failing: BTreeSet<String>,
    reads: HashMap<String, usize>,
}

pub struct MemoryVault {
    state: Mutex<MemState>,
    events: broadcast::Sender<VaultEvent>,
}

impl Default for MemoryVault {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryVault {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { state: Mutex::new(MemState::default()), events }
    }

    /// Seed files without emitting events.
    pub fn with_files<I, P, C>(files: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<String>,
        C: Into<String>,
    {
        let vault = Self::new();
        {
            let mut state = vault.lock();
            let now = Utc::now();
            for (path, content) in files {
                state.files.insert(
                    path.into(),
                    MemFile { content: content.into(), mtime: now, ctime: now },
                );
            }
        }
        vault
    }

    /// Create or overwrite a file, emitting `Created` or `Modified`.
    pub fn write(&self, path: &str, content: &str) {
        let event = {
            let mut state = self.lock();
            let now = Utc::now();
            let existed = state.files.contains_key(path);
            let file = state
                .files
                .entry(path.to_string())
                .or_insert_with(|| MemFile { content: String::new(), mtime: now, ctime: now });
            file.content = content.to_string();
            file.mtime = now;
            let entry = VaultEntry::File(meta(path, file));
            if existed { VaultEvent::Modified(entry) } else { VaultEvent::Created(entry) }
        };
        self.emit(event);
    }

    /// Delete a file, emitting `Deleted`. Missing files are ignored.
    pub fn remove(&self, path: &str) {
        let removed = self.lock().files.remove(path);
        if let Some(file) = removed {
            self.emit(VaultEvent::Deleted(VaultEntry::File(meta(path, &file))));
        }
    }

    /// Move a file, emitting a single `Renamed`.
    pub fn rename(&self, old_path: &str, new_path: &str) -> Result<(), VaultError> {
        let event = {
            let mut state = self.lock();
            let file = state
                .files
                .remove(old_path)
                .ok_or_else(|| VaultError::NotFound(old_path.to_string()))?;
            let entry = VaultEntry::File(meta(new_path, &file));
            state.files.insert(new_path.to_string(), file);
            VaultEvent::Renamed { entry, old_path: old_path.to_string() }
        };
        self.emit(event);
        Ok(())
    }

    /// Create a folder, emitting `Created` with a folder entry.
    pub fn create_folder(&self, path: &str) {
        self.lock().folders.insert(path.to_string());
        self.emit(VaultEvent::Created(VaultEntry::Folder { path: path.to_string() }));
    }

    /// Make every read of `path` fail until cleared.
    pub fn set_read_failure(&self, path: &str, fail: bool) {
        let mut state = self.lock();
        if fail {
            state.failing.insert(path.to_string());
        } else {
            state.failing.remove(path);
        }
    }

    /// Number of reads served for `path` so far.
    pub fn read_count(&self, path: &str) -> usize {
        self.lock().reads.get(path).copied().unwrap_or(0)
    }

    /// Send an arbitrary event without touching the stored files.
    pub fn emit(&self, event: VaultEvent) {
        // No receivers is fine: nobody is listening yet.
        let _ = self.events.send(event);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemState> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl FileStore for MemoryVault {
    async fn read(&self, path: &str) -> Result<String, VaultError> {
        let mut state = self.lock();
        *state.reads.entry(path.to_string()).or_default() += 1;
        if state.failing.contains(path) {
            return Err(VaultError::Io {
                path: path.to_string(),
                source: std::io::Error::other("injected read failure"),
            });
        }
        state
            .files
            .get(path)
            .map(|f| f.content.clone())
            .ok_or_else(|| VaultError::NotFound(path.to_string()))
    }

    async fn list(&self) -> Result<Vec<FileMeta>, VaultError> {
        Ok(self
            .lock()
            .files
            .iter()
            .filter(|(path, _)| is_markdown_path(path))
            .map(|(path, file)| meta(path, file))
            .collect())
    }

    fn stat(&self, path: &str) -> Option<VaultEntry> {
        let state = self.lock();
        if let Some(file) = state.files.get(path) {
            return Some(VaultEntry::File(meta(path, file)));
        }
        state.folders.contains(path).then(|| VaultEntry::Folder { path: path.to_string() })
    }

    fn subscribe(&self) -> broadcast::Receiver<VaultEvent> {
        self.events.subscribe()
    }
}

fn meta(path: &str, file: &MemFile) -> FileMeta {
    FileMeta {
        path: path.to_string(),
        mtime: file.mtime,
        ctime: file.ctime,
        size: file.content.len() as u64,
    }
}
