//! Disk-backed vault with an optional `notify` watcher.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

use super::store::{FileMeta, FileStore, VaultEntry, VaultError, VaultEvent};
use super::walker::{VaultWalker, file_meta};

const EVENT_CAPACITY: usize = 4096;

/// How long the first half of a split rename waits for its partner.
const RENAME_WINDOW: Duration = Duration::from_millis(100);

pub struct FsVault {
    walker: VaultWalker,
    events: broadcast::Sender<VaultEvent>,
    watcher: Mutex<Option<RecommendedWatcher>>,
}

impl FsVault {
    /// Open a vault rooted at `root`.
    pub fn open(root: &Path) -> Result<Self, VaultError> {
        let walker = VaultWalker::new(root)?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self { walker, events, watcher: Mutex::new(None) })
    }

    pub fn root(&self) -> &Path {
        self.walker.root()
    }

    fn absolute(&self, path: &str) -> PathBuf {
        self.root().join(path)
    }

    /// Start emitting events for changes under the root. Calling it again
    /// while a watcher is running is a no-op.
    pub fn watch(&self) -> Result<(), VaultError> {
        let mut slot = self.watcher.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if slot.is_some() {
            return Ok(());
        }

        let (tx, rx) = mpsc::channel::<notify::Result<Event>>();
        let mut watcher = RecommendedWatcher::new(tx, Config::default())?;
        watcher.watch(self.root(), RecursiveMode::Recursive)?;

        // The thread exits once the watcher, and with it the sender, is dropped.
        let walker = self.walker.clone();
        let events = self.events.clone();
        thread::spawn(move || pump(&rx, &walker, &events));

        debug!("Watching vault at {}", self.root().display());
        *slot = Some(watcher);
        Ok(())
    }

    /// Stop the watcher if one is running.
    pub fn unwatch(&self) {
        let mut slot = self.watcher.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(mut watcher) = slot.take()
            && let Err(e) = watcher.unwatch(self.walker.root())
        {
            warn!("Failed to stop watching {}: {}", self.root().display(), e);
        }
    }
}

#[async_trait]
impl FileStore for FsVault {
    async fn read(&self, path: &str) -> Result<String, VaultError> {
        tokio::fs::read_to_string(self.absolute(path)).await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                VaultError::NotFound(path.to_string())
            } else {
                VaultError::Io { path: path.to_string(), source }
            }
        })
    }

    async fn list(&self) -> Result<Vec<FileMeta>, VaultError> {
        let walker = self.walker.clone();
        let root = self.root().display().to_string();
        tokio::task::spawn_blocking(move || walker.walk())
            .await
            .map_err(|e| VaultError::Io { path: root, source: std::io::Error::other(e) })?
            .map_err(VaultError::from)
    }

    fn stat(&self, path: &str) -> Option<VaultEntry> {
        let metadata = std::fs::metadata(self.absolute(path)).ok()?;
        if metadata.is_dir() {
            Some(VaultEntry::Folder { path: path.to_string() })
        } else {
            Some(VaultEntry::File(file_meta(path.to_string(), &metadata)))
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<VaultEvent> {
        self.events.subscribe()
    }
}

impl Drop for FsVault {
    fn drop(&mut self) {
        self.unwatch();
    }
}

/// Forward raw watcher events until the watcher goes away.
fn pump(
    rx: &mpsc::Receiver<notify::Result<Event>>,
    walker: &VaultWalker,
    events: &broadcast::Sender<VaultEvent>,
) {
    let mut renames = RenamePairer::default();
    loop {
        let mut ready = renames.expired(Instant::now());
        let disconnected = match rx.recv_timeout(RENAME_WINDOW) {
            Ok(Ok(event)) => {
                ready.extend(renames.push(event, Instant::now()));
                false
            }
            Ok(Err(e)) => {
                warn!("File watcher error: {}", e);
                false
            }
            Err(RecvTimeoutError::Timeout) => false,
            Err(RecvTimeoutError::Disconnected) => {
                ready.extend(renames.drain());
                true
            }
        };

        for event in ready {
            for vault_event in translate(walker, event) {
                // No receivers is fine: nobody is listening yet.
                let _ = events.send(vault_event);
            }
        }
        if disconnected {
            break;
        }
    }
    debug!("Vault watcher stopped");
}

/// Joins the halves of a rename that arrive as separate events.
///
/// inotify reports one rename as `From`, `To` and then `Both`, all carrying
/// the same tracker. Only the `Both` is passed on. A `From` whose partner
/// never shows up within [`RENAME_WINDOW`] is passed on as is, so the file
/// reads as deleted.
#[derive(Default)]
struct RenamePairer {
    pending: HashMap<usize, PendingRename>,
}

struct PendingRename {
    from: Event,
    to: Option<PathBuf>,
    since: Instant,
}

impl RenamePairer {
    /// Take in one raw event; returns the events ready to translate.
    fn push(&mut self, event: Event, now: Instant) -> Vec<Event> {
        let (EventKind::Modify(ModifyKind::Name(mode)), Some(tracker)) =
            (event.kind, event.attrs.tracker())
        else {
            return vec![event];
        };

        match mode {
            RenameMode::From => {
                self.pending.insert(tracker, PendingRename { from: event, to: None, since: now });
                Vec::new()
            }
            RenameMode::To => match self.pending.get_mut(&tracker) {
                Some(pending) => {
                    pending.to = event.paths.first().cloned();
                    Vec::new()
                }
                // Moved in from outside the watched tree.
                None => vec![event],
            },
            RenameMode::Both => {
                self.pending.remove(&tracker);
                vec![event]
            }
            _ => vec![event],
        }
    }

    /// Halves that waited longer than the window, oldest first.
    fn expired(&mut self, now: Instant) -> Vec<Event> {
        let stale: Vec<usize> = self
            .pending
            .iter()
            .filter(|(_, p)| now.duration_since(p.since) >= RENAME_WINDOW)
            .map(|(tracker, _)| *tracker)
            .collect();
        let mut stale: Vec<PendingRename> =
            stale.iter().filter_map(|t| self.pending.remove(t)).collect();
        stale.sort_by_key(|p| p.since);
        stale.into_iter().map(PendingRename::resolve).collect()
    }

    fn drain(&mut self) -> Vec<Event> {
        let mut rest: Vec<PendingRename> = self.pending.drain().map(|(_, p)| p).collect();
        rest.sort_by_key(|p| p.since);
        rest.into_iter().map(PendingRename::resolve).collect()
    }
}

impl PendingRename {
    /// The event to pass on when no `Both` arrived.
    fn resolve(self) -> Event {
        let Some(to) = self.to else {
            return self.from;
        };
        match self.from.paths.first().cloned() {
            Some(from) => Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
                .add_path(from)
                .add_path(to),
            None => self.from,
        }
    }
}

/// Map a raw `notify` event onto vault events.
fn translate(walker: &VaultWalker, event: Event) -> Vec<VaultEvent> {
    trace!("Raw watcher event: {:?}", event);
    let rel = |p: &PathBuf| walker.relative(p);

    match event.kind {
        EventKind::Create(kind) => event
            .paths
            .iter()
            .filter_map(|p| {
                let entry = entry_for(walker, p, rel(p)?, kind == CreateKind::Folder);
                Some(VaultEvent::Created(entry))
            })
            .collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            match (event.paths.first(), event.paths.get(1)) {
                (Some(from), Some(to)) => match (rel(from), rel(to)) {
                    (Some(old_path), Some(new_path)) => vec![VaultEvent::Renamed {
                        entry: entry_for(walker, to, new_path, to.is_dir()),
                        old_path,
                    }],
                    // Moved out of the vault or into a hidden folder.
                    (Some(old_path), None) => {
                        vec![VaultEvent::Deleted(removed_entry(old_path))]
                    }
                    (None, Some(new_path)) => {
                        vec![VaultEvent::Created(entry_for(walker, to, new_path, to.is_dir()))]
                    }
                    (None, None) => Vec::new(),
                },
                _ => Vec::new(),
            }
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => event
            .paths
            .iter()
            .filter_map(|p| Some(VaultEvent::Deleted(removed_entry(rel(p)?))))
            .collect(),
        EventKind::Modify(ModifyKind::Name(_)) => event
            .paths
            .iter()
            .filter_map(|p| {
                let entry = entry_for(walker, p, rel(p)?, p.is_dir());
                Some(VaultEvent::Created(entry))
            })
            .collect(),
        EventKind::Modify(_) => event
            .paths
            .iter()
            .filter(|p| p.is_file())
            .filter_map(|p| Some(VaultEvent::Modified(entry_for(walker, p, rel(p)?, false))))
            .collect(),
        EventKind::Remove(kind) => event
            .paths
            .iter()
            .filter_map(|p| {
                let path = rel(p)?;
                Some(VaultEvent::Deleted(if kind == RemoveKind::Folder {
                    VaultEntry::Folder { path }
                } else {
                    removed_entry(path)
                }))
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn entry_for(walker: &VaultWalker, abs: &Path, path: String, is_folder: bool) -> VaultEntry {
    if is_folder {
        return VaultEntry::Folder { path };
    }
    match std::fs::metadata(walker.root().join(&path)).or_else(|_| std::fs::metadata(abs)) {
        Ok(metadata) => VaultEntry::File(file_meta(path, &metadata)),
        Err(_) => removed_entry(path),
    }
}

/// A file entry for a path that no longer exists on disk.
fn removed_entry(path: String) -> VaultEntry {
    let now = Utc::now();
    VaultEntry::File(FileMeta { path, mtime: now, ctime: now, size: 0 })
}
