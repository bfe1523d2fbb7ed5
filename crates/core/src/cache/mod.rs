//! In-memory cache and index layer over a vault.
//!
//! [`CacheManager`] turns raw file text into task and note records, keeps
//! secondary indexes over them, follows store change events, and publishes
//! [`CacheEvent`]s on its [`ChangeBus`].
//!
//! All state sits behind one mutex that is never held across an `.await`.
//! Every mutation therefore happens in a short synchronous section between
//! I/O suspension points, and index invariants hold whenever the lock is
//! released.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tasknotes_core::cache::CacheManager;
//! use tasknotes_core::config::CacheConfig;
//! use tasknotes_core::events::CacheEventKind;
//! use tasknotes_core::vault::MemoryVault;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let vault = Arc::new(MemoryVault::with_files([(
//!     "Tasks/a.md",
//!     "---\ntags: [task]\ndue: 2024-03-10\n---\n",
//! )]));
//! let cache = CacheManager::new(vault, CacheConfig::default());
//! cache.start();
//! cache.initialize_cache().await?;
//!
//! let _sub = cache.subscribe(CacheEventKind::FileUpdated, |event| {
//!     println!("{event:?}");
//!     Ok(())
//! });
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod calendar;
pub mod content;
pub mod documents;
pub mod indexes;
pub mod stats;

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::NaiveDate;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub use calendar::{CalendarData, DayTasks};
pub use indexes::{BucketIndex, SecondaryIndexes, daily_note_date, date_key};
pub use stats::CacheStats;

use self::batch::in_batches;
use self::content::ContentCache;
use self::documents::{DocumentCache, Extracted};
use self::stats::Counters;
use crate::config::CacheConfig;
use crate::events::adapter;
use crate::events::{
    CacheEvent, CacheEventKind, ChangeBus, Debouncer, SubscriberError, Subscription,
};
use crate::frontmatter::Frontmatter;
use crate::records::{
    IndexedFileEntry, NoteRecord, Record, TaskRecord, note_from_frontmatter,
    task_from_frontmatter,
};
use crate::vault::{FileMeta, FileStore, VaultEntry, VaultError};

/// Snapshot of the invalidation counters for one path. A load started
/// under one epoch may only be committed under the same epoch.
type Epoch = (u64, u64);

struct State {
    config: CacheConfig,
    content: ContentCache,
    documents: DocumentCache,
    tasks: HashMap<String, Arc<TaskRecord>>,
    notes: HashMap<String, Arc<NoteRecord>>,
    files: HashMap<String, IndexedFileEntry>,
    indexes: SecondaryIndexes,
    /// Deleted paths. Lookups return nothing until the path is revived.
    tombstones: HashSet<String>,
    epochs: HashMap<String, u64>,
    generation: u64,
    counters: Counters,
}

impl State {
    fn new(config: CacheConfig) -> Self {
        let settings = &config.settings;
        Self {
            content: ContentCache::new(settings.content_ttl(), settings.max_content_entries),
            documents: DocumentCache::new(settings.document_ttl()),
            config,
            tasks: HashMap::new(),
            notes: HashMap::new(),
            files: HashMap::new(),
            indexes: SecondaryIndexes::default(),
            tombstones: HashSet::new(),
            epochs: HashMap::new(),
            generation: 0,
            counters: Counters::default(),
        }
    }

    fn epoch(&self, path: &str) -> Epoch {
        (self.generation, self.epochs.get(path).copied().unwrap_or(0))
    }

    fn invalidate(&mut self, path: &str) {
        *self.epochs.entry(path.to_string()).or_default() += 1;
    }

    fn clear_entry(&mut self, path: &str) {
        self.content.remove(path);
        self.documents.remove(path);
        self.tasks.remove(path);
        self.notes.remove(path);
        self.files.remove(path);
        self.indexes.forget(path);
        self.invalidate(path);
    }

    fn store_task(&mut self, path: &str, task: Arc<TaskRecord>) {
        self.notes.remove(path);
        self.indexes.update_task_indexes(path, &task);
        if let Some(file) = self.files.get_mut(path) {
            file.is_task = true;
            file.record = Some(Record::Task(task.clone()));
        }
        self.tasks.insert(path.to_string(), task);
        self.counters.cache_misses += 1;
    }

    fn store_note(&mut self, path: &str, note: Arc<NoteRecord>) {
        self.tasks.remove(path);
        self.indexes.update_note_indexes(path, &note);
        if let Some(file) = self.files.get_mut(path) {
            file.is_task = false;
            file.record = Some(Record::Note(note.clone()));
        }
        self.notes.insert(path.to_string(), note);
        self.counters.cache_misses += 1;
    }

    fn drop_records(&mut self, path: &str) {
        self.tasks.remove(path);
        self.notes.remove(path);
        self.indexes.remove_from_indexes(path);
    }

    fn drop_all_records(&mut self) {
        self.tasks.clear();
        self.notes.clear();
        for file in self.files.values_mut() {
            file.record = None;
        }
        let daily_notes = std::mem::take(&mut self.indexes.daily_notes);
        self.indexes = SecondaryIndexes { daily_notes, ..SecondaryIndexes::default() };
        self.generation += 1;
    }

    fn clear_all(&mut self) {
        self.content.clear();
        self.documents.clear();
        self.tasks.clear();
        self.notes.clear();
        self.files.clear();
        self.indexes.clear();
        self.tombstones.clear();
        self.epochs.clear();
        self.generation += 1;
    }

    fn is_tombstoned(&self, path: &str) -> bool {
        self.tombstones.contains(path)
    }
}

/// A file read and parsed, waiting to be committed to the cache.
struct Prepared {
    meta: FileMeta,
    epoch: Epoch,
    extracted: Extracted,
}

struct Inner {
    store: Arc<dyn FileStore>,
    bus: ChangeBus,
    debouncer: Debouncer,
    state: Mutex<State>,
    adapter: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(handle) =
            self.adapter.get_mut().unwrap_or_else(PoisonError::into_inner).take()
        {
            handle.abort();
        }
        self.debouncer.cancel_all();
    }
}

/// Handle to the cache. Cloning is cheap and clones share state.
#[derive(Clone)]
pub struct CacheManager {
    inner: Arc<Inner>,
}

/// Non-owning handle held by background tasks.
#[derive(Clone)]
pub(crate) struct WeakCacheManager(Weak<Inner>);

impl WeakCacheManager {
    pub(crate) fn upgrade(&self) -> Option<CacheManager> {
        self.0.upgrade().map(|inner| CacheManager { inner })
    }
}

impl std::fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats();
        f.debug_struct("CacheManager")
            .field("tasks_cached", &stats.tasks_cached)
            .field("notes_cached", &stats.notes_cached)
            .field("files_cached", &stats.files_cached)
            .finish()
    }
}

impl CacheManager {
    /// Create a cache over `store`. Call [`CacheManager::start`] to follow
    /// store events and [`CacheManager::initialize_cache`] for a cold scan.
    pub fn new(store: Arc<dyn FileStore>, config: CacheConfig) -> Self {
        Self::with_bus(store, config, ChangeBus::new())
    }

    /// Create a cache that publishes on an existing bus.
    pub fn with_bus(store: Arc<dyn FileStore>, config: CacheConfig, bus: ChangeBus) -> Self {
        let config = config.normalized();
        let debouncer = Debouncer::new(config.settings.debounce());
        Self {
            inner: Arc::new(Inner {
                store,
                bus,
                debouncer,
                state: Mutex::new(State::new(config)),
                adapter: Mutex::new(None),
            }),
        }
    }

    /// Start consuming store events. Calling it again while running is a
    /// no-op. Must be called from within a tokio runtime.
    pub fn start(&self) {
        let mut slot = self.inner.adapter.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }
        let events = self.inner.store.subscribe();
        *slot = Some(adapter::spawn(self.downgrade(), events));
        debug!("Cache is following vault events");
    }

    /// Stop following events and drop every cache entry, index and
    /// subscriber. Safe to call more than once.
    pub fn destroy(&self) {
        if let Some(handle) =
            self.inner.adapter.lock().unwrap_or_else(PoisonError::into_inner).take()
        {
            handle.abort();
        }
        self.inner.debouncer.cancel_all();
        self.state().clear_all();
        self.inner.bus.clear();
        debug!("Cache destroyed");
    }

    pub fn bus(&self) -> &ChangeBus {
        &self.inner.bus
    }

    pub fn subscribe<F>(&self, kind: CacheEventKind, callback: F) -> Subscription
    where
        F: Fn(&CacheEvent) -> Result<(), SubscriberError> + Send + Sync + 'static,
    {
        self.inner.bus.subscribe(kind, callback)
    }

    pub fn config(&self) -> CacheConfig {
        self.state().config.clone()
    }

    /// Swap the configuration.
    ///
    /// A changed field mapping drops every cached record (they were built
    /// with the old keys); indexed file entries survive, so the next bulk
    /// query reloads tasks lazily. Classification is not re-decided until a
    /// file is re-indexed.
    pub fn update_config(&self, config: CacheConfig) {
        let config = config.normalized();
        let settings = config.settings.clone();
        self.inner.debouncer.set_delay(settings.debounce());
        let mut state = self.state();
        state.content.reconfigure(settings.content_ttl(), settings.max_content_entries);
        state.documents.set_ttl(settings.document_ttl());
        if state.config.field_mapping != config.field_mapping {
            debug!("Field mapping changed, dropping cached records");
            state.drop_all_records();
        }
        state.config = config;
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.state();
        CacheStats::from_counters(
            state.counters,
            state.tasks.len(),
            state.notes.len(),
            state.content.len(),
        )
    }

    // ---- content and frontmatter -------------------------------------

    /// Text of a markdown file, from cache when fresh.
    ///
    /// Returns `None` for folders, non-markdown files and failed reads.
    pub async fn get_content(&self, path: &str, force_refresh: bool) -> Option<String> {
        let Some(VaultEntry::File(meta)) = self.inner.store.stat(path) else {
            return None;
        };
        if !meta.is_markdown() {
            return None;
        }

        let epoch = {
            let mut state = self.state();
            if !force_refresh && let Some(content) = state.content.get_fresh(path, Instant::now())
            {
                state.counters.cache_hits += 1;
                return Some(content);
            }
            state.epoch(path)
        };

        let content = match self.inner.store.read(path).await {
            Ok(content) => content,
            Err(e) => {
                warn!("Error reading file {}: {}", path, e);
                return None;
            }
        };

        let mut state = self.state();
        state.counters.file_reads += 1;
        if state.epoch(path) == epoch {
            state.content.insert(path, content.clone(), Instant::now());
        }
        Some(content)
    }

    /// Parsed frontmatter of `content`, cached under `cache_key`.
    pub fn extract_frontmatter(&self, content: &str, cache_key: &str) -> Option<Arc<Frontmatter>> {
        self.extract(content, cache_key).document()
    }

    fn extract(&self, content: &str, cache_key: &str) -> Extracted {
        let mut state = self.state();
        let extracted = state.documents.extract(content, cache_key, Instant::now());
        if matches!(extracted, Extracted::Parsed(_)) {
            state.counters.yaml_parses += 1;
        }
        extracted
    }

    // ---- records -------------------------------------------------------

    /// Task record for `path`. Files without the task tag yield `None`.
    pub async fn get_task_info(&self, path: &str, force_refresh: bool) -> Option<Arc<TaskRecord>> {
        let epoch = {
            let mut state = self.state();
            if state.is_tombstoned(path) {
                return None;
            }
            if !force_refresh && let Some(task) = state.tasks.get(path).cloned() {
                state.counters.cache_hits += 1;
                return Some(task);
            }
            state.epoch(path)
        };

        let content = self.get_content(path, force_refresh).await?;
        let document = self.extract_frontmatter(&content, path)?;

        let mut state = self.state();
        if state.epoch(path) != epoch || state.is_tombstoned(path) {
            debug!("Discarding stale task load for {}", path);
            return None;
        }
        if !document.has_tag(&state.config.task_tag) {
            return None;
        }
        let task = Arc::new(task_from_frontmatter(&document, path, &state.config.field_mapping));
        state.store_task(path, task.clone());
        Some(task)
    }

    /// Note record for `path`. Task files yield `None`.
    pub async fn get_note_info(&self, path: &str, force_refresh: bool) -> Option<Arc<NoteRecord>> {
        let epoch = {
            let mut state = self.state();
            if state.is_tombstoned(path) {
                return None;
            }
            if !force_refresh && let Some(note) = state.notes.get(path).cloned() {
                state.counters.cache_hits += 1;
                return Some(note);
            }
            state.epoch(path)
        };

        let content = self.get_content(path, force_refresh).await?;
        let extracted = self.extract(&content, path);
        if extracted.is_invalid() {
            return None;
        }
        let meta = self.inner.store.stat(path).and_then(|e| e.as_file().cloned());

        let mut state = self.state();
        if state.epoch(path) != epoch || state.is_tombstoned(path) {
            debug!("Discarding stale note load for {}", path);
            return None;
        }
        let document = extracted.document();
        if document.as_ref().is_some_and(|d| d.has_tag(&state.config.task_tag)) {
            return None;
        }
        let note = Arc::new(note_from_frontmatter(
            document.as_deref(),
            path,
            meta.as_ref(),
            &state.config.field_mapping,
        ));
        state.store_note(path, note.clone());
        Some(note)
    }

    // ---- indexing ------------------------------------------------------

    /// Re-read and re-index one file.
    ///
    /// Skips non-markdown and excluded paths. Returns whether the file was
    /// indexed.
    pub async fn index_file(&self, path: &str) -> bool {
        match self.prepare(path).await {
            Some(prepared) => self.commit(&mut self.state(), path, prepared),
            None => false,
        }
    }

    async fn prepare(&self, path: &str) -> Option<Prepared> {
        let meta = match self.inner.store.stat(path) {
            Some(VaultEntry::File(meta)) if meta.is_markdown() => meta,
            _ => return None,
        };

        let epoch = {
            let mut state = self.state();
            if state.config.is_excluded(path) {
                debug!("Skipping excluded file {}", path);
                return None;
            }
            state.tombstones.remove(path);
            state.epoch(path)
        };

        let content = self.get_content(path, true).await?;
        let extracted = self.extract(&content, path);
        Some(Prepared { meta, epoch, extracted })
    }

    fn commit(&self, state: &mut State, path: &str, prepared: Prepared) -> bool {
        let Prepared { meta, epoch, extracted } = prepared;
        if state.epoch(path) != epoch || state.is_tombstoned(path) {
            debug!("Discarding stale index pass for {}", path);
            return false;
        }

        let document = extracted.document();
        let is_task = document.as_ref().is_some_and(|d| d.has_tag(&state.config.task_tag));
        state.files.insert(
            path.to_string(),
            IndexedFileEntry {
                path: path.to_string(),
                mtime: meta.mtime,
                ctime: meta.ctime,
                tags: document.as_ref().map(|d| d.tags()).unwrap_or_default(),
                is_task,
                record: None,
            },
        );

        let mapping = &state.config.field_mapping;
        match document {
            Some(doc) if is_task => {
                let task = task_from_frontmatter(&doc, path, mapping);
                state.store_task(path, Arc::new(task));
            }
            _ if extracted.is_invalid() => state.drop_records(path),
            doc => {
                let note = note_from_frontmatter(doc.as_deref(), path, Some(&meta), mapping);
                state.store_note(path, Arc::new(note));
            }
        }

        let folder = state.config.daily_notes_folder.clone();
        state.indexes.update_daily_note(path, &folder);
        true
    }

    /// Full cold scan. Clears everything first, so it can be re-run.
    pub async fn initialize_cache(&self) -> Result<(), VaultError> {
        let started = Instant::now();
        self.clear_all_caches();

        let files = self.inner.store.list().await?;
        let batch_size = self.state().config.settings.init_batch_size;
        let paths: Vec<String> = files.into_iter().map(|m| m.path).collect();
        let total = paths.len();
        in_batches(paths, batch_size, |path| async move { self.index_file(&path).await }).await;

        let (task_count, note_count) = {
            let state = self.state();
            (state.tasks.len(), state.notes.len())
        };
        let duration = started.elapsed();
        info!(
            "Cache initialised: {} files, {} tasks, {} notes in {:?}",
            total, task_count, note_count, duration
        );
        self.inner.bus.publish(&CacheEvent::CacheInitialized {
            task_count,
            note_count,
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        });
        Ok(())
    }

    /// Forget everything cached for `path`.
    pub fn clear_cache_entry(&self, path: &str) {
        self.state().clear_entry(path);
    }

    pub fn clear_all_caches(&self) {
        self.state().clear_all();
    }

    // ---- event handlers ------------------------------------------------

    /// Re-index a modified file and publish `FileUpdated`.
    ///
    /// Nothing is published when the file was deleted while it was being
    /// read.
    pub async fn handle_file_update(&self, path: &str) {
        if !self.index_file(path).await {
            let mut state = self.state();
            if state.is_tombstoned(path) {
                debug!("Dropping update for deleted file {}", path);
                return;
            }
            state.clear_entry(path);
        }
        self.inner.bus.publish(&CacheEvent::FileUpdated { path: path.to_string() });
    }

    /// Index a new file and publish `FileAdded`.
    pub async fn handle_file_add(&self, path: &str) {
        self.index_file(path).await;
        self.inner.bus.publish(&CacheEvent::FileAdded { path: path.to_string() });
    }

    /// Drop every trace of a deleted file and publish `FileDeleted`.
    pub fn handle_file_delete(&self, path: &str) {
        self.inner.debouncer.cancel(path);
        {
            let mut state = self.state();
            state.clear_entry(path);
            state.tombstones.insert(path.to_string());
        }
        debug!("Removed {} from cache", path);
        self.inner.bus.publish(&CacheEvent::FileDeleted { path: path.to_string() });
    }

    /// Move a file's cache state from `old_path` to `new_path` and publish a
    /// single `FileRenamed`.
    ///
    /// The new path is read before the old one is dropped, and both happen
    /// in one section, so queries never see both paths or neither.
    pub async fn handle_file_rename(&self, old_path: &str, new_path: &str) {
        self.inner.debouncer.cancel(old_path);
        self.inner.debouncer.cancel(new_path);

        if old_path == new_path {
            self.index_file(new_path).await;
        } else {
            let prepared = self.prepare(new_path).await;
            let mut state = self.state();
            state.clear_entry(old_path);
            state.tombstones.insert(old_path.to_string());
            if let Some(prepared) = prepared {
                self.commit(&mut state, new_path, prepared);
            }
        }

        debug!("Renamed {} -> {} in cache", old_path, new_path);
        self.inner.bus.publish(&CacheEvent::FileRenamed {
            old_path: old_path.to_string(),
            new_path: new_path.to_string(),
        });
    }

    // ---- queries -------------------------------------------------------

    /// Every task record, sorted by path.
    ///
    /// `date` is accepted but not used for filtering: callers filter by
    /// date themselves (see [`TaskRecord::is_due_on`]). When no task is
    /// cached yet, task-classified indexed files are loaded in bounded
    /// batches.
    pub async fn get_tasks_for_date(
        &self,
        _date: NaiveDate,
        force_refresh: bool,
    ) -> Vec<Arc<TaskRecord>> {
        let (mut cached, to_load, batch_size) = {
            let state = self.state();
            if state.tasks.is_empty() {
                let mut paths: Vec<String> = state
                    .files
                    .values()
                    .filter(|f| f.is_task)
                    .map(|f| f.path.clone())
                    .collect();
                paths.sort();
                (Vec::new(), paths, state.config.settings.task_batch_size)
            } else {
                (state.tasks.values().cloned().collect::<Vec<_>>(), Vec::new(), 0)
            }
        };

        if !to_load.is_empty() {
            cached = in_batches(to_load, batch_size, |path| async move {
                self.get_task_info(&path, force_refresh).await
            })
            .await
            .into_iter()
            .flatten()
            .collect();
        }
        cached.sort_by(|a, b| a.path.cmp(&b.path));
        cached
    }

    /// Tasks whose due date falls on `date`.
    pub async fn get_tasks_due_on_date(&self, date: NaiveDate) -> Vec<Arc<TaskRecord>> {
        let key = date.format("%Y-%m-%d").to_string();
        let (paths, batch_size) = {
            let state = self.state();
            (state.indexes.tasks_by_date.get(&key), state.config.settings.task_batch_size)
        };
        in_batches(paths, batch_size, |path| async move { self.get_task_info(&path, false).await })
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    /// Notes created on `date`.
    pub async fn get_notes_for_date(
        &self,
        date: NaiveDate,
        force_refresh: bool,
    ) -> Vec<Arc<NoteRecord>> {
        let key = date.format("%Y-%m-%d").to_string();
        let (paths, batch_size) = {
            let state = self.state();
            (state.indexes.notes_by_date.get(&key), state.config.settings.note_batch_size)
        };
        in_batches(paths, batch_size, |path| async move {
            self.get_note_info(&path, force_refresh).await
        })
        .await
        .into_iter()
        .flatten()
        .collect()
    }

    /// Per-day counts for a month (`month` is 1-based). Reads only what is
    /// already cached.
    pub fn get_calendar_data(&self, year: i32, month: u32) -> CalendarData {
        let state = self.state();
        calendar::aggregate(year, month, &state.indexes, &state.tasks, &state.config)
    }

    pub fn tasks_by_status(&self, status: &str) -> Vec<String> {
        self.state().indexes.tasks_by_status.get(status)
    }

    pub fn tasks_by_priority(&self, priority: &str) -> Vec<String> {
        self.state().indexes.tasks_by_priority.get(priority)
    }

    pub fn tasks_by_date(&self, date: &str) -> Vec<String> {
        date_key(date).map(|key| self.state().indexes.tasks_by_date.get(&key)).unwrap_or_default()
    }

    pub fn notes_by_date(&self, date: &str) -> Vec<String> {
        date_key(date).map(|key| self.state().indexes.notes_by_date.get(&key)).unwrap_or_default()
    }

    /// `(date, path)` for every daily note, sorted by date.
    pub fn daily_notes(&self) -> Vec<(String, String)> {
        let state = self.state();
        let mut notes: Vec<(String, String)> = state
            .indexes
            .daily_notes
            .buckets()
            .flat_map(|(date, paths)| paths.iter().map(move |p| (date.to_string(), p.clone())))
            .collect();
        notes.sort();
        notes
    }

    pub fn indexed_file(&self, path: &str) -> Option<IndexedFileEntry> {
        self.state().files.get(path).cloned()
    }

    /// Copy of all secondary indexes.
    pub fn index_snapshot(&self) -> SecondaryIndexes {
        self.state().indexes.clone()
    }

    /// Cached task records without loading anything.
    pub fn cached_tasks(&self) -> Vec<Arc<TaskRecord>> {
        let mut tasks: Vec<_> = self.state().tasks.values().cloned().collect();
        tasks.sort_by(|a, b| a.path.cmp(&b.path));
        tasks
    }

    /// Cached note records without loading anything.
    pub fn cached_notes(&self) -> Vec<Arc<NoteRecord>> {
        let mut notes: Vec<_> = self.state().notes.values().cloned().collect();
        notes.sort_by(|a, b| a.path.cmp(&b.path));
        notes
    }

    /// Whether any cache map or index still references `path`.
    pub fn is_tracked(&self, path: &str) -> bool {
        let state = self.state();
        state.content.contains(path)
            || state.documents.contains(path)
            || state.tasks.contains_key(path)
            || state.notes.contains_key(path)
            || state.files.contains_key(path)
            || state.indexes.contains(path)
    }

    /// Whether a debounced re-index is waiting for `path`.
    pub fn has_pending_update(&self, path: &str) -> bool {
        self.inner.debouncer.is_pending(path)
    }

    pub(crate) fn debouncer(&self) -> &Debouncer {
        &self.inner.debouncer
    }

    fn downgrade(&self) -> WeakCacheManager {
        WeakCacheManager(Arc::downgrade(&self.inner))
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
