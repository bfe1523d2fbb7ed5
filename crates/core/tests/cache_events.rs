use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tasknotes_core::cache::CacheManager;
use tasknotes_core::config::CacheConfig;
use tasknotes_core::events::{CacheEvent, CacheEventKind, SubscriberError};
use tasknotes_core::vault::{FileMeta, FileStore, MemoryVault, VaultEntry, VaultError, VaultEvent};
use tokio::sync::{Notify, broadcast};
use tokio::time::sleep;

const TASK: &str = "---\ntags: [task]\nstatus: open\ndue: 2024-03-10\n---\n";

type Recorded = Arc<Mutex<Vec<CacheEvent>>>;

/// Record every event the cache publishes, in order.
fn record_all(cache: &CacheManager) -> Recorded {
    let seen: Recorded = Arc::default();
    for kind in CacheEventKind::ALL {
        let seen = seen.clone();
        let _ = cache.subscribe(kind, move |event| {
            seen.lock().unwrap().push(event.clone());
            Ok(())
        });
    }
    seen
}

fn kinds(seen: &Recorded) -> Vec<CacheEventKind> {
    seen.lock().unwrap().iter().map(CacheEvent::kind).collect()
}

async fn started(files: &[(&str, &str)]) -> (Arc<MemoryVault>, CacheManager, Recorded) {
    let vault = Arc::new(MemoryVault::with_files(files.iter().copied()));
    let cache = CacheManager::new(vault.clone(), CacheConfig::default());
    cache.initialize_cache().await.unwrap();
    cache.start();
    let seen = record_all(&cache);
    (vault, cache, seen)
}

#[tokio::test(start_paused = true)]
async fn modify_burst_collapses_into_one_update() {
    let (vault, cache, seen) = started(&[("Tasks/a.md", TASK)]).await;
    let reads_before = vault.read_count("Tasks/a.md");

    for status in ["in-progress", "open", "in-progress", "done", "done"] {
        vault.write("Tasks/a.md", &format!("---\ntags: [task]\nstatus: {status}\n---\n"));
        sleep(Duration::from_millis(50)).await;
    }
    assert!(cache.has_pending_update("Tasks/a.md"));
    assert!(kinds(&seen).is_empty());

    sleep(Duration::from_millis(400)).await;

    assert_eq!(kinds(&seen), vec![CacheEventKind::FileUpdated]);
    assert_eq!(vault.read_count("Tasks/a.md"), reads_before + 1);
    assert_eq!(cache.tasks_by_status("done"), vec!["Tasks/a.md"]);
    assert!(!cache.has_pending_update("Tasks/a.md"));
}

#[tokio::test(start_paused = true)]
async fn create_then_delete_leaves_no_trace() {
    let (vault, cache, seen) = started(&[]).await;

    vault.write("Tasks/new.md", TASK);
    sleep(Duration::from_millis(100)).await;
    vault.remove("Tasks/new.md");
    sleep(Duration::from_millis(500)).await;

    assert_eq!(kinds(&seen), vec![CacheEventKind::FileDeleted]);
    assert!(!cache.is_tracked("Tasks/new.md"));
    assert_eq!(vault.read_count("Tasks/new.md"), 0);
}

#[tokio::test(start_paused = true)]
async fn create_then_modify_is_reported_as_added() {
    let (vault, cache, seen) = started(&[]).await;

    vault.write("Tasks/new.md", TASK);
    sleep(Duration::from_millis(100)).await;
    vault.write("Tasks/new.md", TASK);
    sleep(Duration::from_millis(500)).await;

    assert_eq!(kinds(&seen), vec![CacheEventKind::FileAdded]);
    assert_eq!(cache.tasks_by_date("2024-03-10"), vec!["Tasks/new.md"]);
}

#[tokio::test(start_paused = true)]
async fn rename_publishes_single_event() {
    let (vault, cache, seen) =
        started(&[("Notes/x.md", "---\ndateCreated: 2024-03-01\n---\n")]).await;

    vault.rename("Notes/x.md", "Notes/y.md").unwrap();
    sleep(Duration::from_millis(10)).await;

    assert_eq!(cache.notes_by_date("2024-03-01"), vec!["Notes/y.md"]);
    let events = seen.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![CacheEvent::FileRenamed { old_path: "Notes/x.md".into(), new_path: "Notes/y.md".into() }]
    );
}

#[tokio::test(start_paused = true)]
async fn rename_cancels_pending_update_of_old_path() {
    let (vault, cache, seen) = started(&[("Tasks/a.md", TASK)]).await;

    vault.write("Tasks/a.md", "---\ntags: [task]\nstatus: done\n---\n");
    sleep(Duration::from_millis(10)).await;
    assert!(cache.has_pending_update("Tasks/a.md"));

    vault.rename("Tasks/a.md", "Tasks/b.md").unwrap();
    sleep(Duration::from_millis(500)).await;

    assert_eq!(kinds(&seen), vec![CacheEventKind::FileRenamed]);
    assert!(!cache.is_tracked("Tasks/a.md"));
    assert_eq!(cache.tasks_by_status("done"), vec!["Tasks/b.md"]);
}

#[tokio::test(start_paused = true)]
async fn folder_events_are_ignored() {
    let (vault, _cache, seen) = started(&[]).await;

    vault.create_folder("Projects");
    sleep(Duration::from_millis(500)).await;

    assert!(kinds(&seen).is_empty());
}

#[tokio::test(start_paused = true)]
async fn destroyed_cache_stops_following_events() {
    let (vault, cache, seen) = started(&[]).await;
    cache.destroy();

    vault.write("Tasks/new.md", TASK);
    sleep(Duration::from_millis(500)).await;

    assert!(kinds(&seen).is_empty());
    assert!(!cache.is_tracked("Tasks/new.md"));
}

#[tokio::test]
async fn failing_subscriber_does_not_block_others() {
    let vault = Arc::new(MemoryVault::with_files([("a.md", "hello")]));
    let cache = CacheManager::new(vault, CacheConfig::default());
    let delivered = Arc::new(Mutex::new(0));

    let _failing = cache.subscribe(CacheEventKind::FileAdded, |_| Err(SubscriberError::new("boom")));
    let _panicking = cache.subscribe(CacheEventKind::FileAdded, |_| panic!("subscriber bug"));
    let counter = delivered.clone();
    let _ok = cache.subscribe(CacheEventKind::FileAdded, move |_| {
        *counter.lock().unwrap() += 1;
        Ok(())
    });

    cache.handle_file_add("a.md").await;
    cache.handle_file_add("a.md").await;

    assert_eq!(*delivered.lock().unwrap(), 2);
    assert_eq!(cache.cached_notes().len(), 1);
}

#[tokio::test]
async fn unsubscribed_callback_is_not_invoked() {
    let vault = Arc::new(MemoryVault::with_files([("a.md", "hello")]));
    let cache = CacheManager::new(vault, CacheConfig::default());
    let delivered = Arc::new(Mutex::new(0));

    let counter = delivered.clone();
    let sub = cache.subscribe(CacheEventKind::FileUpdated, move |_| {
        *counter.lock().unwrap() += 1;
        Ok(())
    });
    cache.handle_file_update("a.md").await;
    sub.unsubscribe();
    cache.handle_file_update("a.md").await;

    assert_eq!(*delivered.lock().unwrap(), 1);
    assert!(cache.bus().active_kinds().is_empty());
}

/// Store whose reads wait until the test releases them.
struct Gated {
    inner: MemoryVault,
    release: Notify,
}

#[async_trait]
impl FileStore for Gated {
    async fn read(&self, path: &str) -> Result<String, VaultError> {
        self.release.notified().await;
        self.inner.read(path).await
    }

    async fn list(&self) -> Result<Vec<FileMeta>, VaultError> {
        self.inner.list().await
    }

    fn stat(&self, path: &str) -> Option<VaultEntry> {
        self.inner.stat(path)
    }

    fn subscribe(&self) -> broadcast::Receiver<VaultEvent> {
        self.inner.subscribe()
    }
}

#[tokio::test]
async fn delete_during_update_read_publishes_only_delete() {
    let store = Arc::new(Gated {
        inner: MemoryVault::with_files([("Tasks/a.md", TASK)]),
        release: Notify::new(),
    });
    let cache = CacheManager::new(store.clone(), CacheConfig::default());
    let seen = record_all(&cache);

    tokio::join!(cache.handle_file_update("Tasks/a.md"), async {
        // Let the update reach its read first.
        tokio::task::yield_now().await;
        cache.handle_file_delete("Tasks/a.md");
        store.release.notify_one();
    });

    assert_eq!(kinds(&seen), vec![CacheEventKind::FileDeleted]);
    assert!(!cache.is_tracked("Tasks/a.md"));
    assert!(cache.cached_tasks().is_empty());
}
