//! Drives the cache from store change events.
//!
//! Creates and modifies are debounced per path. Deletes and renames are
//! applied immediately and cancel any pending re-index for the paths they
//! touch. Folder events are ignored.

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use super::debounce::PendingKind;
use crate::cache::{CacheManager, WeakCacheManager};
use crate::vault::VaultEvent;

/// Spawn the adapter task. It stops when the channel closes, when the cache
/// is dropped, or when the returned handle is aborted.
pub(crate) fn spawn(
    cache: WeakCacheManager,
    mut events: broadcast::Receiver<VaultEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    warn!("File event adapter lagged behind, {} events dropped", skipped);
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            let Some(manager) = cache.upgrade() else {
                break;
            };
            dispatch(&manager, &cache, event).await;
        }
        debug!("File event adapter stopped");
    })
}

async fn dispatch(manager: &CacheManager, weak: &WeakCacheManager, event: VaultEvent) {
    if event.entry().as_file().is_none() {
        trace!("Ignoring folder event for {}", event.entry().path());
        return;
    }

    match event {
        VaultEvent::Created(entry) => schedule(manager, weak, entry.path(), PendingKind::Create),
        VaultEvent::Modified(entry) => schedule(manager, weak, entry.path(), PendingKind::Modify),
        VaultEvent::Deleted(entry) => manager.handle_file_delete(entry.path()),
        VaultEvent::Renamed { entry, old_path } => {
            manager.handle_file_rename(&old_path, entry.path()).await;
        }
    }
}

fn schedule(manager: &CacheManager, weak: &WeakCacheManager, path: &str, kind: PendingKind) {
    let weak = weak.clone();
    manager.debouncer().schedule(path, kind, move |path, kind| async move {
        let Some(manager) = weak.upgrade() else {
            return;
        };
        match kind {
            PendingKind::Create => manager.handle_file_add(&path).await,
            PendingKind::Modify => manager.handle_file_update(&path).await,
        }
    });
}
