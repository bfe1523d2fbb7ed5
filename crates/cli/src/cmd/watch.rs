//! Watch command implementation.

use color_eyre::eyre::{Result, WrapErr};
use tasknotes_core::config::ResolvedConfig;
use tasknotes_core::events::{CacheEvent, CacheEventKind};
use tracing::info;

use super::open_cache;

pub async fn run(rc: &ResolvedConfig) -> Result<()> {
    let (vault, cache) = open_cache(rc).await?;
    let stats = cache.stats();
    info!(
        "Watching {} ({} tasks, {} notes). Press Ctrl-C to stop.",
        rc.vault_root.display(),
        stats.tasks_cached,
        stats.notes_cached
    );

    for kind in CacheEventKind::ALL {
        // Subscriptions live until destroy() clears the bus.
        let _ = cache.subscribe(kind, |event| {
            log_event(event);
            Ok(())
        });
    }

    vault.watch().wrap_err("failed to start file watcher")?;
    cache.start();

    tokio::signal::ctrl_c().await.wrap_err("failed to listen for Ctrl-C")?;

    vault.unwatch();
    cache.destroy();
    info!("Stopped watching");
    Ok(())
}

fn log_event(event: &CacheEvent) {
    match event {
        CacheEvent::CacheInitialized { task_count, note_count, duration_ms } => {
            info!("cache initialised: {task_count} tasks, {note_count} notes in {duration_ms}ms");
        }
        CacheEvent::FileUpdated { path } => info!("updated {path}"),
        CacheEvent::FileAdded { path } => info!("added {path}"),
        CacheEvent::FileDeleted { path } => info!("deleted {path}"),
        CacheEvent::FileRenamed { old_path, new_path } => {
            info!("renamed {old_path} -> {new_path}");
        }
    }
}
