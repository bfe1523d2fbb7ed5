pub mod calendar;
pub mod notes;
pub mod stats;
pub mod tasks;
pub mod watch;

use std::sync::Arc;

use color_eyre::eyre::{Result, WrapErr};
use tasknotes_core::CacheManager;
use tasknotes_core::config::ResolvedConfig;
use tasknotes_core::vault::FsVault;
use tracing::debug;

/// Open the profile's vault and run a full cold scan over it.
pub async fn open_cache(rc: &ResolvedConfig) -> Result<(Arc<FsVault>, CacheManager)> {
    let vault = FsVault::open(&rc.vault_root)
        .wrap_err_with(|| format!("cannot open vault at {}", rc.vault_root.display()))?;
    let vault = Arc::new(vault);
    let cache = CacheManager::new(vault.clone(), rc.cache.clone());
    cache.initialize_cache().await.wrap_err("initial vault scan failed")?;
    debug!("Profile '{}' ready: {:?}", rc.active_profile, cache);
    Ok((vault, cache))
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
