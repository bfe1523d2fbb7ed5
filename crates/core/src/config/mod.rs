//! Configuration loading: profiles, cache tunables and logging.

pub mod loader;
pub mod types;

pub use loader::{ConfigError, ConfigLoader, default_config_path};
pub use types::{
    CacheConfig, CacheSettings, LoggingConfig, PriorityConfig, ResolvedConfig,
    StatusConfig,
};
