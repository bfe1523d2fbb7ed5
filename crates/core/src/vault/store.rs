//! The file store abstraction the cache reads from and listens to.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::broadcast;

use super::walker::VaultWalkerError;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Walker(#[from] VaultWalkerError),

    #[error("failed to watch vault: {0}")]
    Watch(#[from] notify::Error),
}

/// Metadata of a regular file in the vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeta {
    /// Vault-relative path using `/` separators.
    pub path: String,
    pub mtime: DateTime<Utc>,
    pub ctime: DateTime<Utc>,
    pub size: u64,
}

impl FileMeta {
    pub fn is_markdown(&self) -> bool {
        is_markdown_path(&self.path)
    }
}

/// An entry returned by the store: either a regular file or a folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultEntry {
    File(FileMeta),
    Folder { path: String },
}

impl VaultEntry {
    pub fn path(&self) -> &str {
        match self {
            Self::File(meta) => &meta.path,
            Self::Folder { path } => path,
        }
    }

    /// The file metadata, or `None` for folders.
    pub fn as_file(&self) -> Option<&FileMeta> {
        match self {
            Self::File(meta) => Some(meta),
            Self::Folder { .. } => None,
        }
    }
}

/// Change notifications emitted by a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultEvent {
    Created(VaultEntry),
    Modified(VaultEntry),
    Deleted(VaultEntry),
    Renamed { entry: VaultEntry, old_path: String },
}

impl VaultEvent {
    pub fn entry(&self) -> &VaultEntry {
        match self {
            Self::Created(e) | Self::Modified(e) | Self::Deleted(e) => e,
            Self::Renamed { entry, .. } => entry,
        }
    }
}

/// A vault the cache can read from.
///
/// Implementations emit a [`VaultEvent`] for every change through the
/// channel returned by [`FileStore::subscribe`].
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Read the full text of a file.
    async fn read(&self, path: &str) -> Result<String, VaultError>;

    /// All markdown files currently in the vault.
    async fn list(&self) -> Result<Vec<FileMeta>, VaultError>;

    /// Look up a single entry.
    fn stat(&self, path: &str) -> Option<VaultEntry>;

    /// Subscribe to change events.
    fn subscribe(&self) -> broadcast::Receiver<VaultEvent>;
}

pub fn is_markdown_path(path: &str) -> bool {
    path.rsplit_once('.').is_some_and(|(stem, ext)| !stem.is_empty() && ext == "md")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_extension_check() {
        assert!(is_markdown_path("Tasks/a.md"));
        assert!(is_markdown_path("a.b.md"));
        assert!(!is_markdown_path("Tasks/a.MD"));
        assert!(!is_markdown_path("image.png"));
        assert!(!is_markdown_path("Tasks"));
    }
}
