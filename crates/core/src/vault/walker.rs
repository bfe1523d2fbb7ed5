//! Recursive vault directory walker.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use thiserror::Error;
use walkdir::WalkDir;

use super::store::{FileMeta, is_markdown_path};

#[derive(Debug, Error)]
pub enum VaultWalkerError {
    #[error("vault root does not exist: {0}")]
    MissingRoot(String),

    #[error("failed to walk vault directory {0}: {1}")]
    WalkError(String, #[source] walkdir::Error),

    #[error("failed to read file metadata {0}: {1}")]
    MetadataError(String, #[source] std::io::Error),
}

/// Walker for discovering markdown files in a vault.
#[derive(Debug, Clone)]
pub struct VaultWalker {
    root: PathBuf,
}

impl VaultWalker {
    /// Create a new walker for the given vault root.
    pub fn new(root: &Path) -> Result<Self, VaultWalkerError> {
        let root = root
            .canonicalize()
            .map_err(|_| VaultWalkerError::MissingRoot(root.display().to_string()))?;
        Ok(Self { root })
    }

    /// Walk the vault and return all markdown files, sorted by path.
    /// Hidden entries and common non-vault directories are skipped.
    pub fn walk(&self) -> Result<Vec<FileMeta>, VaultWalkerError> {
        let mut files = Vec::new();

        for entry in WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0 || !is_ignored_name(&e.file_name().to_string_lossy())
            })
        {
            let entry = entry.map_err(|e| {
                VaultWalkerError::WalkError(self.root.display().to_string(), e)
            })?;

            if !entry.file_type().is_file() {
                continue;
            }
            let Some(relative) = self.relative(entry.path()) else {
                continue;
            };
            if !is_markdown_path(&relative) {
                continue;
            }

            let metadata = entry.metadata().map_err(|e| {
                VaultWalkerError::MetadataError(
                    entry.path().display().to_string(),
                    std::io::Error::other(e),
                )
            })?;
            files.push(file_meta(relative, &metadata));
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    /// Vault-relative `/`-separated path for an absolute path under the root.
    /// Returns `None` for paths outside the vault or inside ignored folders.
    pub fn relative(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> =
            rel.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect();
        if parts.is_empty() || parts.iter().any(|p| is_ignored_name(p)) {
            return None;
        }
        Some(parts.join("/"))
    }

    /// Get the vault root path.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

pub(crate) fn file_meta(path: String, metadata: &std::fs::Metadata) -> FileMeta {
    let mtime = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
    let ctime = metadata.created().unwrap_or(mtime);
    FileMeta {
        path,
        mtime: DateTime::<Utc>::from(mtime),
        ctime: DateTime::<Utc>::from(ctime),
        size: metadata.len(),
    }
}

fn is_ignored_name(name: &str) -> bool {
    name.starts_with('.') || matches!(name, "node_modules" | "target" | "__pycache__" | "venv")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_vault() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        fs::write(root.join("note1.md"), "# Note 1").unwrap();
        fs::write(root.join("note2.md"), "# Note 2").unwrap();

        fs::create_dir(root.join("subdir")).unwrap();
        fs::write(root.join("subdir/note3.md"), "# Note 3").unwrap();

        // Hidden directory (should be skipped)
        fs::create_dir(root.join(".obsidian")).unwrap();
        fs::write(root.join(".obsidian/workspace.md"), "# Secret").unwrap();

        // Non-markdown file (should be skipped)
        fs::write(root.join("readme.txt"), "Not markdown").unwrap();

        dir
    }

    #[test]
    fn test_walk_finds_markdown_files() {
        let vault = create_test_vault();
        let walker = VaultWalker::new(vault.path()).unwrap();
        let paths: Vec<_> = walker.walk().unwrap().into_iter().map(|f| f.path).collect();

        assert_eq!(paths, vec!["note1.md", "note2.md", "subdir/note3.md"]);
    }

    #[test]
    fn test_walk_records_metadata() {
        let vault = create_test_vault();
        let walker = VaultWalker::new(vault.path()).unwrap();
        let files = walker.walk().unwrap();

        assert_eq!(files[0].size, "# Note 1".len() as u64);
        assert!(files[0].mtime > DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn test_relative_rejects_hidden_and_outside_paths() {
        let vault = create_test_vault();
        let walker = VaultWalker::new(vault.path()).unwrap();

        assert_eq!(
            walker.relative(&walker.root().join("subdir/note3.md")).as_deref(),
            Some("subdir/note3.md")
        );
        assert!(walker.relative(&walker.root().join(".obsidian/workspace.md")).is_none());
        assert!(walker.relative(Path::new("/somewhere/else.md")).is_none());
    }

    #[test]
    fn test_missing_root() {
        let result = VaultWalker::new(Path::new("/nonexistent/path"));
        assert!(matches!(result.unwrap_err(), VaultWalkerError::MissingRoot(_)));
    }
}
