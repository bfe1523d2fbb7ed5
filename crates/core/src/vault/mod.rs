//! Vault access: the file store trait and its implementations.
//!
//! The cache never touches the disk directly. It reads through a
//! [`FileStore`] and reacts to the [`VaultEvent`]s the store emits.

pub mod fs;
pub mod memory;
pub mod store;
pub mod walker;

pub use fs::FsVault;
pub use memory::MemoryVault;
pub use store::{FileMeta, FileStore, VaultEntry, VaultError, VaultEvent, is_markdown_path};
pub use walker::{VaultWalker, VaultWalkerError};
