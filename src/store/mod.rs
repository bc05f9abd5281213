//! Virtual store: a hierarchical path → bytes namespace.
//!
//! All operations are keyed by absolute paths and are atomic only at the
//! granularity of a single path. Nothing here deletes recursively; callers
//! that need to drop a subtree walk it themselves.
//!
//! ```text
//! /
//! ├── internal/extensions/<id>/...   installed bundles
//! ├── backgrounds/                   theme categories
//! ├── logos/
//! └── icons/
//! ```

mod disk;
mod error;
mod memory;
pub mod path;

use async_trait::async_trait;

pub use disk::DiskStore;
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;

/// What lives at a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// Storage backend interface shared by the managers and the router.
#[async_trait]
pub trait VirtualStore: Send + Sync {
    /// Create or overwrite the file at `path`. The parent must exist.
    async fn write(&self, path: &str, content: &[u8]) -> StoreResult<()>;

    /// Read the whole file at `path`.
    async fn read(&self, path: &str) -> StoreResult<Vec<u8>>;

    /// Names of the entries directly inside `dir`, sorted.
    async fn list(&self, dir: &str) -> StoreResult<Vec<String>>;

    /// Remove a file or an empty directory.
    async fn remove(&self, path: &str) -> StoreResult<()>;

    /// Create a directory.
    ///
    /// Without `recursive` the parent must exist and an existing entry is
    /// reported as [`StoreError::AlreadyExists`]. With `recursive` missing
    /// ancestors are created and an existing directory is not an error.
    async fn make_directory(&self, path: &str, recursive: bool) -> StoreResult<()>;

    /// Kind of the entry at `path`.
    async fn kind(&self, path: &str) -> StoreResult<EntryKind>;
}

/// Create `path` and its ancestors, tolerating a directory that already exists.
pub async fn ensure_directory(store: &dyn VirtualStore, path: &str) -> StoreResult<()> {
    match store.make_directory(path, true).await {
        Err(e) if e.is_already_exists() => Ok(()),
        other => other,
    }
}
