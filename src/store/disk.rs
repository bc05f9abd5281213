//! Durable store backend on the host filesystem.
//!
//! The virtual tree lives under `<data_dir>/tree`. Writes are staged in
//! `<data_dir>/staging` and renamed into place, so readers only ever see
//! complete files.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::error::{StoreError, StoreResult};
use super::path::{normalize_path, parent_path};
use super::{EntryKind, VirtualStore};

const TREE_DIR: &str = "tree";
const STAGING_DIR: &str = "staging";

/// Store backed by a data directory. Reopening the same directory sees the
/// same contents.
#[derive(Debug, Clone)]
pub struct DiskStore {
    tree: PathBuf,
    staging: PathBuf,
}

impl DiskStore {
    /// Open (creating if needed) the store rooted at `data_dir`.
    pub async fn open(data_dir: impl AsRef<Path>) -> StoreResult<Self> {
        let data_dir = data_dir.as_ref();
        let tree = data_dir.join(TREE_DIR);
        let staging = data_dir.join(STAGING_DIR);

        let display = data_dir.display().to_string();
        fs::create_dir_all(&tree)
            .await
            .map_err(|e| StoreError::from_io(&display, e))?;
        fs::create_dir_all(&staging)
            .await
            .map_err(|e| StoreError::from_io(&display, e))?;

        // Leftovers from writes interrupted by a crash are never visible.
        if let Ok(mut entries) = fs::read_dir(&staging).await {
            while let Ok(Some(entry)) = entries.next_entry().await {
                let _ = fs::remove_file(entry.path()).await;
            }
        }

        Ok(Self { tree, staging })
    }

    fn host_path(&self, normalized: &str) -> PathBuf {
        self.tree.join(normalized.trim_start_matches('/'))
    }

    async fn kind_of(&self, normalized: &str) -> StoreResult<EntryKind> {
        let meta = fs::metadata(self.host_path(normalized))
            .await
            .map_err(|e| StoreError::from_io(normalized, e))?;
        Ok(if meta.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        })
    }

    async fn require_directory(&self, normalized: &str) -> StoreResult<()> {
        match self.kind_of(normalized).await? {
            EntryKind::Directory => Ok(()),
            EntryKind::File => Err(StoreError::NotADirectory(normalized.to_string())),
        }
    }
}

#[async_trait]
impl VirtualStore for DiskStore {
    async fn write(&self, path: &str, content: &[u8]) -> StoreResult<()> {
        let path = normalize_path(path)?;
        self.require_directory(parent_path(&path)).await?;

        match self.kind_of(&path).await {
            Ok(EntryKind::Directory) => return Err(StoreError::NotAFile(path)),
            Ok(EntryKind::File) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        let staged = self
            .staging
            .join(format!("{}.partial", uuid::Uuid::new_v4()));
        fs::write(&staged, content)
            .await
            .map_err(|e| StoreError::from_io(&path, e))?;

        if let Err(e) = fs::rename(&staged, self.host_path(&path)).await {
            let _ = fs::remove_file(&staged).await;
            return Err(StoreError::from_io(&path, e));
        }
        Ok(())
    }

    async fn read(&self, path: &str) -> StoreResult<Vec<u8>> {
        let path = normalize_path(path)?;
        if self.kind_of(&path).await? == EntryKind::Directory {
            return Err(StoreError::NotAFile(path));
        }
        fs::read(self.host_path(&path))
            .await
            .map_err(|e| StoreError::from_io(&path, e))
    }

    async fn list(&self, dir: &str) -> StoreResult<Vec<String>> {
        let dir = normalize_path(dir)?;
        self.require_directory(&dir).await?;

        let mut entries = fs::read_dir(self.host_path(&dir))
            .await
            .map_err(|e| StoreError::from_io(&dir, e))?;

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::from_io(&dir, e))?
        {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    async fn remove(&self, path: &str) -> StoreResult<()> {
        let path = normalize_path(path)?;
        if path == "/" {
            return Err(StoreError::InvalidPath {
                path,
                reason: "cannot remove the root directory",
            });
        }

        let host = self.host_path(&path);
        match self.kind_of(&path).await? {
            EntryKind::File => fs::remove_file(&host)
                .await
                .map_err(|e| StoreError::from_io(&path, e)),
            EntryKind::Directory => {
                let mut entries = fs::read_dir(&host)
                    .await
                    .map_err(|e| StoreError::from_io(&path, e))?;
                let has_entries = entries
                    .next_entry()
                    .await
                    .map_err(|e| StoreError::from_io(&path, e))?
                    .is_some();
                if has_entries {
                    return Err(StoreError::DirectoryNotEmpty(path));
                }
                fs::remove_dir(&host)
                    .await
                    .map_err(|e| StoreError::from_io(&path, e))
            }
        }
    }

    async fn make_directory(&self, path: &str, recursive: bool) -> StoreResult<()> {
        let path = normalize_path(path)?;
        let existing = match self.kind_of(&path).await {
            Ok(kind) => Some(kind),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e),
        };

        if !recursive {
            if existing.is_some() {
                return Err(StoreError::AlreadyExists(path));
            }
            self.require_directory(parent_path(&path)).await?;
            return fs::create_dir(self.host_path(&path))
                .await
                .map_err(|e| StoreError::from_io(&path, e));
        }

        match existing {
            Some(EntryKind::Directory) => Ok(()),
            Some(EntryKind::File) => Err(StoreError::NotADirectory(path)),
            None => fs::create_dir_all(self.host_path(&path))
                .await
                .map_err(|e| StoreError::from_io(&path, e)),
        }
    }

    async fn kind(&self, path: &str) -> StoreResult<EntryKind> {
        let path = normalize_path(path)?;
        self.kind_of(&path).await
    }
}
