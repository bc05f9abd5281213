//! In-memory store backend.
//!
//! Keeps the whole tree in a `BTreeMap` keyed by normalized path, so the
//! children of a directory are a contiguous key range.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::error::{StoreError, StoreResult};
use super::path::{normalize_path, parent_path};
use super::{EntryKind, VirtualStore};

#[derive(Debug, Clone)]
enum Node {
    File(Vec<u8>),
    Directory,
}

/// Process-local store. Contents vanish with the process.
#[derive(Debug)]
pub struct MemoryStore {
    nodes: RwLock<BTreeMap<String, Node>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store containing only the root directory.
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert("/".to_string(), Node::Directory);
        Self {
            nodes: RwLock::new(nodes),
        }
    }

    /// Total number of files held, for diagnostics and tests.
    pub async fn file_count(&self) -> usize {
        self.nodes
            .read()
            .await
            .values()
            .filter(|n| matches!(n, Node::File(_)))
            .count()
    }
}

fn child_prefix(dir: &str) -> String {
    if dir == "/" {
        "/".to_string()
    } else {
        format!("{}/", dir)
    }
}

fn children<'a>(
    nodes: &'a BTreeMap<String, Node>,
    dir: &str,
) -> impl Iterator<Item = &'a str> + 'a {
    let prefix = child_prefix(dir);
    let len = prefix.len();
    nodes
        .range(prefix.clone()..)
        .take_while(move |(key, _)| key.starts_with(prefix.as_str()))
        .filter_map(move |(key, _)| {
            let rest = &key.as_str()[len..];
            (!rest.is_empty() && !rest.contains('/')).then_some(rest)
        })
}

fn require_directory(nodes: &BTreeMap<String, Node>, dir: &str) -> StoreResult<()> {
    match nodes.get(dir) {
        Some(Node::Directory) => Ok(()),
        Some(Node::File(_)) => Err(StoreError::NotADirectory(dir.to_string())),
        None => Err(StoreError::NotFound(dir.to_string())),
    }
}

#[async_trait]
impl VirtualStore for MemoryStore {
    async fn write(&self, path: &str, content: &[u8]) -> StoreResult<()> {
        let path = normalize_path(path)?;
        let mut nodes = self.nodes.write().await;

        require_directory(&nodes, parent_path(&path))?;
        if path == "/" || matches!(nodes.get(&path), Some(Node::Directory)) {
            return Err(StoreError::NotAFile(path));
        }

        nodes.insert(path, Node::File(content.to_vec()));
        Ok(())
    }

    async fn read(&self, path: &str) -> StoreResult<Vec<u8>> {
        let path = normalize_path(path)?;
        let nodes = self.nodes.read().await;

        match nodes.get(&path) {
            Some(Node::File(content)) => Ok(content.clone()),
            Some(Node::Directory) => Err(StoreError::NotAFile(path)),
            None => Err(StoreError::NotFound(path)),
        }
    }

    async fn list(&self, dir: &str) -> StoreResult<Vec<String>> {
        let dir = normalize_path(dir)?;
        let nodes = self.nodes.read().await;

        require_directory(&nodes, &dir)?;
        Ok(children(&nodes, &dir).map(str::to_string).collect())
    }

    async fn remove(&self, path: &str) -> StoreResult<()> {
        let path = normalize_path(path)?;
        if path == "/" {
            return Err(StoreError::InvalidPath {
                path,
                reason: "cannot remove the root directory",
            });
        }

        let mut nodes = self.nodes.write().await;
        match nodes.get(&path) {
            None => return Err(StoreError::NotFound(path)),
            Some(Node::Directory) if children(&nodes, &path).next().is_some() => {
                return Err(StoreError::DirectoryNotEmpty(path));
            }
            Some(_) => {}
        }

        nodes.remove(&path);
        Ok(())
    }

    async fn make_directory(&self, path: &str, recursive: bool) -> StoreResult<()> {
        let path = normalize_path(path)?;
        let mut nodes = self.nodes.write().await;

        if !recursive {
            if nodes.contains_key(&path) {
                return Err(StoreError::AlreadyExists(path));
            }
            require_directory(&nodes, parent_path(&path))?;
            nodes.insert(path, Node::Directory);
            return Ok(());
        }

        let mut current = String::new();
        for component in path.split('/').filter(|c| !c.is_empty()) {
            current.push('/');
            current.push_str(component);
            match nodes.get(&current) {
                Some(Node::Directory) => {}
                Some(Node::File(_)) => return Err(StoreError::NotADirectory(current)),
                None => {
                    nodes.insert(current.clone(), Node::Directory);
                }
            }
        }
        Ok(())
    }

    async fn kind(&self, path: &str) -> StoreResult<EntryKind> {
        let path = normalize_path(path)?;
        match self.nodes.read().await.get(&path) {
            Some(Node::File(_)) => Ok(EntryKind::File),
            Some(Node::Directory) => Ok(EntryKind::Directory),
            None => Err(StoreError::NotFound(path)),
        }
    }
}
