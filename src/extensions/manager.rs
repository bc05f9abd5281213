//! Extension manager - installs bundles into namespaces and removes them.
//!
//! The manager is responsible for:
//! - Unpacking bundles before anything touches the store
//! - Creating the namespace directory tree and writing every entry
//! - Recursive, best-effort namespace removal
//! - Tracking the lifecycle state of each namespace

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;

use crate::bundle::{Bundle, BundleError, Unpacker};
use crate::config::InstallConfig;
use crate::store::path::{is_single_segment, join_path, parent_path};
use crate::store::{ensure_directory, EntryKind, StoreError, VirtualStore};

use super::error::{InstallError, InstallResult, RemoveError};
use super::state::{NamespaceState, NamespaceTable};

/// Store directory holding one subdirectory per installed extension.
pub const EXTENSIONS_ROOT: &str = "/internal/extensions";

/// Summary of a successful install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    pub id: String,
    pub name: String,
    pub files: usize,
    pub bytes: usize,
    pub checksum: String,
}

/// Summary of a successful removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoveReport {
    pub id: String,
    pub files: usize,
    pub directories: usize,
}

/// Installs and removes extension namespaces in a shared store.
pub struct ExtensionManager {
    store: Arc<dyn VirtualStore>,
    unpacker: Unpacker,
    namespaces: NamespaceTable,
    serialize: bool,
}

impl std::fmt::Debug for ExtensionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionManager")
            .field("max_bundle_size", &self.unpacker.max_size())
            .field("max_unpacked", &self.unpacker.max_unpacked())
            .field("serialize", &self.serialize)
            .finish()
    }
}

impl ExtensionManager {
    pub fn new(store: Arc<dyn VirtualStore>, config: &InstallConfig) -> Self {
        Self {
            store,
            unpacker: Unpacker::new(config.max_bundle_size)
                .with_max_unpacked(config.max_unpacked_size()),
            namespaces: NamespaceTable::default(),
            serialize: config.serialize_namespaces,
        }
    }

    pub fn store(&self) -> &Arc<dyn VirtualStore> {
        &self.store
    }

    /// Store path of the namespace for `id`.
    pub fn namespace_path(id: &str) -> String {
        join_path(EXTENSIONS_ROOT, id)
    }

    /// Current lifecycle state of `id`.
    pub async fn state(&self, id: &str) -> NamespaceState {
        self.namespaces.get(id).await
    }

    /// Mark every namespace already in the store as present.
    ///
    /// Run once at startup against a durable store.
    pub async fn recover(&self) -> usize {
        let ids = self.installed().await;
        for id in &ids {
            self.namespaces.set(id, NamespaceState::Present).await;
        }
        if !ids.is_empty() {
            tracing::info!("Recovered {} installed extension(s)", ids.len());
        }
        ids.len()
    }

    /// Ids of the namespaces currently in the store, sorted.
    pub async fn installed(&self) -> Vec<String> {
        match self.store.list(EXTENSIONS_ROOT).await {
            Ok(ids) => ids,
            Err(StoreError::NotFound(_)) => Vec::new(),
            Err(e) => {
                tracing::error!("Failed to list {}: {}", EXTENSIONS_ROOT, e);
                Vec::new()
            }
        }
    }

    /// Install raw bundle bytes, reporting only success.
    pub async fn install(&self, data: &[u8]) -> bool {
        match self.install_bundle_bytes(data).await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!("Extension install failed: {}", e);
                false
            }
        }
    }

    /// Unpack and install raw bundle bytes.
    ///
    /// Decoding happens off the async workers. Nothing is written when the
    /// bundle does not decode.
    pub async fn install_bundle_bytes(&self, data: &[u8]) -> InstallResult<InstallReport> {
        let unpacker = self.unpacker;
        let data = data.to_vec();
        let bundle = tokio::task::spawn_blocking(move || unpacker.unpack(&data))
            .await
            .map_err(|e| {
                BundleError::InvalidArchive(format!("bundle decoder stopped: {}", e))
            })??;

        self.install_bundle(bundle).await
    }

    /// Write an already decoded bundle into its namespace.
    ///
    /// Installing over a present namespace overwrites matching paths and
    /// keeps files the new bundle does not mention.
    pub async fn install_bundle(&self, bundle: Bundle) -> InstallResult<InstallReport> {
        if !self.serialize {
            return self.install_locked(bundle).await;
        }

        let id = bundle.id().to_string();
        let guard = self.namespaces.lock(&id).await;
        let result = self.install_locked(bundle).await;
        self.namespaces.release(&id, guard).await;
        result
    }

    async fn install_locked(&self, bundle: Bundle) -> InstallResult<InstallReport> {
        let id = bundle.id().to_string();
        self.namespaces
            .transition(&id, NamespaceState::Installing)
            .await;
        let namespace = Self::namespace_path(&id);
        let store = self.store.as_ref();

        if let Err(e) = ensure_directory(store, &namespace).await {
            tracing::error!("Failed to create {} for extension {}: {}", namespace, id, e);
            self.settle(&id, &namespace).await;
            return Err(InstallError::Prepare { id, source: e });
        }

        // Subdirectories in sorted order, so parents come first. A failure
        // here surfaces again as a failed write for the files beneath it.
        let directories: BTreeSet<String> = bundle
            .entries
            .iter()
            .map(|entry| parent_path(&join_path(&namespace, &entry.path)).to_string())
            .filter(|dir| dir != &namespace)
            .collect();
        for dir in &directories {
            if let Err(e) = ensure_directory(store, dir).await {
                tracing::error!("Failed to create {} for extension {}: {}", dir, id, e);
            }
        }

        let writes = bundle.entries.iter().map(|entry| {
            let path = join_path(&namespace, &entry.path);
            async move {
                let result = store.write(&path, &entry.content).await;
                (path, result)
            }
        });
        let results = join_all(writes).await;

        let total = results.len();
        let mut failed = 0;
        let mut first_error = None;
        for (path, result) in results {
            if let Err(e) = result {
                tracing::error!("Failed to write {} for extension {}: {}", path, id, e);
                failed += 1;
                first_error.get_or_insert(e);
            }
        }

        self.settle(&id, &namespace).await;

        if let Some(first) = first_error {
            return Err(InstallError::PartialWrite {
                id,
                failed,
                total,
                first,
            });
        }

        let report = InstallReport {
            name: bundle.manifest.display_name().to_string(),
            files: total,
            bytes: bundle.total_bytes(),
            checksum: bundle.checksum.clone(),
            id,
        };
        tracing::info!(
            "Installed extension {} ({} files, {} bytes)",
            report.id,
            report.files,
            report.bytes
        );
        Ok(report)
    }

    /// Present if the namespace directory exists, absent otherwise.
    async fn settle(&self, id: &str, namespace: &str) {
        let state = match self.store.kind(namespace).await {
            Ok(EntryKind::Directory) => NamespaceState::Present,
            _ => NamespaceState::Absent,
        };
        self.namespaces.set(id, state).await;
    }

    /// Remove a namespace, reporting only success.
    pub async fn remove(&self, id: &str) -> bool {
        match self.try_remove(id).await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!("Extension remove failed: {}", e);
                false
            }
        }
    }

    /// Remove every file and directory of a namespace, then the namespace
    /// directory itself.
    ///
    /// Individual deletions are best-effort. Any leftover keeps the
    /// namespace directory in place and the state at present.
    pub async fn try_remove(&self, id: &str) -> Result<RemoveReport, RemoveError> {
        if !is_single_segment(id) {
            return Err(RemoveError::InvalidId(id.to_string()));
        }
        if !self.serialize {
            return self.remove_locked(id).await;
        }

        let guard = self.namespaces.lock(id).await;
        let result = self.remove_locked(id).await;
        self.namespaces.release(id, guard).await;
        result
    }

    async fn remove_locked(&self, id: &str) -> Result<RemoveReport, RemoveError> {
        let prior = self.namespaces.transition(id, NamespaceState::Removing).await;
        let namespace = Self::namespace_path(id);

        let top = match self.store.list(&namespace).await {
            Ok(names) => names,
            Err(StoreError::NotFound(_)) => {
                self.namespaces.set(id, NamespaceState::Absent).await;
                return Err(RemoveError::NotInstalled(id.to_string()));
            }
            Err(e) => {
                tracing::error!("Failed to list {} for extension {}: {}", namespace, id, e);
                self.namespaces.set(id, prior).await;
                return Err(RemoveError::List {
                    id: id.to_string(),
                    source: e,
                });
            }
        };

        let sweep = self.remove_contents(id, &namespace, top).await;

        match self.store.remove(&namespace).await {
            Ok(()) => {
                self.namespaces.set(id, NamespaceState::Absent).await;
                tracing::info!(
                    "Removed extension {} ({} files, {} directories)",
                    id,
                    sweep.files,
                    sweep.directories
                );
                Ok(RemoveReport {
                    id: id.to_string(),
                    files: sweep.files,
                    directories: sweep.directories,
                })
            }
            Err(e) => {
                tracing::error!("Failed to remove {} for extension {}: {}", namespace, id, e);
                self.namespaces.set(id, NamespaceState::Present).await;
                Err(RemoveError::Incomplete {
                    id: id.to_string(),
                    failed: sweep.failed,
                    source: e,
                })
            }
        }
    }

    /// Delete everything under `namespace`. Files go concurrently, then
    /// directories deepest first.
    async fn remove_contents(&self, id: &str, namespace: &str, top: Vec<String>) -> Sweep {
        let store = self.store.as_ref();
        let mut sweep = Sweep::default();
        let mut files = Vec::new();
        let mut directories = Vec::new();
        let mut pending: Vec<String> = top.iter().map(|name| join_path(namespace, name)).collect();

        while let Some(path) = pending.pop() {
            match store.kind(&path).await {
                Ok(EntryKind::File) => files.push(path),
                Ok(EntryKind::Directory) => match store.list(&path).await {
                    Ok(children) => {
                        pending.extend(children.iter().map(|name| join_path(&path, name)));
                        directories.push(path);
                    }
                    Err(e) => {
                        tracing::error!("Failed to list {} for extension {}: {}", path, id, e);
                        sweep.failed += 1;
                    }
                },
                Err(e) => {
                    tracing::error!("Failed to inspect {} for extension {}: {}", path, id, e);
                    sweep.failed += 1;
                }
            }
        }

        let deletions = files.iter().map(|path| async move { (path, store.remove(path).await) });
        for (path, result) in join_all(deletions).await {
            match result {
                Ok(()) => sweep.files += 1,
                Err(e) => {
                    tracing::error!("Failed to delete {} for extension {}: {}", path, id, e);
                    sweep.failed += 1;
                }
            }
        }

        directories.sort_by_key(|dir| std::cmp::Reverse(dir.matches('/').count()));
        for dir in &directories {
            match store.remove(dir).await {
                Ok(()) => sweep.directories += 1,
                Err(e) => {
                    tracing::error!("Failed to delete {} for extension {}: {}", dir, id, e);
                    sweep.failed += 1;
                }
            }
        }

        sweep
    }
}

#[derive(Debug, Default)]
struct Sweep {
    files: usize,
    directories: usize,
    failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::pack;
    use crate::store::{MemoryStore, StoreResult};
    use async_trait::async_trait;

    /// Wraps a memory store and fails writes, removals, or directory
    /// creation of chosen paths.
    #[derive(Default)]
    struct FaultyStore {
        inner: MemoryStore,
        fail_write: Option<&'static str>,
        fail_remove: Option<&'static str>,
        fail_mkdir: Option<&'static str>,
    }

    #[async_trait]
    impl VirtualStore for FaultyStore {
        async fn write(&self, path: &str, content: &[u8]) -> StoreResult<()> {
            if self.fail_write.is_some_and(|p| path.ends_with(p)) {
                return Err(StoreError::Io {
                    path: path.to_string(),
                    message: "disk full".to_string(),
                });
            }
            self.inner.write(path, content).await
        }

        async fn read(&self, path: &str) -> StoreResult<Vec<u8>> {
            self.inner.read(path).await
        }

        async fn list(&self, dir: &str) -> StoreResult<Vec<String>> {
            self.inner.list(dir).await
        }

        async fn remove(&self, path: &str) -> StoreResult<()> {
            if self.fail_remove.is_some_and(|p| path.ends_with(p)) {
                return Err(StoreError::Io {
                    path: path.to_string(),
                    message: "permission denied".to_string(),
                });
            }
            self.inner.remove(path).await
        }

        async fn make_directory(&self, path: &str, recursive: bool) -> StoreResult<()> {
            if self.fail_mkdir.is_some_and(|p| path.ends_with(p)) {
                return Err(StoreError::Io {
                    path: path.to_string(),
                    message: "read-only file system".to_string(),
                });
            }
            self.inner.make_directory(path, recursive).await
        }

        async fn kind(&self, path: &str) -> StoreResult<EntryKind> {
            self.inner.kind(path).await
        }
    }

    fn manager(store: Arc<dyn VirtualStore>) -> ExtensionManager {
        ExtensionManager::new(store, &InstallConfig::default())
    }

    fn bundle_bytes(id: &str, files: &[(&str, &str)]) -> Vec<u8> {
        let manifest = format!(r#"{{"id": "{}", "name": "Test {}"}}"#, id, id);
        let mut entries: Vec<(String, Vec<u8>)> =
            vec![("manifest.json".to_string(), manifest.into_bytes())];
        entries.extend(
            files
                .iter()
                .map(|(p, c)| (p.to_string(), c.as_bytes().to_vec())),
        );
        pack::zip_bundle(&entries).unwrap()
    }

    #[tokio::test]
    async fn test_install_round_trip() {
        let store = Arc::new(MemoryStore::new());
        let manager = manager(store.clone());

        let data = bundle_bytes(
            "ext1",
            &[("index.html", "<h1>hi</h1>"), ("js/app.js", "run()"), ("a/b/c.css", "p{}")],
        );
        let report = manager.install_bundle_bytes(&data).await.unwrap();

        assert_eq!(report.id, "ext1");
        assert_eq!(report.name, "Test ext1");
        assert_eq!(report.files, 4);
        assert_eq!(manager.state("ext1").await, NamespaceState::Present);

        let base = "/internal/extensions/ext1";
        assert_eq!(store.read(&format!("{}/index.html", base)).await.unwrap(), b"<h1>hi</h1>");
        assert_eq!(store.read(&format!("{}/js/app.js", base)).await.unwrap(), b"run()");
        assert_eq!(store.read(&format!("{}/a/b/c.css", base)).await.unwrap(), b"p{}");
        assert!(store.read(&format!("{}/manifest.json", base)).await.is_ok());
        assert_eq!(manager.installed().await, vec!["ext1"]);
    }

    #[tokio::test]
    async fn test_install_tar_gz() {
        let store = Arc::new(MemoryStore::new());
        let manager = manager(store.clone());

        let data = pack::tar_gz_bundle(&[
            ("manifest.json", br#"{"id": "tarred"}"#.as_slice()),
            ("img/logo.svg", b"<svg/>".as_slice()),
        ])
        .unwrap();
        assert!(manager.install(&data).await);
        assert_eq!(
            store.read("/internal/extensions/tarred/img/logo.svg").await.unwrap(),
            b"<svg/>"
        );
    }

    #[tokio::test]
    async fn test_install_invalid_bundle_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let manager = manager(store.clone());

        assert!(!manager.install(b"not a zip").await);
        assert_eq!(manager.state("ext1").await, NamespaceState::Absent);
        assert!(store.list(EXTENSIONS_ROOT).await.is_err());

        let no_manifest = pack::zip_bundle(&[("index.html", b"x".as_slice())]).unwrap();
        assert!(matches!(
            manager.install_bundle_bytes(&no_manifest).await,
            Err(InstallError::Bundle(BundleError::MissingManifest))
        ));
        assert_eq!(store.file_count().await, 0);
    }

    #[tokio::test]
    async fn test_failed_reinstall_keeps_present_namespace() {
        let store = Arc::new(MemoryStore::new());
        let manager = manager(store.clone());

        assert!(manager.install(&bundle_bytes("ext1", &[("a.js", "1")])).await);
        assert!(!manager.install(b"PK\x03\x04garbage").await);

        assert_eq!(manager.state("ext1").await, NamespaceState::Present);
        assert_eq!(store.read("/internal/extensions/ext1/a.js").await.unwrap(), b"1");
    }

    #[tokio::test]
    async fn test_install_over_present_is_additive() {
        let store = Arc::new(MemoryStore::new());
        let manager = manager(store.clone());

        let v1 = bundle_bytes("ext1", &[("old.js", "old"), ("index.html", "v1")]);
        let v2 = bundle_bytes("ext1", &[("index.html", "v2")]);
        assert!(manager.install(&v1).await);
        assert!(manager.install(&v2).await);

        let base = "/internal/extensions/ext1";
        assert_eq!(store.read(&format!("{}/index.html", base)).await.unwrap(), b"v2");
        assert_eq!(store.read(&format!("{}/old.js", base)).await.unwrap(), b"old");
    }

    #[tokio::test]
    async fn test_partial_write_failure() {
        let store = Arc::new(FaultyStore {
            fail_write: Some("broken.js"),
            ..Default::default()
        });
        let manager = manager(store.clone());

        let data = bundle_bytes("ext1", &[("ok.js", "fine"), ("broken.js", "nope")]);
        let err = manager.install_bundle_bytes(&data).await.unwrap_err();
        assert!(matches!(
            err,
            InstallError::PartialWrite { failed: 1, total: 3, .. }
        ));

        // Remaining writes still ran, and the namespace directory exists.
        assert_eq!(store.read("/internal/extensions/ext1/ok.js").await.unwrap(), b"fine");
        assert!(store.read("/internal/extensions/ext1/broken.js").await.is_err());
        assert_eq!(manager.state("ext1").await, NamespaceState::Present);
    }

    #[tokio::test]
    async fn test_remove_clears_nested_namespace() {
        let store = Arc::new(MemoryStore::new());
        let manager = manager(store.clone());

        let data = bundle_bytes("ext1", &[("a/b/c/deep.js", "x"), ("a/top.js", "y")]);
        assert!(manager.install(&data).await);

        let report = manager.try_remove("ext1").await.unwrap();
        assert_eq!(report.files, 3);
        assert_eq!(report.directories, 3);

        assert!(store.list("/internal/extensions/ext1").await.is_err());
        assert!(store.read("/internal/extensions/ext1/a/top.js").await.is_err());
        assert!(manager.installed().await.is_empty());
        assert_eq!(manager.state("ext1").await, NamespaceState::Absent);
        assert_eq!(store.file_count().await, 0);
    }

    #[tokio::test]
    async fn test_remove_absent_leaves_siblings() {
        let store = Arc::new(MemoryStore::new());
        let manager = manager(store.clone());

        assert!(manager.install(&bundle_bytes("keep", &[("k.js", "k")])).await);
        assert!(!manager.remove("missing").await);
        assert!(matches!(
            manager.try_remove("missing").await,
            Err(RemoveError::NotInstalled(_))
        ));
        assert_eq!(manager.state("missing").await, NamespaceState::Absent);
        assert_eq!(store.read("/internal/extensions/keep/k.js").await.unwrap(), b"k");
    }

    #[tokio::test]
    async fn test_remove_rejects_ids_outside_a_namespace() {
        let store = Arc::new(MemoryStore::new());
        let manager = manager(store.clone());
        assert!(manager.install(&bundle_bytes("keep", &[("k.js", "k")])).await);

        for id in ["", "..", "a/b", "."] {
            assert!(!manager.remove(id).await, "id {:?} should be rejected", id);
        }
        assert_eq!(manager.installed().await, vec!["keep"]);
    }

    #[tokio::test]
    async fn test_remove_with_stuck_file_stays_present() {
        let store = Arc::new(FaultyStore {
            fail_remove: Some("stuck.js"),
            ..Default::default()
        });
        let manager = manager(store.clone());
        assert!(manager
            .install(&bundle_bytes("ext1", &[("stuck.js", "s"), ("free.js", "f")]))
            .await);

        let err = manager.try_remove("ext1").await.unwrap_err();
        assert!(matches!(err, RemoveError::Incomplete { failed: 1, .. }));

        // Best effort: the other files are gone.
        assert!(store.read("/internal/extensions/ext1/free.js").await.is_err());
        assert!(store.read("/internal/extensions/ext1/stuck.js").await.is_ok());
        assert_eq!(manager.state("ext1").await, NamespaceState::Present);
    }

    #[tokio::test]
    async fn test_namespaces_are_isolated() {
        let store = Arc::new(MemoryStore::new());
        let manager = manager(store.clone());

        assert!(manager.install(&bundle_bytes("a", &[("shared.js", "from a")])).await);
        assert!(manager.install(&bundle_bytes("b", &[("shared.js", "from b")])).await);
        assert!(manager.remove("b").await);

        assert_eq!(
            store.read("/internal/extensions/a/shared.js").await.unwrap(),
            b"from a"
        );
        assert_eq!(manager.installed().await, vec!["a"]);
    }

    #[tokio::test]
    async fn test_serialized_concurrent_installs() {
        let store = Arc::new(MemoryStore::new());
        let manager = Arc::new(manager(store.clone()));

        let first = bundle_bytes("ext1", &[("one.js", "1")]);
        let second = bundle_bytes("ext1", &[("two.js", "2")]);
        let (a, b) = tokio::join!(manager.install(&first), manager.install(&second));

        assert!(a && b);
        assert_eq!(store.read("/internal/extensions/ext1/one.js").await.unwrap(), b"1");
        assert_eq!(store.read("/internal/extensions/ext1/two.js").await.unwrap(), b"2");
        assert_eq!(manager.state("ext1").await, NamespaceState::Present);
    }

    #[tokio::test]
    async fn test_recover_marks_existing_namespaces() {
        let store = Arc::new(MemoryStore::new());
        {
            let manager = manager(store.clone());
            assert!(manager.install(&bundle_bytes("ext1", &[("a.js", "a")])).await);
        }

        let fresh = manager(store.clone());
        assert_eq!(fresh.state("ext1").await, NamespaceState::Absent);
        assert_eq!(fresh.recover().await, 1);
        assert_eq!(fresh.state("ext1").await, NamespaceState::Present);
    }

    #[tokio::test]
    async fn test_namespace_directory_failure_writes_nothing() {
        let store = Arc::new(FaultyStore {
            fail_mkdir: Some("/ext1"),
            ..Default::default()
        });
        let manager = manager(store.clone());

        let data = bundle_bytes("ext1", &[("index.html", "x"), ("js/app.js", "y")]);
        let err = manager.install_bundle_bytes(&data).await.unwrap_err();
        assert!(matches!(err, InstallError::Prepare { ref id, .. } if id == "ext1"));
        assert!(!manager.install(&data).await);

        assert_eq!(manager.state("ext1").await, NamespaceState::Absent);
        assert_eq!(store.inner.file_count().await, 0);
        assert!(manager.installed().await.is_empty());
    }

    #[tokio::test]
    async fn test_unserialized_installs_of_one_id() {
        let store = Arc::new(MemoryStore::new());
        let config = InstallConfig {
            serialize_namespaces: false,
            ..Default::default()
        };
        let manager = ExtensionManager::new(store.clone(), &config);

        let first = bundle_bytes("ext1", &[("one.js", "1"), ("shared/a.js", "a")]);
        let second = bundle_bytes("ext1", &[("two.js", "2"), ("shared/b.js", "b")]);
        let (a, b) = tokio::join!(manager.install(&first), manager.install(&second));

        assert!(a && b);
        let base = "/internal/extensions/ext1";
        let expected = [
            ("one.js", "1"),
            ("two.js", "2"),
            ("shared/a.js", "a"),
            ("shared/b.js", "b"),
        ];
        for (file, content) in expected {
            assert_eq!(
                store.read(&format!("{}/{}", base, file)).await.unwrap(),
                content.as_bytes()
            );
        }
        assert_eq!(manager.state("ext1").await, NamespaceState::Present);
        assert_eq!(manager.namespaces.lock_count().await, 0);

        assert!(manager.remove("ext1").await);
        assert_eq!(manager.state("ext1").await, NamespaceState::Absent);
    }

    #[tokio::test]
    async fn test_operation_locks_are_released() {
        let store = Arc::new(MemoryStore::new());
        let manager = Arc::new(manager(store.clone()));

        let ids: Vec<String> = (0..32).map(|i| format!("ext{}", i)).collect();
        for id in &ids {
            assert!(manager.install(&bundle_bytes(id, &[("a.js", "a")])).await);
        }
        assert!(!manager.install(b"garbage").await);
        assert_eq!(manager.namespaces.lock_count().await, 0);

        let removals = ids.iter().map(|id| manager.remove(id));
        assert!(join_all(removals).await.into_iter().all(|ok| ok));
        assert!(!manager.remove("never-installed").await);
        assert!(!manager.remove("a/b").await);
        assert_eq!(manager.namespaces.lock_count().await, 0);

        let first = bundle_bytes("ext1", &[("one.js", "1")]);
        let second = bundle_bytes("ext1", &[("two.js", "2")]);
        let (a, b) = tokio::join!(manager.install(&first), manager.install(&second));
        assert!(a && b);
        assert_eq!(manager.namespaces.lock_count().await, 0);
    }
}
