//! Per-namespace lifecycle tracking.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Lifecycle state of one namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NamespaceState {
    Absent,
    Installing,
    Present,
    Removing,
}

impl fmt::Display for NamespaceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Absent => "absent",
            Self::Installing => "installing",
            Self::Present => "present",
            Self::Removing => "removing",
        };
        f.write_str(label)
    }
}

/// State table plus the optional per-namespace operation locks.
///
/// Absent namespaces have no entry in `states`. A lock entry lives only while
/// someone holds or waits on it.
#[derive(Default)]
pub(crate) struct NamespaceTable {
    states: Mutex<HashMap<String, NamespaceState>>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl NamespaceTable {
    pub async fn get(&self, id: &str) -> NamespaceState {
        self.states
            .lock()
            .await
            .get(id)
            .copied()
            .unwrap_or(NamespaceState::Absent)
    }

    pub async fn set(&self, id: &str, state: NamespaceState) {
        let mut states = self.states.lock().await;
        if state == NamespaceState::Absent {
            states.remove(id);
        } else {
            states.insert(id.to_string(), state);
        }
    }

    /// Move `id` into `next`, returning the state it left.
    pub async fn transition(&self, id: &str, next: NamespaceState) -> NamespaceState {
        let mut states = self.states.lock().await;
        let prior = states
            .insert(id.to_string(), next)
            .unwrap_or(NamespaceState::Absent);
        tracing::debug!("Extension {}: {} -> {}", id, prior, next);
        prior
    }

    /// Acquire the operation lock for `id`. Waiters are served in FIFO order.
    pub async fn lock(&self, id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.entry(id.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Give back a guard taken with [`lock`](Self::lock), dropping the lock
    /// entry when nobody else holds or waits on it.
    pub async fn release(&self, id: &str, guard: OwnedMutexGuard<()>) {
        let mut locks = self.locks.lock().await;
        drop(guard);
        // Waiters hold their own clone of the Arc until they are served.
        if locks.get(id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(id);
        }
    }

    #[cfg(test)]
    pub async fn lock_count(&self) -> usize {
        self.locks.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_absent_is_untracked() {
        let table = NamespaceTable::default();
        assert_eq!(table.get("x").await, NamespaceState::Absent);

        let prior = table.transition("x", NamespaceState::Installing).await;
        assert_eq!(prior, NamespaceState::Absent);
        assert_eq!(table.get("x").await, NamespaceState::Installing);

        table.set("x", NamespaceState::Absent).await;
        assert!(table.states.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_lock_is_per_namespace() {
        let table = NamespaceTable::default();
        let _a = table.lock("a").await;
        // A different id must not wait on "a".
        let b = tokio::time::timeout(std::time::Duration::from_millis(100), table.lock("b")).await;
        assert!(b.is_ok());

        let again =
            tokio::time::timeout(std::time::Duration::from_millis(50), table.lock("a")).await;
        assert!(again.is_err());
    }

    #[tokio::test]
    async fn test_release_drops_idle_locks() {
        let table = NamespaceTable::default();
        let guard = table.lock("a").await;
        assert_eq!(table.lock_count().await, 1);

        table.release("a", guard).await;
        assert_eq!(table.lock_count().await, 0);
    }

    #[tokio::test]
    async fn test_release_keeps_lock_with_waiters() {
        let table = Arc::new(NamespaceTable::default());
        let first = table.lock("a").await;

        let waiter = {
            let table = table.clone();
            tokio::spawn(async move {
                let guard = table.lock("a").await;
                table.release("a", guard).await;
            })
        };
        // Let the waiter queue up behind `first`.
        while Arc::strong_count(&table.locks.lock().await["a"]) < 3 {
            tokio::task::yield_now().await;
        }

        table.release("a", first).await;
        assert_eq!(table.lock_count().await, 1);

        waiter.await.unwrap();
        assert_eq!(table.lock_count().await, 0);
    }
}
