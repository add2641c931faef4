//! In-memory snapshot store for testing.

use crate::error::StorageResult;
use crate::store::SnapshotStore;
use parking_lot::RwLock;
use std::sync::Arc;

/// An in-memory snapshot store.
///
/// Clones share the same underlying buffer, which makes it possible to
/// "reopen" an environment in a test by handing a clone of the store to a
/// new [`crate::Environment`].
///
/// # Example
///
/// ```rust
/// use autoidx_storage::{Environment, MemoryStore};
///
/// let store = MemoryStore::new();
/// let env = Environment::with_store(Box::new(store.clone())).unwrap();
/// let mut txn = env.write_txn().unwrap();
/// txn.create_tree("t").put(b"k", b"v");
/// txn.commit().unwrap();
///
/// let reopened = Environment::with_store(Box::new(store)).unwrap();
/// let read = reopened.read_txn().unwrap();
/// assert_eq!(read.tree("t").unwrap().get(b"k"), Some(&b"v"[..]));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<Option<Vec<u8>>>>,
}

impl MemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding a pre-existing snapshot.
    ///
    /// Useful for testing recovery from damaged snapshots.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            data: Arc::new(RwLock::new(Some(data))),
        }
    }

    /// Returns a copy of the stored snapshot bytes.
    #[must_use]
    pub fn data(&self) -> Option<Vec<u8>> {
        self.data.read().clone()
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.data.read().clone())
    }

    fn store(&self, data: &[u8]) -> StorageResult<()> {
        *self.data.write() = Some(data.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_store_loads_none() {
        let store = MemoryStore::new();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn store_replaces_previous_snapshot() {
        let store = MemoryStore::new();
        store.store(b"first").unwrap();
        store.store(b"second").unwrap();
        assert_eq!(store.load().unwrap(), Some(b"second".to_vec()));
    }

    #[test]
    fn clones_share_data() {
        let store = MemoryStore::new();
        let clone = store.clone();
        store.store(b"shared").unwrap();
        assert_eq!(clone.data(), Some(b"shared".to_vec()));
    }
}
