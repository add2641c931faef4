//! Environment, transactions and named trees.

use crate::error::{StorageError, StorageResult};
use crate::memory::MemoryStore;
use crate::snapshot::{self, TreeEntries, Trees};
use crate::store::SnapshotStore;
use crate::FileStore;
use parking_lot::{Mutex, MutexGuard, RwLock};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A transactional set of named key-value trees.
///
/// # Concurrency
///
/// - Readers get an immutable snapshot of the last commit and never block writers
/// - Writers are serialized: `write_txn` blocks while another write transaction is open
/// - A commit is published only after the store has made it durable
///
/// Transactions are not shared across threads; each caller opens its own.
pub struct Environment {
    committed: RwLock<Arc<Trees>>,
    writer: Mutex<()>,
    store: Box<dyn SnapshotStore>,
    closed: AtomicBool,
}

impl Environment {
    /// Creates an empty, non-durable environment.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_parts(Box::new(MemoryStore::new()), Trees::new())
    }

    /// Opens (or creates) a durable environment in `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the existing
    /// snapshot cannot be read.
    pub fn open(dir: &Path) -> StorageResult<Self> {
        Self::with_store(Box::new(FileStore::open(dir)?))
    }

    /// Opens an environment over an arbitrary snapshot store.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Corrupted`] if the stored snapshot cannot be decoded.
    pub fn with_store(store: Box<dyn SnapshotStore>) -> StorageResult<Self> {
        let trees = match store.load()? {
            Some(bytes) => snapshot::decode(&bytes)?,
            None => Trees::new(),
        };
        Ok(Self::from_parts(store, trees))
    }

    fn from_parts(store: Box<dyn SnapshotStore>, trees: Trees) -> Self {
        Self {
            committed: RwLock::new(Arc::new(trees)),
            writer: Mutex::new(()),
            store,
            closed: AtomicBool::new(false),
        }
    }

    /// Returns the directory backing this environment, if it is durable.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.store.location()
    }

    /// Begins a read transaction over the last committed snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Closed`] if the environment was closed.
    pub fn read_txn(&self) -> StorageResult<ReadTransaction> {
        self.ensure_open()?;
        Ok(ReadTransaction {
            snapshot: Arc::clone(&self.committed.read()),
        })
    }

    /// Begins a write transaction, waiting for any other writer to finish.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Closed`] if the environment was closed.
    pub fn write_txn(&self) -> StorageResult<WriteTransaction<'_>> {
        self.ensure_open()?;
        let guard = self.writer.lock();
        let pending = Trees::clone(&self.committed.read());
        Ok(WriteTransaction {
            env: self,
            _writer: guard,
            pending,
            dirty: false,
        })
    }

    /// Closes the environment. Later transactions fail with [`StorageError::Closed`].
    ///
    /// Waits for an in-flight write transaction to finish first.
    pub fn close(&self) {
        let _writer = self.writer.lock();
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Returns true once [`Environment::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> StorageResult<()> {
        if self.is_closed() {
            return Err(StorageError::Closed);
        }
        Ok(())
    }

    fn publish(&self, trees: Trees) -> StorageResult<()> {
        let bytes = snapshot::encode(&trees)?;
        self.store.store(&bytes)?;
        *self.committed.write() = Arc::new(trees);
        Ok(())
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("path", &self.path())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// A consistent read-only view of an environment.
#[derive(Debug, Clone)]
pub struct ReadTransaction {
    snapshot: Arc<Trees>,
}

impl ReadTransaction {
    /// Opens an existing tree. Returns `None` if it was never created.
    #[must_use]
    pub fn tree(&self, name: &str) -> Option<Tree<'_>> {
        self.snapshot.get(name).map(|entries| Tree { entries })
    }
}

/// A pending set of changes, published atomically by [`WriteTransaction::commit`].
///
/// Dropping the transaction without committing discards every change.
pub struct WriteTransaction<'env> {
    env: &'env Environment,
    _writer: MutexGuard<'env, ()>,
    pending: Trees,
    dirty: bool,
}

impl<'env> WriteTransaction<'env> {
    /// Opens a tree for writing, creating it if it does not exist.
    pub fn create_tree(&mut self, name: &str) -> TreeMut<'_> {
        self.dirty = true;
        TreeMut {
            entries: self.pending.entry(name.to_string()).or_default(),
        }
    }

    /// Opens an existing tree for reading within this transaction.
    #[must_use]
    pub fn tree(&self, name: &str) -> Option<Tree<'_>> {
        self.pending.get(name).map(|entries| Tree { entries })
    }

    /// Publishes all changes atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be encoded or stored. On error
    /// the previously committed state remains visible.
    pub fn commit(self) -> StorageResult<()> {
        if !self.dirty {
            return Ok(());
        }
        self.env.ensure_open()?;
        self.env.publish(self.pending)
    }

    /// Discards all changes.
    pub fn abort(self) {}
}

/// Read access to a single tree.
#[derive(Debug, Clone, Copy)]
pub struct Tree<'a> {
    entries: &'a TreeEntries,
}

impl<'a> Tree<'a> {
    /// Reads the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &[u8]) -> Option<&'a [u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the tree has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a [u8], &'a [u8])> + 'a {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_slice(), v.as_slice()))
    }
}

/// Write access to a single tree inside a [`WriteTransaction`].
#[derive(Debug)]
pub struct TreeMut<'a> {
    entries: &'a mut TreeEntries,
}

impl TreeMut<'_> {
    /// Stores `value` under `key`, replacing any previous value.
    pub fn put(&mut self, key: &[u8], value: &[u8]) {
        self.entries.insert(key.to_vec(), value.to_vec());
    }

    /// Reads the pending value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Removes `key`. Returns true if it was present.
    pub fn remove(&mut self, key: &[u8]) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the tree has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
