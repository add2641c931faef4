//! Snapshot store trait definition.

use crate::error::StorageResult;
use std::path::Path;

/// Durable home for the committed state of an [`crate::Environment`].
///
/// Stores are **opaque byte stores**. The environment hands them a complete
/// encoded snapshot on every commit and asks for it back when reopening.
///
/// # Invariants
///
/// - `store` replaces the previous snapshot atomically: after a crash, `load`
///   returns either the old or the new snapshot, never a mix
/// - `load` returns `None` when nothing was ever committed
/// - Stores must be `Send + Sync` for concurrent access
///
/// # Implementors
///
/// - [`super::MemoryStore`] - For testing
/// - [`super::FileStore`] - For persistent storage
pub trait SnapshotStore: Send + Sync {
    /// Loads the last stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn load(&self) -> StorageResult<Option<Vec<u8>>>;

    /// Atomically replaces the stored snapshot.
    ///
    /// After this returns successfully the snapshot survives process
    /// termination (for durable stores).
    ///
    /// # Errors
    ///
    /// Returns an error if the write or sync fails.
    fn store(&self, data: &[u8]) -> StorageResult<()>;

    /// Returns the directory backing this store, if any.
    fn location(&self) -> Option<&Path> {
        None
    }
}
