//! Error types for the index catalog.

use crate::types::IndexId;
use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in catalog and lifecycle operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage engine error.
    #[error("storage error: {0}")]
    Storage(#[from] autoidx_storage::StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The definition is malformed: empty collection, no fields, bad name.
    #[error("invalid index definition: {message}")]
    InvalidDefinition {
        /// What is wrong with the definition.
        message: String,
    },

    /// A live index with the same name is already registered.
    #[error("index '{name}' is already registered")]
    DuplicateName {
        /// The conflicting name.
        name: String,
    },

    /// A live index with the same identifier is already registered.
    #[error("index id {id} is already registered")]
    DuplicateId {
        /// The conflicting identifier.
        id: IndexId,
    },

    /// The requested index does not exist.
    #[error("index not found: {index}")]
    NotFound {
        /// The id or name that was looked up.
        index: String,
    },

    /// The existing index is locked against changes.
    #[error("cannot replace index '{name}': it is locked (LockedError)")]
    LockConflict {
        /// The locked index.
        name: String,
    },

    /// A persisted definition record could not be interpreted.
    #[error("corrupt index definition: {message}")]
    CorruptDefinition {
        /// Description of the corruption.
        message: String,
    },

    /// The index kind cannot recreate itself from its own definition.
    #[error("index '{name}' of kind {kind} cannot be reset")]
    UnsupportedReset {
        /// The index that was asked to reset.
        name: String,
        /// Its kind.
        kind: String,
    },

    /// The requested behaviour is not implemented.
    #[error("unsupported operation: {message}")]
    Unsupported {
        /// What was requested.
        message: String,
    },

    /// `initialize` was called more than once.
    #[error("index store is already initialized")]
    AlreadyInitialized,

    /// A mutating operation ran before `initialize`.
    #[error("index store is not initialized")]
    NotInitialized,

    /// The index store has been disposed.
    #[error("index store has been disposed")]
    Disposed,

    /// The index handle has been disposed.
    #[error("index {id} has been disposed")]
    IndexDisposed {
        /// The disposed index.
        id: IndexId,
    },

    /// Another process holds the index storage root.
    #[error("index storage root locked: another process has exclusive access")]
    StorageRootLocked,

    /// The bulk operation worker pool could not be built.
    #[error("worker pool error: {message}")]
    WorkerPool {
        /// Description of the failure.
        message: String,
    },
}

impl CoreError {
    /// Creates an invalid definition error.
    pub fn invalid_definition(message: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(index: impl Into<String>) -> Self {
        Self::NotFound {
            index: index.into(),
        }
    }

    /// Creates a lock conflict error.
    pub fn lock_conflict(name: impl Into<String>) -> Self {
        Self::LockConflict { name: name.into() }
    }

    /// Creates a corrupt definition error.
    pub fn corrupt_definition(message: impl Into<String>) -> Self {
        Self::CorruptDefinition {
            message: message.into(),
        }
    }

    /// Creates an unsupported operation error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    /// Returns true for errors that mean "no such index".
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
