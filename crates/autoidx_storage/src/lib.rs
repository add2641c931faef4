//! # autoidx Storage
//!
//! Transactional key-value tree storage used by the autoidx index catalog.
//!
//! The catalog treats this crate as an opaque storage engine: it opens an
//! [`Environment`] per index directory, writes into named trees inside a
//! [`WriteTransaction`] and reads them back through a [`ReadTransaction`].
//! The engine does not interpret the bytes it stores.
//!
//! ## Design Principles
//!
//! - One writer at a time, any number of concurrent readers
//! - Readers see the last committed snapshot, never a partial commit
//! - A write transaction is published atomically on `commit`, or discarded on drop
//! - Durability is delegated to a [`SnapshotStore`]
//!
//! ## Available Stores
//!
//! - [`MemoryStore`] - For testing and run-in-memory deployments
//! - [`FileStore`] - For persistent storage inside an index directory
//!
//! ## Example
//!
//! ```rust
//! use autoidx_storage::Environment;
//!
//! let env = Environment::in_memory();
//! let mut txn = env.write_txn().unwrap();
//! txn.create_tree("Definition").put(b"Definition", b"payload");
//! txn.commit().unwrap();
//!
//! let read = env.read_txn().unwrap();
//! let tree = read.tree("Definition").unwrap();
//! assert_eq!(tree.get(b"Definition"), Some(&b"payload"[..]));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod env;
mod error;
mod file;
mod memory;
mod snapshot;
mod store;

pub use env::{Environment, ReadTransaction, Tree, TreeMut, WriteTransaction};
pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use store::SnapshotStore;
