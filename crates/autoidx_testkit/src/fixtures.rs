//! Test fixtures and store helpers.
//!
//! Provides stores over memory or a temporary index root, common
//! definitions, and helpers that write index directories directly so
//! recovery can be tested against hand-made disk state.

use autoidx_core::{
    persist_definition, AutoIndexDefinition, IndexDefinition, IndexField, IndexId, IndexStore,
    IndexingConfig, StaticIndexDefinition,
};
use autoidx_storage::{Environment, FileStore};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Name of the index root inside a test's temporary directory.
pub const TEST_ROOT_NAME: &str = "Indexes";

/// An initialized store with automatic cleanup of its index root.
pub struct TestStore {
    /// The store instance.
    pub store: IndexStore,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: Option<TempDir>,
}

impl TestStore {
    /// Creates an initialized in-memory store.
    pub fn memory() -> Self {
        let store = IndexStore::new(IndexingConfig::in_memory().worker_threads(2))
            .expect("Failed to create in-memory store");
        store.initialize().expect("Failed to initialize store");
        Self {
            store,
            temp_dir: None,
        }
    }

    /// Creates an initialized store over an empty temporary index root and
    /// waits for its (empty) recovery.
    pub fn persistent() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let test_store = Self::open_in(temp_dir);
        test_store.store.wait_for_recovery();
        test_store
    }

    /// Creates an initialized store over an existing temporary directory
    /// without waiting for recovery.
    pub fn open_in(temp_dir: TempDir) -> Self {
        let store = IndexStore::new(persistent_config(&temp_dir.path().join(TEST_ROOT_NAME)))
            .expect("Failed to create store");
        store.initialize().expect("Failed to initialize store");
        Self {
            store,
            temp_dir: Some(temp_dir),
        }
    }

    /// Returns the index root if the store is persistent.
    pub fn root(&self) -> Option<PathBuf> {
        self.temp_dir
            .as_ref()
            .map(|d| d.path().join(TEST_ROOT_NAME))
    }

    /// Disposes the store and opens a new one over the same root, simulating
    /// a process restart. Recovery is left running.
    pub fn reopen(self) -> Self {
        let Self { store, temp_dir } = self;
        store.dispose();
        drop(store);
        let temp_dir = temp_dir.expect("Only persistent stores can be reopened");
        Self::open_in(temp_dir)
    }
}

impl std::ops::Deref for TestStore {
    type Target = IndexStore;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// Returns a persistent configuration rooted at `root` with a small pool.
pub fn persistent_config(root: &Path) -> IndexingConfig {
    IndexingConfig::new()
        .index_storage_path(root)
        .worker_threads(2)
}

/// Runs a test with an initialized in-memory store.
pub fn with_memory_store<F, R>(f: F) -> R
where
    F: FnOnce(&IndexStore) -> R,
{
    let test_store = TestStore::memory();
    f(&test_store.store)
}

/// Runs a test with an initialized store over a temporary index root.
pub fn with_persistent_store<F, R>(f: F) -> R
where
    F: FnOnce(&IndexStore, &Path) -> R,
{
    let test_store = TestStore::persistent();
    let root = test_store.root().expect("Persistent store should have a root");
    f(&test_store.store, &root)
}

/// Auto definition over `Users` with default options on every field.
pub fn users_by(fields: &[&str]) -> AutoIndexDefinition {
    AutoIndexDefinition::new("Users", fields.iter().map(|f| IndexField::new(*f)).collect())
        .expect("Invalid auto definition")
}

/// Authored map index over `Orders`.
pub fn orders_search() -> StaticIndexDefinition {
    StaticIndexDefinition::builder("Orders/Search")
        .collection("Orders")
        .map("from o in docs.Orders select new { o.Company, o.ShipTo.City }")
        .field(IndexField::new("Company"))
        .build()
        .expect("Invalid map definition")
}

/// Authored map-reduce index over `Orders`.
pub fn orders_totals() -> StaticIndexDefinition {
    StaticIndexDefinition::builder("Orders/Totals")
        .collection("Orders")
        .map("from o in docs.Orders select new { o.Company, Total = o.Lines.Sum(l => l.Price) }")
        .reduce("from r in results group r by r.Company into g select new { Company = g.Key, Total = g.Sum(x => x.Total) }")
        .build()
        .expect("Invalid map-reduce definition")
}

/// Writes an index directory holding `definition`, as a previous process
/// would have left it.
pub fn write_index_dir(root: &Path, id: IndexId, definition: &IndexDefinition) -> PathBuf {
    let dir = root.join(id.dir_name());
    let env = Environment::open(&dir).expect("Failed to open environment");
    let mut txn = env.write_txn().expect("Failed to begin write");
    persist_definition(definition, &mut txn).expect("Failed to persist definition");
    txn.commit().expect("Failed to commit");
    dir
}

/// Writes an index directory whose storage snapshot is unreadable.
pub fn write_corrupt_index_dir(root: &Path, id: IndexId) -> PathBuf {
    let dir = root.join(id.dir_name());
    let store = FileStore::open(&dir).expect("Failed to open file store");
    fs::write(store.snapshot_path(), b"\x00\x01 definitely not cbor")
        .expect("Failed to write corrupt snapshot");
    dir
}

/// Writes an index directory with a readable snapshot whose definition
/// record is garbage.
pub fn write_undecodable_definition_dir(root: &Path, id: IndexId) -> PathBuf {
    let dir = root.join(id.dir_name());
    let env = Environment::open(&dir).expect("Failed to open environment");
    let mut txn = env.write_txn().expect("Failed to begin write");
    txn.create_tree(autoidx_core::DEFINITION_TREE)
        .put(autoidx_core::DEFINITION_KEY, b"\xa1\x61X\x01");
    txn.commit().expect("Failed to commit");
    dir
}

/// Creates an index directory with no definition in it.
pub fn write_empty_index_dir(root: &Path, id: IndexId) -> PathBuf {
    let dir = root.join(id.dir_name());
    fs::create_dir_all(&dir).expect("Failed to create directory");
    dir
}
