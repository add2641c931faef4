//! The index lifecycle manager.

use crate::catalog::IndexCatalog;
use crate::change_feed::{IndexChangeFeed, IndexChangeType, IndexNotifier};
use crate::config::IndexingConfig;
use crate::definition::{
    decide, AutoIndexDefinition, IndexCreationDecision, IndexDefinition, IndexKind,
};
use crate::dir::IndexStorageRoot;
use crate::error::{CoreError, CoreResult};
use crate::handle::Index;
use crate::recovery::{parse_index_directory_ids, plan_recovery, RecoveryReport};
use crate::types::{IndexId, IndexRef};
use parking_lot::Mutex;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::atomic::{AtomicBool, Ordering};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

/// Creates, recovers, starts, stops and deletes indexes.
///
/// `IndexStore` owns the [`IndexCatalog`] and is the only component that
/// mutates it. Create, delete and reset are serialized by one coarse lock
/// spanning the whole decide/persist/register sequence. Lookups and bulk
/// operations read the catalog without that lock.
///
/// # Example
///
/// ```rust
/// use autoidx_core::{AutoIndexDefinition, IndexField, IndexStore, IndexingConfig};
///
/// let store = IndexStore::new(IndexingConfig::in_memory()).unwrap();
/// store.initialize().unwrap();
///
/// let def = AutoIndexDefinition::new("Users", vec![IndexField::new("Name")]).unwrap();
/// let id = store.create_auto_index(def.clone()).unwrap();
///
/// // identical request: same index
/// assert_eq!(store.create_auto_index(def).unwrap(), id);
/// assert!(store.get_index("auto/users/byname").is_some());
///
/// store.delete_index(id).unwrap();
/// assert!(store.get_index(id).is_none());
/// ```
pub struct IndexStore {
    shared: Arc<Shared>,
    feed: Option<Arc<IndexChangeFeed>>,
    pool: ThreadPool,
    recovery: Mutex<Option<JoinHandle<RecoveryReport>>>,
}

/// State reachable from the recovery thread.
struct Shared {
    config: IndexingConfig,
    catalog: IndexCatalog,
    notifier: Arc<dyn IndexNotifier>,
    write_lock: Mutex<()>,
    root: Mutex<Option<IndexStorageRoot>>,
    initialized: AtomicBool,
    disposed: AtomicBool,
    indexing_disabled: AtomicBool,
}

impl IndexStore {
    /// Creates a store that reports changes to its own [`IndexChangeFeed`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::WorkerPool`] if the worker pool cannot start.
    pub fn new(config: IndexingConfig) -> CoreResult<Self> {
        let feed = Arc::new(IndexChangeFeed::new());
        Self::build(config, Arc::clone(&feed) as Arc<dyn IndexNotifier>, Some(feed))
    }

    /// Creates a store that reports changes to `notifier`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::WorkerPool`] if the worker pool cannot start.
    pub fn with_notifier(
        config: IndexingConfig,
        notifier: Arc<dyn IndexNotifier>,
    ) -> CoreResult<Self> {
        Self::build(config, notifier, None)
    }

    fn build(
        config: IndexingConfig,
        notifier: Arc<dyn IndexNotifier>,
        feed: Option<Arc<IndexChangeFeed>>,
    ) -> CoreResult<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.worker_threads)
            .thread_name(|i| format!("autoidx-worker-{i}"))
            .build()
            .map_err(|e| CoreError::WorkerPool {
                message: e.to_string(),
            })?;

        let indexing_disabled = AtomicBool::new(config.indexing_disabled);
        Ok(Self {
            shared: Arc::new(Shared {
                config,
                catalog: IndexCatalog::new(),
                notifier,
                write_lock: Mutex::new(()),
                root: Mutex::new(None),
                initialized: AtomicBool::new(false),
                disposed: AtomicBool::new(false),
                indexing_disabled,
            }),
            feed,
            pool,
            recovery: Mutex::new(None),
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &IndexingConfig {
        &self.shared.config
    }

    /// Returns the built-in change feed, `None` with a custom notifier.
    #[must_use]
    pub fn change_feed(&self) -> Option<&Arc<IndexChangeFeed>> {
        self.feed.as_ref()
    }

    /// Prepares the store and schedules recovery in the background.
    ///
    /// For persistent configurations this creates the storage root if
    /// missing, locks it, and seeds the identifier allocator past every
    /// identifier found on disk before returning. Loading and registering
    /// the indexes happens on a separate thread; until it finishes, lookups
    /// may not see recovered indexes yet.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AlreadyInitialized`] on a second call,
    /// [`CoreError::StorageRootLocked`] if another process owns the root,
    /// or an I/O error.
    pub fn initialize(&self) -> CoreResult<()> {
        let mut recovery = self.recovery.lock();
        let shared = &self.shared;
        if shared.disposed.load(Ordering::SeqCst) {
            return Err(CoreError::Disposed);
        }
        if shared.initialized.load(Ordering::SeqCst) {
            return Err(CoreError::AlreadyInitialized);
        }

        if shared.config.run_in_memory {
            shared.initialized.store(true, Ordering::SeqCst);
            info!("index store initialized in memory");
            return Ok(());
        }

        let root = IndexStorageRoot::open(&shared.config.index_storage_path)?;
        let mut ids = parse_index_directory_ids(root.list_entries()?);
        if let Some(&max) = ids.last() {
            if !shared.catalog.seed_past(max) {
                warn!(index_id = %max, "index directory id is out of range, skipping it");
                ids.pop();
            }
        }
        info!(
            path = %root.path().display(),
            directories = ids.len(),
            "index store initialized, recovering in background"
        );
        *shared.root.lock() = Some(root);
        shared.initialized.store(true, Ordering::SeqCst);

        let worker = Arc::clone(shared);
        let handle = thread::Builder::new()
            .name("autoidx-recovery".to_string())
            .spawn(move || worker.recover(&ids))?;
        *recovery = Some(handle);
        Ok(())
    }

    /// Returns true once [`IndexStore::initialize`] has succeeded.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.shared.initialized.load(Ordering::SeqCst)
    }

    /// Waits for background recovery and returns its report.
    ///
    /// Returns `None` if no recovery was scheduled or it was already
    /// awaited.
    pub fn wait_for_recovery(&self) -> Option<RecoveryReport> {
        let handle = self.recovery.lock().take()?;
        match handle.join() {
            Ok(report) => Some(report),
            Err(_) => {
                error!("index recovery thread panicked");
                None
            }
        }
    }

    /// Creates an auto index, or returns the identifier of the equal index
    /// already registered under the same name.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::LockConflict`] if the registered index is locked
    /// with `LockedError`, [`CoreError::Unsupported`] for `SideBySide`, or
    /// any storage error hit while creating the new index.
    pub fn create_auto_index(&self, definition: AutoIndexDefinition) -> CoreResult<IndexId> {
        self.create_index(definition)
    }

    /// Creates an index from any definition.
    ///
    /// The registered index with the same name, if any, decides the outcome:
    /// an equal definition keeps it, a different one replaces it with a new
    /// index under a fresh identifier.
    ///
    /// # Errors
    ///
    /// See [`IndexStore::create_auto_index`].
    pub fn create_index(&self, definition: impl Into<IndexDefinition>) -> CoreResult<IndexId> {
        let definition = definition.into();
        let shared = &self.shared;

        let _guard = shared.write_lock.lock();
        shared.ensure_open()?;

        let existing = shared.catalog.try_get_by_name(definition.name());
        let decision = decide(&definition, existing.as_ref().map(|i| i.definition()))?;
        debug!(index_name = definition.name(), ?decision, "index creation decision");

        if let Some(existing) = existing {
            match decision {
                IndexCreationDecision::Noop => return Ok(existing.id()),
                IndexCreationDecision::Replace => {
                    info!(
                        index_id = %existing.id(),
                        index_name = existing.name(),
                        "replacing index with a changed definition"
                    );
                    shared.delete_registered(&existing)?;
                }
                IndexCreationDecision::Create => {}
            }
        }

        shared.create_new(definition)
    }

    /// Looks up an index by identifier or case-insensitive name.
    #[must_use]
    pub fn get_index<'a>(&self, index: impl Into<IndexRef<'a>>) -> Option<Arc<Index>> {
        self.shared.lookup(index.into())
    }

    /// Deletes an index and recreates it from its own definition under a
    /// new identifier.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the index does not exist and
    /// [`CoreError::UnsupportedReset`] if its kind cannot recreate itself.
    pub fn reset_index<'a>(&self, index: impl Into<IndexRef<'a>>) -> CoreResult<IndexId> {
        let index = index.into();
        let shared = &self.shared;

        let _guard = shared.write_lock.lock();
        shared.ensure_open()?;

        let existing = shared.require(index)?;
        if !existing.kind().can_self_recreate() {
            return Err(CoreError::UnsupportedReset {
                name: existing.name().to_string(),
                kind: existing.kind().to_string(),
            });
        }

        let definition = existing.definition().clone();
        shared.delete_registered(&existing)?;
        let id = shared.create_new(definition)?;
        info!(
            index_name = existing.name(),
            old_id = %existing.id(),
            new_id = %id,
            "index reset"
        );
        Ok(id)
    }

    /// Deletes an index: deregisters it, disposes it and removes its
    /// directory.
    ///
    /// Disposal errors are logged and do not stop the deletion.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the index does not exist, or an
    /// I/O error if its directory could not be removed. In the latter case
    /// the index is already deregistered.
    pub fn delete_index<'a>(&self, index: impl Into<IndexRef<'a>>) -> CoreResult<()> {
        let index = index.into();
        let shared = &self.shared;

        let _guard = shared.write_lock.lock();
        shared.ensure_open()?;

        let existing = shared.require(index)?;
        shared.delete_registered(&existing)
    }

    /// Starts one index. Starting a running index does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the index does not exist.
    pub fn start_index<'a>(&self, index: impl Into<IndexRef<'a>>) -> CoreResult<()> {
        self.shared.require(index.into())?.start().map(|_| ())
    }

    /// Stops one index. Stopping a stopped index does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the index does not exist.
    pub fn stop_index<'a>(&self, index: impl Into<IndexRef<'a>>) -> CoreResult<()> {
        self.shared.require(index.into())?.stop().map(|_| ())
    }

    /// Starts every registered index. Returns how many were not running.
    pub fn start_indexing(&self) -> usize {
        self.run_bulk("start_indexing", true, |_| true)
    }

    /// Stops every registered index. Returns how many were running.
    pub fn stop_indexing(&self) -> usize {
        self.run_bulk("stop_indexing", false, |_| true)
    }

    /// Starts every index without a reduce step.
    pub fn start_map_indexes(&self) -> usize {
        self.run_bulk("start_map_indexes", true, |kind| !kind.is_map_reduce())
    }

    /// Stops every index without a reduce step.
    pub fn stop_map_indexes(&self) -> usize {
        self.run_bulk("stop_map_indexes", false, |kind| !kind.is_map_reduce())
    }

    /// Starts every map-reduce index.
    pub fn start_map_reduce_indexes(&self) -> usize {
        self.run_bulk("start_map_reduce_indexes", true, IndexKind::is_map_reduce)
    }

    /// Stops every map-reduce index.
    pub fn stop_map_reduce_indexes(&self) -> usize {
        self.run_bulk("stop_map_reduce_indexes", false, IndexKind::is_map_reduce)
    }

    fn run_bulk<F>(&self, operation: &'static str, start: bool, filter: F) -> usize
    where
        F: Fn(IndexKind) -> bool,
    {
        if self.is_indexing_disabled() {
            debug!(operation, "indexing disabled, bulk operation skipped");
            return 0;
        }

        let targets: Vec<Arc<Index>> = self
            .shared
            .catalog
            .snapshot()
            .into_iter()
            .filter(|index| filter(index.kind()))
            .collect();

        let touched = self.pool.install(|| {
            targets
                .par_iter()
                .filter(|index| {
                    let result = if start { index.start() } else { index.stop() };
                    match result {
                        Ok(changed) => changed,
                        // deleted after the snapshot was taken
                        Err(err) => {
                            debug!(index_id = %index.id(), error = %err, "bulk operation skipped index");
                            false
                        }
                    }
                })
                .count()
        });

        debug!(operation, candidates = targets.len(), touched, "bulk operation finished");
        touched
    }

    /// Enables or disables bulk start/stop at runtime.
    pub fn set_indexing_disabled(&self, disabled: bool) {
        self.shared
            .indexing_disabled
            .store(disabled, Ordering::SeqCst);
    }

    /// Returns true if bulk start/stop operations are disabled.
    #[must_use]
    pub fn is_indexing_disabled(&self) -> bool {
        self.shared.indexing_disabled.load(Ordering::SeqCst)
    }

    /// Returns every registered index, ordered by identifier.
    #[must_use]
    pub fn indexes(&self) -> Vec<Arc<Index>> {
        self.shared.catalog.snapshot()
    }

    /// Returns the number of registered indexes.
    #[must_use]
    pub fn index_count(&self) -> usize {
        self.shared.catalog.len()
    }

    /// Disposes every registered index and releases the storage root lock.
    ///
    /// Waits for background recovery to finish first. On-disk state is left
    /// untouched, so another store may open the same root afterwards. Later
    /// calls do nothing.
    pub fn dispose(&self) {
        {
            let _guard = self.shared.write_lock.lock();
            if self.shared.disposed.swap(true, Ordering::SeqCst) {
                return;
            }
        }

        // Recovery checks the disposed flag under the write lock, so once
        // joined nothing else can be registered.
        if let Some(report) = self.wait_for_recovery() {
            debug!(registered = report.registered.len(), "recovery joined during dispose");
        }

        let _guard = self.shared.write_lock.lock();
        let indexes = self.shared.catalog.snapshot();
        for index in &indexes {
            self.shared.catalog.try_remove_by_id(index.id());
            if let Err(err) = index.dispose() {
                warn!(index_id = %index.id(), error = %err, "failed to dispose index");
            }
        }
        if let Some(root) = self.shared.root.lock().take() {
            debug!(path = %root.path().display(), "released index storage root");
        }
        info!(disposed = indexes.len(), "index store disposed");
    }

    /// Returns true once [`IndexStore::dispose`] has been called.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.shared.disposed.load(Ordering::SeqCst)
    }
}

impl Drop for IndexStore {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for IndexStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexStore")
            .field("config", &self.shared.config)
            .field("catalog", &self.shared.catalog)
            .field("initialized", &self.is_initialized())
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

impl Shared {
    fn ensure_open(&self) -> CoreResult<()> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(CoreError::Disposed);
        }
        if !self.initialized.load(Ordering::SeqCst) {
            return Err(CoreError::NotInitialized);
        }
        Ok(())
    }

    fn lookup(&self, index: IndexRef<'_>) -> Option<Arc<Index>> {
        match index {
            IndexRef::Id(id) => self.catalog.try_get_by_id(id),
            IndexRef::Name(name) => self.catalog.try_get_by_name(name),
        }
    }

    fn require(&self, index: IndexRef<'_>) -> CoreResult<Arc<Index>> {
        self.lookup(index)
            .ok_or_else(|| CoreError::not_found(index.to_string()))
    }

    /// Allocates an identifier, then starts, persists and registers a new
    /// index. Caller holds the write lock.
    fn create_new(&self, definition: IndexDefinition) -> CoreResult<IndexId> {
        let id = self.catalog.next_id();
        let location = self.index_dir(id);

        let index = match Index::create(id, definition, location.as_deref()) {
            Ok(index) => Arc::new(index),
            Err(err) => {
                let _ = self.remove_directory(id);
                return Err(err);
            }
        };

        let registered = index
            .start()
            .and_then(|_| index.persist_definition())
            .and_then(|()| self.catalog.add(Arc::clone(&index)));
        if let Err(err) = registered {
            warn!(index_id = %id, index_name = index.name(), error = %err, "index creation failed, discarding");
            let _ = index.dispose();
            let _ = self.remove_directory(id);
            return Err(err);
        }

        info!(index_id = %id, index_name = index.name(), kind = %index.kind(), "index created");
        self.notifier.notify(index.name(), IndexChangeType::Added);
        Ok(id)
    }

    /// Deregisters, disposes and removes a registered index. Caller holds
    /// the write lock.
    fn delete_registered(&self, index: &Arc<Index>) -> CoreResult<()> {
        let id = index.id();
        if self.catalog.try_remove_by_id(id).is_none() {
            return Err(CoreError::not_found(id.to_string()));
        }

        if let Err(err) = index.dispose() {
            warn!(index_id = %id, index_name = index.name(), error = %err, "error disposing deleted index, continuing");
        }
        let removed = self.remove_directory(id);

        info!(index_id = %id, index_name = index.name(), "index deleted");
        self.notifier.notify(index.name(), IndexChangeType::Removed);
        removed
    }

    fn index_dir(&self, id: IndexId) -> Option<PathBuf> {
        self.root.lock().as_ref().map(|root| root.index_dir(id))
    }

    fn remove_directory(&self, id: IndexId) -> CoreResult<()> {
        let root = self.root.lock();
        let Some(root) = root.as_ref() else {
            return Ok(());
        };
        root.remove_index_dir(id)
            .map(|_| ())
            .inspect_err(|err| error!(index_id = %id, error = %err, "failed to remove index directory"))
    }

    /// Body of the recovery thread.
    fn recover(&self, ids: &[IndexId]) -> RecoveryReport {
        let mut report = RecoveryReport::default();
        // dispose joins this thread before releasing the root
        let plan = plan_recovery(ids, |id| match self.index_dir(id) {
            Some(dir) => Index::open(id, &dir),
            None => Ok(None),
        });

        for (id, err) in &plan.failed {
            warn!(index_id = %id, error = %err, "skipping unreadable index directory");
            report.failed.push(*id);
        }
        for id in &plan.incomplete {
            warn!(index_id = %id, "index directory has no definition, leaving it in place");
            report.incomplete.push(*id);
        }
        for (_, index) in plan.ready {
            self.register_recovered(Arc::new(index), &mut report);
        }

        info!(
            registered = report.registered.len(),
            failed = report.failed.len(),
            incomplete = report.incomplete.len(),
            superseded = report.superseded.len(),
            "index recovery finished"
        );
        report
    }

    fn register_recovered(&self, index: Arc<Index>, report: &mut RecoveryReport) {
        let _guard = self.write_lock.lock();
        if self.disposed.load(Ordering::SeqCst) {
            let _ = index.dispose();
            return;
        }

        // Same name twice: the higher identifier is the newer index.
        if let Some(existing) = self.catalog.try_get_by_name(index.name()) {
            let loser = if existing.id() > index.id() {
                Arc::clone(&index)
            } else {
                self.catalog.try_remove_by_id(existing.id());
                report.registered.retain(|id| *id != existing.id());
                existing
            };
            warn!(
                index_id = %loser.id(),
                index_name = loser.name(),
                "recovered index superseded by a newer one with the same name"
            );
            if let Err(err) = loser.dispose() {
                debug!(index_id = %loser.id(), error = %err, "superseded index already disposed");
            }
            let _ = self.remove_directory(loser.id());
            report.superseded.push(loser.id());
            if loser.id() == index.id() {
                return;
            }
        }

        if !self.indexing_disabled.load(Ordering::SeqCst) {
            if let Err(err) = index.start() {
                warn!(index_id = %index.id(), error = %err, "failed to start recovered index");
            }
        }

        match self.catalog.add(Arc::clone(&index)) {
            Ok(()) => {
                debug!(index_id = %index.id(), index_name = index.name(), "index recovered");
                report.registered.push(index.id());
            }
            Err(err) => {
                error!(index_id = %index.id(), error = %err, "failed to register recovered index");
                let _ = index.dispose();
                report.failed.push(index.id());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{IndexField, LockMode, SortOption, StaticIndexDefinition};
    use crate::handle::IndexState;
    use tempfile::tempdir;

    fn memory_store() -> IndexStore {
        let store = IndexStore::new(IndexingConfig::in_memory().worker_threads(2)).unwrap();
        store.initialize().unwrap();
        store
    }

    fn users(fields: &[&str]) -> AutoIndexDefinition {
        AutoIndexDefinition::new(
            "Users",
            fields.iter().map(|f| IndexField::new(*f)).collect(),
        )
        .unwrap()
    }

    fn orders_totals() -> StaticIndexDefinition {
        StaticIndexDefinition::builder("Orders/Totals")
            .collection("Orders")
            .map("from o in docs.Orders select new { o.Company, o.Total }")
            .reduce("from r in results group r by r.Company into g select g")
            .build()
            .unwrap()
    }

    fn orders_search() -> StaticIndexDefinition {
        StaticIndexDefinition::builder("Orders/Search")
            .collection("Orders")
            .map("from o in docs.Orders select new { o.Company }")
            .build()
            .unwrap()
    }

    #[test]
    fn mutations_require_initialize() {
        let store = IndexStore::new(IndexingConfig::in_memory()).unwrap();
        assert!(matches!(
            store.create_auto_index(users(&["Name"])),
            Err(CoreError::NotInitialized)
        ));
        store.initialize().unwrap();
        assert!(matches!(store.initialize(), Err(CoreError::AlreadyInitialized)));
        assert!(store.wait_for_recovery().is_none());
    }

    #[test]
    fn create_is_idempotent() {
        let store = memory_store();
        let first = store.create_auto_index(users(&["Name", "Age"])).unwrap();
        let second = store.create_auto_index(users(&["Age", "Name"])).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.index_count(), 1);
        assert!(store.get_index(first).unwrap().is_running());
    }

    #[test]
    fn changed_definition_replaces() {
        let store = memory_store();
        let first = store.create_auto_index(users(&["Name"])).unwrap();

        let changed = AutoIndexDefinition::new(
            "Users",
            vec![IndexField::new("Name").stored(crate::FieldStorage::No)],
        )
        .unwrap();
        assert_eq!(store.create_auto_index(changed).unwrap(), first);

        let authored = StaticIndexDefinition::builder("Users/Names")
            .collection("Users")
            .map("from u in docs.Users select new { u.Name }")
            .build()
            .unwrap();
        let a = store.create_index(authored.clone()).unwrap();
        let reformatted = StaticIndexDefinition::builder("Users/Names")
            .collection("Users")
            .map("from u in docs.Users   select new { u.Name }")
            .build()
            .unwrap();
        assert_eq!(store.create_index(reformatted).unwrap(), a);

        let different = StaticIndexDefinition::builder("Users/Names")
            .collection("Users")
            .map("from u in docs.Users select new { u.Name, u.Email }")
            .build()
            .unwrap();
        let b = store.create_index(different).unwrap();
        assert!(b > a);
        assert!(store.get_index(a).is_none());
        assert_eq!(store.get_index("users/names").unwrap().id(), b);
    }

    #[test]
    fn locked_error_rejects_without_change() {
        let store = memory_store();
        let id = store
            .create_auto_index(users(&["Name"]).with_lock_mode(LockMode::LockedError))
            .unwrap();

        let result = store.create_auto_index(users(&["Name"]));
        assert!(matches!(result, Err(CoreError::LockConflict { .. })));
        assert_eq!(store.index_count(), 1);
        assert_eq!(store.get_index("Auto/Users/ByName").unwrap().id(), id);
    }

    #[test]
    fn locked_ignore_returns_existing() {
        let store = memory_store();
        let id = store
            .create_auto_index(users(&["Name"]).with_lock_mode(LockMode::LockedIgnore))
            .unwrap();
        let sorted = AutoIndexDefinition::new(
            "Users",
            vec![IndexField::new("Name").sorted(SortOption::String)],
        )
        .unwrap();
        // different name, so a separate index
        assert_ne!(store.create_auto_index(sorted).unwrap(), id);
        assert_eq!(store.create_auto_index(users(&["Name"])).unwrap(), id);
    }

    #[test]
    fn side_by_side_is_unsupported() {
        let store = memory_store();
        store
            .create_auto_index(users(&["Name"]).with_lock_mode(LockMode::SideBySide))
            .unwrap();
        assert!(matches!(
            store.create_auto_index(users(&["Name"])),
            Err(CoreError::Unsupported { .. })
        ));
    }

    #[test]
    fn delete_is_total() {
        let store = memory_store();
        let id = store.create_auto_index(users(&["Name"])).unwrap();
        let handle = store.get_index(id).unwrap();

        store.delete_index("AUTO/USERS/BYNAME").unwrap();
        assert!(store.get_index(id).is_none());
        assert!(store.get_index("Auto/Users/ByName").is_none());
        assert_eq!(handle.state(), IndexState::Disposed);
        assert!(store.delete_index(id).unwrap_err().is_not_found());
        assert!(store.reset_index(id).unwrap_err().is_not_found());
        assert!(store.start_index(id).unwrap_err().is_not_found());
    }

    #[test]
    fn reset_allocates_new_id() {
        let store = memory_store();
        let id = store.create_auto_index(users(&["Name"])).unwrap();
        let new_id = store.reset_index(id).unwrap();

        assert!(new_id > id);
        assert!(store.get_index(id).is_none());
        let index = store.get_index(new_id).unwrap();
        assert_eq!(index.name(), "Auto/Users/ByName");
        assert!(index.is_running());
    }

    #[test]
    fn reset_of_authored_index_is_unsupported() {
        let store = memory_store();
        let id = store.create_index(orders_search()).unwrap();
        assert!(matches!(
            store.reset_index(id),
            Err(CoreError::UnsupportedReset { .. })
        ));
        assert!(store.get_index(id).is_some());
    }

    #[test]
    fn single_start_stop() {
        let store = memory_store();
        let id = store.create_auto_index(users(&["Name"])).unwrap();

        store.stop_index(id).unwrap();
        store.stop_index(id).unwrap();
        assert_eq!(store.get_index(id).unwrap().state(), IndexState::Stopped);
        store.start_index("Auto/Users/ByName").unwrap();
        assert!(store.get_index(id).unwrap().is_running());
    }

    #[test]
    fn bulk_operations_filter_by_kind() {
        let store = memory_store();
        let auto = store.create_auto_index(users(&["Name"])).unwrap();
        let map = store.create_index(orders_search()).unwrap();
        let reduce = store.create_index(orders_totals()).unwrap();

        assert_eq!(store.stop_map_reduce_indexes(), 1);
        assert!(!store.get_index(reduce).unwrap().is_running());
        assert!(store.get_index(map).unwrap().is_running());

        assert_eq!(store.stop_map_indexes(), 2);
        assert!(!store.get_index(auto).unwrap().is_running());

        assert_eq!(store.start_map_reduce_indexes(), 1);
        assert_eq!(store.start_map_indexes(), 2);
        assert_eq!(store.stop_indexing(), 3);
        assert_eq!(store.start_indexing(), 3);
        assert!(store.indexes().iter().all(|i| i.is_running()));
    }

    #[test]
    fn bulk_operations_count_only_state_changes() {
        let store = memory_store();
        store.create_auto_index(users(&["Name"])).unwrap();
        store.create_index(orders_search()).unwrap();
        let reduce = store.create_index(orders_totals()).unwrap();

        assert_eq!(store.stop_indexing(), 3);
        assert_eq!(store.stop_indexing(), 0);

        store.start_index(reduce).unwrap();
        assert_eq!(store.start_indexing(), 2);
        assert_eq!(store.start_indexing(), 0);
        assert_eq!(store.start_map_reduce_indexes(), 0);
    }

    #[test]
    fn disabled_indexing_skips_bulk_operations() {
        let store = memory_store();
        let id = store.create_auto_index(users(&["Name"])).unwrap();

        store.set_indexing_disabled(true);
        assert_eq!(store.stop_indexing(), 0);
        assert!(store.get_index(id).unwrap().is_running());

        store.set_indexing_disabled(false);
        assert_eq!(store.stop_indexing(), 1);
    }

    #[test]
    fn notifications() {
        let store = memory_store();
        let rx = store.change_feed().unwrap().subscribe();

        let id = store.create_auto_index(users(&["Name"])).unwrap();
        store.create_auto_index(users(&["Name"])).unwrap();
        store.delete_index(id).unwrap();

        let changes: Vec<_> = rx.try_iter().map(|e| e.change).collect();
        assert_eq!(changes, [IndexChangeType::Added, IndexChangeType::Removed]);
    }

    #[test]
    fn dispose_is_idempotent() {
        let store = memory_store();
        let id = store.create_auto_index(users(&["Name"])).unwrap();
        let handle = store.get_index(id).unwrap();

        store.dispose();
        store.dispose();
        assert!(store.is_disposed());
        assert_eq!(handle.state(), IndexState::Disposed);
        assert!(matches!(
            store.create_auto_index(users(&["Age"])),
            Err(CoreError::Disposed)
        ));
    }

    #[test]
    fn persistent_create_and_delete_touch_disk() {
        let temp = tempdir().unwrap();
        let config = IndexingConfig::new().index_storage_path(temp.path().join("Indexes"));
        let store = IndexStore::new(config).unwrap();
        store.initialize().unwrap();
        assert!(store.wait_for_recovery().unwrap().registered.is_empty());

        let id = store.create_auto_index(users(&["Name"])).unwrap();
        let dir = temp.path().join("Indexes").join(id.dir_name());
        assert!(dir.is_dir());

        let replaced = store.create_auto_index(
            AutoIndexDefinition::new(
                "Users",
                vec![IndexField::new("Name").stored(crate::FieldStorage::Yes)],
            )
            .unwrap(),
        );
        // storage is normalized for auto indexes, so nothing changes
        assert_eq!(replaced.unwrap(), id);

        store.delete_index(id).unwrap();
        assert!(!dir.exists());
    }

    #[test]
    fn dispose_releases_the_root_lock() {
        let temp = tempdir().unwrap();
        let config = IndexingConfig::new().index_storage_path(temp.path());

        let first = IndexStore::new(config.clone()).unwrap();
        first.initialize().unwrap();
        first.create_auto_index(users(&["Name"])).unwrap();
        first.dispose();

        let second = IndexStore::new(config).unwrap();
        second.initialize().unwrap();
        let report = second.wait_for_recovery().unwrap();
        assert_eq!(report.registered.len(), 1);
        // the first store is still alive here
        assert!(first.is_disposed());
    }

    #[test]
    fn second_store_on_same_root_is_locked_out() {
        let temp = tempdir().unwrap();
        let config = IndexingConfig::new().index_storage_path(temp.path());

        let first = IndexStore::new(config.clone()).unwrap();
        first.initialize().unwrap();

        let second = IndexStore::new(config).unwrap();
        assert!(matches!(second.initialize(), Err(CoreError::StorageRootLocked)));
        assert!(!second.is_initialized());
    }
}
