//! Concurrent registry of live indexes.
//!
//! Two views over one set of handles, guarded by a single lock so they can
//! never disagree:
//!
//! - `by_id`: identifier → handle
//! - `by_name`: lowercased name → handle
//!
//! Identifiers come from an atomic counter that only moves forward, so an
//! identifier is never handed out twice within a process, even after the
//! index it named is gone.

use crate::definition::name_key;
use crate::error::{CoreError, CoreResult};
use crate::handle::Index;
use crate::types::IndexId;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct CatalogInner {
    by_id: HashMap<IndexId, Arc<Index>>,
    by_name: HashMap<String, Arc<Index>>,
}

/// Registry of live index handles keyed by identifier and by name.
///
/// Lookups take a shared lock; `add` and `try_remove_by_id` take the
/// exclusive lock for the duration of both map updates.
pub struct IndexCatalog {
    inner: RwLock<CatalogInner>,
    next_id: AtomicU64,
}

impl IndexCatalog {
    /// Creates an empty catalog. The first identifier handed out is 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(CatalogInner::default()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Allocates a fresh identifier.
    pub fn next_id(&self) -> IndexId {
        IndexId::new(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Makes sure every later allocation is greater than `id`.
    ///
    /// Returns false, leaving the allocator untouched, if `id` is the
    /// largest representable identifier.
    pub fn seed_past(&self, id: IndexId) -> bool {
        match id.as_u64().checked_add(1) {
            Some(next) => {
                self.next_id.fetch_max(next, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    /// Registers a handle under its identifier and name.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateName`] or [`CoreError::DuplicateId`] if
    /// either key is taken; the catalog is left unchanged.
    pub fn add(&self, index: Arc<Index>) -> CoreResult<()> {
        let key = name_key(index.name());
        let mut inner = self.inner.write();

        if inner.by_name.contains_key(&key) {
            return Err(CoreError::DuplicateName {
                name: index.name().to_string(),
            });
        }
        if inner.by_id.contains_key(&index.id()) {
            return Err(CoreError::DuplicateId { id: index.id() });
        }

        self.seed_past(index.id());
        inner.by_id.insert(index.id(), Arc::clone(&index));
        inner.by_name.insert(key, index);
        Ok(())
    }

    /// Looks up a handle by identifier.
    #[must_use]
    pub fn try_get_by_id(&self, id: IndexId) -> Option<Arc<Index>> {
        self.inner.read().by_id.get(&id).cloned()
    }

    /// Looks up a handle by name, ignoring case.
    #[must_use]
    pub fn try_get_by_name(&self, name: &str) -> Option<Arc<Index>> {
        self.inner.read().by_name.get(&name_key(name)).cloned()
    }

    /// Removes a handle from both views and returns it.
    pub fn try_remove_by_id(&self, id: IndexId) -> Option<Arc<Index>> {
        let mut inner = self.inner.write();
        let index = inner.by_id.remove(&id)?;
        inner.by_name.remove(&name_key(index.name()));
        Some(index)
    }

    /// Returns every registered handle, ordered by identifier.
    ///
    /// The result is a copy: indexes added or removed afterwards are not
    /// reflected in it.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<Index>> {
        let mut indexes: Vec<_> = self.inner.read().by_id.values().cloned().collect();
        indexes.sort_by_key(|index| index.id());
        indexes
    }

    /// Returns the number of registered handles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().by_id.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for IndexCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for IndexCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexCatalog")
            .field("len", &self.len())
            .field("next_id", &self.next_id.load(Ordering::SeqCst))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{AutoIndexDefinition, IndexField};
    use std::thread;

    fn index(id: u64, field: &str) -> Arc<Index> {
        let def = AutoIndexDefinition::new("Users", vec![IndexField::new(field)]).unwrap();
        Arc::new(Index::create(IndexId::new(id), def.into(), None).unwrap())
    }

    #[test]
    fn ids_are_monotonic() {
        let catalog = IndexCatalog::new();
        assert_eq!(catalog.next_id(), IndexId::new(1));
        assert_eq!(catalog.next_id(), IndexId::new(2));

        catalog.seed_past(IndexId::new(10));
        assert_eq!(catalog.next_id(), IndexId::new(11));

        catalog.seed_past(IndexId::new(3));
        assert_eq!(catalog.next_id(), IndexId::new(12));
    }

    #[test]
    fn seeding_past_the_last_id_is_refused() {
        let catalog = IndexCatalog::new();
        assert!(catalog.seed_past(IndexId::new(u64::MAX - 1)));
        assert!(!catalog.seed_past(IndexId::new(u64::MAX)));
        assert_eq!(catalog.next_id(), IndexId::new(u64::MAX));

        let fresh = IndexCatalog::new();
        assert!(!fresh.seed_past(IndexId::new(u64::MAX)));
        assert_eq!(fresh.next_id(), IndexId::new(1));
    }

    #[test]
    fn add_and_lookup() {
        let catalog = IndexCatalog::new();
        catalog.add(index(1, "Name")).unwrap();

        assert_eq!(catalog.try_get_by_id(IndexId::new(1)).unwrap().name(), "Auto/Users/ByName");
        assert!(catalog.try_get_by_name("auto/users/byname").is_some());
        assert!(catalog.try_get_by_name("Auto/Users/ByAge").is_none());
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn add_bumps_allocator() {
        let catalog = IndexCatalog::new();
        catalog.add(index(7, "Name")).unwrap();
        assert_eq!(catalog.next_id(), IndexId::new(8));
    }

    #[test]
    fn duplicates_rejected() {
        let catalog = IndexCatalog::new();
        catalog.add(index(1, "Name")).unwrap();

        assert!(matches!(
            catalog.add(index(2, "Name")),
            Err(CoreError::DuplicateName { .. })
        ));
        assert!(matches!(
            catalog.add(index(1, "Age")),
            Err(CoreError::DuplicateId { .. })
        ));
        assert_eq!(catalog.len(), 1);
        assert!(catalog.try_get_by_name("Auto/Users/ByAge").is_none());
    }

    #[test]
    fn remove_clears_both_views() {
        let catalog = IndexCatalog::new();
        catalog.add(index(1, "Name")).unwrap();

        let removed = catalog.try_remove_by_id(IndexId::new(1)).unwrap();
        assert_eq!(removed.id(), IndexId::new(1));
        assert!(catalog.try_get_by_id(IndexId::new(1)).is_none());
        assert!(catalog.try_get_by_name("Auto/Users/ByName").is_none());
        assert!(catalog.try_remove_by_id(IndexId::new(1)).is_none());
        assert!(catalog.is_empty());

        // the name is free again
        catalog.add(index(2, "Name")).unwrap();
    }

    #[test]
    fn snapshot_is_ordered() {
        let catalog = IndexCatalog::new();
        catalog.add(index(3, "C")).unwrap();
        catalog.add(index(1, "A")).unwrap();
        catalog.add(index(2, "B")).unwrap();

        let ids: Vec<_> = catalog.snapshot().iter().map(|i| i.id().as_u64()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn concurrent_allocation_is_unique() {
        let catalog = Arc::new(IndexCatalog::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let catalog = Arc::clone(&catalog);
                thread::spawn(move || (0..100).map(|_| catalog.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut all: Vec<_> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 800);
    }
}
