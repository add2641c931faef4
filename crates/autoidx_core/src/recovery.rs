//! Startup recovery planning.
//!
//! Recovery turns a directory listing into registrations. The steps that
//! decide *what* to register are pure and take the listing and a loader as
//! inputs, so they run in tests without touching a disk:
//!
//! 1. [`parse_index_directory_ids`] keeps names that are index identifiers
//! 2. [`plan_recovery`] loads each identifier and sorts the outcomes into
//!    ready, incomplete and failed
//!
//! The lifecycle manager then registers the ready entries and reports the
//! result as a [`RecoveryReport`].

use crate::error::{CoreError, CoreResult};
use crate::types::IndexId;

/// Extracts index identifiers from directory names, ascending and unique.
///
/// ```rust
/// use autoidx_core::{parse_index_directory_ids, IndexId};
///
/// let ids = parse_index_directory_ids(["7", "LOCK", "2", "tmp-3", "0"]);
/// assert_eq!(ids, vec![IndexId::new(2), IndexId::new(7)]);
/// ```
pub fn parse_index_directory_ids<I, S>(listing: I) -> Vec<IndexId>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut ids: Vec<IndexId> = listing
        .into_iter()
        .filter_map(|name| IndexId::from_dir_name(name.as_ref()))
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Outcome of loading every candidate directory.
#[derive(Debug)]
pub struct RecoveryPlan<T> {
    /// Loaded entries to register, in identifier order.
    pub ready: Vec<(IndexId, T)>,
    /// Directories without a persisted definition.
    pub incomplete: Vec<IndexId>,
    /// Directories that could not be loaded, with the reason.
    pub failed: Vec<(IndexId, CoreError)>,
}

impl<T> RecoveryPlan<T> {
    /// Returns the number of directories examined.
    #[must_use]
    pub fn examined(&self) -> usize {
        self.ready.len() + self.incomplete.len() + self.failed.len()
    }
}

/// Loads every identifier with `loader` and classifies the results.
///
/// The loader returns `Ok(Some(_))` for a usable entry, `Ok(None)` for a
/// directory that has no definition yet, and `Err(_)` for one that cannot be
/// read. A failure never stops the remaining identifiers from loading.
pub fn plan_recovery<T, F>(ids: &[IndexId], mut loader: F) -> RecoveryPlan<T>
where
    F: FnMut(IndexId) -> CoreResult<Option<T>>,
{
    let mut plan = RecoveryPlan {
        ready: Vec::with_capacity(ids.len()),
        incomplete: Vec::new(),
        failed: Vec::new(),
    };

    for &id in ids {
        match loader(id) {
            Ok(Some(entry)) => plan.ready.push((id, entry)),
            Ok(None) => plan.incomplete.push(id),
            Err(err) => plan.failed.push((id, err)),
        }
    }
    plan
}

/// Summary of a finished recovery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Indexes now in the catalog.
    pub registered: Vec<IndexId>,
    /// Directories that could not be read and were left in place.
    pub failed: Vec<IndexId>,
    /// Directories with no definition, left in place.
    pub incomplete: Vec<IndexId>,
    /// Recovered indexes dropped because a newer index has the same name.
    pub superseded: Vec<IndexId>,
}
