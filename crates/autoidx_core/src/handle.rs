//! Live index handles.

use crate::definition::{IndexDefinition, IndexKind};
use crate::error::{CoreError, CoreResult};
use crate::persistence::{load_definition, persist_definition};
use crate::types::IndexId;
use autoidx_storage::Environment;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Runtime state of an index.
///
/// ```text
/// Created ──start──▶ Running ◀──start/stop──▶ Stopped
///    │                  │                       │
///    └──────────────────┴──────dispose──────────┴──▶ Disposed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    /// Built but never started.
    Created,
    /// Processing documents.
    Running,
    /// Not processing documents.
    Stopped,
    /// Released; every further operation fails.
    Disposed,
}

/// A live index: identifier, definition, state and its own storage
/// environment.
///
/// Handles are shared as `Arc<Index>` between the catalog and callers.
/// Start and stop may be called from any thread.
pub struct Index {
    id: IndexId,
    definition: IndexDefinition,
    kind: IndexKind,
    state: Mutex<IndexState>,
    env: Environment,
    location: Option<PathBuf>,
}

impl Index {
    /// Creates a new handle in the `Created` state.
    ///
    /// With a `location` the environment lives in that directory, which is
    /// created if missing; without one it lives in memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment cannot be opened.
    pub fn create(
        id: IndexId,
        definition: IndexDefinition,
        location: Option<&Path>,
    ) -> CoreResult<Self> {
        let env = match location {
            Some(dir) => Environment::open(dir)?,
            None => Environment::in_memory(),
        };
        Ok(Self::with_env(id, definition, env, location))
    }

    /// Reopens the index stored in `dir` from its persisted definition.
    ///
    /// Returns `Ok(None)` if the directory holds no definition yet.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Storage`] if the environment is unreadable and
    /// [`CoreError::CorruptDefinition`] if the definition record is.
    pub fn open(id: IndexId, dir: &Path) -> CoreResult<Option<Self>> {
        let env = Environment::open(dir)?;
        let definition = load_definition(&env.read_txn()?)?;
        match definition {
            Some(definition) => Ok(Some(Self::with_env(id, definition, env, Some(dir)))),
            None => {
                env.close();
                Ok(None)
            }
        }
    }

    fn with_env(
        id: IndexId,
        definition: IndexDefinition,
        env: Environment,
        location: Option<&Path>,
    ) -> Self {
        let kind = definition.kind();
        Self {
            id,
            definition,
            kind,
            state: Mutex::new(IndexState::Created),
            env,
            location: location.map(Path::to_path_buf),
        }
    }

    /// Returns the identifier.
    #[must_use]
    pub fn id(&self) -> IndexId {
        self.id
    }

    /// Returns the name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.definition.name()
    }

    /// Returns the definition.
    #[must_use]
    pub fn definition(&self) -> &IndexDefinition {
        &self.definition
    }

    /// Returns the kind.
    #[must_use]
    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> IndexState {
        *self.state.lock()
    }

    /// Returns true if the index is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state() == IndexState::Running
    }

    /// Returns the index directory, `None` for in-memory indexes.
    #[must_use]
    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    /// Starts the index. Returns false if it was already running.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IndexDisposed`] after disposal.
    pub fn start(&self) -> CoreResult<bool> {
        self.transition(IndexState::Running)
    }

    /// Stops the index. Returns false if it was already stopped.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IndexDisposed`] after disposal.
    pub fn stop(&self) -> CoreResult<bool> {
        self.transition(IndexState::Stopped)
    }

    fn transition(&self, target: IndexState) -> CoreResult<bool> {
        let mut state = self.state.lock();
        match *state {
            IndexState::Disposed => Err(CoreError::IndexDisposed { id: self.id }),
            current if current == target => Ok(false),
            current => {
                debug!(index_id = %self.id, index_name = %self.name(), from = ?current, to = ?target, "index state change");
                *state = target;
                Ok(true)
            }
        }
    }

    /// Writes the definition into this index's environment and commits.
    ///
    /// # Errors
    ///
    /// Returns an error if the write transaction fails.
    pub fn persist_definition(&self) -> CoreResult<()> {
        let mut txn = self.env.write_txn()?;
        persist_definition(&self.definition, &mut txn)?;
        txn.commit()?;
        Ok(())
    }

    /// Stops the index and releases its environment.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IndexDisposed`] if already disposed.
    pub fn dispose(&self) -> CoreResult<()> {
        let mut state = self.state.lock();
        if *state == IndexState::Disposed {
            return Err(CoreError::IndexDisposed { id: self.id });
        }
        *state = IndexState::Disposed;
        self.env.close();
        debug!(index_id = %self.id, index_name = %self.name(), "index disposed");
        Ok(())
    }
}

impl std::fmt::Debug for Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Index")
            .field("id", &self.id)
            .field("name", &self.name())
            .field("kind", &self.kind)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{AutoIndexDefinition, IndexField};
    use tempfile::tempdir;

    fn users_by_name() -> IndexDefinition {
        AutoIndexDefinition::new("Users", vec![IndexField::new("Name")])
            .unwrap()
            .into()
    }

    #[test]
    fn lifecycle() {
        let index = Index::create(IndexId::new(1), users_by_name(), None).unwrap();
        assert_eq!(index.state(), IndexState::Created);
        assert_eq!(index.kind(), IndexKind::AutoMap);

        assert!(index.start().unwrap());
        assert!(!index.start().unwrap());
        assert!(index.is_running());

        assert!(index.stop().unwrap());
        assert!(!index.stop().unwrap());
        assert_eq!(index.state(), IndexState::Stopped);

        index.dispose().unwrap();
        assert_eq!(index.state(), IndexState::Disposed);
        assert!(matches!(index.start(), Err(CoreError::IndexDisposed { .. })));
        assert!(matches!(index.dispose(), Err(CoreError::IndexDisposed { .. })));
    }

    #[test]
    fn persisted_definition_reopens() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("1");

        let index = Index::create(IndexId::new(1), users_by_name(), Some(&path)).unwrap();
        index.persist_definition().unwrap();
        index.dispose().unwrap();

        let reopened = Index::open(IndexId::new(1), &path).unwrap().unwrap();
        assert_eq!(reopened.definition(), &users_by_name());
        assert_eq!(reopened.location(), Some(path.as_path()));
        assert_eq!(reopened.state(), IndexState::Created);
    }

    #[test]
    fn empty_directory_opens_as_absent() {
        let dir = tempdir().unwrap();
        assert!(Index::open(IndexId::new(3), dir.path()).unwrap().is_none());
    }

    #[test]
    fn persist_after_dispose_fails() {
        let index = Index::create(IndexId::new(1), users_by_name(), None).unwrap();
        index.dispose().unwrap();
        assert!(index.persist_definition().is_err());
    }
}
