//! Index store configuration.

use std::path::PathBuf;

/// Default directory holding one sub-directory per index.
pub const DEFAULT_INDEX_STORAGE_PATH: &str = "Indexes";

/// Configuration for an [`crate::IndexStore`].
#[derive(Debug, Clone)]
pub struct IndexingConfig {
    /// Root directory for index directories (`<root>/<id>/`).
    pub index_storage_path: PathBuf,

    /// Keep everything in memory: no directories, no recovery.
    pub run_in_memory: bool,

    /// Turn bulk start/stop operations into no-ops.
    pub indexing_disabled: bool,

    /// Size of the worker pool used for bulk start/stop (0 = one per CPU).
    pub worker_threads: usize,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            index_storage_path: PathBuf::from(DEFAULT_INDEX_STORAGE_PATH),
            run_in_memory: false,
            indexing_disabled: false,
            worker_threads: 0,
        }
    }
}

impl IndexingConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an in-memory configuration.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default().run_in_memory(true)
    }

    /// Sets the index storage root.
    #[must_use]
    pub fn index_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.index_storage_path = path.into();
        self
    }

    /// Sets whether to run without persistence.
    #[must_use]
    pub const fn run_in_memory(mut self, value: bool) -> Self {
        self.run_in_memory = value;
        self
    }

    /// Sets whether bulk indexing operations are disabled.
    #[must_use]
    pub const fn indexing_disabled(mut self, value: bool) -> Self {
        self.indexing_disabled = value;
        self
    }

    /// Sets the bulk operation worker count.
    #[must_use]
    pub const fn worker_threads(mut self, count: usize) -> Self {
        self.worker_threads = count;
        self
    }

    /// Returns true when index state lives on disk.
    #[must_use]
    pub const fn is_persistent(&self) -> bool {
        !self.run_in_memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = IndexingConfig::default();
        assert_eq!(config.index_storage_path, PathBuf::from("Indexes"));
        assert!(config.is_persistent());
        assert!(!config.indexing_disabled);
        assert_eq!(config.worker_threads, 0);
    }

    #[test]
    fn builder_pattern() {
        let config = IndexingConfig::new()
            .index_storage_path("/var/lib/db/Indexes")
            .indexing_disabled(true)
            .worker_threads(4);

        assert_eq!(
            config.index_storage_path,
            PathBuf::from("/var/lib/db/Indexes")
        );
        assert!(config.indexing_disabled);
        assert_eq!(config.worker_threads, 4);
    }

    #[test]
    fn in_memory_is_not_persistent() {
        assert!(!IndexingConfig::in_memory().is_persistent());
    }
}
