//! File-based snapshot store for persistent storage.

use crate::error::StorageResult;
use crate::store::SnapshotStore;
use parking_lot::Mutex;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Name of the committed snapshot file inside the store directory.
const SNAPSHOT_FILE: &str = "trees.cbor";
/// Temporary file for atomic snapshot writes.
const SNAPSHOT_TEMP: &str = "trees.cbor.tmp";

/// A directory-backed snapshot store.
///
/// ```text
/// <dir>/
/// ├─ trees.cbor        # last committed snapshot
/// └─ trees.cbor.tmp    # in-flight write (only during a commit)
/// ```
///
/// # Durability
///
/// `store` uses the write-then-rename pattern:
/// 1. Write to a temporary file
/// 2. Sync the temporary file to disk
/// 3. Rename it over the snapshot file
/// 4. Fsync the directory so the rename is durable
///
/// # Example
///
/// ```no_run
/// use autoidx_storage::{SnapshotStore, FileStore};
/// use std::path::Path;
///
/// let store = FileStore::open(Path::new("Indexes/1")).unwrap();
/// store.store(b"snapshot").unwrap();
/// ```
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Opens a store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: &Path) -> StorageResult<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            write_lock: Mutex::new(()),
        })
    }

    /// Returns the path of the committed snapshot file.
    #[must_use]
    pub fn snapshot_path(&self) -> PathBuf {
        self.dir.join(SNAPSHOT_FILE)
    }

    #[cfg(unix)]
    fn sync_directory(&self) -> StorageResult<()> {
        File::open(&self.dir)?.sync_all()?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn sync_directory(&self) -> StorageResult<()> {
        // NTFS journaling covers rename durability
        Ok(())
    }
}

impl SnapshotStore for FileStore {
    fn load(&self) -> StorageResult<Option<Vec<u8>>> {
        let path = self.snapshot_path();
        if !path.exists() {
            return Ok(None);
        }

        let mut data = Vec::new();
        File::open(&path)?.read_to_end(&mut data)?;

        if data.is_empty() {
            return Ok(None);
        }
        Ok(Some(data))
    }

    fn store(&self, data: &[u8]) -> StorageResult<()> {
        let _guard = self.write_lock.lock();
        let temp_path = self.dir.join(SNAPSHOT_TEMP);

        let mut file = File::create(&temp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, self.snapshot_path())?;
        self.sync_directory()
    }

    fn location(&self) -> Option<&Path> {
        Some(&self.dir)
    }
}
