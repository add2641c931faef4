//! Index storage root layout.
//!
//! ```text
//! <index_storage_path>/
//! ├─ LOCK        # Advisory lock, one process at a time
//! ├─ 1/          # Environment of index 1
//! ├─ 2/
//! └─ ...
//! ```
//!
//! Every index lives in a directory named by its decimal identifier.
//! Anything else under the root is ignored by recovery.

use crate::error::{CoreError, CoreResult};
use crate::types::IndexId;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

const LOCK_FILE: &str = "LOCK";

/// The index storage root, held exclusively by this process.
///
/// The lock is released when the value is dropped.
#[derive(Debug)]
pub struct IndexStorageRoot {
    path: PathBuf,
    _lock_file: File,
}

impl IndexStorageRoot {
    /// Opens the root, creating it if missing, and takes its lock.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StorageRootLocked`] if another holder has the
    /// lock, or an I/O error if the path is not a usable directory.
    pub fn open(path: &Path) -> CoreResult<Self> {
        fs::create_dir_all(path)?;
        if !path.is_dir() {
            return Err(CoreError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("index storage path is not a directory: {}", path.display()),
            )));
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.join(LOCK_FILE))?;
        if lock_file.try_lock_exclusive().is_err() {
            return Err(CoreError::StorageRootLocked);
        }

        Ok(Self {
            path: path.to_path_buf(),
            _lock_file: lock_file,
        })
    }

    /// Returns the root path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the directory of index `id`.
    #[must_use]
    pub fn index_dir(&self, id: IndexId) -> PathBuf {
        self.path.join(id.dir_name())
    }

    /// Lists the names of all sub-directories of the root.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the root cannot be read.
    pub fn list_entries(&self) -> CoreResult<Vec<String>> {
        list_subdirectories(&self.path)
    }

    /// Removes the directory of index `id` and everything in it.
    ///
    /// Returns `false` if there was nothing to remove.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the removal fails.
    pub fn remove_index_dir(&self, id: IndexId) -> CoreResult<bool> {
        match fs::remove_dir_all(self.index_dir(id)) {
            Ok(()) => {
                self.sync()?;
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    #[cfg(unix)]
    fn sync(&self) -> CoreResult<()> {
        File::open(&self.path)?.sync_all()?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn sync(&self) -> CoreResult<()> {
        Ok(())
    }
}

/// Lists the names of all sub-directories of `path`, sorted.
///
/// Reads without taking the root lock, so offline tools can inspect a root
/// that a running process owns.
///
/// # Errors
///
/// Returns an I/O error if `path` cannot be read.
pub fn list_subdirectories(path: &Path) -> CoreResult<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}
