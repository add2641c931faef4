//! CLI command implementations.

pub mod inspect;
pub mod list;
pub mod verify;

use autoidx_core::{
    list_subdirectories, load_definition, parse_index_directory_ids, CoreError, IndexDefinition,
    IndexId,
};
use autoidx_storage::Environment;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors reported by the commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The root does not exist or is not a directory.
    #[error("no index storage root at {0:?}")]
    MissingRoot(PathBuf),

    /// No directory exists for the requested index.
    #[error("no index directory for id {0}")]
    MissingIndex(IndexId),

    /// `verify` found problems.
    #[error("verification failed: {0} problem(s)")]
    VerificationFailed(usize),

    /// Error from the index catalog.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// JSON output error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result alias for the commands.
pub type CommandResult<T> = Result<T, CommandError>;

/// What a single index directory holds, as recovery would see it.
#[derive(Debug)]
pub enum DirState {
    /// A decodable definition.
    Ready(IndexDefinition),
    /// The environment has no definition yet.
    Incomplete,
    /// The environment or its definition could not be read.
    Failed(CoreError),
}

/// Returns the sorted index ids under `root` and the entries that are not
/// index directories.
pub fn scan_root(root: &Path) -> CommandResult<(Vec<IndexId>, Vec<String>)> {
    if !root.is_dir() {
        return Err(CommandError::MissingRoot(root.to_path_buf()));
    }
    let entries = list_subdirectories(root)?;
    let ids = parse_index_directory_ids(&entries);
    let foreign = entries
        .into_iter()
        .filter(|name| IndexId::from_dir_name(name).is_none())
        .collect();
    Ok((ids, foreign))
}

/// Opens the environment in `dir` and reads its definition.
pub fn read_dir_state(dir: &Path) -> DirState {
    let result = Environment::open(dir)
        .map_err(CoreError::from)
        .and_then(|env| {
            let txn = env.read_txn()?;
            let definition = load_definition(&txn);
            drop(txn);
            env.close();
            definition
        });
    match result {
        Ok(Some(definition)) => DirState::Ready(definition),
        Ok(None) => DirState::Incomplete,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "Failed to read index directory");
            DirState::Failed(e)
        }
    }
}

/// Returns the on-disk size of every file directly inside `dir`.
pub fn directory_size(dir: &Path) -> u64 {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .filter_map(|entry| entry.metadata().ok())
                .filter(|meta| meta.is_file())
                .map(|meta| meta.len())
                .sum()
        })
        .unwrap_or(0)
}

/// Formats a byte count for text output.
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
