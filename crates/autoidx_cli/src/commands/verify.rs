//! Verify command implementation.
//!
//! Replays what startup recovery would decide for every directory, without
//! loading anything into a catalog.

use super::{read_dir_state, scan_root, CommandError, CommandResult, DirState};
use autoidx_core::{name_key, IndexId};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Verification result.
#[derive(Debug, Default)]
pub struct VerifyResult {
    /// Directories that would be registered.
    pub valid: Vec<IndexId>,
    /// Directories without a definition.
    pub incomplete: Vec<IndexId>,
    /// Directories whose environment or definition cannot be read.
    pub failed: Vec<(IndexId, String)>,
    /// Directories that would lose a name collision, with the winning id.
    pub superseded: Vec<(IndexId, IndexId)>,
    /// Entries that are not index directories.
    pub foreign: Vec<String>,
}

impl VerifyResult {
    /// Counts the problems, optionally including incomplete directories.
    pub fn problem_count(&self, strict: bool) -> usize {
        let incomplete = if strict { self.incomplete.len() } else { 0 };
        self.failed.len() + self.superseded.len() + incomplete
    }
}

/// Checks every directory under `root`.
pub fn collect(root: &Path) -> CommandResult<VerifyResult> {
    let (ids, foreign) = scan_root(root)?;
    let mut result = VerifyResult {
        foreign,
        ..VerifyResult::default()
    };
    // name key -> highest id seen so far
    let mut owners: HashMap<String, IndexId> = HashMap::new();

    for id in ids {
        debug!(index_id = %id, "Checking index directory");
        match read_dir_state(&root.join(id.dir_name())) {
            DirState::Ready(definition) => {
                let key = name_key(definition.name());
                // ids arrive ascending, so a later hit always wins
                if let Some(previous) = owners.insert(key, id) {
                    result.valid.retain(|v| *v != previous);
                    result.superseded.push((previous, id));
                }
                result.valid.push(id);
            }
            DirState::Incomplete => result.incomplete.push(id),
            DirState::Failed(e) => result.failed.push((id, e.to_string())),
        }
    }

    Ok(result)
}

/// Runs the verify command.
pub fn run(root: &Path, strict: bool) -> CommandResult<()> {
    println!("Verifying index storage root at {}", root.display());
    println!();

    let result = collect(root)?;
    print_result(&result);

    println!();
    let problems = result.problem_count(strict);
    if problems == 0 {
        println!("✓ Index storage root verification passed");
        Ok(())
    } else {
        println!("✗ Index storage root verification failed");
        Err(CommandError::VerificationFailed(problems))
    }
}

fn print_result(result: &VerifyResult) {
    println!(
        "  directories checked: {}, valid: {}, incomplete: {}, failed: {}, superseded: {}",
        result.valid.len() + result.incomplete.len() + result.failed.len() + result.superseded.len(),
        result.valid.len(),
        result.incomplete.len(),
        result.failed.len(),
        result.superseded.len()
    );
    for (id, error) in &result.failed {
        println!("    ERROR: {id}: {error}");
    }
    for (loser, winner) in &result.superseded {
        println!("    ERROR: {loser}: same name as {winner}, would be removed");
    }
    for id in &result.incomplete {
        println!("    WARN: {id}: no definition stored");
    }
    if !result.foreign.is_empty() {
        println!("    ignored: {}", result.foreign.join(", "));
    }
}
