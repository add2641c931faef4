//! Concurrency stress helpers for the lifecycle manager.
//!
//! These run many threads against one [`IndexStore`] and collect what each
//! call returned, so tests can assert on the catalog afterwards.

use autoidx_core::{AutoIndexDefinition, CoreError, CoreResult, IndexId, IndexStore};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress run.
#[derive(Debug)]
pub struct StressTestResult {
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations, expected ones included.
    pub failed_ops: usize,
    /// Failures other than deleting an index that was already gone.
    pub unexpected_errors: Vec<CoreError>,
    /// Total duration.
    pub duration: Duration,
}

impl StressTestResult {
    /// Returns the total number of operations.
    pub fn total_ops(&self) -> usize {
        self.successful_ops + self.failed_ops
    }

    /// Prints a summary of the run.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {name} ===");
        println!("Total operations: {}", self.total_ops());
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Unexpected errors: {}", self.unexpected_errors.len());
        for err in &self.unexpected_errors {
            println!("  {err}");
        }
        println!("Duration: {:?}", self.duration);
    }
}

/// Configuration for stress runs.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of concurrent threads.
    pub threads: usize,
    /// Operations per thread.
    pub operations: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            threads: 8,
            operations: 50,
        }
    }
}

/// Releases `threads` threads at the same instant, each calling
/// `create_auto_index` with its own copy of `definition`, and returns every
/// result.
pub fn race_create(
    store: &Arc<IndexStore>,
    definition: &AutoIndexDefinition,
    threads: usize,
) -> Vec<CoreResult<IndexId>> {
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let store = Arc::clone(store);
            let barrier = Arc::clone(&barrier);
            let definition = definition.clone();
            thread::spawn(move || {
                barrier.wait();
                store.create_auto_index(definition)
            })
        })
        .collect();

    handles
        .into_iter()
        .map(|h| h.join().expect("create thread panicked"))
        .collect()
}

/// Runs threads that repeatedly create and delete indexes from `pool`
/// while others start and stop everything.
///
/// Deleting an index another thread already removed counts as a failed
/// operation. Any other failure is also kept in
/// [`StressTestResult::unexpected_errors`].
pub fn stress_create_delete_churn(
    store: &Arc<IndexStore>,
    pool: &[AutoIndexDefinition],
    config: &StressConfig,
) -> StressTestResult {
    let start = Instant::now();
    let pool = Arc::new(pool.to_vec());

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let store = Arc::clone(store);
            let pool = Arc::clone(&pool);
            let operations = config.operations;
            thread::spawn(move || {
                let mut ok = 0usize;
                let mut failed = 0usize;
                let mut unexpected = Vec::new();
                for i in 0..operations {
                    let definition = &pool[(t + i) % pool.len()];
                    let outcome = match (t + i) % 4 {
                        0 | 1 => store.create_auto_index(definition.clone()).map(|_| ()),
                        2 => store.delete_index(definition.name()),
                        _ => {
                            if t % 2 == 0 {
                                store.start_indexing();
                            } else {
                                store.stop_indexing();
                            }
                            Ok(())
                        }
                    };
                    match outcome {
                        Ok(()) => ok += 1,
                        Err(err) => {
                            failed += 1;
                            if !err.is_not_found() {
                                unexpected.push(err);
                            }
                        }
                    }
                }
                (ok, failed, unexpected)
            })
        })
        .collect();

    let mut result = StressTestResult {
        successful_ops: 0,
        failed_ops: 0,
        unexpected_errors: Vec::new(),
        duration: Duration::ZERO,
    };
    for handle in handles {
        let (ok, failed, unexpected) = handle.join().expect("churn thread panicked");
        result.successful_ops += ok;
        result.failed_ops += failed;
        result.unexpected_errors.extend(unexpected);
    }
    result.duration = start.elapsed();
    result
}
