//! Applying one operation to many skeletons.
//!
//! Skeletons are independent, so a collection is processed embarrassingly
//! parallel: each worker owns one skeleton (and its caches) for the
//! duration of the call. Parallelism uses `rayon` when the `parallel`
//! feature is enabled and [BatchOptions::parallel] is set.
//!
//! By default the first failure aborts the batch. In omit-failures mode
//! failed items are logged, collected and skipped.

use crate::config::ProcessingContext;
use crate::error::{Result, SkeletonError};
use crate::model::skeleton::Skeleton;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{info, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Batch behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchOptions {
    /// Process skeletons in parallel (requires the `parallel` feature)
    pub parallel: bool,
    /// Skip and collect failures instead of aborting
    pub omit_failures: bool,
    /// Suppress per-item logging
    pub quiet: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        BatchOptions {
            parallel: true,
            omit_failures: false,
            quiet: false,
        }
    }
}

/// An item that failed in omit-failures mode.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchFailure {
    /// Position in the input collection
    pub index: usize,
    /// Name of the skeleton, if it had one
    pub name: Option<String>,
    /// The error
    pub error: SkeletonError,
}

/// Results of a batch run.
#[derive(Debug, Clone)]
pub struct BatchOutcome<T> {
    /// Successful results in input order (failures left out)
    pub results: Vec<T>,
    /// Failed items (only ever non-empty in omit-failures mode)
    pub failures: Vec<BatchFailure>,
}

impl<T> BatchOutcome<T> {
    /// Returns `true` if no item failed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Applies `operation` to every skeleton.
///
/// # Arguments
/// * `skeletons` - Owned collection; each skeleton is moved into its call
/// * `context` - Batch options, quiet flag and progress hook
/// * `operation` - Per-skeleton operation
///
/// # Errors
/// Without omit-failures mode, the error of the first failing skeleton
/// (in input order).
pub fn map_skeletons<T, F>(
    skeletons: Vec<Skeleton>,
    context: &ProcessingContext,
    operation: F,
) -> Result<BatchOutcome<T>>
where
    T: Send,
    F: Fn(Skeleton) -> Result<T> + Send + Sync,
{
    let total = skeletons.len();
    let quiet = context.quiet || context.batch.quiet;
    if !quiet {
        info!(total, parallel = context.batch.parallel, "starting batch");
    }

    let finished = AtomicUsize::new(0);
    let run = |(index, skeleton): (usize, Skeleton)| {
        let name = skeleton.name().map(str::to_string);
        let result = operation(skeleton);
        let done = finished.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(progress) = &context.progress {
            progress(done, total);
        }
        (index, name, result)
    };

    let outputs: Vec<(usize, Option<String>, Result<T>)> = if context.batch.omit_failures {
        run_all(skeletons, context.batch.parallel, run)
    } else if context.batch.parallel {
        run_all(skeletons, true, run)
    } else {
        // Sequential fail-fast stops at the first error
        let mut outputs = Vec::with_capacity(total);
        for item in skeletons.into_iter().enumerate() {
            let output = run(item);
            let failed = output.2.is_err();
            outputs.push(output);
            if failed {
                break;
            }
        }
        outputs
    };

    let mut outcome = BatchOutcome {
        results: Vec::with_capacity(outputs.len()),
        failures: Vec::new(),
    };
    for (index, name, result) in outputs {
        match result {
            Ok(value) => outcome.results.push(value),
            Err(error) if context.batch.omit_failures => {
                if !quiet {
                    warn!(index, name = name.as_deref().unwrap_or(""), %error, "skipping failed skeleton");
                }
                outcome.failures.push(BatchFailure { index, name, error });
            }
            Err(error) => return Err(error),
        }
    }

    if !quiet {
        info!(
            succeeded = outcome.results.len(),
            failed = outcome.failures.len(),
            "finished batch"
        );
    }
    Ok(outcome)
}

/// Runs `run` over all items, in parallel if requested and available,
/// keeping input order.
fn run_all<R, F>(skeletons: Vec<Skeleton>, parallel: bool, run: F) -> Vec<R>
where
    R: Send,
    F: Fn((usize, Skeleton)) -> R + Send + Sync,
{
    #[cfg(feature = "parallel")]
    if parallel {
        return skeletons.into_par_iter().enumerate().map(run).collect();
    }

    #[cfg(not(feature = "parallel"))]
    let _ = parallel;

    skeletons.into_iter().enumerate().map(run).collect()
}
