//! Runs a [`GrainProcessor`] over every grain of a measurement set.
//!
//! Grains are isolated from each other: a grain-level error is recorded on
//! that grain's outcome and the batch moves on. Cancellation is observed only
//! between grains, so a grain that has started always runs to completion.

use super::GrainProcessor;
use crate::domain::{Grain, GrainError, GrainId, GrainResult, GrainSpectrum};
use rayon::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared flag a caller flips to abandon the grains that have not started yet.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Number of grains processed at once. `1` keeps everything on the calling thread.
    pub concurrency: usize,
    pub cancellation: CancellationToken,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            cancellation: CancellationToken::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GrainStatus {
    Completed(GrainSpectrum),
    Failed(GrainError),
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GrainOutcome {
    pub grain: GrainId,
    pub measurement_count: usize,
    pub status: GrainStatus,
}

impl GrainOutcome {
    pub fn spectrum(&self) -> Option<&GrainSpectrum> {
        match &self.status {
            GrainStatus::Completed(spectrum) => Some(spectrum),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&GrainError> {
        match &self.status {
            GrainStatus::Failed(error) => Some(error),
            _ => None,
        }
    }
}

/// Outcomes in ascending grain order.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub outcomes: Vec<GrainOutcome>,
}

impl BatchReport {
    pub fn grain_count(&self) -> usize {
        self.outcomes.len()
    }

    pub fn completed(&self) -> impl Iterator<Item = &GrainSpectrum> {
        self.outcomes.iter().filter_map(GrainOutcome::spectrum)
    }

    pub fn failed(&self) -> impl Iterator<Item = (GrainId, &GrainError)> {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.error().map(|error| (outcome.grain, error)))
    }

    pub fn cancelled_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.status == GrainStatus::Cancelled)
            .count()
    }

    pub fn all_completed(&self) -> bool {
        self.outcomes
            .iter()
            .all(|outcome| matches!(outcome.status, GrainStatus::Completed(_)))
    }
}

/// Process every grain and collect one outcome per grain.
///
/// `progress` is called once per grain as soon as its outcome is known. With
/// `concurrency > 1` it is called from worker threads in completion order.
pub fn run_batch<P, F>(
    processor: &P,
    grains: Vec<Grain>,
    options: &BatchOptions,
    progress: F,
) -> GrainResult<BatchReport>
where
    P: GrainProcessor + Sync + ?Sized,
    F: Fn(&GrainOutcome) + Sync,
{
    if grains.is_empty() {
        return Err(GrainError::empty_input(
            "EMPTY.NO_GRAINS",
            "no grains were supplied; the input is empty or its files are not grouped by grain",
        ));
    }

    let run_one = |grain: Grain| -> GrainOutcome {
        let outcome = process_one(processor, grain, &options.cancellation);
        progress(&outcome);
        outcome
    };

    let mut outcomes = if options.concurrency > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.concurrency)
            .build()
            .map_err(|source| {
                GrainError::internal(
                    "INTERNAL.THREAD_POOL",
                    format!("failed to build grain worker pool: {source}"),
                )
            })?;
        pool.install(|| grains.into_par_iter().map(run_one).collect::<Vec<_>>())
    } else {
        grains.into_iter().map(run_one).collect::<Vec<_>>()
    };

    outcomes.sort_by_key(|outcome| outcome.grain);
    Ok(BatchReport { outcomes })
}

fn process_one<P>(processor: &P, grain: Grain, cancellation: &CancellationToken) -> GrainOutcome
where
    P: GrainProcessor + ?Sized,
{
    let id = grain.id;
    let measurement_count = grain.measurement_count();
    if cancellation.is_cancelled() {
        return GrainOutcome {
            grain: id,
            measurement_count,
            status: GrainStatus::Cancelled,
        };
    }

    let status = match processor.process(grain) {
        Ok(spectrum) => GrainStatus::Completed(spectrum),
        Err(error) => GrainStatus::Failed(error),
    };
    GrainOutcome {
        grain: id,
        measurement_count,
        status,
    }
}
