//! Cross-measurement combination of normalized traces.
//!
//! [`average`] sums rather than averages: every input was already divided by
//! the measurement count during normalization, so the sum is the mean scaled
//! to the target height.
//!
//! [`sem`] keeps the band convention of previously exported datasets:
//!
//! ```text
//! sem[k] = sqrt( Σ_j (avg[k] - y_j[k])² ) / ((n - 1) * n)
//! ```
//!
//! This is not the textbook standard error of the mean, which would be
//! `sqrt( Σ_j (mean[k] - y_j[k])² / (n - 1) ) / sqrt(n)`. Deviations are
//! measured against whatever center trace the caller passes in. Do not
//! "correct" either point; exported tables must match bit for bit.

use crate::common::constants::MIN_MEASUREMENTS_PER_GRAIN;
use crate::domain::{GrainError, GrainResult, SemBand, Trace};
use crate::numerics::sum_of_squared_deviations;

/// Point-wise sum of `traces`, on the x grid of the first trace.
pub fn average(traces: &[Trace]) -> GrainResult<Trace> {
    let Some(first) = traces.first() else {
        return Err(GrainError::degenerate_trace(
            "DEGENERATE.NO_TRACES",
            "cannot average an empty set of traces",
        ));
    };
    require_common_length(traces, first.len())?;

    let mut sum = vec![0.0; first.len()];
    for trace in traces {
        for (total, value) in sum.iter_mut().zip(trace.y()) {
            *total += value;
        }
    }
    Trace::new(first.x().to_vec(), sum)
}

/// Two-sided uncertainty band of `traces` around `averaged`.
pub fn sem(traces: &[Trace], averaged: &Trace) -> GrainResult<SemBand> {
    let n = traces.len();
    if n < MIN_MEASUREMENTS_PER_GRAIN {
        return Err(GrainError::degenerate_trace(
            "DEGENERATE.TOO_FEW_MEASUREMENTS",
            format!(
                "SEM needs at least {MIN_MEASUREMENTS_PER_GRAIN} measurements, got {n}"
            ),
        ));
    }
    require_common_length(traces, averaged.len())?;

    let divisor = (n as f64 - 1.0) * n as f64;
    let magnitudes = averaged
        .y()
        .iter()
        .enumerate()
        .map(|(k, center)| {
            let squares = sum_of_squared_deviations(*center, traces.iter().map(|trace| trace.y()[k]));
            squares.sqrt() / divisor
        })
        .collect();
    Ok(SemBand::from_magnitudes(magnitudes))
}

pub(crate) fn require_common_length(traces: &[Trace], expected: usize) -> GrainResult<()> {
    match traces.iter().position(|trace| trace.len() != expected) {
        Some(index) => Err(GrainError::shape_mismatch(
            "SHAPE.TRACE_LENGTH",
            format!(
                "trace {} has {} points but {} were expected",
                index + 1,
                traces[index].len(),
                expected
            ),
        )),
        None => Ok(()),
    }
}
