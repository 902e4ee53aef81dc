use super::sanitizer::sanitize;
use crate::domain::{GrainError, GrainResult, Trace};
use crate::numerics::floor_zero_maximum;

/// Sanitize `trace`, then scale it so that `measurement_count` such traces
/// summed together peak at `target_height`.
///
/// The scale factor is `target_height / (max_y * measurement_count)`, where
/// `max_y` is searched upward from zero. A trace with no positive intensity
/// has no usable maximum and is rejected, as is any NaN or infinite sample.
pub fn normalize(
    trace: Trace,
    target_height: f64,
    measurement_count: usize,
    slope_threshold: f64,
) -> GrainResult<Trace> {
    if measurement_count == 0 {
        return Err(GrainError::input_validation(
            "INPUT.MEASUREMENT_COUNT",
            "measurement count must be at least 1",
        ));
    }

    require_finite(&trace)?;
    let mut trace = sanitize(trace, slope_threshold)?;
    let max_y = floor_zero_maximum(trace.y());
    if max_y == 0.0 {
        return Err(GrainError::degenerate_trace(
            "DEGENERATE.ZERO_MAXIMUM",
            "trace has no positive intensity to normalize against",
        ));
    }

    let scale = target_height / (max_y * measurement_count as f64);
    for value in trace.y_mut() {
        *value *= scale;
    }
    Ok(trace)
}

fn require_finite(trace: &Trace) -> GrainResult<()> {
    let non_finite = trace
        .x()
        .iter()
        .zip(trace.y())
        .position(|(x, y)| !x.is_finite() || !y.is_finite());
    match non_finite {
        Some(index) => Err(GrainError::degenerate_trace(
            "DEGENERATE.NON_FINITE",
            format!(
                "point {} is not finite (x = {}, y = {})",
                index,
                trace.x()[index],
                trace.y()[index]
            ),
        )),
        None => Ok(()),
    }
}
