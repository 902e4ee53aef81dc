use crate::common::constants::MIN_TRACE_POINTS;
use crate::domain::{GrainError, GrainResult, Trace};
use crate::numerics::absolute_slope;

/// Replace isolated single-sample spikes with the mean of their neighbors.
///
/// One forward pass over indices `1..len-2`. The slope at `i` is taken
/// against the value `y[i-1]` currently holds, so an earlier replacement feeds
/// the next comparison, but a replaced point is never examined again. The
/// first, second-to-last and last samples are left untouched. Runs of adjacent
/// spikes can therefore survive partially; that is the expected output.
pub fn sanitize(mut trace: Trace, slope_threshold: f64) -> GrainResult<Trace> {
    let len = trace.len();
    if len < MIN_TRACE_POINTS {
        return Err(GrainError::degenerate_trace(
            "DEGENERATE.TRACE_TOO_SHORT",
            format!("trace has {len} points; at least {MIN_TRACE_POINTS} are required"),
        ));
    }

    let (x, y) = trace.split_axes_mut();
    let mut replaced = 0_usize;
    for i in 1..len - 2 {
        let slope = absolute_slope(x[i - 1], y[i - 1], x[i], y[i]).ok_or_else(|| {
            GrainError::degenerate_trace(
                "DEGENERATE.COINCIDENT_X",
                format!("x positions {} and {} coincide at {}", i - 1, i, x[i]),
            )
        })?;

        if slope >= slope_threshold {
            y[i] = (y[i - 1] + y[i + 1]) / 2.0;
            replaced += 1;
        }
    }

    tracing::debug!(points = len, replaced, slope_threshold, "sanitized trace");
    Ok(trace)
}

#[cfg(test)]
mod tests {
    use super::sanitize;
    use crate::domain::{GrainErrorCategory, Trace};

    fn trace(y: &[f64]) -> Trace {
        Trace::from_points(y.iter().enumerate().map(|(i, y)| (i as f64, *y)))
    }

    #[test]
    fn clean_trace_is_returned_unchanged() {
        let input = trace(&[1.0, 2.0, 4.0, 3.0, 5.0, 4.5]);
        let output = sanitize(input.clone(), 50.0).expect("sanitize should succeed");
        assert_eq!(output, input);
    }

    #[test]
    fn isolated_spike_is_replaced_by_neighbor_mean() {
        let output = sanitize(trace(&[1.0, 2.0, 500.0, 4.0, 5.0, 6.0]), 50.0)
            .expect("sanitize should succeed");
        assert_eq!(output.y(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn slope_equal_to_threshold_counts_as_spike() {
        let output = sanitize(trace(&[0.0, 0.0, 50.0, 10.0, 0.0]), 50.0)
            .expect("sanitize should succeed");
        assert_eq!(output.y()[2], 5.0);
    }

    #[test]
    fn slope_uses_the_grid_spacing() {
        let input = Trace::new(vec![0.0, 10.0, 20.0, 30.0, 40.0], vec![0.0, 0.0, 400.0, 0.0, 0.0])
            .expect("trace should build");
        let output = sanitize(input.clone(), 50.0).expect("sanitize should succeed");
        assert_eq!(output, input);
    }

    #[test]
    fn boundary_points_are_never_altered() {
        let output = sanitize(trace(&[900.0, 1.0, 1.0, 1.0, 900.0, -900.0]), 50.0)
            .expect("sanitize should succeed");
        assert_eq!(output.y()[0], 900.0);
        assert_eq!(output.y()[4], 900.0);
        assert_eq!(output.y()[5], -900.0);
    }

    #[test]
    fn point_after_spike_compares_against_the_replacement() {
        // y[1] becomes (0 + 80) / 2 = 40, so y[2] is compared against 40 rather
        // than 1000 and stays.
        let output = sanitize(trace(&[0.0, 1000.0, 80.0, 90.0, 100.0]), 50.0)
            .expect("sanitize should succeed");
        assert_eq!(output.y(), &[0.0, 40.0, 80.0, 90.0, 100.0]);
    }

    #[test]
    fn adjacent_spikes_partially_survive_single_pass() {
        let output = sanitize(trace(&[0.0, 1000.0, 1000.0, 0.0, 0.0, 0.0]), 50.0)
            .expect("sanitize should succeed");
        assert_eq!(output.y(), &[0.0, 500.0, 250.0, 125.0, 0.0, 0.0]);
    }

    #[test]
    fn three_point_trace_has_no_eligible_points() {
        let input = trace(&[0.0, 1000.0, 0.0]);
        let output = sanitize(input.clone(), 50.0).expect("sanitize should succeed");
        assert_eq!(output, input);
    }

    #[test]
    fn short_traces_and_coincident_positions_are_degenerate() {
        let error = sanitize(trace(&[1.0, 2.0]), 50.0).expect_err("short trace should fail");
        assert_eq!(error.category(), GrainErrorCategory::DegenerateTrace);
        assert_eq!(error.code(), "DEGENERATE.TRACE_TOO_SHORT");

        let input = Trace::new(vec![0.0, 0.0, 1.0, 2.0, 3.0], vec![1.0; 5])
            .expect("trace should build");
        let error = sanitize(input, 50.0).expect_err("coincident x should fail");
        assert_eq!(error.code(), "DEGENERATE.COINCIDENT_X");
    }
}
