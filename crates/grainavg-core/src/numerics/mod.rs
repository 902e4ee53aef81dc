use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct NumericTolerance {
    #[serde(rename = "absTol")]
    pub abs_tol: f64,
    #[serde(rename = "relTol")]
    pub rel_tol: f64,
    #[serde(rename = "relativeFloor", default = "default_relative_floor")]
    pub relative_floor: f64,
}

fn default_relative_floor() -> f64 {
    1.0e-12
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToleranceComparison {
    pub abs_diff: f64,
    pub rel_diff: f64,
    pub passes: bool,
}

pub fn compare_with_tolerance(
    expected: f64,
    actual: f64,
    tolerance: NumericTolerance,
) -> ToleranceComparison {
    let abs_diff = (actual - expected).abs();
    let rel_denominator = expected.abs().max(tolerance.relative_floor);
    let rel_diff = abs_diff / rel_denominator;
    let passes = abs_diff <= tolerance.abs_tol || abs_diff <= tolerance.rel_tol * rel_denominator;

    ToleranceComparison {
        abs_diff,
        rel_diff,
        passes,
    }
}

/// Largest value, searched upward from zero.
///
/// A trace whose intensities are all non-positive therefore reports `0.0`.
pub fn floor_zero_maximum(values: &[f64]) -> f64 {
    values
        .iter()
        .copied()
        .fold(0.0, |max, value| if value > max { value } else { max })
}

/// `Σ (center - value)²`, accumulated in slice order.
pub fn sum_of_squared_deviations(center: f64, values: impl IntoIterator<Item = f64>) -> f64 {
    values.into_iter().fold(0.0, |sum, value| {
        let deviation = center - value;
        sum + deviation * deviation
    })
}

/// `|Δy / Δx|` between two neighboring samples, `None` when the x positions coincide.
pub fn absolute_slope(x_previous: f64, y_previous: f64, x_current: f64, y_current: f64) -> Option<f64> {
    let run = x_previous - x_current;
    if run == 0.0 {
        return None;
    }
    Some(((y_current - y_previous) / run).abs())
}
