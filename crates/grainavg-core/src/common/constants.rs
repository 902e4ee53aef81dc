//! Pipeline defaults shared by the core and the command-line shell.

/// Slope, in intensity units per x unit, at or above which a point counts as a spike.
pub const DEFAULT_SLOPE_THRESHOLD: f64 = 50.0;

/// Ceiling every averaged spectrum is scaled toward.
pub const DEFAULT_TARGET_HEIGHT: f64 = 1.0;

/// The sanitizer needs a neighbor on both sides of at least one point.
pub const MIN_TRACE_POINTS: usize = 3;

/// The SEM divides by `n - 1`.
pub const MIN_MEASUREMENTS_PER_GRAIN: usize = 2;
