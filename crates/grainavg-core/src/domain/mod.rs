pub mod errors;

pub use errors::{GrainError, GrainErrorCategory, GrainResult};

use serde::Serialize;
use std::fmt::{Display, Formatter};

/// One-based grain index assigned by whoever grouped the measurement files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct GrainId(usize);

impl GrainId {
    pub const fn new(index: usize) -> Option<Self> {
        if index == 0 { None } else { Some(Self(index)) }
    }

    pub const fn get(self) -> usize {
        self.0
    }
}

impl Display for GrainId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Paired x positions and y intensities of one spectrum.
///
/// The pair always has equal length. Monotonic x and a shared grid across a
/// grain are preconditions callers guarantee; nothing here resamples.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl Trace {
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> GrainResult<Self> {
        if x.len() != y.len() {
            return Err(GrainError::shape_mismatch(
                "SHAPE.TRACE_AXES",
                format!(
                    "trace has {} x positions but {} y intensities",
                    x.len(),
                    y.len()
                ),
            ));
        }
        Ok(Self { x, y })
    }

    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Self {
        let (x, y) = points.into_iter().unzip();
        Self { x, y }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    /// Mutable intensities. The slice cannot grow, so the axes stay paired.
    pub fn y_mut(&mut self) -> &mut [f64] {
        &mut self.y
    }

    pub(crate) fn split_axes_mut(&mut self) -> (&[f64], &mut [f64]) {
        (&self.x, &mut self.y)
    }
}

/// The measurements acquired on one grain, in collaborator order.
#[derive(Debug, Clone, PartialEq)]
pub struct Grain {
    pub id: GrainId,
    pub measurements: Vec<Trace>,
}

impl Grain {
    pub fn new(id: GrainId, measurements: Vec<Trace>) -> Self {
        Self { id, measurements }
    }

    pub fn measurement_count(&self) -> usize {
        self.measurements.len()
    }
}

/// Two-sided uncertainty envelope aligned index-for-index with an averaged trace.
#[derive(Debug, Clone, PartialEq)]
pub struct SemBand {
    pub minus: Vec<f64>,
    pub plus: Vec<f64>,
}

impl SemBand {
    pub fn from_magnitudes(magnitudes: Vec<f64>) -> Self {
        let minus = magnitudes.iter().map(|value| -value).collect();
        Self {
            minus,
            plus: magnitudes,
        }
    }

    pub fn len(&self) -> usize {
        self.plus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plus.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GrainSpectrum {
    pub grain: GrainId,
    pub measurement_count: usize,
    pub average: Trace,
    pub sem: SemBand,
}

impl GrainSpectrum {
    /// `(x, averaged y, positive deviation)` per grid point, the layout exported tables use.
    pub fn rows(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        self.average
            .x()
            .iter()
            .zip(self.average.y())
            .zip(&self.sem.plus)
            .map(|((x, y), sem)| (*x, *y, *sem))
    }

    /// Lower and upper envelope, `average + minus` and `average + plus`.
    pub fn envelope(&self) -> (Vec<f64>, Vec<f64>) {
        let lower = self
            .average
            .y()
            .iter()
            .zip(&self.sem.minus)
            .map(|(y, minus)| y + minus)
            .collect();
        let upper = self
            .average
            .y()
            .iter()
            .zip(&self.sem.plus)
            .map(|(y, plus)| y + plus)
            .collect();
        (lower, upper)
    }
}
