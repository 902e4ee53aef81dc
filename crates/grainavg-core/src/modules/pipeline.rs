use super::GrainProcessor;
use super::aggregator::{average, require_common_length, sem};
use super::normalizer::normalize;
use crate::common::config::PipelineConfig;
use crate::common::constants::MIN_MEASUREMENTS_PER_GRAIN;
use crate::domain::{Grain, GrainError, GrainResult, GrainSpectrum};

/// Sanitize, normalize, sum and band every measurement of a grain.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpectrumPipeline {
    config: PipelineConfig,
}

impl SpectrumPipeline {
    pub fn new(config: PipelineConfig) -> GrainResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> PipelineConfig {
        self.config
    }
}

impl GrainProcessor for SpectrumPipeline {
    fn process(&self, grain: Grain) -> GrainResult<GrainSpectrum> {
        let _span = tracing::debug_span!("grain", id = grain.id.get()).entered();
        let Grain { id, measurements } = grain;
        let count = measurements.len();

        if let Some(first) = measurements.first() {
            require_common_length(&measurements, first.len())?;
        }
        if count < MIN_MEASUREMENTS_PER_GRAIN {
            return Err(GrainError::degenerate_trace(
                "DEGENERATE.TOO_FEW_MEASUREMENTS",
                format!(
                    "grain {id} has {count} measurement(s); at least {MIN_MEASUREMENTS_PER_GRAIN} are required"
                ),
            ));
        }

        let normalized = measurements
            .into_iter()
            .map(|trace| {
                normalize(
                    trace,
                    self.config.target_height,
                    count,
                    self.config.slope_threshold,
                )
            })
            .collect::<GrainResult<Vec<_>>>()?;

        let summed = average(&normalized)?;
        let band = sem(&normalized, &summed)?;
        tracing::debug!(measurements = count, points = summed.len(), "averaged grain");

        Ok(GrainSpectrum {
            grain: id,
            measurement_count: count,
            average: summed,
            sem: band,
        })
    }
}
