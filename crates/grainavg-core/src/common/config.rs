//! Pipeline tunables and their JSON file form.
//!
//! ```json
//! { "slopeThreshold": 50.0, "targetHeight": 1.0 }
//! ```
//!
//! Keys that are absent fall back to the defaults in [`super::constants`].

use super::constants::{DEFAULT_SLOPE_THRESHOLD, DEFAULT_TARGET_HEIGHT};
use crate::domain::{GrainError, GrainResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub slope_threshold: f64,
    pub target_height: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            slope_threshold: DEFAULT_SLOPE_THRESHOLD,
            target_height: DEFAULT_TARGET_HEIGHT,
        }
    }
}

impl PipelineConfig {
    pub fn with_overrides(self, slope_threshold: Option<f64>, target_height: Option<f64>) -> Self {
        Self {
            slope_threshold: slope_threshold.unwrap_or(self.slope_threshold),
            target_height: target_height.unwrap_or(self.target_height),
        }
    }

    pub fn validate(&self) -> GrainResult<()> {
        require_positive("slopeThreshold", self.slope_threshold)?;
        require_positive("targetHeight", self.target_height)
    }
}

fn require_positive(name: &str, value: f64) -> GrainResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(GrainError::input_validation(
            "INPUT.CONFIG_VALUE",
            format!("{name} must be a positive finite number, got {value}"),
        ))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineConfigError {
    #[error("failed to read pipeline config '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse pipeline config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub fn load_pipeline_config(
    config_path: impl AsRef<Path>,
) -> Result<PipelineConfig, PipelineConfigError> {
    let config_path = config_path.as_ref();
    let source = fs::read_to_string(config_path).map_err(|source| PipelineConfigError::Read {
        path: config_path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&source).map_err(|source| PipelineConfigError::Parse {
        path: config_path.to_path_buf(),
        source,
    })
}
