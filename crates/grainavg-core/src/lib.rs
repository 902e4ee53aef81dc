//! Per-grain spectrum averaging.
//!
//! Every grain is a set of repeated measurements on one sample location. Each
//! measurement is despiked ([`modules::sanitize`]), scaled to a shared ceiling
//! ([`modules::normalize`]), summed into one trace ([`modules::average`]) and
//! given an uncertainty band ([`modules::sem`]). [`modules::run_batch`] drives
//! that pipeline over many grains with per-grain error isolation.

pub mod common;
pub mod domain;
pub mod modules;
pub mod numerics;

pub use common::config::PipelineConfig;
pub use domain::{Grain, GrainError, GrainId, GrainResult, GrainSpectrum, SemBand, Trace};
pub use modules::{GrainProcessor, SpectrumPipeline, run_batch};
