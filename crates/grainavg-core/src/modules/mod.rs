pub mod aggregator;
pub mod batch;
pub mod normalizer;
pub mod pipeline;
pub mod sanitizer;

mod traits;

pub use aggregator::{average, sem};
pub use batch::{
    BatchOptions, BatchReport, CancellationToken, GrainOutcome, GrainStatus, run_batch,
};
pub use normalizer::normalize;
pub use pipeline::SpectrumPipeline;
pub use sanitizer::sanitize;
pub use traits::GrainProcessor;
