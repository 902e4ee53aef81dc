use super::CliError;
use super::discovery::{
    DEFAULT_MEASUREMENT_PATTERN, GrainFiles, discover_measurement_files, group_by_grain,
    measurement_matcher,
};
use super::export::{AnalyzeReport, OutputFormat, render_human_summary, write_spectrum_table};
use super::helpers::{read_trace_file, resolve_cli_path};
use anyhow::Context;
use grainavg_core::common::config::{PipelineConfig, PipelineConfigError, load_pipeline_config};
use grainavg_core::domain::{Grain, GrainError, GrainId, GrainResult, GrainSpectrum, Trace};
use grainavg_core::modules::{
    BatchOptions, BatchReport, GrainOutcome, GrainProcessor, GrainStatus, SpectrumPipeline,
    run_batch,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(clap::Args)]
pub(super) struct AnalyzeArgs {
    /// Directory holding `<name>_<grain>_<measurement>` trace files
    input_dir: PathBuf,

    /// Directory receiving one table per grain [default: INPUT_DIR]
    #[arg(long)]
    output: Option<PathBuf>,

    /// Measurement file glob, matched case-insensitively
    #[arg(long, default_value = DEFAULT_MEASUREMENT_PATTERN)]
    pattern: String,

    /// Table format
    #[arg(long, value_enum, default_value = "csv")]
    format: OutputFormat,

    /// JSON pipeline config (`slopeThreshold`, `targetHeight`)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Absolute slope at or above which a point is treated as a spike
    #[arg(long)]
    slope_threshold: Option<f64>,

    /// Ceiling every grain's averaged trace is scaled to
    #[arg(long)]
    target_height: Option<f64>,

    /// Grains processed in parallel
    #[arg(long, default_value_t = 1)]
    jobs: usize,

    /// JSON batch report output path
    #[arg(long)]
    report: Option<PathBuf>,
}

struct AnalyzeConfig {
    input_dir: PathBuf,
    output_dir: PathBuf,
    pattern: String,
    format: OutputFormat,
    pipeline: PipelineConfig,
    jobs: usize,
    report_path: Option<PathBuf>,
}

impl AnalyzeArgs {
    fn into_config(self, working_dir: &Path) -> Result<AnalyzeConfig, CliError> {
        if self.jobs == 0 {
            return Err(CliError::Usage(
                "Invalid job count '0'; expected a positive integer.".to_string(),
            ));
        }

        let base = match &self.config {
            Some(path) => load_pipeline_config(resolve_cli_path(working_dir, path))
                .map_err(config_file_error)?,
            None => PipelineConfig::default(),
        };
        let input_dir = resolve_cli_path(working_dir, &self.input_dir);
        let output_dir = self
            .output
            .map(|path| resolve_cli_path(working_dir, &path))
            .unwrap_or_else(|| input_dir.clone());

        Ok(AnalyzeConfig {
            input_dir,
            output_dir,
            pattern: self.pattern,
            format: self.format,
            pipeline: base.with_overrides(self.slope_threshold, self.target_height),
            jobs: self.jobs,
            report_path: self
                .report
                .map(|path| resolve_cli_path(working_dir, &path)),
        })
    }
}

fn config_file_error(error: PipelineConfigError) -> GrainError {
    GrainError::input_validation("INPUT.CONFIG_FILE", error.to_string())
}

pub(super) fn run_analyze_command(args: AnalyzeArgs) -> Result<i32, CliError> {
    let working_dir =
        std::env::current_dir().context("failed to read current working directory")?;
    let config = args.into_config(&working_dir)?;
    let pipeline = SpectrumPipeline::new(config.pipeline)?;

    if !config.input_dir.is_dir() {
        return Err(GrainError::io_system(
            "IO.INPUT_DIRECTORY",
            format!(
                "input directory '{}' does not exist or is not a directory",
                config.input_dir.display()
            ),
        )
        .into());
    }

    let matcher = measurement_matcher(&config.pattern)?;
    let files = discover_measurement_files(&config.input_dir, &matcher)?;
    let grouped = group_by_grain(files)?;
    tracing::info!(
        input = %config.input_dir.display(),
        grains = grouped.len(),
        "discovered measurement files"
    );

    let (processor, grains) = LoadedGrainProcessor::load(pipeline, grouped);
    let grain_count = grains.len();
    let finished = AtomicUsize::new(0);
    let options = BatchOptions {
        concurrency: config.jobs,
        ..BatchOptions::default()
    };
    let mut batch = run_batch(&processor, grains, &options, |outcome| {
        let done = finished.fetch_add(1, Ordering::SeqCst) + 1;
        log_outcome(outcome, done, grain_count);
    })?;
    processor.restore_file_counts(&mut batch);

    let exports = export_completed(&batch, &config)?;
    let report = AnalyzeReport::from_batch(&batch, &exports);
    if let Some(path) = &config.report_path {
        report.write_json(path)?;
    }

    println!("{}", render_human_summary(&report));
    if let Some(path) = &config.report_path {
        println!("JSON report: {}", path.display());
    }

    if report.all_completed() { Ok(0) } else { Ok(1) }
}

fn log_outcome(outcome: &GrainOutcome, done: usize, total: usize) {
    match &outcome.status {
        GrainStatus::Completed(_) => tracing::info!(
            measurements = outcome.measurement_count,
            "grain {}/{} completed",
            outcome.grain,
            total
        ),
        GrainStatus::Failed(error) => tracing::warn!(
            code = error.code(),
            "grain {} failed: {}",
            outcome.grain,
            error.message()
        ),
        GrainStatus::Cancelled => tracing::info!("grain {} cancelled", outcome.grain),
    }
    tracing::debug!(done, total, "batch progress");
}

/// Write one table per completed grain. A failed write is recorded against
/// its grain and the remaining tables are still written.
fn export_completed(
    batch: &BatchReport,
    config: &AnalyzeConfig,
) -> GrainResult<BTreeMap<usize, GrainResult<PathBuf>>> {
    if batch.completed().next().is_none() {
        return Ok(BTreeMap::new());
    }

    fs::create_dir_all(&config.output_dir).map_err(|source| {
        GrainError::io_system(
            "IO.OUTPUT_DIRECTORY",
            format!(
                "failed to create output directory '{}': {}",
                config.output_dir.display(),
                source
            ),
        )
    })?;

    Ok(batch
        .completed()
        .map(|spectrum| {
            let written = write_spectrum_table(&config.output_dir, spectrum, config.format);
            if let Err(error) = &written {
                tracing::warn!(code = error.code(), "grain {}: {}", spectrum.grain, error.message());
            }
            (spectrum.grain.get(), written)
        })
        .collect())
}

struct LoadFailure {
    file_count: usize,
    error: GrainError,
}

/// Runs the pipeline on grains whose files were read up front.
///
/// A grain with an unreadable or malformed file is kept in the batch with no
/// measurements, and processing it returns the load error recorded for it.
struct LoadedGrainProcessor {
    pipeline: SpectrumPipeline,
    load_failures: BTreeMap<GrainId, LoadFailure>,
}

impl LoadedGrainProcessor {
    fn load(pipeline: SpectrumPipeline, grouped: Vec<GrainFiles>) -> (Self, Vec<Grain>) {
        let mut grains = Vec::with_capacity(grouped.len());
        let mut load_failures = BTreeMap::new();

        for GrainFiles { grain, files } in grouped {
            match files
                .iter()
                .map(|path| read_trace_file(path))
                .collect::<GrainResult<Vec<Trace>>>()
            {
                Ok(measurements) => grains.push(Grain::new(grain, measurements)),
                Err(error) => {
                    load_failures.insert(
                        grain,
                        LoadFailure {
                            file_count: files.len(),
                            error,
                        },
                    );
                    grains.push(Grain::new(grain, Vec::new()));
                }
            }
        }

        (
            Self {
                pipeline,
                load_failures,
            },
            grains,
        )
    }

    /// Report the number of files found for grains that never loaded.
    fn restore_file_counts(&self, batch: &mut BatchReport) {
        for outcome in &mut batch.outcomes {
            if let Some(failure) = self.load_failures.get(&outcome.grain) {
                outcome.measurement_count = failure.file_count;
            }
        }
    }
}

impl GrainProcessor for LoadedGrainProcessor {
    fn process(&self, grain: Grain) -> GrainResult<GrainSpectrum> {
        match self.load_failures.get(&grain.id) {
            Some(failure) => Err(failure.error.clone()),
            None => self.pipeline.process(grain),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AnalyzeArgs, LoadedGrainProcessor};
    use crate::cli::CliError;
    use crate::cli::discovery::GrainFiles;
    use grainavg_core::domain::{GrainErrorCategory, GrainId};
    use grainavg_core::modules::{BatchOptions, SpectrumPipeline, run_batch};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    #[derive(clap::Parser)]
    struct Harness {
        #[command(flatten)]
        args: AnalyzeArgs,
    }

    fn parse(args: &[&str]) -> AnalyzeArgs {
        use clap::Parser;
        Harness::try_parse_from(std::iter::once("analyze").chain(args.iter().copied()))
            .expect("arguments should parse")
            .args
    }

    #[test]
    fn output_defaults_to_input_and_flags_override_config_file() {
        let temp = TempDir::new().expect("tempdir should be created");
        fs::write(
            temp.path().join("config.json"),
            r#"{ "slopeThreshold": 10.0, "targetHeight": 4.0 }"#,
        )
        .expect("config should be written");

        let config = parse(&["data", "--config", "config.json", "--target-height", "2.0"])
            .into_config(temp.path())
            .unwrap_or_else(|_| panic!("config should resolve"));

        assert_eq!(config.input_dir, temp.path().join("data"));
        assert_eq!(config.output_dir, config.input_dir);
        assert_eq!(config.pipeline.slope_threshold, 10.0);
        assert_eq!(config.pipeline.target_height, 2.0);
        assert_eq!(config.jobs, 1);
        assert!(config.report_path.is_none());
    }

    #[test]
    fn zero_jobs_is_a_usage_error() {
        let result = parse(&["data", "--jobs", "0"]).into_config(Path::new("/work"));
        assert!(matches!(result, Err(CliError::Usage(_))));
    }

    #[test]
    fn unreadable_config_file_is_input_validation() {
        let result = parse(&["data", "--config", "missing.json"]).into_config(Path::new("/nonexistent"));
        match result {
            Err(CliError::Compute(error)) => {
                assert_eq!(error.category(), GrainErrorCategory::InputValidationError);
                assert_eq!(error.code(), "INPUT.CONFIG_FILE");
            }
            _ => panic!("missing config should fail as input validation"),
        }
    }

    #[test]
    fn load_errors_fail_only_their_grain() {
        let temp = TempDir::new().expect("tempdir should be created");
        let good = |name: &str| {
            let path = temp.path().join(name);
            fs::write(&path, "1 1\n2 4\n3 2\n").expect("trace should be written");
            path
        };
        let grouped = vec![
            GrainFiles {
                grain: GrainId::new(1).unwrap(),
                files: vec![good("s_1_1.txt"), good("s_1_2.txt")],
            },
            GrainFiles {
                grain: GrainId::new(2).unwrap(),
                files: vec![good("s_2_1.txt"), temp.path().join("s_2_2.txt")],
            },
        ];

        let (processor, grains) = LoadedGrainProcessor::load(SpectrumPipeline::default(), grouped);
        assert_eq!(grains.len(), 2);
        assert_eq!(grains[1].measurement_count(), 0);

        let mut batch = run_batch(&processor, grains, &BatchOptions::default(), |_| {})
            .expect("batch should run");
        processor.restore_file_counts(&mut batch);

        assert!(batch.outcomes[0].spectrum().is_some());
        assert_eq!(batch.outcomes[0].measurement_count, 2);
        let error = batch.outcomes[1]
            .error()
            .expect("grain with a missing file should fail");
        assert_eq!(error.code(), "IO.TRACE_READ");
        assert_eq!(batch.outcomes[1].measurement_count, 2);
    }
}
