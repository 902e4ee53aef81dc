use anyhow::Context;
use grainavg_core::domain::{GrainError, GrainResult, GrainSpectrum};
use grainavg_core::modules::{BatchReport, GrainStatus};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub(super) enum OutputFormat {
    #[default]
    Csv,
    Txt,
}

impl OutputFormat {
    pub(super) fn delimiter(self) -> char {
        match self {
            Self::Csv => ',',
            Self::Txt => '\t',
        }
    }

    pub(super) fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Txt => "txt",
        }
    }
}

pub(super) fn table_file_name(spectrum: &GrainSpectrum, format: OutputFormat) -> String {
    format!(
        "Grain {} - Averaged_RAMAN.{}",
        spectrum.grain,
        format.extension()
    )
}

/// Header `x, y-Ave, y-SEM` then one row per grid point.
pub(super) fn render_table(spectrum: &GrainSpectrum, format: OutputFormat) -> String {
    let delimiter = format.delimiter();
    let mut table = format!("x{delimiter}y-Ave{delimiter}y-SEM\n");
    for (x, y, sem) in spectrum.rows() {
        table.push_str(&format!(
            "{}{delimiter}{}{delimiter}{}\n",
            format_value(x),
            format_value(y),
            format_value(sem)
        ));
    }
    table
}

/// Shortest representation that reads back to the same value, always with a
/// fractional part or exponent.
pub(super) fn format_value(value: f64) -> String {
    format!("{value:?}")
}

pub(super) fn normalize_text_artifact(content: &str) -> String {
    let mut normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    if !normalized.is_empty() && !normalized.ends_with('\n') {
        normalized.push('\n');
    }
    normalized
}

pub(super) fn write_text_artifact(path: &Path, content: &str) -> std::io::Result<()> {
    fs::write(path, normalize_text_artifact(content))
}

pub(super) fn write_spectrum_table(
    output_dir: &Path,
    spectrum: &GrainSpectrum,
    format: OutputFormat,
) -> GrainResult<PathBuf> {
    let path = output_dir.join(table_file_name(spectrum, format));
    write_text_artifact(&path, &render_table(spectrum, format)).map_err(|source| {
        GrainError::io_system(
            "IO.TABLE_WRITE",
            format!("failed to write table '{}': {}", path.display(), source),
        )
    })?;
    Ok(path)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AnalyzeReport {
    pub(super) grain_count: usize,
    pub(super) completed_count: usize,
    pub(super) failed_count: usize,
    #[serde(skip_serializing_if = "is_zero")]
    pub(super) cancelled_count: usize,
    pub(super) grains: Vec<GrainReportEntry>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct GrainReportEntry {
    pub(super) grain: usize,
    pub(super) status: &'static str,
    pub(super) measurement_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) output: Option<PathBuf>,
}

fn is_zero(value: &usize) -> bool {
    *value == 0
}

impl AnalyzeReport {
    /// `exports` holds the table write result for each completed grain. A
    /// failed write turns that grain's entry into a failure.
    pub(super) fn from_batch(
        batch: &BatchReport,
        exports: &BTreeMap<usize, GrainResult<PathBuf>>,
    ) -> Self {
        let grains: Vec<GrainReportEntry> = batch
            .outcomes
            .iter()
            .map(|outcome| {
                let grain = outcome.grain.get();
                let mut entry = GrainReportEntry {
                    grain,
                    status: "completed",
                    measurement_count: outcome.measurement_count,
                    code: None,
                    message: None,
                    output: None,
                };
                let failure = match &outcome.status {
                    GrainStatus::Completed(_) => match exports.get(&grain) {
                        Some(Ok(path)) => {
                            entry.output = Some(path.clone());
                            None
                        }
                        Some(Err(error)) => Some(error),
                        None => None,
                    },
                    GrainStatus::Failed(error) => Some(error),
                    GrainStatus::Cancelled => {
                        entry.status = "cancelled";
                        None
                    }
                };
                if let Some(error) = failure {
                    entry.status = "failed";
                    entry.code = Some(error.code().to_string());
                    entry.message = Some(error.message().to_string());
                }
                entry
            })
            .collect();

        let count = |status: &str| grains.iter().filter(|entry| entry.status == status).count();
        Self {
            grain_count: batch.grain_count(),
            completed_count: count("completed"),
            failed_count: count("failed"),
            cancelled_count: count("cancelled"),
            grains,
        }
    }

    pub(super) fn all_completed(&self) -> bool {
        self.completed_count == self.grain_count
    }

    pub(super) fn write_json(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create report directory '{}'", parent.display())
            })?;
        }

        let rendered =
            serde_json::to_string_pretty(self).context("failed to serialize batch report")?;
        write_text_artifact(path, &rendered)
            .with_context(|| format!("failed to write report '{}'", path.display()))
    }
}

pub(super) fn render_human_summary(report: &AnalyzeReport) -> String {
    let mut lines = vec![format!(
        "Analyzed {} grain(s): {} completed, {} failed.",
        report.grain_count, report.completed_count, report.failed_count
    )];
    if report.cancelled_count > 0 {
        lines.push(format!("{} grain(s) cancelled.", report.cancelled_count));
    }
    for entry in &report.grains {
        let line = match (&entry.output, &entry.code, &entry.message) {
            (Some(output), _, _) => format!(
                "  Grain {} ({} measurements) -> {}",
                entry.grain,
                entry.measurement_count,
                output.display()
            ),
            (None, Some(code), Some(message)) => format!(
                "  Grain {} {}: [{}] {}",
                entry.grain, entry.status, code, message
            ),
            _ => format!("  Grain {} {}", entry.grain, entry.status),
        };
        lines.push(line);
    }
    lines.join("\n")
}
