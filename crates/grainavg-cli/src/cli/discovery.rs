use super::CliError;
use globset::{GlobBuilder, GlobMatcher};
use grainavg_core::domain::{GrainError, GrainId, GrainResult};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub(super) const DEFAULT_MEASUREMENT_PATTERN: &str = "*.txt";

/// A measurement file named `<anything>_<grain>_<measurement>.<ext>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct MeasurementFile {
    pub(super) path: PathBuf,
    pub(super) grain: usize,
    pub(super) measurement: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct GrainFiles {
    pub(super) grain: GrainId,
    pub(super) files: Vec<PathBuf>,
}

pub(super) fn measurement_matcher(pattern: &str) -> Result<GlobMatcher, CliError> {
    GlobBuilder::new(pattern)
        .case_insensitive(true)
        .literal_separator(true)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|source| CliError::Usage(format!("invalid --pattern '{pattern}': {source}")))
}

/// Split `name` on `_`: the second-to-last token is the grain number and the
/// last token, up to its first `.`, names the measurement.
pub(super) fn parse_grain_file_name(name: &str) -> Option<(usize, String)> {
    let mut tokens = name.rsplit('_');
    let last = tokens.next()?;
    let grain = tokens.next()?.trim().parse::<usize>().ok()?;
    if grain == 0 {
        return None;
    }
    let measurement = last.split('.').next().unwrap_or(last).to_string();
    Some((grain, measurement))
}

pub(super) fn discover_measurement_files(
    input_dir: &Path,
    matcher: &GlobMatcher,
) -> Result<Vec<MeasurementFile>, CliError> {
    let entries = fs::read_dir(input_dir).map_err(|source| {
        GrainError::io_system(
            "IO.INPUT_DIRECTORY",
            format!(
                "failed to read input directory '{}': {}",
                input_dir.display(),
                source
            ),
        )
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| {
            GrainError::io_system(
                "IO.INPUT_DIRECTORY",
                format!(
                    "failed to list input directory '{}': {}",
                    input_dir.display(),
                    source
                ),
            )
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if !matcher.is_match(name) {
            continue;
        }

        match parse_grain_file_name(name) {
            Some((grain, measurement)) => files.push(MeasurementFile {
                path: path.clone(),
                grain,
                measurement,
            }),
            None => tracing::warn!(
                file = %path.display(),
                "skipping file without a `_<grain>_<measurement>` suffix"
            ),
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

/// Bucket files into grains `1..=max`. Grains with no file come back empty.
///
/// `max` may not exceed the number of files, so a stray grain number cannot
/// stand in for millions of empty grains.
pub(super) fn group_by_grain(files: Vec<MeasurementFile>) -> GrainResult<Vec<GrainFiles>> {
    let file_count = files.len();
    let mut buckets: BTreeMap<usize, Vec<MeasurementFile>> = BTreeMap::new();
    for file in files {
        buckets.entry(file.grain).or_default().push(file);
    }

    let grain_count = buckets.keys().next_back().copied().unwrap_or(0);
    if grain_count > file_count {
        let path = buckets
            .get(&grain_count)
            .and_then(|bucket| bucket.first())
            .map(|file| file.path.display().to_string())
            .unwrap_or_default();
        return Err(GrainError::input_validation(
            "INPUT.GRAIN_NUMBER",
            format!(
                "grain number {grain_count} in '{path}' exceeds the {file_count} discovered measurement file(s)"
            ),
        ));
    }

    let mut grouped = Vec::with_capacity(grain_count);
    for index in 1..=grain_count {
        let Some(grain) = GrainId::new(index) else {
            continue;
        };
        let mut bucket = buckets.remove(&index).unwrap_or_default();
        bucket.sort_by(measurement_order);
        grouped.push(GrainFiles {
            grain,
            files: bucket.into_iter().map(|file| file.path).collect(),
        });
    }
    Ok(grouped)
}

fn measurement_order(a: &MeasurementFile, b: &MeasurementFile) -> std::cmp::Ordering {
    let numeric = |file: &MeasurementFile| file.measurement.parse::<usize>().ok();
    match (numeric(a), numeric(b)) {
        (Some(left), Some(right)) => left.cmp(&right).then_with(|| a.path.cmp(&b.path)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a
            .measurement
            .cmp(&b.measurement)
            .then_with(|| a.path.cmp(&b.path)),
    }
}
