use grainavg_core::domain::{GrainError, GrainResult, Trace};
use std::fs;
use std::path::{Path, PathBuf};

pub(super) fn read_trace_file(path: &Path) -> GrainResult<Trace> {
    let source = fs::read_to_string(path).map_err(|source| {
        GrainError::io_system(
            "IO.TRACE_READ",
            format!("failed to read trace '{}': {}", path.display(), source),
        )
    })?;
    parse_trace_text(&source, path)
}

/// Parse `x y` pairs, one per line.
///
/// Columns may be separated by commas, semicolons, tabs or spaces. Blank lines
/// and `#` comments are ignored, and the first content line may be a header.
pub(super) fn parse_trace_text(source: &str, origin: &Path) -> GrainResult<Trace> {
    let mut points = Vec::new();
    let mut header_allowed = true;

    for (index, line) in source.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match parse_point(line) {
            Some((x, y)) if !x.is_finite() || !y.is_finite() => {
                return Err(GrainError::input_validation(
                    "INPUT.TRACE_VALUE",
                    format!(
                        "{}:{}: values must be finite, found '{}'",
                        origin.display(),
                        index + 1,
                        line
                    ),
                ));
            }
            Some(point) => points.push(point),
            None if header_allowed => {
                tracing::debug!(file = %origin.display(), header = line, "skipping header line");
            }
            None => {
                return Err(GrainError::input_validation(
                    "INPUT.TRACE_LINE",
                    format!(
                        "{}:{}: expected two numeric columns, found '{}'",
                        origin.display(),
                        index + 1,
                        line
                    ),
                ));
            }
        }
        header_allowed = false;
    }

    Ok(Trace::from_points(points))
}

fn parse_point(line: &str) -> Option<(f64, f64)> {
    let mut columns = line
        .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .filter(|column| !column.is_empty());
    let x = columns.next()?.parse::<f64>().ok()?;
    let y = columns.next()?.parse::<f64>().ok()?;
    Some((x, y))
}

pub(super) fn resolve_cli_path(working_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        working_dir.join(path)
    }
}
