use grainavg_core::common::config::PipelineConfig;
use grainavg_core::domain::{Grain, GrainId, Trace};
use grainavg_core::modules::{BatchOptions, GrainProcessor, GrainStatus, SpectrumPipeline, run_batch};
use grainavg_core::numerics::{NumericTolerance, compare_with_tolerance};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

fn fixture_path() -> PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/pipeline_cases.json")
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PipelineFixtures {
    tolerance: NumericTolerance,
    cases: Vec<PipelineCase>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PipelineCase {
    id: String,
    grain: usize,
    config: PipelineConfig,
    x: Vec<f64>,
    measurements: Vec<Vec<f64>>,
    #[serde(default)]
    expected_average: Option<Vec<f64>>,
    #[serde(default)]
    expected_sem: Option<Vec<f64>>,
    #[serde(default)]
    expected_error_code: Option<String>,
}

impl PipelineCase {
    fn to_grain(&self) -> Grain {
        let measurements = self
            .measurements
            .iter()
            .map(|y| Trace::new(self.x.clone(), y.clone()).expect("fixture trace should be paired"))
            .collect();
        Grain::new(
            GrainId::new(self.grain).expect("fixture grain ids are one-based"),
            measurements,
        )
    }
}

fn load_fixtures() -> PipelineFixtures {
    let path = fixture_path();
    let source = fs::read_to_string(&path)
        .unwrap_or_else(|_| panic!("fixture should be readable: {}", path.display()));
    serde_json::from_str(&source).expect("fixture JSON should parse")
}

fn assert_series_close(label: &str, expected: &[f64], actual: &[f64], tolerance: NumericTolerance) {
    assert_eq!(expected.len(), actual.len(), "{label} length");
    for (index, (expected, actual)) in expected.iter().zip(actual).enumerate() {
        let comparison = compare_with_tolerance(*expected, *actual, tolerance);
        assert!(
            comparison.passes,
            "{label}[{index}] expected {expected} got {actual} (abs diff {})",
            comparison.abs_diff
        );
    }
}

#[test]
fn pipeline_fixtures_match_reference_outputs() {
    let fixtures = load_fixtures();

    for case in &fixtures.cases {
        let pipeline = SpectrumPipeline::new(case.config).expect("fixture config should be valid");
        let result = pipeline.process(case.to_grain());

        match &case.expected_error_code {
            Some(code) => {
                let error = result.expect_err(&format!("{} should fail", case.id));
                assert_eq!(error.code(), code.as_str(), "{} error code", case.id);
            }
            None => {
                let spectrum = result.unwrap_or_else(|error| panic!("{} failed: {error}", case.id));
                assert_eq!(spectrum.average.x(), case.x.as_slice(), "{} grid", case.id);
                assert_series_close(
                    &format!("{}.average", case.id),
                    case.expected_average.as_deref().expect("expected average"),
                    spectrum.average.y(),
                    fixtures.tolerance,
                );
                let expected_sem = case.expected_sem.as_deref().expect("expected sem");
                assert_series_close(
                    &format!("{}.semPlus", case.id),
                    expected_sem,
                    &spectrum.sem.plus,
                    fixtures.tolerance,
                );
                let negated: Vec<f64> = expected_sem.iter().map(|value| -value).collect();
                assert_series_close(
                    &format!("{}.semMinus", case.id),
                    &negated,
                    &spectrum.sem.minus,
                    fixtures.tolerance,
                );
            }
        }
    }
}

#[test]
fn batch_over_fixture_grains_isolates_failures() {
    let fixtures = load_fixtures();
    let pipeline = SpectrumPipeline::default();
    let grains = fixtures.cases.iter().map(PipelineCase::to_grain).collect();

    let report = run_batch(&pipeline, grains, &BatchOptions::default(), |_| {})
        .expect("batch should run");

    assert_eq!(report.grain_count(), fixtures.cases.len());
    for (outcome, case) in report.outcomes.iter().zip(&fixtures.cases) {
        assert_eq!(outcome.grain.get(), case.grain);
        match (&outcome.status, &case.expected_error_code) {
            (GrainStatus::Failed(error), Some(code)) => assert_eq!(error.code(), code.as_str()),
            (GrainStatus::Completed(_), None) => {}
            (status, expected) => panic!("{}: unexpected {status:?} (expected {expected:?})", case.id),
        }
    }
}

#[test]
fn averaged_peak_reaches_ceiling_when_peaks_align() {
    let x: Vec<f64> = (0..9).map(|i| 1000.0 + i as f64).collect();
    let shapes = [
        [1.0, 2.0, 4.0, 8.0, 16.0, 8.0, 4.0, 2.0, 1.0],
        [2.0, 3.0, 5.0, 9.0, 20.0, 9.0, 5.0, 3.0, 2.0],
        [0.5, 1.0, 3.0, 7.0, 12.0, 7.0, 3.0, 1.0, 0.5],
    ];
    let measurements = shapes
        .iter()
        .map(|y| Trace::new(x.clone(), y.to_vec()).expect("trace should build"))
        .collect();
    let grain = Grain::new(GrainId::new(1).unwrap(), measurements);

    let config = PipelineConfig {
        slope_threshold: 50.0,
        target_height: 2.5,
    };
    let spectrum = SpectrumPipeline::new(config)
        .expect("config should be valid")
        .process(grain)
        .expect("grain should process");

    let peak = spectrum.average.y()[4];
    assert!((peak - 2.5).abs() <= 1.0e-12, "peak was {peak}");
    assert!(spectrum.sem.plus.iter().all(|value| *value >= 0.0));
}
