//! Baseline, differential and fuzz protocols end to end, on temporary
//! directories.

use std::fs;

use image::{Rgba, RgbaImage};
use quokka_engine::{RenderOptions, encode_png, render};
use quokka_harness::{
    Classification, DifferentialRunner, GoldenOutcome, GoldenStore, HarnessConfig, HarnessError,
    MISMATCH_LOG_HEADER, MismatchKind, Oracle, PixelOutcome, PixelStore, Severity, run_fuzz,
};

/// An oracle returning a fixed image.
struct FixedOracle {
    image: RgbaImage,
}

impl FixedOracle {
    fn filled(width: u32, height: u32, color: [u8; 4]) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, Rgba(color)),
        }
    }
}

impl Oracle for FixedOracle {
    fn name(&self) -> &str {
        "fixed"
    }

    fn screenshot(&self, _: &str, _: u32, _: u32) -> Result<RgbaImage, HarnessError> {
        Ok(self.image.clone())
    }
}

fn config_in(dir: &std::path::Path) -> HarnessConfig {
    HarnessConfig {
        viewport_width: 200.0,
        viewport_height: 100.0,
        golden_dir: dir.join("golden"),
        pixel_dir: dir.join("pixel"),
        report_dir: dir.join("reports"),
        ..HarnessConfig::default()
    }
}

const BOX: &str = r#"<div style="width:50px;height:20px;background-color:red"></div>"#;
const WIDER_BOX: &str = r#"<div style="width:60px;height:20px;background-color:red"></div>"#;

#[test]
fn test_golden_created_matched_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let store = GoldenStore::new(dir.path());

    assert_eq!(store.check("case", "{\n  \"a\": 1\n}").unwrap(), GoldenOutcome::Created);
    assert!(dir.path().join("case.json").exists());
    assert_eq!(store.check("case", "{\n  \"a\": 1\n}").unwrap(), GoldenOutcome::Matched);

    let outcome = store.check("case", "{\n  \"a\": 2\n}").unwrap();
    assert!(outcome.is_failure());
    match outcome {
        GoldenOutcome::Mismatch {
            actual_path,
            first_difference,
            ..
        } => {
            assert_eq!(first_difference, 2);
            assert_eq!(fs::read_to_string(actual_path).unwrap(), "{\n  \"a\": 2\n}");
        }
        other => panic!("expected a mismatch, got {other:?}"),
    }

    // The golden file is never overwritten by a mismatch.
    assert_eq!(store.check("case", "{\n  \"a\": 1\n}").unwrap(), GoldenOutcome::Matched);
    assert!(
        !dir.path().join("case.actual.json").exists(),
        "stale actual file should be removed once the output matches"
    );
}

#[test]
fn test_pixel_baseline_classifies_layout_changes() {
    let dir = tempfile::tempdir().unwrap();
    let store = PixelStore::new(dir.path(), 0, 0.0);
    let options = RenderOptions::new(200.0, 100.0);

    let first = render(BOX, &options).unwrap();
    assert_eq!(store.check("box", &first).unwrap(), PixelOutcome::Created);
    for file in ["box.png", "box.fragments.json", "box.display_list.json"] {
        assert!(dir.path().join(file).exists(), "{file} written");
    }
    assert_eq!(
        store.check("box", &first).unwrap(),
        PixelOutcome::Matched { ratio: 0.0 }
    );

    let wider = render(WIDER_BOX, &options).unwrap();
    match store.check("box", &wider).unwrap() {
        PixelOutcome::Mismatch {
            ratio,
            kind,
            diff_path,
        } => {
            assert_eq!(kind, MismatchKind::LayoutDiff);
            assert!(ratio > 0.0);
            assert!(diff_path.exists());
            assert!(dir.path().join("box.actual.png").exists());
        }
        other => panic!("expected a mismatch, got {other:?}"),
    }
}

#[test]
fn test_pixel_baseline_blames_raster_when_json_agrees() {
    let dir = tempfile::tempdir().unwrap();
    let store = PixelStore::new(dir.path(), 0, 0.0);
    let rendering = render(BOX, &RenderOptions::new(200.0, 100.0)).unwrap();
    assert_eq!(store.check("box", &rendering).unwrap(), PixelOutcome::Created);

    // Replace the stored pixels but keep the JSON sidecars.
    let black = RgbaImage::from_pixel(200, 100, Rgba([0, 0, 0, 255]));
    fs::write(dir.path().join("box.png"), encode_png(&black).unwrap()).unwrap();

    match store.check("box", &rendering).unwrap() {
        PixelOutcome::Mismatch { kind, .. } => assert_eq!(kind, MismatchKind::RasterDiff),
        other => panic!("expected a mismatch, got {other:?}"),
    }
}

#[test]
fn test_differential_identical_against_blank_oracle() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let oracle = FixedOracle::filled(200, 100, [255, 255, 255, 255]);
    let mut runner = DifferentialRunner::new(&oracle, &config).unwrap();

    let report = runner.run("blank", "<p></p>").unwrap();
    assert_eq!(report.classification, Classification::Identical);
    assert_eq!(report.severity, Severity::Identical);
    assert!(report.passed);
    assert!(!config.report_dir.join("blank.diff.png").exists());
}

#[test]
fn test_differential_dimension_only_difference() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let oracle = FixedOracle::filled(200, 140, [255, 255, 255, 255]);
    let mut runner = DifferentialRunner::new(&oracle, &config).unwrap();

    let report = runner.run("taller", "<p></p>").unwrap();
    assert!(!report.dimensions_match);
    assert_eq!(report.classification, Classification::DimensionsOnly);
    assert_eq!(report.total_pixels, 200 * 140);
    assert!(report.passed);
}

#[test]
fn test_differential_failure_is_logged() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let oracle = FixedOracle::filled(200, 100, [0, 0, 0, 255]);
    let mut runner = DifferentialRunner::new(&oracle, &config).unwrap();

    let report = runner.run("dark", BOX).unwrap();
    assert_eq!(report.severity, Severity::Critical);
    assert_eq!(report.classification, Classification::Geometry);
    assert!(!report.passed);
    for suffix in ["quokka.png", "oracle.png", "diff.png"] {
        assert!(config.report_dir.join(format!("dark.{suffix}")).exists());
    }

    let log = fs::read_to_string(config.report_dir.join("mismatches.csv")).unwrap();
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines[0], MISMATCH_LOG_HEADER);
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("dark,fixed,Critical,Geometry,"), "{}", lines[1]);
}

#[test]
fn test_mismatch_log_header_written_once() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let oracle = FixedOracle::filled(200, 100, [0, 0, 0, 255]);
    for name in ["one", "two"] {
        let mut runner = DifferentialRunner::new(&oracle, &config).unwrap();
        let _ = runner.run(name, "<p></p>").unwrap();
    }
    let log = fs::read_to_string(config.report_dir.join("mismatches.csv")).unwrap();
    assert_eq!(log.matches(MISMATCH_LOG_HEADER).count(), 1);
    assert_eq!(log.lines().count(), 3);
}

#[test]
fn test_fuzz_run_is_deterministic() {
    let config = HarnessConfig {
        fuzz_seed: 7,
        fuzz_count: 12,
        fuzz_max_elements: 8,
        ..HarnessConfig::default()
    };
    let first = run_fuzz(&config);
    let second = run_fuzz(&config);
    assert_eq!(first.cases_run, 12);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
    let seeds: Vec<u64> = first
        .violations
        .iter()
        .chain(&first.panics)
        .map(|case| case.seed)
        .collect();
    assert!(seeds.iter().all(|seed| (7..19).contains(seed)));
}
