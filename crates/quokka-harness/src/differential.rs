//! Differential comparison against an independent rendering oracle.
//!
//! The same HTML is rendered by this engine and by an oracle (usually a
//! headless browser) at the same viewport. Both screenshots are padded with
//! white to a common size and compared with a wide per-channel tolerance,
//! since engines are expected to diverge in text shaping. Each comparison
//! yields a [`DifferentialReport`]; failures above the configured ratio are
//! appended to a CSV mismatch log.

use std::collections::BTreeSet;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::Command;

use image::RgbaImage;
use log::{debug, warn};
use quokka_css::layout::{FragmentId, FragmentTree, InlineContent, Rect};
use quokka_css::style::{Float, Position};
use quokka_engine::{RenderOptions, encode_png, render};
use serde::Serialize;

use crate::HarnessError;
use crate::config::{HarnessConfig, SeverityBounds};
use crate::pixel::{PixelDiff, compare_images, write};

/// An independent renderer producing reference screenshots.
pub trait Oracle: Send + Sync {
    /// Short name for reports.
    fn name(&self) -> &str;

    /// Render `html` at the given viewport.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Oracle`] when no screenshot is produced.
    fn screenshot(&self, html: &str, width: u32, height: u32) -> Result<RgbaImage, HarnessError>;
}

/// An oracle driven through an external command.
///
/// Arguments may contain the placeholders `{input}` (an HTML file),
/// `{output}` (the PNG the command must write), `{width}` and `{height}`.
#[derive(Debug, Clone)]
pub struct CommandOracle {
    name: String,
    program: PathBuf,
    args: Vec<String>,
}

impl CommandOracle {
    /// An oracle running `program` with templated `args`.
    #[must_use]
    pub fn new(name: &str, program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            program: program.into(),
            args,
        }
    }

    /// Headless Chromium taking a screenshot of a local file.
    #[must_use]
    pub fn chromium(program: impl Into<PathBuf>) -> Self {
        let args = [
            "--headless",
            "--disable-gpu",
            "--hide-scrollbars",
            "--force-device-scale-factor=1",
            "--screenshot={output}",
            "--window-size={width},{height}",
            "file://{input}",
        ];
        Self::new("chromium", program, args.iter().map(ToString::to_string).collect())
    }

    fn expand(&self, input: &Path, output: &Path, width: u32, height: u32) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{input}", &input.display().to_string())
                    .replace("{output}", &output.display().to_string())
                    .replace("{width}", &width.to_string())
                    .replace("{height}", &height.to_string())
            })
            .collect()
    }

    fn failure(&self, message: impl fmt::Display) -> HarnessError {
        HarnessError::Oracle {
            oracle: self.name.clone(),
            message: message.to_string(),
        }
    }
}

impl Oracle for CommandOracle {
    fn name(&self) -> &str {
        &self.name
    }

    fn screenshot(&self, html: &str, width: u32, height: u32) -> Result<RgbaImage, HarnessError> {
        let dir = tempfile::tempdir().map_err(|e| self.failure(e))?;
        let input = dir.path().join("input.html");
        let output = dir.path().join("output.png");
        write(&input, html.as_bytes())?;
        let args = self.expand(&input, &output, width, height);
        debug!("running oracle {} {args:?}", self.program.display());
        let status = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|e| self.failure(format!("{}: {e}", self.program.display())))?;
        if !status.status.success() {
            return Err(self.failure(format!(
                "exited with {}: {}",
                status.status,
                String::from_utf8_lossy(&status.stderr).trim()
            )));
        }
        let image = image::open(&output).map_err(|e| self.failure(e))?;
        Ok(image.to_rgba8())
    }
}

/// How far apart two renders are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    /// Below the `low` bound.
    Identical,
    /// Below the `medium` bound.
    Low,
    /// Below the `high` bound.
    Medium,
    /// Below the `critical` bound.
    High,
    /// At or above the `critical` bound.
    Critical,
}

impl Severity {
    /// Bucket a differing-pixel ratio.
    #[must_use]
    pub fn from_ratio(ratio: f64, bounds: &SeverityBounds) -> Self {
        if ratio < bounds.low {
            Self::Identical
        } else if ratio < bounds.medium {
            Self::Low
        } else if ratio < bounds.high {
            Self::Medium
        } else if ratio < bounds.critical {
            Self::High
        } else {
            Self::Critical
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Where the differences are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Classification {
    /// No pixel differs beyond the tolerance.
    Identical,
    /// Only the page size differs; the padded pixels agree.
    DimensionsOnly,
    /// Every differing pixel lies on text.
    TextOnly,
    /// Some differing pixel lies off text: boxes moved or changed.
    Geometry,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One differential comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DifferentialReport {
    /// Test case name.
    pub name: String,
    /// Oracle name.
    pub oracle: String,
    /// Whether both screenshots had the same size before padding.
    pub dimensions_match: bool,
    /// Pixels compared after padding.
    pub total_pixels: u64,
    /// Pixels differing beyond the tolerance.
    pub differing_pixels: u64,
    /// `differing_pixels / total_pixels`.
    pub ratio: f64,
    /// Severity bucket of `ratio`.
    pub severity: Severity,
    /// Where the differences are.
    pub classification: Classification,
    /// Text fragments overlapping a float they should flow around.
    pub overlap_count: usize,
    /// Whether `ratio` is within the configured failure ratio.
    pub passed: bool,
}

/// Text rectangles of a fragment tree, grown by `margin` px on every side
/// to absorb anti-aliasing.
fn text_rects(tree: &FragmentTree, margin: f32) -> Vec<Rect> {
    let mut rects = Vec::new();
    for fragment in &tree.fragments {
        let inlines = fragment
            .lines
            .iter()
            .flat_map(|line| line.inlines.iter())
            .chain(fragment.marker.iter());
        for inline in inlines {
            if matches!(inline.content, InlineContent::Text(_) | InlineContent::Marker(_)) {
                rects.push(Rect::new(
                    inline.x - margin,
                    inline.y - margin,
                    inline.width + 2.0 * margin,
                    inline.height + 2.0 * margin,
                ));
            }
        }
    }
    rects
}

#[allow(clippy::cast_precision_loss)]
fn classify(diff: &PixelDiff, dimensions_match: bool, tree: &FragmentTree) -> Classification {
    if diff.is_identical() {
        return if dimensions_match {
            Classification::Identical
        } else {
            Classification::DimensionsOnly
        };
    }
    let text = text_rects(tree, 2.0);
    let on_text = |x: u32, y: u32| {
        let (x, y) = (x as f32 + 0.5, y as f32 + 0.5);
        text.iter()
            .any(|r| x >= r.x && x < r.right() && y >= r.y && y < r.bottom())
    };
    let all_on_text = diff
        .diff_image
        .enumerate_pixels()
        .filter(|(_, _, p)| p.0[0] == 255)
        .all(|(x, y, _)| on_text(x, y));
    if all_on_text {
        Classification::TextOnly
    } else {
        Classification::Geometry
    }
}

/// Count text fragments that overlap a float they are not inside of.
///
/// Line boxes flow around floats, so a correct layout scores zero. Text in
/// positioned boxes is ignored since those may legitimately cover floats.
#[must_use]
pub fn overlap_count(tree: &FragmentTree) -> usize {
    let positioned: BTreeSet<FragmentId> = tree
        .fragments
        .iter()
        .filter(|f| f.position != Position::Static)
        .flat_map(|f| tree.descendants(f.id))
        .collect();
    let mut count = 0;
    for float in tree.fragments.iter().filter(|f| f.float != Float::None) {
        let inside: BTreeSet<FragmentId> = tree.descendants(float.id).into_iter().collect();
        let area = float.border_box();
        for fragment in &tree.fragments {
            if inside.contains(&fragment.id) || positioned.contains(&fragment.id) {
                continue;
            }
            count += fragment
                .lines
                .iter()
                .flat_map(|line| line.inlines.iter())
                .filter(|inline| matches!(inline.content, InlineContent::Text(_)))
                .filter(|inline| {
                    inline.width > 0.0
                        && Rect::new(inline.x, inline.y, inline.width, inline.height)
                            .overlaps(&area)
                })
                .count();
        }
    }
    count
}

/// Runs differential comparisons and records mismatches.
pub struct DifferentialRunner<'a> {
    oracle: &'a dyn Oracle,
    config: &'a HarnessConfig,
    options: RenderOptions,
    log: MismatchLog,
}

impl<'a> DifferentialRunner<'a> {
    /// A runner writing artifacts under `config.report_dir`. This engine
    /// draws glyphs from system fonts when available, to resemble the
    /// oracle.
    ///
    /// # Errors
    ///
    /// Fails when the report directory or CSV log cannot be created.
    pub fn new(oracle: &'a dyn Oracle, config: &'a HarnessConfig) -> Result<Self, HarnessError> {
        fs::create_dir_all(&config.report_dir)
            .map_err(|e| HarnessError::io(&config.report_dir, e))?;
        let log = MismatchLog::open(&config.report_dir.join("mismatches.csv"))?;
        let options = RenderOptions::new(config.viewport_width, config.viewport_height)
            .with_system_fonts();
        Ok(Self {
            oracle,
            config,
            options,
            log,
        })
    }

    /// Compare one document. Artifacts (`<name>.quokka.png`,
    /// `<name>.oracle.png`, `<name>.diff.png`) are written for every
    /// non-identical result, and failures are logged.
    ///
    /// # Errors
    ///
    /// Fails when either side cannot render or artifacts cannot be written.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn run(&mut self, name: &str, html: &str) -> Result<DifferentialReport, HarnessError> {
        let config = self.config;
        let rendering = render(html, &self.options)?;
        let width = config.viewport_width.max(1.0).ceil() as u32;
        let height = config.viewport_height.max(1.0).ceil() as u32;
        let reference = self.oracle.screenshot(html, width, height)?;

        let dimensions_match = reference.dimensions() == rendering.image.dimensions();
        let diff = compare_images(&reference, &rendering.image, config.differential_tolerance);
        let ratio = diff.ratio();
        let report = DifferentialReport {
            name: name.to_string(),
            oracle: self.oracle.name().to_string(),
            dimensions_match,
            total_pixels: diff.total_pixels,
            differing_pixels: diff.differing_pixels,
            ratio,
            severity: Severity::from_ratio(ratio, &config.severity),
            classification: classify(&diff, dimensions_match, &rendering.fragments),
            overlap_count: overlap_count(&rendering.fragments),
            passed: ratio <= config.differential_fail_ratio,
        };

        if report.classification != Classification::Identical {
            let dir = &config.report_dir;
            write(&dir.join(format!("{name}.quokka.png")), &encode_png(&rendering.image)?)?;
            write(&dir.join(format!("{name}.oracle.png")), &encode_png(&reference)?)?;
            write(&dir.join(format!("{name}.diff.png")), &encode_png(&diff.diff_image)?)?;
        }
        if !report.passed {
            warn!(
                "{name}: {:.2}% of pixels differ from {} ({})",
                ratio * 100.0,
                report.oracle,
                report.severity
            );
            self.log.append(&report)?;
        }
        Ok(report)
    }
}

/// Append-only CSV log of differential failures.
#[derive(Debug)]
pub struct MismatchLog {
    path: PathBuf,
    file: File,
}

/// Column names of the mismatch log.
pub const MISMATCH_LOG_HEADER: &str = "name,oracle,severity,classification,ratio,differing_pixels,total_pixels,overlap_count,dimensions_match";

impl MismatchLog {
    /// Open a log, writing the header if the file is new or empty.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be opened or written.
    pub fn open(path: &Path) -> Result<Self, HarnessError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| HarnessError::io(path, e))?;
        let empty = file
            .metadata()
            .map_err(|e| HarnessError::io(path, e))?
            .len()
            == 0;
        if empty {
            writeln!(file, "{MISMATCH_LOG_HEADER}").map_err(|e| HarnessError::io(path, e))?;
        }
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Append one report as a row.
    ///
    /// # Errors
    ///
    /// Fails when the row cannot be written.
    pub fn append(&mut self, report: &DifferentialReport) -> Result<(), HarnessError> {
        let row = [
            csv_field(&report.name),
            csv_field(&report.oracle),
            report.severity.to_string(),
            report.classification.to_string(),
            format!("{:.6}", report.ratio),
            report.differing_pixels.to_string(),
            report.total_pixels.to_string(),
            report.overlap_count.to_string(),
            report.dimensions_match.to_string(),
        ]
        .join(",");
        writeln!(self.file, "{row}").map_err(|e| HarnessError::io(&self.path, e))
    }
}

/// Quote a CSV field when it contains a separator, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_severity_buckets() {
        let bounds = SeverityBounds::default();
        assert_eq!(Severity::from_ratio(0.0, &bounds), Severity::Identical);
        assert_eq!(Severity::from_ratio(0.049, &bounds), Severity::Identical);
        assert_eq!(Severity::from_ratio(0.05, &bounds), Severity::Low);
        assert_eq!(Severity::from_ratio(0.15, &bounds), Severity::Medium);
        assert_eq!(Severity::from_ratio(0.5, &bounds), Severity::High);
        assert_eq!(Severity::from_ratio(0.95, &bounds), Severity::Critical);
    }

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_chromium_arguments_expand() {
        let oracle = CommandOracle::chromium("chromium");
        let args = oracle.expand(Path::new("/tmp/in.html"), Path::new("/tmp/out.png"), 800, 600);
        assert!(args.contains(&"--screenshot=/tmp/out.png".to_string()));
        assert!(args.contains(&"--window-size=800,600".to_string()));
        assert!(args.contains(&"file:///tmp/in.html".to_string()));
    }

    #[test]
    fn test_float_beside_text_has_no_overlap() {
        let tree = quokka_engine::render_to_fragment_tree(
            "<div style='float:left;width:50px;height:50px'></div><p>text flows around the float</p>",
            300.0,
            200.0,
        );
        assert_eq!(overlap_count(&tree), 0);
    }
}
