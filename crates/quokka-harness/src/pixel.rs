//! Pixel comparison and PNG baselines.
//!
//! A pixel baseline is a PNG plus the fragment tree and display list JSON
//! that produced it. When a new render differs, the sidecars tell which
//! pipeline stage moved:
//!
//! - fragment JSON differs: `LayoutDiff`
//! - only display list JSON differs: `PaintDiff`
//! - both JSON files match: `RasterDiff`

use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};
use log::{debug, info};
use quokka_css::{display_list_to_json, fragment_tree_to_json};
use quokka_engine::{Rendering, encode_png};
use serde::Serialize;

use crate::HarnessError;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Result of comparing two equally sized images.
#[derive(Debug, Clone)]
pub struct PixelDiff {
    /// Pixels compared.
    pub total_pixels: u64,
    /// Pixels with a channel difference above the tolerance.
    pub differing_pixels: u64,
    /// Largest channel difference seen.
    pub max_channel_diff: u8,
    /// Differing pixels in red on black.
    pub diff_image: RgbaImage,
}

impl PixelDiff {
    /// Fraction of pixels that differ.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn ratio(&self) -> f64 {
        if self.total_pixels == 0 {
            0.0
        } else {
            self.differing_pixels as f64 / self.total_pixels as f64
        }
    }

    /// Whether the images are equal within the tolerance.
    #[must_use]
    pub const fn is_identical(&self) -> bool {
        self.differing_pixels == 0
    }
}

/// Pad an image on the right and bottom with white up to the given size.
#[must_use]
pub fn pad_to(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if image.width() == width && image.height() == height {
        return image.clone();
    }
    RgbaImage::from_fn(width, height, |x, y| {
        if x < image.width() && y < image.height() {
            *image.get_pixel(x, y)
        } else {
            WHITE
        }
    })
}

/// Pad both images with white to their common bounding size.
#[must_use]
pub fn normalize_dimensions(a: &RgbaImage, b: &RgbaImage) -> (RgbaImage, RgbaImage) {
    let width = a.width().max(b.width());
    let height = a.height().max(b.height());
    (pad_to(a, width, height), pad_to(b, width, height))
}

/// Compare two images pixel by pixel, padding the smaller one with white.
///
/// A pixel differs when any RGBA channel differs by more than `tolerance`.
#[must_use]
pub fn compare_images(expected: &RgbaImage, actual: &RgbaImage, tolerance: u8) -> PixelDiff {
    let (expected, actual) = normalize_dimensions(expected, actual);
    let mut diff_image = RgbaImage::new(expected.width(), expected.height());
    let mut differing_pixels = 0;
    let mut max_channel_diff = 0;
    for ((e, a), out) in expected
        .pixels()
        .zip(actual.pixels())
        .zip(diff_image.pixels_mut())
    {
        let diff = e
            .0
            .iter()
            .zip(a.0.iter())
            .map(|(x, y)| x.abs_diff(*y))
            .max()
            .unwrap_or(0);
        max_channel_diff = max_channel_diff.max(diff);
        *out = if diff > tolerance {
            differing_pixels += 1;
            Rgba([255, 0, 0, 255])
        } else {
            Rgba([0, 0, 0, 255])
        };
    }
    PixelDiff {
        total_pixels: u64::from(expected.width()) * u64::from(expected.height()),
        differing_pixels,
        max_channel_diff,
        diff_image,
    }
}

/// Which pipeline stage a pixel mismatch comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MismatchKind {
    /// The fragment tree changed.
    LayoutDiff,
    /// The fragment tree is unchanged but the display list changed.
    PaintDiff,
    /// Layout and paint are unchanged; only the pixels moved.
    RasterDiff,
}

/// Outcome of checking a render against its pixel baseline.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelOutcome {
    /// No baseline existed; one was written.
    Created,
    /// The render matches within the configured ratio.
    Matched {
        /// Fraction of differing pixels.
        ratio: f64,
    },
    /// The render differs by more than the configured ratio.
    Mismatch {
        /// Fraction of differing pixels.
        ratio: f64,
        /// Stage responsible.
        kind: MismatchKind,
        /// Where the diff image was written.
        diff_path: PathBuf,
    },
}

/// A directory of PNG baselines with JSON sidecars.
#[derive(Debug, Clone)]
pub struct PixelStore {
    dir: PathBuf,
    tolerance: u8,
    fail_ratio: f64,
}

impl PixelStore {
    /// A store rooted at `dir` with the given comparison thresholds.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, tolerance: u8, fail_ratio: f64) -> Self {
        Self {
            dir: dir.into(),
            tolerance,
            fail_ratio,
        }
    }

    fn path(&self, name: &str, suffix: &str) -> PathBuf {
        self.dir.join(format!("{name}.{suffix}"))
    }

    /// Compare a render against the baseline called `name`.
    ///
    /// On first run the PNG and both JSON sidecars are written and
    /// [`PixelOutcome::Created`] is returned. On a mismatch the actual PNG,
    /// a diff PNG, and the actual JSON are written beside the baseline.
    ///
    /// # Errors
    ///
    /// Fails on I/O, PNG encoding or decoding errors.
    pub fn check(&self, name: &str, rendering: &Rendering) -> Result<PixelOutcome, HarnessError> {
        let png_path = self.path(name, "png");
        let fragments = fragment_tree_to_json(&rendering.fragments)?;
        let display_list = display_list_to_json(&rendering.display_list)?;

        if !png_path.exists() {
            fs::create_dir_all(&self.dir).map_err(|e| HarnessError::io(&self.dir, e))?;
            write(&png_path, &encode_png(&rendering.image)?)?;
            write(&self.path(name, "fragments.json"), fragments.as_bytes())?;
            write(&self.path(name, "display_list.json"), display_list.as_bytes())?;
            info!("{name}: new pixel baseline created, re-run to validate");
            return Ok(PixelOutcome::Created);
        }

        let expected = image::open(&png_path)
            .map_err(|source| HarnessError::Image {
                path: png_path.clone(),
                source,
            })?
            .to_rgba8();
        let diff = compare_images(&expected, &rendering.image, self.tolerance);
        let ratio = diff.ratio();
        debug!(
            "{name}: {} of {} pixels differ",
            diff.differing_pixels, diff.total_pixels
        );
        if ratio <= self.fail_ratio {
            return Ok(PixelOutcome::Matched { ratio });
        }

        let kind = classify(
            read_optional(&self.path(name, "fragments.json"))?.as_deref(),
            &fragments,
            read_optional(&self.path(name, "display_list.json"))?.as_deref(),
            &display_list,
        );
        let diff_path = self.path(name, "diff.png");
        write(&diff_path, &encode_png(&diff.diff_image)?)?;
        write(&self.path(name, "actual.png"), &encode_png(&rendering.image)?)?;
        write(&self.path(name, "actual.fragments.json"), fragments.as_bytes())?;
        write(&self.path(name, "actual.display_list.json"), display_list.as_bytes())?;
        Ok(PixelOutcome::Mismatch {
            ratio,
            kind,
            diff_path,
        })
    }
}

/// Attribute a pixel mismatch to a stage. A missing sidecar counts as
/// different.
#[must_use]
pub fn classify(
    expected_fragments: Option<&str>,
    actual_fragments: &str,
    expected_display_list: Option<&str>,
    actual_display_list: &str,
) -> MismatchKind {
    if expected_fragments != Some(actual_fragments) {
        MismatchKind::LayoutDiff
    } else if expected_display_list != Some(actual_display_list) {
        MismatchKind::PaintDiff
    } else {
        MismatchKind::RasterDiff
    }
}

pub(crate) fn write(path: &Path, bytes: &[u8]) -> Result<(), HarnessError> {
    fs::write(path, bytes).map_err(|e| HarnessError::io(path, e))
}

pub(crate) fn read_optional(path: &Path) -> Result<Option<String>, HarnessError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(HarnessError::io(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tolerance_absorbs_small_differences() {
        let a = RgbaImage::from_pixel(4, 4, Rgba([100, 100, 100, 255]));
        let b = RgbaImage::from_pixel(4, 4, Rgba([104, 100, 98, 255]));
        assert!(compare_images(&a, &b, 4).is_identical());
        let diff = compare_images(&a, &b, 3);
        assert_eq!(diff.differing_pixels, 16);
        assert_eq!(diff.max_channel_diff, 4);
        assert_eq!(diff.diff_image.get_pixel(0, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_padding_counts_missing_area_as_white() {
        let small = RgbaImage::from_pixel(2, 2, WHITE);
        let large = RgbaImage::from_pixel(4, 2, WHITE);
        let diff = compare_images(&small, &large, 0);
        assert_eq!(diff.total_pixels, 8);
        assert!(diff.is_identical());

        let mut dark = large.clone();
        dark.put_pixel(3, 1, Rgba([0, 0, 0, 255]));
        let diff = compare_images(&small, &dark, 0);
        assert_eq!(diff.differing_pixels, 1);
        assert!((diff.ratio() - 0.125).abs() < 1e-12);
    }

    #[test]
    fn test_classify_by_first_changed_stage() {
        assert_eq!(classify(Some("a"), "b", Some("x"), "x"), MismatchKind::LayoutDiff);
        assert_eq!(classify(None, "b", Some("x"), "x"), MismatchKind::LayoutDiff);
        assert_eq!(classify(Some("a"), "a", Some("x"), "y"), MismatchKind::PaintDiff);
        assert_eq!(classify(Some("a"), "a", Some("x"), "x"), MismatchKind::RasterDiff);
    }
}
