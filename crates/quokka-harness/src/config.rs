//! Harness configuration.
//!
//! Loaded from a JSON file; every field has a default, so `{}` is a valid
//! configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::HarnessError;

/// Upper bounds of the non-identical severity buckets, as fractions of
/// differing pixels.
///
/// A ratio below `low` is `Identical`, below `medium` is `Low`, below
/// `high` is `Medium`, below `critical` is `High`, and anything else is
/// `Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityBounds {
    /// Start of the `Low` bucket.
    pub low: f64,
    /// Start of the `Medium` bucket.
    pub medium: f64,
    /// Start of the `High` bucket.
    pub high: f64,
    /// Start of the `Critical` bucket.
    pub critical: f64,
}

impl Default for SeverityBounds {
    fn default() -> Self {
        Self {
            low: 0.05,
            medium: 0.10,
            high: 0.20,
            critical: 0.90,
        }
    }
}

impl SeverityBounds {
    fn validate(&self) -> Result<(), HarnessError> {
        let bounds = [self.low, self.medium, self.high, self.critical];
        let in_range = bounds.iter().all(|b| (0.0..=1.0).contains(b));
        let ordered = bounds.windows(2).all(|w| w[0] <= w[1]);
        if in_range && ordered {
            Ok(())
        } else {
            Err(HarnessError::Config(format!(
                "severity bounds must be ascending fractions in 0..=1, got {bounds:?}"
            )))
        }
    }
}

/// Every knob of the golden, pixel, differential and fuzz protocols.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Viewport width for harness renders.
    pub viewport_width: f32,
    /// Viewport height for harness renders.
    pub viewport_height: f32,
    /// Per-channel difference (0-255) below which pixels count as equal in
    /// pixel-baseline comparisons.
    pub pixel_tolerance: u8,
    /// Fraction of differing pixels above which a pixel comparison fails.
    pub pixel_fail_ratio: f64,
    /// Per-channel tolerance for differential comparisons. Engines diverge
    /// in text shaping, so this is wider.
    pub differential_tolerance: u8,
    /// Fraction of differing pixels above which a differential comparison
    /// fails.
    pub differential_fail_ratio: f64,
    /// Severity buckets for differential reports.
    pub severity: SeverityBounds,
    /// First fuzz seed.
    pub fuzz_seed: u64,
    /// Number of fuzz seeds.
    pub fuzz_count: u64,
    /// Upper bound on elements per generated document.
    pub fuzz_max_elements: usize,
    /// Directory of JSON golden files.
    pub golden_dir: PathBuf,
    /// Directory of PNG baselines and their JSON sidecars.
    pub pixel_dir: PathBuf,
    /// Directory for differential reports and the CSV mismatch log.
    pub report_dir: PathBuf,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            viewport_width: 800.0,
            viewport_height: 600.0,
            pixel_tolerance: 0,
            pixel_fail_ratio: 0.0,
            differential_tolerance: 48,
            differential_fail_ratio: 0.20,
            severity: SeverityBounds::default(),
            fuzz_seed: 0,
            fuzz_count: 256,
            fuzz_max_elements: 24,
            golden_dir: PathBuf::from("tests/golden"),
            pixel_dir: PathBuf::from("tests/pixel"),
            report_dir: PathBuf::from("target/quokka-reports"),
        }
    }
}

impl HarnessConfig {
    /// Load a configuration file.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read, is not valid JSON, or holds
    /// out-of-range values.
    pub fn load(path: &Path) -> Result<Self, HarnessError> {
        let text = fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
        Self::from_json(&text)
    }

    /// Parse a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Fails on invalid JSON or out-of-range values.
    pub fn from_json(text: &str) -> Result<Self, HarnessError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Config`] naming the first bad field.
    pub fn validate(&self) -> Result<(), HarnessError> {
        for (name, ratio) in [
            ("pixel_fail_ratio", self.pixel_fail_ratio),
            ("differential_fail_ratio", self.differential_fail_ratio),
        ] {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(HarnessError::Config(format!(
                    "{name} must be within 0..=1, got {ratio}"
                )));
            }
        }
        if !(self.viewport_width.is_finite() && self.viewport_height.is_finite()) {
            return Err(HarnessError::Config("viewport must be finite".to_string()));
        }
        self.severity.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_gives_defaults() {
        let config = HarnessConfig::from_json("{}").unwrap();
        assert_eq!(config, HarnessConfig::default());
        assert_eq!(config.severity.critical, 0.90);
    }

    #[test]
    fn test_partial_severity_keeps_other_bounds() {
        let config = HarnessConfig::from_json(r#"{"severity": {"low": 0.01}}"#).unwrap();
        assert_eq!(config.severity.low, 0.01);
        assert_eq!(config.severity.medium, 0.10);
    }

    #[test]
    fn test_unordered_bounds_rejected() {
        let err = HarnessConfig::from_json(r#"{"severity": {"low": 0.5, "medium": 0.1}}"#);
        assert!(matches!(err, Err(HarnessError::Config(_))));
    }

    #[test]
    fn test_ratio_out_of_range_rejected() {
        let err = HarnessConfig::from_json(r#"{"pixel_fail_ratio": 1.5}"#);
        assert!(matches!(err, Err(HarnessError::Config(_))));
    }
}
