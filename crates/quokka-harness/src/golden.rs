//! JSON golden files.
//!
//! A golden file holds the expected serialization of a fragment tree or
//! display list. The first run writes it; later runs compare byte for byte.

use std::fs;
use std::path::PathBuf;

use log::{info, warn};

use crate::HarnessError;
use crate::pixel::{read_optional, write};

/// Outcome of a golden check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoldenOutcome {
    /// No golden file existed; it was written.
    Created,
    /// The output equals the golden file.
    Matched,
    /// The output differs; it was written to `actual_path`.
    Mismatch {
        /// Golden file.
        expected_path: PathBuf,
        /// Where the actual output was written.
        actual_path: PathBuf,
        /// First differing line, 1-based.
        first_difference: usize,
    },
}

impl GoldenOutcome {
    /// Whether this outcome should fail a test.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Mismatch { .. })
    }
}

/// A directory of `<name>.json` golden files.
#[derive(Debug, Clone)]
pub struct GoldenStore {
    dir: PathBuf,
}

impl GoldenStore {
    /// A store rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Compare `actual` against the golden file called `name`.
    ///
    /// # Errors
    ///
    /// Fails only on I/O errors.
    pub fn check(&self, name: &str, actual: &str) -> Result<GoldenOutcome, HarnessError> {
        let expected_path = self.dir.join(format!("{name}.json"));
        let actual_path = self.dir.join(format!("{name}.actual.json"));
        let Some(expected) = read_optional(&expected_path)? else {
            fs::create_dir_all(&self.dir).map_err(|e| HarnessError::io(&self.dir, e))?;
            write(&expected_path, actual.as_bytes())?;
            info!("{name}: new baseline created, re-run to validate");
            return Ok(GoldenOutcome::Created);
        };
        if expected == actual {
            if actual_path.exists() {
                // A stale mismatch dump from an earlier run.
                fs::remove_file(&actual_path).map_err(|e| HarnessError::io(&actual_path, e))?;
            }
            return Ok(GoldenOutcome::Matched);
        }
        write(&actual_path, actual.as_bytes())?;
        let first_difference = first_differing_line(&expected, actual);
        warn!(
            "{name}: output differs from {} at line {first_difference}",
            expected_path.display()
        );
        Ok(GoldenOutcome::Mismatch {
            expected_path,
            actual_path,
            first_difference,
        })
    }
}

/// 1-based number of the first line where the texts differ.
fn first_differing_line(expected: &str, actual: &str) -> usize {
    let mut expected_lines = expected.lines();
    let mut actual_lines = actual.lines();
    let mut line = 1;
    loop {
        match (expected_lines.next(), actual_lines.next()) {
            (Some(e), Some(a)) if e == a => line += 1,
            _ => return line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_differing_line() {
        assert_eq!(first_differing_line("a\nb\nc", "a\nb\nd"), 3);
        assert_eq!(first_differing_line("a", "b"), 1);
        assert_eq!(first_differing_line("a\nb", "a"), 2);
    }
}
