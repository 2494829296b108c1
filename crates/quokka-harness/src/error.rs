//! Harness errors.

use std::io;
use std::path::PathBuf;

use quokka_engine::RenderError;
use thiserror::Error;

/// Errors that stop a harness run.
///
/// Baseline mismatches and invariant violations are not errors; they are
/// reported as values.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Reading or writing a file failed.
    #[error("{}: {source}", path.display())]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// A JSON document could not be produced or parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// A stored PNG could not be decoded.
    #[error("{}: {source}", path.display())]
    Image {
        /// File involved.
        path: PathBuf,
        /// Decoder error.
        #[source]
        source: image::ImageError,
    },
    /// Rasterization failed.
    #[error(transparent)]
    Render(#[from] RenderError),
    /// The differential oracle failed to produce a screenshot.
    #[error("oracle '{oracle}' failed: {message}")]
    Oracle {
        /// Oracle name.
        oracle: String,
        /// What went wrong.
        message: String,
    },
    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl HarnessError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
