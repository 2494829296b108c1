//! Test harness for the Quokka layout engine.
//!
//! Four protocols check the engine from different angles:
//!
//! - [`golden`]: JSON snapshots of fragment trees and display lists,
//!   compared byte for byte.
//! - [`pixel`]: PNG baselines with JSON sidecars, so a pixel mismatch can
//!   be attributed to layout, paint or rasterization.
//! - [`differential`]: screenshots compared against an independent
//!   [`Oracle`] with severity buckets and a CSV mismatch log.
//! - [`fuzz`]: seeded random documents run through the invariant
//!   checkers, with failures shrunk by [`minimize`].
//!
//! Every threshold lives in [`HarnessConfig`].

/// Harness configuration.
pub mod config;

/// Differential comparison against an oracle.
pub mod differential;

/// Harness errors.
pub mod error;

/// Seeded invariant fuzzing.
pub mod fuzz;

/// JSON golden files.
pub mod golden;

/// Delta minimization.
pub mod minimize;

/// PNG baselines.
pub mod pixel;

pub use config::{HarnessConfig, SeverityBounds};
pub use differential::{
    Classification, CommandOracle, DifferentialReport, DifferentialRunner, MISMATCH_LOG_HEADER,
    MismatchLog, Oracle, Severity, overlap_count,
};
pub use error::HarnessError;
pub use fuzz::{FuzzCase, FuzzFailure, FuzzReport, Generator, check_html, run_fuzz};
pub use golden::{GoldenOutcome, GoldenStore};
pub use minimize::minimize;
pub use pixel::{MismatchKind, PixelDiff, PixelOutcome, PixelStore, compare_images};
