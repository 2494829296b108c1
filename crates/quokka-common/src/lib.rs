//! Common utilities for the Quokka layout engine.
//!
//! This crate provides shared infrastructure used by all engine components:
//! - **Warning System** - de-duplicated `log` warnings for unsupported features

pub mod warning;
