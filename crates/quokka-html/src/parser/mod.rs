//! HTML tree construction.

/// Simplified tree builder.
pub mod tree_builder;

pub use tree_builder::{HTMLParser, InsertionMode, ParseIssue, format_tree};
