//! CSS tokenizer module.
//!
//! [CSS Syntax Level 3 § 4 Tokenization](https://www.w3.org/TR/css-syntax-3/#tokenization)

/// Token types.
pub mod token;
/// Tokenizer state machine.
pub mod tokenizer;

pub use token::{CSSToken, HashType};
pub use tokenizer::CSSTokenizer;
