//! HTML tokenizer module.
//!
//! Implements a reduced form of
//! [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization).

/// Character reference decoding.
pub mod character_reference;
/// HTML tokenizer state machine implementation.
pub mod core;
/// Token types produced by the tokenizer.
pub mod token;

pub use core::{HTMLTokenizer, TokenizerState};
pub use token::{Attribute, Token};
