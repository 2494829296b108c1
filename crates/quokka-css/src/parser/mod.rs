//! CSS parser module.
//!
//! [CSS Syntax Level 3 § 5 Parsing](https://www.w3.org/TR/css-syntax-3/#parsing)

/// Rule and declaration parser.
pub mod css_parser;

pub use css_parser::{
    CSSParser, ComponentValue, Declaration, MediaRule, Rule, StyleRule, Stylesheet,
    parse_inline_style, parse_stylesheet,
};
