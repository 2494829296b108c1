//! HTML tokenizer and tree builder for the Quokka layout engine.
//!
//! # Scope
//!
//! - **HTML Tokenizer** ([WHATWG § 13.2.5](https://html.spec.whatwg.org/multipage/parsing.html#tokenization))
//!   - Data, RAWTEXT, tag, attribute, comment and DOCTYPE states
//!   - Decimal, hexadecimal and common named character references
//!
//! - **Tree Builder** ([WHATWG § 13.2.6](https://html.spec.whatwg.org/multipage/parsing.html#tree-construction))
//!   - Implied `html`, `head` and `body` elements
//!   - Void elements and implied end tags for `p`, `li`, `dt`, `dd`, `option`
//!   - Unmatched end tags are ignored
//!
//! The builder never fails: any byte sequence produces a document with a
//! document element and a body.
//!
//! # Not Implemented
//!
//! - Table insertion modes and foster parenting
//! - Adoption agency algorithm
//! - Foreign content (SVG, `MathML`)

/// HTML tree construction.
pub mod parser;
/// HTML tokenizer for converting input into tokens.
pub mod tokenizer;

pub use parser::{HTMLParser, InsertionMode, ParseIssue, format_tree};
pub use tokenizer::{Attribute, HTMLTokenizer, Token};

use quokka_dom::DomTree;

/// Tokenize and build a document in one call.
#[must_use]
pub fn parse_document(html: &str) -> DomTree {
    let mut tokenizer = HTMLTokenizer::new(html.to_string());
    tokenizer.run();
    HTMLParser::new(tokenizer.into_tokens()).run()
}
