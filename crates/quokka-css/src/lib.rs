//! CSS tokenizer, parser, selector matching, cascade, generated content,
//! layout, paint and invariant checking for the Quokka engine.
//!
//! # Scope
//!
//! This crate implements:
//! - **CSS Tokenizer and Parser** ([CSS Syntax 3](https://www.w3.org/TR/css-syntax-3/))
//!   - Stylesheets, rules, declarations, `!important`
//!   - `@media` blocks for `all` and `screen`; other at-rules skipped
//!
//! - **CSS Values** ([CSS 2.1 § 4.3](https://www.w3.org/TR/CSS2/syndata.html#values))
//!   - Lengths in every CSS 2.1 unit, percentages, colors
//!
//! - **CSS Selectors** ([CSS 2.1 § 5](https://www.w3.org/TR/CSS2/selector.html), [Selectors 3](https://www.w3.org/TR/selectors-3/))
//!   - Type, class, id, attribute and pseudo-class selectors
//!   - All four combinators, pseudo-elements, specificity
//!
//! - **Cascade** ([CSS 2.1 § 6](https://www.w3.org/TR/CSS2/cascade.html))
//!   - User-agent, author and inline origins, `!important`, inheritance
//!
//! - **Generated Content** ([CSS 2.1 § 12](https://www.w3.org/TR/CSS2/generate.html))
//!   - `::before`/`::after`, counters, quotes, list markers
//!
//! - **Layout** ([CSS 2.1 § 9](https://www.w3.org/TR/CSS2/visuren.html), [§ 10](https://www.w3.org/TR/CSS2/visudet.html))
//!   - Block and inline formatting, margin collapsing, floats, positioning,
//!     replaced elements, line breaking and font matching
//!
//! - **Paint** ([CSS 2.1 Appendix E](https://www.w3.org/TR/CSS2/zindex.html))
//!   - A backend-agnostic display list
//!
//! - **Invariant Checkers** for fragment trees and display lists
//!
//! # Not Implemented
//!
//! - Flex, grid and table layout (laid out as block containers)
//! - `vertical-align` other than `baseline`
//! - Stacking contexts and `z-index`

/// CSS cascade and style computation per [CSS 2.1 § 6](https://www.w3.org/TR/CSS2/cascade.html).
pub mod cascade;
/// Invariant checkers for fragment trees and display lists.
pub mod check;
/// Generated content, counters and quotes per [CSS 2.1 § 12](https://www.w3.org/TR/CSS2/generate.html).
pub mod generated;
/// Stable JSON output.
pub mod json;
/// Box generation and layout per [CSS 2.1 § 9](https://www.w3.org/TR/CSS2/visuren.html).
pub mod layout;
/// Display list and painting per [CSS 2.1 Appendix E](https://www.w3.org/TR/CSS2/zindex.html).
pub mod paint;
/// CSS parser per [§ 5 Parsing](https://www.w3.org/TR/css-syntax-3/#parsing).
pub mod parser;
/// CSS selector parsing and matching.
pub mod selector;
/// Computed style representation.
pub mod style;
/// CSS tokenizer per [§ 4 Tokenization](https://www.w3.org/TR/css-syntax-3/#tokenization).
pub mod tokenizer;
/// User-agent stylesheet per [WHATWG HTML § 15 Rendering](https://html.spec.whatwg.org/multipage/rendering.html).
pub mod ua_stylesheet;
/// Lengths, colors and value errors.
pub mod values;

// Re-exports for convenience
pub use cascade::{RuleSet, StyleMap, compute_document_styles, compute_styles};
pub use check::{Violation, check_display_list, check_fragment_tree};
pub use json::{display_list_to_json, fragment_tree_to_json};
pub use layout::{
    FontDatabase, Fragment, FragmentId, FragmentTree, ImageResolver, LayoutOptions, NoImages,
    StaticImages, layout_document,
};
pub use paint::{DisplayItem, DisplayList, Painter, paint};
pub use parser::{CSSParser, Stylesheet, parse_stylesheet};
pub use selector::{Specificity, parse_selector};
pub use style::ComputedStyle;
pub use tokenizer::{CSSToken, CSSTokenizer};
pub use values::{CssLength, ValueError, parse_length};

use quokka_dom::DomTree;

/// Style and lay out a parsed document with the built-in fonts and no
/// images.
#[must_use]
pub fn layout_tree(tree: &DomTree, viewport_width: f32, viewport_height: f32) -> FragmentTree {
    let styles = compute_document_styles(tree);
    let fonts = FontDatabase::default();
    let options = LayoutOptions {
        viewport_width,
        viewport_height,
        fonts: &fonts,
        images: &NoImages,
    };
    layout_document(tree, &styles, &options)
}

#[cfg(test)]
pub(crate) fn layout_html(html: &str, viewport_width: f32, viewport_height: f32) -> FragmentTree {
    layout_tree(&quokka_html::parse_document(html), viewport_width, viewport_height)
}
