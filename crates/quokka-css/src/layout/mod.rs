//! CSS Layout Engine
//!
//! This module implements the CSS 2.1 visual formatting model, turning a
//! styled DOM into an immutable [`FragmentTree`].
//!
//! # Relevant Specifications
//!
//! - [CSS 2.1 Visual Formatting Model](https://www.w3.org/TR/CSS2/visuren.html)
//! - [CSS 2.1 Visual Formatting Model Details](https://www.w3.org/TR/CSS2/visudet.html)
//! - [CSS 2.1 Box Model](https://www.w3.org/TR/CSS2/box.html)
//! - [CSS 2.1 Fonts](https://www.w3.org/TR/CSS2/fonts.html)
//!
//! # Module Structure
//!
//! - [`box_model`] - Rectangles, edge sizes and margin collapsing
//! - [`box_tree`] - Box generation from the styled DOM
//! - [`float`] - Float placement and clearance
//! - [`font`] - Font metrics and matching
//! - [`fragment`] - The output arena
//! - [`positioned`] - Relative and absolute positioning
//! - [`replaced`] - Replaced element sizing
//!
//! Block and inline formatting run on explicit work stacks, so deeply nested
//! documents never exhaust the call stack.

pub mod box_model;
pub mod box_tree;
pub mod float;
pub mod font;
pub mod fragment;
pub mod positioned;
pub mod replaced;

mod block;
pub(crate) mod inline;
mod intrinsic;

pub use box_model::{CollapsedMargin, EdgeSizes, Rect};
pub use box_tree::{BoxId, BoxTree, BoxType, LayoutBox, build_box_tree};
pub use float::FloatContext;
pub use font::{ApproximateFontMetrics, FaceId, FontDatabase, FontFace, FontMetrics};
pub use fragment::{
    BoxKind, Fragment, FragmentId, FragmentTree, InlineContent, InlineFragment, LineFragment,
    PaintStyle, ResolvedFont, TextRun,
};
pub use replaced::{ImageResolver, NoImages, StaticImages};

use log::debug;
use quokka_dom::DomTree;

use crate::cascade::StyleMap;

/// Inputs to one layout pass besides the document.
#[derive(Clone, Copy)]
pub struct LayoutOptions<'a> {
    /// Initial containing block width in px.
    pub viewport_width: f32,
    /// Initial containing block height in px.
    pub viewport_height: f32,
    /// Faces available to text layout.
    pub fonts: &'a FontDatabase,
    /// Natural sizes of `<img>` sources.
    pub images: &'a dyn ImageResolver,
}

/// Lay out a styled document.
///
/// [§ 9.1.1 The viewport](https://www.w3.org/TR/CSS2/visuren.html#viewport)
///
/// Never fails: malformed documents still produce a well-formed tree.
#[must_use]
pub fn layout_document(tree: &DomTree, styles: &StyleMap, options: &LayoutOptions<'_>) -> FragmentTree {
    let boxes = build_box_tree(tree, styles, options.images);
    debug!("generated {} layout boxes", boxes.len());
    layout_box_tree(
        &boxes,
        options.fonts,
        options.viewport_width,
        options.viewport_height,
    )
}

/// Lay out an already generated box tree.
#[must_use]
pub fn layout_box_tree(boxes: &BoxTree, fonts: &FontDatabase, viewport_width: f32, viewport_height: f32) -> FragmentTree {
    let fragments = block::Engine::new(boxes, fonts, viewport_width, viewport_height).run();
    debug!("layout produced {} fragments", fragments.len());
    fragments
}
