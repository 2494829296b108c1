//! CSS Painting
//!
//! [CSS 2.1 Appendix E - Elaborate description of Stacking Contexts](https://www.w3.org/TR/CSS2/zindex.html)
//!
//! Painting converts a fragment tree into a display list of drawing
//! commands. The display list can then be executed by any backend.
//!
//! ```text
//! Style → Layout → Paint → Raster
//!                    ↓
//!              DisplayList
//! ```

mod display_list;
mod painter;

pub use display_list::{DisplayItem, DisplayList};
pub use painter::Painter;

use crate::layout::FragmentTree;

/// Paint a fragment tree.
#[must_use]
pub fn paint(tree: &FragmentTree) -> DisplayList {
    Painter::new(tree).paint()
}
