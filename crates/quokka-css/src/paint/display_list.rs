//! Display List - a sequence of drawing commands
//!
//! [CSS 2.1 Appendix E](https://www.w3.org/TR/CSS2/zindex.html)
//!
//! The display list is the output of the painting phase. Every item carries
//! absolute geometry and resolved colors, so a backend never consults style.

use serde::Serialize;

use crate::layout::{EdgeSizes, Rect, ResolvedFont};
use crate::style::{BorderStyle, Edges};
use crate::values::Color;

/// A single drawing command.
///
/// [CSS 2.1 Appendix E.2 Painting order](https://www.w3.org/TR/CSS2/zindex.html#painting-order)
///
/// Items are added to the display list in painting order (back to front).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum DisplayItem {
    /// Fill a rectangle with a solid color.
    ///
    /// Used for backgrounds and text decorations.
    FillRect {
        /// Area to fill.
        rect: Rect,
        /// Fill color.
        color: Color,
    },

    /// [§ 8.5 Border properties](https://www.w3.org/TR/CSS2/box.html#border-properties)
    ///
    /// Draw the border of a box. `rect` is the border box; each side is drawn
    /// inward with its own width, style and color.
    DrawBorder {
        /// Border box.
        rect: Rect,
        /// Border widths.
        widths: EdgeSizes,
        /// Border colors.
        colors: Edges<Color>,
        /// Border styles.
        styles: Edges<BorderStyle>,
    },

    /// Draw text.
    ///
    /// [CSS 2.1 Appendix E.2](https://www.w3.org/TR/CSS2/zindex.html#painting-order)
    /// "the element's text"
    DrawText {
        /// Left edge of the first glyph.
        x: f32,
        /// Baseline.
        y: f32,
        /// Text to draw.
        text: String,
        /// Resolved face and size.
        font: ResolvedFont,
        /// Text color.
        color: Color,
    },

    /// Draw an image (replaced content or a list marker image).
    ///
    /// The `src` string is the lookup key for the backend's image store.
    DrawImage {
        /// Destination rectangle.
        rect: Rect,
        /// Image source.
        src: String,
    },

    /// Push a clip rectangle onto the clip stack.
    ///
    /// [§ 11.1.1 overflow](https://www.w3.org/TR/CSS2/visufx.html#overflow)
    ///
    /// All subsequent items are clipped to the intersection of all active
    /// clip rectangles.
    Clip {
        /// Clip rectangle.
        rect: Rect,
    },

    /// Pop the most recent clip rectangle.
    Restore,
}

/// A list of drawing commands in painting order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DisplayList {
    items: Vec<DisplayItem>,
}

impl DisplayList {
    /// Create an empty display list.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Add an item to the display list.
    pub fn push(&mut self, item: DisplayItem) {
        self.items.push(item);
    }

    /// Items in painting order.
    #[must_use]
    pub fn items(&self) -> &[DisplayItem] {
        &self.items
    }

    /// Number of items.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the display list is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<DisplayItem> for DisplayList {
    fn from_iter<I: IntoIterator<Item = DisplayItem>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}
