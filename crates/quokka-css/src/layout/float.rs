//! CSS Float Layout.
//!
//! [§ 9.5 Floats](https://www.w3.org/TR/CSS2/visuren.html#floats)
//!
//! "A float is a box that is shifted to the left or right on the current line.
//! The most interesting characteristic of a float is that content may flow along
//! its side (or be prohibited from doing so by the 'clear' property)."
//!
//! Every block formatting context owns one [`FloatContext`]. Coordinates are
//! absolute, so nested block boxes share their BFC's context directly.

use super::box_model::Rect;
use crate::style::{Clear, Float};

/// A single float that has been placed in the flow.
#[derive(Debug, Clone, Copy)]
pub struct PlacedFloat {
    /// Which side this float is on.
    pub side: Float,
    /// The margin box of the float.
    pub margin_box: Rect,
}

/// Tracks placed floats within a block formatting context.
///
/// "Since a float is not in the flow, non-positioned block boxes created
/// before and after the float box flow vertically as if the float did not
/// exist. However, the current and subsequent line boxes created next to
/// the float are shortened as necessary to make room for the margin box
/// of the float."
#[derive(Debug, Clone)]
pub struct FloatContext {
    floats: Vec<PlacedFloat>,
    /// Left content edge of the BFC root.
    left_edge: f32,
    /// Right content edge of the BFC root.
    right_edge: f32,
}

impl FloatContext {
    /// A context for a BFC root whose content box spans `left..right`.
    #[must_use]
    pub const fn new(left_edge: f32, right_edge: f32) -> Self {
        Self {
            floats: Vec::new(),
            left_edge,
            right_edge,
        }
    }

    /// Returns true if no float has been placed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.floats.is_empty()
    }

    /// Placed floats in placement order.
    #[must_use]
    pub fn floats(&self) -> &[PlacedFloat] {
        &self.floats
    }

    /// [§ 10.6.7](https://www.w3.org/TR/CSS2/visudet.html#root-height)
    ///
    /// "If the element has any floating descendants whose bottom margin edge
    /// is below the element's bottom content edge, then the height is
    /// increased to include those edges."
    #[must_use]
    pub fn max_float_bottom(&self) -> Option<f32> {
        self.floats
            .iter()
            .map(|f| f.margin_box.bottom())
            .reduce(f32::max)
    }

    /// [§ 9.5.1 Positioning the float](https://www.w3.org/TR/CSS2/visuren.html#float-position)
    ///
    /// Place a float's margin box no higher than `y` and no higher than any
    /// earlier float, as high as possible where it fits beside the floats
    /// already placed, and as far toward its side as possible. A float wider
    /// than the BFC is placed where no other float is in the way.
    pub fn place_float(&mut self, side: Float, width: f32, height: f32, y: f32) -> Rect {
        let (left, right) = (self.left_edge, self.right_edge);
        self.place_float_in(side, width, height, y, left, right)
    }

    /// [`Self::place_float`] for a float whose containing block spans
    /// `cb_left..cb_right` inside the BFC.
    pub fn place_float_in(
        &mut self,
        side: Float,
        width: f32,
        height: f32,
        y: f32,
        cb_left: f32,
        cb_right: f32,
    ) -> Rect {
        // Rule 5: "The outer top of a floating box may not be higher than
        // the outer top of any block or floated box generated by an element
        // earlier in the source document."
        let mut y = self
            .floats
            .iter()
            .map(|f| f.margin_box.y)
            .fold(y, f32::max);
        let rect = loop {
            let (left, available) =
                self.available_within(y, height.max(f32::EPSILON), cb_left, cb_right);
            let fits = available >= width;
            let nothing_in_the_way = available >= cb_right - cb_left;
            if fits || nothing_in_the_way {
                let x = if side == Float::Right {
                    left + available - width
                } else {
                    left
                };
                break Rect::new(x, y, width, height);
            }
            match self.next_float_bottom_after(y) {
                Some(next) => y = next,
                None => break Rect::new(left, y, width, height),
            }
        };
        self.floats.push(PlacedFloat {
            side,
            margin_box: rect,
        });
        rect
    }

    /// [§ 9.5.2 Controlling flow next to floats: the 'clear' property](https://www.w3.org/TR/CSS2/visuren.html#flow-control)
    ///
    /// The lowest Y at or below `y` that clears the relevant floats.
    #[must_use]
    pub fn clear(&self, clear: Clear, y: f32) -> f32 {
        self.floats
            .iter()
            .filter(|f| match clear {
                Clear::None => false,
                Clear::Left => f.side == Float::Left,
                Clear::Right => f.side == Float::Right,
                Clear::Both => true,
            })
            .map(|f| f.margin_box.bottom())
            .fold(y, f32::max)
    }

    /// "The current and subsequent line boxes created next to the float are
    /// shortened as necessary to make room for the margin box of the float."
    ///
    /// Returns `(left_x, available_width)` for the band `[y, y + height)`.
    #[must_use]
    pub fn available_at(&self, y: f32, height: f32) -> (f32, f32) {
        let band_bottom = y + height;
        let active = |f: &&PlacedFloat| f.margin_box.y < band_bottom && f.margin_box.bottom() > y;
        let left = self
            .floats
            .iter()
            .filter(|f| f.side == Float::Left)
            .filter(active)
            .map(|f| f.margin_box.right())
            .fold(self.left_edge, f32::max);
        let right = self
            .floats
            .iter()
            .filter(|f| f.side == Float::Right)
            .filter(active)
            .map(|f| f.margin_box.x)
            .fold(self.right_edge, f32::min);
        (left, (right - left).max(0.0))
    }

    /// Like [`Self::available_at`] but limited to a narrower container
    /// spanning `container_left..container_right`.
    #[must_use]
    pub fn available_within(
        &self,
        y: f32,
        height: f32,
        container_left: f32,
        container_right: f32,
    ) -> (f32, f32) {
        let (left, width) = self.available_at(y, height);
        let l = left.max(container_left);
        let r = (left + width).min(container_right);
        (l, (r - l).max(0.0))
    }

    /// Smallest float bottom strictly below `y`.
    #[must_use]
    pub fn next_float_bottom_after(&self, y: f32) -> Option<f32> {
        self.floats
            .iter()
            .map(|f| f.margin_box.bottom())
            .filter(|&b| b > y)
            .reduce(f32::min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floats_stack_horizontally_then_wrap() {
        let mut ctx = FloatContext::new(0.0, 300.0);
        let a = ctx.place_float(Float::Left, 100.0, 50.0, 0.0);
        let b = ctx.place_float(Float::Left, 100.0, 30.0, 0.0);
        assert_eq!((a.x, b.x), (0.0, 100.0));
        let c = ctx.place_float(Float::Left, 150.0, 10.0, 0.0);
        assert_eq!((c.x, c.y), (100.0, 30.0), "moves below the shorter float");
    }

    #[test]
    fn test_right_float_and_line_narrowing() {
        let mut ctx = FloatContext::new(10.0, 310.0);
        let r = ctx.place_float(Float::Right, 100.0, 40.0, 0.0);
        assert_eq!(r.x, 210.0);
        assert_eq!(ctx.available_at(0.0, 20.0), (10.0, 200.0));
        assert_eq!(ctx.available_at(40.0, 20.0), (10.0, 300.0));
    }

    #[test]
    fn test_clear_sides() {
        let mut ctx = FloatContext::new(0.0, 300.0);
        let _ = ctx.place_float(Float::Left, 50.0, 80.0, 0.0);
        let _ = ctx.place_float(Float::Right, 50.0, 120.0, 0.0);
        assert_eq!(ctx.clear(Clear::Left, 10.0), 80.0);
        assert_eq!(ctx.clear(Clear::Right, 10.0), 120.0);
        assert_eq!(ctx.clear(Clear::Both, 200.0), 200.0);
        assert_eq!(ctx.clear(Clear::None, 10.0), 10.0);
        assert_eq!(ctx.max_float_bottom(), Some(120.0));
    }

    #[test]
    fn test_float_not_higher_than_earlier_float() {
        let mut ctx = FloatContext::new(0.0, 300.0);
        let _ = ctx.place_float(Float::Left, 10.0, 10.0, 50.0);
        let later = ctx.place_float(Float::Right, 10.0, 10.0, 0.0);
        assert_eq!(later.y, 50.0);
    }

    #[test]
    fn test_too_wide_float_placed_below_others() {
        let mut ctx = FloatContext::new(0.0, 100.0);
        let _ = ctx.place_float(Float::Left, 60.0, 20.0, 0.0);
        let wide = ctx.place_float(Float::Left, 500.0, 20.0, 0.0);
        assert_eq!((wide.x, wide.y), (0.0, 20.0));
    }
}
