//! CSS Box Model types.
//!
//! [CSS Box Model Module Level 3](https://www.w3.org/TR/css-box-3/)

use serde::Serialize;

use crate::style::{ComputedStyle, Edges, LengthPercentageAuto};

/// A rectangle positioned in 2D space, in absolute px.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Rect {
    /// Horizontal position of the top-left corner.
    pub x: f32,
    /// Vertical position of the top-left corner.
    pub y: f32,
    /// Width of the rectangle.
    pub width: f32,
    /// Height of the rectangle.
    pub height: f32,
}

impl Rect {
    /// Construct from position and size.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Grow outward by `edges`.
    #[must_use]
    pub fn expand(&self, edges: &EdgeSizes) -> Self {
        Self {
            x: self.x - edges.left,
            y: self.y - edges.top,
            width: self.width + edges.horizontal(),
            height: self.height + edges.vertical(),
        }
    }

    /// Shrink inward by `edges`, never below zero size.
    #[must_use]
    pub fn shrink(&self, edges: &EdgeSizes) -> Self {
        Self {
            x: self.x + edges.left,
            y: self.y + edges.top,
            width: (self.width - edges.horizontal()).max(0.0),
            height: (self.height - edges.vertical()).max(0.0),
        }
    }

    /// True when the two rectangles share interior area.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// Edge sizes for padding, border, or margin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EdgeSizes {
    /// Top edge size.
    pub top: f32,
    /// Right edge size.
    pub right: f32,
    /// Bottom edge size.
    pub bottom: f32,
    /// Left edge size.
    pub left: f32,
}

impl EdgeSizes {
    /// Left plus right.
    #[must_use]
    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    /// Top plus bottom.
    #[must_use]
    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }
}

impl From<Edges<f32>> for EdgeSizes {
    fn from(e: Edges<f32>) -> Self {
        Self {
            top: e.top,
            right: e.right,
            bottom: e.bottom,
            left: e.left,
        }
    }
}

/// Resolve `auto`-free edges (padding) against the containing block width.
///
/// [§ 8.4 Padding properties](https://www.w3.org/TR/CSS2/box.html#padding-properties)
///
/// "The percentage is calculated with respect to the width of the generated
/// box's containing block, even for 'padding-top' and 'padding-bottom'."
#[must_use]
pub fn resolve_edges(edges: &Edges<LengthPercentageAuto>, cb_width: f32) -> EdgeSizes {
    let r = |v: LengthPercentageAuto| v.resolve(cb_width).unwrap_or(0.0).max(0.0);
    EdgeSizes {
        top: r(edges.top),
        right: r(edges.right),
        bottom: r(edges.bottom),
        left: r(edges.left),
    }
}

/// Resolve margins, treating `auto` as zero. Margins may be negative.
#[must_use]
pub fn resolve_margins(style: &ComputedStyle, cb_width: f32) -> EdgeSizes {
    let r = |v: LengthPercentageAuto| v.resolve(cb_width).unwrap_or(0.0);
    EdgeSizes {
        top: r(style.margin.top),
        right: r(style.margin.right),
        bottom: r(style.margin.bottom),
        left: r(style.margin.left),
    }
}

/// Used border widths.
#[must_use]
pub fn border_widths(style: &ComputedStyle) -> EdgeSizes {
    style.border_width.into()
}

/// [§ 8.3.1 Collapsing margins](https://www.w3.org/TR/CSS2/box.html#collapsing-margins)
///
/// "When two or more margins collapse, the resulting margin width is the
/// maximum of the collapsing margins' widths. In the case of negative
/// margins, the maximum of the absolute values of the negative adjoining
/// margins is deducted from the maximum of the positive adjoining margins."
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CollapsedMargin {
    positive: f32,
    negative: f32,
}

impl CollapsedMargin {
    /// A set holding one margin.
    #[must_use]
    pub fn new(margin: f32) -> Self {
        if margin >= 0.0 {
            Self {
                positive: margin,
                negative: 0.0,
            }
        } else {
            Self {
                positive: 0.0,
                negative: margin,
            }
        }
    }

    /// Add an adjoining margin.
    #[must_use]
    pub fn adjoin(self, margin: f32) -> Self {
        self.union(Self::new(margin))
    }

    /// Merge two sets of adjoining margins.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            positive: self.positive.max(other.positive),
            negative: self.negative.min(other.negative),
        }
    }

    /// The collapsed margin width.
    #[must_use]
    pub fn resolve(self) -> f32 {
        self.positive + self.negative
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapsed_margin_rules() {
        assert_eq!(CollapsedMargin::new(10.0).adjoin(20.0).resolve(), 20.0);
        assert_eq!(CollapsedMargin::new(20.0).adjoin(-5.0).resolve(), 15.0);
        assert_eq!(CollapsedMargin::new(-4.0).adjoin(-9.0).resolve(), -9.0);
        assert_eq!(CollapsedMargin::default().resolve(), 0.0);
    }

    #[test]
    fn test_rect_expand_and_shrink() {
        let edges = EdgeSizes {
            top: 1.0,
            right: 2.0,
            bottom: 3.0,
            left: 4.0,
        };
        let r = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert_eq!(r.expand(&edges), Rect::new(6.0, 9.0, 26.0, 24.0));
        assert_eq!(r.expand(&edges).shrink(&edges), r);
        assert_eq!(Rect::new(0.0, 0.0, 1.0, 1.0).shrink(&edges).width, 0.0);
    }

    #[test]
    fn test_percentage_padding_uses_width() {
        let mut style = ComputedStyle::initial();
        style.padding.top = LengthPercentageAuto::Percent(10.0);
        let p = resolve_edges(&style.padding, 400.0);
        assert_eq!(p.top, 40.0);
    }
}
