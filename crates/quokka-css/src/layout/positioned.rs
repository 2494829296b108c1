//! Relative and absolute positioning.
//!
//! [§ 9.3.1 Choosing a positioning scheme](https://www.w3.org/TR/CSS2/visuren.html#choose-position)

use super::box_model::Rect;
use crate::style::ComputedStyle;

/// [§ 9.4.3 Relative positioning](https://www.w3.org/TR/CSS2/visuren.html#relative-positioning)
///
/// "If both 'left' and 'right' are 'auto' (their initial values), the used
/// values are '0'. If neither 'left' nor 'right' is 'auto', the position is
/// over-constrained, and one of them has to be ignored."
///
/// `left` wins over `right` and `top` over `bottom`.
#[must_use]
pub fn relative_offset(style: &ComputedStyle, cb_width: f32, cb_height: Option<f32>) -> (f32, f32) {
    let inset = &style.inset;
    let dx = inset
        .left
        .resolve(cb_width)
        .or_else(|| inset.right.resolve(cb_width).map(|r| -r))
        .unwrap_or(0.0);
    let dy = inset
        .top
        .resolve_definite(cb_height)
        .or_else(|| inset.bottom.resolve_definite(cb_height).map(|b| -b))
        .unwrap_or(0.0);
    (dx, dy)
}

/// Used horizontal geometry of an absolutely positioned box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AbsoluteWidth {
    /// Content width.
    pub width: f32,
    /// Used left margin.
    pub margin_left: f32,
    /// Used right margin.
    pub margin_right: f32,
}

/// [§ 10.3.7 Absolutely positioned, non-replaced elements](https://www.w3.org/TR/CSS2/visudet.html#abs-non-replaced-width)
///
/// `edges` is the horizontal padding plus border, `shrink` the content's
/// (min, max) widths, `replaced` a replaced element's used width.
#[must_use]
pub fn absolute_width(
    style: &ComputedStyle,
    cb: Rect,
    edges: f32,
    shrink: (f32, f32),
    replaced: Option<f32>,
) -> AbsoluteWidth {
    let left = style.inset.left.resolve(cb.width);
    let right = style.inset.right.resolve(cb.width);
    let margin_left = style.margin.left.resolve(cb.width);
    let margin_right = style.margin.right.resolve(cb.width);
    let fixed_margins = margin_left.unwrap_or(0.0) + margin_right.unwrap_or(0.0);

    let width = match replaced.or_else(|| style.width.resolve(cb.width)) {
        Some(width) => width,
        // "If 'left' and 'right' are not 'auto' and 'width' is 'auto', then
        // solve for 'width'."
        None if left.is_some() && right.is_some() => {
            cb.width - left.unwrap_or(0.0) - right.unwrap_or(0.0) - fixed_margins - edges
        }
        // "...then the width is shrink-to-fit."
        None => {
            let available =
                cb.width - left.unwrap_or(0.0) - right.unwrap_or(0.0) - fixed_margins - edges;
            shrink.1.min(available.max(shrink.0))
        }
    };
    let width = if replaced.is_some() {
        width.max(0.0)
    } else {
        let max = style.max_width.resolve(cb.width).unwrap_or(f32::INFINITY);
        let min = style.min_width.resolve(cb.width).unwrap_or(0.0);
        width.min(max).max(min).max(0.0)
    };

    // "If none of the three is 'auto': If both 'margin-left' and
    // 'margin-right' are 'auto', solve the equation under the extra
    // constraint that the two margins get equal values, unless this would
    // make them negative."
    let (margin_left, margin_right) = match (left, right, margin_left, margin_right) {
        (Some(l), Some(r), None, None) => {
            let rest = cb.width - l - r - width - edges;
            if rest >= 0.0 {
                (rest / 2.0, rest / 2.0)
            } else {
                (0.0, rest)
            }
        }
        (Some(l), Some(r), None, Some(mr)) => (cb.width - l - r - width - edges - mr, mr),
        (Some(l), Some(r), Some(ml), None) => (ml, cb.width - l - r - width - edges - ml),
        (_, _, ml, mr) => (ml.unwrap_or(0.0), mr.unwrap_or(0.0)),
    };
    AbsoluteWidth {
        width,
        margin_left,
        margin_right,
    }
}

/// [§ 10.6.4 Absolutely positioned, non-replaced elements](https://www.w3.org/TR/CSS2/visudet.html#abs-non-replaced-height)
///
/// The definite content height, if `height` or both `top` and `bottom` fix
/// it. `edges` is the vertical padding, border and margins.
#[must_use]
pub fn absolute_height(style: &ComputedStyle, cb: Rect, edges: f32) -> Option<f32> {
    if let Some(height) = style.height.resolve_definite(Some(cb.height)) {
        return Some(height);
    }
    let top = style.inset.top.resolve_definite(Some(cb.height))?;
    let bottom = style.inset.bottom.resolve_definite(Some(cb.height))?;
    Some((cb.height - top - bottom - edges).max(0.0))
}

/// Final top-left corner of an absolutely positioned box's margin box.
///
/// Offsets are measured from the containing block's padding edges; with
/// both offsets on an axis `auto` the box stays at its static position.
#[must_use]
pub fn absolute_position(
    style: &ComputedStyle,
    cb: Rect,
    static_position: (f32, f32),
    margin_box: (f32, f32),
) -> (f32, f32) {
    let inset = &style.inset;
    let x = inset
        .left
        .resolve(cb.width)
        .map(|l| cb.x + l)
        .or_else(|| inset.right.resolve(cb.width).map(|r| cb.right() - r - margin_box.0))
        .unwrap_or(static_position.0);
    let y = inset
        .top
        .resolve_definite(Some(cb.height))
        .map(|t| cb.y + t)
        .or_else(|| {
            inset
                .bottom
                .resolve_definite(Some(cb.height))
                .map(|b| cb.bottom() - b - margin_box.1)
        })
        .unwrap_or(static_position.1);
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::LengthPercentageAuto::{Percent, Px};

    fn cb() -> Rect {
        Rect::new(10.0, 20.0, 400.0, 300.0)
    }

    #[test]
    fn test_relative_left_wins_over_right() {
        let mut style = ComputedStyle::initial();
        style.inset.left = Px(5.0);
        style.inset.right = Px(50.0);
        style.inset.bottom = Percent(10.0);
        assert_eq!(relative_offset(&style, 200.0, Some(100.0)), (5.0, -10.0));
        assert_eq!(relative_offset(&style, 200.0, None), (5.0, 0.0));
    }

    #[test]
    fn test_left_and_right_solve_width() {
        let mut style = ComputedStyle::initial();
        style.inset.left = Px(10.0);
        style.inset.right = Px(30.0);
        let used = absolute_width(&style, cb(), 4.0, (0.0, 1000.0), None);
        assert_eq!(used.width, 356.0);
    }

    #[test]
    fn test_shrink_to_fit_without_offsets() {
        let style = ComputedStyle::initial();
        let used = absolute_width(&style, cb(), 0.0, (40.0, 120.0), None);
        assert_eq!(used.width, 120.0);
        let used = absolute_width(&style, cb(), 0.0, (40.0, 900.0), None);
        assert_eq!(used.width, 400.0);
    }

    #[test]
    fn test_auto_margins_center() {
        let mut style = ComputedStyle::initial();
        style.inset.left = Px(0.0);
        style.inset.right = Px(0.0);
        style.width = Px(100.0);
        style.margin.left = crate::style::LengthPercentageAuto::Auto;
        style.margin.right = crate::style::LengthPercentageAuto::Auto;
        let used = absolute_width(&style, cb(), 0.0, (0.0, 0.0), None);
        assert_eq!((used.margin_left, used.margin_right), (150.0, 150.0));
    }

    #[test]
    fn test_position_from_bottom_right() {
        let mut style = ComputedStyle::initial();
        style.inset.right = Px(10.0);
        style.inset.bottom = Px(5.0);
        let (x, y) = absolute_position(&style, cb(), (0.0, 0.0), (50.0, 40.0));
        assert_eq!((x, y), (350.0, 275.0));
        assert_eq!(absolute_height(&style, cb(), 0.0), None);
        style.inset.top = Px(0.0);
        assert_eq!(absolute_height(&style, cb(), 10.0), Some(285.0));
    }

    #[test]
    fn test_static_position_when_offsets_auto() {
        let style = ComputedStyle::initial();
        assert_eq!(absolute_position(&style, cb(), (7.0, 9.0), (1.0, 1.0)), (7.0, 9.0));
    }
}
