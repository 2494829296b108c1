//! Replaced elements.
//!
//! [§ 10.3.2 Inline, replaced elements](https://www.w3.org/TR/CSS2/visudet.html#inline-replaced-width)

use std::collections::BTreeMap;

use crate::style::ComputedStyle;

/// Supplies intrinsic image sizes to layout. Implementations must not
/// fetch over the network.
pub trait ImageResolver: Send + Sync {
    /// Intrinsic `(width, height)` in px, or `None` when the image is
    /// unknown.
    fn intrinsic_size(&self, src: &str) -> Option<(f32, f32)>;
}

/// A resolver that knows no images.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoImages;

impl ImageResolver for NoImages {
    fn intrinsic_size(&self, _src: &str) -> Option<(f32, f32)> {
        None
    }
}

/// A fixed table of image sizes, for tests and tools.
#[derive(Debug, Clone, Default)]
pub struct StaticImages {
    sizes: BTreeMap<String, (f32, f32)>,
}

impl StaticImages {
    /// Register an image.
    #[must_use]
    pub fn with(mut self, src: &str, width: f32, height: f32) -> Self {
        let _ = self.sizes.insert(src.to_string(), (width, height));
        self
    }
}

impl ImageResolver for StaticImages {
    fn intrinsic_size(&self, src: &str) -> Option<(f32, f32)> {
        self.sizes.get(src).copied()
    }
}

/// The size an `<img>` would have with no CSS sizing: the image's own
/// size, overridden per axis by the `width`/`height` attributes, with the
/// missing axis following the aspect ratio.
#[must_use]
pub fn presentational_size(
    intrinsic: Option<(f32, f32)>,
    attr_width: Option<f32>,
    attr_height: Option<f32>,
) -> (f32, f32) {
    match (intrinsic, attr_width, attr_height) {
        (_, Some(w), Some(h)) => (w, h),
        (Some((iw, ih)), Some(w), None) if iw > 0.0 => (w, w * ih / iw),
        (Some((iw, ih)), None, Some(h)) if ih > 0.0 => (h * iw / ih, h),
        (Some(size), None, None) => size,
        (_, w, h) => (w.unwrap_or(0.0), h.unwrap_or(0.0)),
    }
}

/// [§ 10.3.2](https://www.w3.org/TR/CSS2/visudet.html#inline-replaced-width)
/// and [§ 10.6.2](https://www.w3.org/TR/CSS2/visudet.html#inline-replaced-height)
///
/// Used content size from CSS `width`/`height` and the natural size. A
/// single specified dimension scales the other one proportionally.
#[must_use]
pub fn used_replaced_size(
    style: &ComputedStyle,
    natural: (f32, f32),
    cb_width: f32,
    cb_height: Option<f32>,
) -> (f32, f32) {
    let (nw, nh) = natural;
    let width = style.width.resolve(cb_width);
    let height = style.height.resolve_definite(cb_height);
    let (w, h) = match (width, height) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) if nw > 0.0 => (w, w * nh / nw),
        (Some(w), None) => (w, nh),
        (None, Some(h)) if nh > 0.0 => (h * nw / nh, h),
        (None, Some(h)) => (nw, h),
        (None, None) => (nw, nh),
    };
    let min_w = style.min_width.resolve(cb_width).unwrap_or(0.0);
    let max_w = style.max_width.resolve(cb_width).unwrap_or(f32::INFINITY);
    let min_h = style.min_height.resolve_definite(cb_height).unwrap_or(0.0);
    let max_h = style.max_height.resolve_definite(cb_height).unwrap_or(f32::INFINITY);
    (w.min(max_w).max(min_w).max(0.0), h.min(max_h).max(min_h).max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::LengthPercentageAuto;

    #[test]
    fn test_attributes_override_intrinsic() {
        assert_eq!(presentational_size(Some((100.0, 50.0)), Some(40.0), None), (40.0, 20.0));
        assert_eq!(presentational_size(Some((100.0, 50.0)), None, None), (100.0, 50.0));
        assert_eq!(presentational_size(None, Some(10.0), None), (10.0, 0.0));
        assert_eq!(presentational_size(None, Some(10.0), Some(30.0)), (10.0, 30.0));
    }

    #[test]
    fn test_css_width_scales_height() {
        let mut style = ComputedStyle::initial();
        style.width = LengthPercentageAuto::Percent(50.0);
        assert_eq!(used_replaced_size(&style, (100.0, 40.0), 400.0, None), (200.0, 80.0));
        style.max_width = LengthPercentageAuto::Px(150.0);
        assert_eq!(used_replaced_size(&style, (100.0, 40.0), 400.0, None).0, 150.0);
    }

    #[test]
    fn test_static_images() {
        let images = StaticImages::default().with("a.png", 3.0, 4.0);
        assert_eq!(images.intrinsic_size("a.png"), Some((3.0, 4.0)));
        assert_eq!(NoImages.intrinsic_size("a.png"), None);
    }
}
