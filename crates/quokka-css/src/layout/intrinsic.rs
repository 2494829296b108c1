//! Intrinsic widths for shrink-to-fit sizing.
//!
//! [§ 10.3.5 Floating, non-replaced elements](https://www.w3.org/TR/CSS2/visudet.html#float-width)
//!
//! "Calculate the preferred width by formatting the content without
//! breaking lines other than where explicit line breaks occur, and also
//! calculate the preferred minimum width, e.g., by trying all possible line
//! breaks."
//!
//! Sizes are computed for every box in one post-order pass.

use super::box_model::{border_widths, resolve_edges, resolve_margins};
use super::box_tree::{BoxId, BoxTree, BoxType};
use super::font::FontDatabase;
use super::inline::{collect_units, intrinsic_inline_sizes};
use super::replaced::used_replaced_size;
use crate::style::{ComputedStyle, LengthPercentageAuto};

/// Min-content and max-content widths of every box.
#[derive(Debug, Clone, Default)]
pub(crate) struct IntrinsicSizes {
    /// Content-box (min, max) per box.
    content: Vec<(f32, f32)>,
    /// Margin-box (min, max) per box.
    outer: Vec<(f32, f32)>,
}

impl IntrinsicSizes {
    pub(crate) fn compute(boxes: &BoxTree, fonts: &FontDatabase) -> Self {
        let mut sizes = Self {
            content: vec![(0.0, 0.0); boxes.len()],
            outer: vec![(0.0, 0.0); boxes.len()],
        };
        let Some(root) = boxes.root else {
            return sizes;
        };
        let mut stack = vec![(root, false)];
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                sizes.measure(boxes, fonts, id);
                continue;
            }
            stack.push((id, true));
            for &child in boxes.children(id).iter().rev() {
                stack.push((child, false));
            }
        }
        sizes
    }

    /// Content-box widths.
    pub(crate) fn content(&self, id: BoxId) -> (f32, f32) {
        self.content.get(id.0 as usize).copied().unwrap_or_default()
    }

    /// Margin-box widths.
    pub(crate) fn outer(&self, id: BoxId) -> (f32, f32) {
        self.outer.get(id.0 as usize).copied().unwrap_or_default()
    }

    fn measure(&mut self, boxes: &BoxTree, fonts: &FontDatabase, id: BoxId) {
        let b = boxes.get(id);
        let style = boxes.style(id);
        let (min, max) = match b.kind {
            BoxType::Replaced => {
                let natural = b.image.as_ref().map_or((0.0, 0.0), |(_, size)| *size);
                let width = used_replaced_size(style, natural, 0.0, None).0;
                (width, width)
            }
            BoxType::Block | BoxType::ListItem | BoxType::AnonymousBlock | BoxType::InlineBlock => {
                match style.width {
                    LengthPercentageAuto::Px(w) => (w, w),
                    _ if boxes.has_inline_content(id) => {
                        let units = collect_units(boxes, fonts, id, 0.0);
                        intrinsic_inline_sizes(&units, &|child| self.outer(child))
                    }
                    _ => self.block_children(boxes, id),
                }
            }
            _ => return,
        };
        let (min, max) = (clamp(style, min), clamp(style, max.max(min)));
        let index = id.0 as usize;
        if let Some(slot) = self.content.get_mut(index) {
            *slot = (min, max);
        }
        let edges = horizontal_edges(style);
        if let Some(slot) = self.outer.get_mut(index) {
            *slot = (min + edges, max + edges);
        }
    }

    fn block_children(&self, boxes: &BoxTree, id: BoxId) -> (f32, f32) {
        let mut min = 0.0_f32;
        let mut max = 0.0_f32;
        let mut floats = 0.0_f32;
        for &child in boxes.children(id) {
            if boxes.is_absolute(child) {
                continue;
            }
            let (child_min, child_max) = self.outer(child);
            min = min.max(child_min);
            if boxes.is_float(child) {
                floats += child_max;
                max = max.max(floats);
            } else {
                max = max.max(child_max);
                floats = 0.0;
            }
        }
        (min, max)
    }
}

fn clamp(style: &ComputedStyle, width: f32) -> f32 {
    let px = |v: LengthPercentageAuto| match v {
        LengthPercentageAuto::Px(px) => Some(px),
        _ => None,
    };
    let width = px(style.max_width).map_or(width, |m| width.min(m));
    px(style.min_width).map_or(width, |m| width.max(m)).max(0.0)
}

/// Padding, border and margin on both sides; percentages and `auto`
/// count as zero.
fn horizontal_edges(style: &ComputedStyle) -> f32 {
    resolve_edges(&style.padding, 0.0).horizontal()
        + border_widths(style).horizontal()
        + resolve_margins(style, 0.0).horizontal()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::compute_document_styles;
    use crate::layout::box_tree::build_box_tree;
    use crate::layout::replaced::NoImages;

    fn sizes_for(html: &str, label: &str) -> (f32, f32) {
        let tree = quokka_html::parse_document(html);
        let styles = compute_document_styles(&tree);
        let boxes = build_box_tree(&tree, &styles, &NoImages);
        let fonts = FontDatabase::default();
        let sizes = IntrinsicSizes::compute(&boxes, &fonts);
        let id = (0..boxes.len())
            .map(|i| BoxId(u32::try_from(i).unwrap()))
            .find(|&id| boxes.get(id).label == label)
            .unwrap();
        sizes.content(id)
    }

    #[test]
    fn test_min_content_is_longest_word() {
        let fonts = FontDatabase::default();
        let word = |s: &str| {
            let style = ComputedStyle::initial();
            super::super::inline::shape(&fonts, &style, s)
                .iter()
                .map(|r| r.width)
                .sum::<f32>()
        };
        let (min, max) = sizes_for(
            "<div id=f style='float:left'>aaaa bb</div>",
            "div#f",
        );
        assert!((min - word("aaaa")).abs() < 0.01, "min {min}");
        assert!((max - word("aaaa bb")).abs() < 0.01, "max {max}");
    }

    #[test]
    fn test_fixed_width_wins() {
        let (min, max) = sizes_for("<div id=f style='width:120px'>text</div>", "div#f");
        assert_eq!((min, max), (120.0, 120.0));
    }

    #[test]
    fn test_padding_counts_toward_outer_size() {
        let html = "<div id=o style='float:left'><div style='width:50px;padding:0 5px;margin-left:10px'></div></div>";
        let (min, max) = sizes_for(html, "div#o");
        assert_eq!((min, max), (70.0, 70.0));
    }
}
