//! Painter - generates a display list from a fragment tree
//!
//! [CSS 2.1 Appendix E.2 Painting order](https://www.w3.org/TR/CSS2/zindex.html#painting-order)
//!
//! The painter walks the fragment tree in tree order and emits drawing
//! commands back to front. The walk runs on an explicit work stack.

use crate::layout::{
    BoxKind, Fragment, FragmentId, FragmentTree, InlineContent, InlineFragment, Rect, TextRun,
};
use crate::style::BorderStyle;

use super::{DisplayItem, DisplayList};

/// Pending painting work.
#[derive(Debug, Clone, Copy)]
enum Work {
    /// Paint a fragment's background and border, then schedule its content.
    Box(FragmentId),
    /// Paint line content starting at the given line and inline.
    Lines {
        fragment: FragmentId,
        line: usize,
        inline: usize,
    },
    /// Close a clip opened by an `overflow` box.
    Restore,
}

/// Painter that generates a display list from a fragment tree.
///
/// [CSS 2.1 Appendix E.2](https://www.w3.org/TR/CSS2/zindex.html#painting-order)
///
/// For each box, in order:
/// 1. Background color
/// 2. Border
/// 3. Replaced content
/// 4. Block-level, floated and positioned children, in tree order
/// 5. Line content: marker, inline box decorations, text and text
///    decorations, atomic inlines at their line position
pub struct Painter<'a> {
    tree: &'a FragmentTree,
}

impl<'a> Painter<'a> {
    /// Create a painter over a fragment tree.
    #[must_use]
    pub const fn new(tree: &'a FragmentTree) -> Self {
        Self { tree }
    }

    /// Paint the whole tree.
    #[must_use]
    pub fn paint(&self) -> DisplayList {
        let mut list = DisplayList::new();
        let mut stack = vec![Work::Box(self.tree.root)];
        while let Some(work) = stack.pop() {
            match work {
                Work::Box(id) => self.paint_box(id, &mut list, &mut stack),
                Work::Lines {
                    fragment,
                    line,
                    inline,
                } => self.paint_lines(fragment, line, inline, &mut list, &mut stack),
                Work::Restore => list.push(DisplayItem::Restore),
            }
        }
        list
    }

    fn paint_box(&self, id: FragmentId, list: &mut DisplayList, stack: &mut Vec<Work>) {
        let Some(fragment) = self.tree.get(id) else { return };
        let paint = &fragment.paint;

        // "visibility: hidden" boxes are still laid out and their visible
        // descendants still paint.
        if paint.visible || fragment.box_kind == BoxKind::Viewport {
            // [§ 14.2 The background](https://www.w3.org/TR/CSS2/colors.html#background)
            // "The background of an element is the total size of the element,
            // including padding and border (but not the margin)."
            if !paint.background.is_transparent() {
                list.push(DisplayItem::FillRect {
                    rect: fragment.border_box(),
                    color: paint.background,
                });
            }
            paint_border(fragment, list);
            if fragment.box_kind == BoxKind::Replaced {
                if let Some(src) = &paint.image {
                    list.push(DisplayItem::DrawImage {
                        rect: fragment.content_box(),
                        src: src.clone(),
                    });
                }
            }
        }

        // [§ 11.1.1 overflow](https://www.w3.org/TR/CSS2/visufx.html#overflow)
        // "hidden: This value indicates that the content is clipped [...] to
        // the padding box."
        if paint.clips {
            list.push(DisplayItem::Clip {
                rect: fragment.padding_box(),
            });
            stack.push(Work::Restore);
        }
        stack.push(Work::Lines {
            fragment: id,
            line: 0,
            inline: 0,
        });
        stack.extend(fragment.children.iter().rev().map(|&child| Work::Box(child)));
    }

    fn paint_lines(
        &self,
        id: FragmentId,
        start_line: usize,
        start_inline: usize,
        list: &mut DisplayList,
        stack: &mut Vec<Work>,
    ) {
        let Some(fragment) = self.tree.get(id) else { return };
        if start_line == 0 && start_inline == 0 {
            if let Some(marker) = &fragment.marker {
                paint_inline(marker, list);
            }
        }
        for (line_index, line) in fragment.lines.iter().enumerate().skip(start_line) {
            let first = if line_index == start_line { start_inline } else { 0 };
            for (inline_index, inline) in line.inlines.iter().enumerate().skip(first) {
                if let InlineContent::Atomic { fragment: child } = inline.content {
                    // Resume after the atomic once its subtree is painted.
                    stack.push(Work::Lines {
                        fragment: id,
                        line: line_index,
                        inline: inline_index + 1,
                    });
                    stack.push(Work::Box(child));
                    return;
                }
                paint_inline(inline, list);
            }
        }
    }
}

/// [§ 8.5 Border properties](https://www.w3.org/TR/CSS2/box.html#border-properties)
fn paint_border(fragment: &Fragment, list: &mut DisplayList) {
    let widths = fragment.border;
    let styles = fragment.paint.border_style;
    let drawn = |width: f32, style: BorderStyle| {
        width > 0.0 && !matches!(style, BorderStyle::None | BorderStyle::Hidden)
    };
    if drawn(widths.top, styles.top)
        || drawn(widths.right, styles.right)
        || drawn(widths.bottom, styles.bottom)
        || drawn(widths.left, styles.left)
    {
        list.push(DisplayItem::DrawBorder {
            rect: fragment.border_box(),
            widths,
            colors: fragment.paint.border_color,
            styles,
        });
    }
}

fn paint_inline(inline: &InlineFragment, list: &mut DisplayList) {
    if !inline.visible {
        return;
    }
    let rect = Rect::new(inline.x, inline.y, inline.width, inline.height);
    match &inline.content {
        InlineContent::Box(decoration) => {
            if !decoration.background.is_transparent() {
                list.push(DisplayItem::FillRect {
                    rect,
                    color: decoration.background,
                });
            }
            if decoration.border.horizontal() + decoration.border.vertical() > 0.0 {
                list.push(DisplayItem::DrawBorder {
                    rect,
                    widths: decoration.border,
                    colors: decoration.border_color,
                    styles: decoration.border_style,
                });
            }
        }
        InlineContent::Text(run) => {
            paint_text(inline, run, list);
            paint_decorations(inline, run, list);
        }
        InlineContent::Marker(run) => paint_text(inline, run, list),
        InlineContent::MarkerImage { src } => list.push(DisplayItem::DrawImage {
            rect,
            src: src.clone(),
        }),
        InlineContent::Atomic { .. } => {}
    }
}

fn paint_text(inline: &InlineFragment, run: &TextRun, list: &mut DisplayList) {
    if run.text.is_empty() || run.color.is_transparent() {
        return;
    }
    list.push(DisplayItem::DrawText {
        x: inline.x,
        y: inline.y + inline.baseline,
        text: run.text.clone(),
        font: run.font.clone(),
        color: run.color,
    });
}

/// [§ 16.3.1 Underlining, overlining, striking, and blinking](https://www.w3.org/TR/CSS2/text.html#lining-striking-props)
///
/// "This property describes decorations that are added to the text of an
/// element using the element's color."
fn paint_decorations(inline: &InlineFragment, run: &TextRun, list: &mut DisplayList) {
    let decoration = run.decoration;
    if decoration.is_none() || inline.width <= 0.0 {
        return;
    }
    let size = run.font.size;
    let thickness = (size / 16.0).max(1.0);
    let baseline = inline.y + inline.baseline;
    let mut line = |y: f32| {
        list.push(DisplayItem::FillRect {
            rect: Rect::new(inline.x, y, inline.width, thickness),
            color: run.color,
        });
    };
    if decoration.underline {
        line(baseline + size * 0.1);
    }
    if decoration.overline {
        line(inline.y);
    }
    if decoration.line_through {
        line(baseline - size * 0.3);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::compute_document_styles;
    use crate::layout::{FontDatabase, LayoutOptions, NoImages, layout_document};
    use crate::values::Color;

    fn paint_html(html: &str) -> DisplayList {
        let tree = quokka_html::parse_document(html);
        let styles = compute_document_styles(&tree);
        let fonts = FontDatabase::default();
        let options = LayoutOptions {
            viewport_width: 400.0,
            viewport_height: 300.0,
            fonts: &fonts,
            images: &NoImages,
        };
        Painter::new(&layout_document(&tree, &styles, &options)).paint()
    }

    fn fills(list: &DisplayList, color: Color) -> usize {
        list.items()
            .iter()
            .filter(|item| matches!(item, DisplayItem::FillRect { color: c, .. } if *c == color))
            .count()
    }

    #[test]
    fn test_background_painted_before_text() {
        let list = paint_html("<body><p style='background:red'>hi</p></body>");
        let red = Color::rgb(255, 0, 0);
        let background = list
            .items()
            .iter()
            .position(|item| matches!(item, DisplayItem::FillRect { color, .. } if *color == red))
            .expect("background painted");
        let text = list
            .items()
            .iter()
            .position(|item| matches!(item, DisplayItem::DrawText { .. }))
            .expect("text painted");
        assert!(background < text, "background must precede text: {list:#?}");
    }

    #[test]
    fn test_hidden_box_still_paints_visible_child() {
        let list = paint_html(
            "<div style='visibility:hidden;background:red'><span style='visibility:visible'>x</span>y</div>",
        );
        assert_eq!(fills(&list, Color::rgb(255, 0, 0)), 0);
        let texts: Vec<&str> = list
            .items()
            .iter()
            .filter_map(|item| match item {
                DisplayItem::DrawText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["x"]);
    }

    #[test]
    fn test_overflow_hidden_clip_is_balanced() {
        let list = paint_html("<div style='overflow:hidden;height:10px'><p>a</p><p>b</p></div>");
        let clips = list
            .items()
            .iter()
            .filter(|item| matches!(item, DisplayItem::Clip { .. }))
            .count();
        assert_eq!(clips, 1);
        assert!(matches!(list.items().last(), Some(DisplayItem::Restore)), "{list:#?}");
    }

    #[test]
    fn test_underline_follows_text() {
        let list = paint_html("<u style='color:blue'>under</u>");
        let blue = Color::rgb(0, 0, 255);
        let text = list
            .items()
            .iter()
            .position(|item| matches!(item, DisplayItem::DrawText { .. }))
            .expect("text painted");
        assert!(matches!(
            list.items().get(text + 1),
            Some(DisplayItem::FillRect { color, .. }) if *color == blue
        ));
    }

    #[test]
    fn test_canvas_background_from_body() {
        let list = paint_html("<body style='background:green'></body>");
        let green = Color::rgb(0, 128, 0);
        let Some(DisplayItem::FillRect { rect, color }) = list.items().first() else {
            panic!("canvas fill expected first: {list:#?}");
        };
        assert_eq!(*color, green);
        assert_eq!((rect.x, rect.y, rect.width), (0.0, 0.0, 400.0));
        assert!(rect.height >= 300.0);
        assert_eq!(fills(&list, green), 1);
    }
}
