//! The post-layout geometry tree.
//!
//! Fragments live in a flat arena and refer to each other by
//! [`FragmentId`]. The tree is built once by layout and is read-only to
//! paint and the invariant checkers.

use serde::Serialize;

use super::box_model::{EdgeSizes, Rect};
use crate::style::{
    BorderStyle, ComputedStyle, Display, Edges, Float, FontStyle, Overflow, Position, Side,
    TextDecoration,
};
use crate::values::Color;

/// Index of a fragment in its [`FragmentTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct FragmentId(pub u32);

impl FragmentId {
    /// Arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// What generated a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoxKind {
    /// The initial containing block.
    Viewport,
    /// A block container generated by an element.
    Block,
    /// A `display: list-item` block.
    ListItem,
    /// An anonymous block wrapping an inline run.
    AnonymousBlock,
    /// An atomic inline-level block container.
    InlineBlock,
    /// A replaced element such as `<img>`.
    Replaced,
}

/// Paint properties resolved at layout time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaintStyle {
    /// Background color, transparent when none.
    pub background: Color,
    /// Border colors with `currentColor` resolved.
    pub border_color: Edges<Color>,
    /// Border styles.
    pub border_style: Edges<BorderStyle>,
    /// `color`
    pub color: Color,
    /// False for `visibility: hidden`.
    pub visible: bool,
    /// True when `overflow` clips descendants.
    pub clips: bool,
    /// Image source for replaced content.
    pub image: Option<String>,
}

impl Default for PaintStyle {
    fn default() -> Self {
        Self {
            background: Color::TRANSPARENT,
            border_color: Edges::all(Color::BLACK),
            border_style: Edges::all(BorderStyle::None),
            color: Color::BLACK,
            visible: true,
            clips: false,
            image: None,
        }
    }
}

impl PaintStyle {
    /// Paint properties of a box with this style.
    #[must_use]
    pub fn from_style(style: &ComputedStyle) -> Self {
        Self {
            background: style.background(),
            border_color: border_colors(style),
            border_style: style.border_style,
            color: style.color,
            visible: style.is_visible(),
            clips: style.overflow != Overflow::Visible,
            image: None,
        }
    }
}

/// Border colors with `currentColor` resolved.
#[must_use]
pub fn border_colors(style: &ComputedStyle) -> Edges<Color> {
    Edges {
        top: style.border_color(Side::Top),
        right: style.border_color(Side::Right),
        bottom: style.border_color(Side::Bottom),
        left: style.border_color(Side::Left),
    }
}

/// A font as chosen by font matching.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedFont {
    /// Matched family name.
    pub family: String,
    /// Used size in px, after small-caps scaling.
    pub size: f32,
    /// Weight of the matched face.
    pub weight: u16,
    /// Style of the matched face.
    pub style: FontStyle,
}

/// A run of text on one line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextRun {
    /// The text after white-space processing and transformation.
    pub text: String,
    /// Font used.
    pub font: ResolvedFont,
    /// Text color.
    pub color: Color,
    /// Lines drawn over this run.
    pub decoration: TextDecoration,
}

/// Paint data for an inline box's piece on one line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineBoxPaint {
    /// Background color.
    pub background: Color,
    /// Border widths of this piece; the start side is zero on
    /// continuation lines and the end side before the last one.
    pub border: EdgeSizes,
    /// Border colors.
    pub border_color: Edges<Color>,
    /// Border styles.
    pub border_style: Edges<BorderStyle>,
}

/// What an inline fragment draws.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "type")]
pub enum InlineContent {
    /// Text.
    Text(TextRun),
    /// Background and border of an inline box.
    Box(InlineBoxPaint),
    /// An atomic inline laid out as its own fragment.
    Atomic {
        /// The fragment placed on the line.
        fragment: FragmentId,
    },
    /// A list marker glyph or number.
    Marker(TextRun),
    /// A list marker image.
    MarkerImage {
        /// Image source.
        src: String,
    },
}

/// A piece of inline content positioned on a line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineFragment {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
    /// Baseline offset from `y`.
    pub baseline: f32,
    /// False for `visibility: hidden` content.
    pub visible: bool,
    /// What to draw.
    pub content: InlineContent,
}

/// [§ 9.4.2 Inline formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#inline-formatting)
///
/// "The rectangular area that contains the boxes that form a line is called
/// a line box."
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineFragment {
    /// Left edge of the line box.
    pub x: f32,
    /// Top edge of the line box.
    pub y: f32,
    /// Available width of the line box.
    pub width: f32,
    /// Height of the line box.
    pub height: f32,
    /// Baseline offset from `y`.
    pub baseline: f32,
    /// Inline fragments in paint order.
    pub inlines: Vec<InlineFragment>,
}

/// A laid-out box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fragment {
    /// This fragment's id.
    pub id: FragmentId,
    /// Tag name and id, e.g. `div#main`; used in diagnostics paths.
    pub label: String,
    /// Border-box left edge.
    pub x: f32,
    /// Border-box top edge.
    pub y: f32,
    /// Border-box width.
    pub width: f32,
    /// Border-box height.
    pub height: f32,
    /// Used margins.
    pub margin: EdgeSizes,
    /// Used border widths.
    pub border: EdgeSizes,
    /// Used padding.
    pub padding: EdgeSizes,
    /// Computed `display`.
    pub display: Display,
    /// Computed `float`.
    pub float: Float,
    /// Computed `position`.
    pub position: Position,
    /// What generated this fragment.
    pub box_kind: BoxKind,
    /// Resolved paint properties.
    pub paint: PaintStyle,
    /// Block-level and out-of-flow children in tree order.
    pub children: Vec<FragmentId>,
    /// Line boxes, for block containers with inline content.
    pub lines: Vec<LineFragment>,
    /// An outside list marker.
    pub marker: Option<InlineFragment>,
}

impl Fragment {
    /// Border box.
    #[must_use]
    pub const fn border_box(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Padding box.
    #[must_use]
    pub fn padding_box(&self) -> Rect {
        self.border_box().shrink(&self.border)
    }

    /// Content box.
    #[must_use]
    pub fn content_box(&self) -> Rect {
        self.padding_box().shrink(&self.padding)
    }

    /// Margin box.
    #[must_use]
    pub fn margin_box(&self) -> Rect {
        self.border_box().expand(&self.margin)
    }

    /// Atomic inline fragments referenced from this fragment's lines.
    pub fn atomic_children(&self) -> impl Iterator<Item = FragmentId> + '_ {
        self.lines.iter().flat_map(|line| {
            line.inlines.iter().filter_map(|inline| match inline.content {
                InlineContent::Atomic { fragment } => Some(fragment),
                _ => None,
            })
        })
    }
}

/// The complete result of one layout pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FragmentTree {
    /// Every fragment, indexed by [`FragmentId`].
    pub fragments: Vec<Fragment>,
    /// The viewport fragment.
    pub root: FragmentId,
}

impl FragmentTree {
    pub(crate) const fn new() -> Self {
        Self {
            fragments: Vec::new(),
            root: FragmentId(0),
        }
    }

    /// Look up a fragment.
    #[must_use]
    pub fn get(&self, id: FragmentId) -> Option<&Fragment> {
        self.fragments.get(id.index())
    }

    pub(crate) fn get_mut(&mut self, id: FragmentId) -> Option<&mut Fragment> {
        self.fragments.get_mut(id.index())
    }

    /// Number of fragments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// True for an empty arena.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub(crate) fn push(&mut self, mut fragment: Fragment) -> FragmentId {
        let id = FragmentId(u32::try_from(self.fragments.len()).unwrap_or(u32::MAX));
        fragment.id = id;
        self.fragments.push(fragment);
        id
    }

    /// Children and atomic inlines of `id`, then theirs, in pre-order,
    /// starting with `id` itself.
    #[must_use]
    pub fn descendants(&self, id: FragmentId) -> Vec<FragmentId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(fragment) = self.get(current) else { continue };
            out.push(current);
            let children: Vec<FragmentId> = fragment
                .children
                .iter()
                .copied()
                .chain(fragment.atomic_children())
                .collect();
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Move a fragment and everything inside it.
    pub(crate) fn translate(&mut self, id: FragmentId, dx: f32, dy: f32) {
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        for current in self.descendants(id) {
            let Some(fragment) = self.get_mut(current) else { continue };
            fragment.x += dx;
            fragment.y += dy;
            for line in &mut fragment.lines {
                line.x += dx;
                line.y += dy;
                for inline in &mut line.inlines {
                    inline.x += dx;
                    inline.y += dy;
                }
            }
            if let Some(marker) = &mut fragment.marker {
                marker.x += dx;
                marker.y += dy;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(x: f32, y: f32) -> Fragment {
        Fragment {
            id: FragmentId(0),
            label: "div".to_string(),
            x,
            y,
            width: 10.0,
            height: 10.0,
            margin: EdgeSizes::default(),
            border: EdgeSizes::default(),
            padding: EdgeSizes::default(),
            display: Display::Block,
            float: Float::None,
            position: Position::Static,
            box_kind: BoxKind::Block,
            paint: PaintStyle::default(),
            children: Vec::new(),
            lines: Vec::new(),
            marker: None,
        }
    }

    #[test]
    fn test_translate_moves_atomic_inlines() {
        let mut tree = FragmentTree::new();
        let parent = tree.push(fragment(0.0, 0.0));
        let atomic = tree.push(fragment(5.0, 5.0));
        tree.get_mut(parent).unwrap().lines.push(LineFragment {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
            baseline: 8.0,
            inlines: vec![InlineFragment {
                x: 5.0,
                y: 5.0,
                width: 10.0,
                height: 10.0,
                baseline: 10.0,
                visible: true,
                content: InlineContent::Atomic { fragment: atomic },
            }],
        });
        tree.translate(parent, 3.0, 4.0);
        let moved = tree.get(atomic).unwrap();
        assert_eq!((moved.x, moved.y), (8.0, 9.0));
        assert_eq!(tree.get(parent).unwrap().lines[0].inlines[0].x, 8.0);
        assert_eq!(tree.descendants(parent), vec![parent, atomic]);
    }
}
