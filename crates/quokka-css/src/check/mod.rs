//! Invariant checkers for layout and paint output.
//!
//! Both checkers are pure: they walk their input on an explicit stack and
//! report every violation as a value. An empty result means the input is
//! well formed.

use std::fmt;

use serde::Serialize;

use crate::layout::{EdgeSizes, Fragment, FragmentId, FragmentTree, InlineContent, Rect};
use crate::paint::{DisplayItem, DisplayList};
use crate::style::{Float, Position};

const EPSILON: f32 = 0.01;

/// One broken invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Where the violation sits, e.g. `html > body > div#main[1] > line[0]`,
    /// or `item[12]` for display lists.
    pub path: String,
    /// Offending field.
    pub field: String,
    /// Offending value.
    pub value: String,
}

impl Violation {
    fn new(path: &str, field: &str, value: impl fmt::Display) -> Self {
        Self {
            path: path.to_string(),
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} = {}", self.path, self.field, self.value)
    }
}

fn join(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{parent} > {segment}")
    }
}

/// Segment for the `index`th of `count` siblings; the index is shown only
/// when there is more than one.
fn segment(label: &str, index: usize, count: usize) -> String {
    if count > 1 {
        format!("{label}[{index}]")
    } else {
        label.to_string()
    }
}

fn check_finite(out: &mut Vec<Violation>, path: &str, fields: &[(&str, f32)]) {
    for &(field, value) in fields {
        if !value.is_finite() {
            out.push(Violation::new(path, field, value));
        }
    }
}

fn check_rect(out: &mut Vec<Violation>, path: &str, rect: Rect) {
    check_finite(
        out,
        path,
        &[
            ("x", rect.x),
            ("y", rect.y),
            ("width", rect.width),
            ("height", rect.height),
        ],
    );
    for (field, value) in [("width", rect.width), ("height", rect.height)] {
        if value < 0.0 {
            out.push(Violation::new(path, field, value));
        }
    }
}

fn check_edges(out: &mut Vec<Violation>, path: &str, name: &str, edges: &EdgeSizes) {
    for (side, value) in [
        ("top", edges.top),
        ("right", edges.right),
        ("bottom", edges.bottom),
        ("left", edges.left),
    ] {
        if !value.is_finite() {
            out.push(Violation::new(path, &format!("{name}.{side}"), value));
        }
    }
}

fn check_baseline(out: &mut Vec<Violation>, path: &str, baseline: f32, height: f32) {
    if !baseline.is_finite() {
        out.push(Violation::new(path, "baseline", baseline));
    } else if height > 0.0 && (baseline < -EPSILON || baseline > height + EPSILON) {
        out.push(Violation::new(path, "baseline", baseline));
    }
}

fn is_in_flow(fragment: &Fragment) -> bool {
    fragment.float == Float::None && !matches!(fragment.position, Position::Absolute | Position::Fixed)
}

/// A block whose top and bottom margins adjoin: no height and no lines.
fn collapses_through(fragment: &Fragment) -> bool {
    fragment.height <= EPSILON && fragment.lines.is_empty()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Top,
    Bottom,
}

/// [§ 8.3.1 Collapsing margins](https://www.w3.org/TR/CSS2/box.html#collapsing-margins)
///
/// Whether a negative margin collapses into the `side` margin of `id`: its
/// own, or one reached through adjoining first (or last) in-flow children
/// and through boxes whose margins collapse through them.
fn negative_margin_adjoins(tree: &FragmentTree, id: FragmentId, side: Side) -> bool {
    let mut stack = vec![id];
    while let Some(id) = stack.pop() {
        let Some(f) = tree.get(id) else { continue };
        let through = collapses_through(f);
        let (margin, separated) = match side {
            Side::Top => (f.margin.top, f.border.top > 0.0 || f.padding.top > 0.0),
            Side::Bottom => (f.margin.bottom, f.border.bottom > 0.0 || f.padding.bottom > 0.0),
        };
        if margin < 0.0 || (through && f.margin.top.min(f.margin.bottom) < 0.0) {
            return true;
        }
        if separated || !f.lines.is_empty() {
            continue;
        }
        let in_flow = f
            .children
            .iter()
            .copied()
            .filter(|&c| tree.get(c).is_some_and(is_in_flow));
        let ordered: Vec<FragmentId> = match side {
            Side::Top => in_flow.collect(),
            Side::Bottom => in_flow.rev().collect(),
        };
        for child in ordered {
            stack.push(child);
            if !tree.get(child).is_some_and(collapses_through) {
                break;
            }
        }
    }
    false
}

/// Check a fragment tree.
///
/// - all geometry is finite, and widths and heights are non-negative
/// - in-flow block siblings have non-decreasing `y`, unless a negative
///   margin collapses into the margin between them
/// - line boxes have non-decreasing `y` within their container
/// - `0 <= baseline <= height` for line boxes of positive height
#[must_use]
pub fn check_fragment_tree(tree: &FragmentTree) -> Vec<Violation> {
    let mut out = Vec::new();
    let Some(root) = tree.get(tree.root) else {
        out.push(Violation::new("", "root", tree.root.0));
        return out;
    };
    // The viewport itself is not part of paths.
    check_rect(&mut out, "viewport", root.border_box());
    let mut stack: Vec<(FragmentId, String)> = root
        .children
        .iter()
        .enumerate()
        .rev()
        .map(|(i, &child)| (child, segment_for(tree, child, i, root.children.len())))
        .collect();

    while let Some((id, path)) = stack.pop() {
        let Some(fragment) = tree.get(id) else {
            out.push(Violation::new(&path, "id", id.0));
            continue;
        };
        check_rect(&mut out, &path, fragment.border_box());
        check_edges(&mut out, &path, "margin", &fragment.margin);
        check_edges(&mut out, &path, "border", &fragment.border);
        check_edges(&mut out, &path, "padding", &fragment.padding);

        // (y of the previous static sibling, whether a negative margin
        // collapses into the gap after it)
        let mut previous: Option<(f32, bool)> = None;
        for (i, &child) in fragment.children.iter().enumerate() {
            let Some(c) = tree.get(child) else { continue };
            if !is_in_flow(c) {
                continue;
            }
            if c.position == Position::Relative {
                if let Some((_, pulled)) = &mut previous {
                    *pulled = *pulled
                        || negative_margin_adjoins(tree, child, Side::Top)
                        || negative_margin_adjoins(tree, child, Side::Bottom);
                }
                continue;
            }
            if let Some((y, pulled)) = previous {
                let pulled = pulled || negative_margin_adjoins(tree, child, Side::Top);
                if !pulled && c.y + EPSILON < y {
                    let child_path = join(&path, &segment_for(tree, child, i, fragment.children.len()));
                    out.push(Violation::new(&child_path, "y", c.y));
                }
            }
            previous = Some((c.y, negative_margin_adjoins(tree, child, Side::Bottom)));
        }

        let mut previous_line = f32::NEG_INFINITY;
        for (i, line) in fragment.lines.iter().enumerate() {
            let line_path = join(&path, &format!("line[{i}]"));
            check_rect(
                &mut out,
                &line_path,
                Rect::new(line.x, line.y, line.width.max(0.0), line.height),
            );
            if line.y + EPSILON < previous_line {
                out.push(Violation::new(&line_path, "y", line.y));
            }
            previous_line = line.y;
            check_baseline(&mut out, &line_path, line.baseline, line.height);
            for (j, inline) in line.inlines.iter().enumerate() {
                let inline_path = join(&line_path, &format!("inline[{j}]"));
                check_finite(
                    &mut out,
                    &inline_path,
                    &[
                        ("x", inline.x),
                        ("y", inline.y),
                        ("width", inline.width),
                        ("height", inline.height),
                        ("baseline", inline.baseline),
                    ],
                );
                if inline.height < 0.0 {
                    out.push(Violation::new(&inline_path, "height", inline.height));
                }
                if let InlineContent::Atomic { fragment: atomic } = inline.content {
                    let label = tree.get(atomic).map_or("?", |f| f.label.as_str());
                    stack.push((atomic, join(&inline_path, label)));
                }
            }
        }
        if let Some(marker) = &fragment.marker {
            check_finite(
                &mut out,
                &join(&path, "marker"),
                &[("x", marker.x), ("y", marker.y), ("width", marker.width)],
            );
        }

        let count = fragment.children.len();
        for (i, &child) in fragment.children.iter().enumerate().rev() {
            stack.push((child, join(&path, &segment_for(tree, child, i, count))));
        }
    }
    out
}

fn segment_for(tree: &FragmentTree, id: FragmentId, index: usize, count: usize) -> String {
    let label = tree.get(id).map_or("?", |f| f.label.as_str());
    segment(label, index, count)
}

/// Check a display list.
///
/// - all geometry is finite and sizes are non-negative
/// - font sizes are positive
/// - every `Restore` closes an open `Clip`, and every `Clip` is closed
#[must_use]
pub fn check_display_list(list: &DisplayList) -> Vec<Violation> {
    let mut out = Vec::new();
    let mut depth = 0_usize;
    for (i, item) in list.items().iter().enumerate() {
        let path = format!("item[{i}]");
        match item {
            DisplayItem::FillRect { rect, .. } | DisplayItem::DrawImage { rect, .. } => {
                check_rect(&mut out, &path, *rect);
            }
            DisplayItem::DrawBorder { rect, widths, .. } => {
                check_rect(&mut out, &path, *rect);
                check_edges(&mut out, &path, "widths", widths);
            }
            DisplayItem::DrawText { x, y, font, .. } => {
                check_finite(&mut out, &path, &[("x", *x), ("y", *y)]);
                if !(font.size.is_finite() && font.size > 0.0) {
                    out.push(Violation::new(&path, "font.size", font.size));
                }
            }
            DisplayItem::Clip { rect } => {
                check_rect(&mut out, &path, *rect);
                depth += 1;
            }
            DisplayItem::Restore => {
                if depth == 0 {
                    out.push(Violation::new(&path, "restore", "without matching clip"));
                } else {
                    depth -= 1;
                }
            }
        }
    }
    if depth > 0 {
        out.push(Violation::new(
            &format!("item[{}]", list.len()),
            "clip",
            format!("{depth} unclosed"),
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::Color;

    #[test]
    fn test_unbalanced_restore_is_reported() {
        let list: DisplayList = [DisplayItem::Restore].into_iter().collect();
        let violations = check_display_list(&list);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "item[0]");
    }

    #[test]
    fn test_unclosed_clip_is_reported() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        let list: DisplayList = [
            DisplayItem::Clip { rect },
            DisplayItem::Clip { rect },
            DisplayItem::Restore,
        ]
        .into_iter()
        .collect();
        let violations = check_display_list(&list);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "clip");
    }

    #[test]
    fn test_non_finite_fill_is_reported() {
        let list: DisplayList = [DisplayItem::FillRect {
            rect: Rect::new(f32::NAN, 0.0, -1.0, 1.0),
            color: Color::BLACK,
        }]
        .into_iter()
        .collect();
        let fields: Vec<String> = check_display_list(&list)
            .into_iter()
            .map(|v| v.field)
            .collect();
        assert_eq!(fields, vec!["x", "width"]);
    }

    fn layout(html: &str) -> FragmentTree {
        crate::layout_tree(&quokka_html::parse_document(html), 400.0, 300.0)
    }

    fn labelled(tree: &FragmentTree, label: &str) -> FragmentId {
        tree.fragments
            .iter()
            .find(|f| f.label == label)
            .map(|f| f.id)
            .expect("fragment with label")
    }

    #[test]
    fn test_sibling_moved_above_predecessor_is_reported() {
        let mut tree = layout("<div id=a>x</div><div id=b>y</div>");
        let b = labelled(&tree, "div#b");
        tree.get_mut(b).unwrap().y = -50.0;
        let violations = check_fragment_tree(&tree);
        assert_eq!(violations.len(), 1, "{violations:?}");
        assert!(violations[0].path.ends_with("div#b[1]"));
        assert_eq!(violations[0].field, "y");
    }

    #[test]
    fn test_negative_margin_collapsing_through_empty_blocks() {
        for html in [
            "<p><ul><div style=margin:-8px>",
            "<p><section style=position:relative;margin-top:-8px></section>d",
            "<b><li><blockquote style=\"height:4px;margin-top:-8px\">",
            "<p></p><div><ul style='margin:-5px 2px'><li>x</li></ul></div>",
            "<p>x</p><ul><li style='margin-top:-60px'>y</li></ul>",
        ] {
            let violations = check_fragment_tree(&layout(html));
            assert!(violations.is_empty(), "{html}: {violations:?}");
        }
    }

    #[test]
    fn test_negative_margin_found_through_first_children() {
        let tree = layout("<ul id=u><div><div style='margin-top:-8px'>x</div></div></ul>");
        let u = labelled(&tree, "ul#u");
        assert!(negative_margin_adjoins(&tree, u, Side::Top));
        assert!(!negative_margin_adjoins(&tree, u, Side::Bottom));
    }

    #[test]
    fn test_path_segments_index_only_siblings() {
        assert_eq!(segment("div#main", 1, 3), "div#main[1]");
        assert_eq!(segment("body", 0, 1), "body");
        assert_eq!(join("html", "body"), "html > body");
    }
}
