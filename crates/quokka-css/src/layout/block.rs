//! Block formatting.
//!
//! [§ 9.4.1 Block formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#block-formatting)
//!
//! "In a block formatting context, boxes are laid out one after the other,
//! vertically, beginning at the top of a containing block. The vertical
//! distance between two sibling boxes is determined by the 'margin'
//! properties. Vertical margins between adjacent block-level boxes in a
//! block formatting context collapse."
//!
//! Layout runs on an explicit stack of [`Frame`]s, one per block container
//! being laid out, so document depth never touches the call stack. A frame
//! whose top margin still collapses with its first child has an unresolved
//! position; it is fixed the moment content, a border or padding separates
//! the margins.

use std::collections::BTreeMap;

#[cfg(feature = "layout-trace")]
use log::trace;

use super::box_model::{CollapsedMargin, EdgeSizes, Rect, border_widths, resolve_edges, resolve_margins};
use super::box_tree::{BoxId, BoxTree, BoxType, MarkerContent};
use super::float::FloatContext;
use super::font::FontDatabase;
use super::fragment::{
    BoxKind, Fragment, FragmentId, FragmentTree, InlineContent, InlineFragment, PaintStyle, TextRun,
};
use super::inline::{LineInput, Unit, UnitKind, collect_units, has_line_content, layout_lines, shape};
use super::intrinsic::IntrinsicSizes;
use super::positioned::{absolute_height, absolute_position, absolute_width, relative_offset};
use super::replaced::used_replaced_size;
use crate::style::{Clear, ComputedStyle, Display, Float, Position};
use crate::values::Color;

const EPSILON: f32 = 0.01;

/// How a frame's box takes part in its parent's layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Root,
    InFlow,
    Float,
    Atomic,
    Absolute,
}

/// The block a box resolves percentages and `auto` widths against.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ContainingBlock {
    x: f32,
    width: f32,
    height: Option<f32>,
}

/// An absolutely positioned box waiting for its containing block.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Deferred {
    box_id: BoxId,
    x: f32,
    y: f32,
}

impl Deferred {
    const fn shifted(self, dx: f32, dy: f32) -> Self {
        Self {
            box_id: self.box_id,
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

#[derive(Debug, Default)]
struct InlineState {
    units: Vec<Unit>,
    /// Atomic inlines and floats to lay out before the lines.
    queue: Vec<BoxId>,
    next: usize,
    placed: BTreeMap<BoxId, FragmentId>,
    /// Laid-out atomics with their pre-placement origin and the
    /// absolutely positioned descendants they passed up.
    nested: Vec<(FragmentId, f32, f32, Vec<Deferred>)>,
}

#[derive(Debug)]
enum Phase {
    Start,
    Children(usize),
    Inline(InlineState),
    Absolutes(Vec<Deferred>),
    Done,
}

/// One block container being laid out.
#[derive(Debug)]
struct Frame {
    box_id: BoxId,
    fragment: FragmentId,
    role: Role,
    cb: ContainingBlock,
    content_x: f32,
    content_width: f32,
    /// Used content height when `height` (or a replaced size) fixes it.
    specified_height: Option<f32>,
    min_height: f32,
    max_height: f32,
    margin: EdgeSizes,
    border: EdgeSizes,
    padding: EdgeSizes,
    /// Index of the float context this frame's content lives in.
    bfc: usize,
    owns_bfc: bool,
    top_resolved: bool,
    border_y: f32,
    content_y: f32,
    /// Bottom of the last in-flow content, before `pending`.
    cursor: f32,
    /// Margins adjoining the cursor that have not been resolved yet.
    pending: CollapsedMargin,
    absolutes: Vec<Deferred>,
    static_position: (f32, f32),
    abs_cb: Rect,
    out_cursor: f32,
    out_pending: CollapsedMargin,
    phase: Phase,
}

impl Frame {
    fn definite_height(&self) -> Option<f32> {
        self.specified_height
            .map(|h| h.min(self.max_height).max(self.min_height))
    }

    fn content_block(&self) -> ContainingBlock {
        ContainingBlock {
            x: self.content_x,
            width: self.content_width,
            height: self.definite_height(),
        }
    }

    fn next_y(&self) -> f32 {
        self.cursor + self.pending.resolve()
    }
}

/// What a finished frame hands to its parent.
struct Returned {
    box_id: BoxId,
    fragment: FragmentId,
    role: Role,
    cursor: f32,
    pending: CollapsedMargin,
    absolutes: Vec<Deferred>,
    static_position: (f32, f32),
    abs_cb: Rect,
}

/// Fix the position of the innermost frame and every ancestor whose top
/// margin collapses with it.
fn resolve_top(stack: &mut [Frame]) {
    let Some(last) = stack.last() else { return };
    if last.top_resolved {
        return;
    }
    let y = last.next_y();
    for frame in stack.iter_mut().rev() {
        if frame.top_resolved {
            break;
        }
        frame.top_resolved = true;
        frame.border_y = y;
        frame.content_y = y + frame.border.top + frame.padding.top;
        frame.cursor = frame.content_y;
        frame.pending = CollapsedMargin::default();
    }
}

/// [§ 10.3.3 Block-level, non-replaced elements in normal flow](https://www.w3.org/TR/CSS2/visudet.html#blockwidth)
///
/// "'margin-left' + 'border-left-width' + 'padding-left' + 'width' +
/// 'padding-right' + 'border-right-width' + 'margin-right' = width of
/// containing block"
///
/// Returns (content width, margin-left, margin-right). `available` is the
/// containing block width, narrowed by floats for BFC roots.
fn block_width(
    style: &ComputedStyle,
    cb_width: f32,
    available: f32,
    edges: f32,
    replaced: Option<f32>,
) -> (f32, f32, f32) {
    let margin_left = style.margin.left.resolve(cb_width);
    let margin_right = style.margin.right.resolve(cb_width);
    let solve = |width: Option<f32>| -> (f32, f32, f32) {
        let Some(width) = width else {
            // "If 'width' is set to 'auto', any other 'auto' values become
            // '0' and 'width' follows from the resulting equality."
            let (l, r) = (margin_left.unwrap_or(0.0), margin_right.unwrap_or(0.0));
            return ((available - l - r - edges).max(0.0), l, r);
        };
        let (mut l, mut r) = (margin_left, margin_right);
        // "If 'width' is not 'auto' and [...] is larger than the width of
        // the containing block, then any 'auto' values for 'margin-left' or
        // 'margin-right' are, for the following rules, treated as zero."
        if width + edges + l.unwrap_or(0.0) + r.unwrap_or(0.0) > available {
            l = l.or(Some(0.0));
            r = r.or(Some(0.0));
        }
        let rest = available - width - edges;
        match (l, r) {
            (None, None) => (width, rest / 2.0, rest / 2.0),
            (None, Some(r)) => (width, rest - r, r),
            // Over-constrained: the right margin gives way.
            (Some(l), _) => (width, l, rest - l),
        }
    };
    if let Some(width) = replaced {
        return solve(Some(width));
    }
    let mut used = solve(style.width.resolve(cb_width));
    if let Some(max) = style.max_width.resolve(cb_width) {
        if used.0 > max {
            used = solve(Some(max));
        }
    }
    if let Some(min) = style.min_width.resolve(cb_width) {
        if used.0 < min {
            used = solve(Some(min));
        }
    }
    used
}

fn clamp_width(style: &ComputedStyle, width: f32, cb_width: f32) -> f32 {
    let max = style.max_width.resolve(cb_width).unwrap_or(f32::INFINITY);
    let min = style.min_width.resolve(cb_width).unwrap_or(0.0);
    width.min(max).max(min).max(0.0)
}

const fn box_kind(kind: BoxType) -> BoxKind {
    match kind {
        BoxType::ListItem => BoxKind::ListItem,
        BoxType::AnonymousBlock => BoxKind::AnonymousBlock,
        BoxType::InlineBlock => BoxKind::InlineBlock,
        BoxType::Replaced => BoxKind::Replaced,
        _ => BoxKind::Block,
    }
}

/// Lays out a box tree into a fragment tree.
pub(crate) struct Engine<'a> {
    boxes: &'a BoxTree,
    fonts: &'a FontDatabase,
    intrinsic: IntrinsicSizes,
    viewport: Rect,
    fragments: FragmentTree,
    bfcs: Vec<FloatContext>,
    viewport_fragment: FragmentId,
}

impl<'a> Engine<'a> {
    pub(crate) fn new(boxes: &'a BoxTree, fonts: &'a FontDatabase, width: f32, height: f32) -> Self {
        let sane = |v: f32| if v.is_finite() { v.max(0.0) } else { 0.0 };
        let viewport = Rect::new(0.0, 0.0, sane(width), sane(height));
        let mut fragments = FragmentTree::new();
        let viewport_fragment = fragments.push(Fragment {
            id: FragmentId(0),
            label: "viewport".to_string(),
            x: 0.0,
            y: 0.0,
            width: viewport.width,
            height: viewport.height,
            margin: EdgeSizes::default(),
            border: EdgeSizes::default(),
            padding: EdgeSizes::default(),
            display: Display::Block,
            float: Float::None,
            position: Position::Static,
            box_kind: BoxKind::Viewport,
            paint: PaintStyle::default(),
            children: Vec::new(),
            lines: Vec::new(),
            marker: None,
        });
        fragments.root = viewport_fragment;
        Self {
            boxes,
            fonts,
            intrinsic: IntrinsicSizes::compute(boxes, fonts),
            viewport,
            fragments,
            bfcs: Vec::new(),
            viewport_fragment,
        }
    }

    pub(crate) fn run(mut self) -> FragmentTree {
        let Some(root) = self.boxes.root else {
            return self.fragments;
        };
        let mut stack = vec![self.root_frame(root)];
        while let Some(top) = stack.last() {
            if matches!(top.phase, Phase::Done) {
                let Some(frame) = stack.pop() else { break };
                let returned = self.complete(frame);
                if stack.is_empty() {
                    self.finish_root(&returned);
                } else {
                    self.accept(&mut stack, returned);
                }
                continue;
            }
            self.step(&mut stack);
        }
        self.fragments
    }

    // ---------------------------------------------------------------
    // Frame construction
    // ---------------------------------------------------------------

    fn replaced_size(&self, id: BoxId, cb: ContainingBlock) -> Option<(f32, f32)> {
        let b = self.boxes.get(id);
        if b.kind != BoxType::Replaced {
            return None;
        }
        let natural = b.image.as_ref().map_or((0.0, 0.0), |(_, size)| *size);
        Some(used_replaced_size(self.boxes.style(id), natural, cb.width, cb.height))
    }

    /// Allocate the fragment and float context of a new frame. The caller
    /// fills in the vertical position.
    #[allow(clippy::too_many_arguments)]
    fn new_frame(
        &mut self,
        id: BoxId,
        role: Role,
        cb: ContainingBlock,
        content_x: f32,
        content_width: f32,
        margin: EdgeSizes,
        border: EdgeSizes,
        padding: EdgeSizes,
        specified_height: Option<f32>,
        parent_bfc: usize,
    ) -> Frame {
        let boxes = self.boxes;
        let b = boxes.get(id);
        let style = boxes.style(id);
        let owns_bfc = role != Role::InFlow || boxes.establishes_bfc(id);
        let bfc = if owns_bfc {
            self.bfcs
                .push(FloatContext::new(content_x, content_x + content_width));
            self.bfcs.len() - 1
        } else {
            parent_bfc
        };
        let mut paint = PaintStyle::from_style(style);
        if let Some((src, _)) = &b.image {
            paint.image.clone_from(src);
        }
        let fragment = self.fragments.push(Fragment {
            id: FragmentId(0),
            label: b.label.clone(),
            x: content_x - padding.left - border.left,
            y: 0.0,
            width: content_width + padding.horizontal() + border.horizontal(),
            height: 0.0,
            margin,
            border,
            padding,
            display: style.display,
            float: if role == Role::Float { style.float } else { Float::None },
            position: style.position,
            box_kind: box_kind(b.kind),
            paint,
            children: Vec::new(),
            lines: Vec::new(),
            marker: None,
        });
        #[cfg(feature = "layout-trace")]
        trace!(
            "frame {} {:?} x={content_x} w={content_width} bfc={bfc}",
            b.label,
            role
        );
        let cb_height = cb.height;
        Frame {
            box_id: id,
            fragment,
            role,
            cb,
            content_x,
            content_width,
            specified_height,
            min_height: style.min_height.resolve_definite(cb_height).unwrap_or(0.0),
            max_height: style
                .max_height
                .resolve_definite(cb_height)
                .unwrap_or(f32::INFINITY),
            margin,
            border,
            padding,
            bfc,
            owns_bfc,
            top_resolved: true,
            border_y: 0.0,
            content_y: 0.0,
            cursor: 0.0,
            pending: CollapsedMargin::default(),
            absolutes: Vec::new(),
            static_position: (0.0, 0.0),
            abs_cb: self.viewport,
            out_cursor: 0.0,
            out_pending: CollapsedMargin::default(),
            phase: Phase::Start,
        }
    }

    /// Place a frame whose top edge is known.
    fn place_top(frame: &mut Frame, border_y: f32) {
        frame.top_resolved = true;
        frame.border_y = border_y;
        frame.content_y = border_y + frame.border.top + frame.padding.top;
        frame.cursor = frame.content_y;
    }

    /// [§ 9.1.2 Containing blocks](https://www.w3.org/TR/CSS2/visuren.html#containing-block)
    ///
    /// "The containing block in which the root element lives is a rectangle
    /// called the initial containing block."
    fn root_frame(&mut self, root: BoxId) -> Frame {
        let style = self.boxes.style(root);
        let cb = ContainingBlock {
            x: 0.0,
            width: self.viewport.width,
            height: Some(self.viewport.height),
        };
        let padding = resolve_edges(&style.padding, cb.width);
        let border = border_widths(style);
        let mut margin = resolve_margins(style, cb.width);
        let replaced = self.replaced_size(root, cb);
        let (width, ml, mr) = block_width(
            style,
            cb.width,
            cb.width,
            padding.horizontal() + border.horizontal(),
            replaced.map(|s| s.0),
        );
        margin.left = ml;
        margin.right = mr;
        let specified = replaced
            .map(|s| s.1)
            .or_else(|| style.height.resolve_definite(cb.height));
        let content_x = ml + border.left + padding.left;
        let mut frame = self.new_frame(
            root, Role::Root, cb, content_x, width, margin, border, padding, specified, 0,
        );
        Self::place_top(&mut frame, margin.top);
        frame
    }

    /// [§ 10.3.5](https://www.w3.org/TR/CSS2/visudet.html#float-width) and
    /// [§ 10.3.9](https://www.w3.org/TR/CSS2/visudet.html#inlineblock-width)
    ///
    /// Floats and inline-blocks: "shrink-to-fit width is: min(max(preferred
    /// minimum width, available width), preferred width)". The frame is laid
    /// out with its margin box at the origin and moved into place later.
    fn detached_frame(&mut self, id: BoxId, role: Role, cb: ContainingBlock) -> Frame {
        let style = self.boxes.style(id);
        let padding = resolve_edges(&style.padding, cb.width);
        let border = border_widths(style);
        let margin = resolve_margins(style, cb.width);
        let edges = padding.horizontal() + border.horizontal();
        let replaced = self.replaced_size(id, cb);
        let width = if let Some((w, _)) = replaced {
            w
        } else if let Some(w) = style.width.resolve(cb.width) {
            clamp_width(style, w, cb.width)
        } else {
            let (min, max) = self.intrinsic.content(id);
            let available = cb.width - margin.horizontal() - edges;
            clamp_width(style, max.min(available.max(min)), cb.width)
        };
        let specified = replaced
            .map(|s| s.1)
            .or_else(|| style.height.resolve_definite(cb.height));
        let content_x = margin.left + border.left + padding.left;
        let mut frame = self.new_frame(
            id, role, cb, content_x, width, margin, border, padding, specified, 0,
        );
        Self::place_top(&mut frame, margin.top);
        frame
    }

    /// [§ 10.3.7](https://www.w3.org/TR/CSS2/visudet.html#abs-non-replaced-width)
    /// and [§ 10.6.4](https://www.w3.org/TR/CSS2/visudet.html#abs-non-replaced-height)
    fn absolute_frame(&mut self, deferred: Deferred, cb_rect: Rect) -> Frame {
        let id = deferred.box_id;
        let style = self.boxes.style(id);
        let cb = ContainingBlock {
            x: cb_rect.x,
            width: cb_rect.width,
            height: Some(cb_rect.height),
        };
        let padding = resolve_edges(&style.padding, cb.width);
        let border = border_widths(style);
        let replaced = self.replaced_size(id, cb);
        let used = absolute_width(
            style,
            cb_rect,
            padding.horizontal() + border.horizontal(),
            self.intrinsic.content(id),
            replaced.map(|s| s.0),
        );
        let mut margin = resolve_margins(style, cb.width);
        margin.left = used.margin_left;
        margin.right = used.margin_right;
        let specified = replaced.map(|s| s.1).or_else(|| {
            absolute_height(
                style,
                cb_rect,
                padding.vertical() + border.vertical() + margin.vertical(),
            )
        });
        let content_x = margin.left + border.left + padding.left;
        let mut frame = self.new_frame(
            id,
            Role::Absolute,
            cb,
            content_x,
            used.width,
            margin,
            border,
            padding,
            specified,
            0,
        );
        Self::place_top(&mut frame, margin.top);
        frame.static_position = (deferred.x, deferred.y);
        frame.abs_cb = cb_rect;
        frame
    }

    /// [§ 9.5.2 Controlling flow next to floats](https://www.w3.org/TR/CSS2/visuren.html#flow-control)
    /// and [§ 8.3.1 Collapsing margins](https://www.w3.org/TR/CSS2/box.html#collapsing-margins)
    fn push_in_flow(&mut self, stack: &mut Vec<Frame>, id: BoxId) {
        let boxes = self.boxes;
        let style = boxes.style(id);
        let Some(index) = stack.len().checked_sub(1) else { return };
        let (cb, bfc) = (stack[index].content_block(), stack[index].bfc);
        let padding = resolve_edges(&style.padding, cb.width);
        let border = border_widths(style);
        let mut margin = resolve_margins(style, cb.width);

        let mut cursor = stack[index].cursor;
        let mut incoming = stack[index].pending;
        if style.clear != Clear::None {
            let hypothetical = cursor + incoming.adjoin(margin.top).resolve();
            let cleared = self.bfcs[bfc].clear(style.clear, hypothetical);
            if cleared > hypothetical {
                // "Clearance inhibits margin collapsing and acts as spacing
                // above the margin-top of an element."
                resolve_top(stack);
                cursor = cleared - margin.top;
                incoming = CollapsedMargin::default();
            }
        }
        stack[index].pending = CollapsedMargin::default();
        let pending = incoming.adjoin(margin.top);

        let owns_bfc = boxes.establishes_bfc(id);
        let (left, available) = if owns_bfc {
            // "The border box of [...] an element in the normal flow that
            // establishes a new block formatting context [...] must not
            // overlap the margin box of any floats in the same block
            // formatting context as the element itself."
            self.bfcs[bfc].available_within(
                cursor + pending.resolve(),
                EPSILON,
                cb.x,
                cb.x + cb.width,
            )
        } else {
            (cb.x, cb.width)
        };
        let replaced = self.replaced_size(id, cb);
        let (width, ml, mr) = block_width(
            style,
            cb.width,
            available,
            padding.horizontal() + border.horizontal(),
            replaced.map(|s| s.0),
        );
        margin.left = ml;
        margin.right = mr;
        let specified = replaced
            .map(|s| s.1)
            .or_else(|| style.height.resolve_definite(cb.height));
        let content_x = left + ml + border.left + padding.left;
        let mut frame = self.new_frame(
            id,
            Role::InFlow,
            cb,
            content_x,
            width,
            margin,
            border,
            padding,
            specified,
            bfc,
        );
        frame.top_resolved = false;
        frame.cursor = cursor;
        frame.pending = pending;
        let collapsible_top =
            !frame.owns_bfc && border.top == 0.0 && padding.top == 0.0 && replaced.is_none();
        stack.push(frame);
        if !collapsible_top {
            resolve_top(stack);
        }
    }

    // ---------------------------------------------------------------
    // Stepping
    // ---------------------------------------------------------------

    fn step(&mut self, stack: &mut Vec<Frame>) {
        let Some(index) = stack.len().checked_sub(1) else { return };
        let phase = std::mem::replace(&mut stack[index].phase, Phase::Done);
        match phase {
            Phase::Start => self.start(stack),
            Phase::Children(next) => self.step_children(stack, next),
            Phase::Inline(state) => self.step_inline(stack, state),
            Phase::Absolutes(queue) => self.step_absolutes(stack, queue),
            Phase::Done => {}
        }
    }

    fn start(&mut self, stack: &mut Vec<Frame>) {
        let Some(frame) = stack.last_mut() else { return };
        let boxes = self.boxes;
        let id = frame.box_id;
        if !boxes.is_block_container(id) {
            self.finish(stack);
            return;
        }
        if boxes.has_inline_content(id) {
            let units = collect_units(boxes, self.fonts, id, frame.content_width);
            let queue = units
                .iter()
                .filter(|u| matches!(u.kind, UnitKind::Atomic | UnitKind::Float))
                .map(|u| u.box_id)
                .collect();
            frame.phase = Phase::Inline(InlineState {
                units,
                queue,
                ..InlineState::default()
            });
        } else {
            frame.phase = Phase::Children(0);
        }
    }

    fn step_children(&mut self, stack: &mut Vec<Frame>, next: usize) {
        let Some(index) = stack.len().checked_sub(1) else { return };
        let boxes = self.boxes;
        let Some(&child) = boxes.children(stack[index].box_id).get(next) else {
            self.finish(stack);
            return;
        };
        stack[index].phase = Phase::Children(next + 1);
        if boxes.is_absolute(child) {
            let frame = &mut stack[index];
            let y = frame.next_y();
            frame.absolutes.push(Deferred {
                box_id: child,
                x: frame.content_x,
                y,
            });
        } else if boxes.is_float(child) {
            let cb = stack[index].content_block();
            let frame = self.detached_frame(child, Role::Float, cb);
            stack.push(frame);
        } else if boxes.is_block_level(child) {
            self.push_in_flow(stack, child);
        }
    }

    fn step_inline(&mut self, stack: &mut Vec<Frame>, mut state: InlineState) {
        let Some(index) = stack.len().checked_sub(1) else { return };
        if let Some(&child) = state.queue.get(state.next) {
            state.next += 1;
            let cb = stack[index].content_block();
            stack[index].phase = Phase::Inline(state);
            let role = if self.boxes.is_float(child) {
                Role::Float
            } else {
                Role::Atomic
            };
            let frame = self.detached_frame(child, role, cb);
            stack.push(frame);
            return;
        }

        if has_line_content(&state.units) {
            resolve_top(stack);
        }
        let frame = &mut stack[index];
        let input = LineInput {
            boxes: self.boxes,
            fonts: self.fonts,
            container: frame.box_id,
            units: &state.units,
            placed: &state.placed,
            left: frame.content_x,
            right: frame.content_x + frame.content_width,
            top: frame.next_y(),
            cb_width: frame.content_width,
        };
        let output = layout_lines(&input, &mut self.bfcs[frame.bfc], &mut self.fragments);
        if !output.lines.is_empty() {
            frame.cursor = output.bottom;
        }
        for (fragment, x0, y0, deferred) in state.nested {
            let Some(now) = self.fragments.get(fragment).map(Fragment::margin_box) else {
                continue;
            };
            let (dx, dy) = (now.x - x0, now.y - y0);
            frame
                .absolutes
                .extend(deferred.into_iter().map(|d| d.shifted(dx, dy)));
        }
        frame.absolutes.extend(
            output
                .absolutes
                .iter()
                .map(|&(box_id, x, y)| Deferred { box_id, x, y }),
        );
        if let Some(fragment) = self.fragments.get_mut(frame.fragment) {
            fragment.lines = output.lines;
            fragment.children.extend(output.floats);
        }
        self.finish(stack);
    }

    fn step_absolutes(&mut self, stack: &mut Vec<Frame>, mut queue: Vec<Deferred>) {
        let Some(index) = stack.len().checked_sub(1) else { return };
        let Some(next) = queue.pop() else {
            stack[index].phase = Phase::Done;
            return;
        };
        let cb = self.absolute_containing_block(&stack[index], next.box_id);
        stack[index].phase = Phase::Absolutes(queue);
        let frame = self.absolute_frame(next, cb);
        stack.push(frame);
    }

    /// [§ 10.1 Definition of "containing block"](https://www.w3.org/TR/CSS2/visudet.html#containing-block-details)
    ///
    /// "If the element has 'position: absolute', the containing block is
    /// established by the nearest ancestor with a 'position' of 'absolute',
    /// 'relative' or 'fixed' [...] formed by the padding edge of the
    /// ancestor." Fixed boxes and boxes with no positioned ancestor use the
    /// viewport.
    fn absolute_containing_block(&self, frame: &Frame, id: BoxId) -> Rect {
        if frame.role == Role::Root || self.boxes.style(id).position == Position::Fixed {
            return self.viewport;
        }
        self.fragments
            .get(frame.fragment)
            .map_or(self.viewport, Fragment::padding_box)
    }

    // ---------------------------------------------------------------
    // Finishing
    // ---------------------------------------------------------------

    /// [§ 10.6.3 Block-level non-replaced elements in normal flow when
    /// 'overflow' computes to 'visible'](https://www.w3.org/TR/CSS2/visudet.html#normal-block)
    /// and [§ 10.6.7 'Auto' heights for block formatting context roots](https://www.w3.org/TR/CSS2/visudet.html#root-height)
    fn finish(&mut self, stack: &mut [Frame]) {
        let Some(frame) = stack.last() else { return };
        let needs_position = frame.specified_height.is_some_and(|h| h > 0.0)
            || frame.min_height > 0.0
            || frame.border.bottom > 0.0
            || frame.padding.bottom > 0.0;
        if !frame.top_resolved && needs_position {
            resolve_top(stack);
        }
        let Some(frame) = stack.last_mut() else { return };

        let content_height = if frame.top_resolved {
            let collapsible_bottom = frame.specified_height.is_none()
                && frame.border.bottom == 0.0
                && frame.padding.bottom == 0.0
                && !frame.owns_bfc;
            let mut auto_height = if collapsible_bottom {
                frame.cursor - frame.content_y
            } else {
                frame.next_y() - frame.content_y
            };
            if frame.owns_bfc {
                if let Some(bottom) = self.bfcs.get(frame.bfc).and_then(FloatContext::max_float_bottom) {
                    auto_height = auto_height.max(bottom - frame.content_y);
                }
            }
            let height = frame
                .specified_height
                .unwrap_or(auto_height)
                .min(frame.max_height)
                .max(frame.min_height)
                .max(0.0);
            let collapsible_bottom = collapsible_bottom && (height - auto_height).abs() < EPSILON;
            let border_bottom =
                frame.content_y + height + frame.padding.bottom + frame.border.bottom;
            if collapsible_bottom {
                // "The bottom margin of an in-flow block box with a 'height'
                // of 'auto' and a 'min-height' of zero collapses with its last
                // in-flow block-level child's bottom margin."
                frame.out_cursor = border_bottom;
                frame.out_pending = frame.pending.adjoin(frame.margin.bottom);
            } else {
                frame.out_cursor = border_bottom;
                frame.out_pending = CollapsedMargin::new(frame.margin.bottom);
            }
            height
        } else {
            // "If the top and bottom margins of a box are adjoining, then it
            // is possible for margins to collapse through it."
            frame.border_y = frame.next_y();
            frame.content_y = frame.border_y;
            frame.out_cursor = frame.cursor;
            frame.out_pending = frame.pending.adjoin(frame.margin.bottom);
            0.0
        };

        let marker = self.outside_marker(frame);
        if let Some(fragment) = self.fragments.get_mut(frame.fragment) {
            fragment.y = frame.border_y;
            fragment.height = content_height
                + frame.padding.vertical()
                + frame.border.vertical();
            fragment.marker = marker;
        }

        let handles_absolutes = frame.role == Role::Root
            || self.boxes.style(frame.box_id).position != Position::Static;
        if handles_absolutes && !frame.absolutes.is_empty() {
            let boxes = self.boxes;
            let is_root = frame.role == Role::Root;
            let (mut mine, passed): (Vec<Deferred>, Vec<Deferred>) =
                std::mem::take(&mut frame.absolutes)
                    .into_iter()
                    .partition(|d| is_root || boxes.style(d.box_id).position != Position::Fixed);
            frame.absolutes = passed;
            mine.reverse();
            frame.phase = Phase::Absolutes(mine);
        } else {
            frame.phase = Phase::Done;
        }
    }

    /// Apply relative offsets and close the frame's float context.
    fn complete(&mut self, mut frame: Frame) -> Returned {
        if frame.owns_bfc {
            let _ = self.bfcs.pop();
        }
        let style = self.boxes.style(frame.box_id);
        if style.position == Position::Relative {
            let (dx, dy) = relative_offset(style, frame.cb.width, frame.cb.height);
            self.fragments.translate(frame.fragment, dx, dy);
            for deferred in &mut frame.absolutes {
                *deferred = deferred.shifted(dx, dy);
            }
        }
        Returned {
            box_id: frame.box_id,
            fragment: frame.fragment,
            role: frame.role,
            cursor: frame.out_cursor,
            pending: frame.out_pending,
            absolutes: frame.absolutes,
            static_position: frame.static_position,
            abs_cb: frame.abs_cb,
        }
    }

    fn margin_box(&self, id: FragmentId) -> Rect {
        self.fragments
            .get(id)
            .map_or(Rect::default(), Fragment::margin_box)
    }

    fn accept(&mut self, stack: &mut [Frame], returned: Returned) {
        let Some(parent) = stack.last_mut() else { return };
        match returned.role {
            Role::InFlow => {
                parent.cursor = returned.cursor;
                parent.pending = returned.pending;
                parent.absolutes.extend(returned.absolutes);
                if let Some(fragment) = self.fragments.get_mut(parent.fragment) {
                    fragment.children.push(returned.fragment);
                }
            }
            Role::Float | Role::Atomic => {
                let origin = self.margin_box(returned.fragment);
                if let Phase::Inline(state) = &mut parent.phase {
                    let _ = state.placed.insert(returned.box_id, returned.fragment);
                    state
                        .nested
                        .push((returned.fragment, origin.x, origin.y, returned.absolutes));
                    return;
                }
                // [§ 9.5.1](https://www.w3.org/TR/CSS2/visuren.html#float-position)
                let side = self.boxes.style(returned.box_id).float;
                let placed = self.bfcs[parent.bfc].place_float_in(
                    side,
                    origin.width,
                    origin.height,
                    parent.next_y(),
                    parent.content_x,
                    parent.content_x + parent.content_width,
                );
                let (dx, dy) = (placed.x - origin.x, placed.y - origin.y);
                self.fragments.translate(returned.fragment, dx, dy);
                parent
                    .absolutes
                    .extend(returned.absolutes.into_iter().map(|d| d.shifted(dx, dy)));
                if let Some(fragment) = self.fragments.get_mut(parent.fragment) {
                    fragment.children.push(returned.fragment);
                }
            }
            Role::Absolute => {
                let origin = self.margin_box(returned.fragment);
                let style = self.boxes.style(returned.box_id);
                let (x, y) = absolute_position(
                    style,
                    returned.abs_cb,
                    returned.static_position,
                    (origin.width, origin.height),
                );
                let (dx, dy) = (x - origin.x, y - origin.y);
                self.fragments.translate(returned.fragment, dx, dy);
                let shifted = returned.absolutes.into_iter().map(|d| d.shifted(dx, dy));
                let owner = if parent.role == Role::Root {
                    if let Phase::Absolutes(queue) = &mut parent.phase {
                        queue.extend(shifted);
                    }
                    self.viewport_fragment
                } else {
                    parent.absolutes.extend(shifted);
                    parent.fragment
                };
                if let Some(fragment) = self.fragments.get_mut(owner) {
                    fragment.children.push(returned.fragment);
                }
            }
            Role::Root => {}
        }
    }

    /// [§ 14.2 The background](https://www.w3.org/TR/CSS2/colors.html#background)
    ///
    /// "The background of the root element becomes the background of the
    /// canvas [...] if the value of the 'background' property for the HTML
    /// element is 'transparent' [...], user agents must instead propagate the
    /// computed value of the background properties from that element's first
    /// BODY child element."
    fn finish_root(&mut self, returned: &Returned) {
        let root_box = self.margin_box(returned.fragment);
        let body = self.fragments.get(returned.fragment).and_then(|html| {
            html.children.iter().copied().find(|&c| {
                self.fragments
                    .get(c)
                    .is_some_and(|f| f.label == "body" || f.label.starts_with("body#"))
            })
        });
        let mut canvas = Color::TRANSPARENT;
        for source in std::iter::once(returned.fragment).chain(body) {
            if let Some(fragment) = self.fragments.get_mut(source) {
                if !fragment.paint.background.is_transparent() {
                    canvas = fragment.paint.background;
                    fragment.paint.background = Color::TRANSPARENT;
                    break;
                }
            }
        }
        let viewport_height = self.viewport.height;
        if let Some(viewport) = self.fragments.get_mut(self.viewport_fragment) {
            viewport.children.insert(0, returned.fragment);
            viewport.height = viewport_height.max(root_box.bottom());
            viewport.paint.background = canvas;
        }
    }

    /// [§ 12.5.1 Lists: the 'list-style' properties](https://www.w3.org/TR/CSS2/generate.html#lists)
    ///
    /// "The marker box is outside the principal block box." It sits to the
    /// left of the content box on the first line's baseline.
    fn outside_marker(&self, frame: &Frame) -> Option<InlineFragment> {
        let boxes = self.boxes;
        let content = boxes.get(frame.box_id).marker.as_ref()?;
        let style = boxes.style(frame.box_id);
        let (ascent, _) = self.fonts.primary_metrics(style);
        let baseline = self
            .first_baseline(frame.fragment)
            .unwrap_or(frame.content_y + ascent);
        let gap = style.font_size * 0.5;
        match content {
            MarkerContent::Text(text) => {
                let runs = shape(self.fonts, style, text);
                let first = runs.first()?;
                let width: f32 = runs.iter().map(|r| r.width).sum();
                let metrics = &self.fonts.face(first.face).metrics;
                let run_ascent = metrics.ascent(first.size);
                Some(InlineFragment {
                    x: frame.content_x - gap - width,
                    y: baseline - run_ascent,
                    width,
                    height: run_ascent + metrics.descent(first.size),
                    baseline: run_ascent,
                    visible: style.is_visible(),
                    content: InlineContent::Marker(TextRun {
                        text: text.clone(),
                        font: self.fonts.describe(first.face, first.size),
                        color: style.color,
                        decoration: style.text_decoration_lines,
                    }),
                })
            }
            MarkerContent::Image { src, size } => Some(InlineFragment {
                x: frame.content_x - gap - size.0,
                y: baseline - size.1,
                width: size.0,
                height: size.1,
                baseline: size.1,
                visible: style.is_visible(),
                content: InlineContent::MarkerImage { src: src.clone() },
            }),
        }
    }

    /// Baseline of the first line box in normal flow inside a fragment.
    fn first_baseline(&self, id: FragmentId) -> Option<f32> {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let fragment = self.fragments.get(current)?;
            if let Some(line) = fragment.lines.first() {
                return Some(line.y + line.baseline);
            }
            for &child in fragment.children.iter().rev() {
                let in_flow = self
                    .fragments
                    .get(child)
                    .is_some_and(|f| f.float == Float::None && !f.position.is_out_of_flow());
                if in_flow {
                    stack.push(child);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::LengthPercentageAuto::{Auto, Percent, Px};

    #[test]
    fn test_auto_width_fills_containing_block() {
        let mut style = ComputedStyle::initial();
        style.margin.left = Px(10.0);
        assert_eq!(block_width(&style, 400.0, 400.0, 4.0, None), (386.0, 10.0, 0.0));
    }

    #[test]
    fn test_percentage_width() {
        let mut style = ComputedStyle::initial();
        style.width = Percent(50.0);
        assert_eq!(block_width(&style, 400.0, 400.0, 0.0, None).0, 200.0);
    }

    #[test]
    fn test_auto_margins_center() {
        let mut style = ComputedStyle::initial();
        style.width = Px(100.0);
        style.margin.left = Auto;
        style.margin.right = Auto;
        assert_eq!(block_width(&style, 300.0, 300.0, 0.0, None), (100.0, 100.0, 100.0));
    }

    #[test]
    fn test_over_constrained_right_margin_gives_way() {
        let mut style = ComputedStyle::initial();
        style.width = Px(300.0);
        style.margin.left = Px(20.0);
        style.margin.right = Auto;
        assert_eq!(block_width(&style, 200.0, 200.0, 0.0, None), (300.0, 20.0, -120.0));
    }

    #[test]
    fn test_max_and_min_width_clamp() {
        let mut style = ComputedStyle::initial();
        style.max_width = Px(150.0);
        assert_eq!(block_width(&style, 400.0, 400.0, 0.0, None).0, 150.0);
        style.min_width = Px(500.0);
        assert_eq!(block_width(&style, 400.0, 400.0, 0.0, None).0, 500.0);
    }
}
