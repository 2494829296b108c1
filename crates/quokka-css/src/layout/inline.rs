//! Inline layout and line boxes.
//!
//! [§ 9.4.2 Inline formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#inline-formatting)
//!
//! "In an inline formatting context, boxes are laid out horizontally, one
//! after the other, beginning at the top of a containing block. Horizontal
//! margins, borders, and padding are respected between these boxes."
//!
//! The inline content of a block container is flattened into [`Unit`]s
//! (words, spaces, inline box edges, atomic inlines, breaks), grouped into
//! unbreakable chunks, and filled greedily into line boxes whose width is
//! narrowed by floats.

use std::collections::BTreeMap;

use super::box_model::{EdgeSizes, Rect, border_widths, resolve_edges, resolve_margins};
use super::box_tree::{BoxId, BoxTree, BoxType, MarkerContent, StyleId};
use super::float::FloatContext;
use super::font::{FaceId, FontDatabase, SMALL_CAPS_SCALE};
use super::fragment::{
    FragmentId, FragmentTree, InlineBoxPaint, InlineContent, InlineFragment, LineFragment,
    TextRun, border_colors,
};
use crate::style::{ComputedStyle, TextAlign, TextTransform, WhiteSpace};

const EPSILON: f32 = 0.01;

/// Consecutive characters drawn with one face at one size.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GlyphRun {
    pub text: String,
    pub face: FaceId,
    pub size: f32,
    pub width: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnitKind {
    Word,
    Space { wraps: bool, collapsible: bool },
    OpenBox,
    CloseBox,
    Atomic,
    ForcedBreak,
    Float,
    Absolute,
    Marker,
}

/// One item of flattened inline content.
#[derive(Debug, Clone)]
pub(crate) struct Unit {
    pub kind: UnitKind,
    /// Text, marker, inline, atomic or out-of-flow box.
    pub box_id: BoxId,
    pub style: StyleId,
    pub runs: Vec<GlyphRun>,
    /// Advance width; zero for atomics, whose size is known after layout.
    pub width: f32,
}

impl Unit {
    const fn bare(kind: UnitKind, box_id: BoxId, style: StyleId, width: f32) -> Self {
        Self {
            kind,
            box_id,
            style,
            runs: Vec::new(),
            width,
        }
    }
}

/// [§ 16.6.1 The 'white-space' processing model](https://www.w3.org/TR/CSS2/text.html#white-space-model)
///
/// `collapse` is true when the preceding content ended in a collapsible
/// space or a line start, and is updated for the following text.
/// Preserved newlines come back as `'\n'`.
pub(crate) fn process_white_space(text: &str, white_space: WhiteSpace, collapse: &mut bool) -> String {
    let mut out = String::with_capacity(text.len());
    if white_space.collapses_spaces() {
        let keep_newlines = white_space.preserves_newlines();
        for ch in text.chars() {
            match ch {
                '\n' if keep_newlines => {
                    while out.ends_with(' ') {
                        let _ = out.pop();
                    }
                    out.push('\n');
                    *collapse = true;
                }
                '\r' if keep_newlines => {}
                ' ' | '\t' | '\n' | '\r' | '\x0C' => {
                    if !*collapse {
                        out.push(' ');
                        *collapse = true;
                    }
                }
                _ => {
                    out.push(ch);
                    *collapse = false;
                }
            }
        }
        return out;
    }
    let mut column = 0usize;
    for ch in text.chars() {
        match ch {
            '\r' => {}
            '\n' => {
                out.push('\n');
                column = 0;
            }
            '\t' => {
                let n = 8 - column % 8;
                out.extend(std::iter::repeat_n(' ', n));
                column += n;
            }
            _ => {
                out.push(ch);
                column += 1;
            }
        }
    }
    *collapse = false;
    out
}

/// [§ 16.5 Capitalization](https://www.w3.org/TR/CSS2/text.html#caps-prop)
pub(crate) fn transform_text(text: &str, transform: TextTransform, mut word_start: bool) -> String {
    match transform {
        TextTransform::None => text.to_string(),
        TextTransform::Uppercase => text.to_uppercase(),
        TextTransform::Lowercase => text.to_lowercase(),
        TextTransform::Capitalize => {
            let mut out = String::with_capacity(text.len());
            for ch in text.chars() {
                if ch.is_whitespace() {
                    word_start = true;
                    out.push(ch);
                } else if word_start && ch.is_alphanumeric() {
                    out.extend(ch.to_uppercase());
                    word_start = false;
                } else {
                    out.push(ch);
                    word_start = word_start && !ch.is_alphanumeric();
                }
            }
            out
        }
    }
}

/// Split text into runs of one face and size, synthesizing small caps by
/// drawing lowercase letters as smaller capitals.
pub(crate) fn shape(fonts: &FontDatabase, style: &ComputedStyle, text: &str) -> Vec<GlyphRun> {
    let mut runs: Vec<GlyphRun> = Vec::new();
    for ch in text.chars() {
        let (face, synthesize) = fonts.match_char(
            &style.font_family,
            style.font_weight,
            style.font_style,
            style.font_variant,
            ch,
        );
        let lowered = synthesize && ch.is_lowercase();
        let size = if lowered {
            style.font_size * SMALL_CAPS_SCALE
        } else {
            style.font_size
        };
        let metrics = &fonts.face(face).metrics;
        let mut drawn = String::new();
        if lowered {
            drawn.extend(ch.to_uppercase());
        } else {
            drawn.push(ch);
        }
        let width: f32 = drawn.chars().map(|c| metrics.advance(c, size)).sum();
        match runs.last_mut() {
            Some(run) if run.face == face && run.size == size => {
                run.text.push_str(&drawn);
                run.width += width;
            }
            _ => runs.push(GlyphRun {
                text: drawn,
                face,
                size,
                width,
            }),
        }
    }
    runs
}

fn inline_start(style: &ComputedStyle, cb_width: f32) -> f32 {
    resolve_margins(style, cb_width).left
        + border_widths(style).left
        + resolve_edges(&style.padding, cb_width).left
}

fn inline_end(style: &ComputedStyle, cb_width: f32) -> f32 {
    resolve_margins(style, cb_width).right
        + border_widths(style).right
        + resolve_edges(&style.padding, cb_width).right
}

/// Flatten the inline-level descendants of `container`.
pub(crate) fn collect_units(
    boxes: &BoxTree,
    fonts: &FontDatabase,
    container: BoxId,
    cb_width: f32,
) -> Vec<Unit> {
    let mut units = Vec::new();
    let mut collapse = true;
    let mut stack: Vec<(BoxId, bool)> = boxes
        .children(container)
        .iter()
        .rev()
        .map(|&c| (c, false))
        .collect();
    while let Some((id, closing)) = stack.pop() {
        let b = boxes.get(id);
        let style_id = b.style;
        let style = boxes.style_by_id(style_id);
        if closing {
            let width = if b.has_end_edge {
                inline_end(style, cb_width)
            } else {
                0.0
            };
            units.push(Unit::bare(UnitKind::CloseBox, id, style_id, width));
            continue;
        }
        if boxes.is_float(id) {
            units.push(Unit::bare(UnitKind::Float, id, style_id, 0.0));
            continue;
        }
        if boxes.is_absolute(id) {
            units.push(Unit::bare(UnitKind::Absolute, id, style_id, 0.0));
            continue;
        }
        match b.kind {
            BoxType::Text => push_text(&mut units, fonts, id, style_id, style, &b.text, &mut collapse),
            BoxType::Inline => {
                let width = if b.has_start_edge {
                    inline_start(style, cb_width)
                } else {
                    0.0
                };
                units.push(Unit::bare(UnitKind::OpenBox, id, style_id, width));
                stack.push((id, true));
                for &child in b.children.iter().rev() {
                    stack.push((child, false));
                }
            }
            BoxType::LineBreak => {
                units.push(Unit::bare(UnitKind::ForcedBreak, id, style_id, 0.0));
                collapse = true;
            }
            BoxType::Marker => {
                let mut unit = Unit::bare(UnitKind::Marker, id, style_id, 0.0);
                match &b.marker {
                    Some(MarkerContent::Text(text)) => {
                        unit.runs = shape(fonts, style, text);
                        unit.width = unit.runs.iter().map(|r| r.width).sum();
                        collapse = text.ends_with(' ');
                    }
                    Some(MarkerContent::Image { size, .. }) => {
                        unit.width = size.0;
                        collapse = false;
                    }
                    None => continue,
                }
                units.push(unit);
            }
            _ => {
                units.push(Unit::bare(UnitKind::Atomic, id, style_id, 0.0));
                collapse = false;
            }
        }
    }
    units
}

fn push_text(
    units: &mut Vec<Unit>,
    fonts: &FontDatabase,
    id: BoxId,
    style_id: StyleId,
    style: &ComputedStyle,
    text: &str,
    collapse: &mut bool,
) {
    let word_start = *collapse;
    let processed = process_white_space(text, style.white_space, collapse);
    let text = transform_text(&processed, style.text_transform, word_start);
    let space = UnitKind::Space {
        wraps: style.white_space.wraps(),
        collapsible: style.white_space.collapses_spaces(),
    };
    let flush = |units: &mut Vec<Unit>, current: &mut String, is_space: bool| {
        if current.is_empty() {
            return;
        }
        let runs = shape(fonts, style, current);
        let width = runs.iter().map(|r| r.width).sum();
        units.push(Unit {
            kind: if is_space { space } else { UnitKind::Word },
            box_id: id,
            style: style_id,
            runs,
            width,
        });
        current.clear();
    };
    let mut current = String::new();
    let mut current_is_space = false;
    for ch in text.chars() {
        if ch == '\n' {
            flush(units, &mut current, current_is_space);
            units.push(Unit::bare(UnitKind::ForcedBreak, id, style_id, 0.0));
            continue;
        }
        let is_space = ch == ' ';
        if is_space != current_is_space {
            flush(units, &mut current, current_is_space);
        }
        current_is_space = is_space;
        current.push(ch);
    }
    flush(units, &mut current, current_is_space);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkKind {
    Inline,
    Forced,
    Float,
    Absolute,
}

/// Units between two soft wrap opportunities.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Chunk {
    kind: ChunkKind,
    start: usize,
    end: usize,
    width: f32,
    /// Width of the spaces ending the chunk, which hang at a line end.
    trailing: f32,
}

impl Chunk {
    const fn empty(start: usize) -> Self {
        Self {
            kind: ChunkKind::Inline,
            start,
            end: start,
            width: 0.0,
            trailing: 0.0,
        }
    }
}

/// [§ 16.6 White space](https://www.w3.org/TR/CSS2/text.html#white-space-prop)
///
/// Soft wrap opportunities sit after wrapping spaces and around atomic
/// inlines.
fn chunks(units: &[Unit], atomic_width: &dyn Fn(BoxId) -> f32) -> Vec<Chunk> {
    fn close(out: &mut Vec<Chunk>, current: &mut Chunk, next: usize) {
        if current.end > current.start {
            out.push(*current);
        }
        *current = Chunk::empty(next);
    }
    let mut out = Vec::new();
    let mut current = Chunk::empty(0);
    for (i, unit) in units.iter().enumerate() {
        let single = |kind, width| Chunk {
            kind,
            start: i,
            end: i + 1,
            width,
            trailing: 0.0,
        };
        match unit.kind {
            UnitKind::ForcedBreak | UnitKind::Float | UnitKind::Absolute => {
                close(&mut out, &mut current, i);
                let kind = match unit.kind {
                    UnitKind::ForcedBreak => ChunkKind::Forced,
                    UnitKind::Float => ChunkKind::Float,
                    _ => ChunkKind::Absolute,
                };
                out.push(single(kind, 0.0));
                current = Chunk::empty(i + 1);
            }
            UnitKind::Atomic => {
                close(&mut out, &mut current, i);
                out.push(single(ChunkKind::Inline, atomic_width(unit.box_id)));
                current = Chunk::empty(i + 1);
            }
            UnitKind::Space { wraps, .. } => {
                current.end = i + 1;
                current.width += unit.width;
                current.trailing += unit.width;
                if wraps {
                    close(&mut out, &mut current, i + 1);
                }
            }
            UnitKind::Word | UnitKind::Marker => {
                current.end = i + 1;
                current.width += unit.width;
                current.trailing = 0.0;
            }
            UnitKind::OpenBox | UnitKind::CloseBox => {
                current.end = i + 1;
                current.width += unit.width;
            }
        }
    }
    close(&mut out, &mut current, units.len());
    out
}

/// [§ 10.3.5](https://www.w3.org/TR/CSS2/visudet.html#float-width)
///
/// Min-content and max-content widths of inline content. `sizes` gives the
/// outer (min, max) widths of atomic inlines and floats.
pub(crate) fn intrinsic_inline_sizes(units: &[Unit], sizes: &dyn Fn(BoxId) -> (f32, f32)) -> (f32, f32) {
    let mut min = 0.0_f32;
    for chunk in chunks(units, &|id| sizes(id).0) {
        match chunk.kind {
            ChunkKind::Inline => min = min.max(chunk.width - chunk.trailing),
            ChunkKind::Float => min = min.max(sizes(units[chunk.start].box_id).0),
            ChunkKind::Forced | ChunkKind::Absolute => {}
        }
    }
    let mut max = 0.0_f32;
    let mut line = 0.0_f32;
    let mut trailing = 0.0_f32;
    let mut floats = 0.0_f32;
    for chunk in chunks(units, &|id| sizes(id).1) {
        match chunk.kind {
            ChunkKind::Inline => {
                line += chunk.width;
                trailing = chunk.trailing;
            }
            ChunkKind::Forced => {
                max = max.max(line - trailing);
                line = 0.0;
                trailing = 0.0;
            }
            ChunkKind::Float => floats += sizes(units[chunk.start].box_id).1,
            ChunkKind::Absolute => {}
        }
    }
    (min, max.max(line - trailing) + floats)
}

/// True when the units produce at least one non-empty line box.
///
/// [§ 9.4.2](https://www.w3.org/TR/CSS2/visuren.html#inline-formatting)
///
/// "Line boxes that contain no text, no preserved white space, no inline
/// elements with non-zero margins, padding, or borders or other in-flow
/// content (such as images, inline blocks or inline tables), and do not end
/// with a preserved newline must be treated as zero-height line boxes."
fn is_line_content(unit: &Unit) -> bool {
    match unit.kind {
        UnitKind::Word | UnitKind::Atomic | UnitKind::ForcedBreak | UnitKind::Marker => true,
        UnitKind::Space { collapsible, .. } => !collapsible,
        UnitKind::OpenBox | UnitKind::CloseBox => unit.width > 0.0,
        UnitKind::Float | UnitKind::Absolute => false,
    }
}

/// Whether inline content produces any line box.
pub(crate) fn has_line_content(units: &[Unit]) -> bool {
    units.iter().any(is_line_content)
}

/// Everything line layout needs to know about its block container.
pub(crate) struct LineInput<'a> {
    pub boxes: &'a BoxTree,
    pub fonts: &'a FontDatabase,
    pub container: BoxId,
    pub units: &'a [Unit],
    /// Atomic inlines and floats, already laid out at an arbitrary position.
    pub placed: &'a BTreeMap<BoxId, FragmentId>,
    /// Content box left edge.
    pub left: f32,
    /// Content box right edge.
    pub right: f32,
    /// Top of the first line.
    pub top: f32,
    pub cb_width: f32,
}

/// Result of line layout.
#[derive(Debug, Default)]
pub(crate) struct LineOutput {
    pub lines: Vec<LineFragment>,
    /// Bottom of the last line.
    pub bottom: f32,
    /// Floats placed in the float context, in order.
    pub floats: Vec<FragmentId>,
    /// Static positions of absolutely positioned boxes.
    pub absolutes: Vec<(BoxId, f32, f32)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineEnd {
    Soft,
    Forced,
    Last,
}

struct TextPiece {
    style: StyleId,
    face: FaceId,
    size: f32,
    text: String,
    x: f32,
    width: f32,
    marker: bool,
}

struct OpenInline {
    box_id: BoxId,
    start_x: f32,
    has_start: bool,
    order: usize,
}

/// [§ 10.8.1 Leading and half-leading](https://www.w3.org/TR/CSS2/visudet.html#leading)
///
/// "Half the leading is added above A and the other half below D, giving
/// the glyphs and their leading a total height above the baseline of
/// A' = A + L/2 and a total depth of D' = D + L/2."
fn half_leading(fonts: &FontDatabase, style: &ComputedStyle) -> (f32, f32) {
    let (a, d) = fonts.primary_metrics(style);
    let leading = (style.used_line_height() - (a + d)) / 2.0;
    (a + leading, d + leading)
}

/// Builds line boxes one at a time.
struct LineBuilder<'a> {
    input: &'a LineInput<'a>,
    floats: &'a mut FloatContext,
    fragments: &'a mut FragmentTree,
    container_style: &'a ComputedStyle,
    first_line: Option<&'a ComputedStyle>,
    strut: (f32, f32),
    y: f32,
    left: f32,
    width: f32,
    current: Vec<usize>,
    used: f32,
    pending_floats: Vec<BoxId>,
    carried: Vec<BoxId>,
    out: LineOutput,
}

fn placed_margin_box(
    placed: &BTreeMap<BoxId, FragmentId>,
    fragments: &FragmentTree,
    id: BoxId,
) -> Option<(FragmentId, Rect)> {
    let fragment = *placed.get(&id)?;
    Some((fragment, fragments.get(fragment)?.margin_box()))
}

/// Lay out inline content into line boxes.
pub(crate) fn layout_lines(
    input: &LineInput<'_>,
    floats: &mut FloatContext,
    fragments: &mut FragmentTree,
) -> LineOutput {
    let boxes = input.boxes;
    let chunk_list = {
        let tree: &FragmentTree = fragments;
        chunks(input.units, &|id| {
            placed_margin_box(input.placed, tree, id).map_or(0.0, |(_, rect)| rect.width)
        })
    };
    let container_style = boxes.style(input.container);
    let first_line = boxes
        .get(input.container)
        .first_line
        .map(|id| boxes.style_by_id(id));
    let mut builder = LineBuilder {
        input,
        floats,
        fragments,
        container_style,
        first_line,
        strut: half_leading(input.fonts, container_style),
        y: input.top,
        left: input.left,
        width: input.right - input.left,
        current: Vec::new(),
        used: 0.0,
        pending_floats: Vec::new(),
        carried: Vec::new(),
        out: LineOutput::default(),
    };
    builder.start_line();
    for chunk in chunk_list {
        match chunk.kind {
            ChunkKind::Forced => {
                builder.current.push(chunk.start);
                builder.used += chunk.width;
                builder.finish_line(LineEnd::Forced);
            }
            ChunkKind::Float => builder.float(input.units[chunk.start].box_id),
            ChunkKind::Absolute => {
                let (x, y) = (builder.left + builder.used, builder.y);
                builder.out.absolutes.push((input.units[chunk.start].box_id, x, y));
            }
            ChunkKind::Inline => builder.add_chunk(chunk),
        }
    }
    builder.finish_line(LineEnd::Last);
    for id in std::mem::take(&mut builder.pending_floats) {
        let y = builder.y;
        builder.position_float(id, y);
    }
    builder.out.bottom = builder.y;
    builder.out
}

impl<'a> LineBuilder<'a> {
    fn band(&self, y: f32) -> (f32, f32) {
        let height = (self.strut.0 + self.strut.1).max(EPSILON);
        self.floats
            .available_within(y, height, self.input.left, self.input.right)
    }

    fn narrowed(&self) -> bool {
        self.width < self.input.right - self.input.left - EPSILON
    }

    fn start_line(&mut self) {
        (self.left, self.width) = self.band(self.y);
        for id in std::mem::take(&mut self.pending_floats) {
            let y = self.y;
            self.position_float(id, y);
        }
    }

    /// [§ 9.5.1 Positioning the float](https://www.w3.org/TR/CSS2/visuren.html#float-position)
    ///
    /// A float that fits beside the content already on the line is placed at
    /// the line's top; otherwise it waits for the next line.
    fn float(&mut self, id: BoxId) {
        let Some((_, rect)) = placed_margin_box(self.input.placed, self.fragments, id) else {
            return;
        };
        if self.current.is_empty() || self.used + rect.width <= self.width + EPSILON {
            let y = self.y;
            self.position_float(id, y);
        } else {
            self.pending_floats.push(id);
        }
    }

    fn position_float(&mut self, id: BoxId, y: f32) {
        let Some((fragment, rect)) = placed_margin_box(self.input.placed, self.fragments, id)
        else {
            return;
        };
        let side = self.input.boxes.style(id).float;
        let placed = self.floats.place_float_in(
            side,
            rect.width,
            rect.height,
            y,
            self.input.left,
            self.input.right,
        );
        self.fragments
            .translate(fragment, placed.x - rect.x, placed.y - rect.y);
        self.out.floats.push(fragment);
        (self.left, self.width) = self.band(self.y);
    }

    fn add_chunk(&mut self, chunk: Chunk) {
        loop {
            let needed = chunk.width - chunk.trailing;
            if self.used + needed <= self.width + EPSILON {
                break;
            }
            if self.current.is_empty() {
                // Move below the floats that make the line too narrow.
                if self.narrowed() {
                    if let Some(next) = self.floats.next_float_bottom_after(self.y) {
                        self.y = next;
                        (self.left, self.width) = self.band(self.y);
                        continue;
                    }
                }
                break;
            }
            self.finish_line(LineEnd::Soft);
        }
        self.current.extend(chunk.start..chunk.end);
        self.used += chunk.width;
    }

    fn unit(&self, index: usize) -> &'a Unit {
        &self.input.units[index]
    }

    /// [§ 16.6.1](https://www.w3.org/TR/CSS2/text.html#white-space-model)
    ///
    /// "If a space (U+0020) at the end of a line has 'white-space' set to
    /// 'normal', 'nowrap', or 'pre-line', it is also removed."
    fn trim_trailing_spaces(&self, items: &mut Vec<usize>) -> f32 {
        let mut removed = 0.0;
        let mut k = items.len();
        while k > 0 {
            let unit = self.unit(items[k - 1]);
            match unit.kind {
                UnitKind::Space {
                    collapsible: true, ..
                } => {
                    removed += unit.width;
                    let _ = items.remove(k - 1);
                }
                UnitKind::OpenBox | UnitKind::CloseBox | UnitKind::ForcedBreak => {}
                _ => break,
            }
            k -= 1;
        }
        removed
    }

    fn finish_line(&mut self, end: LineEnd) {
        let mut items = std::mem::take(&mut self.current);
        let used = self.used - self.trim_trailing_spaces(&mut items);
        self.used = 0.0;
        if !items.iter().any(|&i| is_line_content(self.unit(i))) {
            for &i in &items {
                let unit = self.unit(i);
                match unit.kind {
                    UnitKind::OpenBox => self.carried.push(unit.box_id),
                    UnitKind::CloseBox => {
                        let id = unit.box_id;
                        if let Some(pos) = self.carried.iter().rposition(|&b| b == id) {
                            let _ = self.carried.remove(pos);
                        }
                    }
                    _ => {}
                }
            }
            if end != LineEnd::Last {
                self.start_line();
            }
            return;
        }
        let line = self.build_line(&items, used, end);
        self.y += line.height;
        self.out.lines.push(line);
        if end != LineEnd::Last {
            self.start_line();
        }
    }

    /// [§ 10.8 Line height calculations](https://www.w3.org/TR/CSS2/visudet.html#line-height)
    ///
    /// "The line box height is the distance between the uppermost box top
    /// and the lowermost box bottom."
    fn line_metrics(&self, items: &[usize]) -> (f32, f32) {
        let fonts = self.input.fonts;
        let boxes = self.input.boxes;
        let (mut ascent, mut descent) = self.strut;
        for &i in items {
            let unit = self.unit(i);
            let (a, d) = match unit.kind {
                UnitKind::Atomic => {
                    let height = placed_margin_box(self.input.placed, self.fragments, unit.box_id)
                        .map_or(0.0, |(_, rect)| rect.height);
                    (height, 0.0)
                }
                UnitKind::Marker => match &boxes.get(unit.box_id).marker {
                    Some(MarkerContent::Image { size, .. }) => (size.1, 0.0),
                    _ => half_leading(fonts, boxes.style_by_id(unit.style)),
                },
                UnitKind::Float | UnitKind::Absolute => continue,
                _ => half_leading(fonts, boxes.style_by_id(unit.style)),
            };
            ascent = ascent.max(a);
            descent = descent.max(d);
        }
        let baseline = ascent.max(0.0);
        (baseline, baseline + descent.max(0.0))
    }

    fn build_line(&mut self, items: &[usize], used: f32, end: LineEnd) -> LineFragment {
        let boxes = self.input.boxes;
        let line_y = self.y;
        let (baseline, height) = self.line_metrics(items);
        let baseline_y = line_y + baseline;
        let is_first = self.out.lines.is_empty();

        // [§ 16.2 Alignment](https://www.w3.org/TR/CSS2/text.html#alignment-prop)
        let extra = self.width - used;
        let align = self.container_style.text_align;
        let gaps = items
            .iter()
            .filter(|&&i| matches!(self.unit(i).kind, UnitKind::Space { .. }))
            .count();
        let justify = align == TextAlign::Justify && end == LineEnd::Soft && extra > 0.0 && gaps > 0;
        #[allow(clippy::cast_precision_loss)]
        let gap_extra = if justify { extra / gaps as f32 } else { 0.0 };
        let offset = match align {
            TextAlign::Right => extra.max(0.0),
            TextAlign::Center => (extra / 2.0).max(0.0),
            TextAlign::Left | TextAlign::Justify => 0.0,
        };
        let start_x = self.left + offset;
        let mut x = start_x;

        let mut decorations: Vec<(usize, InlineFragment)> = Vec::new();
        let mut content: Vec<InlineFragment> = Vec::new();
        let mut open: Vec<OpenInline> = self
            .carried
            .iter()
            .enumerate()
            .map(|(order, &box_id)| OpenInline {
                box_id,
                start_x: x,
                has_start: false,
                order,
            })
            .collect();
        let mut next_order = open.len();
        let mut text: Option<TextPiece> = None;

        for &i in items {
            let unit = self.unit(i);
            match unit.kind {
                UnitKind::Word | UnitKind::Space { .. } => {
                    let is_space = matches!(unit.kind, UnitKind::Space { .. });
                    if is_space && justify {
                        self.flush_text(&mut text, &mut content, baseline_y, is_first);
                        x += unit.width + gap_extra;
                        continue;
                    }
                    for run in &unit.runs {
                        match &mut text {
                            Some(piece)
                                if piece.style == unit.style
                                    && piece.face == run.face
                                    && piece.size == run.size
                                    && !piece.marker =>
                            {
                                piece.text.push_str(&run.text);
                                piece.width += run.width;
                            }
                            _ => {
                                self.flush_text(&mut text, &mut content, baseline_y, is_first);
                                text = Some(TextPiece {
                                    style: unit.style,
                                    face: run.face,
                                    size: run.size,
                                    text: run.text.clone(),
                                    x,
                                    width: run.width,
                                    marker: false,
                                });
                            }
                        }
                        x += run.width;
                    }
                }
                UnitKind::Marker => {
                    self.flush_text(&mut text, &mut content, baseline_y, is_first);
                    let style = boxes.style_by_id(unit.style);
                    if let Some(MarkerContent::Image { src, size }) = &boxes.get(unit.box_id).marker
                    {
                        content.push(InlineFragment {
                            x,
                            y: baseline_y - size.1,
                            width: size.0,
                            height: size.1,
                            baseline: size.1,
                            visible: style.is_visible(),
                            content: InlineContent::MarkerImage { src: src.clone() },
                        });
                        x += size.0;
                        continue;
                    }
                    for run in &unit.runs {
                        text = Some(TextPiece {
                            style: unit.style,
                            face: run.face,
                            size: run.size,
                            text: run.text.clone(),
                            x,
                            width: run.width,
                            marker: true,
                        });
                        self.flush_text(&mut text, &mut content, baseline_y, is_first);
                        x += run.width;
                    }
                }
                UnitKind::OpenBox => {
                    self.flush_text(&mut text, &mut content, baseline_y, is_first);
                    let style = boxes.style_by_id(unit.style);
                    let has_start = boxes.get(unit.box_id).has_start_edge;
                    if has_start {
                        x += resolve_margins(style, self.input.cb_width).left;
                    }
                    open.push(OpenInline {
                        box_id: unit.box_id,
                        start_x: x,
                        has_start,
                        order: next_order,
                    });
                    next_order += 1;
                    if has_start {
                        x += border_widths(style).left
                            + resolve_edges(&style.padding, self.input.cb_width).left;
                    }
                }
                UnitKind::CloseBox => {
                    self.flush_text(&mut text, &mut content, baseline_y, is_first);
                    let style = boxes.style_by_id(unit.style);
                    let has_end = boxes.get(unit.box_id).has_end_edge;
                    if has_end {
                        x += border_widths(style).right
                            + resolve_edges(&style.padding, self.input.cb_width).right;
                    }
                    if let Some(pos) = open.iter().rposition(|o| o.box_id == unit.box_id) {
                        let piece = open.remove(pos);
                        if let Some(fragment) =
                            self.box_piece(piece.box_id, piece.start_x, x, piece.has_start, has_end, baseline_y)
                        {
                            decorations.push((piece.order, fragment));
                        }
                    }
                    if has_end {
                        x += resolve_margins(style, self.input.cb_width).right;
                    }
                }
                UnitKind::Atomic => {
                    self.flush_text(&mut text, &mut content, baseline_y, is_first);
                    let Some((fragment, rect)) =
                        placed_margin_box(self.input.placed, self.fragments, unit.box_id)
                    else {
                        continue;
                    };
                    let top = baseline_y - rect.height;
                    self.fragments.translate(fragment, x - rect.x, top - rect.y);
                    content.push(InlineFragment {
                        x,
                        y: top,
                        width: rect.width,
                        height: rect.height,
                        baseline: rect.height,
                        visible: boxes.style(unit.box_id).is_visible(),
                        content: InlineContent::Atomic { fragment },
                    });
                    x += rect.width;
                }
                UnitKind::ForcedBreak | UnitKind::Float | UnitKind::Absolute => {}
            }
        }
        self.flush_text(&mut text, &mut content, baseline_y, is_first);

        self.carried.clear();
        for piece in open {
            if let Some(fragment) =
                self.box_piece(piece.box_id, piece.start_x, x, piece.has_start, false, baseline_y)
            {
                decorations.push((piece.order, fragment));
            }
            self.carried.push(piece.box_id);
        }
        decorations.sort_by_key(|(order, _)| *order);

        let mut inlines = Vec::with_capacity(decorations.len() + content.len() + 1);
        if let Some(first_line) = self.first_line.filter(|_| is_first) {
            let background = first_line.background();
            if !background.is_transparent() {
                inlines.push(InlineFragment {
                    x: start_x,
                    y: line_y,
                    width: x - start_x,
                    height,
                    baseline,
                    visible: first_line.is_visible(),
                    content: InlineContent::Box(InlineBoxPaint {
                        background,
                        border: EdgeSizes::default(),
                        border_color: border_colors(first_line),
                        border_style: first_line.border_style,
                    }),
                });
            }
        }
        inlines.extend(decorations.into_iter().map(|(_, fragment)| fragment));
        inlines.extend(content);
        LineFragment {
            x: self.left,
            y: line_y,
            width: self.width,
            height,
            baseline,
            inlines,
        }
    }

    fn flush_text(
        &self,
        text: &mut Option<TextPiece>,
        content: &mut Vec<InlineFragment>,
        baseline_y: f32,
        is_first: bool,
    ) {
        let Some(piece) = text.take() else { return };
        let fonts = self.input.fonts;
        let style = self.input.boxes.style_by_id(piece.style);
        let metrics = &fonts.face(piece.face).metrics;
        let (ascent, descent) = (metrics.ascent(piece.size), metrics.descent(piece.size));
        let (mut color, mut decoration) = (style.color, style.text_decoration_lines);
        if let Some(first_line) = self.first_line.filter(|_| is_first) {
            if style.color == self.container_style.color {
                color = first_line.color;
            }
            decoration = decoration.union(first_line.text_decoration_lines);
        }
        let run = TextRun {
            text: piece.text,
            font: fonts.describe(piece.face, piece.size),
            color,
            decoration,
        };
        content.push(InlineFragment {
            x: piece.x,
            y: baseline_y - ascent,
            width: piece.width,
            height: ascent + descent,
            baseline: ascent,
            visible: style.is_visible(),
            content: if piece.marker {
                InlineContent::Marker(run)
            } else {
                InlineContent::Text(run)
            },
        });
    }

    /// [§ 10.6.1 Inline, non-replaced elements](https://www.w3.org/TR/CSS2/visudet.html#inline-non-replaced)
    ///
    /// "The vertical padding, border and margin of an inline, non-replaced
    /// box start at the top and bottom of the content area, and has nothing
    /// to do with the 'line-height'."
    fn box_piece(
        &self,
        id: BoxId,
        start_x: f32,
        end_x: f32,
        has_start: bool,
        has_end: bool,
        baseline_y: f32,
    ) -> Option<InlineFragment> {
        let style = self.input.boxes.style(id);
        let (ascent, descent) = self.input.fonts.primary_metrics(style);
        let mut padding = resolve_edges(&style.padding, self.input.cb_width);
        let mut border = border_widths(style);
        if !has_start {
            padding.left = 0.0;
            border.left = 0.0;
        }
        if !has_end {
            padding.right = 0.0;
            border.right = 0.0;
        }
        let background = style.background();
        let has_border = border.top > 0.0 || border.right > 0.0 || border.bottom > 0.0 || border.left > 0.0;
        if background.is_transparent() && !has_border {
            return None;
        }
        Some(InlineFragment {
            x: start_x,
            y: baseline_y - ascent - padding.top - border.top,
            width: (end_x - start_x).max(0.0),
            height: ascent + descent + padding.vertical() + border.vertical(),
            baseline: ascent + padding.top + border.top,
            visible: style.is_visible(),
            content: InlineContent::Box(InlineBoxPaint {
                background,
                border,
                border_color: border_colors(style),
                border_style: style.border_style,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::fragment::Fragment;

    fn unit(kind: UnitKind, width: f32) -> Unit {
        Unit::bare(kind, BoxId(0), StyleId(0), width)
    }

    const SPACE: UnitKind = UnitKind::Space {
        wraps: true,
        collapsible: true,
    };
    const NOWRAP_SPACE: UnitKind = UnitKind::Space {
        wraps: false,
        collapsible: true,
    };

    fn fragment<'t>(tree: &'t FragmentTree, label: &str) -> &'t Fragment {
        tree.fragments
            .iter()
            .find(|f| f.label == label)
            .unwrap_or_else(|| panic!("no fragment labelled {label}"))
    }

    #[test]
    fn test_normal_collapses_white_space_runs() {
        let mut collapse = true;
        let out = process_white_space("  a \n\t b  ", WhiteSpace::Normal, &mut collapse);
        assert_eq!(out, "a b ");
        assert!(collapse, "trailing space carries into the next text");
    }

    #[test]
    fn test_pre_line_keeps_newlines_and_trims_before_them() {
        let mut collapse = false;
        let out = process_white_space("a   \n  b", WhiteSpace::PreLine, &mut collapse);
        assert_eq!(out, "a\nb");
    }

    #[test]
    fn test_pre_expands_tabs_to_eight_columns() {
        let mut collapse = true;
        let out = process_white_space("ab\tc\r\n\td", WhiteSpace::Pre, &mut collapse);
        assert_eq!(out, "ab      c\n        d");
        assert!(!collapse);
    }

    #[test]
    fn test_capitalize_uses_word_start_state() {
        assert_eq!(
            transform_text("hello wide-world", TextTransform::Capitalize, true),
            "Hello Wide-world"
        );
        assert_eq!(transform_text("llo", TextTransform::Capitalize, false), "llo");
        assert_eq!(transform_text("Abc", TextTransform::Uppercase, true), "ABC");
    }

    #[test]
    fn test_chunks_break_after_wrapping_spaces() {
        let units = [
            unit(UnitKind::Word, 10.0),
            unit(SPACE, 5.0),
            unit(UnitKind::Word, 20.0),
        ];
        let chunks = chunks(&units, &|_| 0.0);
        assert_eq!(chunks.len(), 2);
        assert_eq!((chunks[0].width, chunks[0].trailing), (15.0, 5.0));
        assert_eq!((chunks[1].start, chunks[1].width), (2, 20.0));
    }

    #[test]
    fn test_nowrap_spaces_join_chunks() {
        let units = [
            unit(UnitKind::Word, 10.0),
            unit(NOWRAP_SPACE, 5.0),
            unit(UnitKind::Word, 20.0),
        ];
        assert_eq!(chunks(&units, &|_| 0.0).len(), 1);
        assert_eq!(intrinsic_inline_sizes(&units, &|_| (0.0, 0.0)), (35.0, 35.0));
    }

    #[test]
    fn test_intrinsic_sizes_with_forced_break_and_atomic() {
        let units = [
            unit(UnitKind::Word, 10.0),
            unit(SPACE, 5.0),
            unit(UnitKind::Word, 20.0),
            unit(UnitKind::ForcedBreak, 0.0),
            unit(UnitKind::Atomic, 0.0),
        ];
        let (min, max) = intrinsic_inline_sizes(&units, &|_| (30.0, 40.0));
        assert_eq!(min, 30.0);
        assert_eq!(max, 40.0);
    }

    #[test]
    fn test_collapsible_spaces_alone_make_no_line() {
        assert!(!has_line_content(&[unit(SPACE, 5.0)]));
        assert!(has_line_content(&[unit(UnitKind::ForcedBreak, 0.0)]));
    }

    #[test]
    fn test_words_wrap_onto_new_lines() {
        let tree = crate::layout_html("<div id=d style='width:40px'>aaa bbb ccc</div>", 400.0, 300.0);
        let div = fragment(&tree, "div#d");
        assert_eq!(div.lines.len(), 3);
        let ys: Vec<f32> = div.lines.iter().map(|l| l.y).collect();
        assert!(ys.windows(2).all(|w| w[0] < w[1]), "{ys:?}");
        assert!((div.height - 3.0 * 19.2).abs() < 0.01, "height {}", div.height);
    }

    #[test]
    fn test_text_align_right_and_center() {
        let tree = crate::layout_html(
            "<div id=r style='width:100px;text-align:right'>aaa</div><div id=c style='width:100px;text-align:center'>aaa</div>",
            400.0,
            300.0,
        );
        for (label, offset) in [("div#r", 76.0), ("div#c", 38.0)] {
            let line = &fragment(&tree, label).lines[0];
            let text = &line.inlines[0];
            assert!((text.x - line.x - offset).abs() < 0.01, "{label}: {}", text.x - line.x);
        }
    }

    #[test]
    fn test_br_forces_break() {
        let tree = crate::layout_html("<p id=p>a<br>b</p>", 400.0, 300.0);
        assert_eq!(fragment(&tree, "p#p").lines.len(), 2);
    }
}
