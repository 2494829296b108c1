//! Box generation.
//!
//! [CSS 2.1 § 9.2 Controlling box generation](https://www.w3.org/TR/CSS2/visuren.html#box-gen)
//!
//! Turns the styled DOM into a tree of layout boxes: one box per rendered
//! element, text boxes for text, generated boxes for `::before`/`::after`
//! and `::first-letter`, list markers, and anonymous blocks around inline
//! runs that sit beside block-level siblings. Counters and quotes are
//! evaluated here because they depend on document order.

use log::trace;
use quokka_dom::{DomTree, NodeId, NodeType};

use super::replaced::{ImageResolver, presentational_size};
use crate::cascade::StyleMap;
use crate::generated::{
    CounterState, GeneratedPart, LIST_ITEM, QuoteState, evaluate_content, marker_text,
};
use crate::selector::PseudoElement;
use crate::style::{ComputedStyle, Display, Float, ListStylePosition, ListStyleType, WhiteSpace};

/// Index of a box in its [`BoxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BoxId(pub u32);

impl BoxId {
    const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a style in [`BoxTree::styles`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StyleId(pub u32);

/// [§ 9.2 Controlling box generation](https://www.w3.org/TR/CSS2/visuren.html#box-gen)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxType {
    /// A block container (`block`, and the table/flex/grid keywords).
    Block,
    /// `display: list-item`
    ListItem,
    /// An anonymous block around an inline run.
    AnonymousBlock,
    /// A non-replaced inline box.
    Inline,
    /// An atomic inline-level block container.
    InlineBlock,
    /// A replaced element.
    Replaced,
    /// A text run.
    Text,
    /// A forced line break (`<br>`).
    LineBreak,
    /// An inside list marker.
    Marker,
}

/// Content of a list marker.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerContent {
    /// Counter text or bullet glyph.
    Text(String),
    /// A `list-style-image`.
    Image {
        /// Image source.
        src: String,
        /// Intrinsic size.
        size: (f32, f32),
    },
}

/// One box.
#[derive(Debug, Clone)]
pub struct LayoutBox {
    /// Box type.
    pub kind: BoxType,
    /// Style; text boxes share their parent's.
    pub style: StyleId,
    /// Originating element, if any.
    pub node: Option<NodeId>,
    /// Diagnostic label such as `div#main` or `p::before`.
    pub label: String,
    /// Parent box.
    pub parent: Option<BoxId>,
    /// Child boxes in order.
    pub children: Vec<BoxId>,
    /// Text of text boxes.
    pub text: String,
    /// Image source and natural size of replaced boxes.
    pub image: Option<(Option<String>, (f32, f32))>,
    /// Outside marker of a list item, or the content of a marker box.
    pub marker: Option<MarkerContent>,
    /// False for the continuation pieces of a split inline that do not
    /// carry its start edge.
    pub has_start_edge: bool,
    /// False for split pieces that do not carry the end edge.
    pub has_end_edge: bool,
    /// Style of `::first-line`, for block containers.
    pub first_line: Option<StyleId>,
}

/// The box tree of one document.
#[derive(Debug, Clone, Default)]
pub struct BoxTree {
    /// All boxes.
    pub boxes: Vec<LayoutBox>,
    /// All styles.
    pub styles: Vec<ComputedStyle>,
    /// Box of the document element.
    pub root: Option<BoxId>,
}

impl BoxTree {
    /// Look up a box.
    #[must_use]
    pub fn get(&self, id: BoxId) -> &LayoutBox {
        &self.boxes[id.index()]
    }

    fn get_mut(&mut self, id: BoxId) -> &mut LayoutBox {
        &mut self.boxes[id.index()]
    }

    /// Style of a box.
    #[must_use]
    pub fn style(&self, id: BoxId) -> &ComputedStyle {
        self.style_by_id(self.get(id).style)
    }

    /// Look up a style.
    #[must_use]
    pub fn style_by_id(&self, id: StyleId) -> &ComputedStyle {
        &self.styles[id.0 as usize]
    }

    /// Children of a box.
    #[must_use]
    pub fn children(&self, id: BoxId) -> &[BoxId] {
        &self.get(id).children
    }

    /// Number of boxes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// True when nothing is rendered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Text and marker boxes borrow their parent's style.
    fn has_own_style(&self, id: BoxId) -> bool {
        !matches!(self.get(id).kind, BoxType::Text | BoxType::Marker)
    }

    /// Floated.
    #[must_use]
    pub fn is_float(&self, id: BoxId) -> bool {
        let style = self.style(id);
        self.has_own_style(id) && style.float != Float::None && !style.position.is_out_of_flow()
    }

    /// Absolutely positioned or fixed.
    #[must_use]
    pub fn is_absolute(&self, id: BoxId) -> bool {
        self.has_own_style(id) && self.style(id).position.is_out_of_flow()
    }

    /// Out of normal flow.
    #[must_use]
    pub fn is_out_of_flow(&self, id: BoxId) -> bool {
        self.is_float(id) || self.is_absolute(id)
    }

    /// An in-flow block-level box.
    #[must_use]
    pub fn is_block_level(&self, id: BoxId) -> bool {
        if self.is_out_of_flow(id) {
            return false;
        }
        match self.get(id).kind {
            BoxType::Block | BoxType::ListItem | BoxType::AnonymousBlock => true,
            BoxType::Replaced => self.style(id).display.is_block_level(),
            _ => false,
        }
    }

    /// Block containers lay out their children in a block or inline
    /// formatting context.
    #[must_use]
    pub fn is_block_container(&self, id: BoxId) -> bool {
        matches!(
            self.get(id).kind,
            BoxType::Block | BoxType::ListItem | BoxType::AnonymousBlock | BoxType::InlineBlock
        )
    }

    /// True when every in-flow child is inline-level.
    #[must_use]
    pub fn has_inline_content(&self, id: BoxId) -> bool {
        !self.children(id).iter().any(|&c| self.is_block_level(c))
    }

    /// [§ 9.4.1](https://www.w3.org/TR/CSS2/visuren.html#block-formatting)
    ///
    /// "Floats, absolutely positioned elements, block containers (such as
    /// inline-blocks, table-cells, and table-captions) that are not block
    /// boxes, and block boxes with 'overflow' other than 'visible' ...
    /// establish new block formatting contexts for their contents."
    #[must_use]
    pub fn establishes_bfc(&self, id: BoxId) -> bool {
        Some(id) == self.root
            || self.is_out_of_flow(id)
            || matches!(self.get(id).kind, BoxType::InlineBlock | BoxType::Replaced)
            || self.style(id).establishes_bfc()
    }

    /// Whether a text box is whitespace that disappears under its
    /// `white-space` rules.
    #[must_use]
    pub fn is_collapsible_whitespace(&self, id: BoxId) -> bool {
        let b = self.get(id);
        if b.kind != BoxType::Text {
            return false;
        }
        let ws = self.style(id).white_space;
        let blank = b.text.chars().all(|c| matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0C'));
        blank
            && match ws {
                WhiteSpace::Normal | WhiteSpace::Nowrap => true,
                WhiteSpace::PreLine => !b.text.contains('\n'),
                WhiteSpace::Pre | WhiteSpace::PreWrap => b.text.is_empty(),
            }
    }

    fn add_style(&mut self, style: ComputedStyle) -> StyleId {
        let id = StyleId(u32::try_from(self.styles.len()).unwrap_or(u32::MAX));
        self.styles.push(style);
        id
    }

    fn add_box(&mut self, kind: BoxType, style: StyleId, label: String, parent: Option<BoxId>) -> BoxId {
        let id = BoxId(u32::try_from(self.boxes.len()).unwrap_or(u32::MAX));
        self.boxes.push(LayoutBox {
            kind,
            style,
            node: None,
            label,
            parent,
            children: Vec::new(),
            text: String::new(),
            image: None,
            marker: None,
            has_start_edge: true,
            has_end_edge: true,
            first_line: None,
        });
        if let Some(parent) = parent {
            self.get_mut(parent).children.push(id);
        }
        id
    }

    fn add_text(&mut self, parent: BoxId, style: StyleId, text: &str) -> BoxId {
        let id = self.add_box(BoxType::Text, style, "#text".to_string(), Some(parent));
        self.get_mut(id).text = text.to_string();
        id
    }

    /// Boxes under `id` in post-order, `id` last.
    fn post_order(&self, id: BoxId) -> Vec<BoxId> {
        let mut out = Vec::new();
        let mut stack = vec![(id, false)];
        while let Some((current, expanded)) = stack.pop() {
            if expanded {
                out.push(current);
                continue;
            }
            stack.push((current, true));
            for &child in self.children(current).iter().rev() {
                stack.push((child, false));
            }
        }
        out
    }
}

enum Visit {
    Enter { node: NodeId, parent: Option<BoxId> },
    Exit { node: NodeId, element_box: BoxId },
}

/// Build the box tree for a styled document.
#[must_use]
pub fn build_box_tree(tree: &DomTree, styles: &StyleMap, images: &dyn ImageResolver) -> BoxTree {
    let mut boxes = BoxTree::default();
    let Some(root) = tree.document_element() else {
        return boxes;
    };
    let mut builder = Builder {
        tree,
        styles,
        images,
        boxes: &mut boxes,
        counters: CounterState::new(),
        quotes: QuoteState::default(),
        outer_quotes: Vec::new(),
    };
    builder.run(root);
    fixup_inline_splits(&mut boxes);
    wrap_inline_runs(&mut boxes);
    boxes
}

struct Builder<'a> {
    tree: &'a DomTree,
    styles: &'a StyleMap,
    images: &'a dyn ImageResolver,
    boxes: &'a mut BoxTree,
    counters: CounterState,
    /// Quote depth of the innermost block formatting context.
    quotes: QuoteState,
    /// Depths of the enclosing formatting contexts, with their roots.
    outer_quotes: Vec<(BoxId, QuoteState)>,
}

impl Builder<'_> {
    fn run(&mut self, root: NodeId) {
        let tree = self.tree;
        let mut stack = vec![Visit::Enter {
            node: root,
            parent: None,
        }];
        while let Some(visit) = stack.pop() {
            match visit {
                Visit::Enter { node, parent } => {
                    let Some(n) = tree.get(node) else { continue };
                    match &n.node_type {
                        NodeType::Text(text) => {
                            if let Some(parent) = parent {
                                if !text.is_empty() {
                                    let style = self.boxes.get(parent).style;
                                    let _ = self.boxes.add_text(parent, style, text);
                                }
                            }
                        }
                        NodeType::Element(_) => {
                            let Some(element_box) = self.enter_element(node, parent) else {
                                continue;
                            };
                            if matches!(
                                self.boxes.get(element_box).kind,
                                BoxType::Replaced | BoxType::LineBreak
                            ) {
                                continue;
                            }
                            stack.push(Visit::Exit { node, element_box });
                            for &child in tree.children(node).iter().rev() {
                                stack.push(Visit::Enter {
                                    node: child,
                                    parent: Some(element_box),
                                });
                            }
                        }
                        NodeType::Document | NodeType::Comment(_) => {}
                    }
                }
                Visit::Exit { node, element_box } => self.exit_element(node, element_box),
            }
        }
    }

    fn enter_element(&mut self, node: NodeId, parent: Option<BoxId>) -> Option<BoxId> {
        let styles = self.styles;
        let style = styles.get(node)?;
        if style.display == Display::None {
            return None;
        }
        let tree = self.tree;
        let images = self.images;
        let element = tree.as_element(node)?;
        let tag = element.tag_name.as_str();
        let int_attr = |name: &str| element.attr(name).and_then(|v| v.trim().parse::<i32>().ok());
        let list_start = if tag == "ol" { int_attr("start") } else { None };
        let item_value = if tag == "li" { int_attr("value") } else { None };
        self.counters.apply(style, list_start, item_value);

        let kind = match tag {
            "img" => BoxType::Replaced,
            "br" => BoxType::LineBreak,
            _ => kind_for_display(style.display),
        };
        let mut label = tag.to_string();
        if let Some(id) = element.id() {
            label.push('#');
            label.push_str(id);
        }
        let style_id = self.boxes.add_style(style.clone());
        let id = self.boxes.add_box(kind, style_id, label, parent);
        self.boxes.get_mut(id).node = Some(node);
        if parent.is_none() {
            self.boxes.root = Some(id);
        }
        trace!("box {:?} {:?} for <{tag}>", id, kind);

        if kind == BoxType::Replaced {
            let src = element.attr("src").map(str::to_string);
            let intrinsic = src.as_deref().and_then(|s| images.intrinsic_size(s));
            let px_attr = |name: &str| {
                element
                    .attr(name)
                    .and_then(|v| v.trim().trim_end_matches("px").parse::<f32>().ok())
                    .filter(|v| v.is_finite() && *v >= 0.0)
            };
            let size = presentational_size(intrinsic, px_attr("width"), px_attr("height"));
            self.boxes.get_mut(id).image = Some((src, size));
            self.counters.leave_childless();
            return Some(id);
        }
        if kind == BoxType::LineBreak {
            self.counters.leave_childless();
            return Some(id);
        }

        self.counters.enter_children();
        if self.boxes.establishes_bfc(id) {
            self.outer_quotes.push((id, std::mem::take(&mut self.quotes)));
        }
        if style.display == Display::ListItem {
            self.add_marker(id);
        }
        if let Some(before) = styles.pseudo(node, PseudoElement::Before) {
            self.generate_pseudo(node, id, before, "::before");
        }
        if let Some(first_line) = styles.pseudo(node, PseudoElement::FirstLine) {
            let first_line = self.boxes.add_style(first_line.clone());
            self.boxes.get_mut(id).first_line = Some(first_line);
        }
        Some(id)
    }

    fn exit_element(&mut self, node: NodeId, element_box: BoxId) {
        let styles = self.styles;
        if let Some(after) = styles.pseudo(node, PseudoElement::After) {
            self.generate_pseudo(node, element_box, after, "::after");
        }
        self.counters.leave_children();
        if self.outer_quotes.last().is_some_and(|&(root, _)| root == element_box) {
            self.quotes = self.outer_quotes.pop().map_or(self.quotes, |(_, quotes)| quotes);
        }
        if let Some(first_letter) = styles.pseudo(node, PseudoElement::FirstLetter) {
            if self.boxes.is_block_container(element_box) {
                apply_first_letter(self.boxes, element_box, first_letter);
            }
        }
    }

    /// [§ 12.5 Lists](https://www.w3.org/TR/CSS2/generate.html#lists)
    fn add_marker(&mut self, item: BoxId) {
        let style = self.boxes.style(item);
        let image = style
            .list_style_image
            .as_deref()
            .and_then(|src| self.images.intrinsic_size(src).map(|size| (src.to_string(), size)));
        let content = match image {
            Some((src, size)) => MarkerContent::Image { src, size },
            None if style.list_style_type == ListStyleType::None => return,
            None => {
                let value = self.counters.peek(LIST_ITEM).unwrap_or(0);
                MarkerContent::Text(marker_text(value, style.list_style_type))
            }
        };
        if style.list_style_position == ListStylePosition::Inside {
            let style_id = self.boxes.get(item).style;
            let marker = self.boxes.add_box(BoxType::Marker, style_id, "::marker".to_string(), Some(item));
            let content = match content {
                MarkerContent::Text(text) => MarkerContent::Text(format!("{text} ")),
                image @ MarkerContent::Image { .. } => image,
            };
            self.boxes.get_mut(marker).marker = Some(content);
        } else {
            self.boxes.get_mut(item).marker = Some(content);
        }
    }

    /// [§ 12.1 The :before and :after pseudo-elements](https://www.w3.org/TR/CSS2/generate.html#before-after-content)
    fn generate_pseudo(&mut self, node: NodeId, parent: BoxId, style: &ComputedStyle, suffix: &str) {
        self.counters.apply(style, None, None);
        let parts = evaluate_content(style, self.tree, node, &mut self.counters, &mut self.quotes);
        let kind = kind_for_display(style.display);
        let label = format!("{}{suffix}", self.boxes.get(parent).label);
        let style_id = self.boxes.add_style(style.clone());
        let id = self.boxes.add_box(kind, style_id, label, Some(parent));
        self.counters.enter_children();
        if style.display == Display::ListItem {
            self.add_marker(id);
        }
        self.counters.leave_children();
        for part in parts {
            match part {
                GeneratedPart::Text(text) => {
                    let _ = self.boxes.add_text(id, style_id, &text);
                }
                GeneratedPart::Image(src) => {
                    if let Some(size) = self.images.intrinsic_size(&src) {
                        let img_style = self.boxes.add_style(ComputedStyle {
                            display: Display::Inline,
                            ..ComputedStyle::inherit_from(style)
                        });
                        let img = self.boxes.add_box(BoxType::Replaced, img_style, "img".to_string(), Some(id));
                        self.boxes.get_mut(img).image = Some((Some(src), size));
                    }
                }
            }
        }
    }
}

const fn kind_for_display(display: Display) -> BoxType {
    match display {
        Display::Inline => BoxType::Inline,
        Display::ListItem => BoxType::ListItem,
        Display::InlineBlock | Display::InlineTable | Display::InlineFlex | Display::InlineGrid => {
            BoxType::InlineBlock
        }
        _ => BoxType::Block,
    }
}

/// [§ 5.12.2 The :first-letter pseudo-element](https://www.w3.org/TR/CSS2/selector.html#first-letter)
///
/// Wrap the first letter of the first line, with punctuation before and
/// after it, in an inline box (or a float) carrying the pseudo-element style.
fn apply_first_letter(boxes: &mut BoxTree, container: BoxId, style: &ComputedStyle) {
    let Some(text_box) = first_text_box(boxes, container) else {
        return;
    };
    let text = boxes.get(text_box).text.clone();
    let Some((leading, letter, rest)) = split_first_letter(&text) else {
        return;
    };
    let Some(parent) = boxes.get(text_box).parent else {
        return;
    };
    let kind = if style.float == Float::None {
        BoxType::Inline
    } else {
        BoxType::Block
    };
    let style_id = boxes.add_style(style.clone());
    let label = format!("{}::first-letter", boxes.get(container).label);
    let letter_box = boxes.add_box(kind, style_id, label, None);
    boxes.get_mut(letter_box).parent = Some(parent);
    let _ = boxes.add_text(letter_box, style_id, letter);

    let text_style = boxes.get(text_box).style;
    let mut replacement = Vec::new();
    if !leading.is_empty() {
        let lead = boxes.add_box(BoxType::Text, text_style, "#text".to_string(), None);
        boxes.get_mut(lead).text = leading.to_string();
        boxes.get_mut(lead).parent = Some(parent);
        replacement.push(lead);
    }
    replacement.push(letter_box);
    if rest.is_empty() {
        boxes.get_mut(text_box).text.clear();
    } else {
        boxes.get_mut(text_box).text = rest.to_string();
        replacement.push(text_box);
    }
    let siblings = &mut boxes.get_mut(parent).children;
    if let Some(pos) = siblings.iter().position(|&c| c == text_box) {
        let _ = siblings.splice(pos..=pos, replacement);
    }
}

/// First text box with visible characters, looking through inline boxes and
/// in-flow blocks but not past atomic content.
fn first_text_box(boxes: &BoxTree, container: BoxId) -> Option<BoxId> {
    let mut stack: Vec<BoxId> = boxes.children(container).iter().rev().copied().collect();
    while let Some(id) = stack.pop() {
        let b = boxes.get(id);
        match b.kind {
            BoxType::Text => {
                if !b.text.trim().is_empty() {
                    return Some(id);
                }
            }
            BoxType::Inline | BoxType::Block | BoxType::ListItem | BoxType::AnonymousBlock
                if !boxes.is_out_of_flow(id) =>
            {
                stack.extend(b.children.iter().rev().copied());
            }
            BoxType::Marker => {}
            BoxType::Inline | BoxType::Block | BoxType::ListItem | BoxType::AnonymousBlock => {}
            BoxType::InlineBlock | BoxType::Replaced | BoxType::LineBreak => return None,
        }
    }
    None
}

/// Split into leading whitespace, the first-letter text and the rest.
fn split_first_letter(text: &str) -> Option<(&str, &str, &str)> {
    let start = text.find(|c: char| !c.is_whitespace())?;
    let after_ws = &text[start..];
    let mut end = 0;
    let mut seen_letter = false;
    for (i, c) in after_ws.char_indices() {
        let punct = c.is_ascii_punctuation() || matches!(c, '\u{2018}'..='\u{201F}' | '«' | '»');
        if !seen_letter {
            end = i + c.len_utf8();
            if !punct {
                seen_letter = true;
            }
        } else if punct {
            end = i + c.len_utf8();
        } else {
            break;
        }
    }
    Some((&text[..start], &after_ws[..end], &after_ws[end..]))
}

/// [§ 9.2.1.1 Anonymous block boxes](https://www.w3.org/TR/CSS2/visuren.html#anonymous-block-level)
///
/// "When an inline box contains an in-flow block-level box, the inline box
/// (and its inline ancestors within the same line box) are broken around
/// the block-level box ... splitting the inline box into two boxes."
fn fixup_inline_splits(boxes: &mut BoxTree) {
    let Some(root) = boxes.root else { return };
    for id in boxes.post_order(root) {
        if boxes.get(id).kind != BoxType::Inline || boxes.is_out_of_flow(id) {
            continue;
        }
        if !boxes.children(id).iter().any(|&c| boxes.is_block_level(c)) {
            continue;
        }
        let Some(parent) = boxes.get(id).parent else { continue };
        let children = std::mem::take(&mut boxes.get_mut(id).children);
        let mut pieces: Vec<BoxId> = Vec::new();
        let mut current = Some(id);
        for child in children {
            if boxes.is_block_level(child) {
                if let Some(piece) = current.take() {
                    pieces.push(piece);
                }
                boxes.get_mut(child).parent = Some(parent);
                pieces.push(child);
                continue;
            }
            let piece = match current {
                Some(piece) => piece,
                None => {
                    let template = boxes.get(id).clone();
                    let piece = boxes.add_box(template.kind, template.style, template.label, None);
                    let b = boxes.get_mut(piece);
                    b.node = template.node;
                    b.parent = Some(parent);
                    b.has_start_edge = false;
                    current = Some(piece);
                    piece
                }
            };
            boxes.get_mut(child).parent = Some(piece);
            boxes.get_mut(piece).children.push(child);
        }
        if let Some(piece) = current {
            pieces.push(piece);
        }
        let inline_pieces: Vec<BoxId> = pieces
            .iter()
            .copied()
            .filter(|&p| boxes.get(p).kind == BoxType::Inline && boxes.get(p).node == boxes.get(id).node && !boxes.is_block_level(p))
            .collect();
        for (i, &piece) in inline_pieces.iter().enumerate() {
            let b = boxes.get_mut(piece);
            b.has_start_edge = i == 0 && piece == id;
            b.has_end_edge = i + 1 == inline_pieces.len() && b.has_end_edge;
        }
        let siblings = &mut boxes.get_mut(parent).children;
        if let Some(pos) = siblings.iter().position(|&c| c == id) {
            let _ = siblings.splice(pos..=pos, pieces);
        }
    }
}

/// [§ 9.2.1.1 Anonymous block boxes](https://www.w3.org/TR/CSS2/visuren.html#anonymous-block-level)
///
/// "If a block container box has a block-level box inside it, then we
/// force it to have only block-level boxes inside it."
fn wrap_inline_runs(boxes: &mut BoxTree) {
    let Some(root) = boxes.root else { return };
    for id in boxes.post_order(root) {
        if !boxes.is_block_container(id) {
            continue;
        }
        let children = boxes.children(id).to_vec();
        let has_block = children.iter().any(|&c| boxes.is_block_level(c));
        let has_inline = children
            .iter()
            .any(|&c| !boxes.is_block_level(c) && !boxes.is_out_of_flow(c) && !boxes.is_collapsible_whitespace(c));
        if !has_block {
            continue;
        }
        if !has_inline {
            let kept: Vec<BoxId> = children
                .into_iter()
                .filter(|&c| !boxes.is_collapsible_whitespace(c))
                .collect();
            boxes.get_mut(id).children = kept;
            continue;
        }
        let mut new_children = Vec::new();
        let mut run: Vec<BoxId> = Vec::new();
        let flush = |boxes: &mut BoxTree, run: &mut Vec<BoxId>, out: &mut Vec<BoxId>| {
            if run.is_empty() {
                return;
            }
            let meaningful = run
                .iter()
                .any(|&c| !boxes.is_out_of_flow(c) && !boxes.is_collapsible_whitespace(c));
            if meaningful {
                let parent_style = boxes.style(id).clone();
                let style = boxes.add_style(ComputedStyle {
                    display: Display::Block,
                    ..ComputedStyle::inherit_from(&parent_style)
                });
                let anon = boxes.add_box(BoxType::AnonymousBlock, style, "anonymous".to_string(), None);
                boxes.get_mut(anon).parent = Some(id);
                for &c in run.iter() {
                    boxes.get_mut(c).parent = Some(anon);
                }
                boxes.get_mut(anon).children = std::mem::take(run);
                out.push(anon);
            } else {
                out.extend(run.drain(..).filter(|&c| boxes.is_out_of_flow(c)));
            }
        };
        for child in children {
            if boxes.is_block_level(child) {
                flush(boxes, &mut run, &mut new_children);
                new_children.push(child);
            } else {
                run.push(child);
            }
        }
        flush(boxes, &mut run, &mut new_children);
        boxes.get_mut(id).children = new_children;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::compute_document_styles;
    use crate::layout::replaced::{NoImages, StaticImages};

    fn build(html: &str) -> BoxTree {
        let tree = quokka_html::parse_document(html);
        let styles = compute_document_styles(&tree);
        build_box_tree(&tree, &styles, &NoImages)
    }

    fn find(boxes: &BoxTree, label: &str) -> BoxId {
        let index = boxes.boxes.iter().position(|b| b.label == label).expect("box with label");
        BoxId(u32::try_from(index).unwrap())
    }

    fn kinds(boxes: &BoxTree, id: BoxId) -> Vec<BoxType> {
        boxes.children(id).iter().map(|&c| boxes.get(c).kind).collect()
    }

    #[test]
    fn test_display_none_generates_nothing() {
        let boxes = build("<div id=a><p style='display:none'>x</p><p>y</p></div>");
        let a = find(&boxes, "div#a");
        assert_eq!(kinds(&boxes, a), vec![BoxType::Block]);
    }

    #[test]
    fn test_anonymous_block_wraps_inline_run() {
        let boxes = build("<div id=a>text<p>block</p>more</div>");
        let a = find(&boxes, "div#a");
        assert_eq!(
            kinds(&boxes, a),
            vec![BoxType::AnonymousBlock, BoxType::Block, BoxType::AnonymousBlock]
        );
    }

    #[test]
    fn test_whitespace_between_blocks_dropped() {
        let boxes = build("<div id=a>\n  <p>1</p>\n  <p>2</p>\n</div>");
        let a = find(&boxes, "div#a");
        assert_eq!(kinds(&boxes, a), vec![BoxType::Block, BoxType::Block]);
    }

    #[test]
    fn test_whitespace_around_floats_between_blocks_dropped() {
        let boxes = build("<div id=a> <p>1</p> <span style='float:left'>f</span> <p>2</p> </div>");
        let a = find(&boxes, "div#a");
        assert_eq!(kinds(&boxes, a), vec![BoxType::Block; 3]);
    }

    #[test]
    fn test_block_inside_inline_splits_inline() {
        let boxes = build("<div id=a><span id=s>one<p>two</p>three</span></div>");
        let a = find(&boxes, "div#a");
        assert_eq!(
            kinds(&boxes, a),
            vec![BoxType::AnonymousBlock, BoxType::Block, BoxType::AnonymousBlock]
        );
        let pieces: Vec<&LayoutBox> = boxes.boxes.iter().filter(|b| b.label == "span#s").collect();
        assert_eq!(pieces.len(), 2);
        assert!(pieces.iter().any(|p| p.has_start_edge && !p.has_end_edge));
        assert!(pieces.iter().any(|p| !p.has_start_edge && p.has_end_edge));
    }

    #[test]
    fn test_list_item_markers() {
        let boxes = build("<ol><li id=a>x</li><li id=b>y</li></ol><ul><li id=c style='list-style-position:inside'>z</li></ul>");
        assert_eq!(boxes.get(find(&boxes, "li#a")).marker, Some(MarkerContent::Text("1.".into())));
        assert_eq!(boxes.get(find(&boxes, "li#b")).marker, Some(MarkerContent::Text("2.".into())));
        let c = find(&boxes, "li#c");
        assert_eq!(boxes.get(c).marker, None);
        let first = boxes.children(c)[0];
        assert_eq!(boxes.get(first).marker, Some(MarkerContent::Text("\u{2022} ".into())));
    }

    #[test]
    fn test_ol_start_and_li_value() {
        let boxes = build("<ol start=5><li id=a>x</li><li id=b value=10>y</li><li id=c>z</li></ol>");
        assert_eq!(boxes.get(find(&boxes, "li#a")).marker, Some(MarkerContent::Text("5.".into())));
        assert_eq!(boxes.get(find(&boxes, "li#b")).marker, Some(MarkerContent::Text("10.".into())));
        assert_eq!(boxes.get(find(&boxes, "li#c")).marker, Some(MarkerContent::Text("11.".into())));
    }

    #[test]
    fn test_list_style_none_suppresses_marker() {
        let boxes = build("<ul style='list-style-type:none'><li id=a>x</li></ul>");
        assert_eq!(boxes.get(find(&boxes, "li#a")).marker, None);
    }

    #[test]
    fn test_list_style_image_wins_when_resolved() {
        let tree = quokka_html::parse_document(
            "<ul><li id=a style='list-style-image:url(dot.png)'>x</li><li id=b style='list-style-image:url(missing.png)'>y</li></ul>",
        );
        let styles = compute_document_styles(&tree);
        let images = StaticImages::default().with("dot.png", 6.0, 6.0);
        let boxes = build_box_tree(&tree, &styles, &images);
        assert!(matches!(boxes.get(find(&boxes, "li#a")).marker, Some(MarkerContent::Image { .. })));
        assert_eq!(boxes.get(find(&boxes, "li#b")).marker, Some(MarkerContent::Text("\u{2022}".into())));
    }

    #[test]
    fn test_before_after_generated_in_order() {
        let boxes = build("<style>p:before{content:'[' counter(c) '] '} p:after{content:'!'} p{counter-increment:c}</style><p id=a>x</p><p id=b>y</p>");
        let b = find(&boxes, "p#b");
        let children = boxes.children(b);
        assert_eq!(boxes.get(children[0]).label, "p#b::before");
        assert_eq!(boxes.get(boxes.children(children[0])[0]).text, "[2] ");
        assert_eq!(boxes.get(*children.last().unwrap()).label, "p#b::after");
    }

    #[test]
    fn test_first_letter_split() {
        let boxes = build("<style>p::first-letter{color:red}</style><p id=a>  \"Hello</p>");
        let a = find(&boxes, "p#a");
        let texts: Vec<String> = boxes
            .children(a)
            .iter()
            .map(|&c| match boxes.get(c).kind {
                BoxType::Text => boxes.get(c).text.clone(),
                _ => format!("[{}]", boxes.get(boxes.children(c)[0]).text),
            })
            .collect();
        assert_eq!(texts, vec!["  ".to_string(), "[\"H]".to_string(), "ello".to_string()]);
    }

    #[test]
    fn test_split_first_letter_punctuation() {
        assert_eq!(split_first_letter("\"A\" b"), Some(("", "\"A\"", " b")));
        assert_eq!(split_first_letter("   "), None);
        assert_eq!(split_first_letter("x"), Some(("", "x", "")));
    }

    #[test]
    fn test_image_size_from_attributes() {
        let boxes = build("<img id=i width=40 height=30>");
        let img = boxes.get(find(&boxes, "img#i"));
        assert_eq!(img.kind, BoxType::Replaced);
        assert_eq!(img.image, Some((None, (40.0, 30.0))));
    }
}
