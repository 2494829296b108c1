//! Style resolution: selector matching, cascade ordering and inheritance.
//!
//! [CSS 2.1 § 6.4 The cascade](https://www.w3.org/TR/CSS2/cascade.html#cascade)
//!
//! Declarations are sorted by (importance and origin, specificity, rule
//! order, declaration order) and applied lowest first, so the last one
//! applied wins. `font-size` is resolved before everything else so that
//! `em` lengths on the same element see the final size.

use std::collections::BTreeMap;

use log::debug;
use quokka_common::warning::warn_once;
use quokka_dom::{DomTree, NodeId, NodeType};

use crate::parser::{Rule, Stylesheet, parse_inline_style, parse_stylesheet};
use crate::selector::{PseudoElement, Selector, Specificity, parse_selector_list};
use crate::style::{ComputedStyle, Display, PropertyDeclaration, PropertyId, parse_declaration};
use crate::ua_stylesheet::ua_stylesheet;

/// [§ 6.4.1 Cascading order](https://www.w3.org/TR/CSS2/cascade.html#cascading-order)
///
/// Ascending precedence. The variant order is the sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CascadeLevel {
    /// User-agent declarations (important or not).
    UserAgent,
    /// Normal author declarations, including the `style` attribute.
    AuthorNormal,
    /// `!important` author declarations.
    AuthorImportant,
}

/// A stylesheet's origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// The built-in defaults.
    UserAgent,
    /// `<style>` elements and `style` attributes.
    Author,
}

/// A parsed declaration block with its importance flags.
struct Block {
    declarations: Vec<(PropertyDeclaration, bool)>,
}

impl Block {
    fn from_raw(raw: &[crate::parser::Declaration]) -> Self {
        let declarations = raw
            .iter()
            .flat_map(|d| {
                parse_declaration(d)
                    .into_iter()
                    .filter(|p| !p.is_invalid())
                    .map(move |p| (p, d.important))
            })
            .collect();
        Self { declarations }
    }
}

/// One selector of one style rule, ready to match.
struct IndexedRule {
    selector: Selector,
    block: usize,
    origin: Origin,
    order: usize,
}

/// All rules that apply to a document, in cascade order.
pub struct RuleSet {
    rules: Vec<IndexedRule>,
    blocks: Vec<Block>,
}

impl RuleSet {
    /// Index the UA sheet followed by the author sheets.
    #[must_use]
    pub fn new(author_sheets: &[Stylesheet]) -> Self {
        let mut set = Self {
            rules: Vec::new(),
            blocks: Vec::new(),
        };
        set.add_sheet(ua_stylesheet(), Origin::UserAgent);
        for sheet in author_sheets {
            set.add_sheet(sheet, Origin::Author);
        }
        set
    }

    fn add_sheet(&mut self, sheet: &Stylesheet, origin: Origin) {
        // Nested @media blocks are flattened with an explicit stack.
        let mut stack: Vec<std::slice::Iter<'_, Rule>> = vec![sheet.rules.iter()];
        while let Some(iter) = stack.last_mut() {
            let Some(rule) = iter.next() else {
                let _ = stack.pop();
                continue;
            };
            match rule {
                Rule::Style(style) => {
                    let Some(selectors) = parse_selector_list(&style.prelude) else {
                        warn_once(
                            "CSS",
                            &format!("dropping rule with invalid selector '{}'", style.selector_text()),
                        );
                        continue;
                    };
                    let block = self.blocks.len();
                    self.blocks.push(Block::from_raw(&style.declarations));
                    let order = self.rules.len();
                    for selector in selectors {
                        self.rules.push(IndexedRule {
                            selector,
                            block,
                            origin,
                            order,
                        });
                    }
                }
                Rule::Media(media) if media.applies_to_screen() => stack.push(media.rules.iter()),
                Rule::Media(_) => {}
                Rule::At(name) => debug!("ignoring @{name} rule"),
            }
        }
    }

    /// Number of indexed selectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True when no selector was indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Sort key for one applicable declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct CascadeKey {
    level: CascadeLevel,
    specificity: Specificity,
    order: usize,
    index: usize,
}

/// Computed styles for every element of a document, plus its
/// pseudo-elements.
#[derive(Debug, Default)]
pub struct StyleMap {
    styles: Vec<Option<ComputedStyle>>,
    pseudo: BTreeMap<(NodeId, PseudoElement), ComputedStyle>,
}

impl StyleMap {
    /// Style of an element. `None` for non-elements and for descendants of
    /// `display: none` elements, which are never styled.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&ComputedStyle> {
        self.styles.get(id.0).and_then(Option::as_ref)
    }

    /// Style of a pseudo-element. `::before`/`::after` are present only when
    /// their `content` generates a box.
    #[must_use]
    pub fn pseudo(&self, id: NodeId, pseudo: PseudoElement) -> Option<&ComputedStyle> {
        self.pseudo.get(&(id, pseudo))
    }

    /// Number of styled elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.styles.iter().filter(|s| s.is_some()).count()
    }

    /// True when nothing was styled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Collect the text of every `<style>` element whose `media` applies, in
/// document order.
#[must_use]
pub fn author_stylesheets(tree: &DomTree) -> Vec<Stylesheet> {
    tree.descendants(NodeId::ROOT)
        .filter(|&id| tree.tag_name(id) == Some("style"))
        .filter(|&id| {
            tree.as_element(id)
                .and_then(|e| e.attr("media"))
                .is_none_or(|media| {
                    media.trim().is_empty()
                        || media
                            .split(',')
                            .any(|m| matches!(m.trim().to_ascii_lowercase().as_str(), "all" | "screen"))
                })
        })
        .map(|id| parse_stylesheet(&tree.text_content(id)))
        .collect()
}

/// Compute styles for a whole document from its own `<style>` sheets.
#[must_use]
pub fn compute_document_styles(tree: &DomTree) -> StyleMap {
    let rules = RuleSet::new(&author_stylesheets(tree));
    compute_styles(tree, &rules)
}

/// [§ 6 Assigning property values](https://www.w3.org/TR/CSS2/cascade.html)
///
/// Style every element in document order. The walk uses an explicit stack
/// so arbitrarily deep documents are fine.
#[must_use]
pub fn compute_styles(tree: &DomTree, rules: &RuleSet) -> StyleMap {
    let mut map = StyleMap {
        styles: vec![None; tree.len()],
        pseudo: BTreeMap::new(),
    };
    let initial = ComputedStyle::initial();
    let root_element = tree.document_element();
    let mut root_font_size = initial.font_size;

    let mut stack: Vec<NodeId> = tree.children(NodeId::ROOT).iter().rev().copied().collect();
    while let Some(id) = stack.pop() {
        let Some(node) = tree.get(id) else { continue };
        if !matches!(node.node_type, NodeType::Element(_)) {
            continue;
        }
        let parent = tree
            .parent(id)
            .and_then(|p| map.get(p))
            .unwrap_or(&initial)
            .clone();
        let is_root = Some(id) == root_element;
        let matched = matched_declarations(tree, id, rules);

        let inline = inline_declarations(tree, id);
        let style = cascade_with_inline(
            &parent,
            matched.get(&None).map_or(&[][..], Vec::as_slice),
            &inline,
            rules,
            is_root,
            root_font_size,
        );
        if is_root {
            root_font_size = style.font_size;
        }
        if style.display == Display::None {
            map.styles[id.0] = Some(style);
            continue;
        }

        for pseudo in [
            PseudoElement::Before,
            PseudoElement::After,
            PseudoElement::FirstLine,
            PseudoElement::FirstLetter,
        ] {
            let Some(entries) = matched.get(&Some(pseudo)) else {
                continue;
            };
            let pseudo_style = cascade(&style, entries, rules, false, root_font_size);
            let generates = match pseudo {
                PseudoElement::Before | PseudoElement::After => {
                    pseudo_style.content.generates_box() && pseudo_style.display != Display::None
                }
                PseudoElement::FirstLine | PseudoElement::FirstLetter => true,
            };
            if generates {
                let _ = map.pseudo.insert((id, pseudo), pseudo_style);
            }
        }

        map.styles[id.0] = Some(style);
        stack.extend(tree.children(id).iter().rev().copied());
    }
    map
}

/// A matched declaration: `(key, block index, declaration index)`.
type Entry = (CascadeKey, usize, usize);

/// Matching declarations grouped by target (the element or a pseudo-element).
fn matched_declarations(
    tree: &DomTree,
    id: NodeId,
    rules: &RuleSet,
) -> BTreeMap<Option<PseudoElement>, Vec<Entry>> {
    let mut matched: BTreeMap<Option<PseudoElement>, Vec<Entry>> = BTreeMap::new();
    for rule in &rules.rules {
        if !rule.selector.matches(tree, id) {
            continue;
        }
        let entries = matched.entry(rule.selector.pseudo_element).or_default();
        let block = &rules.blocks[rule.block];
        for (index, (_, important)) in block.declarations.iter().enumerate() {
            let level = match (rule.origin, important) {
                (Origin::UserAgent, _) => CascadeLevel::UserAgent,
                (Origin::Author, false) => CascadeLevel::AuthorNormal,
                (Origin::Author, true) => CascadeLevel::AuthorImportant,
            };
            entries.push((
                CascadeKey {
                    level,
                    specificity: rule.selector.specificity,
                    order: rule.order,
                    index,
                },
                rule.block,
                index,
            ));
        }
    }
    matched
}

/// Inline `style` declarations for an element, parsed on demand.
fn inline_declarations(tree: &DomTree, id: NodeId) -> Vec<(PropertyDeclaration, bool)> {
    tree.as_element(id)
        .and_then(|e| e.attr("style"))
        .map(|css| Block::from_raw(&parse_inline_style(css)).declarations)
        .unwrap_or_default()
}

/// Sort and apply matched declarations on top of the inherited style.
fn cascade(
    parent: &ComputedStyle,
    entries: &[Entry],
    rules: &RuleSet,
    is_root: bool,
    root_font_size: f32,
) -> ComputedStyle {
    cascade_with_inline(parent, entries, &[], rules, is_root, root_font_size)
}

fn cascade_with_inline(
    parent: &ComputedStyle,
    entries: &[Entry],
    inline: &[(PropertyDeclaration, bool)],
    rules: &RuleSet,
    is_root: bool,
    root_font_size: f32,
) -> ComputedStyle {
    let mut sorted: Vec<(CascadeKey, &PropertyDeclaration)> = entries
        .iter()
        .map(|&(key, block, index)| {
            (key, &rules.blocks[block].declarations[index].0)
        })
        .collect();
    sorted.extend(inline.iter().enumerate().map(|(index, (decl, important))| {
        let key = CascadeKey {
            level: if *important {
                CascadeLevel::AuthorImportant
            } else {
                CascadeLevel::AuthorNormal
            },
            specificity: Specificity::INLINE,
            order: usize::MAX,
            index,
        };
        (key, decl)
    }));
    sorted.sort_by_key(|(key, _)| *key);

    let mut style = ComputedStyle::inherit_from(parent);
    let is_font_size = |d: &PropertyDeclaration| d.property_id() == Some(PropertyId::FontSize);
    if let Some((_, decl)) = sorted.iter().rev().find(|(_, d)| is_font_size(d)) {
        style.apply(decl, parent, root_font_size);
    }
    let root_font_size = if is_root { style.font_size } else { root_font_size };
    for (_, decl) in sorted.iter().filter(|(_, d)| !is_font_size(d)) {
        style.apply(decl, parent, root_font_size);
    }
    style.finalize(is_root);
    style
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::Specificity;
    use crate::style::{FontStyle, LengthPercentageAuto, Side};
    use crate::values::Color;
    use quokka_dom::ElementData;

    fn styled(html: &str) -> (DomTree, StyleMap) {
        let tree = quokka_html::parse_document(html);
        let styles = compute_document_styles(&tree);
        (tree, styles)
    }

    fn find(tree: &DomTree, id_attr: &str) -> NodeId {
        tree.descendants(NodeId::ROOT)
            .find(|&n| tree.as_element(n).and_then(ElementData::id) == Some(id_attr))
            .expect("element with id")
    }

    #[test]
    fn test_specificity_beats_order() {
        let (tree, styles) = styled(
            "<style>#a { color: red } p { color: blue }</style><p id=a>x</p>",
        );
        let style = styles.get(find(&tree, "a")).unwrap();
        assert_eq!(style.color, Color::rgb(255, 0, 0));
    }

    #[test]
    fn test_later_rule_wins_at_equal_specificity() {
        let (tree, styles) = styled("<style>p { color: red } p { color: blue }</style><p id=a>x</p>");
        assert_eq!(styles.get(find(&tree, "a")).unwrap().color, Color::rgb(0, 0, 255));
    }

    #[test]
    fn test_important_beats_inline() {
        let (tree, styles) = styled(
            "<style>p { color: red !important }</style><p id=a style='color: blue'>x</p>",
        );
        assert_eq!(styles.get(find(&tree, "a")).unwrap().color, Color::rgb(255, 0, 0));
    }

    #[test]
    fn test_inline_beats_id() {
        let (tree, styles) = styled("<style>#a { color: red }</style><p id=a style='color: blue'>x</p>");
        assert_eq!(styles.get(find(&tree, "a")).unwrap().color, Color::rgb(0, 0, 255));
    }

    #[test]
    fn test_author_beats_user_agent() {
        let (tree, styles) = styled("<style>h1 { margin-top: 0 }</style><h1 id=a>x</h1>");
        let style = styles.get(find(&tree, "a")).unwrap();
        assert_eq!(style.margin.get(Side::Top), LengthPercentageAuto::Px(0.0));
        assert_eq!(style.font_size, 32.0);
    }

    #[test]
    fn test_em_uses_own_font_size() {
        let (tree, styles) = styled(
            "<style>div { font-size: 20px } p { margin-left: 2em; font-size: 10px }</style>\
             <div><p id=a>x</p></div>",
        );
        let style = styles.get(find(&tree, "a")).unwrap();
        assert_eq!(style.margin.get(Side::Left), LengthPercentageAuto::Px(20.0));
    }

    #[test]
    fn test_font_size_em_relative_to_parent() {
        let (tree, styles) = styled(
            "<style>div { font-size: 20px } p { font-size: 1.5em }</style><div><p id=a>x</p></div>",
        );
        assert_eq!(styles.get(find(&tree, "a")).unwrap().font_size, 30.0);
    }

    #[test]
    fn test_rem_uses_root_font_size() {
        let (tree, styles) = styled(
            "<style>html { font-size: 20px } p { width: 2rem }</style><p id=a>x</p>",
        );
        assert_eq!(styles.get(find(&tree, "a")).unwrap().width, LengthPercentageAuto::Px(40.0));
    }

    #[test]
    fn test_inheritance_and_explicit_inherit() {
        let (tree, styles) = styled(
            "<style>div { color: green; border-left: 2px solid } span { border-left-width: inherit }</style>\
             <div><span id=a>x</span></div>",
        );
        let style = styles.get(find(&tree, "a")).unwrap();
        assert_eq!(style.color, Color::rgb(0, 128, 0));
        assert_eq!(style.border_width.get(Side::Left), 0.0, "border style is still none");
    }

    #[test]
    fn test_display_none_subtree_unstyled() {
        let (tree, styles) = styled("<div id=a style='display:none'><p id=b>x</p></div>");
        assert!(styles.get(find(&tree, "a")).is_some());
        assert!(styles.get(find(&tree, "b")).is_none());
    }

    #[test]
    fn test_invalid_selector_drops_whole_rule() {
        let (tree, styles) = styled("<style>p, p:unknown-thing { color: red }</style><p id=a>x</p>");
        assert_eq!(styles.get(find(&tree, "a")).unwrap().color, Color::BLACK);
    }

    #[test]
    fn test_invalid_declaration_keeps_siblings() {
        let (tree, styles) = styled(
            "<style>p { color: red; margin-left: 10 ; font-style: italic }</style><p id=a>x</p>",
        );
        let style = styles.get(find(&tree, "a")).unwrap();
        assert_eq!(style.color, Color::rgb(255, 0, 0));
        assert_eq!(style.font_style, FontStyle::Italic);
        assert_eq!(style.margin.get(Side::Left), LengthPercentageAuto::ZERO);
    }

    #[test]
    fn test_print_media_ignored() {
        let (tree, styles) = styled(
            "<style>@media print { p { color: red } } @media screen { p { font-style: italic } }</style>\
             <style media=print>p { font-weight: bold }</style><p id=a>x</p>",
        );
        let style = styles.get(find(&tree, "a")).unwrap();
        assert_eq!(style.color, Color::BLACK);
        assert_eq!(style.font_style, FontStyle::Italic);
        assert_eq!(style.font_weight, 400);
    }

    #[test]
    fn test_before_requires_content() {
        let (tree, styles) = styled(
            "<style>#a:before { color: red } #b::after { content: 'x' }</style><p id=a>1</p><p id=b>2</p>",
        );
        assert!(styles.pseudo(find(&tree, "a"), PseudoElement::Before).is_none());
        assert!(styles.pseudo(find(&tree, "b"), PseudoElement::After).is_some());
    }

    #[test]
    fn test_float_blockified() {
        let (tree, styles) = styled("<span id=a style='float: left'>x</span>");
        assert_eq!(styles.get(find(&tree, "a")).unwrap().display, Display::Block);
    }

    #[test]
    fn test_cascade_level_order() {
        assert!(CascadeLevel::UserAgent < CascadeLevel::AuthorNormal);
        assert!(CascadeLevel::AuthorNormal < CascadeLevel::AuthorImportant);
        assert!(Specificity(0, 1, 0, 0) < Specificity::INLINE);
    }

    #[test]
    fn test_deep_document_does_not_overflow() {
        let html = format!("{}x{}", "<div>".repeat(5000), "</div>".repeat(5000));
        let (_, styles) = styled(&html);
        assert!(styles.len() > 5000);
    }
}
