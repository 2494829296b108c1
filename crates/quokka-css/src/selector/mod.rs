//! CSS selector parsing and matching.
//!
//! Implements the CSS 2.1 selector grammar plus the attribute operators and
//! structural pseudo-classes of
//! [Selectors Level 3](https://www.w3.org/TR/selectors-3/).
//!
//! Selectors are parsed from the token prelude of a style rule. Any selector
//! in a comma group that fails to parse invalidates the whole group
//! ([CSS 2.1 § 4.1.7](https://www.w3.org/TR/CSS2/syndata.html#rule-sets)).

use std::collections::HashSet;

use quokka_dom::{DomTree, ElementData, NodeId, NodeType};
use serde::Serialize;
use strum_macros::{Display, EnumString};

use crate::tokenizer::{CSSToken, CSSTokenizer, HashType};

/// A single condition on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    /// [§ 6.1 Type selector](https://www.w3.org/TR/selectors-3/#type-selectors),
    /// stored lowercase.
    Type(String),
    /// [§ 6.2 Universal selector](https://www.w3.org/TR/selectors-3/#universal-selector)
    Universal,
    /// [§ 6.4 Class selectors](https://www.w3.org/TR/selectors-3/#class-html)
    Class(String),
    /// [§ 6.5 ID selectors](https://www.w3.org/TR/selectors-3/#id-selectors)
    Id(String),
    /// [§ 6.3 Attribute selectors](https://www.w3.org/TR/selectors-3/#attribute-selectors)
    Attribute(AttributeSelector),
    /// [§ 6.6 Pseudo-classes](https://www.w3.org/TR/selectors-3/#pseudo-classes)
    PseudoClass(PseudoClass),
}

/// Supported pseudo-classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PseudoClass {
    /// `:root`
    Root,
    /// `:first-child`
    FirstChild,
    /// `:last-child`
    LastChild,
    /// `:only-child`
    OnlyChild,
    /// `:first-of-type`
    FirstOfType,
    /// `:last-of-type`
    LastOfType,
    /// `:empty`
    Empty,
    /// `:link`: an `a` or `area` with `href`. Links are never visited.
    Link,
    /// `:enabled`
    Enabled,
    /// `:disabled`
    Disabled,
    /// `:checked`
    Checked,
    /// `:lang(code)`, stored lowercase.
    Lang(String),
    /// `:visited`, `:hover`, `:active`, `:focus`. These never match a static
    /// render but still count toward specificity.
    Dynamic(String),
}

/// Attribute selector operators. Names are lowercase, values as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeSelector {
    /// `[att]`
    Exists(String),
    /// `[att=val]`
    Equals(String, String),
    /// `[att~=val]`: whitespace-separated word match.
    Includes(String, String),
    /// `[att|=val]`: exact or followed by `-`.
    DashMatch(String, String),
    /// `[att^=val]`
    PrefixMatch(String, String),
    /// `[att$=val]`
    SuffixMatch(String, String),
    /// `[att*=val]`
    SubstringMatch(String, String),
}

/// [§ 7 Pseudo-elements](https://www.w3.org/TR/selectors-3/#pseudo-elements)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, Serialize,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum PseudoElement {
    /// `::before`
    Before,
    /// `::after`
    After,
    /// `::first-line`
    FirstLine,
    /// `::first-letter`
    FirstLetter,
}

/// A sequence of simple selectors applying to one element.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompoundSelector {
    /// Conditions, all of which must hold.
    pub simple_selectors: Vec<SimpleSelector>,
}

/// [§ 8 Combinators](https://www.w3.org/TR/selectors-3/#combinators)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Whitespace.
    Descendant,
    /// `>`
    Child,
    /// `+`
    NextSibling,
    /// `~`
    SubsequentSibling,
}

/// A chain of compounds. `combinators` runs right to left from the subject:
/// for `A > B C` the subject is `C` and the chain is
/// `[(Descendant, B), (Child, A)]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    /// The rightmost compound.
    pub subject: CompoundSelector,
    /// `(combinator, compound)` pairs going left from the subject.
    pub combinators: Vec<(Combinator, CompoundSelector)>,
}

/// [CSS 2.1 § 6.4.3](https://www.w3.org/TR/CSS2/cascade.html#specificity)
///
/// `(a, b, c, d)`: a is 1 for a `style` attribute, b counts ids, c counts
/// classes, attributes and pseudo-classes, d counts element names and
/// pseudo-elements. Compared lexicographically with no carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Specificity(pub u32, pub u32, pub u32, pub u32);

impl Specificity {
    /// Specificity of declarations in a `style` attribute.
    pub const INLINE: Self = Self(1, 0, 0, 0);
}

/// One member of a selector group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    /// The element part.
    pub complex: ComplexSelector,
    /// Trailing pseudo-element, if any.
    pub pseudo_element: Option<PseudoElement>,
    /// Precomputed specificity.
    pub specificity: Specificity,
}

impl Selector {
    /// Match the element part against `node`, ignoring any pseudo-element.
    #[must_use]
    pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        compound_matches(&self.complex.subject, tree, node) && self.matches_combinators(tree, node)
    }

    /// Walk the combinator chain with backtracking. A state `(i, n)` means
    /// "n is a candidate for compound i"; each state is explored at most once,
    /// so the cost is bounded by chain length times tree size.
    fn matches_combinators(&self, tree: &DomTree, subject: NodeId) -> bool {
        let chain = &self.complex.combinators;
        if chain.is_empty() {
            return true;
        }
        let mut seen: HashSet<(usize, NodeId)> = HashSet::new();
        let mut stack: Vec<(usize, NodeId)> = Vec::new();
        push_candidate(&mut stack, tree, 0, chain[0].0, subject);

        while let Some((i, node)) = stack.pop() {
            if !seen.insert((i, node)) {
                continue;
            }
            let (combinator, compound) = &chain[i];
            // A descendant or subsequent-sibling step may also be satisfied
            // further along the same axis.
            match combinator {
                Combinator::Descendant => {
                    if let Some(parent) = tree.parent(node) {
                        stack.push((i, parent));
                    }
                }
                Combinator::SubsequentSibling => {
                    if let Some(prev) = previous_element_sibling(tree, node) {
                        stack.push((i, prev));
                    }
                }
                Combinator::Child | Combinator::NextSibling => {}
            }
            if compound_matches(compound, tree, node) {
                if i + 1 == chain.len() {
                    return true;
                }
                push_candidate(&mut stack, tree, i + 1, chain[i + 1].0, node);
            }
        }
        false
    }
}

/// Push the first candidate for compound `i`, related to `from` by `combinator`.
fn push_candidate(
    stack: &mut Vec<(usize, NodeId)>,
    tree: &DomTree,
    i: usize,
    combinator: Combinator,
    from: NodeId,
) {
    let candidate = match combinator {
        Combinator::Descendant | Combinator::Child => tree.parent(from),
        Combinator::NextSibling | Combinator::SubsequentSibling => {
            previous_element_sibling(tree, from)
        }
    };
    if let Some(c) = candidate {
        stack.push((i, c));
    }
}

fn previous_element_sibling(tree: &DomTree, node: NodeId) -> Option<NodeId> {
    tree.preceding_siblings(node)
        .find(|&s| tree.as_element(s).is_some())
}

fn compound_matches(compound: &CompoundSelector, tree: &DomTree, node: NodeId) -> bool {
    let Some(element) = tree.as_element(node) else {
        return false;
    };
    compound
        .simple_selectors
        .iter()
        .all(|simple| simple_matches(simple, tree, node, element))
}

fn simple_matches(
    simple: &SimpleSelector,
    tree: &DomTree,
    node: NodeId,
    element: &ElementData,
) -> bool {
    match simple {
        SimpleSelector::Type(name) => element.tag_name.eq_ignore_ascii_case(name),
        SimpleSelector::Universal => true,
        SimpleSelector::Class(class) => element.has_class(class),
        SimpleSelector::Id(id) => element.id() == Some(id.as_str()),
        SimpleSelector::Attribute(attr) => attribute_matches(attr, element),
        SimpleSelector::PseudoClass(pc) => pseudo_class_matches(pc, tree, node, element),
    }
}

fn attribute_matches(selector: &AttributeSelector, element: &ElementData) -> bool {
    match selector {
        AttributeSelector::Exists(name) => element.attr(name).is_some(),
        AttributeSelector::Equals(name, val) => element.attr(name) == Some(val.as_str()),
        AttributeSelector::Includes(name, val) => element
            .attr(name)
            .is_some_and(|v| !val.is_empty() && v.split_ascii_whitespace().any(|w| w == val)),
        AttributeSelector::DashMatch(name, val) => element.attr(name).is_some_and(|v| {
            v == val || v.strip_prefix(val.as_str()).is_some_and(|rest| rest.starts_with('-'))
        }),
        AttributeSelector::PrefixMatch(name, val) => element
            .attr(name)
            .is_some_and(|v| !val.is_empty() && v.starts_with(val.as_str())),
        AttributeSelector::SuffixMatch(name, val) => element
            .attr(name)
            .is_some_and(|v| !val.is_empty() && v.ends_with(val.as_str())),
        AttributeSelector::SubstringMatch(name, val) => element
            .attr(name)
            .is_some_and(|v| !val.is_empty() && v.contains(val.as_str())),
    }
}

fn pseudo_class_matches(
    pc: &PseudoClass,
    tree: &DomTree,
    node: NodeId,
    element: &ElementData,
) -> bool {
    let same_type = |id: NodeId| {
        tree.as_element(id)
            .is_some_and(|e| e.tag_name == element.tag_name)
    };
    let is_element = |id: NodeId| tree.as_element(id).is_some();
    match pc {
        PseudoClass::Root => tree.document_element() == Some(node),
        PseudoClass::FirstChild => !tree.preceding_siblings(node).any(is_element),
        PseudoClass::LastChild => !tree.following_siblings(node).any(is_element),
        PseudoClass::OnlyChild => {
            !tree.preceding_siblings(node).any(is_element)
                && !tree.following_siblings(node).any(is_element)
        }
        PseudoClass::FirstOfType => !tree.preceding_siblings(node).any(same_type),
        PseudoClass::LastOfType => !tree.following_siblings(node).any(same_type),
        // "only element nodes and content nodes (such as DOM text nodes,
        // CDATA nodes, and entity references) whose data has a non-zero length"
        PseudoClass::Empty => tree.children(node).iter().all(|&c| {
            match tree.get(c).map(|n| &n.node_type) {
                Some(NodeType::Text(t)) => t.is_empty(),
                Some(NodeType::Comment(_)) => true,
                _ => false,
            }
        }),
        PseudoClass::Link => {
            matches!(element.tag_name.as_str(), "a" | "area") && element.attr("href").is_some()
        }
        PseudoClass::Enabled => is_form_control(element) && element.attr("disabled").is_none(),
        PseudoClass::Disabled => is_form_control(element) && element.attr("disabled").is_some(),
        PseudoClass::Checked => {
            (element.tag_name == "input" && element.attr("checked").is_some())
                || (element.tag_name == "option" && element.attr("selected").is_some())
        }
        // [CSS 2.1 § 5.11.4](https://www.w3.org/TR/CSS2/selector.html#lang)
        // "matches if the element is in language C ... exactly equal to C or
        // begins with C immediately followed by '-'"
        PseudoClass::Lang(code) => tree.language(node).is_some_and(|lang| {
            let lang = lang.to_ascii_lowercase();
            lang == *code
                || lang
                    .strip_prefix(code.as_str())
                    .is_some_and(|rest| rest.starts_with('-'))
        }),
        PseudoClass::Dynamic(_) => false,
    }
}

fn is_form_control(element: &ElementData) -> bool {
    matches!(
        element.tag_name.as_str(),
        "input" | "button" | "select" | "textarea" | "option" | "optgroup" | "fieldset"
    )
}

impl ComplexSelector {
    /// Sum the specificity of every compound in the chain.
    #[must_use]
    pub fn specificity(&self) -> Specificity {
        std::iter::once(&self.subject)
            .chain(self.combinators.iter().map(|(_, c)| c))
            .flat_map(|c| &c.simple_selectors)
            .fold(Specificity::default(), |mut spec, simple| {
                match simple {
                    SimpleSelector::Id(_) => spec.1 += 1,
                    SimpleSelector::Class(_)
                    | SimpleSelector::Attribute(_)
                    | SimpleSelector::PseudoClass(_) => spec.2 += 1,
                    SimpleSelector::Type(_) => spec.3 += 1,
                    SimpleSelector::Universal => {}
                }
                spec
            })
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a comma-separated selector group from prelude tokens.
///
/// Returns `None` if any member is invalid.
#[must_use]
pub fn parse_selector_list(tokens: &[CSSToken]) -> Option<Vec<Selector>> {
    let tokens: Vec<&CSSToken> = tokens.iter().filter(|t| !t.is_eof()).collect();
    let mut selectors = Vec::new();
    for group in tokens.split(|t| matches!(t, CSSToken::Comma)) {
        selectors.push(SelectorParser::new(group).parse()?);
    }
    Some(selectors)
}

/// Parse a selector group from source text.
#[must_use]
pub fn parse_selector(raw: &str) -> Option<Vec<Selector>> {
    parse_selector_list(&CSSTokenizer::tokenize(raw))
}

struct SelectorParser<'a> {
    tokens: &'a [&'a CSSToken],
    pos: usize,
}

impl<'a> SelectorParser<'a> {
    const fn new(tokens: &'a [&'a CSSToken]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&'a CSSToken> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<&'a CSSToken> {
        let t = self.peek();
        self.pos += 1;
        t
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(CSSToken::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    /// `compound (combinator compound)* pseudo-element?`
    fn parse(mut self) -> Option<Selector> {
        let _ = self.skip_whitespace();
        let mut compounds: Vec<CompoundSelector> = Vec::new();
        let mut combinators: Vec<Combinator> = Vec::new();
        let mut pseudo_element = None;

        loop {
            let (compound, pseudo) = self.parse_compound()?;
            compounds.push(compound);
            if pseudo.is_some() {
                pseudo_element = pseudo;
                let _ = self.skip_whitespace();
                if self.peek().is_some() {
                    return None;
                }
                break;
            }
            let had_space = self.skip_whitespace();
            let combinator = match self.peek() {
                None => break,
                Some(CSSToken::Delim('>')) => Combinator::Child,
                Some(CSSToken::Delim('+')) => Combinator::NextSibling,
                Some(CSSToken::Delim('~')) => Combinator::SubsequentSibling,
                Some(_) if had_space => Combinator::Descendant,
                Some(_) => return None,
            };
            if combinator != Combinator::Descendant {
                self.pos += 1;
                let _ = self.skip_whitespace();
            }
            combinators.push(combinator);
        }

        let subject = compounds.pop()?;
        let chain = combinators.into_iter().rev().zip(compounds.into_iter().rev()).collect();
        let complex = ComplexSelector {
            subject,
            combinators: chain,
        };
        let mut specificity = complex.specificity();
        if pseudo_element.is_some() {
            specificity.3 += 1;
        }
        Some(Selector {
            complex,
            pseudo_element,
            specificity,
        })
    }

    /// A compound, optionally ending in a pseudo-element.
    fn parse_compound(&mut self) -> Option<(CompoundSelector, Option<PseudoElement>)> {
        let mut compound = CompoundSelector::default();
        match self.peek() {
            Some(CSSToken::Ident(name)) => {
                compound.simple_selectors.push(SimpleSelector::Type(name.to_ascii_lowercase()));
                self.pos += 1;
            }
            Some(CSSToken::Delim('*')) => {
                compound.simple_selectors.push(SimpleSelector::Universal);
                self.pos += 1;
            }
            _ => {}
        }
        loop {
            match self.peek() {
                Some(CSSToken::Hash { value, hash_type: HashType::Id }) => {
                    compound.simple_selectors.push(SimpleSelector::Id(value.clone()));
                    self.pos += 1;
                }
                Some(CSSToken::Delim('.')) => {
                    self.pos += 1;
                    let Some(CSSToken::Ident(class)) = self.next() else {
                        return None;
                    };
                    compound.simple_selectors.push(SimpleSelector::Class(class.clone()));
                }
                Some(CSSToken::LeftBracket) => {
                    self.pos += 1;
                    let attr = self.parse_attribute()?;
                    compound.simple_selectors.push(SimpleSelector::Attribute(attr));
                }
                Some(CSSToken::Colon) => {
                    self.pos += 1;
                    if matches!(self.peek(), Some(CSSToken::Colon)) {
                        self.pos += 1;
                        let Some(CSSToken::Ident(name)) = self.next() else {
                            return None;
                        };
                        let pseudo = name.parse::<PseudoElement>().ok()?;
                        return Self::finish(compound, Some(pseudo));
                    }
                    match self.next()? {
                        CSSToken::Ident(name) => {
                            // CSS 2.1 single-colon pseudo-elements.
                            if let Ok(pseudo) = name.parse::<PseudoElement>() {
                                return Self::finish(compound, Some(pseudo));
                            }
                            let pc = parse_pseudo_class(name)?;
                            compound.simple_selectors.push(SimpleSelector::PseudoClass(pc));
                        }
                        CSSToken::Function(name) if name.eq_ignore_ascii_case("lang") => {
                            let _ = self.skip_whitespace();
                            let Some(CSSToken::Ident(code)) = self.next() else {
                                return None;
                            };
                            let _ = self.skip_whitespace();
                            if !matches!(self.next(), Some(CSSToken::RightParen)) {
                                return None;
                            }
                            let lang = PseudoClass::Lang(code.to_ascii_lowercase());
                            compound.simple_selectors.push(SimpleSelector::PseudoClass(lang));
                        }
                        _ => return None,
                    }
                }
                _ => break,
            }
        }
        Self::finish(compound, None)
    }

    fn finish(
        compound: CompoundSelector,
        pseudo: Option<PseudoElement>,
    ) -> Option<(CompoundSelector, Option<PseudoElement>)> {
        if compound.simple_selectors.is_empty() && pseudo.is_none() {
            return None;
        }
        Some((compound, pseudo))
    }

    /// After `[`: `name ws* (op ws* value ws*)? ]`
    fn parse_attribute(&mut self) -> Option<AttributeSelector> {
        let _ = self.skip_whitespace();
        let Some(CSSToken::Ident(name)) = self.next() else {
            return None;
        };
        let name = name.to_ascii_lowercase();
        let _ = self.skip_whitespace();
        let op = match self.next()? {
            CSSToken::RightBracket => return Some(AttributeSelector::Exists(name)),
            CSSToken::Delim('=') => '=',
            CSSToken::Delim(c @ ('~' | '|' | '^' | '$' | '*')) => {
                let c = *c;
                if !matches!(self.next(), Some(CSSToken::Delim('='))) {
                    return None;
                }
                c
            }
            _ => return None,
        };
        let _ = self.skip_whitespace();
        let value = match self.next()? {
            CSSToken::Ident(v) | CSSToken::String(v) => v.clone(),
            _ => return None,
        };
        let _ = self.skip_whitespace();
        if !matches!(self.next(), Some(CSSToken::RightBracket)) {
            return None;
        }
        Some(match op {
            '=' => AttributeSelector::Equals(name, value),
            '~' => AttributeSelector::Includes(name, value),
            '|' => AttributeSelector::DashMatch(name, value),
            '^' => AttributeSelector::PrefixMatch(name, value),
            '$' => AttributeSelector::SuffixMatch(name, value),
            _ => AttributeSelector::SubstringMatch(name, value),
        })
    }
}

fn parse_pseudo_class(name: &str) -> Option<PseudoClass> {
    let lower = name.to_ascii_lowercase();
    Some(match lower.as_str() {
        "root" => PseudoClass::Root,
        "first-child" => PseudoClass::FirstChild,
        "last-child" => PseudoClass::LastChild,
        "only-child" => PseudoClass::OnlyChild,
        "first-of-type" => PseudoClass::FirstOfType,
        "last-of-type" => PseudoClass::LastOfType,
        "empty" => PseudoClass::Empty,
        "link" => PseudoClass::Link,
        "enabled" => PseudoClass::Enabled,
        "disabled" => PseudoClass::Disabled,
        "checked" => PseudoClass::Checked,
        "visited" | "hover" | "active" | "focus" => PseudoClass::Dynamic(lower),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one(raw: &str) -> Selector {
        let mut list = parse_selector(raw).unwrap_or_else(|| panic!("'{raw}' should parse"));
        assert_eq!(list.len(), 1);
        list.remove(0)
    }

    fn tree() -> (DomTree, NodeId, NodeId, NodeId) {
        // <html><body><div id=main class="a b"><p lang=en-US>x</p><span></span></div></body></html>
        let mut t = DomTree::new();
        let html = t.alloc(NodeType::Element(ElementData::new("html")));
        t.append_child(NodeId::ROOT, html);
        let body = t.alloc(NodeType::Element(ElementData::new("body")));
        t.append_child(html, body);
        let div = t.alloc(NodeType::Element(
            ElementData::new("div").with_attr("id", "main").with_attr("class", "a b"),
        ));
        t.append_child(body, div);
        let p = t.alloc(NodeType::Element(ElementData::new("p").with_attr("lang", "en-US")));
        t.append_child(div, p);
        t.append_text(p, "x");
        let span = t.alloc(NodeType::Element(ElementData::new("span")));
        t.append_child(div, span);
        (t, div, p, span)
    }

    #[test]
    fn specificity_columns() {
        assert_eq!(one("*").specificity, Specificity(0, 0, 0, 0));
        assert_eq!(one("li").specificity, Specificity(0, 0, 0, 1));
        assert_eq!(one("ul ol+li").specificity, Specificity(0, 0, 0, 3));
        assert_eq!(one("h1 + *[rel=up]").specificity, Specificity(0, 0, 1, 1));
        assert_eq!(one("ul ol li.red").specificity, Specificity(0, 0, 1, 3));
        assert_eq!(one("li.red.level").specificity, Specificity(0, 0, 2, 1));
        assert_eq!(one("#x34y").specificity, Specificity(0, 1, 0, 0));
        assert_eq!(one("a:hover").specificity, Specificity(0, 0, 1, 1));
        assert_eq!(one("p::first-line").specificity, Specificity(0, 0, 0, 2));
    }

    #[test]
    fn invalid_member_invalidates_group() {
        assert!(parse_selector("p, a:nonsense").is_none());
        assert!(parse_selector("p, ").is_none());
        assert!(parse_selector("p::before span").is_none(), "pseudo-element must be last");
        assert!(parse_selector("p > > a").is_none());
        assert!(parse_selector("[a=]").is_none());
        assert!(parse_selector("p, div").is_some());
    }

    #[test]
    fn pseudo_element_forms() {
        assert_eq!(one("p:before").pseudo_element, Some(PseudoElement::Before));
        assert_eq!(one("p::AFTER").pseudo_element, Some(PseudoElement::After));
        assert_eq!(one("::first-letter").pseudo_element, Some(PseudoElement::FirstLetter));
    }

    #[test]
    fn matches_combinators() {
        let (t, div, p, span) = tree();
        assert!(one("body div > p").matches(&t, p));
        assert!(one("html p").matches(&t, p));
        assert!(!one("body > p").matches(&t, p));
        assert!(one("p + span").matches(&t, span));
        assert!(one("p ~ span").matches(&t, span));
        assert!(!one("span + p").matches(&t, p));
        assert!(one("DIV#main.a.b").matches(&t, div));
        assert!(!one("div.c").matches(&t, div));
    }

    #[test]
    fn descendant_chain_backtracks() {
        // <div class=x><div><div class=y><p>
        let mut t = DomTree::new();
        let outer = t.alloc(NodeType::Element(ElementData::new("div").with_attr("class", "x")));
        t.append_child(NodeId::ROOT, outer);
        let mid = t.alloc(NodeType::Element(ElementData::new("div")));
        t.append_child(outer, mid);
        let inner = t.alloc(NodeType::Element(ElementData::new("div").with_attr("class", "y")));
        t.append_child(mid, inner);
        let p = t.alloc(NodeType::Element(ElementData::new("p")));
        t.append_child(inner, p);
        // Nearest div ancestor (.y) is not a child of .x; the greedy choice fails.
        assert!(one(".x > div p").matches(&t, p));
    }

    #[test]
    fn pseudo_classes() {
        let (t, div, p, span) = tree();
        assert!(one("p:first-child").matches(&t, p));
        assert!(one("span:last-child").matches(&t, span));
        assert!(one("div:only-child").matches(&t, div));
        assert!(one("span:empty").matches(&t, span));
        assert!(!one("p:empty").matches(&t, p));
        assert!(one("p:lang(en)").matches(&t, p));
        assert!(!one("p:lang(e)").matches(&t, p));
        assert!(!one("p:hover").matches(&t, p));
        assert!(one(":root").matches(&t, NodeId(1)));
    }

    #[test]
    fn attribute_operators() {
        let (t, div, p, _) = tree();
        assert!(one("[id]").matches(&t, div));
        assert!(one("[class~=b]").matches(&t, div));
        assert!(one("[LANG|=en]").matches(&t, p));
        assert!(one("[id^=ma]").matches(&t, div));
        assert!(one("[id$=\"in\"]").matches(&t, div));
        assert!(one("[id*=ai]").matches(&t, div));
        assert!(!one("[id=Main]").matches(&t, div), "values are case-sensitive");
    }
}
