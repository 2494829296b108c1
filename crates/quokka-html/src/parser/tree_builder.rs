use std::collections::HashMap;
use std::fmt::Write;

use quokka_common::warning::warn_once;
use quokka_dom::{DomTree, ElementData, NodeId, NodeType};
use strum_macros::Display;

use crate::tokenizer::{Attribute, Token};

/// [§ 13.2.4.1 The insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-insertion-mode)
///
/// The modes this builder distinguishes. Table and template modes collapse
/// into [`InsertionMode::InBody`].
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum InsertionMode {
    /// No document element yet.
    BeforeHtml,
    /// Document element exists, no body yet.
    InHead,
    /// Inside the body.
    InBody,
    /// After `</body>` or `</html>`; content is still appended to the body.
    AfterBody,
}

/// [§ 13.2.2 Parse errors](https://html.spec.whatwg.org/multipage/parsing.html#parse-errors)
#[derive(Debug, Clone)]
pub struct ParseIssue {
    /// Description of the recovered error.
    pub message: String,
    /// Index into the token stream where this error was encountered.
    pub token_index: usize,
}

/// [§ 13.2.6.2 Void elements](https://html.spec.whatwg.org/multipage/syntax.html#void-elements)
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements that belong in `<head>` when seen before the body starts.
const HEAD_ELEMENTS: &[&str] = &[
    "base", "link", "meta", "noscript", "script", "style", "template", "title",
];

/// Start tags that close an open `<p>` element.
///
/// [§ 13.2.6.4.7](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inbody):
/// "If the stack of open elements has a p element in button scope, then close
/// a p element."
const CLOSES_P: &[&str] = &[
    "address", "article", "aside", "blockquote", "center", "details", "dialog", "dir", "div",
    "dl", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5",
    "h6", "header", "hgroup", "hr", "li", "dd", "dt", "main", "menu", "nav", "ol", "p", "pre",
    "section", "summary", "table", "ul",
];

/// Elements that bound the search for an implied end tag.
const SCOPE_BOUNDARIES: &[&str] = &[
    "applet", "caption", "html", "table", "td", "th", "marquee", "object", "template", "button",
];

const HEADINGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// [§ 13.2.6 Tree construction](https://html.spec.whatwg.org/multipage/parsing.html#tree-construction)
///
/// Builds a [`DomTree`] from a token stream. Never fails: the result always
/// has an `html` document element with `head` and `body` children.
pub struct HTMLParser {
    insertion_mode: InsertionMode,
    /// [§ 13.2.4.3 The stack of open elements](https://html.spec.whatwg.org/multipage/parsing.html#the-stack-of-open-elements)
    stack_of_open_elements: Vec<NodeId>,
    html_element: Option<NodeId>,
    head_element_pointer: Option<NodeId>,
    body_element: Option<NodeId>,
    /// Number of open elements per tag name, so scope checks on deep stacks
    /// can bail out without walking them.
    open_counts: HashMap<String, usize>,
    tree: DomTree,
    tokens: Vec<Token>,
    token_index: usize,
    issues: Vec<ParseIssue>,
}

impl HTMLParser {
    /// Create a new parser from a token stream.
    #[must_use]
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            insertion_mode: InsertionMode::BeforeHtml,
            stack_of_open_elements: Vec::new(),
            html_element: None,
            head_element_pointer: None,
            body_element: None,
            open_counts: HashMap::new(),
            tree: DomTree::new(),
            tokens,
            token_index: 0,
            issues: Vec::new(),
        }
    }

    /// Run the parser and return the DOM tree.
    #[must_use]
    pub fn run(self) -> DomTree {
        self.run_with_issues().0
    }

    /// Run the parser and return both the `DomTree` and any parse issues.
    #[must_use]
    pub fn run_with_issues(mut self) -> (DomTree, Vec<ParseIssue>) {
        let tokens = std::mem::take(&mut self.tokens);
        for (index, token) in tokens.iter().enumerate() {
            self.token_index = index;
            self.process_token(token);
        }
        let _ = self.ensure_body();
        (self.tree, self.issues)
    }

    fn parse_error(&mut self, message: &str) {
        warn_once("HTML Parser", message);
        self.issues.push(ParseIssue {
            message: message.to_string(),
            token_index: self.token_index,
        });
    }

    fn process_token(&mut self, token: &Token) {
        match token {
            Token::Doctype { .. } | Token::EndOfFile => {}
            Token::Comment { data } => {
                let parent = self.current_node().unwrap_or(NodeId::ROOT);
                let id = self.tree.alloc(NodeType::Comment(data.clone()));
                self.tree.append_child(parent, id);
            }
            Token::Character { data } => self.process_character(*data),
            Token::StartTag {
                name,
                self_closing,
                attributes,
            } => self.process_start_tag(name, *self_closing, attributes),
            Token::EndTag { name } => self.process_end_tag(name),
        }
    }

    fn current_node(&self) -> Option<NodeId> {
        self.stack_of_open_elements.last().copied()
    }

    fn push_open(&mut self, id: NodeId) {
        if let Some(tag) = self.tree.tag_name(id) {
            *self.open_counts.entry(tag.to_string()).or_default() += 1;
        }
        self.stack_of_open_elements.push(id);
    }

    fn pop_open(&mut self) -> Option<NodeId> {
        let id = self.stack_of_open_elements.pop()?;
        if let Some(tag) = self.tree.tag_name(id)
            && let Some(count) = self.open_counts.get_mut(tag)
        {
            *count = count.saturating_sub(1);
        }
        Some(id)
    }

    fn reset_open(&mut self, ids: &[NodeId]) {
        self.stack_of_open_elements.clear();
        self.open_counts.clear();
        for &id in ids {
            self.push_open(id);
        }
    }

    fn is_open(&self, tag: &str) -> bool {
        self.open_counts.get(tag).is_some_and(|&n| n > 0)
    }

    fn current_tag(&self) -> Option<&str> {
        self.current_node().and_then(|id| self.tree.tag_name(id))
    }

    fn create_element(&mut self, name: &str, attributes: &[Attribute]) -> NodeId {
        let mut data = ElementData::new(name);
        for attr in attributes {
            if !data.attrs.contains_key(&attr.name) {
                let _ = data.attrs.insert(attr.name.clone(), attr.value.clone());
            }
        }
        self.tree.alloc(NodeType::Element(data))
    }

    /// "Add the attribute and its corresponding value to that element" for
    /// every attribute not already present (used for repeated html/body tags).
    fn merge_attributes(&mut self, target: NodeId, attributes: &[Attribute]) {
        let Some(data) = self.tree.element_mut(target) else {
            return;
        };
        for attr in attributes {
            if !data.attrs.contains_key(&attr.name) {
                let _ = data.attrs.insert(attr.name.clone(), attr.value.clone());
            }
        }
    }

    fn ensure_html(&mut self) -> NodeId {
        if let Some(html) = self.html_element {
            return html;
        }
        let html = self.create_element("html", &[]);
        self.tree.append_child(NodeId::ROOT, html);
        self.html_element = Some(html);
        self.reset_open(&[html]);
        self.insertion_mode = InsertionMode::InHead;
        html
    }

    fn ensure_head(&mut self) -> NodeId {
        if let Some(head) = self.head_element_pointer {
            return head;
        }
        let html = self.ensure_html();
        let head = self.create_element("head", &[]);
        self.tree.append_child(html, head);
        self.head_element_pointer = Some(head);
        head
    }

    /// Create `<body>` if needed, closing anything left open in the head.
    fn ensure_body(&mut self) -> NodeId {
        if let Some(body) = self.body_element {
            return body;
        }
        let _ = self.ensure_head();
        let html = self.ensure_html();
        let body = self.create_element("body", &[]);
        self.tree.append_child(html, body);
        self.body_element = Some(body);
        self.reset_open(&[html, body]);
        self.insertion_mode = InsertionMode::InBody;
        body
    }

    fn process_character(&mut self, c: char) {
        let whitespace = matches!(c, '\t' | '\n' | '\x0C' | '\r' | ' ');
        match self.insertion_mode {
            InsertionMode::BeforeHtml | InsertionMode::InHead => {
                // Whitespace between head elements is dropped; anything else
                // starts the body.
                if whitespace && !self.in_head_element() {
                    return;
                }
                if !self.in_head_element() {
                    let _ = self.ensure_body();
                }
            }
            InsertionMode::InBody | InsertionMode::AfterBody => {}
        }
        let parent = self.current_node().unwrap_or_else(|| self.ensure_body());
        self.tree.append_text(parent, c.encode_utf8(&mut [0; 4]));
    }

    /// Whether the current node is an element inside `<head>` (e.g. `<title>`).
    ///
    /// While head content is open the stack is `[html, head, ...]`.
    fn in_head_element(&self) -> bool {
        self.head_element_pointer.is_some()
            && self.stack_of_open_elements.len() > 2
            && self.stack_of_open_elements.get(1).copied() == self.head_element_pointer
    }

    fn process_start_tag(&mut self, name: &str, self_closing: bool, attributes: &[Attribute]) {
        match name {
            "html" => {
                if let Some(html) = self.html_element {
                    self.merge_attributes(html, attributes);
                } else {
                    let html = self.create_element("html", attributes);
                    self.tree.append_child(NodeId::ROOT, html);
                    self.html_element = Some(html);
                    self.push_open(html);
                    self.insertion_mode = InsertionMode::InHead;
                }
                return;
            }
            "head" => {
                if self.head_element_pointer.is_none() && self.body_element.is_none() {
                    let html = self.ensure_html();
                    let head = self.create_element("head", attributes);
                    self.tree.append_child(html, head);
                    self.head_element_pointer = Some(head);
                } else {
                    self.parse_error("unexpected <head> start tag");
                }
                return;
            }
            "body" => {
                if let Some(body) = self.body_element {
                    self.merge_attributes(body, attributes);
                } else {
                    let body = self.ensure_body();
                    self.merge_attributes(body, attributes);
                }
                return;
            }
            _ => {}
        }

        if self.body_element.is_none() && HEAD_ELEMENTS.contains(&name) {
            let head = self.ensure_head();
            let element = self.create_element(name, attributes);
            self.tree.append_child(head, element);
            if !VOID_ELEMENTS.contains(&name) && !self_closing {
                let html = self.ensure_html();
                self.reset_open(&[html, head, element]);
            }
            return;
        }

        let _ = self.ensure_body();
        if self.in_head_element() {
            // A body-level tag inside e.g. an unclosed <title>: close it.
            self.pop_to_body();
        }
        self.apply_implied_end_tags(name);

        let parent = self.current_node().unwrap_or_else(|| self.ensure_body());
        let element = self.create_element(name, attributes);
        self.tree.append_child(parent, element);
        if !VOID_ELEMENTS.contains(&name) && !self_closing {
            self.push_open(element);
        }
    }

    fn pop_to_body(&mut self) {
        if let Some(body) = self.body_element {
            let html = self.ensure_html();
            self.reset_open(&[html, body]);
        }
    }

    /// [§ 13.2.6.3 Closing elements that have implied end tags](https://html.spec.whatwg.org/multipage/parsing.html#closing-elements-that-have-implied-end-tags)
    fn apply_implied_end_tags(&mut self, name: &str) {
        if CLOSES_P.contains(&name) && self.has_in_scope("p") {
            self.pop_until("p");
        }
        if HEADINGS.contains(&name) && self.current_tag().is_some_and(|t| HEADINGS.contains(&t)) {
            let _ = self.pop_open();
        }
        match name {
            "li" => {
                if self.has_in_list_scope("li") {
                    self.pop_until("li");
                }
            }
            "dd" | "dt" => {
                for tag in ["dd", "dt"] {
                    if self.has_in_scope(tag) {
                        self.pop_until(tag);
                    }
                }
            }
            "option" => {
                if self.current_tag() == Some("option") {
                    let _ = self.pop_open();
                }
            }
            _ => {}
        }
    }

    /// [§ 13.2.4.2 Has an element in scope](https://html.spec.whatwg.org/multipage/parsing.html#has-an-element-in-scope)
    fn has_in_scope(&self, target: &str) -> bool {
        self.has_in_scope_bounded(target, SCOPE_BOUNDARIES)
    }

    /// "Has an element in list item scope": also bounded by `ol` and `ul`.
    fn has_in_list_scope(&self, target: &str) -> bool {
        let mut bounds = SCOPE_BOUNDARIES.to_vec();
        bounds.extend(["ol", "ul"]);
        self.has_in_scope_bounded(target, &bounds)
    }

    fn has_in_scope_bounded(&self, target: &str, bounds: &[&str]) -> bool {
        if !self.is_open(target) {
            return false;
        }
        for &id in self.stack_of_open_elements.iter().rev() {
            let tag = self.tree.tag_name(id).unwrap_or_default();
            if tag == target {
                return true;
            }
            if bounds.contains(&tag) {
                return false;
            }
        }
        false
    }

    /// Pop elements until one named `target` has been popped. The `html` and
    /// `body` elements are never popped.
    fn pop_until(&mut self, target: &str) {
        while let Some(id) = self.current_node() {
            let tag = self.tree.tag_name(id).unwrap_or_default().to_string();
            if matches!(tag.as_str(), "html" | "body") {
                return;
            }
            let _ = self.pop_open();
            if tag == target {
                return;
            }
        }
    }

    fn process_end_tag(&mut self, name: &str) {
        match name {
            "html" | "body" => {
                if self.body_element.is_some() {
                    self.insertion_mode = InsertionMode::AfterBody;
                }
                return;
            }
            "head" => {
                if self.body_element.is_none() {
                    let html = self.ensure_html();
                    self.reset_open(&[html]);
                }
                return;
            }
            // "An end tag whose tag name is "br": Parse error. Drop the
            // attributes from the token, and act as described in the next entry;
            // i.e. act as if this was a "br" start tag token with no attributes"
            "br" => {
                self.parse_error("</br> treated as <br>");
                self.process_start_tag("br", false, &[]);
                return;
            }
            // "If the stack of open elements does not have a p element in button
            // scope, then this is a parse error; insert an HTML element for a "p"
            // start tag token with no attributes."
            "p" if !self.has_in_scope("p") => {
                self.parse_error("</p> without open <p>");
                self.process_start_tag("p", false, &[]);
            }
            _ => {}
        }

        if self.is_open(name) {
            self.pop_until(name);
        } else {
            self.parse_error(&format!("unmatched end tag </{name}>"));
        }
    }
}

/// Render a DOM subtree as an indented outline for debugging.
///
/// Walks with an explicit stack, so deep documents are fine.
#[must_use]
pub fn format_tree(tree: &DomTree, id: NodeId) -> String {
    let mut out = String::new();
    let mut stack = vec![(id, 0usize)];
    while let Some((node_id, indent)) = stack.pop() {
        let prefix = "  ".repeat(indent);
        let Some(node) = tree.get(node_id) else {
            continue;
        };
        let _ = match &node.node_type {
            NodeType::Document => writeln!(out, "{prefix}#document"),
            NodeType::Element(data) => {
                let attrs: String = data
                    .attrs
                    .iter()
                    .map(|(k, v)| format!(" {k}=\"{v}\""))
                    .collect();
                writeln!(out, "{prefix}<{}{attrs}>", data.tag_name)
            }
            NodeType::Text(data) => {
                let display = data.replace('\n', "\\n");
                writeln!(out, "{prefix}\"{display}\"")
            }
            NodeType::Comment(data) => writeln!(out, "{prefix}<!-- {data} -->"),
        };
        for &child in tree.children(node_id).iter().rev() {
            stack.push((child, indent + 1));
        }
    }
    out
}
