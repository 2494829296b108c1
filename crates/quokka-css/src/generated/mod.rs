//! Generated content: counters, quotes and list marker text.
//!
//! [CSS 2.1 § 12 Generated content, automatic numbering, and lists](https://www.w3.org/TR/CSS2/generate.html)

/// Counter scopes and quote nesting.
pub mod counters;
/// Numbering systems.
pub mod numbering;

pub use counters::{CounterState, LIST_ITEM, QuoteState};
pub use numbering::{format_counter, marker_text};

use quokka_dom::{DomTree, NodeId};

use crate::style::{ComputedStyle, Content, ContentItem};

/// One evaluated piece of a `content` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedPart {
    /// Text to insert.
    Text(String),
    /// An image reference from `url(...)`.
    Image(String),
}

/// [§ 12.2 The 'content' property](https://www.w3.org/TR/CSS2/generate.html#content)
///
/// Evaluate a pseudo-element's `content` against the counter and quote state
/// at its position. Adjacent text parts are merged.
pub fn evaluate_content(
    style: &ComputedStyle,
    tree: &DomTree,
    element: NodeId,
    counters: &mut CounterState,
    quotes: &mut QuoteState,
) -> Vec<GeneratedPart> {
    let Content::Items(items) = &style.content else {
        return Vec::new();
    };
    let mut parts: Vec<GeneratedPart> = Vec::new();
    for item in items {
        match item {
            ContentItem::String { value } => push_text(&mut parts, value),
            ContentItem::Attr { name } => {
                let value = tree.as_element(element).and_then(|e| e.attr(name)).unwrap_or("");
                push_text(&mut parts, value);
            }
            ContentItem::Counter { name, style: numbering } => {
                let value = counters.value(name);
                push_text(&mut parts, &format_counter(value, *numbering));
            }
            ContentItem::Counters {
                name,
                separator,
                style: numbering,
            } => {
                let text = counters
                    .values(name)
                    .into_iter()
                    .map(|v| format_counter(v, *numbering))
                    .collect::<Vec<_>>()
                    .join(separator);
                push_text(&mut parts, &text);
            }
            ContentItem::OpenQuote => {
                if let Some(text) = quotes.open(&style.quotes) {
                    push_text(&mut parts, text);
                }
            }
            ContentItem::CloseQuote => {
                if let Some(text) = quotes.close(&style.quotes) {
                    push_text(&mut parts, text);
                }
            }
            ContentItem::NoOpenQuote => quotes.skip_open(),
            ContentItem::NoCloseQuote => quotes.skip_close(),
            ContentItem::Url { url } => parts.push(GeneratedPart::Image(url.clone())),
        }
    }
    parts
}

fn push_text(parts: &mut Vec<GeneratedPart>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(GeneratedPart::Text(last)) = parts.last_mut() {
        last.push_str(text);
    } else {
        parts.push(GeneratedPart::Text(text.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::ListStyleType;

    fn style_with(items: Vec<ContentItem>) -> ComputedStyle {
        ComputedStyle {
            content: Content::Items(items),
            ..ComputedStyle::initial()
        }
    }

    #[test]
    fn test_counters_joined_with_separator() {
        let tree = quokka_html::parse_document("<p>x</p>");
        let mut counters = CounterState::new();
        counters.reset("s", 1);
        counters.enter_children();
        counters.reset("s", 3);
        let style = style_with(vec![ContentItem::Counters {
            name: "s".into(),
            separator: ".".into(),
            style: ListStyleType::UpperRoman,
        }]);
        let parts = evaluate_content(&style, &tree, NodeId::ROOT, &mut counters, &mut QuoteState::default());
        assert_eq!(parts, vec![GeneratedPart::Text("I.III".into())]);
    }

    #[test]
    fn test_attr_and_strings_merge() {
        let tree = quokka_html::parse_document("<a href='/x'>x</a>");
        let a = tree
            .descendants(NodeId::ROOT)
            .find(|&n| tree.tag_name(n) == Some("a"))
            .unwrap();
        let style = style_with(vec![
            ContentItem::String { value: "(".into() },
            ContentItem::Attr { name: "href".into() },
            ContentItem::Attr { name: "missing".into() },
            ContentItem::String { value: ")".into() },
        ]);
        let parts = evaluate_content(&style, &tree, a, &mut CounterState::new(), &mut QuoteState::default());
        assert_eq!(parts, vec![GeneratedPart::Text("(/x)".into())]);
    }

    #[test]
    fn test_quotes_track_depth() {
        let tree = quokka_html::parse_document("");
        let mut quotes = QuoteState::default();
        let open = style_with(vec![ContentItem::OpenQuote, ContentItem::OpenQuote]);
        let close = style_with(vec![ContentItem::CloseQuote, ContentItem::CloseQuote, ContentItem::CloseQuote]);
        let mut counters = CounterState::new();
        let o = evaluate_content(&open, &tree, NodeId::ROOT, &mut counters, &mut quotes);
        assert_eq!(o, vec![GeneratedPart::Text("\u{201C}\u{2018}".into())]);
        let c = evaluate_content(&close, &tree, NodeId::ROOT, &mut counters, &mut quotes);
        assert_eq!(c, vec![GeneratedPart::Text("\u{2019}\u{201D}".into())]);
        assert_eq!(quotes.depth(), 0);
    }
}
