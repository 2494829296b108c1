//! Delta minimization of failing inputs.
//!
//! Given an input and a predicate that holds for it, repeatedly remove
//! structure while the predicate keeps holding: whole elements first, then
//! attributes, then runs of characters of shrinking length. The result is
//! locally minimal: no single removal tried by the last round preserves the
//! predicate.
//!
//! The minimizer knows nothing about the engine; the predicate is the only
//! connection.

use std::ops::Range;

/// Elements without end tags.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Shrink `input` while `predicate` holds. Returns `input` unchanged when
/// the predicate does not hold for it.
pub fn minimize(input: &str, predicate: impl Fn(&str) -> bool) -> String {
    if !predicate(input) {
        return input.to_string();
    }
    let mut current = input.to_string();
    loop {
        let before = current.len();
        current = remove_spans(current, element_spans, &predicate);
        current = remove_spans(current, attribute_spans, &predicate);
        current = remove_characters(&current, &predicate);
        if current.len() >= before {
            return current;
        }
    }
}

/// Try removing each span in turn, recomputing spans after every accepted
/// removal.
fn remove_spans(
    mut current: String,
    spans_of: fn(&str) -> Vec<Range<usize>>,
    predicate: &impl Fn(&str) -> bool,
) -> String {
    let mut index = 0;
    loop {
        let spans = spans_of(&current);
        let Some(span) = spans.get(index) else {
            return current;
        };
        let candidate = [&current[..span.start], &current[span.end..]].concat();
        if !span.is_empty() && predicate(&candidate) {
            current = candidate;
        } else {
            index += 1;
        }
    }
}

/// Remove runs of characters, halving the run length from half the input
/// down to one.
fn remove_characters(current: &str, predicate: &impl Fn(&str) -> bool) -> String {
    let mut chars: Vec<char> = current.chars().collect();
    let mut chunk = chars.len() / 2;
    while chunk > 0 {
        let mut start = 0;
        while start < chars.len() {
            let end = (start + chunk).min(chars.len());
            let candidate: String = chars[..start].iter().chain(&chars[end..]).collect();
            if predicate(&candidate) {
                let _ = chars.drain(start..end);
            } else {
                start += chunk;
            }
        }
        chunk /= 2;
    }
    chars.into_iter().collect()
}

/// An opening tag found in markup.
struct OpenTag {
    start: usize,
    /// Byte offset one past the closing `>`.
    end: usize,
    name_end: usize,
    name: String,
    self_closing: bool,
}

/// Opening tags in document order. Matching is ASCII case-insensitive.
fn open_tags(html: &str) -> Vec<OpenTag> {
    let bytes = html.as_bytes();
    let mut tags = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'<' && bytes.get(i + 1).is_some_and(u8::is_ascii_alphabetic) {
            let name_start = i + 1;
            let name_end = bytes[name_start..]
                .iter()
                .position(|b| b.is_ascii_whitespace() || *b == b'/' || *b == b'>')
                .map_or(bytes.len(), |n| name_start + n);
            let Some(gt) = bytes[name_end..].iter().position(|&b| b == b'>') else {
                break;
            };
            let gt = name_end + gt;
            tags.push(OpenTag {
                start: i,
                end: gt + 1,
                name_end,
                name: html[name_start..name_end].to_ascii_lowercase(),
                self_closing: bytes[..gt].ends_with(b"/"),
            });
            i = gt + 1;
        } else {
            i += 1;
        }
    }
    tags
}

/// Whole elements: from the opening tag through the matching end tag, or
/// the opening tag alone for void, self-closing and unclosed elements.
fn element_spans(html: &str) -> Vec<Range<usize>> {
    let lower = html.to_ascii_lowercase();
    open_tags(html)
        .into_iter()
        .map(|tag| {
            if tag.self_closing || VOID_ELEMENTS.contains(&tag.name.as_str()) {
                return tag.start..tag.end;
            }
            let end = matching_end_tag(&lower, &tag.name, tag.end).unwrap_or(tag.end);
            tag.start..end
        })
        .collect()
}

/// Offset one past the end tag closing the element named `name` whose
/// content starts at `from`.
fn matching_end_tag(lower: &str, name: &str, from: usize) -> Option<usize> {
    let open = format!("<{name}");
    let close = format!("</{name}");
    let bytes = lower.as_bytes();
    let boundary = |at: usize| {
        bytes
            .get(at)
            .is_none_or(|b| b.is_ascii_whitespace() || *b == b'>' || *b == b'/')
    };
    let mut depth = 1_usize;
    let mut i = from;
    while i < lower.len() {
        let rest = &lower[i..];
        if rest.starts_with(&close) && boundary(i + close.len()) {
            depth -= 1;
            if depth == 0 {
                return Some(lower[i..].find('>').map_or(lower.len(), |gt| i + gt + 1));
            }
            i += close.len();
        } else if rest.starts_with(&open) && boundary(i + open.len()) {
            depth += 1;
            i += open.len();
        } else {
            i += rest.chars().next().map_or(1, char::len_utf8);
        }
    }
    None
}

/// Attributes inside opening tags, each with its leading whitespace.
fn attribute_spans(html: &str) -> Vec<Range<usize>> {
    let bytes = html.as_bytes();
    let mut spans = Vec::new();
    for tag in open_tags(html) {
        let limit = tag.end - 1;
        let mut i = tag.name_end;
        while i < limit {
            let start = i;
            while i < limit && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            let name_start = i;
            while i < limit && !bytes[i].is_ascii_whitespace() && !matches!(bytes[i], b'=' | b'/')
            {
                i += 1;
            }
            if i == name_start {
                i += 1;
                continue;
            }
            if i < limit && bytes[i] == b'=' {
                i += 1;
                match bytes.get(i) {
                    Some(&quote @ (b'"' | b'\'')) => {
                        i += 1;
                        while i < limit && bytes[i] != quote {
                            i += 1;
                        }
                        i = (i + 1).min(limit);
                    }
                    _ => {
                        while i < limit && !bytes[i].is_ascii_whitespace() {
                            i += 1;
                        }
                    }
                }
            }
            spans.push(start..i);
        }
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(html: &str, spans: &[Range<usize>]) -> Vec<String> {
        spans.iter().map(|s| html[s.clone()].to_string()).collect()
    }

    #[test]
    fn test_element_spans_match_nested_end_tags() {
        let html = "<div><div>a</div></div><br><p>x";
        let spans = element_spans(html);
        assert_eq!(
            texts(html, &spans),
            vec!["<div><div>a</div></div>", "<div>a</div>", "<br>", "<p>"]
        );
    }

    #[test]
    fn test_attribute_spans_cover_quoted_and_bare_values() {
        let html = "<p class=\"a b\" id=x hidden style='color: red'>t</p>";
        let spans = attribute_spans(html);
        assert_eq!(
            texts(html, &spans),
            vec![" class=\"a b\"", " id=x", " hidden", " style='color: red'"]
        );
    }

    #[test]
    fn test_minimize_keeps_only_what_the_predicate_needs() {
        let html = "<div class='x'><p>keep</p><span>drop</span></div><b>more</b>";
        let result = minimize(html, |s| s.contains("keep"));
        assert_eq!(result, "keep");
    }

    #[test]
    fn test_minimize_prefers_structural_removal() {
        let html = "<ul><li>one</li><li style='float:left'>two</li></ul>";
        let result = minimize(html, |s| s.contains("float:left"));
        assert_eq!(result, "float:left");
    }

    #[test]
    fn test_minimize_returns_input_when_predicate_fails() {
        assert_eq!(minimize("<p>x</p>", |_| false), "<p>x</p>");
    }
}
