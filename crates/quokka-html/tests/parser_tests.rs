//! Integration tests for the HTML tokenizer and tree builder.

use quokka_dom::{DomTree, NodeId, NodeType};
use quokka_html::{HTMLParser, HTMLTokenizer, Token, parse_document};

/// Helper to find the first element with a tag name, in document order.
fn find_element(tree: &DomTree, tag: &str) -> Option<NodeId> {
    tree.descendants(NodeId::ROOT)
        .find(|&id| tree.tag_name(id) == Some(tag))
}

fn tokenize(html: &str) -> Vec<Token> {
    let mut tokenizer = HTMLTokenizer::new(html.to_string());
    tokenizer.run();
    tokenizer.into_tokens()
}

// ========== tokenizer ==========

#[test]
fn test_tokenizer_attributes_and_self_closing() {
    let tokens = tokenize(r#"<IMG SRC="a.png" alt='x' width=10 />"#);
    let Token::StartTag {
        name,
        self_closing,
        attributes,
    } = &tokens[0]
    else {
        panic!("expected start tag, got {:?}", tokens[0]);
    };
    assert_eq!(name, "img");
    assert!(*self_closing);
    let pairs: Vec<_> = attributes
        .iter()
        .map(|a| (a.name.as_str(), a.value.as_str()))
        .collect();
    assert_eq!(pairs, vec![("src", "a.png"), ("alt", "x"), ("width", "10")]);
    assert_eq!(tokens.last(), Some(&Token::EndOfFile));
}

#[test]
fn test_tokenizer_duplicate_attribute_keeps_first() {
    let tokens = tokenize(r#"<p id="a" id="b">"#);
    let Token::StartTag { attributes, .. } = &tokens[0] else {
        panic!("expected start tag");
    };
    assert_eq!(attributes.len(), 1);
    assert_eq!(attributes[0].value, "a");
}

#[test]
fn test_tokenizer_style_is_raw_text() {
    let tokens = tokenize("<style>p > a { color: red }</style>");
    let text: String = tokens
        .iter()
        .filter_map(|t| match t {
            Token::Character { data } => Some(*data),
            _ => None,
        })
        .collect();
    assert_eq!(text, "p > a { color: red }");
    assert!(tokens.contains(&Token::EndTag {
        name: "style".to_string()
    }));
}

#[test]
fn test_tokenizer_character_references() {
    let tree = parse_document("<p>a &amp; b &#169; &#x41; &bogus; &lt;</p>");
    let p = find_element(&tree, "p").expect("p element");
    assert_eq!(tree.text_content(p), "a & b \u{a9} A &bogus; <");
}

#[test]
fn test_tokenizer_comments_and_doctype() {
    let tokens = tokenize("<!DOCTYPE html><!-- hi -->x");
    assert_eq!(
        tokens[0],
        Token::Doctype {
            name: Some("html".to_string())
        }
    );
    assert_eq!(
        tokens[1],
        Token::Comment {
            data: " hi ".to_string()
        }
    );
}

#[test]
fn test_tokenizer_unterminated_tag_at_eof() {
    // Must terminate and produce no start tag.
    let tokens = tokenize("<div class=\"open");
    assert!(!tokens.iter().any(|t| matches!(t, Token::StartTag { .. })));
}

// ========== tree builder ==========

#[test]
fn test_implied_html_head_body() {
    let tree = parse_document("Hello");
    let html = tree.document_element().expect("html element");
    assert_eq!(tree.tag_name(html), Some("html"));
    assert!(tree.head().is_some(), "head should be implied");
    let body = tree.body().expect("body should be implied");
    assert_eq!(tree.text_content(body), "Hello");
}

#[test]
fn test_style_goes_to_head() {
    let tree = parse_document("<style>p{}</style><p>x</p>");
    let style = find_element(&tree, "style").expect("style element");
    assert_eq!(tree.parent(style), tree.head());
    let p = find_element(&tree, "p").expect("p element");
    assert_eq!(tree.parent(p), tree.body());
}

#[test]
fn test_p_closed_by_block_start_tag() {
    let tree = parse_document("<p>one<div>two</div>");
    let body = tree.body().expect("body");
    let tags: Vec<_> = tree
        .element_children(body)
        .filter_map(|id| tree.tag_name(id))
        .collect();
    assert_eq!(tags, vec!["p", "div"], "div must not nest inside p");
}

#[test]
fn test_li_closes_previous_li() {
    let tree = parse_document("<ul><li>a<li>b<li>c</ul>");
    let ul = find_element(&tree, "ul").expect("ul");
    assert_eq!(tree.element_children(ul).count(), 3);
}

#[test]
fn test_nested_list_li_does_not_close_outer() {
    let tree = parse_document("<ol><li>a<ol><li>b</ol></li><li>c</ol>");
    let outer = find_element(&tree, "ol").expect("outer ol");
    assert_eq!(tree.element_children(outer).count(), 2);
}

#[test]
fn test_void_elements_do_not_take_children() {
    let tree = parse_document("<p>a<br>b<img src=x>c</p>");
    let p = find_element(&tree, "p").expect("p");
    let br = find_element(&tree, "br").expect("br");
    assert!(tree.children(br).is_empty());
    assert_eq!(tree.text_content(p), "abc");
}

#[test]
fn test_unmatched_end_tag_is_ignored() {
    let (tree, issues) = {
        let mut tokenizer = HTMLTokenizer::new("<div>a</span>b</div>".to_string());
        tokenizer.run();
        HTMLParser::new(tokenizer.into_tokens()).run_with_issues()
    };
    let div = find_element(&tree, "div").expect("div");
    assert_eq!(tree.text_content(div), "ab");
    assert!(issues.iter().any(|i| i.message.contains("</span>")));
}

#[test]
fn test_body_attributes_are_merged() {
    let tree = parse_document("<body class=a><body id=b class=c>");
    let body = tree.body().expect("body");
    let data = tree.as_element(body).expect("element");
    assert_eq!(data.attr("class"), Some("a"));
    assert_eq!(data.attr("id"), Some("b"));
}

#[test]
fn test_deeply_nested_document_parses() {
    let html = "<div>".repeat(50_000);
    let tree = parse_document(&html);
    let count = tree
        .descendants(NodeId::ROOT)
        .filter(|&id| matches!(tree.get(id).map(|n| &n.node_type), Some(NodeType::Element(_))))
        .count();
    assert_eq!(count, 50_000 + 3, "html, head and body plus the divs");
}
