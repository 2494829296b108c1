//! Tests for DOM construction and traversal helpers.

use quokka_dom::{DomTree, ElementData, NodeId, NodeType};

/// Helper to create an element node and return its `NodeId`.
fn alloc_element(tree: &mut DomTree, tag: &str) -> NodeId {
    tree.alloc(NodeType::Element(ElementData::new(tag)))
}

// ========== append_child ==========

#[test]
fn test_append_child_links_siblings() {
    let mut tree = DomTree::new();
    let parent = alloc_element(&mut tree, "div");
    tree.append_child(NodeId::ROOT, parent);

    let a = alloc_element(&mut tree, "a");
    let b = alloc_element(&mut tree, "b");
    tree.append_child(parent, a);
    tree.append_child(parent, b);

    assert_eq!(tree.children(parent), &[a, b]);
    assert_eq!(tree.next_sibling(a), Some(b));
    assert_eq!(tree.prev_sibling(b), Some(a));
    assert_eq!(tree.parent(b), Some(parent));
}

#[test]
fn test_append_text_merges_adjacent_text() {
    let mut tree = DomTree::new();
    let p = alloc_element(&mut tree, "p");
    tree.append_child(NodeId::ROOT, p);
    tree.append_text(p, "Hello, ");
    tree.append_text(p, "world");

    assert_eq!(tree.children(p).len(), 1, "adjacent text should merge");
    assert_eq!(tree.text_content(p), "Hello, world");
}

// ========== traversal ==========

#[test]
fn test_descendants_are_in_document_order() {
    let mut tree = DomTree::new();
    let html = alloc_element(&mut tree, "html");
    let body = alloc_element(&mut tree, "body");
    let div = alloc_element(&mut tree, "div");
    let span = alloc_element(&mut tree, "span");
    let p = alloc_element(&mut tree, "p");
    tree.append_child(NodeId::ROOT, html);
    tree.append_child(html, body);
    tree.append_child(body, div);
    tree.append_child(div, span);
    tree.append_child(body, p);

    let order: Vec<_> = tree.descendants(html).collect();
    assert_eq!(order, vec![html, body, div, span, p]);
}

#[test]
fn test_deep_tree_traversal_does_not_overflow() {
    let mut tree = DomTree::new();
    let mut parent = NodeId::ROOT;
    for _ in 0..100_000 {
        let child = alloc_element(&mut tree, "div");
        tree.append_child(parent, child);
        parent = child;
    }
    assert_eq!(tree.descendants(NodeId::ROOT).count(), 100_001);
    assert_eq!(tree.depth(parent), 100_000);
}

#[test]
fn test_language_inherits_from_ancestor() {
    let mut tree = DomTree::new();
    let html = tree.alloc(NodeType::Element(ElementData::new("html").with_attr("lang", "fr-CA")));
    let body = alloc_element(&mut tree, "body");
    let q = tree.alloc(NodeType::Element(ElementData::new("q").with_attr("lang", "de")));
    tree.append_child(NodeId::ROOT, html);
    tree.append_child(html, body);
    tree.append_child(body, q);

    assert_eq!(tree.language(body), Some("fr-CA"));
    assert_eq!(tree.language(q), Some("de"));
}

#[test]
fn test_document_element_and_body() {
    let mut tree = DomTree::new();
    let html = alloc_element(&mut tree, "html");
    let head = alloc_element(&mut tree, "head");
    let body = alloc_element(&mut tree, "body");
    tree.append_child(NodeId::ROOT, html);
    tree.append_child(html, head);
    tree.append_child(html, body);

    assert_eq!(tree.document_element(), Some(html));
    assert_eq!(tree.head(), Some(head));
    assert_eq!(tree.body(), Some(body));
}

#[test]
fn test_classes_split_on_any_whitespace() {
    let data = ElementData::new("div").with_attr("class", "  a\tb\nc ");
    let classes: Vec<_> = data.classes().collect();
    assert_eq!(classes, vec!["a", "b", "c"]);
    assert!(data.has_class("b"));
    assert!(!data.has_class("B"), "class matching is case-sensitive");
}
