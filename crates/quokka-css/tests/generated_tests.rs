//! Integration tests for generated content, counters, quotes and list
//! markers, observed through the fragment tree.

use quokka_css::layout::InlineContent;
use quokka_css::{Fragment, FragmentTree, layout_tree};

fn layout_html(html: &str) -> FragmentTree {
    layout_tree(&quokka_html::parse_document(html), 600.0, 400.0)
}

fn find<'t>(tree: &'t FragmentTree, label: &str) -> &'t Fragment {
    tree.fragments
        .iter()
        .find(|f| f.label == label)
        .unwrap_or_else(|| panic!("no fragment labelled {label}"))
}

/// Text drawn on a fragment's lines, in order.
fn text_of(fragment: &Fragment) -> String {
    fragment
        .lines
        .iter()
        .flat_map(|line| &line.inlines)
        .filter_map(|inline| match &inline.content {
            InlineContent::Text(run) | InlineContent::Marker(run) => Some(run.text.as_str()),
            _ => None,
        })
        .collect()
}

fn marker_of(fragment: &Fragment) -> String {
    match fragment.marker.as_ref().map(|m| &m.content) {
        Some(InlineContent::Marker(run)) => run.text.clone(),
        other => panic!("{} has no text marker: {other:?}", fragment.label),
    }
}

#[test]
fn test_counter_increments_render_in_order() {
    let tree = layout_html(
        "<style>ol{counter-reset:item;list-style-type:none} li{counter-increment:item} li::before{content:counter(item) \". \"}</style>\
         <ol><li id=a>x</li><li id=b>y</li><li id=c>z</li></ol>",
    );
    assert_eq!(text_of(find(&tree, "li#a")), "1. x");
    assert_eq!(text_of(find(&tree, "li#b")), "2. y");
    assert_eq!(text_of(find(&tree, "li#c")), "3. z");
}

#[test]
fn test_display_none_skips_counters_but_hidden_counts() {
    let tree = layout_html(
        "<style>body{counter-reset:c} p{counter-increment:c} p::after{content:counter(c)}</style>\
         <p id=a>a</p><p style='display:none'>n</p><p style='visibility:hidden'>h</p><p id=d>d</p>",
    );
    assert_eq!(text_of(find(&tree, "p#a")), "a1");
    assert_eq!(text_of(find(&tree, "p#d")), "d3");
}

#[test]
fn test_nested_counters_function() {
    let tree = layout_html(
        "<style>ol{counter-reset:s;list-style-type:none} li{counter-increment:s} li::before{content:counters(s, \".\") \" \"}</style>\
         <ol><li>a<ol><li id=n>b</li></ol></li><li id=t>c</li></ol>",
    );
    assert_eq!(text_of(find(&tree, "li#n")), "1.1 b");
    assert_eq!(text_of(find(&tree, "li#t")), "2 c");
}

#[test]
fn test_reset_on_sibling_does_not_reach_following_siblings() {
    let tree = layout_html(
        "<style>p{counter-increment:c} p::before{content:counter(c)}</style>\
         <div><span style='counter-reset:c 5'></span><p id=p>x</p></div>",
    );
    assert_eq!(text_of(find(&tree, "p#p")), "1x");
}

#[test]
fn test_reset_reaches_descendants() {
    let tree = layout_html(
        "<style>p{counter-increment:c} p::before{content:counter(c)}</style>\
         <div style='counter-reset:c 5'><p id=a>x</p></div><p id=b>y</p>",
    );
    assert_eq!(text_of(find(&tree, "p#a")), "6x");
    assert_eq!(text_of(find(&tree, "p#b")), "1y");
}

#[test]
fn test_quote_depth_restarts_in_new_formatting_context() {
    let tree = layout_html(
        "<p id=p><q>a <span id=s style='display:inline-block'><q>b</q></span></q></p>",
    );
    assert_eq!(text_of(find(&tree, "span#s")), "\u{201C}b\u{201D}");
}

#[test]
fn test_nested_quotes_alternate() {
    let tree = layout_html("<p id=p><q>hi <q>x</q></q> <q>y</q></p>");
    assert_eq!(text_of(find(&tree, "p#p")), "\u{201C}hi \u{2018}x\u{2019}\u{201D} \u{201C}y\u{201D}");
}

#[test]
fn test_close_quote_at_depth_zero_inserts_nothing() {
    let tree = layout_html("<style>span::before{content:close-quote}</style><p id=p><span>x</span></p>");
    assert_eq!(text_of(find(&tree, "p#p")), "x");
}

#[test]
fn test_ol_start_and_li_value() {
    let tree = layout_html("<ol start=5><li id=a>x</li><li id=b value=10>y</li><li id=c>z</li></ol>");
    assert_eq!(marker_of(find(&tree, "li#a")), "5.");
    assert_eq!(marker_of(find(&tree, "li#b")), "10.");
    assert_eq!(marker_of(find(&tree, "li#c")), "11.");
}

#[test]
fn test_list_style_types() {
    let tree = layout_html(
        "<ol style='list-style-type:upper-roman'><li>a</li><li>b</li><li>c</li><li id=r>d</li></ol>\
         <ol style='list-style-type:lower-alpha'><li>a</li><li id=l>b</li></ol>",
    );
    assert_eq!(marker_of(find(&tree, "li#r")), "IV.");
    assert_eq!(marker_of(find(&tree, "li#l")), "b.");
}

#[test]
fn test_before_block_is_laid_out_as_block() {
    let tree = layout_html("<style>#d::before{content:'head';display:block}</style><div id=d>body</div>");
    let before = find(&tree, "div#d::before");
    let div = find(&tree, "div#d");
    assert_eq!(text_of(before), "head");
    assert_eq!(div.children.first(), Some(&before.id));
}

#[test]
fn test_attr_in_content() {
    let tree = layout_html("<style>a::after{content:' (' attr(href) ')'}</style><p id=p><a href=x.html>link</a></p>");
    assert_eq!(text_of(find(&tree, "p#p")), "link (x.html)");
}
