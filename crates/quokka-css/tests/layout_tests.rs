//! Integration tests for block, float, inline and positioned layout.

use quokka_css::layout::{BoxKind, InlineContent};
use quokka_css::{Fragment, FragmentTree, check_fragment_tree, layout_tree};

/// Helper: parse, style and lay out HTML at 400×300.
fn layout_html(html: &str) -> FragmentTree {
    layout_tree(&quokka_html::parse_document(html), 400.0, 300.0)
}

/// Helper: the first fragment with the given label.
fn find<'t>(tree: &'t FragmentTree, label: &str) -> &'t Fragment {
    tree.fragments
        .iter()
        .find(|f| f.label == label)
        .unwrap_or_else(|| panic!("no fragment labelled {label}"))
}

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() < 0.01
}

#[test]
fn test_percentage_width_of_containing_block() {
    let tree = layout_html("<div style='width:400px'><div id=half style='width:50%'></div></div>");
    assert!(close(find(&tree, "div#half").width, 200.0));
}

#[test]
fn test_em_width_scales_with_font_size() {
    let tree = layout_html("<div id=e style='font-size:20px;width:10em'></div>");
    assert!(close(find(&tree, "div#e").width, 200.0));
}

#[test]
fn test_auto_width_fills_body_content_box() {
    let tree = layout_html("<div id=d style='padding:0 10px;border-left:2px solid'></div>");
    let d = find(&tree, "div#d");
    // 400 - 2 * 8px body margin
    assert!(close(d.width, 384.0), "border box width {}", d.width);
    assert!(close(d.x, 8.0));
}

#[test]
fn test_auto_margins_center_block() {
    let tree = layout_html("<div style='width:300px'><div id=c style='width:100px;margin:0 auto'></div></div>");
    let c = find(&tree, "div#c");
    assert!(close(c.x, 8.0 + 100.0), "x {}", c.x);
}

// ---------------------------------------------------------------------------
// Margin collapsing tests
//
// [§ 8.3.1 Collapsing margins](https://www.w3.org/TR/CSS2/box.html#collapsing-margins)
//
// "When two or more margins collapse, the resulting margin width is the
// maximum of the collapsing margins' widths."
// ---------------------------------------------------------------------------

#[test]
fn test_sibling_margin_collapsing() {
    let tree = layout_html(
        "<div id=a style='height:10px;margin-bottom:20px'></div><div id=b style='height:10px;margin-top:30px'></div>",
    );
    let (a, b) = (find(&tree, "div#a"), find(&tree, "div#b"));
    assert!(close(b.y - (a.y + a.height), 30.0), "gap {}", b.y - (a.y + a.height));
}

#[test]
fn test_parent_first_child_margin_collapsing() {
    let tree = layout_html("<div id=o><div id=i style='margin-top:20px;height:5px'></div></div>");
    let (body, o, i) = (find(&tree, "body"), find(&tree, "div#o"), find(&tree, "div#i"));
    // body's 8px margin, the outer div and the inner 20px margin all collapse.
    assert!(close(body.y, 20.0), "body y {}", body.y);
    assert!(close(o.y, 20.0));
    assert!(close(i.y, 20.0));
}

#[test]
fn test_padding_prevents_parent_child_collapsing() {
    let tree = layout_html("<div id=o style='padding-top:1px'><div id=i style='margin-top:20px'></div></div>");
    let (o, i) = (find(&tree, "div#o"), find(&tree, "div#i"));
    assert!(close(o.y, 8.0));
    assert!(close(i.y, 8.0 + 1.0 + 20.0));
}

#[test]
fn test_parent_last_child_bottom_margin_collapsing() {
    let tree = layout_html(
        "<div id=o><div style='height:10px;margin-bottom:25px'></div></div><div id=n style='margin-top:5px'></div>",
    );
    let (o, n) = (find(&tree, "div#o"), find(&tree, "div#n"));
    assert!(close(o.height, 10.0), "collapsed margin is outside the parent");
    assert!(close(n.y - (o.y + o.height), 25.0));
}

#[test]
fn test_empty_box_margins_collapse_through() {
    let tree = layout_html(
        "<div id=a style='margin-bottom:10px'>x</div><div id=e style='margin:15px 0'></div><div id=b style='margin-top:5px'>y</div>",
    );
    let (a, e, b) = (find(&tree, "div#a"), find(&tree, "div#e"), find(&tree, "div#b"));
    assert!(close(e.height, 0.0));
    assert!(close(b.y - (a.y + a.height), 15.0), "gap {}", b.y - (a.y + a.height));
}

// ---------------------------------------------------------------------------
// Heights
// ---------------------------------------------------------------------------

#[test]
fn test_auto_height_from_line_boxes() {
    let tree = layout_html("<div id=d>one line</div>");
    assert!(close(find(&tree, "div#d").height, 19.2));
}

#[test]
fn test_min_and_max_height_clamp() {
    let tree = layout_html("<div id=m style='min-height:40px'></div><div id=x style='max-height:10px'>a<br>b</div>");
    assert!(close(find(&tree, "div#m").height, 40.0));
    assert!(close(find(&tree, "div#x").height, 10.0));
}

#[test]
fn test_percentage_height_needs_definite_containing_block() {
    let tree = layout_html(
        "<div id=auto style='height:50%'>x</div><div style='height:100px'><div id=half style='height:50%'></div></div>",
    );
    assert!(close(find(&tree, "div#auto").height, 19.2));
    assert!(close(find(&tree, "div#half").height, 50.0));
}

// ---------------------------------------------------------------------------
// Floats
//
// [§ 9.5 Floats](https://www.w3.org/TR/CSS2/visuren.html#floats)
// ---------------------------------------------------------------------------

#[test]
fn test_clear_both_moves_below_preceding_floats() {
    let tree = layout_html(
        "<div style='float:left;width:50px;height:50px'></div>\
         <div style='float:right;width:50px;height:80px'></div>\
         <div id=c style='clear:both'>x</div>",
    );
    let c = find(&tree, "div#c");
    assert!(c.y >= 8.0 + 80.0 - 0.01, "cleared y {}", c.y);
}

#[test]
fn test_float_positions_on_both_sides() {
    let tree = layout_html("<div id=l style='float:left;width:50px;height:10px'></div><div id=r style='float:right;width:60px;height:10px'></div>");
    let (l, r) = (find(&tree, "div#l"), find(&tree, "div#r"));
    assert!(close(l.x, 8.0));
    assert!(close(r.x, 392.0 - 60.0));
    assert!(close(l.y, r.y));
}

#[test]
fn test_float_that_does_not_fit_moves_down() {
    let tree = layout_html(
        "<div id=a style='float:left;width:300px;height:20px'></div><div id=b style='float:left;width:200px;height:20px'></div>",
    );
    let (a, b) = (find(&tree, "div#a"), find(&tree, "div#b"));
    assert!(close(b.y, a.y + 20.0));
    assert!(close(b.x, 8.0));
}

#[test]
fn test_float_shrinks_to_fit_content() {
    let tree = layout_html("<div id=f style='float:left'>aaa</div>");
    // three 'a' advances at 16px
    assert!(close(find(&tree, "div#f").width, 24.0));
}

#[test]
fn test_line_boxes_narrowed_beside_float() {
    let tree = layout_html("<div style='float:left;width:100px;height:50px'></div><p id=p>text</p>");
    let line = &find(&tree, "p#p").lines[0];
    assert!(close(line.x, 108.0), "line x {}", line.x);
    assert!(close(line.width, 284.0));
}

#[test]
fn test_block_formatting_context_avoids_floats() {
    let tree = layout_html("<div style='float:left;width:100px;height:50px'></div><div id=b style='overflow:hidden'>x</div>");
    let b = find(&tree, "div#b");
    assert!(close(b.x, 108.0));
    assert!(close(b.width, 284.0));
}

#[test]
fn test_bfc_root_contains_floats() {
    let tree = layout_html("<div id=b style='overflow:hidden'><div style='float:left;width:10px;height:70px'></div></div>");
    assert!(close(find(&tree, "div#b").height, 70.0));
}

// ---------------------------------------------------------------------------
// Positioning
// ---------------------------------------------------------------------------

#[test]
fn test_relative_offset_shifts_after_layout() {
    let tree = layout_html("<div id=r style='position:relative;left:10px;top:5px'>x</div><div id=n>y</div>");
    let (r, n) = (find(&tree, "div#r"), find(&tree, "div#n"));
    assert!(close(r.x, 18.0));
    assert!(close(r.y, 13.0));
    // The following box ignores the offset.
    assert!(close(n.y, 8.0 + 19.2));
}

#[test]
fn test_absolute_inside_relative_ancestor() {
    let tree = layout_html(
        "<div id=rel style='position:relative;width:200px;height:100px'>\
         <div id=abs style='position:absolute;right:0;top:10px;width:50px;height:20px'></div></div>",
    );
    let (rel, abs) = (find(&tree, "div#rel"), find(&tree, "div#abs"));
    assert!(close(abs.x, rel.x + 150.0), "abs x {}", abs.x);
    assert!(close(abs.y, rel.y + 10.0));
}

#[test]
fn test_absolute_is_out_of_flow() {
    let tree = layout_html("<div id=abs style='position:absolute;height:40px'>a</div><div id=n>b</div>");
    assert!(close(find(&tree, "div#n").y, 8.0));
    let abs = find(&tree, "div#abs");
    // static position, shrink-to-fit width
    assert!(close(abs.x, 8.0) && close(abs.y, 8.0), "{} {}", abs.x, abs.y);
    assert!(close(abs.width, 8.0));
}

#[test]
fn test_fixed_uses_viewport() {
    let tree = layout_html(
        "<div style='position:relative;margin:50px'><div id=f style='position:fixed;bottom:0;left:0;width:10px;height:10px'></div></div>",
    );
    let f = find(&tree, "div#f");
    assert!(close(f.x, 0.0));
    assert!(close(f.y, 290.0));
}

// ---------------------------------------------------------------------------
// Inline-level boxes
// ---------------------------------------------------------------------------

#[test]
fn test_inline_block_sits_on_baseline() {
    let tree = layout_html("<div id=d><span id=ib style='display:inline-block;width:30px;height:20px'></span></div>");
    let (d, ib) = (find(&tree, "div#d"), find(&tree, "span#ib"));
    assert_eq!(ib.box_kind, BoxKind::InlineBlock);
    assert!(close(ib.x, 8.0));
    let line = &d.lines[0];
    assert!(close(ib.y + ib.height, line.y + line.baseline));
    assert!(
        line.inlines
            .iter()
            .any(|i| matches!(i.content, InlineContent::Atomic { fragment } if fragment == ib.id))
    );
}

#[test]
fn test_image_size_from_attributes() {
    let tree = layout_html("<p><img id=i src=x.png width=40 height=30></p>");
    let img = find(&tree, "img#i");
    assert_eq!(img.box_kind, BoxKind::Replaced);
    assert!(close(img.width, 40.0) && close(img.height, 30.0));
}

#[test]
fn test_inline_padding_adds_horizontal_space() {
    let tree = layout_html("<p id=p>a<span style='padding-left:10px'>b</span></p>");
    let line = &find(&tree, "p#p").lines[0];
    let texts: Vec<f32> = line
        .inlines
        .iter()
        .filter(|i| matches!(i.content, InlineContent::Text(_)))
        .map(|i| i.x)
        .collect();
    assert_eq!(texts.len(), 2);
    assert!(close(texts[1] - texts[0], 8.0 + 10.0), "{texts:?}");
}

// ---------------------------------------------------------------------------
// Lists
// ---------------------------------------------------------------------------

#[test]
fn test_outside_marker_left_of_content_on_first_baseline() {
    let tree = layout_html("<ul><li id=l>Item</li></ul>");
    let li = find(&tree, "li#l");
    let marker = li.marker.as_ref().expect("outside marker");
    let content = li.content_box();
    assert!(marker.x + marker.width <= content.x);
    let line = &li.lines[0];
    assert!(close(marker.y + marker.baseline, line.y + line.baseline));
    // The marker does not shift the text.
    assert!(close(line.inlines[0].x, content.x));
}

#[test]
fn test_list_style_none_has_no_marker() {
    let tree = layout_html("<ul style='list-style-type:none'><li id=l style='padding-left:40px'>Item</li></ul>");
    let li = find(&tree, "li#l");
    assert!(li.marker.is_none());
    assert!(li.lines[0].inlines.iter().all(|i| !matches!(i.content, InlineContent::Marker(_))));
}

#[test]
fn test_inside_marker_is_first_inline() {
    let tree = layout_html("<ol style='list-style-position:inside'><li id=l>Item</li></ol>");
    let li = find(&tree, "li#l");
    assert!(li.marker.is_none());
    let InlineContent::Marker(run) = &li.lines[0].inlines[0].content else {
        panic!("marker first: {:?}", li.lines[0].inlines);
    };
    assert_eq!(run.text, "1. ");
}

// ---------------------------------------------------------------------------
// Robustness
// ---------------------------------------------------------------------------

#[test]
fn test_deep_nesting_does_not_overflow_stack() {
    let depth = 2000;
    let html = format!("{}x{}", "<div>".repeat(depth), "</div>".repeat(depth));
    let tree = layout_html(&html);
    assert!(tree.len() > depth);
    assert!(check_fragment_tree(&tree).is_empty());
}

#[test]
fn test_zero_viewport_is_well_formed() {
    let tree = layout_tree(&quokka_html::parse_document("<p>hello world</p>"), 0.0, 0.0);
    assert!(check_fragment_tree(&tree).is_empty(), "{:?}", check_fragment_tree(&tree));
}
