//! Integration tests for selector specificity and the cascade.

use quickcheck_macros::quickcheck;
use quokka_css::values::Color;
use quokka_css::{Specificity, compute_document_styles, parse_selector};
use quokka_dom::{DomTree, ElementData, NodeId};

fn find(tree: &DomTree, id_attr: &str) -> NodeId {
    tree.descendants(NodeId::ROOT)
        .find(|&n| tree.as_element(n).and_then(ElementData::id) == Some(id_attr))
        .expect("element with id")
}

fn background_of(html: &str, id_attr: &str) -> Color {
    let tree = quokka_html::parse_document(html);
    let styles = compute_document_styles(&tree);
    styles
        .get(find(&tree, id_attr))
        .expect("element is styled")
        .background()
}

#[test]
fn test_two_classes_beat_one_regardless_of_order() {
    let red = Color::rgb(255, 0, 0);
    let first = background_of(
        "<style>.a.b{background:red} .a{background:blue}</style><div id=t class='a b'></div>",
        "t",
    );
    let second = background_of(
        "<style>.a{background:blue} .a.b{background:red}</style><div id=t class='a b'></div>",
        "t",
    );
    assert_eq!(first, red);
    assert_eq!(second, red);
}

#[test]
fn test_selector_specificities() {
    let cases = [
        ("*", Specificity(0, 0, 0, 0)),
        ("li", Specificity(0, 0, 0, 1)),
        ("ul li", Specificity(0, 0, 0, 2)),
        ("ul ol+li", Specificity(0, 0, 0, 3)),
        ("h1 + *[rel=up]", Specificity(0, 0, 1, 1)),
        ("ul ol li.red", Specificity(0, 0, 1, 3)),
        ("li.red.level", Specificity(0, 0, 2, 1)),
        ("#x34y", Specificity(0, 1, 0, 0)),
        ("p::before", Specificity(0, 0, 0, 2)),
        ("a:hover", Specificity(0, 0, 1, 1)),
    ];
    for (raw, expected) in cases {
        let selectors = parse_selector(raw).unwrap_or_else(|| panic!("{raw} parses"));
        assert_eq!(selectors[0].specificity, expected, "specificity of {raw}");
    }
}

#[test]
fn test_dynamic_pseudo_class_never_matches_but_counts() {
    let blue = Color::rgb(0, 0, 255);
    let bg = background_of(
        "<style>a:hover{background:red} a{background:blue}</style><a id=t href=x>l</a>",
        "t",
    );
    assert_eq!(bg, blue);
}

#[test]
fn test_invalid_group_member_drops_rule_only() {
    let bg = background_of(
        "<style>p, p::bogus{background:red} p{color:green}</style><p id=t>x</p>",
        "t",
    );
    assert!(bg.is_transparent());
}

/// Specificity compares column by column; no number of classes outweighs an
/// id.
#[quickcheck]
fn prop_specificity_has_no_carry(classes: u8, types: u8) -> bool {
    let many = Specificity(0, 0, u32::from(classes), u32::from(types));
    let one_id = Specificity(0, 1, 0, 0);
    many < one_id && Specificity::INLINE > one_id
}

/// Selector text built from counted parts has exactly those counts.
#[quickcheck]
fn prop_compound_selector_counts(ids: u8, classes: u8) -> bool {
    let (ids, classes) = (ids % 4, classes % 6);
    let mut raw = String::from("div");
    for i in 0..ids {
        raw.push_str(&format!("#i{i}"));
    }
    for i in 0..classes {
        raw.push_str(&format!(".c{i}"));
    }
    parse_selector(&raw).is_some_and(|s| {
        s[0].specificity == Specificity(0, u32::from(ids), u32::from(classes), 1)
    })
}
