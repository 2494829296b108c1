//! Property tests: layout and paint output is well formed and deterministic
//! for arbitrary small documents.

use quickcheck::{Arbitrary, Gen};
use quickcheck_macros::quickcheck;
use quokka_css::{
    check_display_list, check_fragment_tree, display_list_to_json, fragment_tree_to_json,
    layout_tree, paint,
};

const TAGS: &[&str] = &["div", "p", "span", "ul", "li", "b", "em", "q", "br"];

const DECLARATIONS: &[&str] = &[
    "float:left",
    "float:right",
    "clear:both",
    "display:inline-block",
    "display:block",
    "display:none",
    "display:list-item",
    "position:relative;left:3px",
    "position:absolute;top:5px",
    "position:fixed;right:0",
    "width:50%",
    "width:30px",
    "height:20px",
    "min-height:10px",
    "max-width:40px",
    "margin:-5px 2px",
    "margin:10px auto",
    "padding:3px",
    "border:2px solid red",
    "overflow:hidden",
    "visibility:hidden",
    "white-space:pre",
    "white-space:nowrap",
    "text-align:justify",
    "text-align:center",
    "font-size:2em",
    "line-height:0",
    "text-transform:uppercase",
    "list-style-position:inside",
];

const WORDS: &[&str] = &["a", "lorem", "ipsum dolor", " ", "\u{4E2D}\u{6587}", "x\ty", "supercalifragilistic"];

/// A small random HTML document.
#[derive(Debug, Clone)]
struct Document(String);

impl Arbitrary for Document {
    fn arbitrary(g: &mut Gen) -> Self {
        let mut html = String::new();
        let mut open: Vec<&str> = Vec::new();
        let steps = usize::arbitrary(g) % 40;
        for _ in 0..steps {
            match u8::arbitrary(g) % 4 {
                0 | 1 => {
                    let tag = *g.choose(TAGS).unwrap_or(&"div");
                    let style = *g.choose(DECLARATIONS).unwrap_or(&"");
                    html.push_str(&format!("<{tag} style='{style}'>"));
                    if tag != "br" {
                        open.push(tag);
                    }
                }
                2 => html.push_str(g.choose(WORDS).unwrap_or(&"")),
                _ => {
                    if let Some(tag) = open.pop() {
                        html.push_str(&format!("</{tag}>"));
                    }
                }
            }
        }
        Self(html)
    }
}

#[quickcheck]
fn prop_layout_satisfies_invariants(doc: Document, width: u16) -> bool {
    let tree = layout_tree(&quokka_html::parse_document(&doc.0), f32::from(width % 1200), 300.0);
    let violations = check_fragment_tree(&tree);
    if !violations.is_empty() {
        eprintln!("{:?}\n{violations:#?}", doc.0);
    }
    violations.is_empty()
}

#[quickcheck]
fn prop_paint_satisfies_invariants(doc: Document) -> bool {
    let tree = layout_tree(&quokka_html::parse_document(&doc.0), 320.0, 240.0);
    check_display_list(&paint(&tree)).is_empty()
}

#[quickcheck]
fn prop_output_is_deterministic(doc: Document) -> bool {
    let render = || {
        let tree = layout_tree(&quokka_html::parse_document(&doc.0), 320.0, 240.0);
        let list = paint(&tree);
        (
            fragment_tree_to_json(&tree).unwrap_or_default(),
            display_list_to_json(&list).unwrap_or_default(),
        )
    };
    render() == render()
}

#[test]
fn test_identical_markup_gives_identical_json() {
    let html = "<style>p{color:navy}</style><ul><li>one</li><li style='float:right'>two</li></ul><p>text <b>bold</b></p>";
    let first = layout_tree(&quokka_html::parse_document(html), 400.0, 300.0);
    let second = layout_tree(&quokka_html::parse_document(html), 400.0, 300.0);
    assert_eq!(
        fragment_tree_to_json(&first).unwrap(),
        fragment_tree_to_json(&second).unwrap()
    );
    assert_eq!(
        display_list_to_json(&paint(&first)).unwrap(),
        display_list_to_json(&paint(&second)).unwrap()
    );
}

#[test]
fn test_negative_and_huge_viewports_are_sanitized() {
    for (w, h) in [(-10.0, -10.0), (f32::NAN, 100.0), (f32::INFINITY, 1.0)] {
        let tree = layout_tree(&quokka_html::parse_document("<p>x</p>"), w, h);
        assert!(check_fragment_tree(&tree).is_empty(), "viewport {w}x{h}");
    }
}

#[test]
fn test_nested_huge_em_sizes_give_finite_geometry() {
    let html = "<div style='font-size:1e12px'><div style='font-size:1e12em'><div style='font-size:1e12em'>\
                <div style='font-size:1e12em;width:1e12em;line-height:1e12'>x y</div></div></div></div>";
    let tree = layout_tree(&quokka_html::parse_document(html), 800.0, 600.0);
    assert_eq!(check_fragment_tree(&tree), vec![]);
    assert_eq!(check_display_list(&paint(&tree)), vec![]);
}
