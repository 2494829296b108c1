//! End-to-end render tests: HTML in, pixels out.

use image::{Rgba, RgbaImage};
use quokka_engine::{
    ImageStore, RenderOptions, render, render_to_display_list, render_to_fragment_tree,
    render_to_png,
};

const WHITE: [u8; 4] = [255, 255, 255, 255];

fn pixels(html: &str, width: f32, height: f32) -> RgbaImage {
    render(html, &RenderOptions::new(width, height))
        .expect("render succeeds")
        .image
}

#[test]
fn test_red_box_pixel() {
    let image = pixels(
        r#"<div style="width:100px;height:50px;background-color:red;"></div>"#,
        200.0,
        100.0,
    );
    assert_eq!((image.width(), image.height()), (200, 100));
    let [r, g, b, _] = image.get_pixel(10, 10).0;
    assert!(r > 200 && g < 50 && b < 50, "pixel (10,10) = {:?}", [r, g, b]);
    assert_eq!(image.get_pixel(150, 10).0, WHITE, "outside the box");
}

#[test]
fn test_list_without_marker_leaves_left_edge_blank() {
    let image = pixels(
        r#"<ul style="list-style-type:none"><li style="padding-left:40px">Item</li></ul>"#,
        200.0,
        100.0,
    );
    for y in 0..image.height() {
        for x in 0..35 {
            assert_eq!(image.get_pixel(x, y).0, WHITE, "pixel ({x},{y}) painted");
        }
    }
    let inked = image.pixels().any(|p| p.0 != WHITE);
    assert!(inked, "the item text must be drawn somewhere");
}

#[test]
fn test_identical_markup_gives_identical_png() {
    let html = r#"<html><head><style>
        p { color: navy; border: 2px dashed teal; padding: 4px }
        .f { float: left; width: 30px; height: 30px; background: orange }
    </style></head><body>
        <div class="f"></div><p>Some <b>bold</b> and <i>italic</i> text that wraps around the float.</p>
        <ol><li>one</li><li>two</li></ol>
    </body></html>"#;
    let options = RenderOptions::new(240.0, 160.0);
    let first = render_to_png(html, &options).unwrap();
    let second = render_to_png(html, &options).unwrap();
    assert!(first.starts_with(b"\x89PNG"), "PNG signature");
    assert_eq!(first, second);
}

#[test]
fn test_canvas_grows_with_content() {
    let image = pixels("<div style='height:500px'></div>", 100.0, 100.0);
    assert_eq!(image.width(), 100);
    assert!(
        (508..=516).contains(&image.height()),
        "content height plus body margins, got {}",
        image.height()
    );
}

#[test]
fn test_overflow_hidden_clips_child() {
    let image = pixels(
        "<div style='width:20px;height:20px;overflow:hidden'>\
         <div style='width:60px;height:60px;background:blue'></div></div>",
        100.0,
        100.0,
    );
    assert_eq!(image.get_pixel(10, 10).0, [0, 0, 255, 255]);
    assert_eq!(image.get_pixel(40, 40).0, WHITE, "clipped");
}

#[test]
fn test_image_drawn_at_intrinsic_size() {
    let mut store = ImageStore::new();
    assert!(store.insert("g.png", &RgbaImage::from_pixel(10, 10, Rgba([0, 255, 0, 255]))));
    let options = RenderOptions::new(100.0, 100.0).with_images(store);
    let image = render("<img src='g.png' style='display:block'>", &options)
        .unwrap()
        .image;
    assert_eq!(image.get_pixel(12, 12).0, [0, 255, 0, 255]);
    assert_eq!(image.get_pixel(20, 20).0, WHITE);
}

#[test]
fn test_pipeline_stages_agree() {
    let html = "<p>hello</p>";
    let tree = render_to_fragment_tree(html, 300.0, 200.0);
    let list = render_to_display_list(&tree);
    let rendering = render(html, &RenderOptions::new(300.0, 200.0)).unwrap();
    assert_eq!(tree, rendering.fragments);
    assert_eq!(list, rendering.display_list);
}

#[test]
fn test_degenerate_viewport_still_renders() {
    let rendering = render("<p>x</p>", &RenderOptions::new(f32::NAN, -5.0)).unwrap();
    assert!(rendering.image.width() >= 1);
    assert!(rendering.image.height() >= 1);
}
