//! Software raster backend.
//!
//! Executes a [`DisplayList`] into an RGBA pixel buffer with tiny-skia.
//!
//! ```text
//! Style → Layout → Paint → Raster
//!                    ↓        ↓
//!              DisplayList → Pixels
//! ```
//!
//! The backend knows nothing about CSS, layout, or the DOM. It executes
//! drawing commands in order on a white canvas. Rectangles are drawn
//! without anti-aliasing so the same list always yields the same pixels.

use std::path::Path;
use std::slice;

use anyhow::Result;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgba, RgbaImage};
use quokka_common::warning::warn_once;
use quokka_css::layout::{EdgeSizes, FontDatabase, FragmentTree, Rect, ResolvedFont};
use quokka_css::style::{BorderStyle, Edges, FontVariant};
use quokka_css::values::Color;
use quokka_css::{DisplayItem, DisplayList};
use tiny_skia::{
    FillRule, FilterQuality, Mask, Paint, PathBuilder, Pixmap, PixmapPaint, PremultipliedColorU8,
    Transform,
};

use crate::RenderError;
use crate::fonts::SystemFonts;
use crate::images::ImageStore;

/// Largest canvas side in pixels.
pub const MAX_CANVAS_SIZE: u32 = 16_384;

/// Font sizes above this draw box glyphs even when system fonts are
/// loaded, so glyph bitmaps stay small.
const MAX_RASTER_GLYPH_PX: f32 = 1024.0;

/// Pixel size of the canvas for a fragment tree: the viewport fragment's
/// border box, rounded up, at least one pixel per side.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn canvas_size(tree: &FragmentTree) -> (u32, u32) {
    let Some(root) = tree.get(tree.root) else {
        return (1, 1);
    };
    let side = |v: f32| {
        if v.is_finite() {
            (v.ceil().max(1.0).min(f32::from(u16::MAX))) as u32
        } else {
            1
        }
    };
    (side(root.width), side(root.height))
}

/// Software renderer that executes a display list to a pixel buffer.
pub struct Renderer<'a> {
    pixmap: Pixmap,
    /// Active clip masks; the last one is the intersection of all of them.
    /// `None` marks a clip whose mask could not be built.
    clips: Vec<Option<Mask>>,
    fonts: &'a FontDatabase,
    glyphs: Option<&'a SystemFonts>,
    images: &'a ImageStore,
}

impl<'a> Renderer<'a> {
    /// Create a white canvas.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::CanvasSize`] when a side is zero or larger
    /// than [`MAX_CANVAS_SIZE`].
    pub fn new(
        width: u32,
        height: u32,
        fonts: &'a FontDatabase,
        glyphs: Option<&'a SystemFonts>,
        images: &'a ImageStore,
    ) -> Result<Self, RenderError> {
        let too_large = width > MAX_CANVAS_SIZE || height > MAX_CANVAS_SIZE;
        let pixmap = (!too_large)
            .then(|| Pixmap::new(width, height))
            .flatten()
            .ok_or(RenderError::CanvasSize { width, height })?;
        let mut renderer = Self {
            pixmap,
            clips: Vec::new(),
            fonts,
            glyphs,
            images,
        };
        renderer.pixmap.fill(tiny_skia::Color::WHITE);
        Ok(renderer)
    }

    /// Execute a display list, drawing all commands to the pixel buffer.
    ///
    /// Commands are executed in order (back to front), which is the
    /// painting order established by the painter.
    pub fn render(&mut self, display_list: &DisplayList) {
        for item in display_list.items() {
            self.execute(item);
        }
    }

    fn execute(&mut self, item: &DisplayItem) {
        match item {
            DisplayItem::FillRect { rect, color } => self.fill_rect(*rect, *color),
            DisplayItem::DrawBorder {
                rect,
                widths,
                colors,
                styles,
            } => self.draw_border(*rect, widths, colors, styles),
            DisplayItem::DrawText {
                x,
                y,
                text,
                font,
                color,
            } => self.draw_text(text, *x, *y, font, *color),
            DisplayItem::DrawImage { rect, src } => self.draw_image(src, *rect),
            DisplayItem::Clip { rect } => self.push_clip(*rect),
            DisplayItem::Restore => {
                let _ = self.clips.pop();
            }
        }
    }

    fn mask(&self) -> Option<&Mask> {
        self.clips.last().and_then(Option::as_ref)
    }

    /// Fill a rectangle with the given color.
    fn fill_rect(&mut self, rect: Rect, color: Color) {
        if color.is_transparent() {
            return;
        }
        let Some(area) = skia_rect(rect) else { return };
        let paint = solid(color);
        let mask = self.clips.last().and_then(Option::as_ref);
        self.pixmap.fill_rect(area, &paint, Transform::identity(), mask);
    }

    /// [§ 11.1.1 overflow](https://www.w3.org/TR/CSS2/visufx.html#overflow)
    ///
    /// New clips intersect the active one. A degenerate rectangle clips
    /// everything.
    fn push_clip(&mut self, rect: Rect) {
        let path = skia_rect(rect).map(PathBuilder::from_rect);
        let blank = Mask::new(self.pixmap.width(), self.pixmap.height());
        let mask = match (path, self.mask()) {
            (None, _) => blank,
            (Some(path), Some(active)) => {
                let mut mask = active.clone();
                mask.intersect_path(&path, FillRule::Winding, false, Transform::identity());
                Some(mask)
            }
            (Some(path), None) => blank.map(|mut mask| {
                mask.fill_path(&path, FillRule::Winding, false, Transform::identity());
                mask
            }),
        };
        self.clips.push(mask);
    }

    /// [§ 8.5 Border properties](https://www.w3.org/TR/CSS2/box.html#border-properties)
    ///
    /// Each side is drawn inward from the border box. `dotted` and `dashed`
    /// sides are drawn as segments, `double` as two lines, and the 3D
    /// styles shade two of the four sides.
    fn draw_border(
        &mut self,
        rect: Rect,
        widths: &EdgeSizes,
        colors: &Edges<Color>,
        styles: &Edges<BorderStyle>,
    ) {
        let inner_height = (rect.height - widths.top - widths.bottom).max(0.0);
        let sides = [
            (
                Rect::new(rect.x, rect.y, rect.width, widths.top),
                widths.top,
                colors.top,
                styles.top,
                true,
                true,
            ),
            (
                Rect::new(
                    rect.right() - widths.right,
                    rect.y + widths.top,
                    widths.right,
                    inner_height,
                ),
                widths.right,
                colors.right,
                styles.right,
                false,
                false,
            ),
            (
                Rect::new(rect.x, rect.bottom() - widths.bottom, rect.width, widths.bottom),
                widths.bottom,
                colors.bottom,
                styles.bottom,
                true,
                false,
            ),
            (
                Rect::new(rect.x, rect.y + widths.top, widths.left, inner_height),
                widths.left,
                colors.left,
                styles.left,
                false,
                true,
            ),
        ];
        for (area, width, color, style, horizontal, top_left) in sides {
            if width <= 0.0 {
                continue;
            }
            match style {
                BorderStyle::None | BorderStyle::Hidden => {}
                BorderStyle::Solid => self.fill_rect(area, color),
                BorderStyle::Dotted => self.fill_dashes(area, width, horizontal, color),
                BorderStyle::Dashed => self.fill_dashes(area, width * 3.0, horizontal, color),
                BorderStyle::Double => {
                    let third = width / 3.0;
                    let (outer, inner) = if horizontal {
                        (
                            Rect::new(area.x, area.y, area.width, third),
                            Rect::new(area.x, area.bottom() - third, area.width, third),
                        )
                    } else {
                        (
                            Rect::new(area.x, area.y, third, area.height),
                            Rect::new(area.right() - third, area.y, third, area.height),
                        )
                    };
                    self.fill_rect(outer, color);
                    self.fill_rect(inner, color);
                }
                BorderStyle::Inset | BorderStyle::Groove => {
                    self.fill_rect(area, if top_left { shade(color) } else { color });
                }
                BorderStyle::Outset | BorderStyle::Ridge => {
                    self.fill_rect(area, if top_left { color } else { shade(color) });
                }
            }
        }
    }

    fn fill_dashes(&mut self, area: Rect, dash: f32, horizontal: bool, color: Color) {
        let dash = dash.max(1.0);
        let length = if horizontal { area.width } else { area.height };
        let mut offset = 0.0;
        while offset < length {
            let run = dash.min(length - offset);
            let segment = if horizontal {
                Rect::new(area.x + offset, area.y, run, area.height)
            } else {
                Rect::new(area.x, area.y + offset, area.width, run)
            };
            self.fill_rect(segment, color);
            offset += dash * 2.0;
        }
    }

    /// Draw text with its left edge at `x` and baseline at `y`.
    ///
    /// Glyphs advance by the layout metrics of the run's face, so text stays
    /// inside the boxes layout computed for it whichever glyph source draws
    /// it.
    fn draw_text(&mut self, text: &str, x: f32, y: f32, font: &ResolvedFont, color: Color) {
        if color.is_transparent() || font.size.is_nan() || font.size <= 0.0 {
            return;
        }
        let mut pen = x;
        for ch in text.chars() {
            let (face, _) = self.fonts.match_char(
                slice::from_ref(&font.family),
                font.weight,
                font.style,
                FontVariant::Normal,
                ch,
            );
            let advance = self.fonts.face(face).metrics.advance(ch, font.size);
            if !ch.is_whitespace() && !ch.is_control() {
                match self.glyphs {
                    Some(system) if font.size <= MAX_RASTER_GLYPH_PX => {
                        self.draw_glyph(system, ch, pen, y, font, color);
                    }
                    _ => self.draw_box_glyph(ch, pen, y, advance, font.size, color),
                }
            }
            pen += advance;
        }
    }

    /// Deterministic stand-in glyph: a filled box from the baseline up to
    /// cap height for capitals and digits, x-height otherwise.
    fn draw_box_glyph(
        &mut self,
        ch: char,
        pen: f32,
        baseline: f32,
        advance: f32,
        size: f32,
        color: Color,
    ) {
        let height = if ch.is_uppercase() || ch.is_ascii_digit() {
            size * 0.7
        } else {
            size * 0.5
        };
        let glyph = Rect::new(pen + advance * 0.1, baseline - height, advance * 0.8, height);
        self.fill_rect(glyph, color);
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_possible_wrap,
        clippy::too_many_arguments
    )]
    fn draw_glyph(
        &mut self,
        system: &SystemFonts,
        ch: char,
        pen: f32,
        baseline: f32,
        font: &ResolvedFont,
        color: Color,
    ) {
        let (metrics, bitmap) = system.select(font.weight, font.style).rasterize(ch, font.size);
        let Some(mut glyph) = Pixmap::new(metrics.width as u32, metrics.height as u32) else {
            return;
        };
        for (out, &coverage) in glyph.pixels_mut().iter_mut().zip(&bitmap) {
            let alpha = u16::from(coverage) * u16::from(color.a) / 255;
            let channel = |c: u8| (u16::from(c) * alpha / 255) as u8;
            if let Some(px) = PremultipliedColorU8::from_rgba(
                channel(color.r),
                channel(color.g),
                channel(color.b),
                alpha as u8,
            ) {
                *out = px;
            }
        }
        // fontdue's ymin is the offset of the bitmap's bottom edge above the
        // baseline.
        let left = pen.round() as i32 + metrics.xmin;
        let top = baseline.round() as i32 - metrics.ymin - metrics.height as i32;
        let mask = self.clips.last().and_then(Option::as_ref);
        self.pixmap.draw_pixmap(
            left,
            top,
            glyph.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            mask,
        );
    }

    /// Draw an image scaled to the destination rectangle with
    /// nearest-neighbor sampling.
    #[allow(clippy::cast_precision_loss)]
    fn draw_image(&mut self, src: &str, rect: Rect) {
        let Some(image) = self.images.get(src) else {
            warn_once("raster", &format!("no pixels for image '{src}'"));
            return;
        };
        if skia_rect(rect).is_none() {
            return;
        }
        let sx = rect.width / image.width() as f32;
        let sy = rect.height / image.height() as f32;
        let paint = PixmapPaint {
            quality: FilterQuality::Nearest,
            ..PixmapPaint::default()
        };
        let mask = self.clips.last().and_then(Option::as_ref);
        self.pixmap.draw_pixmap(
            0,
            0,
            image.as_ref(),
            &paint,
            Transform::from_row(sx, 0.0, 0.0, sy, rect.x, rect.y),
            mask,
        );
    }

    /// Finish rendering and return straight-alpha RGBA pixels.
    #[must_use]
    pub fn finish(self) -> RgbaImage {
        let mut image = RgbaImage::new(self.pixmap.width(), self.pixmap.height());
        for (out, pixel) in image.pixels_mut().zip(self.pixmap.pixels()) {
            let c = pixel.demultiply();
            *out = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
        }
        image
    }
}

fn skia_rect(rect: Rect) -> Option<tiny_skia::Rect> {
    if rect.width <= 0.0 || rect.height <= 0.0 {
        return None;
    }
    tiny_skia::Rect::from_xywh(rect.x, rect.y, rect.width, rect.height)
}

fn solid(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = false;
    paint
}

/// Darker variant for the shaded sides of 3D border styles.
#[allow(clippy::cast_possible_truncation)]
fn shade(color: Color) -> Color {
    let dim = |c: u8| (u16::from(c) * 2 / 3) as u8;
    Color {
        r: dim(color.r),
        g: dim(color.g),
        b: dim(color.b),
        a: color.a,
    }
}

/// Encode pixels as PNG. The same pixels always encode to the same bytes.
///
/// # Errors
///
/// Returns [`RenderError::Encode`] if the encoder fails.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, RenderError> {
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ExtendedColorType::Rgba8,
    )?;
    Ok(bytes)
}

/// Save the rendered image to a file.
///
/// # Errors
///
/// Returns an error if the image cannot be encoded or written.
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<()> {
    let bytes = encode_png(image)?;
    std::fs::write(path, bytes)
        .map_err(|e| anyhow::anyhow!("failed to save PNG to '{}': {e}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas(width: u32, height: u32, list: &DisplayList) -> RgbaImage {
        let fonts = FontDatabase::default();
        let images = ImageStore::new();
        let mut renderer = Renderer::new(width, height, &fonts, None, &images).unwrap();
        renderer.render(list);
        renderer.finish()
    }

    const RED: Color = Color {
        r: 255,
        g: 0,
        b: 0,
        a: 255,
    };

    #[test]
    fn test_fill_rect_is_pixel_exact() {
        let list: DisplayList = [DisplayItem::FillRect {
            rect: Rect::new(2.0, 2.0, 3.0, 3.0),
            color: RED,
        }]
        .into_iter()
        .collect();
        let image = canvas(8, 8, &list);
        assert_eq!(image.get_pixel(2, 2).0, [255, 0, 0, 255]);
        assert_eq!(image.get_pixel(4, 4).0, [255, 0, 0, 255]);
        assert_eq!(image.get_pixel(5, 5).0, [255, 255, 255, 255]);
        assert_eq!(image.get_pixel(1, 2).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_clip_limits_fill_until_restore() {
        let list: DisplayList = [
            DisplayItem::Clip {
                rect: Rect::new(0.0, 0.0, 4.0, 4.0),
            },
            DisplayItem::FillRect {
                rect: Rect::new(0.0, 0.0, 8.0, 8.0),
                color: RED,
            },
            DisplayItem::Restore,
            DisplayItem::FillRect {
                rect: Rect::new(6.0, 6.0, 2.0, 2.0),
                color: Color::BLACK,
            },
        ]
        .into_iter()
        .collect();
        let image = canvas(8, 8, &list);
        assert_eq!(image.get_pixel(1, 1).0, [255, 0, 0, 255]);
        assert_eq!(image.get_pixel(5, 5).0, [255, 255, 255, 255], "clipped out");
        assert_eq!(image.get_pixel(7, 7).0, [0, 0, 0, 255], "restored");
    }

    #[test]
    fn test_empty_clip_hides_everything() {
        let list: DisplayList = [
            DisplayItem::Clip {
                rect: Rect::new(0.0, 0.0, 0.0, 4.0),
            },
            DisplayItem::FillRect {
                rect: Rect::new(0.0, 0.0, 8.0, 8.0),
                color: RED,
            },
            DisplayItem::Restore,
        ]
        .into_iter()
        .collect();
        let image = canvas(8, 8, &list);
        assert!(image.pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn test_border_sides_drawn_inward() {
        let list: DisplayList = [DisplayItem::DrawBorder {
            rect: Rect::new(0.0, 0.0, 10.0, 10.0),
            widths: EdgeSizes {
                top: 2.0,
                right: 0.0,
                bottom: 0.0,
                left: 2.0,
            },
            colors: Edges::all(RED),
            styles: Edges::all(BorderStyle::Solid),
        }]
        .into_iter()
        .collect();
        let image = canvas(10, 10, &list);
        assert_eq!(image.get_pixel(5, 1).0, [255, 0, 0, 255]);
        assert_eq!(image.get_pixel(1, 5).0, [255, 0, 0, 255]);
        assert_eq!(image.get_pixel(5, 5).0, [255, 255, 255, 255]);
        assert_eq!(image.get_pixel(9, 9).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_box_glyphs_sit_on_baseline() {
        let list: DisplayList = [DisplayItem::DrawText {
            x: 0.0,
            y: 20.0,
            text: "H".to_string(),
            font: FontDatabase::default().describe(quokka_css::layout::FaceId(1), 20.0),
            color: Color::BLACK,
        }]
        .into_iter()
        .collect();
        let image = canvas(30, 30, &list);
        assert_eq!(image.get_pixel(5, 19).0, [0, 0, 0, 255]);
        assert_eq!(image.get_pixel(5, 21).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_oversized_canvas_is_an_error() {
        let fonts = FontDatabase::default();
        let images = ImageStore::new();
        assert!(matches!(
            Renderer::new(MAX_CANVAS_SIZE + 1, 1, &fonts, None, &images),
            Err(RenderError::CanvasSize { .. })
        ));
    }
}
