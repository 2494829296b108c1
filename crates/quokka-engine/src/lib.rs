//! Rendering pipeline for the Quokka engine.
//!
//! # Scope
//!
//! This crate provides:
//! - **Render functions** - HTML text to fragment tree, display list and
//!   pixels, with no hidden state between calls
//! - **Raster backend** - tiny-skia fills and clips, fontdue glyphs from
//!   system fonts or deterministic box glyphs
//! - **Images** - local `<img>` files decoded with the `image` crate
//! - **PNG encoding**
//!
//! # Pipeline
//!
//! ```text
//! HTML → DOM → Styles → Fragment tree → Display list → Pixels → PNG
//! ```
//!
//! # Not Implemented
//!
//! - Network fetch of any resource
//! - Script execution

/// System fonts and fontdue metrics.
pub mod fonts;
/// Decoded images.
pub mod images;
/// Software raster backend.
pub mod raster;

pub use quokka_css as css;
pub use quokka_dom as dom;
pub use quokka_html as html;

use std::path::PathBuf;
use std::sync::Arc;

use image::RgbaImage;
use log::debug;
use quokka_css::{
    DisplayList, FontDatabase, FragmentTree, LayoutOptions, compute_document_styles,
    layout_document,
};
use thiserror::Error;

pub use fonts::SystemFonts;
pub use images::ImageStore;
pub use raster::{Renderer, canvas_size, encode_png, save_png};

/// Default viewport width in px.
pub const DEFAULT_VIEWPORT_WIDTH: f32 = 800.0;
/// Default viewport height in px.
pub const DEFAULT_VIEWPORT_HEIGHT: f32 = 600.0;

/// Errors from rasterization and image loading.
///
/// Layout and paint never fail; only the pixel stages can.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The canvas for the page cannot be allocated.
    #[error("canvas size {width}x{height} is outside 1..={max}", max = raster::MAX_CANVAS_SIZE)]
    CanvasSize {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },
    /// PNG encoding failed.
    #[error("failed to encode PNG: {0}")]
    Encode(#[from] image::ImageError),
    /// An image file could not be opened or decoded.
    #[error("failed to read image '{}': {source}", path.display())]
    ImageRead {
        /// File that failed.
        path: PathBuf,
        /// Decoder error.
        #[source]
        source: image::ImageError,
    },
}

/// Everything a render needs besides the HTML.
///
/// The font database and image store are shared and immutable, so one set
/// of options can serve many renders, including concurrent ones.
#[derive(Clone)]
pub struct RenderOptions {
    /// Viewport width in px.
    pub viewport_width: f32,
    /// Viewport height in px.
    pub viewport_height: f32,
    /// Faces used for font matching and text measurement.
    pub fonts: Arc<FontDatabase>,
    /// Decoded images; also supplies intrinsic sizes to layout.
    pub images: Arc<ImageStore>,
    /// Glyph source for the raster backend. `None` draws box glyphs.
    pub system_fonts: Option<Arc<SystemFonts>>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::new(DEFAULT_VIEWPORT_WIDTH, DEFAULT_VIEWPORT_HEIGHT)
    }
}

impl RenderOptions {
    /// Built-in fonts, no images and box glyphs at the given viewport.
    #[must_use]
    pub fn new(viewport_width: f32, viewport_height: f32) -> Self {
        Self {
            viewport_width,
            viewport_height,
            fonts: Arc::new(FontDatabase::default()),
            images: Arc::new(ImageStore::new()),
            system_fonts: None,
        }
    }

    /// Use the given images.
    #[must_use]
    pub fn with_images(mut self, images: ImageStore) -> Self {
        self.images = Arc::new(images);
        self
    }

    /// Draw glyphs from system fonts when any are installed. Layout metrics
    /// are unchanged.
    #[must_use]
    pub fn with_system_fonts(mut self) -> Self {
        self.system_fonts = SystemFonts::load().map(Arc::new);
        self
    }

    fn layout_options(&self) -> LayoutOptions<'_> {
        LayoutOptions {
            viewport_width: self.viewport_width,
            viewport_height: self.viewport_height,
            fonts: &self.fonts,
            images: self.images.as_ref(),
        }
    }
}

/// All stages of one render.
#[derive(Debug, Clone)]
pub struct Rendering {
    /// Box geometry.
    pub fragments: FragmentTree,
    /// Paint program.
    pub display_list: DisplayList,
    /// Rasterized page.
    pub image: RgbaImage,
}

/// Parse, style and lay out `html` with the built-in fonts and no images.
///
/// Non-finite or negative viewport sizes are treated as zero. Never fails
/// and never panics on malformed input.
#[must_use]
pub fn render_to_fragment_tree(
    html: &str,
    viewport_width: f32,
    viewport_height: f32,
) -> FragmentTree {
    render_to_fragment_tree_with(html, &RenderOptions::new(viewport_width, viewport_height))
}

/// Parse, style and lay out `html` with custom fonts and images.
#[must_use]
pub fn render_to_fragment_tree_with(html: &str, options: &RenderOptions) -> FragmentTree {
    let dom = quokka_html::parse_document(html);
    let styles = compute_document_styles(&dom);
    let tree = layout_document(&dom, &styles, &options.layout_options());
    debug!("rendered {} fragments", tree.len());
    tree
}

/// Paint a fragment tree.
#[must_use]
pub fn render_to_display_list(tree: &FragmentTree) -> DisplayList {
    quokka_css::paint(tree)
}

/// Rasterize a display list onto a canvas sized to the fragment tree.
///
/// # Errors
///
/// Returns [`RenderError::CanvasSize`] when the page is too large to
/// allocate.
pub fn rasterize(
    tree: &FragmentTree,
    display_list: &DisplayList,
    options: &RenderOptions,
) -> Result<RgbaImage, RenderError> {
    let (width, height) = canvas_size(tree);
    let mut renderer = Renderer::new(
        width,
        height,
        &options.fonts,
        options.system_fonts.as_deref(),
        &options.images,
    )?;
    renderer.render(display_list);
    Ok(renderer.finish())
}

/// Run every stage for `html`.
///
/// # Errors
///
/// See [`rasterize`].
pub fn render(html: &str, options: &RenderOptions) -> Result<Rendering, RenderError> {
    let fragments = render_to_fragment_tree_with(html, options);
    let display_list = render_to_display_list(&fragments);
    let image = rasterize(&fragments, &display_list, options)?;
    Ok(Rendering {
        fragments,
        display_list,
        image,
    })
}

/// Render `html` straight to PNG bytes. Identical input and options give
/// identical bytes.
///
/// # Errors
///
/// See [`rasterize`] and [`encode_png`].
pub fn render_to_png(html: &str, options: &RenderOptions) -> Result<Vec<u8>, RenderError> {
    encode_png(&render(html, options)?.image)
}
