//! System fonts for glyph rasterization.
//!
//! Layout measures text with the metrics stored in a
//! [`FontDatabase`](quokka_css::FontDatabase). The raster backend can draw
//! real glyphs from fonts installed on the machine; when none are found it
//! draws deterministic box glyphs instead.

use std::sync::Arc;

use fontdue::{Font, FontSettings};
use log::{debug, warn};
use quokka_css::layout::font::{Coverage, FontFace, FontMetrics};
use quokka_css::style::FontStyle;

/// Common system font paths to search for a default (regular) font.
const FONT_SEARCH_PATHS: &[&str] = &[
    // macOS
    "/System/Library/Fonts/Helvetica.ttc",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    // Linux
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    // Windows
    "C:\\Windows\\Fonts\\arial.ttf",
];

const FONT_BOLD_SEARCH_PATHS: &[&str] = &[
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSansBold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

const FONT_ITALIC_SEARCH_PATHS: &[&str] = &[
    "/System/Library/Fonts/Supplemental/Arial Italic.ttf",
    "/Library/Fonts/Arial Italic.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Oblique.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Oblique.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Italic.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSansOblique.ttf",
    "C:\\Windows\\Fonts\\ariali.ttf",
];

const FONT_BOLD_ITALIC_SEARCH_PATHS: &[&str] = &[
    "/System/Library/Fonts/Supplemental/Arial Bold Italic.ttf",
    "/Library/Fonts/Arial Bold Italic.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-BoldOblique.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-BoldOblique.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-BoldItalic.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSansBoldOblique.ttf",
    "C:\\Windows\\Fonts\\arialbi.ttf",
];

/// Regular, bold, italic and bold-italic faces loaded from the system.
pub struct SystemFonts {
    regular: Arc<Font>,
    bold: Option<Arc<Font>>,
    italic: Option<Arc<Font>>,
    bold_italic: Option<Arc<Font>>,
}

impl SystemFonts {
    /// Search the usual install locations. Returns `None` when no regular
    /// face exists.
    #[must_use]
    pub fn load() -> Option<Self> {
        let Some(regular) = load_font_from_paths(FONT_SEARCH_PATHS, "regular") else {
            warn!("no system font found, text will be drawn as box glyphs");
            return None;
        };
        Some(Self {
            regular,
            bold: load_font_from_paths(FONT_BOLD_SEARCH_PATHS, "bold"),
            italic: load_font_from_paths(FONT_ITALIC_SEARCH_PATHS, "italic"),
            bold_italic: load_font_from_paths(FONT_BOLD_ITALIC_SEARCH_PATHS, "bold-italic"),
        })
    }

    /// Parse a single font file's bytes as the regular face.
    #[must_use]
    pub fn from_bytes(data: Vec<u8>) -> Option<Self> {
        let regular = Font::from_bytes(data, FontSettings::default()).ok()?;
        Some(Self {
            regular: Arc::new(regular),
            bold: None,
            italic: None,
            bold_italic: None,
        })
    }

    /// The best available face, falling back through exact match, partial
    /// match, then regular.
    #[must_use]
    pub fn select(&self, weight: u16, style: FontStyle) -> &Font {
        let bold = weight >= 600;
        let italic = style != FontStyle::Normal;
        let face = match (bold, italic) {
            (true, true) => self
                .bold_italic
                .as_ref()
                .or(self.bold.as_ref())
                .or(self.italic.as_ref()),
            (true, false) => self.bold.as_ref(),
            (false, true) => self.italic.as_ref(),
            (false, false) => None,
        };
        face.unwrap_or(&self.regular)
    }

    /// A font face whose layout metrics come from the regular system font.
    ///
    /// Adding it to a [`FontDatabase`](quokka_css::FontDatabase) makes layout
    /// machine-dependent, so it is opt-in.
    #[must_use]
    pub fn face(&self, family: &str) -> FontFace {
        FontFace {
            family: family.to_string(),
            weight: 400,
            style: FontStyle::Normal,
            small_caps: false,
            coverage: Coverage::All,
            metrics: Arc::new(FontdueFontMetrics {
                font: Arc::clone(&self.regular),
            }),
        }
    }
}

fn load_font_from_paths(paths: &[&str], label: &str) -> Option<Arc<Font>> {
    for path in paths {
        if let Ok(data) = std::fs::read(path)
            && let Ok(font) = Font::from_bytes(data, FontSettings::default())
        {
            debug!("loaded {label} font: {path}");
            return Some(Arc::new(font));
        }
    }
    None
}

/// Font metrics backed by fontdue's per-glyph metrics.
///
/// [§ 10.8 Line height calculations](https://www.w3.org/TR/CSS2/visudet.html#line-height)
///
/// "CSS assumes that every font has font metrics that specify a
/// characteristic height above the baseline and a depth below it."
///
/// Uses `Font::metrics()` rather than `Font::rasterize()` so measuring never
/// generates bitmaps.
pub struct FontdueFontMetrics {
    font: Arc<Font>,
}

impl FontMetrics for FontdueFontMetrics {
    fn advance(&self, ch: char, font_size: f32) -> f32 {
        if ch.is_control() {
            return 0.0;
        }
        self.font.metrics(ch, font_size).advance_width
    }

    fn ascent(&self, font_size: f32) -> f32 {
        self.font
            .horizontal_line_metrics(font_size)
            .map_or(font_size * 0.8, |m| m.ascent)
    }

    fn descent(&self, font_size: f32) -> f32 {
        // fontdue reports descent as a negative offset.
        self.font
            .horizontal_line_metrics(font_size)
            .map_or(font_size * 0.2, |m| -m.descent)
    }
}
