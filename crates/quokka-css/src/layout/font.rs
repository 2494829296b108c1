//! Font metrics and font matching.
//!
//! [CSS 2.1 § 15.5 Font matching algorithm](https://www.w3.org/TR/CSS2/fonts.html#algorithm)
//!
//! Layout never touches font files. Faces carry a [`FontMetrics`]
//! implementation; the built-in faces use fixed per-character ratios so
//! layout is identical on every machine.

use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;

use super::fragment::ResolvedFont;
use crate::style::{ComputedStyle, FontStyle, FontVariant};

/// Font metrics interface for text measurement during layout.
///
/// [§ 10.8 Line height calculations](https://www.w3.org/TR/CSS2/visudet.html#line-height)
///
/// "CSS assumes that every font has font metrics that specify a
/// characteristic height above the baseline and a depth below it."
pub trait FontMetrics: Send + Sync {
    /// Advance width of one character.
    fn advance(&self, ch: char, font_size: f32) -> f32;

    /// Height above the baseline.
    fn ascent(&self, font_size: f32) -> f32;

    /// Depth below the baseline, positive.
    fn descent(&self, font_size: f32) -> f32;

    /// Total advance of a string.
    fn text_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars().map(|c| self.advance(c, font_size)).sum()
    }
}

/// Glyph width classes of the built-in metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphWidths {
    /// Proportional text: narrow, average and wide glyph classes.
    Proportional,
    /// Every glyph 0.6em.
    Monospace,
}

/// Fixed-ratio metrics.
///
/// Ratios approximate common Latin text faces: ascent 0.8em, descent 0.2em,
/// proportional advances between 0.28em and 0.9em.
#[derive(Debug, Clone, Copy)]
pub struct ApproximateFontMetrics {
    widths: GlyphWidths,
    bold: bool,
}

impl ApproximateFontMetrics {
    /// Metrics of the given width class.
    #[must_use]
    pub const fn new(widths: GlyphWidths, bold: bool) -> Self {
        Self { widths, bold }
    }

    fn ratio(&self, ch: char) -> f32 {
        if self.widths == GlyphWidths::Monospace {
            return 0.6;
        }
        let base = match ch {
            '\u{200B}' | '\u{00AD}' => 0.0,
            'i' | 'j' | 'l' | '!' | '|' | '.' | ',' | ':' | ';' | '\'' | 'I' => 0.28,
            ' ' | 'f' | 't' | 'r' | '(' | ')' | '[' | ']' | '-' => 0.33,
            'm' | 'w' | 'M' | 'W' | '@' => 0.85,
            c if c.is_ascii_uppercase() => 0.68,
            c if c.is_ascii_digit() => 0.55,
            c if c.is_ascii() => 0.5,
            c if is_wide(c) => 1.0,
            _ => 0.6,
        };
        if self.bold { base * 1.06 } else { base }
    }
}

fn is_wide(c: char) -> bool {
    matches!(u32::from(c), 0x1100..=0x115F | 0x2E80..=0xA4CF | 0xAC00..=0xD7A3 | 0xF900..=0xFAFF | 0xFF00..=0xFF60)
}

impl FontMetrics for ApproximateFontMetrics {
    fn advance(&self, ch: char, font_size: f32) -> f32 {
        self.ratio(ch) * font_size
    }

    fn ascent(&self, font_size: f32) -> f32 {
        font_size * 0.8
    }

    fn descent(&self, font_size: f32) -> f32 {
        font_size * 0.2
    }
}

/// Which characters a face can draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Coverage {
    /// Every character.
    All,
    /// Listed ranges only.
    Ranges(Vec<RangeInclusive<char>>),
}

impl Coverage {
    /// Scripts covered by the built-in text faces.
    #[must_use]
    pub fn latin_greek_cyrillic() -> Self {
        Self::Ranges(vec![
            '\u{0000}'..='\u{024F}',
            '\u{0370}'..='\u{052F}',
            '\u{1E00}'..='\u{1FFF}',
            '\u{2000}'..='\u{206F}',
            '\u{20A0}'..='\u{20CF}',
            '\u{2100}'..='\u{214F}',
            '\u{2190}'..='\u{21FF}',
            '\u{25A0}'..='\u{25FF}',
        ])
    }

    /// Whether `ch` is drawable.
    #[must_use]
    pub fn covers(&self, ch: char) -> bool {
        match self {
            Self::All => true,
            Self::Ranges(ranges) => ranges.iter().any(|r| r.contains(&ch)),
        }
    }
}

/// One face in a [`FontDatabase`].
#[derive(Clone)]
pub struct FontFace {
    /// Family name, lowercase.
    pub family: String,
    /// Weight, 100 to 900.
    pub weight: u16,
    /// Style.
    pub style: FontStyle,
    /// True for a real small-caps face.
    pub small_caps: bool,
    /// Drawable characters.
    pub coverage: Coverage,
    /// Measurement.
    pub metrics: Arc<dyn FontMetrics>,
}

impl fmt::Debug for FontFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontFace")
            .field("family", &self.family)
            .field("weight", &self.weight)
            .field("style", &self.style)
            .field("small_caps", &self.small_caps)
            .finish_non_exhaustive()
    }
}

/// Index of a face in a [`FontDatabase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaceId(pub usize);

/// Scale applied to lowercase letters in synthesized small caps.
pub const SMALL_CAPS_SCALE: f32 = 0.7;

/// An immutable set of faces with CSS font matching.
#[derive(Debug, Clone)]
pub struct FontDatabase {
    /// Faces; index 0 is the last-resort face.
    faces: Vec<FontFace>,
    default_family: String,
}

/// Family name of the face that covers every character.
pub const LAST_RESORT_FAMILY: &str = "last-resort";

impl Default for FontDatabase {
    fn default() -> Self {
        Self::with_builtin_faces()
    }
}

impl FontDatabase {
    /// A database holding only the last-resort face.
    #[must_use]
    pub fn empty(default_family: &str) -> Self {
        Self {
            faces: vec![FontFace {
                family: LAST_RESORT_FAMILY.to_string(),
                weight: 400,
                style: FontStyle::Normal,
                small_caps: false,
                coverage: Coverage::All,
                metrics: Arc::new(ApproximateFontMetrics::new(GlyphWidths::Proportional, false)),
            }],
            default_family: default_family.to_ascii_lowercase(),
        }
    }

    /// The generic families `serif`, `sans-serif` and `monospace` in
    /// regular, bold, italic and bold italic, defaulting to `serif`.
    #[must_use]
    pub fn with_builtin_faces() -> Self {
        let mut db = Self::empty("serif");
        for (family, widths) in [
            ("serif", GlyphWidths::Proportional),
            ("sans-serif", GlyphWidths::Proportional),
            ("monospace", GlyphWidths::Monospace),
        ] {
            for weight in [400, 700] {
                for style in [FontStyle::Normal, FontStyle::Italic] {
                    db.add_face(FontFace {
                        family: family.to_string(),
                        weight,
                        style,
                        small_caps: false,
                        coverage: Coverage::latin_greek_cyrillic(),
                        metrics: Arc::new(ApproximateFontMetrics::new(widths, weight >= 600)),
                    });
                }
            }
        }
        db
    }

    /// Add a face.
    pub fn add_face(&mut self, mut face: FontFace) {
        face.family = face.family.to_ascii_lowercase();
        self.faces.push(face);
    }

    /// The family used when no listed family matches.
    #[must_use]
    pub fn default_family(&self) -> &str {
        &self.default_family
    }

    /// Look up a face.
    #[must_use]
    pub fn face(&self, id: FaceId) -> &FontFace {
        self.faces.get(id.0).unwrap_or(&self.faces[0])
    }

    /// [§ 15.5 Font matching algorithm](https://www.w3.org/TR/CSS2/fonts.html#algorithm)
    ///
    /// Pick the face for one character: each listed family in order, then
    /// the default family, then the last-resort face. Within a family the
    /// style must match (italic and oblique substitute for each other, then
    /// normal) and the weight is the nearest available one.
    ///
    /// Returns the face and whether small caps must be synthesized.
    #[must_use]
    pub fn match_char(
        &self,
        families: &[String],
        weight: u16,
        style: FontStyle,
        variant: FontVariant,
        ch: char,
    ) -> (FaceId, bool) {
        let wants_small_caps = variant == FontVariant::SmallCaps;
        let default = [self.default_family.clone()];
        for family in families.iter().chain(default.iter()) {
            let family = family.to_ascii_lowercase();
            let candidates: Vec<usize> = (1..self.faces.len())
                .filter(|&i| self.faces[i].family == family && self.faces[i].coverage.covers(ch))
                .collect();
            if candidates.is_empty() {
                continue;
            }
            let candidates = if wants_small_caps
                && candidates.iter().any(|&i| self.faces[i].small_caps)
            {
                candidates.into_iter().filter(|&i| self.faces[i].small_caps).collect()
            } else {
                candidates.into_iter().filter(|&i| !self.faces[i].small_caps).collect::<Vec<_>>()
            };
            let Some(styled) = self.filter_style(&candidates, style) else {
                continue;
            };
            let weights: Vec<u16> = styled.iter().map(|&i| self.faces[i].weight).collect();
            let Some(chosen) = nearest_weight(weight, &weights) else {
                continue;
            };
            if let Some(&index) = styled.iter().find(|&&i| self.faces[i].weight == chosen) {
                let synthesize = wants_small_caps && !self.faces[index].small_caps;
                return (FaceId(index), synthesize);
            }
        }
        (FaceId(0), wants_small_caps)
    }

    fn filter_style(&self, candidates: &[usize], style: FontStyle) -> Option<Vec<usize>> {
        let order: &[FontStyle] = match style {
            FontStyle::Normal => &[FontStyle::Normal, FontStyle::Oblique, FontStyle::Italic],
            FontStyle::Italic => &[FontStyle::Italic, FontStyle::Oblique, FontStyle::Normal],
            FontStyle::Oblique => &[FontStyle::Oblique, FontStyle::Italic, FontStyle::Normal],
        };
        order.iter().find_map(|&wanted| {
            let matching: Vec<usize> = candidates
                .iter()
                .copied()
                .filter(|&i| self.faces[i].style == wanted)
                .collect();
            (!matching.is_empty()).then_some(matching)
        })
    }

    /// The font description written into fragments for a face.
    #[must_use]
    pub fn describe(&self, id: FaceId, size: f32) -> ResolvedFont {
        let face = self.face(id);
        ResolvedFont {
            family: face.family.clone(),
            size,
            weight: face.weight,
            style: face.style,
        }
    }

    /// Ascent and descent of the primary face for a style, used for struts
    /// and inline box content areas.
    #[must_use]
    pub fn primary_metrics(&self, style: &ComputedStyle) -> (f32, f32) {
        let (face, _) = self.match_char(
            &style.font_family,
            style.font_weight,
            style.font_style,
            FontVariant::Normal,
            ' ',
        );
        let metrics = &self.face(face).metrics;
        (metrics.ascent(style.font_size), metrics.descent(style.font_size))
    }
}

/// [CSS Fonts 3 § 5.2 step 4](https://www.w3.org/TR/css-fonts-3/#font-style-matching)
///
/// "If the desired weight is less than 400, weights below the desired weight
/// are checked in descending order followed by weights above the desired
/// weight in ascending order until a match is found. If the desired weight
/// is greater than 500, weights above the desired weight are checked in
/// ascending order followed by weights below the desired weight in
/// descending order until a match is found. If the desired weight is 400,
/// 500 is checked first and then the rule for desired weights less than 400
/// is used. If the desired weight is 500, 400 is checked first and then the
/// rule for desired weights less than 400 is used."
#[must_use]
pub fn nearest_weight(desired: u16, available: &[u16]) -> Option<u16> {
    if available.contains(&desired) {
        return Some(desired);
    }
    let lighter = || available.iter().copied().filter(|&w| w < desired).max();
    let darker = || available.iter().copied().filter(|&w| w > desired).min();
    match desired {
        400 if available.contains(&500) => Some(500),
        500 if available.contains(&400) => Some(400),
        0..=500 => lighter().or_else(darker),
        _ => darker().or_else(lighter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn families(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_nearest_weight_rules() {
        assert_eq!(nearest_weight(400, &[300, 500, 700]), Some(500));
        assert_eq!(nearest_weight(500, &[400, 600]), Some(400));
        assert_eq!(nearest_weight(300, &[100, 400]), Some(100));
        assert_eq!(nearest_weight(300, &[400, 700]), Some(400));
        assert_eq!(nearest_weight(600, &[400, 800]), Some(800));
        assert_eq!(nearest_weight(600, &[400, 500]), Some(500));
        assert_eq!(nearest_weight(400, &[]), None);
    }

    #[test]
    fn test_match_falls_through_families() {
        let db = FontDatabase::with_builtin_faces();
        let (face, synth) = db.match_char(
            &families(&["No Such Font", "monospace"]),
            700,
            FontStyle::Normal,
            FontVariant::Normal,
            'a',
        );
        assert_eq!(db.face(face).family, "monospace");
        assert_eq!(db.face(face).weight, 700);
        assert!(!synth);
    }

    #[test]
    fn test_match_defaults_and_oblique_substitutes_italic() {
        let db = FontDatabase::with_builtin_faces();
        let (face, _) = db.match_char(&[], 400, FontStyle::Oblique, FontVariant::Normal, 'a');
        assert_eq!(db.face(face).family, "serif");
        assert_eq!(db.face(face).style, FontStyle::Italic);
    }

    #[test]
    fn test_uncovered_char_uses_last_resort() {
        let db = FontDatabase::with_builtin_faces();
        let (face, _) = db.match_char(&[], 400, FontStyle::Normal, FontVariant::Normal, '\u{4E2D}');
        assert_eq!(db.face(face).family, LAST_RESORT_FAMILY);
    }

    #[test]
    fn test_small_caps_synthesized_without_face() {
        let db = FontDatabase::with_builtin_faces();
        let (_, synth) = db.match_char(&[], 400, FontStyle::Normal, FontVariant::SmallCaps, 'a');
        assert!(synth);
    }

    #[test]
    fn test_real_small_caps_face_preferred() {
        let mut db = FontDatabase::with_builtin_faces();
        db.add_face(FontFace {
            family: "Serif".to_string(),
            weight: 400,
            style: FontStyle::Normal,
            small_caps: true,
            coverage: Coverage::All,
            metrics: Arc::new(ApproximateFontMetrics::new(GlyphWidths::Monospace, false)),
        });
        let (face, synth) = db.match_char(&[], 400, FontStyle::Normal, FontVariant::SmallCaps, 'a');
        assert!(db.face(face).small_caps);
        assert!(!synth);
    }

    #[quickcheck]
    fn prop_nearest_weight_is_available(desired: u16, available: Vec<u16>) -> bool {
        nearest_weight(desired, &available).is_none_or(|w| available.contains(&w))
    }
}
