use std::str::FromStr;

use serde::Serialize;
use strum_macros::{Display, EnumString};

use super::ValueError;
use crate::parser::ComponentValue;
use crate::tokenizer::{CSSToken, CSSTokenizer};

/// Pixels per inch. [CSS 2.1 § 4.3.2](https://www.w3.org/TR/CSS2/syndata.html#length-units)
/// fixes the reference pixel at 1/96in.
pub const PX_PER_IN: f32 = 96.0;

/// Largest magnitude a resolved length may take. Products of large `em`
/// chains saturate here so layout geometry stays finite.
pub const MAX_PX: f32 = 1.0e9;

/// Clamp a resolved length to `±MAX_PX`; NaN becomes zero.
#[must_use]
pub fn saturate_px(px: f32) -> f32 {
    if px.is_nan() {
        0.0
    } else {
        px.clamp(-MAX_PX, MAX_PX)
    }
}

/// [§ 4.3.2 Lengths](https://www.w3.org/TR/CSS2/syndata.html#length-units)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LengthUnit {
    /// Pixels; 1px is 1/96in.
    Px,
    /// The computed font size of the element (of the parent for `font-size`).
    Em,
    /// Font size of the root element.
    Rem,
    /// The x-height of the font, approximated as 0.5em.
    Ex,
    /// Points; 1pt is 1/72in.
    Pt,
    /// Picas; 1pc is 12pt.
    Pc,
    /// Inches; 1in is 2.54cm.
    In,
    /// Centimeters.
    Cm,
    /// Millimeters.
    Mm,
    /// `%` of a reference length supplied by the property.
    #[strum(serialize = "%")]
    Percent,
}

/// A parsed `<length>` or `<percentage>`.
///
/// Parsing never fails outright: a malformed input yields `has_error = true`
/// and the declaration that owns it is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CssLength {
    /// Numeric value in `unit`.
    pub value: f32,
    /// Unit of `value`.
    pub unit: LengthUnit,
    /// Set when the source was not a valid length.
    pub has_error: bool,
}

/// Font sizes needed to resolve relative units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LengthContext {
    /// Font size the `em` unit refers to.
    pub font_size: f32,
    /// Font size of the root element, for `rem`.
    pub root_font_size: f32,
}

impl CssLength {
    /// A valid pixel length.
    #[must_use]
    pub const fn px(value: f32) -> Self {
        Self {
            value,
            unit: LengthUnit::Px,
            has_error: false,
        }
    }

    const fn error() -> Self {
        Self {
            value: 0.0,
            unit: LengthUnit::Px,
            has_error: true,
        }
    }

    /// Interpret a single token as a length.
    ///
    /// "After a zero length, the unit identifier is optional." Any other bare
    /// number is an error, as is an unknown unit.
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn from_token(token: &CSSToken) -> Self {
        match token {
            CSSToken::Number { value, .. } if *value == 0.0 => Self::px(0.0),
            CSSToken::Percentage(value) => Self {
                value: *value as f32,
                unit: LengthUnit::Percent,
                has_error: false,
            },
            CSSToken::Dimension { value, unit } => match LengthUnit::from_str(unit) {
                Ok(LengthUnit::Percent) | Err(_) => Self::error(),
                Ok(unit) => Self {
                    value: *value as f32,
                    unit,
                    has_error: false,
                },
            },
            _ => Self::error(),
        }
    }

    /// Interpret a component value as a length.
    #[must_use]
    pub fn from_component(value: &ComponentValue) -> Self {
        value.as_token().map_or_else(Self::error, Self::from_token)
    }

    /// Like [`CssLength::from_component`] but reporting why it failed.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::UnitlessLength`] for a bare non-zero number and
    /// [`ValueError::UnknownUnit`] for any other non-length.
    pub fn try_from_component(value: &ComponentValue) -> Result<Self, ValueError> {
        let length = Self::from_component(value);
        if !length.has_error {
            return Ok(length);
        }
        Err(match value.as_token() {
            Some(CSSToken::Number { value, .. }) => ValueError::UnitlessLength(value.to_string()),
            Some(CSSToken::Dimension { unit, .. }) => ValueError::UnknownUnit(unit.clone()),
            _ => ValueError::UnknownUnit(crate::parser::css_parser::component_to_string(value)),
        })
    }

    /// True for percentages.
    #[must_use]
    pub fn is_percent(&self) -> bool {
        self.unit == LengthUnit::Percent
    }

    /// Resolve to pixels. Percentages resolve against `percent_base`.
    #[must_use]
    pub fn to_px(&self, ctx: &LengthContext, percent_base: f32) -> f32 {
        saturate_px(match self.unit {
            LengthUnit::Px => self.value,
            LengthUnit::Em => self.value * ctx.font_size,
            LengthUnit::Rem => self.value * ctx.root_font_size,
            LengthUnit::Ex => self.value * ctx.font_size * 0.5,
            LengthUnit::Pt => self.value * PX_PER_IN / 72.0,
            LengthUnit::Pc => self.value * PX_PER_IN / 6.0,
            LengthUnit::In => self.value * PX_PER_IN,
            LengthUnit::Cm => self.value * PX_PER_IN / 2.54,
            LengthUnit::Mm => self.value * PX_PER_IN / 25.4,
            LengthUnit::Percent => self.value * percent_base / 100.0,
        })
    }

    /// Convert an em length to points given the base font size in points.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::NotEm`] when the length is not in em units.
    pub fn convert_em_to_points(&self, base_font_size_pt: f32) -> Result<f32, ValueError> {
        if self.unit != LengthUnit::Em || self.has_error {
            return Err(ValueError::NotEm);
        }
        Ok(self.value * base_font_size_pt)
    }

    /// Convert an em length to pixels given the base font size in pixels.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::NotEm`] when the length is not in em units.
    pub fn convert_em_to_pixels(&self, base_font_size_px: f32) -> Result<f32, ValueError> {
        if self.unit != LengthUnit::Em || self.has_error {
            return Err(ValueError::NotEm);
        }
        Ok(self.value * base_font_size_px)
    }
}

/// Parse a length from source text, e.g. `"12px"`, `"1.5em"`, `"0"`, `"50%"`.
///
/// Anything other than exactly one length token (surrounding whitespace
/// allowed) sets `has_error`.
#[must_use]
pub fn parse_length(raw: &str) -> CssLength {
    let tokens = CSSTokenizer::tokenize(raw);
    let mut significant = tokens
        .iter()
        .filter(|t| !t.is_whitespace() && !t.is_eof());
    match (significant.next(), significant.next()) {
        (Some(token), None) => CssLength::from_token(token),
        _ => CssLength::error(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CTX: LengthContext = LengthContext {
        font_size: 20.0,
        root_font_size: 16.0,
    };

    #[test]
    fn parses_known_units() {
        let l = parse_length("12px");
        assert_eq!((l.value, l.unit, l.has_error), (12.0, LengthUnit::Px, false));
        let l = parse_length(" 1.5EM ");
        assert_eq!((l.value, l.unit, l.has_error), (1.5, LengthUnit::Em, false));
        assert_eq!(parse_length("50%").unit, LengthUnit::Percent);
        assert!(!parse_length("0").has_error, "unitless zero is a length");
    }

    #[test]
    fn flags_errors() {
        assert!(parse_length("12").has_error, "bare non-zero number");
        assert!(parse_length("12furlongs").has_error, "unknown unit");
        assert!(parse_length("12px 3px").has_error, "two values");
        assert!(parse_length("").has_error);
    }

    #[test]
    fn huge_products_saturate() {
        let huge = LengthContext {
            font_size: f32::MAX,
            root_font_size: 16.0,
        };
        assert_eq!(parse_length("1e12em").to_px(&huge, 0.0), MAX_PX);
        assert_eq!(parse_length("-1e12em").to_px(&huge, 0.0), -MAX_PX);
        assert_eq!(parse_length("1e12%").to_px(&CTX, f32::INFINITY), MAX_PX);
        assert_eq!(saturate_px(f32::NAN), 0.0);
    }

    #[test]
    fn absolute_conversions() {
        assert!((parse_length("1in").to_px(&CTX, 0.0) - 96.0).abs() < 1e-4);
        assert!((parse_length("2.54cm").to_px(&CTX, 0.0) - 96.0).abs() < 1e-3);
        assert!((parse_length("72pt").to_px(&CTX, 0.0) - 96.0).abs() < 1e-4);
        assert!((parse_length("6pc").to_px(&CTX, 0.0) - 96.0).abs() < 1e-4);
        assert!((parse_length("25.4mm").to_px(&CTX, 0.0) - 96.0).abs() < 1e-3);
    }

    #[test]
    fn relative_conversions() {
        assert!((parse_length("2em").to_px(&CTX, 0.0) - 40.0).abs() < 1e-4);
        assert!((parse_length("2rem").to_px(&CTX, 0.0) - 32.0).abs() < 1e-4);
        assert!((parse_length("50%").to_px(&CTX, 400.0) - 200.0).abs() < 1e-4);
    }

    #[test]
    fn em_conversions_reject_other_units() {
        let em = parse_length("2em");
        assert_eq!(em.convert_em_to_pixels(16.0), Ok(32.0));
        assert_eq!(em.convert_em_to_points(12.0), Ok(24.0));
        assert_eq!(parse_length("2px").convert_em_to_pixels(16.0), Err(ValueError::NotEm));
        assert_eq!(parse_length("2px").convert_em_to_points(12.0), Err(ValueError::NotEm));
    }
}
