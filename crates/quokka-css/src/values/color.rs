use serde::Serialize;

use super::ValueError;
use crate::parser::ComponentValue;
use crate::tokenizer::CSSToken;

/// [§ 4 Color syntax](https://www.w3.org/TR/css-color-4/#color-syntax)
///
/// sRGB color with 8-bit channels. Alpha 255 is opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

/// A specified color: either concrete or `currentColor`, which the cascade
/// resolves against the element's `color`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColorValue {
    /// A concrete color.
    Rgba(Color),
    /// [§ 6.4](https://www.w3.org/TR/css-color-4/#currentcolor-color)
    CurrentColor,
}

impl ColorValue {
    /// Resolve against the element's computed `color`.
    #[must_use]
    pub const fn resolve(self, current: Color) -> Color {
        match self {
            Self::Rgba(c) => c,
            Self::CurrentColor => current,
        }
    }
}

impl Color {
    /// `black`
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// `white`
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    /// `transparent`
    pub const TRANSPARENT: Self = Self { r: 0, g: 0, b: 0, a: 0 };

    /// Opaque color from channels.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// True when alpha is zero.
    #[must_use]
    pub const fn is_transparent(&self) -> bool {
        self.a == 0
    }

    /// [§ 4.2 The RGB hexadecimal notations](https://www.w3.org/TR/css-color-4/#hex-notation)
    ///
    /// "3, 4, 6, or 8 hexadecimal digits." Short forms replicate digits.
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let digit = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok().map(|v| v * 17);
        let pair = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            3 => Some(Self::rgb(digit(0)?, digit(1)?, digit(2)?)),
            4 => Some(Self {
                r: digit(0)?,
                g: digit(1)?,
                b: digit(2)?,
                a: digit(3)?,
            }),
            6 => Some(Self::rgb(pair(0)?, pair(2)?, pair(4)?)),
            8 => Some(Self {
                r: pair(0)?,
                g: pair(2)?,
                b: pair(4)?,
                a: pair(6)?,
            }),
            _ => None,
        }
    }

    /// [§ 6.1 Named Colors](https://www.w3.org/TR/css-color-4/#named-colors)
    #[must_use]
    pub fn from_named(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower == "transparent" {
            return Some(Self::TRANSPARENT);
        }
        NAMED_COLORS
            .binary_search_by(|(n, _)| n.cmp(&lower.as_str()))
            .ok()
            .map(|i| {
                let [r, g, b] = NAMED_COLORS[i].1;
                Self::rgb(r, g, b)
            })
    }
}

/// Named colors, sorted for binary search.
const NAMED_COLORS: &[(&str, [u8; 3])] = &[
    ("aliceblue", [240, 248, 255]),
    ("antiquewhite", [250, 235, 215]),
    ("aqua", [0, 255, 255]),
    ("aquamarine", [127, 255, 212]),
    ("azure", [240, 255, 255]),
    ("beige", [245, 245, 220]),
    ("bisque", [255, 228, 196]),
    ("black", [0, 0, 0]),
    ("blanchedalmond", [255, 235, 205]),
    ("blue", [0, 0, 255]),
    ("blueviolet", [138, 43, 226]),
    ("brown", [165, 42, 42]),
    ("burlywood", [222, 184, 135]),
    ("cadetblue", [95, 158, 160]),
    ("chartreuse", [127, 255, 0]),
    ("chocolate", [210, 105, 30]),
    ("coral", [255, 127, 80]),
    ("cornflowerblue", [100, 149, 237]),
    ("cornsilk", [255, 248, 220]),
    ("crimson", [220, 20, 60]),
    ("cyan", [0, 255, 255]),
    ("darkblue", [0, 0, 139]),
    ("darkcyan", [0, 139, 139]),
    ("darkgoldenrod", [184, 134, 11]),
    ("darkgray", [169, 169, 169]),
    ("darkgreen", [0, 100, 0]),
    ("darkgrey", [169, 169, 169]),
    ("darkkhaki", [189, 183, 107]),
    ("darkmagenta", [139, 0, 139]),
    ("darkolivegreen", [85, 107, 47]),
    ("darkorange", [255, 140, 0]),
    ("darkorchid", [153, 50, 204]),
    ("darkred", [139, 0, 0]),
    ("darksalmon", [233, 150, 122]),
    ("darkseagreen", [143, 188, 143]),
    ("darkslateblue", [72, 61, 139]),
    ("darkslategray", [47, 79, 79]),
    ("darkslategrey", [47, 79, 79]),
    ("darkturquoise", [0, 206, 209]),
    ("darkviolet", [148, 0, 211]),
    ("deeppink", [255, 20, 147]),
    ("deepskyblue", [0, 191, 255]),
    ("dimgray", [105, 105, 105]),
    ("dimgrey", [105, 105, 105]),
    ("dodgerblue", [30, 144, 255]),
    ("firebrick", [178, 34, 34]),
    ("floralwhite", [255, 250, 240]),
    ("forestgreen", [34, 139, 34]),
    ("fuchsia", [255, 0, 255]),
    ("gainsboro", [220, 220, 220]),
    ("ghostwhite", [248, 248, 255]),
    ("gold", [255, 215, 0]),
    ("goldenrod", [218, 165, 32]),
    ("gray", [128, 128, 128]),
    ("green", [0, 128, 0]),
    ("greenyellow", [173, 255, 47]),
    ("grey", [128, 128, 128]),
    ("honeydew", [240, 255, 240]),
    ("hotpink", [255, 105, 180]),
    ("indianred", [205, 92, 92]),
    ("indigo", [75, 0, 130]),
    ("ivory", [255, 255, 240]),
    ("khaki", [240, 230, 140]),
    ("lavender", [230, 230, 250]),
    ("lavenderblush", [255, 240, 245]),
    ("lawngreen", [124, 252, 0]),
    ("lemonchiffon", [255, 250, 205]),
    ("lightblue", [173, 216, 230]),
    ("lightcoral", [240, 128, 128]),
    ("lightcyan", [224, 255, 255]),
    ("lightgoldenrodyellow", [250, 250, 210]),
    ("lightgray", [211, 211, 211]),
    ("lightgreen", [144, 238, 144]),
    ("lightgrey", [211, 211, 211]),
    ("lightpink", [255, 182, 193]),
    ("lightsalmon", [255, 160, 122]),
    ("lightseagreen", [32, 178, 170]),
    ("lightskyblue", [135, 206, 250]),
    ("lightslategray", [119, 136, 153]),
    ("lightslategrey", [119, 136, 153]),
    ("lightsteelblue", [176, 196, 222]),
    ("lightyellow", [255, 255, 224]),
    ("lime", [0, 255, 0]),
    ("limegreen", [50, 205, 50]),
    ("linen", [250, 240, 230]),
    ("magenta", [255, 0, 255]),
    ("maroon", [128, 0, 0]),
    ("mediumaquamarine", [102, 205, 170]),
    ("mediumblue", [0, 0, 205]),
    ("mediumorchid", [186, 85, 211]),
    ("mediumpurple", [147, 112, 219]),
    ("mediumseagreen", [60, 179, 113]),
    ("mediumslateblue", [123, 104, 238]),
    ("mediumspringgreen", [0, 250, 154]),
    ("mediumturquoise", [72, 209, 204]),
    ("mediumvioletred", [199, 21, 133]),
    ("midnightblue", [25, 25, 112]),
    ("mintcream", [245, 255, 250]),
    ("mistyrose", [255, 228, 225]),
    ("moccasin", [255, 228, 181]),
    ("navajowhite", [255, 222, 173]),
    ("navy", [0, 0, 128]),
    ("oldlace", [253, 245, 230]),
    ("olive", [128, 128, 0]),
    ("olivedrab", [107, 142, 35]),
    ("orange", [255, 165, 0]),
    ("orangered", [255, 69, 0]),
    ("orchid", [218, 112, 214]),
    ("palegoldenrod", [238, 232, 170]),
    ("palegreen", [152, 251, 152]),
    ("paleturquoise", [175, 238, 238]),
    ("palevioletred", [219, 112, 147]),
    ("papayawhip", [255, 239, 213]),
    ("peachpuff", [255, 218, 185]),
    ("peru", [205, 133, 63]),
    ("pink", [255, 192, 203]),
    ("plum", [221, 160, 221]),
    ("powderblue", [176, 224, 230]),
    ("purple", [128, 0, 128]),
    ("rebeccapurple", [102, 51, 153]),
    ("red", [255, 0, 0]),
    ("rosybrown", [188, 143, 143]),
    ("royalblue", [65, 105, 225]),
    ("saddlebrown", [139, 69, 19]),
    ("salmon", [250, 128, 114]),
    ("sandybrown", [244, 164, 96]),
    ("seagreen", [46, 139, 87]),
    ("seashell", [255, 245, 238]),
    ("sienna", [160, 82, 45]),
    ("silver", [192, 192, 192]),
    ("skyblue", [135, 206, 235]),
    ("slateblue", [106, 90, 205]),
    ("slategray", [112, 128, 144]),
    ("slategrey", [112, 128, 144]),
    ("snow", [255, 250, 250]),
    ("springgreen", [0, 255, 127]),
    ("steelblue", [70, 130, 180]),
    ("tan", [210, 180, 140]),
    ("teal", [0, 128, 128]),
    ("thistle", [216, 191, 216]),
    ("tomato", [255, 99, 71]),
    ("turquoise", [64, 224, 208]),
    ("violet", [238, 130, 238]),
    ("wheat", [245, 222, 179]),
    ("white", [255, 255, 255]),
    ("whitesmoke", [245, 245, 245]),
    ("yellow", [255, 255, 0]),
    ("yellowgreen", [154, 205, 50]),
];

/// A numeric `rgb()` argument.
enum ColorArg {
    Number(f64),
    Percentage(f64),
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn channel(arg: &ColorArg) -> u8 {
    let v = match *arg {
        ColorArg::Number(n) => n,
        ColorArg::Percentage(p) => p * 255.0 / 100.0,
    };
    v.round().clamp(0.0, 255.0) as u8
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn alpha(arg: &ColorArg) -> u8 {
    let v = match *arg {
        ColorArg::Number(n) => n,
        ColorArg::Percentage(p) => p / 100.0,
    };
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// [§ 4.1 The RGB functions](https://www.w3.org/TR/css-color-4/#rgb-functions)
///
/// Accepts the legacy comma syntax and the space-separated syntax with an
/// optional `/ alpha`.
fn parse_rgb_function(args: &[ComponentValue]) -> Option<Color> {
    let mut values = Vec::new();
    for arg in args {
        match arg.as_token() {
            Some(CSSToken::Whitespace | CSSToken::Comma | CSSToken::Delim('/')) => {}
            Some(CSSToken::Number { value, .. }) => values.push(ColorArg::Number(*value)),
            Some(CSSToken::Percentage(value)) => values.push(ColorArg::Percentage(*value)),
            _ => return None,
        }
    }
    match values.as_slice() {
        [r, g, b] => Some(Color::rgb(channel(r), channel(g), channel(b))),
        [r, g, b, a] => Some(Color {
            r: channel(r),
            g: channel(g),
            b: channel(b),
            a: alpha(a),
        }),
        _ => None,
    }
}

/// Parse a `<color>` from a single component value.
///
/// # Errors
///
/// Returns [`ValueError::InvalidColor`] when the value is not a color.
pub fn parse_color(value: &ComponentValue) -> Result<ColorValue, ValueError> {
    let parsed = match value {
        ComponentValue::Token(CSSToken::Hash { value, .. }) => {
            Color::from_hex(value).map(ColorValue::Rgba)
        }
        ComponentValue::Token(CSSToken::Ident(name)) => {
            if name.eq_ignore_ascii_case("currentcolor") {
                Some(ColorValue::CurrentColor)
            } else {
                Color::from_named(name).map(ColorValue::Rgba)
            }
        }
        ComponentValue::Function { name, value }
            if name.eq_ignore_ascii_case("rgb") || name.eq_ignore_ascii_case("rgba") =>
        {
            parse_rgb_function(value).map(ColorValue::Rgba)
        }
        _ => None,
    };
    parsed.ok_or_else(|| {
        ValueError::InvalidColor(crate::parser::css_parser::component_to_string(value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_inline_style;

    fn color_of(css: &str) -> Result<ColorValue, ValueError> {
        let decls = parse_inline_style(&format!("color: {css}"));
        let value = decls[0].value.iter().find(|v| !v.is_whitespace()).expect("a value");
        parse_color(value)
    }

    #[test]
    fn named_table_is_sorted() {
        assert!(NAMED_COLORS.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn hex_forms() {
        assert_eq!(Color::from_hex("#f00"), Some(Color::rgb(255, 0, 0)));
        assert_eq!(Color::from_hex("0f08").map(|c| c.a), Some(136));
        assert_eq!(Color::from_hex("#336699"), Some(Color::rgb(0x33, 0x66, 0x99)));
        assert_eq!(Color::from_hex("#12345"), None);
        assert_eq!(Color::from_hex("#ggg"), None);
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(color_of("NaVy"), Ok(ColorValue::Rgba(Color::rgb(0, 0, 128))));
        assert_eq!(color_of("CurrentColor"), Ok(ColorValue::CurrentColor));
        assert_eq!(color_of("transparent"), Ok(ColorValue::Rgba(Color::TRANSPARENT)));
        assert!(color_of("notacolor").is_err());
    }

    #[test]
    fn rgb_functions() {
        assert_eq!(color_of("rgb(255, 0, 0)"), Ok(ColorValue::Rgba(Color::rgb(255, 0, 0))));
        assert_eq!(
            color_of("rgb(100%, 50%, 0%)"),
            Ok(ColorValue::Rgba(Color::rgb(255, 128, 0)))
        );
        assert_eq!(
            color_of("rgba(0, 0, 0, 0.5)"),
            Ok(ColorValue::Rgba(Color { r: 0, g: 0, b: 0, a: 128 }))
        );
        assert_eq!(color_of("rgb(300, -5, 0)"), Ok(ColorValue::Rgba(Color::rgb(255, 0, 0))));
        assert!(color_of("rgb(1, 2)").is_err());
    }
}
