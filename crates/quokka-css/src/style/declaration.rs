//! Typed declarations: property names resolved, shorthands expanded and
//! values parsed, with failures kept as [`PropertyDeclaration::Invalid`].

use std::str::FromStr;

use quokka_common::warning::warn_once;
use strum_macros::{Display, EnumString};

use super::types::{
    BorderStyle, Clear, Content, ContentItem, CounterOp, Display as DisplayKind, Float,
    FontStyle, FontVariant, ListStylePosition, ListStyleType, Overflow, Position, QuotePair, Side,
    TextAlign, TextDecoration, TextTransform, Visibility, WhiteSpace,
};
use crate::parser::{ComponentValue, Declaration};
use crate::tokenizer::CSSToken;
use crate::values::{Color, ColorValue, CssLength, ValueError, parse_color, significant, value_text};

/// Every longhand property the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum PropertyId {
    /// `display`
    Display,
    /// `position`
    Position,
    /// `top`
    Top,
    /// `right`
    Right,
    /// `bottom`
    Bottom,
    /// `left`
    Left,
    /// `float`
    Float,
    /// `clear`
    Clear,
    /// `margin-top`
    MarginTop,
    /// `margin-right`
    MarginRight,
    /// `margin-bottom`
    MarginBottom,
    /// `margin-left`
    MarginLeft,
    /// `padding-top`
    PaddingTop,
    /// `padding-right`
    PaddingRight,
    /// `padding-bottom`
    PaddingBottom,
    /// `padding-left`
    PaddingLeft,
    /// `border-top-width`
    BorderTopWidth,
    /// `border-right-width`
    BorderRightWidth,
    /// `border-bottom-width`
    BorderBottomWidth,
    /// `border-left-width`
    BorderLeftWidth,
    /// `border-top-style`
    BorderTopStyle,
    /// `border-right-style`
    BorderRightStyle,
    /// `border-bottom-style`
    BorderBottomStyle,
    /// `border-left-style`
    BorderLeftStyle,
    /// `border-top-color`
    BorderTopColor,
    /// `border-right-color`
    BorderRightColor,
    /// `border-bottom-color`
    BorderBottomColor,
    /// `border-left-color`
    BorderLeftColor,
    /// `width`
    Width,
    /// `height`
    Height,
    /// `min-width`
    MinWidth,
    /// `max-width`
    MaxWidth,
    /// `min-height`
    MinHeight,
    /// `max-height`
    MaxHeight,
    /// `color`
    Color,
    /// `background-color`
    BackgroundColor,
    /// `font-family`
    FontFamily,
    /// `font-size`
    FontSize,
    /// `font-weight`
    FontWeight,
    /// `font-style`
    FontStyle,
    /// `font-variant`
    FontVariant,
    /// `line-height`
    LineHeight,
    /// `text-align`
    TextAlign,
    /// `text-decoration`
    TextDecoration,
    /// `text-transform`
    TextTransform,
    /// `white-space`
    WhiteSpace,
    /// `visibility`
    Visibility,
    /// `overflow`
    Overflow,
    /// `list-style-type`
    ListStyleType,
    /// `list-style-position`
    ListStylePosition,
    /// `list-style-image`
    ListStyleImage,
    /// `counter-reset`
    CounterReset,
    /// `counter-increment`
    CounterIncrement,
    /// `quotes`
    Quotes,
    /// `content`
    Content,
}

impl PropertyId {
    /// [§ 6.2 Inheritance](https://www.w3.org/TR/CSS2/cascade.html#inheritance)
    /// Whether the property is inherited by default.
    #[must_use]
    pub const fn is_inherited(self) -> bool {
        matches!(
            self,
            Self::Color
                | Self::FontFamily
                | Self::FontSize
                | Self::FontWeight
                | Self::FontStyle
                | Self::FontVariant
                | Self::LineHeight
                | Self::TextAlign
                | Self::TextTransform
                | Self::WhiteSpace
                | Self::Visibility
                | Self::ListStyleType
                | Self::ListStylePosition
                | Self::ListStyleImage
                | Self::Quotes
        )
    }

    fn margin(side: Side) -> Self {
        match side {
            Side::Top => Self::MarginTop,
            Side::Right => Self::MarginRight,
            Side::Bottom => Self::MarginBottom,
            Side::Left => Self::MarginLeft,
        }
    }

    fn padding(side: Side) -> Self {
        match side {
            Side::Top => Self::PaddingTop,
            Side::Right => Self::PaddingRight,
            Side::Bottom => Self::PaddingBottom,
            Side::Left => Self::PaddingLeft,
        }
    }

    fn border_width(side: Side) -> Self {
        match side {
            Side::Top => Self::BorderTopWidth,
            Side::Right => Self::BorderRightWidth,
            Side::Bottom => Self::BorderBottomWidth,
            Side::Left => Self::BorderLeftWidth,
        }
    }

    fn border_style(side: Side) -> Self {
        match side {
            Side::Top => Self::BorderTopStyle,
            Side::Right => Self::BorderRightStyle,
            Side::Bottom => Self::BorderBottomStyle,
            Side::Left => Self::BorderLeftStyle,
        }
    }

    fn border_color(side: Side) -> Self {
        match side {
            Side::Top => Self::BorderTopColor,
            Side::Right => Self::BorderRightColor,
            Side::Bottom => Self::BorderBottomColor,
            Side::Left => Self::BorderLeftColor,
        }
    }
}

/// `inherit` or `initial`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CssWideKeyword {
    /// Take the parent's computed value.
    Inherit,
    /// Take the initial value.
    Initial,
}

/// A specified size: a length or percentage, `auto`, or `none`
/// (only valid for `max-width`/`max-height`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpecifiedLength {
    /// A length or percentage.
    Length(CssLength),
    /// `auto`
    Auto,
    /// `none`
    None,
}

/// Specified `font-size`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FontSize {
    /// A length or percentage of the parent size.
    Length(CssLength),
    /// An absolute-size keyword already in px.
    Keyword(f32),
    /// `larger`
    Larger,
    /// `smaller`
    Smaller,
}

/// Specified `font-weight`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    /// 100 to 900.
    Absolute(u16),
    /// One step heavier than the parent.
    Bolder,
    /// One step lighter than the parent.
    Lighter,
}

/// Specified `line-height`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpecifiedLineHeight {
    /// `normal`
    Normal,
    /// A multiplier.
    Number(f32),
    /// A length or percentage of the element's font size.
    Length(CssLength),
}

/// One typed longhand declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyDeclaration {
    /// `display`
    Display(DisplayKind),
    /// `position`
    Position(Position),
    /// `top`, `right`, `bottom`, `left`
    Inset(Side, SpecifiedLength),
    /// `float`
    Float(Float),
    /// `clear`
    Clear(Clear),
    /// `margin-*`
    Margin(Side, SpecifiedLength),
    /// `padding-*`
    Padding(Side, CssLength),
    /// `border-*-width`
    BorderWidth(Side, CssLength),
    /// `border-*-style`
    BorderStyle(Side, BorderStyle),
    /// `border-*-color`
    BorderColor(Side, ColorValue),
    /// `width`
    Width(SpecifiedLength),
    /// `height`
    Height(SpecifiedLength),
    /// `min-width`
    MinWidth(SpecifiedLength),
    /// `max-width`
    MaxWidth(SpecifiedLength),
    /// `min-height`
    MinHeight(SpecifiedLength),
    /// `max-height`
    MaxHeight(SpecifiedLength),
    /// `color`
    Color(ColorValue),
    /// `background-color`
    BackgroundColor(ColorValue),
    /// `font-family`
    FontFamily(Vec<String>),
    /// `font-size`
    FontSize(FontSize),
    /// `font-weight`
    FontWeight(FontWeight),
    /// `font-style`
    FontStyle(FontStyle),
    /// `font-variant`
    FontVariant(FontVariant),
    /// `line-height`
    LineHeight(SpecifiedLineHeight),
    /// `text-align`
    TextAlign(TextAlign),
    /// `text-decoration`
    TextDecoration(TextDecoration),
    /// `text-transform`
    TextTransform(TextTransform),
    /// `white-space`
    WhiteSpace(WhiteSpace),
    /// `visibility`
    Visibility(Visibility),
    /// `overflow`
    Overflow(Overflow),
    /// `list-style-type`
    ListStyleType(ListStyleType),
    /// `list-style-position`
    ListStylePosition(ListStylePosition),
    /// `list-style-image`; `None` for `none`.
    ListStyleImage(Option<String>),
    /// `counter-reset`
    CounterReset(Vec<CounterOp>),
    /// `counter-increment`
    CounterIncrement(Vec<CounterOp>),
    /// `quotes`; empty for `none`.
    Quotes(Vec<QuotePair>),
    /// `content`
    Content(Content),
    /// `inherit` or `initial` for one longhand.
    CssWide(PropertyId, CssWideKeyword),
    /// A declaration that failed to parse. Skipped by the cascade.
    Invalid {
        /// Property name as written.
        property: String,
        /// Why it was rejected.
        error: ValueError,
    },
}

impl PropertyDeclaration {
    /// The longhand this declaration sets, `None` for invalid ones.
    #[must_use]
    pub const fn property_id(&self) -> Option<PropertyId> {
        Some(match self {
            Self::Display(_) => PropertyId::Display,
            Self::Position(_) => PropertyId::Position,
            Self::Inset(side, _) => match side {
                Side::Top => PropertyId::Top,
                Side::Right => PropertyId::Right,
                Side::Bottom => PropertyId::Bottom,
                Side::Left => PropertyId::Left,
            },
            Self::Float(_) => PropertyId::Float,
            Self::Clear(_) => PropertyId::Clear,
            Self::Margin(side, _) => match side {
                Side::Top => PropertyId::MarginTop,
                Side::Right => PropertyId::MarginRight,
                Side::Bottom => PropertyId::MarginBottom,
                Side::Left => PropertyId::MarginLeft,
            },
            Self::Padding(side, _) => match side {
                Side::Top => PropertyId::PaddingTop,
                Side::Right => PropertyId::PaddingRight,
                Side::Bottom => PropertyId::PaddingBottom,
                Side::Left => PropertyId::PaddingLeft,
            },
            Self::BorderWidth(side, _) => match side {
                Side::Top => PropertyId::BorderTopWidth,
                Side::Right => PropertyId::BorderRightWidth,
                Side::Bottom => PropertyId::BorderBottomWidth,
                Side::Left => PropertyId::BorderLeftWidth,
            },
            Self::BorderStyle(side, _) => match side {
                Side::Top => PropertyId::BorderTopStyle,
                Side::Right => PropertyId::BorderRightStyle,
                Side::Bottom => PropertyId::BorderBottomStyle,
                Side::Left => PropertyId::BorderLeftStyle,
            },
            Self::BorderColor(side, _) => match side {
                Side::Top => PropertyId::BorderTopColor,
                Side::Right => PropertyId::BorderRightColor,
                Side::Bottom => PropertyId::BorderBottomColor,
                Side::Left => PropertyId::BorderLeftColor,
            },
            Self::Width(_) => PropertyId::Width,
            Self::Height(_) => PropertyId::Height,
            Self::MinWidth(_) => PropertyId::MinWidth,
            Self::MaxWidth(_) => PropertyId::MaxWidth,
            Self::MinHeight(_) => PropertyId::MinHeight,
            Self::MaxHeight(_) => PropertyId::MaxHeight,
            Self::Color(_) => PropertyId::Color,
            Self::BackgroundColor(_) => PropertyId::BackgroundColor,
            Self::FontFamily(_) => PropertyId::FontFamily,
            Self::FontSize(_) => PropertyId::FontSize,
            Self::FontWeight(_) => PropertyId::FontWeight,
            Self::FontStyle(_) => PropertyId::FontStyle,
            Self::FontVariant(_) => PropertyId::FontVariant,
            Self::LineHeight(_) => PropertyId::LineHeight,
            Self::TextAlign(_) => PropertyId::TextAlign,
            Self::TextDecoration(_) => PropertyId::TextDecoration,
            Self::TextTransform(_) => PropertyId::TextTransform,
            Self::WhiteSpace(_) => PropertyId::WhiteSpace,
            Self::Visibility(_) => PropertyId::Visibility,
            Self::Overflow(_) => PropertyId::Overflow,
            Self::ListStyleType(_) => PropertyId::ListStyleType,
            Self::ListStylePosition(_) => PropertyId::ListStylePosition,
            Self::ListStyleImage(_) => PropertyId::ListStyleImage,
            Self::CounterReset(_) => PropertyId::CounterReset,
            Self::CounterIncrement(_) => PropertyId::CounterIncrement,
            Self::Quotes(_) => PropertyId::Quotes,
            Self::Content(_) => PropertyId::Content,
            Self::CssWide(id, _) => *id,
            Self::Invalid { .. } => return None,
        })
    }

    /// True for declarations the cascade must skip.
    #[must_use]
    pub const fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid { .. })
    }
}

type Values<'a> = [&'a ComponentValue];

/// Longhands a shorthand expands into, for `inherit`/`initial`.
fn shorthand_longhands(name: &str) -> Option<Vec<PropertyId>> {
    let sides = |f: fn(Side) -> PropertyId| Side::ALL.iter().map(|&s| f(s)).collect::<Vec<_>>();
    Some(match name {
        "margin" => sides(PropertyId::margin),
        "padding" => sides(PropertyId::padding),
        "border-width" => sides(PropertyId::border_width),
        "border-style" => sides(PropertyId::border_style),
        "border-color" => sides(PropertyId::border_color),
        "border" => {
            let mut ids = sides(PropertyId::border_width);
            ids.extend(sides(PropertyId::border_style));
            ids.extend(sides(PropertyId::border_color));
            ids
        }
        "border-top" | "border-right" | "border-bottom" | "border-left" => {
            let side = Side::from_str(&name["border-".len()..]).ok()?;
            vec![
                PropertyId::border_width(side),
                PropertyId::border_style(side),
                PropertyId::border_color(side),
            ]
        }
        "background" => vec![PropertyId::BackgroundColor],
        "font" => vec![
            PropertyId::FontStyle,
            PropertyId::FontVariant,
            PropertyId::FontWeight,
            PropertyId::FontSize,
            PropertyId::LineHeight,
            PropertyId::FontFamily,
        ],
        "list-style" => vec![
            PropertyId::ListStyleType,
            PropertyId::ListStylePosition,
            PropertyId::ListStyleImage,
        ],
        _ => return None,
    })
}

/// Parse one raw declaration into typed longhands.
///
/// Never fails: a rejected value (or an unknown property) comes back as a
/// single [`PropertyDeclaration::Invalid`], so a bad shorthand is dropped
/// as a whole and sibling declarations are unaffected.
#[must_use]
pub fn parse_declaration(decl: &Declaration) -> Vec<PropertyDeclaration> {
    let name = decl.name.as_str();
    let values = significant(&decl.value);
    let invalid = |error| {
        vec![PropertyDeclaration::Invalid {
            property: name.to_string(),
            error,
        }]
    };
    if values.is_empty() {
        return invalid(ValueError::Empty(name.to_string()));
    }

    let wide = match values.as_slice() {
        [v] => v.as_ident().and_then(|kw| {
            if kw.eq_ignore_ascii_case("inherit") {
                Some(CssWideKeyword::Inherit)
            } else if kw.eq_ignore_ascii_case("initial") {
                Some(CssWideKeyword::Initial)
            } else {
                None
            }
        }),
        _ => None,
    };

    if let Ok(id) = PropertyId::from_str(name) {
        if let Some(keyword) = wide {
            return vec![PropertyDeclaration::CssWide(id, keyword)];
        }
        return match parse_longhand(id, &values) {
            Ok(d) => vec![d],
            Err(error) => invalid(error),
        };
    }

    if let Some(longhands) = shorthand_longhands(name) {
        if let Some(keyword) = wide {
            return longhands
                .into_iter()
                .map(|id| PropertyDeclaration::CssWide(id, keyword))
                .collect();
        }
        return match parse_shorthand(name, &values) {
            Ok(decls) => decls,
            Err(error) => invalid(error),
        };
    }

    warn_once("CSS", &format!("unsupported property '{name}'"));
    invalid(ValueError::UnknownProperty(name.to_string()))
}

fn bad_value(property: PropertyId, values: &Values<'_>) -> ValueError {
    ValueError::InvalidValue {
        property: property.to_string(),
        value: values_text(values),
    }
}

fn values_text(values: &Values<'_>) -> String {
    let owned: Vec<ComponentValue> = values.iter().map(|v| (*v).clone()).collect();
    value_text(&owned)
}

/// A single keyword parsed into `T`.
fn keyword<T: FromStr>(id: PropertyId, values: &Values<'_>) -> Result<T, ValueError> {
    match values {
        [v] => v
            .as_ident()
            .and_then(|s| T::from_str(s).ok())
            .ok_or_else(|| bad_value(id, values)),
        _ => Err(bad_value(id, values)),
    }
}

fn single<'a>(id: PropertyId, values: &Values<'a>) -> Result<&'a ComponentValue, ValueError> {
    match values {
        [v] => Ok(v),
        _ => Err(bad_value(id, values)),
    }
}

fn is_ident(value: &ComponentValue, keyword: &str) -> bool {
    value.as_ident().is_some_and(|s| s.eq_ignore_ascii_case(keyword))
}

fn non_negative(id: PropertyId, length: CssLength) -> Result<CssLength, ValueError> {
    if length.value < 0.0 {
        Err(ValueError::Negative(id.to_string()))
    } else {
        Ok(length)
    }
}

fn specified_length(
    id: PropertyId,
    value: &ComponentValue,
    allow_auto: bool,
    allow_none: bool,
) -> Result<SpecifiedLength, ValueError> {
    if allow_auto && is_ident(value, "auto") {
        return Ok(SpecifiedLength::Auto);
    }
    if allow_none && is_ident(value, "none") {
        return Ok(SpecifiedLength::None);
    }
    CssLength::try_from_component(value).map(SpecifiedLength::Length).map_err(|e| match e {
        ValueError::UnknownUnit(_) if value.as_ident().is_some() => bad_value(id, &[value]),
        other => other,
    })
}

fn non_negative_size(
    id: PropertyId,
    value: &ComponentValue,
    allow_auto: bool,
    allow_none: bool,
) -> Result<SpecifiedLength, ValueError> {
    match specified_length(id, value, allow_auto, allow_none)? {
        SpecifiedLength::Length(l) => non_negative(id, l).map(SpecifiedLength::Length),
        other => Ok(other),
    }
}

/// [§ 8.5.1 'border-width'](https://www.w3.org/TR/CSS2/box.html#border-width-properties)
/// "thin <= medium <= thick"; used widths are 1px, 3px and 5px.
fn border_width(value: &ComponentValue) -> Option<CssLength> {
    if let Some(kw) = value.as_ident() {
        return match kw.to_ascii_lowercase().as_str() {
            "thin" => Some(CssLength::px(1.0)),
            "medium" => Some(CssLength::px(3.0)),
            "thick" => Some(CssLength::px(5.0)),
            _ => None,
        };
    }
    let length = CssLength::from_component(value);
    (!length.has_error && !length.is_percent() && length.value >= 0.0).then_some(length)
}

fn border_style(value: &ComponentValue) -> Option<BorderStyle> {
    value.as_ident().and_then(|s| BorderStyle::from_str(s).ok())
}

/// [§ 15.7 'font-size'](https://www.w3.org/TR/CSS2/fonts.html#font-size-props)
fn font_size(value: &ComponentValue) -> Option<FontSize> {
    if let Some(kw) = value.as_ident() {
        let px = match kw.to_ascii_lowercase().as_str() {
            "xx-small" => 9.0,
            "x-small" => 10.0,
            "small" => 13.0,
            "medium" => 16.0,
            "large" => 18.0,
            "x-large" => 24.0,
            "xx-large" => 32.0,
            "larger" => return Some(FontSize::Larger),
            "smaller" => return Some(FontSize::Smaller),
            _ => return None,
        };
        return Some(FontSize::Keyword(px));
    }
    let length = CssLength::from_component(value);
    (!length.has_error && length.value >= 0.0).then_some(FontSize::Length(length))
}

/// [§ 15.6 'font-weight'](https://www.w3.org/TR/CSS2/fonts.html#font-boldness)
fn font_weight(value: &ComponentValue) -> Option<FontWeight> {
    match value.as_token()? {
        CSSToken::Ident(kw) => match kw.to_ascii_lowercase().as_str() {
            "normal" => Some(FontWeight::Absolute(400)),
            "bold" => Some(FontWeight::Absolute(700)),
            "bolder" => Some(FontWeight::Bolder),
            "lighter" => Some(FontWeight::Lighter),
            _ => None,
        },
        CSSToken::Number {
            value,
            is_integer: true,
        } if (100.0..=900.0).contains(value) && value % 100.0 == 0.0 => {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let weight = *value as u16;
            Some(FontWeight::Absolute(weight))
        }
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn line_height(value: &ComponentValue) -> Option<SpecifiedLineHeight> {
    if is_ident(value, "normal") {
        return Some(SpecifiedLineHeight::Normal);
    }
    if let Some(CSSToken::Number { value, .. }) = value.as_token() {
        return (*value >= 0.0).then_some(SpecifiedLineHeight::Number(*value as f32));
    }
    let length = CssLength::from_component(value);
    (!length.has_error && length.value >= 0.0).then_some(SpecifiedLineHeight::Length(length))
}

/// [§ 15.3 'font-family'](https://www.w3.org/TR/CSS2/fonts.html#font-family-prop)
///
/// Families are comma separated; an unquoted family is a run of identifiers
/// joined by single spaces.
fn font_family(values: &Values<'_>) -> Option<Vec<String>> {
    let mut families = Vec::new();
    for group in values.split(|v| matches!(v.as_token(), Some(CSSToken::Comma))) {
        match group {
            [] => return None,
            [v] if matches!(v.as_token(), Some(CSSToken::String(_))) => {
                if let Some(CSSToken::String(s)) = v.as_token() {
                    families.push(s.clone());
                }
            }
            idents => {
                let words: Option<Vec<&str>> = idents.iter().map(|v| v.as_ident()).collect();
                let name = words?.join(" ");
                let generic = matches!(
                    name.to_ascii_lowercase().as_str(),
                    "serif" | "sans-serif" | "monospace" | "cursive" | "fantasy"
                );
                families.push(if generic { name.to_ascii_lowercase() } else { name });
            }
        }
    }
    Some(families)
}

fn text_decoration(values: &Values<'_>) -> Option<TextDecoration> {
    if let [v] = values {
        if is_ident(v, "none") {
            return Some(TextDecoration::default());
        }
    }
    let mut decoration = TextDecoration::default();
    for v in values {
        match v.as_ident()?.to_ascii_lowercase().as_str() {
            "underline" if !decoration.underline => decoration.underline = true,
            "overline" if !decoration.overline => decoration.overline = true,
            "line-through" if !decoration.line_through => decoration.line_through = true,
            "blink" => {}
            _ => return None,
        }
    }
    Some(decoration)
}

fn url_of(value: &ComponentValue) -> Option<String> {
    match value {
        ComponentValue::Token(CSSToken::Url(u)) => Some(u.clone()),
        ComponentValue::Function { name, value } if name.eq_ignore_ascii_case("url") => {
            significant(value).first().and_then(|v| match v.as_token() {
                Some(CSSToken::String(s)) => Some(s.clone()),
                _ => None,
            })
        }
        _ => None,
    }
}

fn list_style_image(value: &ComponentValue) -> Option<Option<String>> {
    if is_ident(value, "none") {
        return Some(None);
    }
    url_of(value).map(Some)
}

/// `counter-reset` / `counter-increment`: `none | [ident integer?]+`.
#[allow(clippy::cast_possible_truncation)]
fn counter_ops(values: &Values<'_>, default: i32) -> Option<Vec<CounterOp>> {
    if let [v] = values {
        if is_ident(v, "none") {
            return Some(Vec::new());
        }
    }
    let mut ops: Vec<CounterOp> = Vec::new();
    let mut has_value = true;
    for v in values {
        match v.as_token()? {
            CSSToken::Ident(name) => {
                if ["none", "inherit", "initial"].iter().any(|k| name.eq_ignore_ascii_case(k)) {
                    return None;
                }
                ops.push(CounterOp {
                    name: name.clone(),
                    value: default,
                });
                has_value = false;
            }
            CSSToken::Number {
                value,
                is_integer: true,
            } if !has_value => {
                let op = ops.last_mut()?;
                op.value = value.clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32;
                has_value = true;
            }
            _ => return None,
        }
    }
    Some(ops)
}

fn quotes(values: &Values<'_>) -> Option<Vec<QuotePair>> {
    if let [v] = values {
        if is_ident(v, "none") {
            return Some(Vec::new());
        }
    }
    if values.len() % 2 != 0 {
        return None;
    }
    values
        .chunks(2)
        .map(|pair| match (pair[0].as_token(), pair[1].as_token()) {
            (Some(CSSToken::String(open)), Some(CSSToken::String(close))) => Some(QuotePair {
                open: open.clone(),
                close: close.clone(),
            }),
            _ => None,
        })
        .collect()
}

/// The optional style argument of `counter()`/`counters()`. `None` means
/// the argument is absent; `Some(None)` means it is present but malformed.
fn counter_style_arg(value: Option<Option<&ComponentValue>>) -> Option<ListStyleType> {
    match value {
        None => Some(ListStyleType::Decimal),
        Some(v) => v?.as_ident().and_then(|s| ListStyleType::from_str(s).ok()),
    }
}

/// [§ 12.2 'content'](https://www.w3.org/TR/CSS2/generate.html#content)
fn content(values: &Values<'_>) -> Option<Content> {
    if let [v] = values {
        if is_ident(v, "normal") {
            return Some(Content::Normal);
        }
        if is_ident(v, "none") {
            return Some(Content::None);
        }
    }
    let mut items = Vec::new();
    for v in values {
        let item = match v {
            ComponentValue::Token(CSSToken::String(s)) => ContentItem::String { value: s.clone() },
            ComponentValue::Token(CSSToken::Url(u)) => ContentItem::Url { url: u.clone() },
            ComponentValue::Token(CSSToken::Ident(kw)) => match kw.to_ascii_lowercase().as_str() {
                "open-quote" => ContentItem::OpenQuote,
                "close-quote" => ContentItem::CloseQuote,
                "no-open-quote" => ContentItem::NoOpenQuote,
                "no-close-quote" => ContentItem::NoCloseQuote,
                _ => return None,
            },
            ComponentValue::Function { name, value } => {
                let args = significant(value);
                let parts: Vec<&[&ComponentValue]> = args
                    .split(|a| matches!(a.as_token(), Some(CSSToken::Comma)))
                    .collect();
                let one = |i: usize| match parts.get(i) {
                    Some([v]) => Some(*v),
                    _ => None,
                };
                match name.to_ascii_lowercase().as_str() {
                    "attr" if parts.len() == 1 => ContentItem::Attr {
                        name: one(0)?.as_ident()?.to_ascii_lowercase(),
                    },
                    "counter" if (1..=2).contains(&parts.len()) => ContentItem::Counter {
                        name: one(0)?.as_ident()?.to_string(),
                        style: counter_style_arg(parts.get(1).map(|_| one(1)))?,
                    },
                    "counters" if (2..=3).contains(&parts.len()) => {
                        let Some(CSSToken::String(separator)) = one(1)?.as_token() else {
                            return None;
                        };
                        ContentItem::Counters {
                            name: one(0)?.as_ident()?.to_string(),
                            separator: separator.clone(),
                            style: counter_style_arg(parts.get(2).map(|_| one(2)))?,
                        }
                    }
                    "url" => ContentItem::Url { url: url_of(v)? },
                    _ => return None,
                }
            }
            _ => return None,
        };
        items.push(item);
    }
    Some(Content::Items(items))
}

fn parse_longhand(id: PropertyId, values: &Values<'_>) -> Result<PropertyDeclaration, ValueError> {
    use PropertyDeclaration as D;
    let invalid = || bad_value(id, values);
    Ok(match id {
        PropertyId::Display => D::Display(keyword(id, values)?),
        PropertyId::Position => D::Position(keyword(id, values)?),
        PropertyId::Top | PropertyId::Right | PropertyId::Bottom | PropertyId::Left => {
            let side = Side::from_str(&id.to_string()).map_err(|_| invalid())?;
            D::Inset(side, specified_length(id, single(id, values)?, true, false)?)
        }
        PropertyId::Float => D::Float(keyword(id, values)?),
        PropertyId::Clear => D::Clear(keyword(id, values)?),
        PropertyId::MarginTop
        | PropertyId::MarginRight
        | PropertyId::MarginBottom
        | PropertyId::MarginLeft => {
            let side = side_of(id, "margin-").ok_or_else(invalid)?;
            D::Margin(side, specified_length(id, single(id, values)?, true, false)?)
        }
        PropertyId::PaddingTop
        | PropertyId::PaddingRight
        | PropertyId::PaddingBottom
        | PropertyId::PaddingLeft => {
            let side = side_of(id, "padding-").ok_or_else(invalid)?;
            let length = CssLength::try_from_component(single(id, values)?)?;
            D::Padding(side, non_negative(id, length)?)
        }
        PropertyId::BorderTopWidth
        | PropertyId::BorderRightWidth
        | PropertyId::BorderBottomWidth
        | PropertyId::BorderLeftWidth => {
            let side = side_of(id, "border-").ok_or_else(invalid)?;
            D::BorderWidth(side, border_width(single(id, values)?).ok_or_else(invalid)?)
        }
        PropertyId::BorderTopStyle
        | PropertyId::BorderRightStyle
        | PropertyId::BorderBottomStyle
        | PropertyId::BorderLeftStyle => {
            let side = side_of(id, "border-").ok_or_else(invalid)?;
            D::BorderStyle(side, keyword(id, values)?)
        }
        PropertyId::BorderTopColor
        | PropertyId::BorderRightColor
        | PropertyId::BorderBottomColor
        | PropertyId::BorderLeftColor => {
            let side = side_of(id, "border-").ok_or_else(invalid)?;
            D::BorderColor(side, parse_color(single(id, values)?)?)
        }
        PropertyId::Width => D::Width(non_negative_size(id, single(id, values)?, true, false)?),
        PropertyId::Height => D::Height(non_negative_size(id, single(id, values)?, true, false)?),
        PropertyId::MinWidth => {
            D::MinWidth(non_negative_size(id, single(id, values)?, false, false)?)
        }
        PropertyId::MaxWidth => {
            D::MaxWidth(non_negative_size(id, single(id, values)?, false, true)?)
        }
        PropertyId::MinHeight => {
            D::MinHeight(non_negative_size(id, single(id, values)?, false, false)?)
        }
        PropertyId::MaxHeight => {
            D::MaxHeight(non_negative_size(id, single(id, values)?, false, true)?)
        }
        PropertyId::Color => D::Color(parse_color(single(id, values)?)?),
        PropertyId::BackgroundColor => D::BackgroundColor(parse_color(single(id, values)?)?),
        PropertyId::FontFamily => D::FontFamily(font_family(values).ok_or_else(invalid)?),
        PropertyId::FontSize => {
            let value = single(id, values)?;
            match font_size(value) {
                Some(size) => D::FontSize(size),
                None if CssLength::from_component(value).value < 0.0 => {
                    return Err(ValueError::Negative(id.to_string()));
                }
                None => return Err(invalid()),
            }
        }
        PropertyId::FontWeight => D::FontWeight(font_weight(single(id, values)?).ok_or_else(invalid)?),
        PropertyId::FontStyle => D::FontStyle(keyword(id, values)?),
        PropertyId::FontVariant => D::FontVariant(keyword(id, values)?),
        PropertyId::LineHeight => D::LineHeight(line_height(single(id, values)?).ok_or_else(invalid)?),
        PropertyId::TextAlign => D::TextAlign(keyword(id, values)?),
        PropertyId::TextDecoration => D::TextDecoration(text_decoration(values).ok_or_else(invalid)?),
        PropertyId::TextTransform => D::TextTransform(keyword(id, values)?),
        PropertyId::WhiteSpace => D::WhiteSpace(keyword(id, values)?),
        PropertyId::Visibility => D::Visibility(keyword(id, values)?),
        PropertyId::Overflow => D::Overflow(keyword(id, values)?),
        PropertyId::ListStyleType => D::ListStyleType(keyword(id, values)?),
        PropertyId::ListStylePosition => D::ListStylePosition(keyword(id, values)?),
        PropertyId::ListStyleImage => {
            D::ListStyleImage(list_style_image(single(id, values)?).ok_or_else(invalid)?)
        }
        PropertyId::CounterReset => D::CounterReset(counter_ops(values, 0).ok_or_else(invalid)?),
        PropertyId::CounterIncrement => {
            D::CounterIncrement(counter_ops(values, 1).ok_or_else(invalid)?)
        }
        PropertyId::Quotes => D::Quotes(quotes(values).ok_or_else(invalid)?),
        PropertyId::Content => D::Content(content(values).ok_or_else(invalid)?),
    })
}

/// Side of a per-side longhand such as `margin-top` or `border-left-color`.
fn side_of(id: PropertyId, prefix: &str) -> Option<Side> {
    let name = id.to_string();
    let rest = name.strip_prefix(prefix)?;
    let side = rest.split('-').next()?;
    Side::from_str(side).ok()
}

/// Expand the CSS 2.1 one-to-four value box shorthand pattern.
fn four_sides<T: Copy>(items: &[T]) -> Option<[T; 4]> {
    match *items {
        [a] => Some([a, a, a, a]),
        [a, b] => Some([a, b, a, b]),
        [a, b, c] => Some([a, b, c, b]),
        [a, b, c, d] => Some([a, b, c, d]),
        _ => None,
    }
}

fn parse_shorthand(name: &str, values: &Values<'_>) -> Result<Vec<PropertyDeclaration>, ValueError> {
    use PropertyDeclaration as D;
    let invalid = || ValueError::InvalidValue {
        property: name.to_string(),
        value: values_text(values),
    };
    let per_side = |make: &dyn Fn(Side, usize) -> PropertyDeclaration| -> Vec<PropertyDeclaration> {
        Side::ALL.iter().enumerate().map(|(i, &s)| make(s, i)).collect()
    };
    match name {
        "margin" => {
            let parsed = values
                .iter()
                .map(|v| specified_length(PropertyId::MarginTop, v, true, false))
                .collect::<Result<Vec<_>, _>>()?;
            let sides = four_sides(&parsed).ok_or_else(invalid)?;
            Ok(per_side(&|s, i| D::Margin(s, sides[i])))
        }
        "padding" => {
            let parsed = values
                .iter()
                .map(|v| {
                    CssLength::try_from_component(v)
                        .and_then(|l| non_negative(PropertyId::PaddingTop, l))
                })
                .collect::<Result<Vec<_>, _>>()?;
            let sides = four_sides(&parsed).ok_or_else(invalid)?;
            Ok(per_side(&|s, i| D::Padding(s, sides[i])))
        }
        "border-width" => {
            let parsed = values
                .iter()
                .map(|v| border_width(v))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(invalid)?;
            let sides = four_sides(&parsed).ok_or_else(invalid)?;
            Ok(per_side(&|s, i| D::BorderWidth(s, sides[i])))
        }
        "border-style" => {
            let parsed = values
                .iter()
                .map(|v| border_style(v))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(invalid)?;
            let sides = four_sides(&parsed).ok_or_else(invalid)?;
            Ok(per_side(&|s, i| D::BorderStyle(s, sides[i])))
        }
        "border-color" => {
            let parsed = values
                .iter()
                .map(|v| parse_color(v))
                .collect::<Result<Vec<_>, _>>()?;
            let sides = four_sides(&parsed).ok_or_else(invalid)?;
            Ok(per_side(&|s, i| D::BorderColor(s, sides[i])))
        }
        "border" => {
            let (width, style, color) = border_triple(values).ok_or_else(invalid)?;
            let mut decls = per_side(&|s, _| D::BorderWidth(s, width));
            decls.extend(per_side(&|s, _| D::BorderStyle(s, style)));
            decls.extend(per_side(&|s, _| D::BorderColor(s, color)));
            Ok(decls)
        }
        "border-top" | "border-right" | "border-bottom" | "border-left" => {
            let side = Side::from_str(&name["border-".len()..]).map_err(|_| invalid())?;
            let (width, style, color) = border_triple(values).ok_or_else(invalid)?;
            Ok(vec![
                D::BorderWidth(side, width),
                D::BorderStyle(side, style),
                D::BorderColor(side, color),
            ])
        }
        "background" => background(values).map(|c| vec![D::BackgroundColor(c)]).ok_or_else(invalid),
        "font" => font_shorthand(values).ok_or_else(invalid),
        "list-style" => list_style_shorthand(values).ok_or_else(invalid),
        _ => Err(ValueError::UnknownProperty(name.to_string())),
    }
}

/// `[ <border-width> || <border-style> || <color> ]`; omitted parts reset
/// to their initial values.
fn border_triple(values: &Values<'_>) -> Option<(CssLength, BorderStyle, ColorValue)> {
    let mut width = None;
    let mut style = None;
    let mut color = None;
    for v in values {
        if width.is_none() {
            if let Some(w) = border_width(v) {
                width = Some(w);
                continue;
            }
        }
        if style.is_none() {
            if let Some(s) = border_style(v) {
                style = Some(s);
                continue;
            }
        }
        if color.is_none() {
            if let Ok(c) = parse_color(v) {
                color = Some(c);
                continue;
            }
        }
        return None;
    }
    Some((
        width.unwrap_or(CssLength::px(3.0)),
        style.unwrap_or_default(),
        color.unwrap_or(ColorValue::CurrentColor),
    ))
}

/// [§ 14.2.1 'background'](https://www.w3.org/TR/CSS2/colors.html#propdef-background)
///
/// Only the color is used; image, repeat, attachment and position parts
/// are accepted and ignored. The color resets to transparent when absent.
fn background(values: &Values<'_>) -> Option<ColorValue> {
    let mut color = None;
    for v in values {
        if color.is_none() {
            if let Ok(c) = parse_color(v) {
                color = Some(c);
                continue;
            }
        }
        if url_of(v).is_some() {
            continue;
        }
        if let Some(kw) = v.as_ident() {
            if matches!(
                kw.to_ascii_lowercase().as_str(),
                "none" | "repeat" | "repeat-x" | "repeat-y" | "no-repeat" | "scroll" | "fixed"
                    | "top" | "bottom" | "left" | "right" | "center"
            ) {
                continue;
            }
            return None;
        }
        if CssLength::from_component(v).has_error {
            return None;
        }
    }
    Some(color.unwrap_or(ColorValue::Rgba(Color::TRANSPARENT)))
}

/// [§ 15.8 'font'](https://www.w3.org/TR/CSS2/fonts.html#font-shorthand)
///
/// `[ style || variant || weight ]? size [ / line-height ]? family`.
fn font_shorthand(values: &Values<'_>) -> Option<Vec<PropertyDeclaration>> {
    use PropertyDeclaration as D;
    let mut style = None;
    let mut variant = None;
    let mut weight = None;
    let mut i = 0;
    // Up to three leading keywords; `normal` fills whichever slot is free.
    while i < values.len() {
        let v = values[i];
        if is_ident(v, "normal") {
            i += 1;
            continue;
        }
        if style.is_none() {
            if let Some(s) = v.as_ident().and_then(|s| FontStyle::from_str(s).ok()) {
                style = Some(s);
                i += 1;
                continue;
            }
        }
        if variant.is_none() {
            if let Some(s) = v.as_ident().and_then(|s| FontVariant::from_str(s).ok()) {
                variant = Some(s);
                i += 1;
                continue;
            }
        }
        if weight.is_none() {
            if let Some(w) = font_weight(v) {
                weight = Some(w);
                i += 1;
                continue;
            }
        }
        break;
    }
    let size = font_size(values.get(i)?)?;
    i += 1;
    let mut height = SpecifiedLineHeight::Normal;
    if values.get(i).is_some_and(|v| matches!(v.as_token(), Some(CSSToken::Delim('/')))) {
        height = line_height(values.get(i + 1)?)?;
        i += 2;
    }
    let family = font_family(values.get(i..)?)?;
    if family.is_empty() {
        return None;
    }
    Some(vec![
        D::FontStyle(style.unwrap_or_default()),
        D::FontVariant(variant.unwrap_or_default()),
        D::FontWeight(weight.unwrap_or(FontWeight::Absolute(400))),
        D::FontSize(size),
        D::LineHeight(height),
        D::FontFamily(family),
    ])
}

/// [§ 12.5.1 'list-style'](https://www.w3.org/TR/CSS2/generate.html#propdef-list-style)
///
/// `none` sets whichever of type and image is not otherwise given.
fn list_style_shorthand(values: &Values<'_>) -> Option<Vec<PropertyDeclaration>> {
    use PropertyDeclaration as D;
    let mut kind = None;
    let mut position = None;
    let mut image: Option<Option<String>> = None;
    let mut nones = 0;
    for v in values {
        if is_ident(v, "none") {
            nones += 1;
            continue;
        }
        if kind.is_none() {
            if let Some(t) = v.as_ident().and_then(|s| ListStyleType::from_str(s).ok()) {
                kind = Some(t);
                continue;
            }
        }
        if position.is_none() {
            if let Some(p) = v.as_ident().and_then(|s| ListStylePosition::from_str(s).ok()) {
                position = Some(p);
                continue;
            }
        }
        if image.is_none() {
            if let Some(u) = url_of(v) {
                image = Some(Some(u));
                continue;
            }
        }
        return None;
    }
    match nones {
        0 => {}
        1 if kind.is_none() => kind = Some(ListStyleType::None),
        1 if image.is_none() => image = Some(None),
        2 if kind.is_none() && image.is_none() => {
            kind = Some(ListStyleType::None);
            image = Some(None);
        }
        _ => return None,
    }
    Some(vec![
        D::ListStyleType(kind.unwrap_or_default()),
        D::ListStylePosition(position.unwrap_or_default()),
        D::ListStyleImage(image.unwrap_or_default()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_inline_style;

    fn parse(css: &str) -> Vec<PropertyDeclaration> {
        parse_inline_style(css).iter().flat_map(parse_declaration).collect()
    }

    #[test]
    fn test_inherited_properties() {
        assert!(PropertyId::Color.is_inherited());
        assert!(PropertyId::Quotes.is_inherited());
        assert!(!PropertyId::MarginTop.is_inherited());
        assert!(!PropertyId::PaddingLeft.is_inherited());
    }

    #[test]
    fn margin_shorthand_expands_in_trbl_order() {
        let decls = parse("margin: 1px 2px 3px");
        assert_eq!(decls.len(), 4);
        assert_eq!(decls[1], PropertyDeclaration::Margin(Side::Right, SpecifiedLength::Length(CssLength::px(2.0))));
        assert_eq!(decls[3], PropertyDeclaration::Margin(Side::Left, SpecifiedLength::Length(CssLength::px(2.0))));
    }

    #[test]
    fn bad_unit_drops_the_whole_shorthand() {
        let decls = parse("margin: 1px 2furlongs; color: red");
        assert!(decls[0].is_invalid());
        assert_eq!(decls.len(), 2, "the sibling color declaration survives");
        assert_eq!(decls[1].property_id(), Some(PropertyId::Color));
    }

    #[test]
    fn unitless_non_zero_is_invalid() {
        assert!(parse("width: 10")[0].is_invalid());
        assert!(!parse("width: 0")[0].is_invalid());
    }

    #[test]
    fn negative_font_size_is_dropped() {
        let decls = parse("font-size: -12px");
        assert!(matches!(
            &decls[0],
            PropertyDeclaration::Invalid { error: ValueError::Negative(_), .. }
        ));
    }

    #[test]
    fn border_shorthand_any_order() {
        let decls = parse("border: red solid 2px");
        assert_eq!(decls.len(), 12);
        assert!(decls.contains(&PropertyDeclaration::BorderStyle(Side::Left, BorderStyle::Solid)));
        assert!(decls.contains(&PropertyDeclaration::BorderWidth(Side::Top, CssLength::px(2.0))));
    }

    #[test]
    fn font_shorthand() {
        let decls = parse("font: italic bold 12px/1.5 \"Times New Roman\", serif");
        assert!(decls.contains(&PropertyDeclaration::FontStyle(FontStyle::Italic)));
        assert!(decls.contains(&PropertyDeclaration::FontWeight(FontWeight::Absolute(700))));
        assert!(decls.contains(&PropertyDeclaration::LineHeight(SpecifiedLineHeight::Number(1.5))));
        assert!(decls.contains(&PropertyDeclaration::FontFamily(vec![
            "Times New Roman".to_string(),
            "serif".to_string()
        ])));
        assert!(parse("font: bold")[0].is_invalid(), "size and family are required");
    }

    #[test]
    fn list_style_none_sets_type() {
        let decls = parse("list-style: none inside");
        assert!(decls.contains(&PropertyDeclaration::ListStyleType(ListStyleType::None)));
        assert!(decls.contains(&PropertyDeclaration::ListStylePosition(ListStylePosition::Inside)));
    }

    #[test]
    fn content_parts() {
        let decls = parse("content: \"[\" counter(item, upper-roman) counters(s, \".\") attr(title) open-quote");
        let PropertyDeclaration::Content(Content::Items(items)) = &decls[0] else {
            panic!("expected content items, got {decls:?}");
        };
        assert_eq!(items.len(), 5);
        assert_eq!(
            items[1],
            ContentItem::Counter { name: "item".into(), style: ListStyleType::UpperRoman }
        );
        assert!(matches!(&items[2], ContentItem::Counters { separator, style: ListStyleType::Decimal, .. } if separator == "."));
    }

    #[test]
    fn counter_ops_defaults() {
        let decls = parse("counter-reset: a b 5; counter-increment: a -2");
        assert_eq!(
            decls[0],
            PropertyDeclaration::CounterReset(vec![
                CounterOp { name: "a".into(), value: 0 },
                CounterOp { name: "b".into(), value: 5 },
            ])
        );
        assert_eq!(
            decls[1],
            PropertyDeclaration::CounterIncrement(vec![CounterOp { name: "a".into(), value: -2 }])
        );
    }

    #[test]
    fn inherit_on_shorthand_covers_longhands() {
        let decls = parse("padding: inherit");
        assert_eq!(decls.len(), 4);
        assert!(decls.iter().all(|d| matches!(d, PropertyDeclaration::CssWide(_, CssWideKeyword::Inherit))));
    }

    #[test]
    fn unknown_property_is_invalid() {
        assert!(matches!(
            &parse("frobnicate: 1")[0],
            PropertyDeclaration::Invalid { error: ValueError::UnknownProperty(_), .. }
        ));
    }
}
