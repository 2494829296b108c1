//! Typed property values used by [`super::ComputedStyle`].

use serde::Serialize;
use strum_macros::{Display, EnumString};

use crate::values::saturate_px;

/// [CSS 2.1 § 9.2.4 'display'](https://www.w3.org/TR/CSS2/visuren.html#display-prop)
///
/// Table, flex and grid keywords are accepted and laid out as block
/// containers (or inline-blocks for the `inline-*` forms).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum Display {
    /// `inline` (initial)
    #[default]
    Inline,
    /// `block`
    Block,
    /// `inline-block`
    InlineBlock,
    /// `list-item`
    ListItem,
    /// `run-in`, treated as `block`.
    RunIn,
    /// `none`
    None,
    /// `table`
    Table,
    /// `inline-table`
    InlineTable,
    /// `table-row-group`
    TableRowGroup,
    /// `table-header-group`
    TableHeaderGroup,
    /// `table-footer-group`
    TableFooterGroup,
    /// `table-row`
    TableRow,
    /// `table-column-group`
    TableColumnGroup,
    /// `table-column`
    TableColumn,
    /// `table-cell`
    TableCell,
    /// `table-caption`
    TableCaption,
    /// `flex`
    Flex,
    /// `inline-flex`
    InlineFlex,
    /// `grid`
    Grid,
    /// `inline-grid`
    InlineGrid,
}

impl Display {
    /// True for values generating a block-level box.
    #[must_use]
    pub const fn is_block_level(self) -> bool {
        !matches!(
            self,
            Self::Inline | Self::InlineBlock | Self::InlineTable | Self::InlineFlex
                | Self::InlineGrid | Self::None
        )
    }

    /// True for atomic inline-level boxes.
    #[must_use]
    pub const fn is_inline_block(self) -> bool {
        matches!(
            self,
            Self::InlineBlock | Self::InlineTable | Self::InlineFlex | Self::InlineGrid
        )
    }

    /// [§ 9.7](https://www.w3.org/TR/CSS2/visuren.html#dis-pos-flo)
    /// Computed display of floated, absolutely positioned and root elements.
    #[must_use]
    pub const fn blockify(self) -> Self {
        match self {
            Self::Inline | Self::InlineBlock | Self::RunIn | Self::TableRowGroup
            | Self::TableHeaderGroup | Self::TableFooterGroup | Self::TableRow
            | Self::TableColumnGroup | Self::TableColumn | Self::TableCell
            | Self::TableCaption => Self::Block,
            Self::InlineTable => Self::Table,
            Self::InlineFlex => Self::Flex,
            Self::InlineGrid => Self::Grid,
            other => other,
        }
    }
}

/// [§ 9.3.1 'position'](https://www.w3.org/TR/CSS2/visuren.html#choose-position)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    /// `static`
    #[default]
    Static,
    /// `relative`
    Relative,
    /// `absolute`
    Absolute,
    /// `fixed`
    Fixed,
}

impl Position {
    /// Absolute or fixed.
    #[must_use]
    pub const fn is_out_of_flow(self) -> bool {
        matches!(self, Self::Absolute | Self::Fixed)
    }
}

/// [§ 9.5.1 'float'](https://www.w3.org/TR/CSS2/visuren.html#float-position)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum Float {
    /// `none`
    #[default]
    None,
    /// `left`
    Left,
    /// `right`
    Right,
}

/// [§ 9.5.2 'clear'](https://www.w3.org/TR/CSS2/visuren.html#flow-control)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum Clear {
    /// `none`
    #[default]
    None,
    /// `left`
    Left,
    /// `right`
    Right,
    /// `both`
    Both,
}

/// [§ 8.5.3 Border style](https://www.w3.org/TR/CSS2/box.html#border-style-properties)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum BorderStyle {
    /// `none`
    #[default]
    None,
    /// `hidden`
    Hidden,
    /// `dotted`
    Dotted,
    /// `dashed`
    Dashed,
    /// `solid`
    Solid,
    /// `double`
    Double,
    /// `groove`
    Groove,
    /// `ridge`
    Ridge,
    /// `inset`
    Inset,
    /// `outset`
    Outset,
}

impl BorderStyle {
    /// "none" and "hidden" force a computed width of zero.
    #[must_use]
    pub const fn has_no_width(self) -> bool {
        matches!(self, Self::None | Self::Hidden)
    }
}

/// [§ 15.4 'font-style'](https://www.w3.org/TR/CSS2/fonts.html#font-styling)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum FontStyle {
    /// `normal`
    #[default]
    Normal,
    /// `italic`
    Italic,
    /// `oblique`
    Oblique,
}

/// [§ 15.5 'font-variant'](https://www.w3.org/TR/CSS2/fonts.html#small-caps)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum FontVariant {
    /// `normal`
    #[default]
    Normal,
    /// `small-caps`
    SmallCaps,
}

/// [§ 16.2 'text-align'](https://www.w3.org/TR/CSS2/text.html#alignment-prop)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum TextAlign {
    /// `left`
    #[default]
    Left,
    /// `right`
    Right,
    /// `center`
    Center,
    /// `justify`
    Justify,
}

/// [§ 16.5 'text-transform'](https://www.w3.org/TR/CSS2/text.html#caps-prop)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum TextTransform {
    /// `none`
    #[default]
    None,
    /// `capitalize`
    Capitalize,
    /// `uppercase`
    Uppercase,
    /// `lowercase`
    Lowercase,
}

/// [§ 16.6 'white-space'](https://www.w3.org/TR/CSS2/text.html#white-space-prop)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum WhiteSpace {
    /// `normal`
    #[default]
    Normal,
    /// `pre`
    Pre,
    /// `nowrap`
    Nowrap,
    /// `pre-wrap`
    PreWrap,
    /// `pre-line`
    PreLine,
}

impl WhiteSpace {
    /// Sequences of spaces and tabs are collapsed.
    #[must_use]
    pub const fn collapses_spaces(self) -> bool {
        matches!(self, Self::Normal | Self::Nowrap | Self::PreLine)
    }

    /// Newlines in the source are forced breaks.
    #[must_use]
    pub const fn preserves_newlines(self) -> bool {
        matches!(self, Self::Pre | Self::PreWrap | Self::PreLine)
    }

    /// Lines may be broken at soft wrap opportunities.
    #[must_use]
    pub const fn wraps(self) -> bool {
        matches!(self, Self::Normal | Self::PreWrap | Self::PreLine)
    }
}

/// [§ 11.2 'visibility'](https://www.w3.org/TR/CSS2/visufx.html#visibility)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum Visibility {
    /// `visible`
    #[default]
    Visible,
    /// `hidden`
    Hidden,
    /// `collapse`, treated as `hidden`.
    Collapse,
}

/// [§ 11.1.1 'overflow'](https://www.w3.org/TR/CSS2/visufx.html#overflow)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum Overflow {
    /// `visible`
    #[default]
    Visible,
    /// `hidden`
    Hidden,
    /// `scroll`
    Scroll,
    /// `auto`
    Auto,
}

/// [§ 12.5.1 'list-style-type'](https://www.w3.org/TR/CSS2/generate.html#list-style)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum ListStyleType {
    /// `disc`
    #[default]
    Disc,
    /// `circle`
    Circle,
    /// `square`
    Square,
    /// `decimal`
    Decimal,
    /// `decimal-leading-zero`
    DecimalLeadingZero,
    /// `lower-roman`
    LowerRoman,
    /// `upper-roman`
    UpperRoman,
    /// `lower-greek`
    LowerGreek,
    /// `lower-alpha`
    LowerAlpha,
    /// `lower-latin`
    LowerLatin,
    /// `upper-alpha`
    UpperAlpha,
    /// `upper-latin`
    UpperLatin,
    /// `armenian`
    Armenian,
    /// `georgian`
    Georgian,
    /// `none`
    None,
}

/// [§ 12.5.1 'list-style-position'](https://www.w3.org/TR/CSS2/generate.html#propdef-list-style-position)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum ListStylePosition {
    /// `outside`
    #[default]
    Outside,
    /// `inside`
    Inside,
}

/// A computed length that may also be a percentage or `auto`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "kebab-case", tag = "type", content = "value")]
pub enum LengthPercentageAuto {
    /// Absolute pixels.
    Px(f32),
    /// Percentage of the containing block dimension.
    Percent(f32),
    /// `auto`
    #[default]
    Auto,
}

impl LengthPercentageAuto {
    /// Zero pixels.
    pub const ZERO: Self = Self::Px(0.0);

    /// Resolve against a reference length; `auto` yields `None`.
    #[must_use]
    pub fn resolve(self, base: f32) -> Option<f32> {
        match self {
            Self::Px(v) => Some(v),
            Self::Percent(p) => Some(saturate_px(p * base / 100.0)),
            Self::Auto => None,
        }
    }

    /// Resolve a percentage only when the base is known.
    #[must_use]
    pub fn resolve_definite(self, base: Option<f32>) -> Option<f32> {
        match self {
            Self::Px(v) => Some(v),
            Self::Percent(p) => base.map(|b| saturate_px(p * b / 100.0)),
            Self::Auto => None,
        }
    }
}

/// [§ 10.8.1 'line-height'](https://www.w3.org/TR/CSS2/visudet.html#propdef-line-height)
///
/// Numbers are inherited as numbers; lengths and percentages compute to px.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "kebab-case", tag = "type", content = "value")]
pub enum LineHeight {
    /// `normal`, laid out as 1.2.
    #[default]
    Normal,
    /// A multiplier of the element's font size.
    Number(f32),
    /// Absolute pixels.
    Px(f32),
}

impl LineHeight {
    /// The multiplier used for `normal`.
    pub const NORMAL_FACTOR: f32 = 1.2;

    /// Used line height for the given font size.
    #[must_use]
    pub fn resolve(self, font_size: f32) -> f32 {
        saturate_px(match self {
            Self::Normal => font_size * Self::NORMAL_FACTOR,
            Self::Number(n) => font_size * n,
            Self::Px(px) => px,
        })
    }
}

/// Top/right/bottom/left values.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Edges<T> {
    /// Top edge.
    pub top: T,
    /// Right edge.
    pub right: T,
    /// Bottom edge.
    pub bottom: T,
    /// Left edge.
    pub left: T,
}

impl<T: Copy> Edges<T> {
    /// All four edges set to `v`.
    pub const fn all(v: T) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    /// Apply `f` to every edge.
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Edges<U> {
        Edges {
            top: f(self.top),
            right: f(self.right),
            bottom: f(self.bottom),
            left: f(self.left),
        }
    }

    /// Get the value for a side.
    pub const fn get(&self, side: Side) -> T {
        match side {
            Side::Top => self.top,
            Side::Right => self.right,
            Side::Bottom => self.bottom,
            Side::Left => self.left,
        }
    }

    /// Set the value for a side.
    pub const fn set(&mut self, side: Side, v: T) {
        match side {
            Side::Top => self.top = v,
            Side::Right => self.right = v,
            Side::Bottom => self.bottom = v,
            Side::Left => self.left = v,
        }
    }
}

impl Edges<f32> {
    /// Left plus right.
    #[must_use]
    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    /// Top plus bottom.
    #[must_use]
    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }
}

/// A physical box side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Side {
    /// Top.
    Top,
    /// Right.
    Right,
    /// Bottom.
    Bottom,
    /// Left.
    Left,
}

impl Side {
    /// In the order of the four-value shorthands.
    pub const ALL: [Self; 4] = [Self::Top, Self::Right, Self::Bottom, Self::Left];
}

/// [§ 16.3.1 'text-decoration'](https://www.w3.org/TR/CSS2/text.html#lining-striking-props)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct TextDecoration {
    /// `underline`
    pub underline: bool,
    /// `overline`
    pub overline: bool,
    /// `line-through`
    pub line_through: bool,
}

impl TextDecoration {
    /// No decoration.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        !(self.underline || self.overline || self.line_through)
    }

    /// Union with decorations propagated from an ancestor.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self {
            underline: self.underline || other.underline,
            overline: self.overline || other.overline,
            line_through: self.line_through || other.line_through,
        }
    }
}

/// One part of a `content` value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "type")]
pub enum ContentItem {
    /// A literal string.
    String {
        /// The text.
        value: String,
    },
    /// `attr(name)`
    Attr {
        /// Attribute name, lowercase.
        name: String,
    },
    /// `counter(name, style)`
    Counter {
        /// Counter name.
        name: String,
        /// Numbering style.
        style: ListStyleType,
    },
    /// `counters(name, separator, style)`
    Counters {
        /// Counter name.
        name: String,
        /// String placed between nested values.
        separator: String,
        /// Numbering style.
        style: ListStyleType,
    },
    /// `open-quote`
    OpenQuote,
    /// `close-quote`
    CloseQuote,
    /// `no-open-quote`
    NoOpenQuote,
    /// `no-close-quote`
    NoCloseQuote,
    /// `url(...)`: generated images are not fetched; kept for diagnostics.
    Url {
        /// The URL text.
        url: String,
    },
}

/// [§ 12.2 'content'](https://www.w3.org/TR/CSS2/generate.html#content)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case", tag = "type", content = "items")]
pub enum Content {
    /// `normal` (initial): no generated box for `::before`/`::after`.
    #[default]
    Normal,
    /// `none`
    None,
    /// A list of parts.
    Items(Vec<ContentItem>),
}

impl Content {
    /// Whether a `::before`/`::after` with this value generates a box.
    #[must_use]
    pub const fn generates_box(&self) -> bool {
        matches!(self, Self::Items(_))
    }
}

/// One entry of `counter-reset` or `counter-increment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterOp {
    /// Counter name.
    pub name: String,
    /// Reset value or increment.
    pub value: i32,
}

/// A `quotes` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuotePair {
    /// Opening quote.
    pub open: String,
    /// Closing quote.
    pub close: String,
}

/// Initial `quotes`: curly double quotes, then curly single quotes.
#[must_use]
pub fn default_quotes() -> Vec<QuotePair> {
    vec![
        QuotePair {
            open: "\u{201C}".to_string(),
            close: "\u{201D}".to_string(),
        },
        QuotePair {
            open: "\u{2018}".to_string(),
            close: "\u{2019}".to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_parse_case_insensitively() {
        assert_eq!("INLINE-BLOCK".parse::<Display>(), Ok(Display::InlineBlock));
        assert_eq!("list-item".parse::<Display>(), Ok(Display::ListItem));
        assert_eq!("Pre-Wrap".parse::<WhiteSpace>(), Ok(WhiteSpace::PreWrap));
        assert_eq!("lower-roman".parse::<ListStyleType>(), Ok(ListStyleType::LowerRoman));
        assert!("sideways".parse::<Float>().is_err());
    }

    #[test]
    fn blockify_maps_inline_level_values() {
        assert_eq!(Display::Inline.blockify(), Display::Block);
        assert_eq!(Display::InlineBlock.blockify(), Display::Block);
        assert_eq!(Display::ListItem.blockify(), Display::ListItem);
        assert_eq!(Display::InlineFlex.blockify(), Display::Flex);
    }

    #[test]
    fn percentage_resolution() {
        assert_eq!(LengthPercentageAuto::Percent(50.0).resolve(400.0), Some(200.0));
        assert_eq!(LengthPercentageAuto::Percent(50.0).resolve_definite(None), None);
        assert_eq!(LengthPercentageAuto::Auto.resolve(400.0), None);
    }
}
