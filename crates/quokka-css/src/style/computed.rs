//! [CSS 2.1 § 6.1.2 Computed values](https://www.w3.org/TR/CSS2/cascade.html#computed-value)

use serde::Serialize;

use super::declaration::{
    CssWideKeyword, FontSize, FontWeight, PropertyDeclaration, PropertyId, SpecifiedLength,
    SpecifiedLineHeight,
};
use super::types::{
    BorderStyle, Clear, Content, CounterOp, Display, Edges, Float, FontStyle, FontVariant,
    LengthPercentageAuto, LineHeight, ListStylePosition, ListStyleType, Overflow, Position,
    QuotePair, Side, TextAlign, TextDecoration, TextTransform, Visibility, WhiteSpace,
    default_quotes,
};
use crate::values::{Color, ColorValue, CssLength, LengthContext, saturate_px};

/// Initial `font-size` ("medium").
pub const DEFAULT_FONT_SIZE_PX: f32 = 16.0;

/// Initial `border-*-width` ("medium").
pub const MEDIUM_BORDER_WIDTH_PX: f32 = 3.0;

/// Computed style of one element or pseudo-element.
///
/// Every property is a typed field; lengths are already in px except
/// percentages, which stay relative until layout knows the containing block.
/// Built once by the cascade and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComputedStyle {
    /// `display`, blockified where CSS 2.1 § 9.7 requires.
    pub display: Display,
    /// `position`
    pub position: Position,
    /// `top`/`right`/`bottom`/`left`
    pub inset: Edges<LengthPercentageAuto>,
    /// `float`
    pub float: Float,
    /// `clear`
    pub clear: Clear,
    /// `margin-*`
    pub margin: Edges<LengthPercentageAuto>,
    /// `padding-*`; never `Auto`.
    pub padding: Edges<LengthPercentageAuto>,
    /// `border-*-width` in px, zero when the style is `none` or `hidden`.
    pub border_width: Edges<f32>,
    /// `border-*-style`
    pub border_style: Edges<BorderStyle>,
    /// `border-*-color`; `currentColor` until resolved by [`Self::border_color`].
    pub border_color: Edges<ColorValue>,
    /// `width`
    pub width: LengthPercentageAuto,
    /// `height`
    pub height: LengthPercentageAuto,
    /// `min-width`
    pub min_width: LengthPercentageAuto,
    /// `max-width`; `Auto` stands for `none`.
    pub max_width: LengthPercentageAuto,
    /// `min-height`
    pub min_height: LengthPercentageAuto,
    /// `max-height`; `Auto` stands for `none`.
    pub max_height: LengthPercentageAuto,
    /// `color`
    pub color: Color,
    /// `background-color`
    pub background_color: ColorValue,
    /// `font-family`, in preference order. Empty means the default family.
    pub font_family: Vec<String>,
    /// `font-size` in px.
    pub font_size: f32,
    /// `font-weight`, 100 to 900.
    pub font_weight: u16,
    /// `font-style`
    pub font_style: FontStyle,
    /// `font-variant`
    pub font_variant: FontVariant,
    /// `line-height`
    pub line_height: LineHeight,
    /// `text-align`
    pub text_align: TextAlign,
    /// `text-decoration` as declared on this element.
    pub text_decoration: TextDecoration,
    /// Decorations drawn on this element's text: its own plus those
    /// propagated from ancestors.
    pub text_decoration_lines: TextDecoration,
    /// `text-transform`
    pub text_transform: TextTransform,
    /// `white-space`
    pub white_space: WhiteSpace,
    /// `visibility`
    pub visibility: Visibility,
    /// `overflow`
    pub overflow: Overflow,
    /// `list-style-type`
    pub list_style_type: ListStyleType,
    /// `list-style-position`
    pub list_style_position: ListStylePosition,
    /// `list-style-image`
    pub list_style_image: Option<String>,
    /// `counter-reset`
    pub counter_reset: Vec<CounterOp>,
    /// `counter-increment`
    pub counter_increment: Vec<CounterOp>,
    /// `quotes`
    pub quotes: Vec<QuotePair>,
    /// `content`
    pub content: Content,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self::initial()
    }
}

impl ComputedStyle {
    /// Every property at its initial value.
    #[must_use]
    pub fn initial() -> Self {
        Self {
            display: Display::Inline,
            position: Position::Static,
            inset: Edges::all(LengthPercentageAuto::Auto),
            float: Float::None,
            clear: Clear::None,
            margin: Edges::all(LengthPercentageAuto::ZERO),
            padding: Edges::all(LengthPercentageAuto::ZERO),
            border_width: Edges::all(MEDIUM_BORDER_WIDTH_PX),
            border_style: Edges::all(BorderStyle::None),
            border_color: Edges::all(ColorValue::CurrentColor),
            width: LengthPercentageAuto::Auto,
            height: LengthPercentageAuto::Auto,
            min_width: LengthPercentageAuto::ZERO,
            max_width: LengthPercentageAuto::Auto,
            min_height: LengthPercentageAuto::ZERO,
            max_height: LengthPercentageAuto::Auto,
            color: Color::BLACK,
            background_color: ColorValue::Rgba(Color::TRANSPARENT),
            font_family: Vec::new(),
            font_size: DEFAULT_FONT_SIZE_PX,
            font_weight: 400,
            font_style: FontStyle::Normal,
            font_variant: FontVariant::Normal,
            line_height: LineHeight::Normal,
            text_align: TextAlign::Left,
            text_decoration: TextDecoration::default(),
            text_decoration_lines: TextDecoration::default(),
            text_transform: TextTransform::None,
            white_space: WhiteSpace::Normal,
            visibility: Visibility::Visible,
            overflow: Overflow::Visible,
            list_style_type: ListStyleType::Disc,
            list_style_position: ListStylePosition::Outside,
            list_style_image: None,
            counter_reset: Vec::new(),
            counter_increment: Vec::new(),
            quotes: default_quotes(),
            content: Content::Normal,
        }
    }

    /// [§ 6.2 Inheritance](https://www.w3.org/TR/CSS2/cascade.html#inheritance)
    ///
    /// Starting style of a child: inherited properties copied from the
    /// parent, the rest at their initial values.
    #[must_use]
    pub fn inherit_from(parent: &Self) -> Self {
        Self {
            color: parent.color,
            font_family: parent.font_family.clone(),
            font_size: parent.font_size,
            font_weight: parent.font_weight,
            font_style: parent.font_style,
            font_variant: parent.font_variant,
            line_height: parent.line_height,
            text_align: parent.text_align,
            text_decoration_lines: parent.text_decoration_lines,
            text_transform: parent.text_transform,
            white_space: parent.white_space,
            visibility: parent.visibility,
            list_style_type: parent.list_style_type,
            list_style_position: parent.list_style_position,
            list_style_image: parent.list_style_image.clone(),
            quotes: parent.quotes.clone(),
            ..Self::initial()
        }
    }

    /// Resolved border color for one side.
    #[must_use]
    pub const fn border_color(&self, side: Side) -> Color {
        self.border_color.get(side).resolve(self.color)
    }

    /// Resolved background color.
    #[must_use]
    pub const fn background(&self) -> Color {
        self.background_color.resolve(self.color)
    }

    /// Whether the element's own box is painted.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        matches!(self.visibility, Visibility::Visible)
    }

    /// Used line height in px.
    #[must_use]
    pub fn used_line_height(&self) -> f32 {
        self.line_height.resolve(self.font_size)
    }

    /// Whether this element establishes a new block formatting context
    /// ([§ 9.4.1](https://www.w3.org/TR/CSS2/visuren.html#block-formatting)).
    #[must_use]
    pub const fn establishes_bfc(&self) -> bool {
        !matches!(self.float, Float::None)
            || self.position.is_out_of_flow()
            || self.display.is_inline_block()
            || !matches!(self.overflow, Overflow::Visible)
    }

    /// Copy one longhand from `source`. Backs `inherit` and `initial`.
    pub fn copy_property(&mut self, id: PropertyId, source: &Self) {
        match id {
            PropertyId::Display => self.display = source.display,
            PropertyId::Position => self.position = source.position,
            PropertyId::Top => self.inset.top = source.inset.top,
            PropertyId::Right => self.inset.right = source.inset.right,
            PropertyId::Bottom => self.inset.bottom = source.inset.bottom,
            PropertyId::Left => self.inset.left = source.inset.left,
            PropertyId::Float => self.float = source.float,
            PropertyId::Clear => self.clear = source.clear,
            PropertyId::MarginTop => self.margin.top = source.margin.top,
            PropertyId::MarginRight => self.margin.right = source.margin.right,
            PropertyId::MarginBottom => self.margin.bottom = source.margin.bottom,
            PropertyId::MarginLeft => self.margin.left = source.margin.left,
            PropertyId::PaddingTop => self.padding.top = source.padding.top,
            PropertyId::PaddingRight => self.padding.right = source.padding.right,
            PropertyId::PaddingBottom => self.padding.bottom = source.padding.bottom,
            PropertyId::PaddingLeft => self.padding.left = source.padding.left,
            PropertyId::BorderTopWidth => self.border_width.top = source.border_width.top,
            PropertyId::BorderRightWidth => self.border_width.right = source.border_width.right,
            PropertyId::BorderBottomWidth => self.border_width.bottom = source.border_width.bottom,
            PropertyId::BorderLeftWidth => self.border_width.left = source.border_width.left,
            PropertyId::BorderTopStyle => self.border_style.top = source.border_style.top,
            PropertyId::BorderRightStyle => self.border_style.right = source.border_style.right,
            PropertyId::BorderBottomStyle => self.border_style.bottom = source.border_style.bottom,
            PropertyId::BorderLeftStyle => self.border_style.left = source.border_style.left,
            PropertyId::BorderTopColor => self.border_color.top = source.border_color.top,
            PropertyId::BorderRightColor => self.border_color.right = source.border_color.right,
            PropertyId::BorderBottomColor => self.border_color.bottom = source.border_color.bottom,
            PropertyId::BorderLeftColor => self.border_color.left = source.border_color.left,
            PropertyId::Width => self.width = source.width,
            PropertyId::Height => self.height = source.height,
            PropertyId::MinWidth => self.min_width = source.min_width,
            PropertyId::MaxWidth => self.max_width = source.max_width,
            PropertyId::MinHeight => self.min_height = source.min_height,
            PropertyId::MaxHeight => self.max_height = source.max_height,
            PropertyId::Color => self.color = source.color,
            PropertyId::BackgroundColor => self.background_color = source.background_color,
            PropertyId::FontFamily => self.font_family.clone_from(&source.font_family),
            PropertyId::FontSize => self.font_size = source.font_size,
            PropertyId::FontWeight => self.font_weight = source.font_weight,
            PropertyId::FontStyle => self.font_style = source.font_style,
            PropertyId::FontVariant => self.font_variant = source.font_variant,
            PropertyId::LineHeight => self.line_height = source.line_height,
            PropertyId::TextAlign => self.text_align = source.text_align,
            PropertyId::TextDecoration => self.text_decoration = source.text_decoration,
            PropertyId::TextTransform => self.text_transform = source.text_transform,
            PropertyId::WhiteSpace => self.white_space = source.white_space,
            PropertyId::Visibility => self.visibility = source.visibility,
            PropertyId::Overflow => self.overflow = source.overflow,
            PropertyId::ListStyleType => self.list_style_type = source.list_style_type,
            PropertyId::ListStylePosition => self.list_style_position = source.list_style_position,
            PropertyId::ListStyleImage => {
                self.list_style_image.clone_from(&source.list_style_image);
            }
            PropertyId::CounterReset => self.counter_reset.clone_from(&source.counter_reset),
            PropertyId::CounterIncrement => {
                self.counter_increment.clone_from(&source.counter_increment);
            }
            PropertyId::Quotes => self.quotes.clone_from(&source.quotes),
            PropertyId::Content => self.content.clone_from(&source.content),
        }
    }

    /// Apply one declaration. `font-size` must already be final so that
    /// `em` lengths resolve against it.
    pub fn apply(&mut self, decl: &PropertyDeclaration, parent: &Self, root_font_size: f32) {
        use PropertyDeclaration as D;
        let ctx = LengthContext {
            font_size: self.font_size,
            root_font_size,
        };
        match decl {
            D::Display(v) => self.display = *v,
            D::Position(v) => self.position = *v,
            D::Inset(side, v) => self.inset.set(*side, computed_length(*v, &ctx)),
            D::Float(v) => self.float = *v,
            D::Clear(v) => self.clear = *v,
            D::Margin(side, v) => self.margin.set(*side, computed_length(*v, &ctx)),
            D::Padding(side, v) => self.padding.set(*side, computed_lp(*v, &ctx)),
            D::BorderWidth(side, v) => self.border_width.set(*side, v.to_px(&ctx, 0.0).max(0.0)),
            D::BorderStyle(side, v) => self.border_style.set(*side, *v),
            D::BorderColor(side, v) => self.border_color.set(*side, *v),
            D::Width(v) => self.width = computed_length(*v, &ctx),
            D::Height(v) => self.height = computed_length(*v, &ctx),
            D::MinWidth(v) => self.min_width = computed_length(*v, &ctx),
            D::MaxWidth(v) => self.max_width = computed_length(*v, &ctx),
            D::MinHeight(v) => self.min_height = computed_length(*v, &ctx),
            D::MaxHeight(v) => self.max_height = computed_length(*v, &ctx),
            // "currentColor" on 'color' itself means the inherited value.
            D::Color(v) => self.color = v.resolve(parent.color),
            D::BackgroundColor(v) => self.background_color = *v,
            D::FontFamily(v) => self.font_family.clone_from(v),
            D::FontSize(v) => self.font_size = computed_font_size(*v, parent.font_size, root_font_size),
            D::FontWeight(v) => self.font_weight = computed_font_weight(*v, parent.font_weight),
            D::FontStyle(v) => self.font_style = *v,
            D::FontVariant(v) => self.font_variant = *v,
            D::LineHeight(v) => self.line_height = computed_line_height(*v, &ctx),
            D::TextAlign(v) => self.text_align = *v,
            D::TextDecoration(v) => self.text_decoration = *v,
            D::TextTransform(v) => self.text_transform = *v,
            D::WhiteSpace(v) => self.white_space = *v,
            D::Visibility(v) => self.visibility = *v,
            D::Overflow(v) => self.overflow = *v,
            D::ListStyleType(v) => self.list_style_type = *v,
            D::ListStylePosition(v) => self.list_style_position = *v,
            D::ListStyleImage(v) => self.list_style_image.clone_from(v),
            D::CounterReset(v) => self.counter_reset.clone_from(v),
            D::CounterIncrement(v) => self.counter_increment.clone_from(v),
            D::Quotes(v) => self.quotes.clone_from(v),
            D::Content(v) => self.content.clone_from(v),
            D::CssWide(id, CssWideKeyword::Inherit) => self.copy_property(*id, parent),
            D::CssWide(id, CssWideKeyword::Initial) => self.copy_property(*id, &Self::initial()),
            D::Invalid { .. } => {}
        }
    }

    /// Fix-ups that depend on several properties at once.
    ///
    /// - [§ 8.5.3](https://www.w3.org/TR/CSS2/box.html#border-style-properties):
    ///   a border with style `none` or `hidden` has zero width.
    /// - [§ 9.7](https://www.w3.org/TR/CSS2/visuren.html#dis-pos-flo): floats,
    ///   absolutely positioned boxes and the root are blockified, and
    ///   absolutely positioned boxes do not float.
    /// - Text decorations propagate to descendants.
    pub fn finalize(&mut self, is_root: bool) {
        for side in Side::ALL {
            if self.border_style.get(side).has_no_width() {
                self.border_width.set(side, 0.0);
            }
        }
        if self.display != Display::None {
            if self.position.is_out_of_flow() {
                self.float = Float::None;
            }
            if is_root || self.float != Float::None || self.position.is_out_of_flow() {
                self.display = self.display.blockify();
            }
        }
        if self.visibility == Visibility::Collapse {
            self.visibility = Visibility::Hidden;
        }
        self.text_decoration_lines = self.text_decoration_lines.union(self.text_decoration);
    }
}

fn computed_length(value: SpecifiedLength, ctx: &LengthContext) -> LengthPercentageAuto {
    match value {
        SpecifiedLength::Length(l) => computed_lp(l, ctx),
        SpecifiedLength::Auto | SpecifiedLength::None => LengthPercentageAuto::Auto,
    }
}

fn computed_lp(length: CssLength, ctx: &LengthContext) -> LengthPercentageAuto {
    if length.is_percent() {
        LengthPercentageAuto::Percent(length.value)
    } else {
        LengthPercentageAuto::Px(length.to_px(ctx, 0.0))
    }
}

/// [§ 15.7](https://www.w3.org/TR/CSS2/fonts.html#font-size-props): relative
/// units and percentages refer to the parent's font size. `larger` and
/// `smaller` scale by 1.2.
fn computed_font_size(value: FontSize, parent: f32, root: f32) -> f32 {
    let ctx = LengthContext {
        font_size: parent,
        root_font_size: root,
    };
    let px = match value {
        FontSize::Length(l) => l.to_px(&ctx, parent),
        FontSize::Keyword(px) => px,
        FontSize::Larger => parent * 1.2,
        FontSize::Smaller => parent / 1.2,
    };
    saturate_px(px).max(0.0)
}

/// [CSS Fonts 3 § 3.2](https://www.w3.org/TR/css-fonts-3/#relative-weights)
/// relative weight table.
#[must_use]
pub const fn computed_font_weight(value: FontWeight, parent: u16) -> u16 {
    match value {
        FontWeight::Absolute(w) => w,
        FontWeight::Bolder => {
            if parent < 350 {
                400
            } else if parent < 550 {
                700
            } else {
                900
            }
        }
        FontWeight::Lighter => {
            if parent < 100 {
                parent
            } else if parent < 550 {
                100
            } else if parent < 750 {
                400
            } else {
                700
            }
        }
    }
}

fn computed_line_height(value: SpecifiedLineHeight, ctx: &LengthContext) -> LineHeight {
    match value {
        SpecifiedLineHeight::Normal => LineHeight::Normal,
        SpecifiedLineHeight::Number(n) => LineHeight::Number(n),
        SpecifiedLineHeight::Length(l) => LineHeight::Px(l.to_px(ctx, ctx.font_size)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_weight_table() {
        assert_eq!(computed_font_weight(FontWeight::Bolder, 100), 400);
        assert_eq!(computed_font_weight(FontWeight::Bolder, 400), 700);
        assert_eq!(computed_font_weight(FontWeight::Bolder, 700), 900);
        assert_eq!(computed_font_weight(FontWeight::Lighter, 400), 100);
        assert_eq!(computed_font_weight(FontWeight::Lighter, 600), 400);
        assert_eq!(computed_font_weight(FontWeight::Lighter, 900), 700);
    }

    #[test]
    fn font_size_keywords_and_relative() {
        assert!((computed_font_size(FontSize::Larger, 10.0, 16.0) - 12.0).abs() < 1e-4);
        let em = FontSize::Length(crate::values::parse_length("2em"));
        assert!((computed_font_size(em, 10.0, 16.0) - 20.0).abs() < 1e-4);
        let pct = FontSize::Length(crate::values::parse_length("150%"));
        assert!((computed_font_size(pct, 10.0, 16.0) - 15.0).abs() < 1e-4);
    }

    #[test]
    fn nested_huge_em_font_sizes_stay_finite() {
        let em = FontSize::Length(crate::values::parse_length("1e12em"));
        let mut size = computed_font_size(
            FontSize::Length(crate::values::parse_length("1e12px")),
            16.0,
            16.0,
        );
        for _ in 0..3 {
            size = computed_font_size(em, size, 16.0);
            assert!(size.is_finite());
        }
        assert_eq!(size, crate::values::MAX_PX);
        assert_eq!(computed_font_size(FontSize::Larger, size, 16.0), crate::values::MAX_PX);
    }

    #[test]
    fn finalize_zeroes_borders_without_style() {
        let mut style = ComputedStyle::initial();
        style.border_width = Edges::all(4.0);
        style.border_style.top = BorderStyle::Solid;
        style.finalize(false);
        assert_eq!(style.border_width.top, 4.0);
        assert_eq!(style.border_width.left, 0.0);
    }

    #[test]
    fn finalize_blockifies_floats() {
        let mut style = ComputedStyle::initial();
        style.float = Float::Left;
        style.finalize(false);
        assert_eq!(style.display, Display::Block);
    }
}
