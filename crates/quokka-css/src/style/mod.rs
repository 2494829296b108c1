//! Typed style values, declarations and computed styles.
//!
//! [CSS 2.1 § 6 Assigning property values](https://www.w3.org/TR/CSS2/cascade.html)

/// The computed style struct and declaration application.
pub mod computed;
/// Declaration parsing and shorthand expansion.
pub mod declaration;
/// Keyword enums and value types.
pub mod types;

pub use computed::{ComputedStyle, DEFAULT_FONT_SIZE_PX, computed_font_weight};
pub use declaration::{
    CssWideKeyword, FontSize, FontWeight, PropertyDeclaration, PropertyId, SpecifiedLength,
    SpecifiedLineHeight, parse_declaration,
};
pub use types::{
    BorderStyle, Clear, Content, ContentItem, CounterOp, Display, Edges, Float, FontStyle,
    FontVariant, LengthPercentageAuto, LineHeight, ListStylePosition, ListStyleType, Overflow,
    Position, QuotePair, Side, TextAlign, TextDecoration, TextTransform, Visibility, WhiteSpace,
};
