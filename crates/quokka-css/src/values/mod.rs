//! CSS value parsing: lengths, colors and the error type shared by every
//! property parser.
//!
//! - [CSS 2.1 § 4.3 Values](https://www.w3.org/TR/CSS2/syndata.html#values)
//! - [CSS Color Level 4](https://www.w3.org/TR/css-color-4/)

/// `<color>` values.
pub mod color;
/// `<length>` values and unit conversion.
pub mod length;

pub use color::{Color, ColorValue, parse_color};
pub use length::{CssLength, LengthContext, LengthUnit, MAX_PX, parse_length, saturate_px};

use thiserror::Error;

use crate::parser::ComponentValue;

/// Why a value failed to parse. Carried by
/// `PropertyDeclaration::Invalid` so the cascade can skip the declaration
/// and diagnostics can say why.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// An em conversion was requested for a length in another unit.
    #[error("length is not in em units")]
    NotEm,
    /// A non-zero number without a unit where a length is required.
    #[error("unitless non-zero length '{0}'")]
    UnitlessLength(String),
    /// A dimension with a unit this engine does not know.
    #[error("unknown unit '{0}'")]
    UnknownUnit(String),
    /// The value is not valid for the property.
    #[error("invalid value '{value}' for {property}")]
    InvalidValue {
        /// Property name.
        property: String,
        /// Value text as written.
        value: String,
    },
    /// A negative value where only non-negative ones are allowed.
    #[error("negative value not allowed for {0}")]
    Negative(String),
    /// An unparseable color.
    #[error("invalid color '{0}'")]
    InvalidColor(String),
    /// Declaration value is empty.
    #[error("empty value for {0}")]
    Empty(String),
    /// Property is not supported.
    #[error("unsupported property '{0}'")]
    UnknownProperty(String),
}

/// Non-whitespace component values, the shape every property parser wants.
#[must_use]
pub fn significant(values: &[ComponentValue]) -> Vec<&ComponentValue> {
    values.iter().filter(|v| !v.is_whitespace()).collect()
}

/// Serialize component values back to text for error messages.
#[must_use]
pub fn value_text(values: &[ComponentValue]) -> String {
    values
        .iter()
        .map(crate::parser::css_parser::component_to_string)
        .collect::<String>()
        .trim()
        .to_string()
}
