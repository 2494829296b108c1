//! CSS token types per [§ 4 Tokenization](https://www.w3.org/TR/css-syntax-3/#tokenization).

use std::fmt;

/// [§ 4.2](https://www.w3.org/TR/css-syntax-3/#token-diagrams)
///
/// "A `<hash-token>` with the type flag set to 'id'... or 'unrestricted'."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashType {
    /// The value would start an identifier (usable as an ID selector).
    Id,
    /// Anything else, e.g. `#123`.
    Unrestricted,
}

/// A CSS token. Numeric tokens keep whether the source was an integer so
/// that `z-index`, `counter-*` and unitless-zero checks can tell `1` from `1.0`.
#[derive(Debug, Clone, PartialEq)]
pub enum CSSToken {
    /// `<ident-token>`
    Ident(String),
    /// `<function-token>`: the name without the parenthesis.
    Function(String),
    /// `<at-keyword-token>`: the name without `@`.
    AtKeyword(String),
    /// `<hash-token>`
    Hash {
        /// Value without `#`.
        value: String,
        /// Type flag.
        hash_type: HashType,
    },
    /// `<string-token>`
    String(String),
    /// `<bad-string-token>`
    BadString,
    /// `<url-token>`
    Url(String),
    /// `<bad-url-token>`
    BadUrl,
    /// `<delim-token>`
    Delim(char),
    /// `<number-token>`
    Number {
        /// Numeric value.
        value: f64,
        /// "type flag set to 'integer'"
        is_integer: bool,
    },
    /// `<percentage-token>`
    Percentage(f64),
    /// `<dimension-token>`
    Dimension {
        /// Numeric value.
        value: f64,
        /// Unit as written (compare case-insensitively).
        unit: String,
    },
    /// `<whitespace-token>`
    Whitespace,
    /// `<CDO-token>` (`<!--`)
    CDO,
    /// `<CDC-token>` (`-->`)
    CDC,
    /// `<colon-token>`
    Colon,
    /// `<semicolon-token>`
    Semicolon,
    /// `<comma-token>`
    Comma,
    /// `<[-token>`
    LeftBracket,
    /// `<]-token>`
    RightBracket,
    /// `<(-token>`
    LeftParen,
    /// `<)-token>`
    RightParen,
    /// `<{-token>`
    LeftBrace,
    /// `<}-token>`
    RightBrace,
    /// End of input.
    EOF,
}

impl CSSToken {
    /// Returns true if this is an EOF token.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self, Self::EOF)
    }

    /// Returns true if this is a whitespace token.
    #[must_use]
    pub const fn is_whitespace(&self) -> bool {
        matches!(self, Self::Whitespace)
    }

    /// The identifier value, if this is an ident token.
    #[must_use]
    pub fn as_ident(&self) -> Option<&str> {
        match self {
            Self::Ident(v) => Some(v),
            _ => None,
        }
    }
}

/// Serializes a token back to CSS source text. Used when a selector or an
/// unparsed value needs to be turned back into a string.
impl fmt::Display for CSSToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(v) => write!(f, "{}", escape_ident(v)),
            Self::Function(v) => write!(f, "{}(", escape_ident(v)),
            Self::AtKeyword(v) => write!(f, "@{v}"),
            Self::Hash { value, .. } => write!(f, "#{}", escape_ident(value)),
            Self::String(v) => write!(f, "\"{}\"", v.replace('\\', "\\\\").replace('"', "\\\"")),
            Self::BadString | Self::BadUrl => Ok(()),
            Self::Url(v) => write!(f, "url({v})"),
            Self::Delim(c) => write!(f, "{c}"),
            Self::Number { value, .. } => write!(f, "{value}"),
            Self::Percentage(value) => write!(f, "{value}%"),
            Self::Dimension { value, unit } => write!(f, "{value}{unit}"),
            Self::Whitespace => write!(f, " "),
            Self::CDO => write!(f, "<!--"),
            Self::CDC => write!(f, "-->"),
            Self::Colon => write!(f, ":"),
            Self::Semicolon => write!(f, ";"),
            Self::Comma => write!(f, ","),
            Self::LeftBracket => write!(f, "["),
            Self::RightBracket => write!(f, "]"),
            Self::LeftParen => write!(f, "("),
            Self::RightParen => write!(f, ")"),
            Self::LeftBrace => write!(f, "{{"),
            Self::RightBrace => write!(f, "}}"),
            Self::EOF => Ok(()),
        }
    }
}

/// Escape characters that would not survive re-tokenization as an identifier.
fn escape_ident(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for (i, c) in value.chars().enumerate() {
        let ok = c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii();
        if i == 0 && c.is_ascii_digit() {
            // A leading digit needs a hex escape: `\31 ` for "1".
            out.push_str(&format!("\\{:x} ", u32::from(c)));
        } else if ok {
            out.push(c);
        } else {
            out.push('\\');
            out.push(c);
        }
    }
    out
}
