use std::collections::HashSet;
use std::fmt;

/// An attribute on a start tag token.
///
/// [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization):
/// "a list of attributes, each of which has a name and a value"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// "each of which has a name"
    pub name: String,
    /// "and a value"
    pub value: String,
}

/// [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
///
/// "The output of the tokenization step is a series of zero or more of the
/// following tokens: DOCTYPE, start tag, end tag, comment, character,
/// end-of-file."
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// DOCTYPE token. Only the name is kept.
    Doctype {
        /// "a name"
        name: Option<String>,
    },
    /// Start tag token.
    StartTag {
        /// "a tag name", lowercased
        name: String,
        /// "a self-closing flag"
        self_closing: bool,
        /// "a list of attributes"
        attributes: Vec<Attribute>,
    },
    /// End tag token. Attributes on end tags are dropped.
    EndTag {
        /// "a tag name", lowercased
        name: String,
    },
    /// "Comment and character tokens have data."
    Comment {
        /// "data"
        data: String,
    },
    /// A single character.
    Character {
        /// "data"
        data: char,
    },
    /// End-of-file token signals the end of input.
    EndOfFile,
}

impl Token {
    /// "When a start or end tag token is created, its self-closing flag must be
    /// unset ... and its attributes list must be empty."
    #[must_use]
    pub const fn new_start_tag() -> Self {
        Self::StartTag {
            name: String::new(),
            self_closing: false,
            attributes: Vec::new(),
        }
    }

    /// Create an empty end tag token.
    #[must_use]
    pub const fn new_end_tag() -> Self {
        Self::EndTag {
            name: String::new(),
        }
    }

    /// Append a lowercased character to a tag name.
    pub fn append_to_tag_name(&mut self, c: char) {
        if let Self::StartTag { name, .. } | Self::EndTag { name } = self {
            name.push(c.to_ascii_lowercase());
        }
    }

    /// Set the self-closing flag of a start tag.
    pub const fn set_self_closing(&mut self) {
        if let Self::StartTag { self_closing, .. } = self {
            *self_closing = true;
        }
    }

    /// "Start a new attribute in the current tag token."
    pub fn start_new_attribute(&mut self) {
        if let Self::StartTag { attributes, .. } = self {
            attributes.push(Attribute {
                name: String::new(),
                value: String::new(),
            });
        }
    }

    /// Append a lowercased character to the current attribute's name.
    pub fn append_to_current_attribute_name(&mut self, c: char) {
        if let Self::StartTag { attributes, .. } = self
            && let Some(attr) = attributes.last_mut()
        {
            attr.name.push(c.to_ascii_lowercase());
        }
    }

    /// Append text to the current attribute's value.
    pub fn append_to_current_attribute_value(&mut self, s: &str) {
        if let Self::StartTag { attributes, .. } = self
            && let Some(attr) = attributes.last_mut()
        {
            attr.value.push_str(s);
        }
    }

    /// [§ 13.2.5.33](https://html.spec.whatwg.org/multipage/parsing.html#attribute-name-state)
    ///
    /// "if there is already an attribute on the token with the exact same name,
    /// then this is a duplicate-attribute parse error and the new attribute must
    /// be removed from the token."
    ///
    /// Returns the number of attributes removed.
    pub fn drop_duplicate_attributes(&mut self) -> usize {
        let Self::StartTag { attributes, .. } = self else {
            return 0;
        };
        let before = attributes.len();
        let mut seen = HashSet::new();
        attributes.retain(|a| seen.insert(a.name.clone()));
        before - attributes.len()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Doctype { name } => write!(f, "<!DOCTYPE {}>", name.as_deref().unwrap_or("")),
            Self::StartTag {
                name,
                self_closing,
                attributes,
            } => {
                write!(f, "<{name}")?;
                for attr in attributes {
                    write!(f, " {}=\"{}\"", attr.name, attr.value)?;
                }
                if *self_closing {
                    write!(f, " /")?;
                }
                write!(f, ">")
            }
            Self::EndTag { name } => write!(f, "</{name}>"),
            Self::Comment { data } => write!(f, "<!--{data}-->"),
            Self::Character { data } => write!(f, "{data}"),
            Self::EndOfFile => write!(f, "EOF"),
        }
    }
}
