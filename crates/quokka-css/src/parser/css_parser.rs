use crate::tokenizer::{CSSToken, CSSTokenizer};

/// [§ 5.4.4 Consume a declaration](https://www.w3.org/TR/css-syntax-3/#consume-declaration)
///
/// A property name with its raw component values. Typed parsing happens in
/// the style module; a declaration that fails there is dropped on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    /// Property name, lowercased.
    pub name: String,
    /// Value with leading/trailing whitespace and `!important` removed.
    pub value: Vec<ComponentValue>,
    /// "If the last two non-whitespace tokens are a `<delim-token>` with the
    /// value "!" followed by an `<ident-token>` with a value that is an ASCII
    /// case-insensitive match for "important", ... set decl's important flag".
    pub important: bool,
}

/// [§ 5.4.7 Consume a component value](https://www.w3.org/TR/css-syntax-3/#consume-component-value)
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentValue {
    /// A preserved token.
    Token(CSSToken),
    /// A function with its arguments.
    Function {
        /// Function name as written.
        name: String,
        /// Arguments (commas kept as tokens).
        value: Vec<ComponentValue>,
    },
    /// A `{}`, `[]` or `()` block.
    Block {
        /// Opening character.
        token: char,
        /// Block contents.
        value: Vec<ComponentValue>,
    },
}

impl ComponentValue {
    /// The token, if this is a plain token.
    #[must_use]
    pub const fn as_token(&self) -> Option<&CSSToken> {
        match self {
            Self::Token(t) => Some(t),
            _ => None,
        }
    }

    /// True for whitespace tokens.
    #[must_use]
    pub const fn is_whitespace(&self) -> bool {
        matches!(self, Self::Token(CSSToken::Whitespace))
    }

    /// Identifier text, if this is an ident token.
    #[must_use]
    pub fn as_ident(&self) -> Option<&str> {
        self.as_token().and_then(CSSToken::as_ident)
    }
}

/// A style rule: selector prelude plus declarations.
///
/// The prelude is kept as tokens; `selector::parse_selector_list` turns it
/// into selectors, and the whole rule is dropped if that fails.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleRule {
    /// Tokens before the `{`.
    pub prelude: Vec<CSSToken>,
    /// Declarations inside the block, in source order.
    pub declarations: Vec<Declaration>,
}

impl StyleRule {
    /// Prelude serialized back to text (for diagnostics).
    #[must_use]
    pub fn selector_text(&self) -> String {
        self.prelude.iter().map(ToString::to_string).collect::<String>().trim().to_string()
    }
}

/// [CSS Conditional 3 § 6](https://www.w3.org/TR/css3-conditional/#at-media)
///
/// An `@media` block. The query is kept as text; only `all` and `screen`
/// media apply to rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRule {
    /// Query text, lowercased with collapsed whitespace.
    pub query: String,
    /// Nested rules.
    pub rules: Vec<Rule>,
}

impl MediaRule {
    /// Whether the query matches a screen renderer. Empty queries match.
    #[must_use]
    pub fn applies_to_screen(&self) -> bool {
        if self.query.is_empty() {
            return true;
        }
        self.query.split(',').any(|q| {
            let words: Vec<_> = q.split_whitespace().collect();
            match words.as_slice() {
                ["not", ..] => false,
                ["only", medium, ..] | [medium, ..] => matches!(*medium, "all" | "screen"),
                [] => false,
            }
        })
    }
}

/// A top-level or nested rule.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// A qualified (style) rule.
    Style(StyleRule),
    /// An `@media` block.
    Media(MediaRule),
    /// Any other at-rule; kept by name and otherwise ignored.
    At(String),
}

/// [§ 5.3.3 Parse a stylesheet](https://www.w3.org/TR/css-syntax-3/#parse-stylesheet)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Stylesheet {
    /// Rules in source order.
    pub rules: Vec<Rule>,
}

/// Deeper `@media` nesting is skipped as an opaque block.
const MAX_MEDIA_NESTING: usize = 16;

/// Blocks nested deeper than this keep their brackets as plain tokens, so
/// component values never form chains long enough to overflow on drop.
const MAX_BLOCK_NESTING: usize = 128;

/// CSS parser following the CSS Syntax Module Level 3 consume algorithms.
pub struct CSSParser {
    tokens: Vec<CSSToken>,
    position: usize,
    media_depth: usize,
}

impl CSSParser {
    /// Create a new parser over a token list.
    #[must_use]
    pub const fn new(tokens: Vec<CSSToken>) -> Self {
        Self {
            tokens,
            position: 0,
            media_depth: 0,
        }
    }

    /// [§ 5.3.3 Parse a stylesheet](https://www.w3.org/TR/css-syntax-3/#parse-stylesheet)
    pub fn parse_stylesheet(&mut self) -> Stylesheet {
        Stylesheet {
            rules: self.consume_list_of_rules(true),
        }
    }

    /// [§ 5.3.8 Parse a list of declarations](https://www.w3.org/TR/css-syntax-3/#parse-list-of-declarations)
    ///
    /// Used for `style` attributes.
    pub fn parse_declaration_list(&mut self) -> Vec<Declaration> {
        self.consume_list_of_declarations()
    }

    fn peek(&self) -> Option<&CSSToken> {
        self.tokens.get(self.position)
    }

    fn consume(&mut self) -> Option<CSSToken> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    /// [§ 5.4.1 Consume a list of rules](https://www.w3.org/TR/css-syntax-3/#consume-list-of-rules)
    ///
    /// Nested lists (inside `@media`) end at the closing brace, which is
    /// left for the caller.
    fn consume_list_of_rules(&mut self, top_level: bool) -> Vec<Rule> {
        let mut rules = Vec::new();
        loop {
            match self.peek() {
                None | Some(CSSToken::EOF) => return rules,
                Some(CSSToken::RightBrace) if !top_level => return rules,
                Some(CSSToken::Whitespace) => self.position += 1,
                // "If the top-level flag is set, do nothing."
                Some(CSSToken::CDO | CSSToken::CDC) if top_level => self.position += 1,
                Some(CSSToken::AtKeyword(_)) => {
                    if let Some(rule) = self.consume_at_rule() {
                        rules.push(rule);
                    }
                }
                Some(_) => {
                    if let Some(rule) = self.consume_qualified_rule() {
                        rules.push(Rule::Style(rule));
                    }
                }
            }
        }
    }

    /// [§ 5.4.2 Consume an at-rule](https://www.w3.org/TR/css-syntax-3/#consume-at-rule)
    fn consume_at_rule(&mut self) -> Option<Rule> {
        let Some(CSSToken::AtKeyword(name)) = self.consume() else {
            return None;
        };
        let name = name.to_ascii_lowercase();
        let mut prelude = String::new();
        loop {
            match self.peek() {
                None | Some(CSSToken::EOF) => return Some(Rule::At(name)),
                Some(CSSToken::RightBrace) if self.media_depth > 0 => return Some(Rule::At(name)),
                Some(CSSToken::Semicolon) => {
                    self.position += 1;
                    return Some(Rule::At(name));
                }
                Some(CSSToken::LeftBrace) => {
                    if name == "media" && self.media_depth < MAX_MEDIA_NESTING {
                        self.position += 1;
                        self.media_depth += 1;
                        let rules = self.consume_list_of_rules(false);
                        self.media_depth -= 1;
                        if self.peek() == Some(&CSSToken::RightBrace) {
                            self.position += 1;
                        }
                        let query = prelude
                            .to_ascii_lowercase()
                            .split_whitespace()
                            .collect::<Vec<_>>()
                            .join(" ");
                        return Some(Rule::Media(MediaRule { query, rules }));
                    }
                    quokka_common::warning::warn_once("CSS", &format!("ignoring @{name} rule"));
                    let _ = self.consume_component_value();
                    return Some(Rule::At(name));
                }
                Some(_) => {
                    if let Some(value) = self.consume_component_value() {
                        prelude.push_str(&component_to_string(&value));
                    }
                }
            }
        }
    }

    /// [§ 5.4.3 Consume a qualified rule](https://www.w3.org/TR/css-syntax-3/#consume-qualified-rule)
    fn consume_qualified_rule(&mut self) -> Option<StyleRule> {
        let mut prelude = Vec::new();
        loop {
            match self.peek() {
                // "This is a parse error. Return nothing."
                None | Some(CSSToken::EOF) => return None,
                Some(CSSToken::LeftBrace) => {
                    self.position += 1;
                    let declarations = self.consume_list_of_declarations();
                    if self.peek() == Some(&CSSToken::RightBrace) {
                        self.position += 1;
                    }
                    while prelude.last().is_some_and(CSSToken::is_whitespace) {
                        let _ = prelude.pop();
                    }
                    return Some(StyleRule {
                        prelude,
                        declarations,
                    });
                }
                Some(CSSToken::LeftBracket | CSSToken::LeftParen | CSSToken::Function(_)) => {
                    // Blocks inside a prelude (attribute selectors, :lang())
                    // are flattened back to tokens.
                    if let Some(value) = self.consume_component_value() {
                        flatten_component(&value, &mut prelude);
                    }
                }
                Some(_) => {
                    if let Some(token) = self.consume() {
                        prelude.push(token);
                    }
                }
            }
        }
    }

    /// [§ 5.4.5 Consume a list of declarations](https://www.w3.org/TR/css-syntax-3/#consume-list-of-declarations)
    fn consume_list_of_declarations(&mut self) -> Vec<Declaration> {
        let mut declarations = Vec::new();
        loop {
            match self.peek() {
                None | Some(CSSToken::EOF | CSSToken::RightBrace) => return declarations,
                Some(CSSToken::Whitespace | CSSToken::Semicolon) => self.position += 1,
                Some(CSSToken::AtKeyword(_)) => {
                    let _ = self.consume_at_rule();
                }
                Some(CSSToken::Ident(_)) => {
                    if let Some(decl) = self.consume_declaration() {
                        declarations.push(decl);
                    }
                }
                // "This is a parse error. Reconsume the current input token. As
                // long as the next input token is anything other than a
                // <semicolon-token> or <EOF-token>, consume a component value
                // and throw away the returned value."
                Some(_) => self.skip_to_declaration_end(),
            }
        }
    }

    fn skip_to_declaration_end(&mut self) {
        while !matches!(
            self.peek(),
            None | Some(CSSToken::Semicolon | CSSToken::RightBrace | CSSToken::EOF)
        ) {
            let _ = self.consume_component_value();
        }
    }

    /// [§ 5.4.4 Consume a declaration](https://www.w3.org/TR/css-syntax-3/#consume-declaration)
    fn consume_declaration(&mut self) -> Option<Declaration> {
        let Some(CSSToken::Ident(name)) = self.consume() else {
            return None;
        };
        while self.peek().is_some_and(CSSToken::is_whitespace) {
            self.position += 1;
        }
        // "If the next input token is anything other than a <colon-token>, this
        // is a parse error. Return nothing."
        if self.peek() != Some(&CSSToken::Colon) {
            self.skip_to_declaration_end();
            return None;
        }
        self.position += 1;

        let mut value = Vec::new();
        while !matches!(
            self.peek(),
            None | Some(CSSToken::EOF | CSSToken::Semicolon | CSSToken::RightBrace)
        ) {
            if let Some(v) = self.consume_component_value() {
                value.push(v);
            }
        }
        let important = strip_important(&mut value);
        trim_whitespace(&mut value);
        Some(Declaration {
            name: name.to_ascii_lowercase(),
            value,
            important,
        })
    }

    /// [§ 5.4.7 Consume a component value](https://www.w3.org/TR/css-syntax-3/#consume-component-value)
    ///
    /// Nested blocks and functions are assembled on an explicit stack so
    /// that pathological nesting cannot exhaust the call stack.
    fn consume_component_value(&mut self) -> Option<ComponentValue> {
        struct Open {
            name: Option<String>,
            token: char,
            closing: CSSToken,
            value: Vec<ComponentValue>,
        }

        let mut stack: Vec<Open> = Vec::new();
        loop {
            let token = self.consume()?;
            let finished = match token {
                CSSToken::LeftBrace
                | CSSToken::LeftBracket
                | CSSToken::LeftParen
                | CSSToken::Function(_)
                    if stack.len() >= MAX_BLOCK_NESTING =>
                {
                    Some(ComponentValue::Token(token))
                }
                CSSToken::LeftBrace | CSSToken::LeftBracket | CSSToken::LeftParen => {
                    let (ch, closing) = match token {
                        CSSToken::LeftBrace => ('{', CSSToken::RightBrace),
                        CSSToken::LeftBracket => ('[', CSSToken::RightBracket),
                        _ => ('(', CSSToken::RightParen),
                    };
                    stack.push(Open {
                        name: None,
                        token: ch,
                        closing,
                        value: Vec::new(),
                    });
                    None
                }
                CSSToken::Function(name) => {
                    stack.push(Open {
                        name: Some(name),
                        token: '(',
                        closing: CSSToken::RightParen,
                        value: Vec::new(),
                    });
                    None
                }
                CSSToken::EOF => {
                    // "This is a parse error. Return the block." Unwind every
                    // open container.
                    self.position -= 1;
                    let mut done = None;
                    while let Some(open) = stack.pop() {
                        let value = close(open.name, open.token, open.value, done.take());
                        done = Some(value);
                    }
                    return done;
                }
                other => {
                    if stack.last().is_some_and(|open| open.closing == other) {
                        stack.pop().map(|open| close(open.name, open.token, open.value, None))
                    } else {
                        Some(ComponentValue::Token(other))
                    }
                }
            };

            if let Some(value) = finished {
                match stack.last_mut() {
                    Some(parent) => parent.value.push(value),
                    None => return Some(value),
                }
            }
        }

        fn close(
            name: Option<String>,
            token: char,
            mut value: Vec<ComponentValue>,
            inner: Option<ComponentValue>,
        ) -> ComponentValue {
            value.extend(inner);
            match name {
                Some(name) => ComponentValue::Function { name, value },
                None => ComponentValue::Block { token, value },
            }
        }
    }
}

/// "If the last two non-whitespace tokens ... are `!` and `important`,
/// remove them from decl's value and set decl's important flag to true."
fn strip_important(value: &mut Vec<ComponentValue>) -> bool {
    trim_whitespace(value);
    let len = value.len();
    if len < 2 {
        return false;
    }
    let is_important = value[len - 1]
        .as_ident()
        .is_some_and(|i| i.eq_ignore_ascii_case("important"));
    if !is_important {
        return false;
    }
    let mut bang = len - 2;
    while bang > 0 && value[bang].is_whitespace() {
        bang -= 1;
    }
    if value[bang].as_token() == Some(&CSSToken::Delim('!')) {
        value.truncate(bang);
        true
    } else {
        false
    }
}

fn trim_whitespace(value: &mut Vec<ComponentValue>) {
    while value.last().is_some_and(ComponentValue::is_whitespace) {
        let _ = value.pop();
    }
    let leading = value.iter().take_while(|v| v.is_whitespace()).count();
    let _ = value.drain(..leading);
}

/// Flatten a component value back to tokens, iteratively.
fn flatten_component(value: &ComponentValue, out: &mut Vec<CSSToken>) {
    enum Item<'a> {
        Value(&'a ComponentValue),
        Token(CSSToken),
    }
    let mut stack = vec![Item::Value(value)];
    while let Some(item) = stack.pop() {
        match item {
            Item::Token(t) => out.push(t),
            Item::Value(ComponentValue::Token(t)) => out.push(t.clone()),
            Item::Value(ComponentValue::Function { name, value }) => {
                out.push(CSSToken::Function(name.clone()));
                stack.push(Item::Token(CSSToken::RightParen));
                stack.extend(value.iter().rev().map(Item::Value));
            }
            Item::Value(ComponentValue::Block { token, value }) => {
                let (open, closing) = match token {
                    '{' => (CSSToken::LeftBrace, CSSToken::RightBrace),
                    '[' => (CSSToken::LeftBracket, CSSToken::RightBracket),
                    _ => (CSSToken::LeftParen, CSSToken::RightParen),
                };
                out.push(open);
                stack.push(Item::Token(closing));
                stack.extend(value.iter().rev().map(Item::Value));
            }
        }
    }
}

/// Serialize a component value back to CSS text.
#[must_use]
pub fn component_to_string(value: &ComponentValue) -> String {
    let mut tokens = Vec::new();
    flatten_component(value, &mut tokens);
    tokens.iter().map(ToString::to_string).collect()
}

/// Tokenize and parse a stylesheet in one call.
#[must_use]
pub fn parse_stylesheet(css: &str) -> Stylesheet {
    CSSParser::new(CSSTokenizer::tokenize(css)).parse_stylesheet()
}

/// Tokenize and parse the contents of a `style` attribute.
#[must_use]
pub fn parse_inline_style(css: &str) -> Vec<Declaration> {
    CSSParser::new(CSSTokenizer::tokenize(css)).parse_declaration_list()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_style_rule(sheet: &Stylesheet) -> &StyleRule {
        sheet
            .rules
            .iter()
            .find_map(|r| match r {
                Rule::Style(s) => Some(s),
                _ => None,
            })
            .expect("a style rule")
    }

    #[test]
    fn parses_rule_with_important() {
        let sheet = parse_stylesheet("p.x > a { color: red ! important; margin: 0 }");
        let rule = first_style_rule(&sheet);
        assert_eq!(rule.selector_text(), "p.x > a");
        assert_eq!(rule.declarations.len(), 2);
        assert!(rule.declarations[0].important);
        assert_eq!(rule.declarations[0].value.len(), 1);
        assert!(!rule.declarations[1].important);
    }

    #[test]
    fn malformed_declaration_does_not_eat_siblings() {
        let decls = parse_inline_style("color red; width: 10px; : x; height: 5px");
        let names: Vec<_> = decls.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["width", "height"]);
    }

    #[test]
    fn media_rules_nest_and_filter() {
        let sheet = parse_stylesheet("@media print { p { color: red } } @media screen { a { color: blue } } @import url(x.css);");
        let media: Vec<_> = sheet
            .rules
            .iter()
            .filter_map(|r| match r {
                Rule::Media(m) => Some(m),
                _ => None,
            })
            .collect();
        assert_eq!(media.len(), 2);
        assert!(!media[0].applies_to_screen());
        assert!(media[1].applies_to_screen());
        assert_eq!(sheet.rules.last(), Some(&Rule::At("import".into())));
    }

    #[test]
    fn deeply_nested_parens_are_capped() {
        let css = format!("p {{ width: {} }}", "(".repeat(200_000));
        let sheet = parse_stylesheet(&css);
        assert_eq!(sheet.rules.len(), 1);
    }

    #[test]
    fn attribute_selector_prelude_is_flattened() {
        let sheet = parse_stylesheet("a[href^=\"http\"] { color: red }");
        let rule = first_style_rule(&sheet);
        assert!(rule.prelude.contains(&CSSToken::LeftBracket));
        assert!(rule.prelude.contains(&CSSToken::RightBracket));
    }
}
