use super::token::{CSSToken, HashType};

/// [§ 4.3 Tokenizer Algorithms](https://www.w3.org/TR/css-syntax-3/#tokenizer-algorithms)
pub struct CSSTokenizer {
    input: Vec<char>,
    position: usize,
    tokens: Vec<CSSToken>,
}

/// "A newline, U+0009 CHARACTER TABULATION, or U+0020 SPACE."
const fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0C')
}

/// "ident-start code point: A letter, a non-ASCII code point, or U+005F LOW LINE (_)."
const fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

/// "ident code point: An ident-start code point, a digit, or U+002D HYPHEN-MINUS (-)."
const fn is_ident_char(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit() || c == '-'
}

impl CSSTokenizer {
    /// Create a new CSS tokenizer with the given input.
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into().chars().collect(),
            position: 0,
            tokens: Vec::new(),
        }
    }

    /// Tokenize a string in one call.
    #[must_use]
    pub fn tokenize(input: &str) -> Vec<CSSToken> {
        let mut tokenizer = Self::new(input);
        tokenizer.run();
        tokenizer.into_tokens()
    }

    /// Consume tokens until EOF. The EOF token is kept as the last element.
    pub fn run(&mut self) {
        loop {
            let token = self.consume_token();
            let done = token.is_eof();
            self.tokens.push(token);
            if done {
                break;
            }
        }
    }

    /// Return the collected tokens.
    #[must_use]
    pub fn into_tokens(self) -> Vec<CSSToken> {
        self.tokens
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn peek(&self) -> Option<char> {
        self.peek_at(0)
    }

    fn consume(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.position += 1;
        }
        c
    }

    const fn reconsume(&mut self) {
        self.position = self.position.saturating_sub(1);
    }

    /// [§ 4.3.1 Consume a token](https://www.w3.org/TR/css-syntax-3/#consume-token)
    fn consume_token(&mut self) -> CSSToken {
        self.consume_comments();
        let Some(c) = self.consume() else {
            return CSSToken::EOF;
        };
        match c {
            c if is_whitespace(c) => {
                while self.peek().is_some_and(is_whitespace) {
                    self.position += 1;
                }
                CSSToken::Whitespace
            }
            '"' | '\'' => self.consume_string_token(c),
            '#' => {
                if self.peek().is_some_and(is_ident_char) || self.valid_escape_at(0) {
                    let hash_type = if self.would_start_ident_sequence(0) {
                        HashType::Id
                    } else {
                        HashType::Unrestricted
                    };
                    let value = self.consume_ident_sequence();
                    CSSToken::Hash { value, hash_type }
                } else {
                    CSSToken::Delim('#')
                }
            }
            '(' => CSSToken::LeftParen,
            ')' => CSSToken::RightParen,
            '[' => CSSToken::LeftBracket,
            ']' => CSSToken::RightBracket,
            '{' => CSSToken::LeftBrace,
            '}' => CSSToken::RightBrace,
            ',' => CSSToken::Comma,
            ':' => CSSToken::Colon,
            ';' => CSSToken::Semicolon,
            '+' | '.' => {
                self.reconsume();
                if self.would_start_number() {
                    self.consume_numeric_token()
                } else {
                    self.position += 1;
                    CSSToken::Delim(c)
                }
            }
            '-' => {
                self.reconsume();
                if self.would_start_number() {
                    self.consume_numeric_token()
                } else if self.peek_at(1) == Some('-') && self.peek_at(2) == Some('>') {
                    self.position += 3;
                    CSSToken::CDC
                } else if self.would_start_ident_sequence(0) {
                    self.consume_ident_like_token()
                } else {
                    self.position += 1;
                    CSSToken::Delim('-')
                }
            }
            '<' => {
                if self.peek() == Some('!') && self.peek_at(1) == Some('-') && self.peek_at(2) == Some('-') {
                    self.position += 3;
                    CSSToken::CDO
                } else {
                    CSSToken::Delim('<')
                }
            }
            '@' => {
                if self.would_start_ident_sequence(0) {
                    CSSToken::AtKeyword(self.consume_ident_sequence())
                } else {
                    CSSToken::Delim('@')
                }
            }
            '\\' => {
                self.reconsume();
                if self.valid_escape_at(0) {
                    self.consume_ident_like_token()
                } else {
                    // "This is a parse error. Return a <delim-token>."
                    self.position += 1;
                    CSSToken::Delim('\\')
                }
            }
            c if c.is_ascii_digit() => {
                self.reconsume();
                self.consume_numeric_token()
            }
            c if is_ident_start(c) => {
                self.reconsume();
                self.consume_ident_like_token()
            }
            c => CSSToken::Delim(c),
        }
    }

    /// [§ 4.3.2 Consume comments](https://www.w3.org/TR/css-syntax-3/#consume-comment)
    fn consume_comments(&mut self) {
        while self.peek() == Some('/') && self.peek_at(1) == Some('*') {
            self.position += 2;
            loop {
                match self.consume() {
                    None => return,
                    Some('*') if self.peek() == Some('/') => {
                        self.position += 1;
                        break;
                    }
                    Some(_) => {}
                }
            }
        }
    }

    /// [§ 4.3.5 Consume a string token](https://www.w3.org/TR/css-syntax-3/#consume-string-token)
    fn consume_string_token(&mut self, ending: char) -> CSSToken {
        let mut value = String::new();
        loop {
            match self.consume() {
                Some(c) if c == ending => return CSSToken::String(value),
                // "EOF: This is a parse error. Return the <string-token>."
                None => return CSSToken::String(value),
                Some('\n') => {
                    self.reconsume();
                    return CSSToken::BadString;
                }
                Some('\\') => match self.peek() {
                    None => {}
                    Some('\n') => self.position += 1,
                    Some(_) => value.push(self.consume_escaped_code_point()),
                },
                Some(c) => value.push(c),
            }
        }
    }

    /// [§ 4.3.3 Consume a numeric token](https://www.w3.org/TR/css-syntax-3/#consume-numeric-token)
    fn consume_numeric_token(&mut self) -> CSSToken {
        let (value, is_integer) = self.consume_number();
        if self.would_start_ident_sequence(0) {
            let unit = self.consume_ident_sequence();
            CSSToken::Dimension { value, unit }
        } else if self.peek() == Some('%') {
            self.position += 1;
            CSSToken::Percentage(value)
        } else {
            CSSToken::Number { value, is_integer }
        }
    }

    /// [§ 4.3.12 Consume a number](https://www.w3.org/TR/css-syntax-3/#consume-number)
    fn consume_number(&mut self) -> (f64, bool) {
        let mut repr = String::new();
        let mut is_integer = true;
        if let Some(sign @ ('+' | '-')) = self.peek() {
            repr.push(sign);
            self.position += 1;
        }
        self.consume_digits(&mut repr);
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            repr.push('.');
            self.position += 1;
            self.consume_digits(&mut repr);
            is_integer = false;
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let signed = matches!(self.peek_at(1), Some('+' | '-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..digit_at {
                    if let Some(c) = self.consume() {
                        repr.push(c);
                    }
                }
                self.consume_digits(&mut repr);
                is_integer = false;
            }
        }
        let value = repr.parse::<f64>().unwrap_or(0.0);
        // Huge exponents would overflow to infinity; clamp to keep layout finite.
        (value.clamp(-1.0e12, 1.0e12), is_integer)
    }

    fn consume_digits(&mut self, repr: &mut String) {
        while let Some(c) = self.peek().filter(char::is_ascii_digit) {
            repr.push(c);
            self.position += 1;
        }
    }

    /// [§ 4.3.4 Consume an ident-like token](https://www.w3.org/TR/css-syntax-3/#consume-ident-like-token)
    fn consume_ident_like_token(&mut self) -> CSSToken {
        let name = self.consume_ident_sequence();
        if name.eq_ignore_ascii_case("url") && self.peek() == Some('(') {
            self.position += 1;
            while self.peek().is_some_and(is_whitespace) && self.peek_at(1).is_some_and(is_whitespace) {
                self.position += 1;
            }
            let next = if self.peek().is_some_and(is_whitespace) {
                self.peek_at(1)
            } else {
                self.peek()
            };
            if matches!(next, Some('"' | '\'')) {
                return CSSToken::Function(name);
            }
            return self.consume_url_token();
        }
        if self.peek() == Some('(') {
            self.position += 1;
            return CSSToken::Function(name);
        }
        CSSToken::Ident(name)
    }

    /// [§ 4.3.6 Consume a url token](https://www.w3.org/TR/css-syntax-3/#consume-url-token)
    fn consume_url_token(&mut self) -> CSSToken {
        let mut value = String::new();
        while self.peek().is_some_and(is_whitespace) {
            self.position += 1;
        }
        loop {
            match self.consume() {
                Some(')') | None => return CSSToken::Url(value),
                Some(c) if is_whitespace(c) => {
                    while self.peek().is_some_and(is_whitespace) {
                        self.position += 1;
                    }
                    if matches!(self.peek(), Some(')') | None) {
                        self.position += usize::from(self.peek().is_some());
                        return CSSToken::Url(value);
                    }
                    self.consume_bad_url_remnants();
                    return CSSToken::BadUrl;
                }
                Some('"' | '\'' | '(') => {
                    self.consume_bad_url_remnants();
                    return CSSToken::BadUrl;
                }
                Some('\\') => {
                    if self.peek().is_some_and(|c| c != '\n') {
                        value.push(self.consume_escaped_code_point());
                    } else {
                        self.consume_bad_url_remnants();
                        return CSSToken::BadUrl;
                    }
                }
                Some(c) => value.push(c),
            }
        }
    }

    /// [§ 4.3.14 Consume the remnants of a bad url](https://www.w3.org/TR/css-syntax-3/#consume-remnants-of-bad-url)
    fn consume_bad_url_remnants(&mut self) {
        loop {
            match self.consume() {
                Some(')') | None => return,
                Some('\\') if self.peek().is_some_and(|c| c != '\n') => {
                    let _ = self.consume_escaped_code_point();
                }
                Some(_) => {}
            }
        }
    }

    /// [§ 4.3.7 Consume an escaped code point](https://www.w3.org/TR/css-syntax-3/#consume-escaped-code-point)
    ///
    /// Called with the backslash already consumed.
    fn consume_escaped_code_point(&mut self) -> char {
        let Some(c) = self.consume() else {
            return '\u{FFFD}';
        };
        if !c.is_ascii_hexdigit() {
            return c;
        }
        let mut hex = String::from(c);
        while hex.len() < 6 {
            match self.peek() {
                Some(h) if h.is_ascii_hexdigit() => {
                    hex.push(h);
                    self.position += 1;
                }
                _ => break,
            }
        }
        if self.peek().is_some_and(is_whitespace) {
            self.position += 1;
        }
        let code = u32::from_str_radix(&hex, 16).unwrap_or(0xFFFD);
        match char::from_u32(code) {
            Some(ch) if code != 0 => ch,
            _ => '\u{FFFD}',
        }
    }

    /// [§ 4.3.8](https://www.w3.org/TR/css-syntax-3/#starts-with-a-valid-escape)
    /// "Check if two code points are a valid escape", starting at `offset`.
    fn valid_escape_at(&self, offset: usize) -> bool {
        self.peek_at(offset) == Some('\\') && self.peek_at(offset + 1).is_some_and(|c| c != '\n')
    }

    /// [§ 4.3.9](https://www.w3.org/TR/css-syntax-3/#would-start-an-identifier)
    fn would_start_ident_sequence(&self, offset: usize) -> bool {
        match self.peek_at(offset) {
            Some('-') => {
                self.peek_at(offset + 1)
                    .is_some_and(|c| is_ident_start(c) || c == '-')
                    || self.valid_escape_at(offset + 1)
            }
            Some('\\') => self.valid_escape_at(offset),
            Some(c) => is_ident_start(c),
            None => false,
        }
    }

    /// [§ 4.3.10](https://www.w3.org/TR/css-syntax-3/#starts-with-a-number)
    fn would_start_number(&self) -> bool {
        let digit = |o: usize| self.peek_at(o).is_some_and(|c| c.is_ascii_digit());
        match self.peek() {
            Some('+' | '-') => digit(1) || (self.peek_at(1) == Some('.') && digit(2)),
            Some('.') => digit(1),
            Some(c) => c.is_ascii_digit(),
            None => false,
        }
    }

    /// [§ 4.3.11 Consume an ident sequence](https://www.w3.org/TR/css-syntax-3/#consume-name)
    fn consume_ident_sequence(&mut self) -> String {
        let mut result = String::new();
        loop {
            match self.peek() {
                Some(c) if is_ident_char(c) => {
                    result.push(c);
                    self.position += 1;
                }
                Some('\\') if self.valid_escape_at(0) => {
                    self.position += 1;
                    result.push(self.consume_escaped_code_point());
                }
                _ => return result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_dimensions_and_percentages() {
        let tokens = CSSTokenizer::tokenize("10px 50% -1.5em 0 +.5");
        let significant: Vec<_> = tokens.into_iter().filter(|t| !t.is_whitespace()).collect();
        assert_eq!(
            significant,
            vec![
                CSSToken::Dimension {
                    value: 10.0,
                    unit: "px".into()
                },
                CSSToken::Percentage(50.0),
                CSSToken::Dimension {
                    value: -1.5,
                    unit: "em".into()
                },
                CSSToken::Number {
                    value: 0.0,
                    is_integer: true
                },
                CSSToken::Number {
                    value: 0.5,
                    is_integer: false
                },
                CSSToken::EOF,
            ]
        );
    }

    #[test]
    fn comments_are_skipped_and_unterminated_comment_ends_input() {
        let tokens = CSSTokenizer::tokenize("a/* x */b /* never closed");
        assert_eq!(tokens[0], CSSToken::Ident("a".into()));
        assert_eq!(tokens[1], CSSToken::Ident("b".into()));
        assert_eq!(tokens.last(), Some(&CSSToken::EOF));
    }

    #[test]
    fn url_and_functions() {
        let tokens = CSSTokenizer::tokenize("url(a.png) url(\"b.png\") rgb(");
        assert_eq!(tokens[0], CSSToken::Url("a.png".into()));
        assert_eq!(tokens[2], CSSToken::Function("url".into()));
        assert_eq!(tokens[3], CSSToken::String("b.png".into()));
    }

    #[test]
    fn escapes_in_identifiers() {
        let tokens = CSSTokenizer::tokenize(r".a\:b #\31 23");
        assert_eq!(tokens[1], CSSToken::Ident("a:b".into()));
        assert_eq!(
            tokens[3],
            CSSToken::Hash {
                value: "123".into(),
                hash_type: HashType::Id
            }
        );
    }
}
