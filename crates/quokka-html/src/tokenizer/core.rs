use strum_macros::Display;

use super::character_reference::decode_at;
use super::token::Token;

/// [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
///
/// The subset of tokenizer states this engine needs.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum TokenizerState {
    /// [§ 13.2.5.1 Data state](https://html.spec.whatwg.org/multipage/parsing.html#data-state)
    Data,
    /// [§ 13.2.5.3 RAWTEXT state](https://html.spec.whatwg.org/multipage/parsing.html#rawtext-state)
    RawText,
    /// [§ 13.2.5.6 Tag open state](https://html.spec.whatwg.org/multipage/parsing.html#tag-open-state)
    TagOpen,
    /// [§ 13.2.5.7 End tag open state](https://html.spec.whatwg.org/multipage/parsing.html#end-tag-open-state)
    EndTagOpen,
    /// [§ 13.2.5.8 Tag name state](https://html.spec.whatwg.org/multipage/parsing.html#tag-name-state)
    TagName,
    /// [§ 13.2.5.32 Before attribute name state](https://html.spec.whatwg.org/multipage/parsing.html#before-attribute-name-state)
    BeforeAttributeName,
    /// [§ 13.2.5.33 Attribute name state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-name-state)
    AttributeName,
    /// [§ 13.2.5.34 After attribute name state](https://html.spec.whatwg.org/multipage/parsing.html#after-attribute-name-state)
    AfterAttributeName,
    /// [§ 13.2.5.35 Before attribute value state](https://html.spec.whatwg.org/multipage/parsing.html#before-attribute-value-state)
    BeforeAttributeValue,
    /// [§ 13.2.5.36 Attribute value (double-quoted) state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-value-(double-quoted)-state)
    AttributeValueDoubleQuoted,
    /// [§ 13.2.5.37 Attribute value (single-quoted) state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-value-(single-quoted)-state)
    AttributeValueSingleQuoted,
    /// [§ 13.2.5.38 Attribute value (unquoted) state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-value-(unquoted)-state)
    AttributeValueUnquoted,
    /// [§ 13.2.5.39 After attribute value (quoted) state](https://html.spec.whatwg.org/multipage/parsing.html#after-attribute-value-(quoted)-state)
    AfterAttributeValueQuoted,
    /// [§ 13.2.5.40 Self-closing start tag state](https://html.spec.whatwg.org/multipage/parsing.html#self-closing-start-tag-state)
    SelfClosingStartTag,
    /// [§ 13.2.5.41 Bogus comment state](https://html.spec.whatwg.org/multipage/parsing.html#bogus-comment-state)
    BogusComment,
    /// [§ 13.2.5.42 Markup declaration open state](https://html.spec.whatwg.org/multipage/parsing.html#markup-declaration-open-state)
    MarkupDeclarationOpen,
}

/// Elements whose content is tokenized as raw text up to the matching end tag.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title", "xmp", "noscript"];

/// [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
///
/// "Implementations must act as if they used the following state machine to
/// tokenize HTML."
pub struct HTMLTokenizer {
    state: TokenizerState,
    input: Vec<char>,
    current_pos: usize,
    current_input_character: Option<char>,
    current_token: Option<Token>,
    token_stream: Vec<Token>,
    /// "Reconsume in the X state" sets this flag.
    reconsume: bool,
    /// "The last start tag token emitted", used to find the end of RAWTEXT.
    last_start_tag_name: Option<String>,
    /// Characters gathered by the comment and DOCTYPE states.
    temporary_buffer: String,
}

impl HTMLTokenizer {
    /// Create a new tokenizer for the given input.
    ///
    /// "The initial state is the data state."
    #[must_use]
    pub fn new(input: String) -> Self {
        Self {
            state: TokenizerState::Data,
            input: input.chars().collect(),
            current_pos: 0,
            current_input_character: None,
            current_token: None,
            token_stream: Vec::new(),
            reconsume: false,
            last_start_tag_name: None,
            temporary_buffer: String::new(),
        }
    }

    /// Consume the tokenizer and return the token stream.
    /// Call this after `run()` to get the tokens for the parser.
    #[must_use]
    pub fn into_tokens(self) -> Vec<Token> {
        self.token_stream
    }

    fn consume(&mut self) -> Option<char> {
        let c = self.input.get(self.current_pos).copied();
        if c.is_some() {
            self.current_pos += 1;
        }
        c
    }

    const fn switch_to(&mut self, state: TokenizerState) {
        self.state = state;
    }

    const fn reconsume_in(&mut self, state: TokenizerState) {
        self.reconsume = true;
        self.state = state;
    }

    fn emit_character_token(&mut self, c: char) {
        self.token_stream.push(Token::Character { data: c });
    }

    /// Emit the current tag token. Start tags of raw-text elements switch the
    /// tokenizer into the RAWTEXT state.
    fn emit_current_token(&mut self) {
        let Some(mut token) = self.current_token.take() else {
            return;
        };
        let _ = token.drop_duplicate_attributes();
        if let Token::StartTag { name, .. } = &token {
            self.last_start_tag_name = Some(name.clone());
            if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
                self.state = TokenizerState::RawText;
            } else {
                self.state = TokenizerState::Data;
            }
        } else {
            self.state = TokenizerState::Data;
        }
        self.token_stream.push(token);
    }

    fn next_few_characters_are(&self, target: &str, case_insensitive: bool) -> bool {
        let mut pos = self.current_pos;
        for expected in target.chars() {
            let Some(&c) = self.input.get(pos) else {
                return false;
            };
            let same = if case_insensitive {
                c.eq_ignore_ascii_case(&expected)
            } else {
                c == expected
            };
            if !same {
                return false;
            }
            pos += 1;
        }
        true
    }

    /// Consume a character reference following `&` and return its text.
    fn consume_character_reference(&mut self) -> String {
        match decode_at(&self.input, self.current_pos) {
            Some((text, consumed)) => {
                self.current_pos += consumed;
                text
            }
            None => "&".to_string(),
        }
    }

    /// [§ 13.2.5.1 Data state](https://html.spec.whatwg.org/multipage/parsing.html#data-state)
    fn handle_data_state(&mut self) {
        match self.current_input_character {
            // "U+0026 AMPERSAND (&)" - character reference
            Some('&') => {
                let text = self.consume_character_reference();
                for c in text.chars() {
                    self.emit_character_token(c);
                }
            }
            // "U+003C LESS-THAN SIGN (<) - Switch to the tag open state."
            Some('<') => self.switch_to(TokenizerState::TagOpen),
            // "U+0000 NULL - Emit the current input character as a character token."
            Some('\0') => self.emit_character_token('\u{FFFD}'),
            Some(c) => self.emit_character_token(c),
            None => {}
        }
    }

    /// [§ 13.2.5.3 RAWTEXT state](https://html.spec.whatwg.org/multipage/parsing.html#rawtext-state)
    ///
    /// Everything up to `</name` followed by whitespace, `/` or `>` is text.
    fn handle_rawtext_state(&mut self) {
        let Some(c) = self.current_input_character else {
            return;
        };
        if c == '<' {
            let name = self.last_start_tag_name.clone().unwrap_or_default();
            let end_tag = format!("/{name}");
            if self.next_few_characters_are(&end_tag, true) {
                let after = self.input.get(self.current_pos + end_tag.chars().count());
                if matches!(after, None | Some('>' | '/' | ' ' | '\t' | '\n' | '\x0C' | '\r')) {
                    // "</" starts an appropriate end tag token.
                    self.current_pos += 1;
                    self.current_token = Some(Token::new_end_tag());
                    self.switch_to(TokenizerState::TagName);
                    return;
                }
            }
        }
        self.emit_character_token(c);
    }

    /// [§ 13.2.5.6 Tag open state](https://html.spec.whatwg.org/multipage/parsing.html#tag-open-state)
    fn handle_tag_open_state(&mut self) {
        match self.current_input_character {
            Some('!') => self.switch_to(TokenizerState::MarkupDeclarationOpen),
            Some('/') => self.switch_to(TokenizerState::EndTagOpen),
            Some(c) if c.is_ascii_alphabetic() => {
                self.current_token = Some(Token::new_start_tag());
                self.reconsume_in(TokenizerState::TagName);
            }
            // "U+003F QUESTION MARK (?) - Create a comment token ... Reconsume in
            // the bogus comment state."
            Some('?') => {
                self.temporary_buffer.clear();
                self.reconsume_in(TokenizerState::BogusComment);
            }
            // "Anything else - Emit a U+003C LESS-THAN SIGN character token.
            // Reconsume in the data state."
            _ => {
                self.emit_character_token('<');
                self.reconsume_in(TokenizerState::Data);
            }
        }
    }

    /// [§ 13.2.5.7 End tag open state](https://html.spec.whatwg.org/multipage/parsing.html#end-tag-open-state)
    fn handle_end_tag_open_state(&mut self) {
        match self.current_input_character {
            Some(c) if c.is_ascii_alphabetic() => {
                self.current_token = Some(Token::new_end_tag());
                self.reconsume_in(TokenizerState::TagName);
            }
            // "U+003E GREATER-THAN SIGN (>) - missing-end-tag-name. Switch to the data state."
            Some('>') => self.switch_to(TokenizerState::Data),
            None => {
                self.emit_character_token('<');
                self.emit_character_token('/');
            }
            Some(_) => {
                self.temporary_buffer.clear();
                self.reconsume_in(TokenizerState::BogusComment);
            }
        }
    }

    /// [§ 13.2.5.8 Tag name state](https://html.spec.whatwg.org/multipage/parsing.html#tag-name-state)
    fn handle_tag_name_state(&mut self) {
        match self.current_input_character {
            Some('\t' | '\n' | '\x0C' | ' ' | '\r') => {
                self.switch_to(TokenizerState::BeforeAttributeName);
            }
            Some('/') => self.switch_to(TokenizerState::SelfClosingStartTag),
            Some('>') => self.emit_current_token(),
            Some(c) => {
                if let Some(token) = self.current_token.as_mut() {
                    token.append_to_tag_name(if c == '\0' { '\u{FFFD}' } else { c });
                }
            }
            // "EOF - eof-in-tag parse error. Emit an end-of-file token."
            None => self.current_token = None,
        }
    }

    /// [§ 13.2.5.32 Before attribute name state](https://html.spec.whatwg.org/multipage/parsing.html#before-attribute-name-state)
    fn handle_before_attribute_name_state(&mut self) {
        match self.current_input_character {
            Some('\t' | '\n' | '\x0C' | ' ' | '\r') => {}
            Some('/' | '>') | None => self.reconsume_in(TokenizerState::AfterAttributeName),
            Some(_) => {
                if let Some(token) = self.current_token.as_mut() {
                    token.start_new_attribute();
                }
                self.reconsume_in(TokenizerState::AttributeName);
            }
        }
    }

    /// [§ 13.2.5.33 Attribute name state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-name-state)
    fn handle_attribute_name_state(&mut self) {
        match self.current_input_character {
            Some('\t' | '\n' | '\x0C' | ' ' | '\r' | '/' | '>') | None => {
                self.reconsume_in(TokenizerState::AfterAttributeName);
            }
            Some('=') => self.switch_to(TokenizerState::BeforeAttributeValue),
            Some(c) => {
                if let Some(token) = self.current_token.as_mut() {
                    token.append_to_current_attribute_name(c);
                }
            }
        }
    }

    /// [§ 13.2.5.34 After attribute name state](https://html.spec.whatwg.org/multipage/parsing.html#after-attribute-name-state)
    fn handle_after_attribute_name_state(&mut self) {
        match self.current_input_character {
            Some('\t' | '\n' | '\x0C' | ' ' | '\r') => {}
            Some('/') => self.switch_to(TokenizerState::SelfClosingStartTag),
            Some('=') => self.switch_to(TokenizerState::BeforeAttributeValue),
            Some('>') => self.emit_current_token(),
            None => self.current_token = None,
            Some(_) => {
                if let Some(token) = self.current_token.as_mut() {
                    token.start_new_attribute();
                }
                self.reconsume_in(TokenizerState::AttributeName);
            }
        }
    }

    /// [§ 13.2.5.35 Before attribute value state](https://html.spec.whatwg.org/multipage/parsing.html#before-attribute-value-state)
    fn handle_before_attribute_value_state(&mut self) {
        match self.current_input_character {
            Some('\t' | '\n' | '\x0C' | ' ' | '\r') => {}
            Some('"') => self.switch_to(TokenizerState::AttributeValueDoubleQuoted),
            Some('\'') => self.switch_to(TokenizerState::AttributeValueSingleQuoted),
            Some('>') => self.emit_current_token(),
            _ => self.reconsume_in(TokenizerState::AttributeValueUnquoted),
        }
    }

    /// [§ 13.2.5.36](https://html.spec.whatwg.org/multipage/parsing.html#attribute-value-(double-quoted)-state)
    /// and [§ 13.2.5.37](https://html.spec.whatwg.org/multipage/parsing.html#attribute-value-(single-quoted)-state)
    fn handle_attribute_value_quoted_state(&mut self, quote: char) {
        match self.current_input_character {
            Some(c) if c == quote => self.switch_to(TokenizerState::AfterAttributeValueQuoted),
            Some('&') => {
                let text = self.consume_character_reference();
                if let Some(token) = self.current_token.as_mut() {
                    token.append_to_current_attribute_value(&text);
                }
            }
            Some(c) => {
                if let Some(token) = self.current_token.as_mut() {
                    token.append_to_current_attribute_value(c.encode_utf8(&mut [0; 4]));
                }
            }
            None => self.current_token = None,
        }
    }

    /// [§ 13.2.5.38 Attribute value (unquoted) state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-value-(unquoted)-state)
    fn handle_attribute_value_unquoted_state(&mut self) {
        match self.current_input_character {
            Some('\t' | '\n' | '\x0C' | ' ' | '\r') => {
                self.switch_to(TokenizerState::BeforeAttributeName);
            }
            Some('&') => {
                let text = self.consume_character_reference();
                if let Some(token) = self.current_token.as_mut() {
                    token.append_to_current_attribute_value(&text);
                }
            }
            Some('>') => self.emit_current_token(),
            Some(c) => {
                if let Some(token) = self.current_token.as_mut() {
                    token.append_to_current_attribute_value(c.encode_utf8(&mut [0; 4]));
                }
            }
            None => self.current_token = None,
        }
    }

    /// [§ 13.2.5.39 After attribute value (quoted) state](https://html.spec.whatwg.org/multipage/parsing.html#after-attribute-value-(quoted)-state)
    fn handle_after_attribute_value_quoted_state(&mut self) {
        match self.current_input_character {
            Some('\t' | '\n' | '\x0C' | ' ' | '\r') => {
                self.switch_to(TokenizerState::BeforeAttributeName);
            }
            Some('/') => self.switch_to(TokenizerState::SelfClosingStartTag),
            Some('>') => self.emit_current_token(),
            None => self.current_token = None,
            // "missing-whitespace-between-attributes parse error. Reconsume in
            // the before attribute name state."
            Some(_) => self.reconsume_in(TokenizerState::BeforeAttributeName),
        }
    }

    /// [§ 13.2.5.40 Self-closing start tag state](https://html.spec.whatwg.org/multipage/parsing.html#self-closing-start-tag-state)
    fn handle_self_closing_start_tag_state(&mut self) {
        match self.current_input_character {
            Some('>') => {
                if let Some(token) = self.current_token.as_mut() {
                    token.set_self_closing();
                }
                self.emit_current_token();
            }
            None => self.current_token = None,
            Some(_) => self.reconsume_in(TokenizerState::BeforeAttributeName),
        }
    }

    /// [§ 13.2.5.41 Bogus comment state](https://html.spec.whatwg.org/multipage/parsing.html#bogus-comment-state)
    fn handle_bogus_comment_state(&mut self) {
        match self.current_input_character {
            Some('>') | None => {
                let data = std::mem::take(&mut self.temporary_buffer);
                self.token_stream.push(Token::Comment { data });
                self.switch_to(TokenizerState::Data);
            }
            Some(c) => self.temporary_buffer.push(c),
        }
    }

    /// [§ 13.2.5.42 Markup declaration open state](https://html.spec.whatwg.org/multipage/parsing.html#markup-declaration-open-state)
    ///
    /// Comments and DOCTYPEs are read in one step: their inner states never
    /// influence layout.
    fn handle_markup_declaration_open_state(&mut self) {
        // The character that brought us here is the first one after "<!".
        self.current_pos -= usize::from(self.current_input_character.is_some());
        if self.next_few_characters_are("--", false) {
            self.current_pos += 2;
            let data = self.consume_until("-->");
            self.token_stream.push(Token::Comment { data });
        } else if self.next_few_characters_are("DOCTYPE", true) {
            self.current_pos += "DOCTYPE".len();
            let body = self.consume_until(">");
            let name = body
                .split_ascii_whitespace()
                .next()
                .map(str::to_ascii_lowercase);
            self.token_stream.push(Token::Doctype { name });
        } else {
            self.temporary_buffer.clear();
            self.switch_to(TokenizerState::BogusComment);
            return;
        }
        self.switch_to(TokenizerState::Data);
    }

    /// Consume up to and including `terminator`, returning the text before it.
    /// At EOF the remaining input is returned.
    fn consume_until(&mut self, terminator: &str) -> String {
        let mut data = String::new();
        while self.current_pos < self.input.len() {
            if self.next_few_characters_are(terminator, false) {
                self.current_pos += terminator.chars().count();
                return data;
            }
            data.push(self.input[self.current_pos]);
            self.current_pos += 1;
        }
        data
    }

    /// Run the tokenizer to completion.
    ///
    /// Processes the input and populates the token stream, ending with
    /// [`Token::EndOfFile`].
    pub fn run(&mut self) {
        loop {
            // Each state begins by consuming the next input character,
            // unless we're reconsuming from a previous state transition.
            if self.reconsume {
                self.reconsume = false;
            } else {
                self.current_input_character = self.consume();
            }
            let at_eof = self.current_input_character.is_none();

            match self.state {
                TokenizerState::Data => self.handle_data_state(),
                TokenizerState::RawText => self.handle_rawtext_state(),
                TokenizerState::TagOpen => self.handle_tag_open_state(),
                TokenizerState::EndTagOpen => self.handle_end_tag_open_state(),
                TokenizerState::TagName => self.handle_tag_name_state(),
                TokenizerState::BeforeAttributeName => self.handle_before_attribute_name_state(),
                TokenizerState::AttributeName => self.handle_attribute_name_state(),
                TokenizerState::AfterAttributeName => self.handle_after_attribute_name_state(),
                TokenizerState::BeforeAttributeValue => self.handle_before_attribute_value_state(),
                TokenizerState::AttributeValueDoubleQuoted => {
                    self.handle_attribute_value_quoted_state('"');
                }
                TokenizerState::AttributeValueSingleQuoted => {
                    self.handle_attribute_value_quoted_state('\'');
                }
                TokenizerState::AttributeValueUnquoted => {
                    self.handle_attribute_value_unquoted_state();
                }
                TokenizerState::AfterAttributeValueQuoted => {
                    self.handle_after_attribute_value_quoted_state();
                }
                TokenizerState::SelfClosingStartTag => self.handle_self_closing_start_tag_state(),
                TokenizerState::BogusComment => self.handle_bogus_comment_state(),
                TokenizerState::MarkupDeclarationOpen => {
                    self.handle_markup_declaration_open_state();
                }
            }

            // A reconsume at EOF still needs one more pass through the
            // target state; otherwise EOF ends tokenization.
            if at_eof && !self.reconsume {
                break;
            }
        }
        self.token_stream.push(Token::EndOfFile);
    }
}
