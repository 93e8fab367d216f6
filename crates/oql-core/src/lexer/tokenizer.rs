//! Query tokenizer implementation.

use crate::error::LexicalError;

use super::{Keyword, Op, Token, TokenKind};

/// A lexer that tokenizes query input.
pub struct Lexer<'a> {
    /// The input source code.
    input: &'a str,
    /// The current byte position.
    pos: usize,
    /// The byte position of the start of the current token.
    start: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input.
    #[must_use]
    pub const fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            start: 0,
        }
    }

    /// Returns the current character without advancing.
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    /// Returns the next character without advancing.
    fn peek_next(&self) -> Option<char> {
        let mut chars = self.input[self.pos..].chars();
        chars.next();
        chars.next()
    }

    /// Advances to the next character and returns it.
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Skips a run of whitespace, returning whether anything was skipped.
    fn skip_whitespace(&mut self) -> bool {
        let before = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance();
        }
        self.pos != before
    }

    fn error(&self, message: &str) -> LexicalError {
        LexicalError::new(message, self.start, self.input)
    }

    /// Scans an identifier or keyword.
    ///
    /// Keywords are recognized case-insensitively; operator keywords come
    /// out as operator tokens with their source text preserved.
    fn scan_identifier(&mut self) -> Token<'static> {
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.advance();
        }
        let text = &self.input[self.start..self.pos];

        match Keyword::from_str(text) {
            Some(kw) => match kw.as_op() {
                Some(op) => Token::operator(self.start, op, text),
                None => Token::keyword(self.start, kw, text),
            },
            None => Token::new(TokenKind::Ident, self.start, text),
        }
    }

    /// Scans a back-tick quoted identifier.
    ///
    /// Both ticks must be present and the body is limited to alphanumerics;
    /// quoting forces the Ident tag even for keyword spellings.
    fn scan_quoted_identifier(&mut self) -> Result<Token<'static>, LexicalError> {
        self.advance(); // consume opening tick
        let body_start = self.pos;
        while self.peek().is_some_and(char::is_alphanumeric) {
            self.advance();
        }
        let body = &self.input[body_start..self.pos];
        if self.peek() != Some('`') || body.is_empty() {
            return Err(self.error("unterminated quoted identifier"));
        }
        self.advance(); // consume closing tick
        Ok(Token::new(TokenKind::Ident, self.start, body))
    }

    /// Scans a numeric literal: optional integer part, optional fraction
    /// (a bare `.25` is permitted), optional exponent.
    fn scan_number(&mut self) -> Result<Token<'static>, LexicalError> {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        if self.peek() == Some('.') {
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }
        if self.peek().is_some_and(|c| c == 'e' || c == 'E') {
            self.advance();
            if self.peek().is_some_and(|c| c == '+' || c == '-') {
                self.advance();
            }
            if !self.peek().is_some_and(|c| c.is_ascii_digit()) {
                return Err(self.error("malformed numeric literal"));
            }
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }
        // A digit run may not butt directly against a letter.
        if self.peek().is_some_and(char::is_alphabetic) {
            return Err(self.error("malformed numeric literal"));
        }
        let text = &self.input[self.start..self.pos];
        Ok(Token::new(TokenKind::Number, self.start, text))
    }

    /// Scans a single-quoted string literal. No escape processing: the body
    /// is taken verbatim up to the next quote.
    fn scan_string(&mut self) -> Result<Token<'static>, LexicalError> {
        self.advance(); // consume opening quote
        let body_start = self.pos;
        loop {
            match self.peek() {
                Some('\'') => break,
                Some(_) => {
                    self.advance();
                }
                None => return Err(self.error("unterminated string literal")),
            }
        }
        let body = &self.input[body_start..self.pos];
        self.advance(); // consume closing quote
        Ok(Token::new(TokenKind::Str, self.start, body))
    }

    /// Scans a named parameter. The leading `:` is consumed already; the
    /// emitted text excludes it.
    fn scan_parameter(&mut self) -> Result<Token<'static>, LexicalError> {
        if !self
            .peek()
            .is_some_and(|c| c.is_alphabetic() || c == '_')
        {
            return Err(self.error("parameter name expected after `:`"));
        }
        let body_start = self.pos;
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.advance();
        }
        let body = &self.input[body_start..self.pos];
        Ok(Token::new(TokenKind::Param, self.start, body))
    }

    /// Scans the next token. The caller guarantees the input is not at
    /// end-of-input or whitespace.
    fn scan_token(&mut self) -> Result<Token<'static>, LexicalError> {
        self.start = self.pos;
        let Some(c) = self.peek() else {
            return Err(self.error("unexpected end of input"));
        };

        match c {
            '(' => {
                self.advance();
                Ok(Token::new(TokenKind::OpenParen, self.start, "("))
            }
            ')' => {
                self.advance();
                Ok(Token::new(TokenKind::CloseParen, self.start, ")"))
            }
            ',' => {
                self.advance();
                Ok(Token::new(TokenKind::Comma, self.start, ","))
            }
            '.' => {
                if self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
                    self.scan_number()
                } else {
                    self.advance();
                    Ok(Token::new(TokenKind::Dot, self.start, "."))
                }
            }
            ':' => {
                self.advance();
                self.scan_parameter()
            }
            '\'' => self.scan_string(),
            '`' => self.scan_quoted_identifier(),
            '=' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                }
                Ok(Token::operator(
                    self.start,
                    Op::Eq,
                    &self.input[self.start..self.pos],
                ))
            }
            '!' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    Ok(Token::operator(self.start, Op::Ne, "!="))
                } else {
                    Err(self.error("invalid character `!`"))
                }
            }
            '<' => {
                self.advance();
                match self.peek() {
                    Some('=') => {
                        self.advance();
                        Ok(Token::operator(self.start, Op::Le, "<="))
                    }
                    Some('>') => {
                        self.advance();
                        Ok(Token::operator(self.start, Op::Ne, "<>"))
                    }
                    _ => Ok(Token::operator(self.start, Op::Lt, "<")),
                }
            }
            '>' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    Ok(Token::operator(self.start, Op::Ge, ">="))
                } else {
                    Ok(Token::operator(self.start, Op::Gt, ">"))
                }
            }
            '+' => {
                self.advance();
                Ok(Token::operator(self.start, Op::Add, "+"))
            }
            '-' => {
                self.advance();
                Ok(Token::operator(self.start, Op::Sub, "-"))
            }
            '*' => {
                self.advance();
                Ok(Token::operator(self.start, Op::Mul, "*"))
            }
            '/' => {
                self.advance();
                Ok(Token::operator(self.start, Op::Div, "/"))
            }
            c if c.is_ascii_digit() => self.scan_number(),
            c if c.is_alphabetic() || c == '_' => Ok(self.scan_identifier()),
            _ => Err(self.error(&format!("invalid character `{c}`"))),
        }
    }

    /// Tokenizes the entire input.
    ///
    /// Whitespace is never emitted as a token; a run of whitespace marks the
    /// previously emitted token as having trailing space.
    ///
    /// # Errors
    ///
    /// Returns a [`LexicalError`] for unterminated strings or quoted
    /// identifiers, malformed numbers, empty parameter names, and characters
    /// outside the language.
    pub fn tokenize(mut self) -> Result<Vec<Token<'static>>, LexicalError> {
        let mut tokens: Vec<Token<'static>> = Vec::new();
        loop {
            if self.skip_whitespace() {
                if let Some(last) = tokens.last_mut() {
                    last.space_after = true;
                }
            }
            if self.peek().is_none() {
                break;
            }
            tokens.push(self.scan_token()?);
        }
        Ok(tokens)
    }
}
