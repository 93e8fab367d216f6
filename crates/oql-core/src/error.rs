//! Error types for the query engine.
//!
//! Three kinds of failure surface to callers: [`LexicalError`] for malformed
//! tokens, [`SyntaxError`] for structural violations (including unknown
//! entities and properties), and [`BindError`] for parameter problems.
//! Lexical and syntax errors carry the byte position of the offending token
//! and the fragment of the source starting there, so messages read as
//! ``expected alias near `x.y FROM ...` in query `...` ``.

use thiserror::Error;

/// Clamps `pos` to a char boundary and returns the rest of the source.
fn fragment(source: &str, pos: usize) -> String {
    let mut pos = pos.min(source.len());
    while pos < source.len() && !source.is_char_boundary(pos) {
        pos += 1;
    }
    source[pos..].to_string()
}

/// A malformed token in the query source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} near `{near}` in query `{query}`")]
pub struct LexicalError {
    /// What was wrong with the input.
    pub message: String,
    /// Byte offset of the offending character.
    pub pos: usize,
    /// The source text starting at the offending position.
    pub near: String,
    /// The full query source.
    pub query: String,
}

impl LexicalError {
    /// Creates a lexical error pointing at `pos` in `source`.
    #[must_use]
    pub fn new(message: impl Into<String>, pos: usize, source: &str) -> Self {
        Self {
            message: message.into(),
            pos,
            near: fragment(source, pos),
            query: source.to_string(),
        }
    }
}

/// A structural violation in an otherwise well-lexed query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} near `{near}` in query `{query}`")]
pub struct SyntaxError {
    /// What was wrong with the query.
    pub message: String,
    /// Byte offset of the offending token.
    pub pos: usize,
    /// The source text starting at the offending position.
    pub near: String,
    /// The full query source.
    pub query: String,
}

impl SyntaxError {
    /// Creates a syntax error pointing at `pos` in `source`.
    #[must_use]
    pub fn new(message: impl Into<String>, pos: usize, source: &str) -> Self {
        Self {
            message: message.into(),
            pos,
            near: fragment(source, pos),
            query: source.to_string(),
        }
    }
}

/// Any failure while turning a query string into a [`crate::ParsedQuery`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The lexer rejected the input.
    #[error("lexical error: {0}")]
    Lexical(#[from] LexicalError),
    /// The parser rejected the token stream.
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),
}

impl ParseError {
    /// Returns the byte position the error points at.
    #[must_use]
    pub fn pos(&self) -> usize {
        match self {
            Self::Lexical(e) => e.pos,
            Self::Syntax(e) => e.pos,
        }
    }
}

/// A parameter-binding failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// The name does not occur in the query's parameter map.
    #[error("unknown parameter `{name}` in query `{query}`")]
    UnknownParameter {
        /// The offending parameter name.
        name: String,
        /// The original query source.
        query: String,
    },
    /// One or more parameters were never given a value.
    #[error("parameters not bound: {}", .names.join(", "))]
    NotBound {
        /// Every still-unbound name, in declaration order.
        names: Vec<String>,
    },
}
