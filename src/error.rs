use std::fmt;

use thiserror::Error;

/// A 1-based position in the decoded source text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Lexical errors: bad escapes, unterminated strings, comments or urls.
    #[error("syntax error at {span}: {message}")]
    Syntax { span: Span, message: String },
    /// Structural errors: unexpected tokens, unbalanced blocks, invalid selectors.
    #[error("parse error at {span}: {message}")]
    Parse { span: Span, message: String },
    #[error("{0}")]
    Encoding(String),
    #[error("{0}")]
    InvalidInput(String),
}

impl Error {
    pub(crate) fn syntax(span: Span, message: impl Into<String>) -> Self {
        Self::Syntax {
            span,
            message: message.into(),
        }
    }

    pub(crate) fn parse(span: Span, message: impl Into<String>) -> Self {
        Self::Parse {
            span,
            message: message.into(),
        }
    }

    /// Returns the source position for syntax and parse errors.
    pub fn span(&self) -> Option<Span> {
        match self {
            Error::Syntax { span, .. } | Error::Parse { span, .. } => Some(*span),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
