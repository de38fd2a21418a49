use ecow::EcoString;
use thiserror::Error;

use super::Span;

/// A recoverable problem found while tokenizing or parsing.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseErrorKind {
    #[error("unexpected character '{0}'")]
    UnexpectedCharacter(EcoString),

    #[error("unterminated string")]
    UnterminatedString,

    #[error("{expected}, found '{found}'")]
    UnexpectedToken {
        expected: &'static str,
        found: EcoString,
    },

    #[error("type code '{0}' is not a small whole number")]
    InvalidTypeCode(EcoString),

    #[error("invalid assignment target")]
    InvalidAssignmentTarget,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span, line: u32) -> Self {
        Self { kind, span, line }
    }
}
