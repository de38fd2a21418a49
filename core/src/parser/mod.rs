//! Front end for Alphabet source text.
//!
//! Source is tokenized with [`logos`] and parsed by a recursive-descent
//! parser into the statement tree defined in [`ast`]. Parsing never aborts
//! on the first problem: a malformed declaration is reported and skipped,
//! and every well-formed statement around it is still returned.

pub mod ast;
mod error;
mod lexer;
mod parser;


use core::ops::Range;

pub use ast::*;
pub use error::{ParseError, ParseErrorKind};
pub use lexer::{Token, TokenKind, tokenize};
pub use parser::{Parsed, parse};

/// Byte range of a token or construct in the original source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Span(pub Range<usize>);

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self(start..end)
    }

    pub fn combine(a: &Span, b: &Span) -> Span {
        Span::new(a.0.start, b.0.end)
    }

    pub fn str_of<'a>(&self, source: &'a str) -> &'a str {
        &source[self.0.start..self.0.end]
    }
}
