use ecow::EcoString;
use logos::Logos;

use super::{ParseError, ParseErrorKind, Span};

/// Raw lexemes as recognized by logos. Words are classified into
/// keywords and identifiers afterwards.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
enum RawToken {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("^")]
    Caret,
    #[token("@")]
    At,
    #[token("!")]
    Bang,
    #[token("!=")]
    BangEqual,
    #[token("=")]
    Equal,
    #[token("==")]
    EqualEqual,
    #[token("<")]
    Less,
    #[token("<=")]
    LessEqual,
    #[token(">")]
    Greater,
    #[token(">=")]
    GreaterEqual,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,

    #[regex(r"[0-9]+", fraction)]
    Number,

    #[regex(r#""[^"]*""#)]
    Str,

    // Opening quote with no closing quote before the end of input.
    #[regex(r#""[^"]*"#)]
    UnterminatedStr,

    #[regex(r"[A-Za-z][A-Za-z0-9]*")]
    Word,
}

/// Extends an integer match with a `.digits` fraction when one follows.
/// A dot not followed by a digit is left for the member-access token.
fn fraction(lex: &mut logos::Lexer<RawToken>) {
    let rest = lex.remainder().as_bytes();
    if rest.len() >= 2 && rest[0] == b'.' && rest[1].is_ascii_digit() {
        let digits = rest[1..].iter().take_while(|b| b.is_ascii_digit()).count();
        lex.bump(1 + digits);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Dot,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    /// `^`, introduces the superclass list.
    Extends,
    At,
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    AndAnd,
    OrOr,
    Number,
    Str,
    Identifier,

    // Single-letter keywords.
    If,
    Else,
    Loop,
    Break,
    Continue,
    Return,
    Class,
    Abstract,
    Interface,
    New,
    Public,
    Private,
    Static,
    Method,
    Try,
    Handle,
    System,

    Eof,
}

impl TokenKind {
    fn keyword(word: &str) -> Option<TokenKind> {
        use TokenKind::*;
        let kind = match word {
            "i" => If,
            "e" => Else,
            "l" => Loop,
            "b" => Break,
            "k" => Continue,
            "r" => Return,
            "c" => Class,
            "a" => Abstract,
            "j" => Interface,
            "n" => New,
            "v" => Public,
            "p" => Private,
            "s" => Static,
            "m" => Method,
            "t" => Try,
            "h" => Handle,
            "z" => System,
            _ => return None,
        };
        Some(kind)
    }

    /// True for every single-letter keyword.
    pub fn is_keyword(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            If | Else
                | Loop
                | Break
                | Continue
                | Return
                | Class
                | Abstract
                | Interface
                | New
                | Public
                | Private
                | Static
                | Method
                | Try
                | Handle
                | System
        )
    }
}

impl From<RawToken> for TokenKind {
    fn from(raw: RawToken) -> Self {
        match raw {
            RawToken::LParen => TokenKind::LParen,
            RawToken::RParen => TokenKind::RParen,
            RawToken::LBrace => TokenKind::LBrace,
            RawToken::RBrace => TokenKind::RBrace,
            RawToken::LBracket => TokenKind::LBracket,
            RawToken::RBracket => TokenKind::RBracket,
            RawToken::Comma => TokenKind::Comma,
            RawToken::Colon => TokenKind::Colon,
            RawToken::Dot => TokenKind::Dot,
            RawToken::Plus => TokenKind::Plus,
            RawToken::Minus => TokenKind::Minus,
            RawToken::Star => TokenKind::Star,
            RawToken::Slash => TokenKind::Slash,
            RawToken::Percent => TokenKind::Percent,
            RawToken::Caret => TokenKind::Extends,
            RawToken::At => TokenKind::At,
            RawToken::Bang => TokenKind::Bang,
            RawToken::BangEqual => TokenKind::BangEqual,
            RawToken::Equal => TokenKind::Equal,
            RawToken::EqualEqual => TokenKind::EqualEqual,
            RawToken::Less => TokenKind::Less,
            RawToken::LessEqual => TokenKind::LessEqual,
            RawToken::Greater => TokenKind::Greater,
            RawToken::GreaterEqual => TokenKind::GreaterEqual,
            RawToken::AndAnd => TokenKind::AndAnd,
            RawToken::OrOr => TokenKind::OrOr,
            RawToken::Number => TokenKind::Number,
            RawToken::Str | RawToken::UnterminatedStr => TokenKind::Str,
            RawToken::Word => TokenKind::Identifier,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub lexeme: &'src str,
    pub span: Span,
    /// 1-based source line of the token's first character.
    pub line: u32,
}

impl Token<'_> {
    /// Tokens that may stand where a name is expected: identifiers and
    /// every single-letter keyword.
    pub fn is_name(&self) -> bool {
        self.kind == TokenKind::Identifier || self.kind.is_keyword()
    }

    pub fn number(&self) -> Option<f64> {
        match self.kind {
            TokenKind::Number => self.lexeme.parse().ok(),
            _ => None,
        }
    }

    /// Contents of a string literal without its quotes.
    pub fn string(&self) -> Option<EcoString> {
        match self.kind {
            TokenKind::Str => Some(self.lexeme.trim_start_matches('"').trim_end_matches('"').into()),
            _ => None,
        }
    }
}

/// Length of the optional preamble: a `#!` interpreter line followed by an
/// optional `#alphabet<...>` language header line.
fn preamble_len(source: &str) -> usize {
    let mut offset = 0;
    for prefix in ["#!", "#alphabet"] {
        let rest = &source[offset..];
        if rest.starts_with(prefix) {
            offset += rest.find('\n').map_or(rest.len(), |nl| nl + 1);
        }
    }
    offset
}

/// Tokenizes `source`, always ending with an [`TokenKind::Eof`] token.
///
/// Characters that start no token are reported and skipped.
pub fn tokenize(source: &str) -> (Vec<Token<'_>>, Vec<ParseError>) {
    let start = preamble_len(source);
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    let mut line = 1 + source[..start].matches('\n').count() as u32;
    let mut line_pos = start;
    let mut lexer = RawToken::lexer(&source[start..]);

    while let Some(result) = lexer.next() {
        let range = lexer.span();
        let span = Span::new(range.start + start, range.end + start);
        line += source[line_pos..span.0.start].matches('\n').count() as u32;
        line_pos = span.0.start;
        let lexeme = span.str_of(source);

        match result {
            Ok(RawToken::UnterminatedStr) => {
                errors.push(ParseError::new(ParseErrorKind::UnterminatedString, span, line));
            }
            Ok(RawToken::Word) => {
                let kind = TokenKind::keyword(lexeme).unwrap_or(TokenKind::Identifier);
                tokens.push(Token { kind, lexeme, span, line });
            }
            Ok(raw) => tokens.push(Token { kind: raw.into(), lexeme, span, line }),
            Err(()) => {
                errors.push(ParseError::new(
                    ParseErrorKind::UnexpectedCharacter(lexeme.into()),
                    span,
                    line,
                ));
            }
        }
    }

    line += source[line_pos..].matches('\n').count() as u32;
    tokens.push(Token {
        kind: TokenKind::Eof,
        lexeme: "",
        span: Span::new(source.len(), source.len()),
        line,
    });
    (tokens, errors)
}
