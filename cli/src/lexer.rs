use logos::Logos;

#[derive(Logos, Debug, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token {
    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[regex(r"//[^\n]*")]
    Comment,

    // Strings have no escapes and may span lines; an unclosed one does not
    // match at all.
    #[regex(r#""[^"]*""#)]
    Str,

    #[regex(r#"[^ \t\r\n\f\{\}\[\]\(\)"/]+"#)]
    Other,

    #[token("/")]
    Slash,
}

/// Open bracket depth at the end of `buffer`.
///
/// Returns `None` while a string literal is still open.
pub fn calculate_depth(buffer: &str) -> Option<usize> {
    let mut depth: isize = 0;

    for token_res in Token::lexer(buffer) {
        match token_res {
            Ok(Token::LBrace) | Ok(Token::LBracket) | Ok(Token::LParen) => depth += 1,
            Ok(Token::RBrace) | Ok(Token::RBracket) | Ok(Token::RParen) => depth -= 1,
            Ok(_) => {}
            Err(_) => return None,
        }
    }

    Some(depth.max(0) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_balanced_input() {
        assert_eq!(calculate_depth("z.o(1)"), Some(0));
        assert_eq!(calculate_depth("c A { m 1 f() { r [1, 2] } }"), Some(0));
    }

    #[test]
    fn test_open_blocks() {
        assert_eq!(calculate_depth("c A {"), Some(1));
        assert_eq!(calculate_depth("c A { m 1 f() {"), Some(2));
        assert_eq!(calculate_depth("5 x = [1,"), Some(1));
    }

    #[test]
    fn test_brackets_inside_strings_and_comments() {
        assert_eq!(calculate_depth(r#"z.o("{")"#), Some(0));
        assert_eq!(calculate_depth("z.o(1) // {"), Some(0));
        assert_eq!(calculate_depth("z.o(4 / 2)"), Some(0));
    }

    #[test]
    fn test_open_string() {
        assert_eq!(calculate_depth(r#"z.o("abc"#), None);
    }

    #[test]
    fn test_extra_closers() {
        assert_eq!(calculate_depth("}}"), Some(0));
    }
}
