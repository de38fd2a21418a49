use alphabet_core::parser::{TokenKind, tokenize};
use nu_ansi_term::{Color, Style};
use reedline::StyledText;

#[derive(Debug, Clone, Copy)]
enum Role {
    Plain,
    Keyword,
    Number,
    Str,
    Class,
    Operator,
    Comment,
}

impl Role {
    fn color(self) -> Color {
        match self {
            Role::Plain => Color::White,
            Role::Keyword => Color::Magenta,
            Role::Number => Color::Cyan,
            Role::Str => Color::Green,
            Role::Class => Color::Yellow,
            Role::Operator => Color::White,
            Role::Comment => Color::DarkGray,
        }
    }

    fn of(kind: TokenKind, lexeme: &str) -> Role {
        match kind {
            TokenKind::Number => Role::Number,
            TokenKind::Str => Role::Str,
            TokenKind::Identifier if lexeme.starts_with(|c: char| c.is_ascii_uppercase()) => {
                Role::Class
            }
            TokenKind::Identifier => Role::Plain,
            kind if kind.is_keyword() => Role::Keyword,
            _ => Role::Operator,
        }
    }
}

/// Colors REPL input with the language's own tokenizer.
#[derive(Debug, Default)]
pub struct Highlighter;

impl Highlighter {
    pub fn new() -> Self {
        Self
    }
}

/// Text between tokens: whitespace, comments and skipped characters.
fn push_gap(output: &mut StyledText, gap: &str) {
    if gap.is_empty() {
        return;
    }
    match gap.find("//") {
        Some(at) => {
            output.push((Style::new().fg(Role::Plain.color()), gap[..at].to_string()));
            output.push((Style::new().fg(Role::Comment.color()), gap[at..].to_string()));
        }
        None => output.push((Style::new().fg(Role::Plain.color()), gap.to_string())),
    }
}

impl reedline::Highlighter for Highlighter {
    fn highlight(&self, line: &str, _: usize) -> StyledText {
        let mut output = StyledText::new();
        let (tokens, _) = tokenize(line);

        let mut curr_end = 0;
        for token in tokens.iter().filter(|t| t.kind != TokenKind::Eof) {
            let (start, end) = (token.span.0.start, token.span.0.end);
            if start < curr_end {
                continue;
            }
            push_gap(&mut output, &line[curr_end..start]);
            let style = Style::new().fg(Role::of(token.kind, token.lexeme).color());
            output.push((style, line[start..end].to_string()));
            curr_end = end;
        }
        push_gap(&mut output, line.get(curr_end..).unwrap_or_default());

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use reedline::Highlighter as _;

    fn text_of(styled: &StyledText) -> String {
        styled.buffer.iter().map(|(_, text)| text.as_str()).collect()
    }

    #[test]
    fn test_highlight_keeps_the_text() {
        let line = r#"c A { m 1 f() { r "x" } } // done"#;
        assert_eq!(text_of(&Highlighter::new().highlight(line, 0)), line);
    }

    #[test]
    fn test_keywords_and_literals() {
        let styled = Highlighter::new().highlight("i (x) z.o(1)", 0);
        let (style, text) = &styled.buffer[0];
        assert_eq!(text, "i");
        assert_eq!(style.foreground, Some(Color::Magenta));
        let number = styled.buffer.iter().find(|(_, text)| text == "1");
        assert_eq!(number.map(|(style, _)| style.foreground), Some(Some(Color::Cyan)));
    }

    #[test]
    fn test_comment_is_dimmed() {
        let styled = Highlighter::new().highlight("z.o(1) // hi", 0);
        let last = styled.buffer.last().map(|(style, text)| (style.foreground, text.as_str()));
        assert_eq!(last, Some((Some(Color::DarkGray), "// hi")));
    }
}
