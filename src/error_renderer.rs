//! Source-annotated rendering of parse diagnostics using ariadne.
//!
//! Recovered parse errors carry a byte span into the source they came from;
//! this module prints them as reports with the offending text underlined.

use ariadne::{Color, Config, IndexType, Label, Report, ReportKind, Source};
use std::io::Write;

use crate::ParseError;

/// Render `diagnostics` for the source named `name` to stderr.
pub fn render_diagnostics(name: &str, source: &str, diagnostics: &[ParseError]) {
    render_to_writer(name, source, diagnostics, &mut std::io::stderr(), true).ok();
}

/// Render diagnostics to a specific writer.
pub fn render_diagnostics_to(
    name: &str,
    source: &str,
    diagnostics: &[ParseError],
    writer: &mut dyn Write,
) -> std::io::Result<()> {
    render_to_writer(name, source, diagnostics, writer, true)
}

/// Render diagnostics to a String without color codes (useful for tests)
pub fn render_diagnostics_to_string_no_color(
    name: &str,
    source: &str,
    diagnostics: &[ParseError],
) -> String {
    let mut buf = Vec::new();
    render_to_writer(name, source, diagnostics, &mut buf, false).ok();
    String::from_utf8_lossy(&buf).to_string()
}

fn render_to_writer(
    name: &str,
    source: &str,
    diagnostics: &[ParseError],
    writer: &mut dyn Write,
    use_color: bool,
) -> std::io::Result<()> {
    for diag in diagnostics {
        // Keep the label inside the source, an error at end of input has an
        // empty span past the last byte.
        let end = diag.span.0.end.min(source.len());
        let start = diag.span.0.start.min(end);

        let message = diag.kind.to_string();
        Report::build(ReportKind::Error, (name, start..end))
            .with_message(format!("line {}: {message}", diag.line))
            .with_config(
                Config::default()
                    .with_color(use_color)
                    .with_index_type(IndexType::Byte),
            )
            .with_label(
                Label::new((name, start..end))
                    .with_message(message)
                    .with_color(Color::Red),
            )
            .finish()
            .write((name, Source::from(source)), &mut *writer)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    #[test]
    fn test_render_parse_error() {
        let source = "5 x = 1\n5 y = )\nz.o(x)";
        let parsed = parse(source);
        assert_eq!(parsed.errors.len(), 1);

        let output = render_diagnostics_to_string_no_color("demo.ab", source, &parsed.errors);
        assert!(output.contains("line 2"), "{output}");
        assert!(output.contains("demo.ab"), "{output}");
        assert!(output.contains("5 y = )"), "{output}");
    }

    #[test]
    fn test_render_nothing_for_clean_source() {
        let source = "z.o(1)";
        let parsed = parse(source);
        assert!(render_diagnostics_to_string_no_color("ok.ab", source, &parsed.errors).is_empty());
    }

    #[test]
    fn test_render_error_at_end_of_input() {
        let source = "5 x = (1 +";
        let parsed = parse(source);
        assert!(!parsed.errors.is_empty());
        let output = render_diagnostics_to_string_no_color("eof.ab", source, &parsed.errors);
        assert!(output.lines().count() > 1, "{output}");
    }
}
