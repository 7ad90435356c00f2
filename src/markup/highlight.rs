//! Syntax highlighting for fenced code blocks.

use once_cell::sync::Lazy;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::as_24_bit_terminal_escaped;

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);

static THEME: Lazy<Theme> = Lazy::new(|| {
    let mut themes = ThemeSet::load_defaults().themes;
    themes
        .remove("base16-ocean.dark")
        .or_else(|| themes.into_values().next())
        .unwrap_or_default()
});

/// Highlight a code block body into ANSI-styled lines.
///
/// Unknown languages fall back to plain text; a per-line highlight failure
/// falls back to the raw line, so output always has one line per input
/// line.
pub fn highlight_code_block(code: &str, lang: Option<&str>) -> Vec<String> {
    let syntax = lang
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .and_then(|token| SYNTAX_SET.find_syntax_by_token(token))
        .unwrap_or_else(|| SYNTAX_SET.find_syntax_plain_text());

    let mut highlighter = HighlightLines::new(syntax, &THEME);
    code.split('\n')
        .map(|line| match highlighter.highlight_line(line, &SYNTAX_SET) {
            Ok(ranges) => format!("{}\x1b[0m", as_24_bit_terminal_escaped(&ranges, false)),
            Err(_) => line.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::highlight_code_block;
    use crate::text::visible_width;

    #[test]
    fn one_output_line_per_input_line() {
        let code = "fn main() {\n    println!(\"hi\");\n}";
        let lines = highlight_code_block(code, Some("rust"));
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn visible_text_is_preserved() {
        let lines = highlight_code_block("let x = 1;", Some("rust"));
        assert_eq!(visible_width(&lines[0]), "let x = 1;".len());
    }

    #[test]
    fn unknown_language_falls_back_to_plain() {
        let lines = highlight_code_block("hello", Some("no-such-lang"));
        assert_eq!(lines.len(), 1);
        assert_eq!(visible_width(&lines[0]), 5);
    }
}
