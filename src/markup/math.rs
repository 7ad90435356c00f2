//! Math delimiter normalization.
//!
//! Streamed model output spells math in LaTeX bracket form; the parser only
//! recognizes dollar delimiters, so `\[ \]` becomes `$$` (display) and
//! `\( \)` becomes `$` (inline) before parsing. Everything downstream works
//! on the parsed math nodes, so the expression bodies are never touched by
//! emphasis or other inline transforms.

pub fn normalize_math_delimiters(text: &str) -> String {
    text.replace("\\[", "$$")
        .replace("\\]", "$$")
        .replace("\\(", "$")
        .replace("\\)", "$")
}

#[cfg(test)]
mod tests {
    use super::normalize_math_delimiters;

    #[test]
    fn display_brackets_become_double_dollars() {
        assert_eq!(
            normalize_math_delimiters("\\[x^2 + y^2 = z^2\\]"),
            "$$x^2 + y^2 = z^2$$"
        );
    }

    #[test]
    fn inline_parens_become_single_dollars() {
        assert_eq!(
            normalize_math_delimiters("sum \\(a+b\\) here"),
            "sum $a+b$ here"
        );
    }

    #[test]
    fn dollar_delimited_math_passes_through() {
        let text = "inline $E = mc^2$ and block $$\\int f$$";
        assert_eq!(normalize_math_delimiters(text), text);
    }

    #[test]
    fn plain_text_is_untouched() {
        assert_eq!(normalize_math_delimiters("no math here"), "no math here");
    }
}
