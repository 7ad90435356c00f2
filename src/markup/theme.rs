//! Styling seams for the markup renderer.

pub type MarkupStyleFn = Box<dyn Fn(&str) -> String>;

/// Highlights a code block body; one output line per input line.
pub type CodeHighlightFn = Box<dyn Fn(&str, Option<&str>) -> Vec<String>>;

/// Typesets a math expression. The `display` flag selects block layout
/// (`$$…$$`) over inline (`$…$`). Returning `None` signals a typesetting
/// failure; the renderer then falls back to the raw expression in the
/// error style.
pub type MathTypesetFn = Box<dyn Fn(&str, bool) -> Option<Vec<String>>>;

pub struct MarkupTheme {
    pub heading: MarkupStyleFn,
    pub link: MarkupStyleFn,
    pub link_url: MarkupStyleFn,
    pub code: MarkupStyleFn,
    pub code_block: MarkupStyleFn,
    pub code_block_border: MarkupStyleFn,
    pub quote: MarkupStyleFn,
    pub quote_border: MarkupStyleFn,
    pub hr: MarkupStyleFn,
    pub list_bullet: MarkupStyleFn,
    pub bold: MarkupStyleFn,
    pub italic: MarkupStyleFn,
    pub strikethrough: MarkupStyleFn,
    pub underline: MarkupStyleFn,
    pub math: MarkupStyleFn,
    pub math_error: MarkupStyleFn,
    pub highlight_code: Option<CodeHighlightFn>,
    pub typeset_math: Option<MathTypesetFn>,
    pub code_block_indent: Option<String>,
}

fn sgr(params: &str) -> impl Fn(&str) -> String + 'static {
    let open = format!("\x1b[{params}m");
    move |text: &str| format!("{open}{text}\x1b[0m")
}

impl MarkupTheme {
    /// ANSI color theme used when the embedder does not supply one.
    pub fn default_ansi() -> Self {
        Self {
            heading: Box::new(sgr("95")),
            link: Box::new(sgr("34")),
            link_url: Box::new(sgr("2")),
            code: Box::new(sgr("36")),
            code_block: Box::new(sgr("37")),
            code_block_border: Box::new(sgr("2")),
            quote: Box::new(sgr("32")),
            quote_border: Box::new(sgr("2")),
            hr: Box::new(sgr("2")),
            list_bullet: Box::new(sgr("36")),
            bold: Box::new(sgr("1")),
            italic: Box::new(sgr("3")),
            strikethrough: Box::new(sgr("9")),
            underline: Box::new(sgr("4")),
            math: Box::new(sgr("33")),
            math_error: Box::new(sgr("31")),
            highlight_code: Some(Box::new(|code, lang| {
                super::highlight::highlight_code_block(code, lang)
            })),
            typeset_math: None,
            code_block_indent: None,
        }
    }

    /// Identity theme with no escape codes.
    pub fn plain() -> Self {
        let id = || -> MarkupStyleFn { Box::new(|text: &str| text.to_string()) };
        Self {
            heading: id(),
            link: id(),
            link_url: id(),
            code: id(),
            code_block: id(),
            code_block_border: id(),
            quote: id(),
            quote_border: id(),
            hr: id(),
            list_bullet: id(),
            bold: id(),
            italic: id(),
            strikethrough: id(),
            underline: id(),
            math: id(),
            math_error: id(),
            highlight_code: None,
            typeset_math: None,
            code_block_indent: None,
        }
    }
}
