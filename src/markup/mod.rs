//! Markup formatting pipeline.
//!
//! Message text flows through three stages: the reasoning wrapper is split
//! off, math delimiters are normalized, and the remainder is parsed and
//! rendered from its node tree. Formatting is total: no input makes it
//! fail, the worst case is the raw text wrapped to width.

pub mod highlight;
pub mod math;
pub mod render;
pub mod theme;

pub use highlight::highlight_code_block;
pub use math::normalize_math_delimiters;
pub use render::{parse_options, MarkupRenderer};
pub use theme::{CodeHighlightFn, MarkupStyleFn, MarkupTheme, MathTypesetFn};

use crate::text::wrap::wrap_text_with_ansi;

const REASONING_OPEN: &str = "<think>";
const REASONING_CLOSE: &str = "</think>";

/// Split a leading reasoning wrapper off a message body.
///
/// Returns the reasoning text (without markers) and the remaining answer
/// text. A wrapper that never closed claims the whole remainder.
pub fn split_reasoning(text: &str) -> (Option<&str>, &str) {
    let Some(rest) = text.strip_prefix(REASONING_OPEN) else {
        return (None, text);
    };
    match rest.find(REASONING_CLOSE) {
        Some(idx) => (
            Some(&rest[..idx]),
            &rest[idx + REASONING_CLOSE.len()..],
        ),
        None => (Some(rest), ""),
    }
}

/// Format markup text to styled lines at the given width.
///
/// Any panic inside parsing or rendering degrades to the raw text wrapped
/// to width, never to a lost message.
pub fn format_markup(text: &str, width: usize, theme: MarkupTheme) -> Vec<String> {
    let normalized = normalize_math_delimiters(text);
    let rendered = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        use crate::component::Component;
        let mut renderer = MarkupRenderer::new(normalized.clone(), theme);
        renderer.render(width)
    }));
    match rendered {
        Ok(lines) => lines,
        Err(_) => wrap_text_with_ansi(&normalized, width.max(1)),
    }
}
