//! ANSI-aware word wrapping.
//!
//! Wrapping is the sole source of row heights for the transcript: a chunk's
//! height is exactly the number of lines this module produces for it at the
//! current viewport width.

use unicode_segmentation::UnicodeSegmentation;

use super::ansi::{extract_ansi_code, AnsiCodeTracker};
use super::width::{grapheme_width, visible_width};

pub fn wrap_text_with_ansi(text: &str, width: usize) -> Vec<String> {
    if text.is_empty() {
        return vec![String::new()];
    }
    if width == 0 {
        return vec![String::new()];
    }

    let mut result = Vec::new();
    let mut tracker = AnsiCodeTracker::default();

    for input_line in text.split('\n') {
        let prefix = if result.is_empty() {
            String::new()
        } else {
            tracker.active_codes()
        };
        let line = format!("{}{}", prefix, input_line);
        let mut wrapped = wrap_single_line(&line, width);
        result.append(&mut wrapped);
        update_tracker_from_text(input_line, &mut tracker);
    }

    if result.is_empty() {
        vec![String::new()]
    } else {
        result
            .into_iter()
            .map(|line| line.trim_end().to_string())
            .collect()
    }
}

fn wrap_single_line(line: &str, width: usize) -> Vec<String> {
    if line.is_empty() {
        return vec![String::new()];
    }

    let line_width = visible_width(line);
    if line_width <= width {
        return vec![line.to_string()];
    }

    let tokens = split_into_tokens_with_ansi(line);
    let mut tracker = AnsiCodeTracker::default();
    let mut wrapped = Vec::new();

    let mut current_line = String::new();
    let mut current_width = 0;

    for token in tokens {
        let token_width = visible_width(&token);
        let is_whitespace = token.trim().is_empty();

        if token_width > width && !is_whitespace {
            if !current_line.is_empty() {
                let mut line_to_wrap = current_line.trim_end().to_string();
                let reset = tracker.line_end_reset();
                if !reset.is_empty() {
                    line_to_wrap.push_str(&reset);
                }
                wrapped.push(line_to_wrap);
                current_line.clear();
                current_width = 0;
            }

            let broken = break_long_word(&token, width, &mut tracker);
            if let Some((last, rest)) = broken.split_last() {
                wrapped.extend_from_slice(rest);
                current_line = last.clone();
                current_width = visible_width(&current_line);
            }
            continue;
        }

        let total_needed = current_width + token_width;
        if total_needed > width && current_width > 0 {
            let mut line_to_wrap = current_line.trim_end().to_string();
            let reset = tracker.line_end_reset();
            if !reset.is_empty() {
                line_to_wrap.push_str(&reset);
            }
            wrapped.push(line_to_wrap);

            if is_whitespace {
                current_line = tracker.active_codes();
                current_width = 0;
            } else {
                current_line = tracker.active_codes();
                current_line.push_str(&token);
                current_width = token_width;
            }
        } else {
            current_line.push_str(&token);
            current_width += token_width;
        }

        update_tracker_from_text(&token, &mut tracker);
    }

    if !current_line.is_empty() {
        wrapped.push(current_line);
    }

    wrapped
}

fn split_into_tokens_with_ansi(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut pending_ansi = String::new();
    let mut in_whitespace = false;
    let mut idx = 0;

    while idx < text.len() {
        if let Some(ansi) = extract_ansi_code(text, idx) {
            pending_ansi.push_str(&ansi.code);
            idx += ansi.length;
            continue;
        }

        let Some(ch) = text[idx..].chars().next() else {
            break;
        };
        let is_space = ch == ' ';

        if is_space != in_whitespace && !current.is_empty() {
            tokens.push(current);
            current = String::new();
        }

        if !pending_ansi.is_empty() {
            current.push_str(&pending_ansi);
            pending_ansi.clear();
        }

        in_whitespace = is_space;
        current.push(ch);
        idx += ch.len_utf8();
    }

    if !pending_ansi.is_empty() {
        current.push_str(&pending_ansi);
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

fn break_long_word(word: &str, width: usize, tracker: &mut AnsiCodeTracker) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_line = tracker.active_codes();
    let mut current_width = 0;
    let mut idx = 0;

    while idx < word.len() {
        if let Some(ansi) = extract_ansi_code(word, idx) {
            current_line.push_str(&ansi.code);
            tracker.process(&ansi.code);
            idx += ansi.length;
            continue;
        }

        let text_end = next_ansi_or_end(word, idx);
        for grapheme in word[idx..text_end].graphemes(true) {
            let width_g = grapheme_width(grapheme);
            if current_width + width_g > width {
                let reset = tracker.line_end_reset();
                if !reset.is_empty() {
                    current_line.push_str(&reset);
                }
                lines.push(current_line);
                current_line = tracker.active_codes();
                current_width = 0;
            }

            current_line.push_str(grapheme);
            current_width += width_g;
        }
        idx = text_end;
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        vec![String::new()]
    } else {
        lines
    }
}

fn update_tracker_from_text(text: &str, tracker: &mut AnsiCodeTracker) {
    let mut idx = 0;
    while idx < text.len() {
        if let Some(ansi) = extract_ansi_code(text, idx) {
            tracker.process(&ansi.code);
            idx += ansi.length;
        } else {
            let Some(ch) = text[idx..].chars().next() else {
                break;
            };
            idx += ch.len_utf8();
        }
    }
}

fn next_ansi_or_end(line: &str, mut idx: usize) -> usize {
    while idx < line.len() {
        if extract_ansi_code(line, idx).is_some() {
            break;
        }
        let Some(ch) = line[idx..].chars().next() else {
            break;
        };
        idx += ch.len_utf8();
    }
    idx
}
