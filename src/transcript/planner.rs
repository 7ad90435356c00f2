//! Chunk planning heuristics.
//!
//! Long messages are split into chunks so each can be rendered and
//! measured independently. Slices are contiguous and non-overlapping;
//! boundaries are chosen so a fenced code block or a reasoning wrapper is
//! never cut in half.

use super::chunk::{Chunk, ChunkId};
use super::message::{Message, Role};

/// Target slice size for raw user text.
pub const USER_CHUNK_CHARS: usize = 1000;
/// Target slice size for assistant markup.
pub const RENDERED_CHUNK_CHARS: usize = 2000;
/// A split is skipped when it would leave a slice shorter than this.
pub const MIN_CHUNK_LEN: usize = 50;
/// Interior slices whose trimmed text is shorter than this are dropped.
/// The first and last slices always survive; the last one carries the
/// tail of the answer and any images.
const DROP_BELOW_TRIMMED: usize = 10;

const REASONING_OPEN: &str = "<think>";
const REASONING_CLOSE: &str = "</think>";

pub fn plan_chunks(message: &Message) -> Vec<Chunk> {
    let slices = match message.role {
        Role::User => plan_user(&message.text),
        Role::Assistant => plan_assistant(&message.text),
    };

    let last_index = slices.len().saturating_sub(1);
    let kept: Vec<String> = slices
        .into_iter()
        .enumerate()
        .filter(|(index, slice)| {
            *index == 0
                || *index == last_index
                || slice.trim().chars().count() >= DROP_BELOW_TRIMMED
        })
        .map(|(_, slice)| slice)
        .collect();

    let kept = if kept.is_empty() {
        vec![String::new()]
    } else {
        kept
    };

    let last = kept.len() - 1;
    kept.into_iter()
        .enumerate()
        .map(|(index, text)| {
            let mut chunk = Chunk::new(
                ChunkId {
                    message: message.id,
                    index,
                },
                message.role,
                text,
            );
            if index == last {
                chunk.is_last = true;
                chunk.image_urls = message.image_urls.clone();
            }
            chunk
        })
        .collect()
}

/// User text: even slices of roughly [`USER_CHUNK_CHARS`] bytes.
fn plan_user(text: &str) -> Vec<String> {
    let len = text.len();
    let count = div_ceil(len, USER_CHUNK_CHARS).max(1);
    if count == 1 {
        return vec![text.to_string()];
    }

    let size = div_ceil(len, count);
    let mut slices = Vec::with_capacity(count);
    let mut start = 0;
    while start < len {
        let end = snap_to_char_boundary(text, (start + size).min(len));
        if end <= start {
            break;
        }
        slices.push(text[start..end].to_string());
        start = end;
    }
    slices
}

/// Assistant markup: the reasoning wrapper is its own first slice, then
/// the answer is split at safe boundaries.
fn plan_assistant(text: &str) -> Vec<String> {
    let mut slices = Vec::new();
    let body = match split_reasoning_prefix(text) {
        Some((wrapper, rest)) => {
            slices.push(wrapper.to_string());
            rest
        }
        None => text,
    };

    if body.is_empty() {
        return slices;
    }
    slices.extend(plan_body(body));
    slices
}

fn plan_body(text: &str) -> Vec<String> {
    let len = text.len();
    let fences = fence_intervals(text);
    let count = if fences.is_empty() {
        div_ceil(len, RENDERED_CHUNK_CHARS).max(1)
    } else {
        fences.len().max(1)
    };

    if count == 1 {
        return vec![text.to_string()];
    }

    let ideal = len / count;
    let mut slices = Vec::with_capacity(count);
    let mut start = 0;

    for i in 1..count {
        let target = snap_to_char_boundary(text, (i * ideal).min(len));
        let split = find_split_position(text, start, target, &fences);
        if split <= start {
            continue;
        }
        if split - start < MIN_CHUNK_LEN || len - split < MIN_CHUNK_LEN {
            continue;
        }
        slices.push(text[start..split].to_string());
        start = split;
    }

    slices.push(text[start..].to_string());
    slices
}

/// Best split at or before `target`, never inside a fenced block.
///
/// Preference order: end of the enclosing fence, paragraph break, sentence
/// end, word boundary, then the raw target position.
fn find_split_position(text: &str, start: usize, target: usize, fences: &[(usize, usize)]) -> usize {
    let target = snap_to_char_boundary(text, target.min(text.len()));
    if target <= start {
        return start;
    }

    if let Some(&(_, fence_end)) = fences
        .iter()
        .find(|(fence_start, fence_end)| target > *fence_start && target < *fence_end)
    {
        return fence_end.min(text.len());
    }

    let window = &text[start..target];
    let candidate = if let Some(idx) = window.rfind("\n\n") {
        start + idx + 2
    } else if let Some(idx) = window.rfind(". ") {
        start + idx + 2
    } else if let Some(idx) = window.rfind('。') {
        start + idx + '。'.len_utf8()
    } else if let Some(idx) = window.rfind(' ') {
        start + idx + 1
    } else {
        target
    };

    if let Some(&(_, fence_end)) = fences
        .iter()
        .find(|(fence_start, fence_end)| candidate > *fence_start && candidate < *fence_end)
    {
        return fence_end.min(text.len());
    }
    candidate
}

/// Byte ranges of fenced code blocks, inclusive of both fence lines.
/// An unterminated fence runs to the end of the text.
pub fn fence_intervals(text: &str) -> Vec<(usize, usize)> {
    let mut intervals = Vec::new();
    let mut open: Option<usize> = None;
    let mut pos = 0;

    for line in text.split_inclusive('\n') {
        if line.trim_start().starts_with("```") {
            match open {
                None => open = Some(pos),
                Some(fence_start) => {
                    intervals.push((fence_start, pos + line.len()));
                    open = None;
                }
            }
        }
        pos += line.len();
    }

    if let Some(fence_start) = open {
        intervals.push((fence_start, text.len()));
    }
    intervals
}

fn split_reasoning_prefix(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix(REASONING_OPEN)?;
    match rest.find(REASONING_CLOSE) {
        Some(idx) => {
            let end = REASONING_OPEN.len() + idx + REASONING_CLOSE.len();
            Some((&text[..end], &text[end..]))
        }
        None => Some((text, "")),
    }
}

fn snap_to_char_boundary(text: &str, mut idx: usize) -> usize {
    idx = idx.min(text.len());
    while idx > 0 && !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn div_ceil(value: usize, divisor: usize) -> usize {
    value.div_ceil(divisor.max(1))
}

#[cfg(test)]
mod tests {
    use super::{fence_intervals, plan_chunks, RENDERED_CHUNK_CHARS};
    use crate::transcript::message::Message;

    fn sentences(total_len: usize) -> String {
        let sentence = "The quick brown fox jumps over the lazy dog. ";
        let mut text = String::new();
        while text.len() < total_len {
            text.push_str(sentence);
        }
        text.truncate(total_len);
        text
    }

    #[test]
    fn short_messages_stay_whole() {
        let chunks = plan_chunks(&Message::assistant(1, "hello there"));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "hello there");
        assert!(chunks[0].is_last);
    }

    #[test]
    fn long_assistant_text_splits_into_two() {
        let text = sentences(2500);
        assert!(text.len() > RENDERED_CHUNK_CHARS);
        let chunks = plan_chunks(&Message::assistant(1, text.clone()));
        assert_eq!(chunks.len(), 2);
        let rebuilt: String = chunks.iter().map(|chunk| chunk.text.as_str()).collect();
        assert_eq!(rebuilt, text);
        assert!(!chunks[0].is_last);
        assert!(chunks[1].is_last);
    }

    #[test]
    fn slices_do_not_overlap_and_cover_source() {
        let text = sentences(6000);
        let chunks = plan_chunks(&Message::assistant(1, text.clone()));
        assert!(chunks.len() >= 3);
        let rebuilt: String = chunks.iter().map(|chunk| chunk.text.as_str()).collect();
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn user_text_splits_every_thousand_bytes() {
        let text = sentences(1500);
        let chunks = plan_chunks(&Message::user(1, text.clone()));
        assert_eq!(chunks.len(), 2);
        let rebuilt: String = chunks.iter().map(|chunk| chunk.text.as_str()).collect();
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn fenced_blocks_are_never_split() {
        let mut text = sentences(1800);
        text.push_str("\n```rust\n");
        for _ in 0..40 {
            text.push_str("let value = compute(value);\n");
        }
        text.push_str("```\n");
        text.push_str(&sentences(1800));

        let chunks = plan_chunks(&Message::assistant(1, text.clone()));
        let fences = fence_intervals(&text);
        assert_eq!(fences.len(), 1);
        let (fence_start, fence_end) = fences[0];

        let mut offset = 0;
        for chunk in &chunks[..chunks.len() - 1] {
            offset += chunk.text.len();
            assert!(
                offset <= fence_start || offset >= fence_end,
                "chunk boundary {offset} falls inside fence {fence_start}..{fence_end}"
            );
        }
    }

    #[test]
    fn one_chunk_per_code_block() {
        let block = "```\ncode\n```\n";
        let text = format!("{}\n{}{}\n{}", sentences(200), block, sentences(200), block);
        let chunks = plan_chunks(&Message::assistant(1, text));
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn mid_line_backticks_are_not_a_fence() {
        // An opener glued to the end of a prose line is inline code, not a
        // fence; only the line-start closer is seen and it opens a new one.
        let text = format!("{}```\ncode\n```\nmore", sentences(200));
        let fences = fence_intervals(&text);
        assert_eq!(fences.len(), 1);
        assert_eq!(fences[0], (209, text.len()));
    }

    #[test]
    fn short_answer_after_reasoning_is_kept() {
        let chunks = plan_chunks(&Message::assistant(1, "<think>think1</think>ans"));
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "<think>think1</think>");
        assert_eq!(chunks[1].text, "ans");
        assert!(chunks[1].is_last);
    }

    #[test]
    fn reasoning_wrapper_is_its_own_chunk() {
        let text = format!("<think>planning the answer here</think>{}", sentences(120));
        let chunks = plan_chunks(&Message::assistant(1, text));
        assert_eq!(chunks[0].text, "<think>planning the answer here</think>");
        assert!(chunks[1].text.starts_with("The quick"));
    }

    #[test]
    fn images_attach_to_final_chunk() {
        let message = Message::assistant(1, sentences(2500))
            .with_images(vec!["https://example.com/a.png".to_owned()]);
        let chunks = plan_chunks(&message);
        assert!(chunks[0].image_urls.is_empty());
        assert_eq!(
            chunks.last().unwrap().image_urls,
            vec!["https://example.com/a.png".to_owned()]
        );
    }

    #[test]
    fn multibyte_text_splits_on_char_boundaries() {
        let text = "你好。".repeat(300);
        let chunks = plan_chunks(&Message::assistant(1, text.clone()));
        let rebuilt: String = chunks.iter().map(|chunk| chunk.text.as_str()).collect();
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn unterminated_fence_extends_to_end() {
        let text = "before\n```\nunterminated";
        let fences = fence_intervals(text);
        assert_eq!(fences, vec![(7, text.len())]);
    }
}
