//! Streaming chat transcript rendering for the terminal.
//!
//! The pipeline runs in stages: raw message text is formatted through the
//! markup renderer ([`markup`]), long messages are sliced into
//! independently measurable chunks ([`transcript`]), and a virtualized
//! view ([`widgets::TranscriptView`]) renders only the chunks near the
//! viewport while cached heights keep the scroll geometry stable
//! ([`virtualize`]).
//!
//! # Public API Overview
//! - Format markup with [`markup::format_markup`] or drive a
//!   [`MarkupRenderer`] directly.
//! - Plan chunks with [`transcript::plan_chunks`].
//! - Compose everything through [`TranscriptView`].

pub mod component;
pub mod config;
pub mod markup;
pub mod text;
pub mod transcript;
pub mod virtualize;
pub mod widgets;

pub use crate::component::Component;
pub use crate::config::EnvConfig;
pub use crate::markup::{
    format_markup, highlight_code_block, normalize_math_delimiters, split_reasoning,
    MarkupRenderer, MarkupTheme, MathTypesetFn,
};
pub use crate::transcript::{plan_chunks, Chunk, ChunkId, Message, MessageId, Role};
pub use crate::virtualize::{AutoScroll, HeightCache, Layout};
pub use crate::widgets::TranscriptView;

/// ANSI-aware wrapping helper.
pub use crate::text::wrap::wrap_text_with_ansi;
/// Visible width helper that ignores ANSI control sequences.
pub use crate::text::width::visible_width;
