//! Transport-only chat-completion client primitives.
//!
//! This crate owns request building, SSE frame parsing, and delta assembly
//! for the chat-completion streaming convention (newline-framed
//! `data: <json>` lines terminated by `data: [DONE]`). It intentionally contains no auth/login
//! code and no runtime UI coupling.
//!
//! Stream reassembly distinguishes visible answer text
//! (`choices[0].delta.content`) from hidden deliberation
//! (`choices[0].delta.reasoning_content`); the assembler merges both into a
//! single phase-ordered buffer with at most one `<think>…</think>` wrapper.

pub mod assemble;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod headers;
pub mod payload;
pub mod policy;
pub mod retry;
pub mod sse;
pub mod url;

pub use assemble::{StreamAssembler, REASONING_CLOSE, REASONING_OPEN};
pub use client::{CancellationSignal, ChatApiClient, StreamOutcome};
pub use config::ChatApiConfig;
pub use error::ChatApiError;
pub use events::ChatStreamEvent;
pub use payload::{
    ChatMessage, ChatRequest, ContentPart, ImageSize, ImagesRequest, MessageContent,
};
pub use policy::supports_image_input;
pub use sse::SseStreamParser;
pub use url::{normalize_chat_url, normalize_images_url};
