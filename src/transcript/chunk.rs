//! Render units produced by the chunk planner.

use super::message::{MessageId, Role};

/// Stable identity of one chunk: owning message plus position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkId {
    pub message: MessageId,
    pub index: usize,
}

/// A contiguous slice of one message's text, rendered and measured
/// independently.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub id: ChunkId,
    pub role: Role,
    pub text: String,
    /// Set on the message's final chunk only.
    pub image_urls: Vec<String>,
    pub is_last: bool,
}

impl Chunk {
    pub fn new(id: ChunkId, role: Role, text: impl Into<String>) -> Self {
        Self {
            id,
            role,
            text: text.into(),
            image_urls: Vec::new(),
            is_last: false,
        }
    }
}
