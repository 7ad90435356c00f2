//! Conversation transcript model: messages and their planned chunks.

pub mod chunk;
pub mod message;
pub mod planner;

pub use chunk::{Chunk, ChunkId};
pub use message::{Message, MessageId, Role};
pub use planner::{plan_chunks, MIN_CHUNK_LEN, RENDERED_CHUNK_CHARS, USER_CHUNK_CHARS};
