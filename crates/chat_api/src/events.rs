use serde::{Deserialize, Serialize};

/// Stream event emitted by the parser after normalization.
///
/// A single frame can carry both a reasoning and a content delta; the parser
/// emits the reasoning event first so callers observe deltas in the order
/// the model produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChatStreamEvent {
    /// Visible answer text from `choices[0].delta.content`.
    #[serde(rename = "content.delta")]
    ContentDelta { delta: String },
    /// Hidden deliberation text from `choices[0].delta.reasoning_content`.
    #[serde(rename = "reasoning.delta")]
    ReasoningDelta { delta: String },
    /// The literal `[DONE]` sentinel frame.
    #[serde(rename = "done")]
    Done,
}
