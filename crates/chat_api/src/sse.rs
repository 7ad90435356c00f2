use serde_json::Value;
use tracing::warn;

use crate::events::ChatStreamEvent;

/// Incremental parser for chat-completion SSE streams.
///
/// Feeds split on newline boundaries; an incomplete trailing line is kept in
/// the buffer until more bytes arrive. Frames whose payload fails to parse
/// as JSON are skipped and logged, never aborting the stream.
#[derive(Debug, Default)]
pub struct SseStreamParser {
    buffer: String,
}

impl SseStreamParser {
    /// Feed arbitrary bytes into the parser and drain complete events.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<ChatStreamEvent> {
        self.buffer.push_str(&String::from_utf8_lossy(bytes));
        let mut events = Vec::new();

        while let Some(split) = self.buffer.find('\n') {
            let line = self.buffer[..split].to_string();
            self.buffer.drain(0..split + 1);

            let trimmed = line.trim();
            let Some(payload) = trimmed.strip_prefix("data:").map(str::trim) else {
                continue;
            };
            if payload.is_empty() {
                continue;
            }
            if payload == "[DONE]" {
                events.push(ChatStreamEvent::Done);
                continue;
            }

            match serde_json::from_str::<Value>(payload) {
                Ok(value) => events.extend(map_deltas(&value)),
                Err(error) => {
                    warn!(%error, "skipping malformed stream frame");
                }
            }
        }

        events
    }

    /// Parse a complete SSE payload string in one shot.
    pub fn parse_frames(input: &str) -> Vec<ChatStreamEvent> {
        let mut parser = Self::default();
        parser.feed(input.as_bytes())
    }

    pub fn is_empty_buffer(&self) -> bool {
        self.buffer.trim().is_empty()
    }
}

fn map_deltas(value: &Value) -> Vec<ChatStreamEvent> {
    let delta = value
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("delta"));
    let Some(delta) = delta else {
        return Vec::new();
    };

    let mut events = Vec::new();
    if let Some(reasoning) = non_empty_str(delta.get("reasoning_content")) {
        events.push(ChatStreamEvent::ReasoningDelta {
            delta: reasoning.to_owned(),
        });
    }
    if let Some(content) = non_empty_str(delta.get("content")) {
        events.push(ChatStreamEvent::ContentDelta {
            delta: content.to_owned(),
        });
    }
    events
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
}
