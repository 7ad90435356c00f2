use crate::events::ChatStreamEvent;

/// Opening marker of the synthetic reasoning wrapper.
pub const REASONING_OPEN: &str = "<think>";
/// Closing marker of the synthetic reasoning wrapper.
pub const REASONING_CLOSE: &str = "</think>";

/// Merges reasoning/content deltas into a single phase-ordered buffer.
///
/// The first reasoning delta opens the wrapper by appending the open tag,
/// the delta text, and the close tag. Each later reasoning delta that
/// arrives before any content removes the trailing close tag, appends its
/// text, and re-closes — the wrapper is reopened by truncation, never
/// nested. The first content delta seals the wrapper; content is appended
/// verbatim after it, and any reasoning delta arriving after that point is
/// dropped. The output therefore holds at most one open/close marker pair
/// with all reasoning text between them and all content text after them.
#[derive(Debug, Default)]
pub struct StreamAssembler {
    assembled: String,
    reasoning_opened: bool,
    reasoning_sealed: bool,
    phase_steps: u32,
}

impl StreamAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one stream event; returns whether the assembled text changed.
    pub fn apply(&mut self, event: &ChatStreamEvent) -> bool {
        match event {
            ChatStreamEvent::ReasoningDelta { delta } => self.apply_reasoning(delta),
            ChatStreamEvent::ContentDelta { delta } => self.apply_content(delta),
            ChatStreamEvent::Done => false,
        }
    }

    fn apply_reasoning(&mut self, delta: &str) -> bool {
        if delta.is_empty() || self.reasoning_sealed {
            return false;
        }
        self.phase_steps += 1;

        if !self.reasoning_opened {
            self.assembled.push_str(REASONING_OPEN);
            self.assembled.push_str(delta);
            self.assembled.push_str(REASONING_CLOSE);
            self.reasoning_opened = true;
            return true;
        }

        // Reopen by truncating the trailing close tag.
        let new_len = self.assembled.len().saturating_sub(REASONING_CLOSE.len());
        self.assembled.truncate(new_len);
        self.assembled.push_str(delta);
        self.assembled.push_str(REASONING_CLOSE);
        true
    }

    fn apply_content(&mut self, delta: &str) -> bool {
        if delta.is_empty() {
            return false;
        }
        if self.reasoning_opened {
            self.reasoning_sealed = true;
        }
        self.assembled.push_str(delta);
        self.phase_steps += 1;
        true
    }

    pub fn text(&self) -> &str {
        &self.assembled
    }

    pub fn into_text(self) -> String {
        self.assembled
    }

    pub fn reasoning_opened(&self) -> bool {
        self.reasoning_opened
    }

    pub fn reasoning_sealed(&self) -> bool {
        self.reasoning_sealed
    }

    /// Thinking-only early-termination test, evaluated after applying
    /// `event`: true once the close marker has appeared for good. A content
    /// delta spelling it out is always final; otherwise the marker counts
    /// only from the second applied delta onward, so the re-closed tag of
    /// a lone opening reasoning delta does not trip it.
    pub fn close_marker_is_final(&self, event: &ChatStreamEvent) -> bool {
        if let ChatStreamEvent::ContentDelta { delta } = event {
            if delta.contains(REASONING_CLOSE) {
                return true;
            }
        }
        self.phase_steps > 1 && self.assembled.contains(REASONING_CLOSE)
    }
}
