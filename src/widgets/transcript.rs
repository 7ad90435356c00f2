//! Virtualized transcript view.

use std::collections::HashMap;

use crate::component::Component;
use crate::markup::render::MarkupRenderer;
use crate::markup::split_reasoning;
use crate::markup::theme::MarkupTheme;
use crate::text::wrap::wrap_text_with_ansi;
use crate::transcript::chunk::{Chunk, ChunkId};
use crate::transcript::message::{Message, MessageId, Role};
use crate::transcript::planner::plan_chunks;
use crate::virtualize::autoscroll::AutoScroll;
use crate::virtualize::height_cache::{HeightCache, MAX_RELAYOUT_PASSES};
use crate::virtualize::layout::Layout;

pub type ThemeFactory = Box<dyn Fn() -> MarkupTheme>;

/// Scrollable conversation transcript.
///
/// Only chunks inside the overscan window are rendered; everything else
/// contributes its cached or estimated height to the scroll geometry.
/// Rendering runs a measure/relayout loop until heights stop moving or
/// the pass budget runs out.
pub struct TranscriptView {
    theme_factory: ThemeFactory,
    view_theme: MarkupTheme,
    messages: Vec<Message>,
    chunks: Vec<Chunk>,
    renderers: HashMap<ChunkId, MarkupRenderer>,
    cache: HeightCache,
    autoscroll: AutoScroll,
    scroll_top: usize,
    viewport_rows: usize,
    last_width: Option<usize>,
}

impl TranscriptView {
    pub fn new(theme_factory: ThemeFactory) -> Self {
        let view_theme = theme_factory();
        Self {
            theme_factory,
            view_theme,
            messages: Vec::new(),
            chunks: Vec::new(),
            renderers: HashMap::new(),
            cache: HeightCache::new(),
            autoscroll: AutoScroll::new(),
            scroll_top: 0,
            viewport_rows: 24,
            last_width: None,
        }
    }

    pub fn set_viewport_rows(&mut self, rows: usize) {
        self.viewport_rows = rows.max(1);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn scroll_top(&self) -> usize {
        self.scroll_top
    }

    pub fn push_message(&mut self, message: Message) {
        let planned = plan_chunks(&message);
        self.messages.push(message);
        self.chunks.extend(planned);
    }

    /// Replace a message's text while it streams in; its chunks are
    /// replanned and their measurements dropped.
    pub fn update_message_text(&mut self, id: MessageId, text: impl Into<String>) {
        let Some(message) = self.messages.iter_mut().find(|message| message.id == id) else {
            return;
        };
        message.text = text.into();
        let planned = plan_chunks(message);

        self.renderers.retain(|chunk_id, _| chunk_id.message != id);
        self.cache.invalidate_message(id);

        let insert_at = self
            .chunks
            .iter()
            .position(|chunk| chunk.id.message == id)
            .unwrap_or(self.chunks.len());
        self.chunks.retain(|chunk| chunk.id.message != id);
        self.chunks.splice(insert_at..insert_at, planned);
    }

    pub fn set_message_images(&mut self, id: MessageId, image_urls: Vec<String>) {
        let Some(message) = self.messages.iter_mut().find(|message| message.id == id) else {
            return;
        };
        message.image_urls = image_urls;
        let text = message.text.clone();
        self.update_message_text(id, text);
    }

    pub fn scroll_up(&mut self, rows: usize) {
        self.scroll_top = self.scroll_top.saturating_sub(rows);
        self.note_user_scroll();
    }

    pub fn scroll_down(&mut self, rows: usize) {
        self.scroll_top += rows;
        self.note_user_scroll();
    }

    pub fn scroll_to_bottom(&mut self) {
        let total = self.current_layout().total_height();
        self.scroll_top = self.autoscroll.scroll_to_bottom(self.viewport_rows, total);
    }

    pub fn is_pinned_to_bottom(&self) -> bool {
        self.autoscroll.is_pinned()
    }

    fn note_user_scroll(&mut self) {
        let total = self.current_layout().total_height();
        let bottom = crate::virtualize::autoscroll::bottom_scroll_top(total, self.viewport_rows);
        self.scroll_top = self.scroll_top.min(bottom);
        self.autoscroll
            .on_user_scroll(self.scroll_top, self.viewport_rows, total);
    }

    fn chunk_ids(&self) -> Vec<ChunkId> {
        self.chunks.iter().map(|chunk| chunk.id).collect()
    }

    fn current_layout(&self) -> Layout {
        Layout::compute(&self.chunk_ids(), &self.cache)
    }

    /// Produce a chunk's lines at the given width.
    fn chunk_lines(&mut self, chunk_index: usize, width: usize) -> Vec<String> {
        let chunk = self.chunks[chunk_index].clone();
        let mut lines = match chunk.role {
            Role::User => wrap_text_with_ansi(&chunk.text, width),
            Role::Assistant => self.assistant_chunk_lines(&chunk, width),
        };

        for url in &chunk.image_urls {
            lines.push((self.view_theme.link)(&format!("⟦image⟧ {url}")));
        }
        lines
    }

    fn assistant_chunk_lines(&mut self, chunk: &Chunk, width: usize) -> Vec<String> {
        let (reasoning, rest) = split_reasoning(&chunk.text);
        if let Some(reasoning) = reasoning {
            // A reasoning slice never carries answer text; the planner
            // keeps the wrapper whole.
            debug_assert!(rest.is_empty());
            let content_width = width.saturating_sub(2).max(1);
            let mut lines = Vec::new();
            for line in reasoning.trim().split('\n') {
                for wrapped in wrap_text_with_ansi(&(self.view_theme.italic)(line), content_width) {
                    lines.push(format!(
                        "{}{}",
                        (self.view_theme.quote_border)("│ "),
                        wrapped
                    ));
                }
            }
            if lines.is_empty() {
                lines.push((self.view_theme.quote_border)("│"));
            }
            return lines;
        }

        if !self.renderers.contains_key(&chunk.id) {
            let theme = (self.theme_factory)();
            self.renderers
                .insert(chunk.id, MarkupRenderer::new(chunk.text.clone(), theme));
        }
        match self.renderers.get_mut(&chunk.id) {
            Some(renderer) => renderer.render(width),
            None => wrap_text_with_ansi(&chunk.text, width),
        }
    }

    /// One measure/relayout cycle: render the visible window, record the
    /// real heights, and flush. Returns whether any height changed.
    fn measure_pass(&mut self, width: usize) -> bool {
        let ids = self.chunk_ids();
        let layout = Layout::compute(&ids, &self.cache);

        if let Some(target) = self
            .autoscroll
            .on_content_change(self.viewport_rows, layout.total_height())
        {
            self.scroll_top = target;
        }

        let range = layout.visible_range(self.scroll_top, self.viewport_rows, &self.cache, &ids);
        for index in range {
            let height = self.chunk_lines(index, width).len();
            self.cache.record(ids[index], height);
        }
        self.cache.flush()
    }
}

impl Component for TranscriptView {
    fn render(&mut self, width: usize) -> Vec<String> {
        let width = width.max(1);
        if self.last_width != Some(width) {
            self.cache.invalidate_all();
            for renderer in self.renderers.values_mut() {
                renderer.invalidate();
            }
            self.last_width = Some(width);
        }

        for _ in 0..MAX_RELAYOUT_PASSES {
            if !self.measure_pass(width) {
                break;
            }
        }

        let ids = self.chunk_ids();
        let layout = Layout::compute(&ids, &self.cache);
        let range = layout.visible_range(self.scroll_top, self.viewport_rows, &self.cache, &ids);

        let mut rows = vec![String::new(); self.viewport_rows];
        let viewport_end = self.scroll_top + self.viewport_rows;
        for index in range {
            let Some(top) = layout.offset_of(index) else {
                continue;
            };
            let lines = self.chunk_lines(index, width);
            for (line_idx, line) in lines.into_iter().enumerate() {
                let row = top + line_idx;
                if row < self.scroll_top || row >= viewport_end {
                    continue;
                }
                rows[row - self.scroll_top] = line;
            }
        }
        rows
    }

    fn invalidate(&mut self) {
        self.cache.invalidate_all();
        for renderer in self.renderers.values_mut() {
            renderer.invalidate();
        }
        self.last_width = None;
    }
}
