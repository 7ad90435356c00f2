//! Chunk offsets and the visible window.

use std::ops::Range;

use crate::transcript::chunk::ChunkId;
use crate::virtualize::height_cache::HeightCache;

/// Chunks rendered beyond each edge of the viewport.
pub const OVERSCAN_COUNT: usize = 3;

/// Top offsets and total height for an ordered chunk list, produced by a
/// single forward pass over the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    offsets: Vec<usize>,
    total_height: usize,
}

impl Layout {
    pub fn compute(ids: &[ChunkId], cache: &HeightCache) -> Self {
        let mut offsets = Vec::with_capacity(ids.len());
        let mut cursor = 0;
        for id in ids {
            offsets.push(cursor);
            cursor += cache.height_of(*id);
        }
        Self {
            offsets,
            total_height: cursor,
        }
    }

    pub fn total_height(&self) -> usize {
        self.total_height
    }

    pub fn offset_of(&self, index: usize) -> Option<usize> {
        self.offsets.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Index range of chunks intersecting the viewport, widened by
    /// [`OVERSCAN_COUNT`] on each side.
    pub fn visible_range(
        &self,
        scroll_top: usize,
        viewport_rows: usize,
        cache: &HeightCache,
        ids: &[ChunkId],
    ) -> Range<usize> {
        if self.offsets.is_empty() {
            return 0..0;
        }

        let viewport_end = scroll_top + viewport_rows;
        let mut first = None;
        let mut last = 0;

        for (index, &top) in self.offsets.iter().enumerate() {
            let height = ids.get(index).map(|id| cache.height_of(*id)).unwrap_or(0);
            let bottom = top + height;
            if bottom > scroll_top && top < viewport_end {
                if first.is_none() {
                    first = Some(index);
                }
                last = index;
            }
            if top >= viewport_end {
                break;
            }
        }

        let Some(first) = first else {
            // Scrolled past the end; show the tail.
            let end = self.offsets.len();
            return end.saturating_sub(1)..end;
        };

        let start = first.saturating_sub(OVERSCAN_COUNT);
        let end = (last + 1 + OVERSCAN_COUNT).min(self.offsets.len());
        start..end
    }
}
