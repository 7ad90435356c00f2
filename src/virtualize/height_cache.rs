//! Measured chunk heights with batched updates.

use std::collections::HashMap;

use crate::transcript::chunk::ChunkId;

/// Height assumed for a chunk that has never been measured, in rows.
pub const ESTIMATED_CHUNK_HEIGHT: usize = 6;
/// Measurements within this many rows of the cached value are ignored.
pub const HEIGHT_DELTA_THRESHOLD: usize = 1;
/// Upper bound on measure/relayout passes within one layout cycle.
pub const MAX_RELAYOUT_PASSES: usize = 8;

/// Chunk heights, split into an applied map and a pending batch.
///
/// Measurements accumulate in the batch; [`HeightCache::flush`] applies
/// them all at once so offsets shift a single time per pass instead of
/// once per chunk.
#[derive(Debug, Default)]
pub struct HeightCache {
    applied: HashMap<ChunkId, usize>,
    pending: HashMap<ChunkId, usize>,
}

impl HeightCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applied height, or the estimate for unmeasured chunks.
    pub fn height_of(&self, id: ChunkId) -> usize {
        self.applied
            .get(&id)
            .copied()
            .unwrap_or(ESTIMATED_CHUNK_HEIGHT)
    }

    pub fn is_measured(&self, id: ChunkId) -> bool {
        self.applied.contains_key(&id)
    }

    /// Queue a measurement. First-time measurements always land in the
    /// batch; re-measurements only when they move by more than the
    /// threshold.
    pub fn record(&mut self, id: ChunkId, height: usize) {
        let height = height.max(1);
        match self.applied.get(&id) {
            Some(&current) => {
                if current.abs_diff(height) > HEIGHT_DELTA_THRESHOLD {
                    self.pending.insert(id, height);
                } else {
                    self.pending.remove(&id);
                }
            }
            None => {
                self.pending.insert(id, height);
            }
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Apply the pending batch; returns whether any height changed.
    pub fn flush(&mut self) -> bool {
        if self.pending.is_empty() {
            return false;
        }
        for (id, height) in self.pending.drain() {
            self.applied.insert(id, height);
        }
        true
    }

    /// Drop every measurement; used when the viewport width changes and
    /// all line wraps move.
    pub fn invalidate_all(&mut self) {
        self.applied.clear();
        self.pending.clear();
    }

    /// Drop measurements for one message's chunks, e.g. when its text is
    /// still streaming in.
    pub fn invalidate_message(&mut self, message: crate::transcript::message::MessageId) {
        self.applied.retain(|id, _| id.message != message);
        self.pending.retain(|id, _| id.message != message);
    }
}

#[cfg(test)]
mod tests {
    use super::{HeightCache, ESTIMATED_CHUNK_HEIGHT, HEIGHT_DELTA_THRESHOLD};
    use crate::transcript::chunk::ChunkId;

    fn id(message: u64, index: usize) -> ChunkId {
        ChunkId { message, index }
    }

    #[test]
    fn unmeasured_chunks_use_the_estimate() {
        let cache = HeightCache::new();
        assert_eq!(cache.height_of(id(1, 0)), ESTIMATED_CHUNK_HEIGHT);
    }

    #[test]
    fn first_measurement_applies_after_flush() {
        let mut cache = HeightCache::new();
        cache.record(id(1, 0), 9);
        assert_eq!(cache.height_of(id(1, 0)), ESTIMATED_CHUNK_HEIGHT);
        assert!(cache.flush());
        assert_eq!(cache.height_of(id(1, 0)), 9);
    }

    #[test]
    fn tiny_deltas_are_ignored() {
        let mut cache = HeightCache::new();
        cache.record(id(1, 0), 9);
        cache.flush();
        cache.record(id(1, 0), 9 + HEIGHT_DELTA_THRESHOLD);
        assert!(!cache.flush());
        assert_eq!(cache.height_of(id(1, 0)), 9);
    }

    #[test]
    fn larger_deltas_apply() {
        let mut cache = HeightCache::new();
        cache.record(id(1, 0), 9);
        cache.flush();
        cache.record(id(1, 0), 14);
        assert!(cache.flush());
        assert_eq!(cache.height_of(id(1, 0)), 14);
    }

    #[test]
    fn invalidating_a_message_keeps_other_messages() {
        let mut cache = HeightCache::new();
        cache.record(id(1, 0), 9);
        cache.record(id(2, 0), 4);
        cache.flush();
        cache.invalidate_message(1);
        assert_eq!(cache.height_of(id(1, 0)), ESTIMATED_CHUNK_HEIGHT);
        assert_eq!(cache.height_of(id(2, 0)), 4);
    }

    #[test]
    fn width_change_invalidates_everything() {
        let mut cache = HeightCache::new();
        cache.record(id(1, 0), 9);
        cache.flush();
        cache.invalidate_all();
        assert_eq!(cache.height_of(id(1, 0)), ESTIMATED_CHUNK_HEIGHT);
    }
}
