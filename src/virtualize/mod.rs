//! Height caching, offset layout, and scroll pinning for long transcripts.

pub mod autoscroll;
pub mod height_cache;
pub mod layout;

pub use autoscroll::{bottom_scroll_top, AutoScroll, NEAR_BOTTOM_ROWS, NEAR_BOTTOM_STICK_ROWS};
pub use height_cache::{
    HeightCache, ESTIMATED_CHUNK_HEIGHT, HEIGHT_DELTA_THRESHOLD, MAX_RELAYOUT_PASSES,
};
pub use layout::{Layout, OVERSCAN_COUNT};
