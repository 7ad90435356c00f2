//! Near-bottom scroll pinning.

/// A released pin re-engages when a scroll lands within this many rows of
/// the bottom.
pub const NEAR_BOTTOM_ROWS: usize = 4;
/// An engaged pin survives until the reader scrolls further than this from
/// the bottom.
pub const NEAR_BOTTOM_STICK_ROWS: usize = 6;

pub fn bottom_scroll_top(total_height: usize, viewport_rows: usize) -> usize {
    total_height.saturating_sub(viewport_rows)
}

fn distance_from_bottom(scroll_top: usize, viewport_rows: usize, total_height: usize) -> usize {
    total_height.saturating_sub(scroll_top + viewport_rows)
}

/// Keeps the view glued to the newest content while the reader stays near
/// the bottom, and releases the pin the moment they scroll up to read.
#[derive(Debug)]
pub struct AutoScroll {
    pinned: bool,
}

impl Default for AutoScroll {
    fn default() -> Self {
        Self { pinned: true }
    }
}

impl AutoScroll {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    /// Reader-initiated scroll: re-evaluate the pin with hysteresis. An
    /// engaged pin holds out to the stick distance; a released one only
    /// re-engages within the tighter near-bottom distance.
    pub fn on_user_scroll(&mut self, scroll_top: usize, viewport_rows: usize, total_height: usize) {
        let distance = distance_from_bottom(scroll_top, viewport_rows, total_height);
        self.pinned = if self.pinned {
            distance <= NEAR_BOTTOM_STICK_ROWS
        } else {
            distance <= NEAR_BOTTOM_ROWS
        };
    }

    /// Content grew or heights settled: returns the bottom scroll position
    /// while the pin is engaged. A reader who scrolled away is never
    /// dragged back down.
    pub fn on_content_change(&self, viewport_rows: usize, total_height: usize) -> Option<usize> {
        self.pinned
            .then(|| bottom_scroll_top(total_height, viewport_rows))
    }

    /// Explicit jump to the newest content, re-engaging the pin.
    pub fn scroll_to_bottom(&mut self, viewport_rows: usize, total_height: usize) -> usize {
        self.pinned = true;
        bottom_scroll_top(total_height, viewport_rows)
    }
}

#[cfg(test)]
mod tests {
    use super::{bottom_scroll_top, AutoScroll, NEAR_BOTTOM_ROWS, NEAR_BOTTOM_STICK_ROWS};

    #[test]
    fn starts_pinned_and_follows_growth() {
        let scroll = AutoScroll::new();
        assert!(scroll.is_pinned());
        assert_eq!(scroll.on_content_change(20, 100), Some(80));
    }

    #[test]
    fn scrolling_up_releases_the_pin() {
        let mut scroll = AutoScroll::new();
        scroll.on_user_scroll(10, 20, 100);
        assert!(!scroll.is_pinned());
        assert_eq!(scroll.on_content_change(20, 120), None);
    }

    #[test]
    fn unpinned_reader_near_bottom_is_not_dragged_down() {
        let mut scroll = AutoScroll::new();
        scroll.on_user_scroll(0, 20, 100);
        assert!(!scroll.is_pinned());
        // Six rows out is close, but not close enough to re-engage.
        scroll.on_user_scroll(100 - 20 - NEAR_BOTTOM_STICK_ROWS, 20, 100);
        assert!(!scroll.is_pinned());
        assert_eq!(scroll.on_content_change(20, 140), None);
    }

    #[test]
    fn engaged_pin_holds_out_to_the_stick_distance() {
        let mut scroll = AutoScroll::new();
        scroll.on_user_scroll(100 - 20 - NEAR_BOTTOM_STICK_ROWS, 20, 100);
        assert!(scroll.is_pinned());
        scroll.on_user_scroll(100 - 20 - NEAR_BOTTOM_STICK_ROWS - 1, 20, 100);
        assert!(!scroll.is_pinned());
    }

    #[test]
    fn scrolling_back_near_bottom_re_pins() {
        let mut scroll = AutoScroll::new();
        scroll.on_user_scroll(0, 20, 100);
        assert!(!scroll.is_pinned());
        scroll.on_user_scroll(100 - 20 - NEAR_BOTTOM_ROWS, 20, 100);
        assert!(scroll.is_pinned());
    }

    #[test]
    fn explicit_jump_re_engages_pin() {
        let mut scroll = AutoScroll::new();
        scroll.on_user_scroll(0, 20, 100);
        assert_eq!(scroll.scroll_to_bottom(20, 100), 80);
        assert!(scroll.is_pinned());
    }

    #[test]
    fn bottom_position_saturates_for_short_content() {
        assert_eq!(bottom_scroll_top(5, 20), 0);
    }
}
