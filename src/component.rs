//! Renderable component contract.

/// Anything that can render itself to a list of terminal lines.
pub trait Component {
    /// Render to a list of lines at the given width.
    ///
    /// The returned line count is the component's height in rows; callers
    /// measure it and must never receive a line wider than `width`.
    fn render(&mut self, width: usize) -> Vec<String>;

    /// Invalidate any cached state.
    fn invalidate(&mut self) {}
}
