use std::time::Duration;

/// How long a transient error stays visible.
pub const ERROR_BANNER_TTL: Duration = Duration::from_millis(5000);

/// Transient error text with a generation stamp.
///
/// The generation lets a delayed clear task tell whether the banner it
/// scheduled against is still the one showing; a newer error keeps its own
/// full lifetime.
#[derive(Debug, Clone, Default)]
pub struct ErrorBanner {
    message: Option<String>,
    generation: u64,
}

impl ErrorBanner {
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Show a new error; returns the generation to clear against.
    pub fn show(&mut self, message: impl Into<String>) -> u64 {
        self.generation += 1;
        self.message = Some(message.into());
        self.generation
    }

    /// Clear only if the banner still belongs to `generation`.
    pub fn clear_if_current(&mut self, generation: u64) -> bool {
        if self.generation == generation && self.message.is_some() {
            self.message = None;
            return true;
        }
        false
    }

    pub fn clear(&mut self) {
        self.message = None;
    }
}
