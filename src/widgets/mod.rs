//! Transcript widgets.

pub mod transcript;

pub use transcript::TranscriptView;
