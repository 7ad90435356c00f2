//! ANSI-safe text measurement and wrapping.

pub mod ansi;
pub mod width;
pub mod wrap;

pub use ansi::{extract_ansi_code, AnsiCode, AnsiCodeKind, AnsiCodeTracker};
pub use width::{grapheme_width, visible_width};
pub use wrap::wrap_text_with_ansi;
