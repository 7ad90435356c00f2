//! Conversation orchestration on top of the transport crate.
//!
//! A [`ChatSession`] owns the message history and drives streaming sends:
//! each send gets its own cancellation signal, streamed text lands in the
//! transcript as it arrives, and failures surface as a transient banner
//! that clears itself.

mod banner;
mod session;

pub use banner::{ErrorBanner, ERROR_BANNER_TTL};
pub use session::{ChatSession, SessionConfig, SessionState, SharedState};
