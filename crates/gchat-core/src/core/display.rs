//! Display surface written by the dispatcher.
//!
//! The dispatcher is the only writer. Front ends hold a
//! `tokio::sync::watch::Receiver<Display>` and render whatever the latest
//! snapshot contains.

use super::session::SessionStatus;

/// Snapshot of everything the front end renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Display {
    /// Generation of the session that last wrote `answer` (0 before any).
    pub session: u64,
    /// Accumulated answer markup (see `core::format`), or an error text.
    pub answer: String,
    pub loading: bool,
    pub show_results: bool,
    /// Prompt currently being answered.
    pub recent_prompt: String,
    pub status: SessionStatus,
}

impl Display {
    /// True when `answer` holds an error text rather than revealed markup.
    pub fn is_error(&self) -> bool {
        self.status == SessionStatus::Failed
    }
}
