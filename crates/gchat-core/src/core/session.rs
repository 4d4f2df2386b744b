//! Dispatch session state.

use std::fmt;

use tokio_util::sync::CancellationToken;

/// Monotonically increasing id of a submitted session.
///
/// Every submit takes the next generation; a reveal step may only mutate the
/// display if the generation it captured is still the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(pub u64);

impl Generation {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle status of the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    /// No session exists.
    #[default]
    Idle,
    /// Submitted, waiting out the settling delay.
    Pending,
    /// Active: awaiting the provider or revealing tokens.
    Revealing,
    Completed,
    Stopped,
    Failed,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Stopped | Self::Failed)
    }

    /// Pending or revealing sessions may still mutate shared state.
    pub fn is_live(self) -> bool {
        matches!(self, Self::Pending | Self::Revealing)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pending => "pending",
            Self::Revealing => "revealing",
            Self::Completed => "completed",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One prompt-to-answer cycle.
#[derive(Debug)]
pub struct DispatchSession {
    pub generation: Generation,
    pub prompt: String,
    /// Accumulated revealed text (each token followed by one space).
    pub revealed: String,
    pub status: SessionStatus,
    /// Shared by every pending timer of the session; cancelling it cancels
    /// them all.
    cancel: CancellationToken,
}

impl DispatchSession {
    pub fn new(generation: Generation, prompt: impl Into<String>) -> Self {
        Self {
            generation,
            prompt: prompt.into(),
            revealed: String::new(),
            status: SessionStatus::Pending,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that pending reveal timers race against.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_live(&self) -> bool {
        self.status.is_live() && !self.cancel.is_cancelled()
    }

    /// Invalidates the session: cancels its timers and marks it stopped.
    ///
    /// Returns `false` if the session had already reached a terminal state.
    pub fn invalidate(&mut self) -> bool {
        self.cancel.cancel();
        if self.status.is_terminal() {
            return false;
        }
        self.status = SessionStatus::Stopped;
        true
    }

    /// Moves the session to a terminal status and releases its timers.
    pub fn finish(&mut self, status: SessionStatus) {
        debug_assert!(status.is_terminal());
        self.status = status;
        self.cancel.cancel();
    }
}
