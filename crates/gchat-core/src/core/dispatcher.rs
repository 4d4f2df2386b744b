//! Prompt dispatcher.
//!
//! Turns a prompt into a revealed answer:
//!
//! 1. Invalidate the previous session (cancel its timers, mark it stopped).
//! 2. Wait out the settling delay, then activate the new session.
//! 3. Ask the completion provider for the full answer.
//! 4. Convert the answer to display markup, split it into tokens, and append
//!    one token per reveal interval to the display.
//!
//! Every session gets a fresh [`Generation`]. A reveal step checks that its
//! generation is still live before scheduling the next timer and again when
//! the timer fires, so a step that outlives its session never touches the
//! display. Shared state is only locked between suspension points.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::FutureExt;
use tokio::sync::watch;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::display::Display;
use super::format;
use super::history::History;
use super::session::{DispatchSession, Generation, SessionStatus};
use crate::config::DispatchConfig;
use crate::providers::{CompletionProvider, is_error_text};

/// Shown when the provider call fails in a way it did not classify itself.
pub const UNEXPECTED_FAILURE: &str = "An unexpected error occurred. Please try again.";

/// Handle to the dispatcher. Clones share the same sessions and display.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

struct Inner {
    provider: Arc<dyn CompletionProvider>,
    config: DispatchConfig,
    state: Mutex<State>,
    display: watch::Sender<Display>,
}

#[derive(Default)]
struct State {
    generation: Generation,
    session: Option<DispatchSession>,
    history: History,
}

impl State {
    fn live_session(&mut self, generation: Generation) -> Option<&mut DispatchSession> {
        self.session
            .as_mut()
            .filter(|session| session.generation == generation && session.is_live())
    }
}

/// Provider outcome, reduced to what the display needs.
enum Reply {
    Answer(String),
    Error(String),
}

impl Dispatcher {
    pub fn new(provider: Arc<dyn CompletionProvider>, config: DispatchConfig) -> Self {
        let (display, _) = watch::channel(Display::default());
        Self {
            inner: Arc::new(Inner {
                provider,
                config,
                state: Mutex::new(State::default()),
                display,
            }),
        }
    }

    /// Subscribes to display updates.
    pub fn subscribe(&self) -> watch::Receiver<Display> {
        self.inner.display.subscribe()
    }

    /// Current display snapshot.
    pub fn display(&self) -> Display {
        self.inner.display.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.display.borrow().loading
    }

    /// Status of the most recent session, `Idle` if there is none.
    pub fn status(&self) -> SessionStatus {
        self.state()
            .session
            .as_ref()
            .map_or(SessionStatus::Idle, |session| session.status)
    }

    /// Prompts submitted as fresh top-level submissions, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.state().history.to_vec()
    }

    /// Number of prompts in history.
    pub fn history_len(&self) -> usize {
        self.state().history.len()
    }

    /// Submits a prompt and drives its session to a terminal state.
    ///
    /// Returns `None` if the prompt is blank: the live session, if any, is
    /// stopped and loading is cleared, but no session is created. Otherwise returns the terminal status of this submission's session:
    /// `Stopped` if it was stopped or superseded by a later submit.
    pub async fn submit(&self, prompt: &str, add_to_history: bool) -> Option<SessionStatus> {
        if prompt.trim().is_empty() {
            debug!("blank prompt, stopping live session");
            self.stop();
            self.clear_loading();
            return None;
        }

        let (generation, cancel) = self.begin(prompt);
        let status = self.run(generation, &cancel, prompt, add_to_history).await;
        info!(%generation, %status, "session finished");
        Some(status)
    }

    /// Re-submits a history entry without appending it to history again.
    ///
    /// Returns `None` if `index` is out of range.
    pub async fn replay(&self, index: usize) -> Option<SessionStatus> {
        let prompt = self.state().history.get(index)?.to_string();
        self.submit(&prompt, false).await
    }

    /// Stops the live session, if any.
    ///
    /// Returns `true` if a session was stopped. Calling it again is a no-op.
    pub fn stop(&self) -> bool {
        let mut state = self.state();
        let Some(session) = state.session.as_mut().filter(|s| s.is_live()) else {
            return false;
        };
        session.invalidate();
        info!(generation = %session.generation, "generation stopped");
        self.inner.display.send_modify(|display| {
            display.loading = false;
            display.status = SessionStatus::Stopped;
        });
        true
    }

    /// Starts a fresh conversation: stops, then clears the shown answer.
    ///
    /// History is kept.
    pub fn new_session(&self) {
        self.stop();
        self.state().session = None;
        self.inner.display.send_modify(|display| {
            display.answer.clear();
            display.recent_prompt.clear();
            display.loading = false;
            display.show_results = false;
            display.status = SessionStatus::Idle;
        });
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Invalidates the previous session and registers a pending one.
    fn begin(&self, prompt: &str) -> (Generation, CancellationToken) {
        let mut state = self.state();
        state.generation = state.generation.next();
        let generation = state.generation;

        if let Some(previous) = state.session.as_mut()
            && previous.invalidate()
        {
            debug!(previous = %previous.generation, %generation, "session superseded");
        }

        let session = DispatchSession::new(generation, prompt);
        let cancel = session.cancel_token();
        state.session = Some(session);
        (generation, cancel)
    }

    async fn run(
        &self,
        generation: Generation,
        cancel: &CancellationToken,
        prompt: &str,
        add_to_history: bool,
    ) -> SessionStatus {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return SessionStatus::Stopped,
            () = sleep(self.inner.config.settle_delay()) => {}
        }
        if !self.activate(generation, prompt, add_to_history) {
            return SessionStatus::Stopped;
        }

        let reply = tokio::select! {
            biased;
            () = cancel.cancelled() => return SessionStatus::Stopped,
            reply = self.call_provider(prompt) => reply,
        };
        let answer = match reply {
            Reply::Answer(answer) => answer,
            Reply::Error(text) => return self.fail(generation, text),
        };

        let display_text = format::to_display(&answer);
        let tokens = format::tokenize(&display_text);
        debug!(%generation, tokens = tokens.len(), "revealing answer");

        let interval = self.inner.config.reveal_interval();
        for token in tokens {
            if !self.is_live(generation) {
                return SessionStatus::Stopped;
            }
            tokio::select! {
                biased;
                () = cancel.cancelled() => return SessionStatus::Stopped,
                () = sleep(interval) => {}
            }
            if !self.reveal(generation, token) {
                return SessionStatus::Stopped;
            }
        }

        self.complete(generation)
    }

    fn activate(&self, generation: Generation, prompt: &str, add_to_history: bool) -> bool {
        let mut state = self.state();
        let Some(session) = state.live_session(generation) else {
            return false;
        };
        session.status = SessionStatus::Revealing;
        if add_to_history {
            state.history.push(prompt);
        }
        info!(%generation, add_to_history, "session active");

        self.inner.display.send_modify(|display| {
            display.session = generation.0;
            display.answer.clear();
            display.loading = true;
            display.show_results = true;
            display.recent_prompt = prompt.to_string();
            display.status = SessionStatus::Revealing;
        });
        true
    }

    async fn call_provider(&self, prompt: &str) -> Reply {
        let result = AssertUnwindSafe(self.inner.provider.complete(prompt))
            .catch_unwind()
            .await;

        match result {
            Ok(Ok(text)) if is_error_text(&text) => Reply::Error(text),
            Ok(Ok(text)) => Reply::Answer(text),
            Ok(Err(err)) => {
                warn!(kind = %err.kind, error = %err, "completion failed");
                Reply::Error(err.display_text())
            }
            Err(_) => {
                error!("completion provider panicked");
                Reply::Error(UNEXPECTED_FAILURE.to_string())
            }
        }
    }

    fn is_live(&self, generation: Generation) -> bool {
        self.state().live_session(generation).is_some()
    }

    /// Appends one token plus a trailing space, if the session is still live.
    fn reveal(&self, generation: Generation, token: &str) -> bool {
        let mut state = self.state();
        let Some(session) = state.live_session(generation) else {
            return false;
        };
        session.revealed.push_str(token);
        session.revealed.push(' ');

        self.inner.display.send_modify(|display| {
            display.answer.push_str(token);
            display.answer.push(' ');
        });
        true
    }

    fn fail(&self, generation: Generation, text: String) -> SessionStatus {
        self.finish_with(generation, SessionStatus::Failed, Some(text))
    }

    fn complete(&self, generation: Generation) -> SessionStatus {
        self.finish_with(generation, SessionStatus::Completed, None)
    }

    fn finish_with(
        &self,
        generation: Generation,
        status: SessionStatus,
        answer: Option<String>,
    ) -> SessionStatus {
        let mut state = self.state();
        let Some(session) = state.live_session(generation) else {
            return SessionStatus::Stopped;
        };
        session.finish(status);

        self.inner.display.send_modify(|display| {
            if let Some(answer) = answer {
                display.answer = answer;
            }
            display.loading = false;
            display.status = status;
        });
        status
    }

    fn clear_loading(&self) {
        self.inner.display.send_if_modified(|display| {
            let was_loading = display.loading;
            display.loading = false;
            was_loading
        });
    }
}
