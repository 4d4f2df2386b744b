//! Ctrl+C handling.
//!
//! The handler only records the interrupt; front ends decide what it means
//! (stop the live generation, or quit when nothing is running). A second
//! Ctrl+C before the first one was consumed exits the process.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use tokio::sync::Notify;

static INTERRUPTED: AtomicBool = AtomicBool::new(false);
static INTERRUPT_NOTIFY: OnceLock<Notify> = OnceLock::new();

/// Returned when a one-shot run ends because the user pressed Ctrl+C.
#[derive(Debug)]
pub struct InterruptedError;

impl std::fmt::Display for InterruptedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Interrupted")
    }
}

impl std::error::Error for InterruptedError {}

/// Installs the Ctrl+C handler.
///
/// # Errors
/// Returns an error if a handler is already installed for this process.
pub fn init() -> Result<()> {
    ctrlc::set_handler(trigger_ctrl_c).context("Error setting Ctrl+C handler")
}

fn notify_waiters() {
    INTERRUPT_NOTIFY.get_or_init(Notify::new).notify_waiters();
}

/// Records an interrupt, force-exiting on a second unconsumed Ctrl+C.
pub fn trigger_ctrl_c() {
    if INTERRUPTED.swap(true, Ordering::SeqCst) {
        std::process::exit(130);
    }
    notify_waiters();
}

/// Checks if an interrupt has been requested.
pub fn is_interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

/// Waits until an interrupt is triggered.
pub async fn wait_for_interrupt() {
    loop {
        let notified = INTERRUPT_NOTIFY.get_or_init(Notify::new).notified();
        if is_interrupted() {
            return;
        }
        notified.await;
    }
}

/// Consumes the pending interrupt.
pub fn reset() {
    INTERRUPTED.store(false, Ordering::SeqCst);
}
