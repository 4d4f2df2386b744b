//! Exec mode: submit one prompt and print the answer as it is revealed.
//!
//! The answer goes to stdout. A failed session becomes the command's error
//! (stderr, exit 1); Ctrl+C stops the session and exits with 130.

use anyhow::{Context, Result, bail};
use gchat_core::config::Config;
use gchat_core::core::interrupt::{self, InterruptedError};
use gchat_core::core::session::SessionStatus;

use crate::render::Renderer;

pub async fn run_exec(prompt: &str, config: &Config) -> Result<()> {
    let dispatcher = super::build_dispatcher(config)?;
    let mut display = dispatcher.subscribe();
    let mut renderer = Renderer::stdout(false);

    let mut task = {
        let dispatcher = dispatcher.clone();
        let prompt = prompt.to_string();
        tokio::spawn(async move { dispatcher.submit(&prompt, true).await })
    };

    let status = loop {
        tokio::select! {
            joined = &mut task => break joined.context("dispatch task failed")?,
            Ok(()) = display.changed() => {
                let snapshot = display.borrow_and_update().clone();
                renderer.update(&snapshot)?;
            }
            () = interrupt::wait_for_interrupt() => {
                interrupt::reset();
                dispatcher.stop();
                renderer.finish()?;
                return Err(InterruptedError.into());
            }
        }
    };

    let last = dispatcher.display();
    renderer.update(&last)?;
    renderer.finish()?;

    match status {
        None => bail!("Prompt is empty"),
        Some(SessionStatus::Failed) => bail!("{}", last.answer),
        Some(_) => Ok(()),
    }
}
