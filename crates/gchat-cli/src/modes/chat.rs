//! Interactive chat mode.
//!
//! Reads prompts line by line while answers are revealed in the background,
//! so `/stop` and new prompts take effect mid-reveal. Ctrl+C stops the live
//! generation, or quits when nothing is running.

use std::io::Stdout;

use anyhow::{Context, Result};
use gchat_core::config::Config;
use gchat_core::core::dispatcher::Dispatcher;
use gchat_core::core::interrupt;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::render::Renderer;

const HELP: &str = "\
Commands:
  /stop        stop the answer being revealed
  /new         start a new session (history is kept)
  /history     list previous prompts
  /replay <n>  send prompt #n from /history again
  /help        show this help
  /quit        exit (also Ctrl+D)";

#[derive(Debug, PartialEq, Eq)]
enum ChatCommand<'a> {
    Prompt(&'a str),
    Empty,
    Stop,
    New,
    History,
    Replay(usize),
    Help,
    Quit,
    Usage(&'static str),
    Unknown(&'a str),
}

impl<'a> ChatCommand<'a> {
    fn parse(line: &'a str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }
        let Some(command) = trimmed.strip_prefix('/') else {
            return Self::Prompt(line);
        };

        let (name, arg) = command
            .split_once(char::is_whitespace)
            .map_or((command, ""), |(name, arg)| (name, arg.trim()));
        match name {
            "stop" => Self::Stop,
            "new" => Self::New,
            "history" => Self::History,
            "replay" => arg
                .parse()
                .map_or(Self::Usage("/replay <n>"), Self::Replay),
            "help" => Self::Help,
            "quit" | "exit" => Self::Quit,
            _ => Self::Unknown(trimmed),
        }
    }
}

pub async fn run_interactive_chat(config: &Config) -> Result<()> {
    let dispatcher = super::build_dispatcher(config)?;
    let mut display = dispatcher.subscribe();
    let mut renderer = Renderer::stdout(true);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    renderer.notice(&format!(
        "gchat using {}. Type /help for commands.",
        config.model
    ))?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("read stdin")? else {
                    break;
                };
                if !handle_line(&dispatcher, &mut renderer, &line)? {
                    break;
                }
            }
            Ok(()) = display.changed() => {
                let snapshot = display.borrow_and_update().clone();
                renderer.update(&snapshot)?;
            }
            () = interrupt::wait_for_interrupt() => {
                interrupt::reset();
                if dispatcher.stop() {
                    renderer.notice("^C Stopped.")?;
                } else {
                    break;
                }
            }
        }
    }

    dispatcher.stop();
    renderer.finish()?;
    Ok(())
}

/// Handles one input line. Returns `false` when the loop should end.
fn handle_line(
    dispatcher: &Dispatcher,
    renderer: &mut Renderer<Stdout>,
    line: &str,
) -> Result<bool> {
    match ChatCommand::parse(line) {
        ChatCommand::Empty => {}
        ChatCommand::Prompt(prompt) => {
            let dispatcher = dispatcher.clone();
            let prompt = prompt.to_string();
            tokio::spawn(async move { dispatcher.submit(&prompt, true).await });
        }
        ChatCommand::Stop => {
            if !dispatcher.stop() {
                renderer.notice("Nothing to stop.")?;
            }
        }
        ChatCommand::New => {
            dispatcher.new_session();
            renderer.notice("Started a new session.")?;
        }
        ChatCommand::History => {
            let history = dispatcher.history();
            if history.is_empty() {
                renderer.notice("No prompts yet.")?;
            }
            for (i, prompt) in history.iter().enumerate() {
                renderer.notice(&format!("{:>3}  {prompt}", i + 1))?;
            }
        }
        ChatCommand::Replay(n) => {
            if n == 0 || n > dispatcher.history_len() {
                renderer.notice(&format!("No prompt #{n} in history."))?;
            } else {
                let dispatcher = dispatcher.clone();
                tokio::spawn(async move { dispatcher.replay(n - 1).await });
            }
        }
        ChatCommand::Help => renderer.notice(HELP)?,
        ChatCommand::Quit => return Ok(false),
        ChatCommand::Usage(usage) => renderer.notice(&format!("Usage: {usage}"))?,
        ChatCommand::Unknown(command) => {
            renderer.notice(&format!("Unknown command: {command}. Type /help."))?;
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_lines_are_prompts() {
        assert_eq!(ChatCommand::parse("Hi there"), ChatCommand::Prompt("Hi there"));
        assert_eq!(ChatCommand::parse("  a/b  "), ChatCommand::Prompt("  a/b  "));
    }

    #[test]
    fn blank_lines_are_ignored() {
        assert_eq!(ChatCommand::parse(""), ChatCommand::Empty);
        assert_eq!(ChatCommand::parse(" \t "), ChatCommand::Empty);
    }

    #[test]
    fn slash_commands() {
        assert_eq!(ChatCommand::parse("/stop"), ChatCommand::Stop);
        assert_eq!(ChatCommand::parse(" /new "), ChatCommand::New);
        assert_eq!(ChatCommand::parse("/history"), ChatCommand::History);
        assert_eq!(ChatCommand::parse("/help"), ChatCommand::Help);
        assert_eq!(ChatCommand::parse("/quit"), ChatCommand::Quit);
        assert_eq!(ChatCommand::parse("/exit"), ChatCommand::Quit);
    }

    #[test]
    fn replay_takes_a_number() {
        assert_eq!(ChatCommand::parse("/replay 2"), ChatCommand::Replay(2));
        assert_eq!(ChatCommand::parse("/replay   10 "), ChatCommand::Replay(10));
        assert_eq!(
            ChatCommand::parse("/replay"),
            ChatCommand::Usage("/replay <n>")
        );
        assert_eq!(
            ChatCommand::parse("/replay two"),
            ChatCommand::Usage("/replay <n>")
        );
    }

    #[test]
    fn unknown_commands_are_reported() {
        assert_eq!(ChatCommand::parse("/bogus x"), ChatCommand::Unknown("/bogus x"));
    }
}
