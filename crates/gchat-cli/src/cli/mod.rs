//! CLI entry and dispatch.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use gchat_core::core::interrupt;
use gchat_core::{config, logging};

mod commands;

#[derive(Parser)]
#[command(name = "gchat")]
#[command(version)]
#[command(about = "Chat with Gemini from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    overrides: Overrides,
}

/// Per-run overrides for values from config.toml.
#[derive(clap::Args, Debug, Clone, Default)]
struct Overrides {
    /// Override the model from config
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Pause before a new prompt becomes active, in milliseconds
    #[arg(long, global = true, value_name = "MS")]
    settle_delay_ms: Option<u64>,

    /// Delay between revealed words, in milliseconds
    #[arg(long, global = true, value_name = "MS")]
    reveal_interval_ms: Option<u64>,
}

impl Overrides {
    fn apply(&self, config: &mut config::Config) {
        if let Some(model) = self.model.as_deref() {
            config.model = model.to_string();
        }
        if let Some(ms) = self.settle_delay_ms {
            config.dispatch.settle_delay_ms = ms;
        }
        if let Some(ms) = self.reveal_interval_ms {
            config.dispatch.reveal_interval_ms = ms;
        }
    }
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Sends one prompt and prints the revealed answer
    Exec {
        /// The prompt to send
        #[arg(short, long)]
        prompt: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Generate a fresh config from Rust defaults (for xtask)
    Generate,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    interrupt::init()?;

    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    let result = rt.block_on(async move { dispatch(cli).await });
    // A pending stdin read would otherwise hold the runtime open.
    rt.shutdown_timeout(Duration::from_millis(100));
    result
}

async fn dispatch(cli: Cli) -> Result<()> {
    let Cli { command, overrides } = cli;

    match command {
        None => {
            let config = load_config(&overrides)?;
            let _log_guard = logging::init(&config::paths::logs_dir());
            commands::chat::run(&config).await
        }

        Some(Commands::Exec { prompt }) => {
            let config = load_config(&overrides)?;
            let _log_guard = logging::init(&config::paths::logs_dir());
            commands::exec::run(&prompt, &config).await
        }

        Some(Commands::Config { command }) => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
            ConfigCommands::Generate => commands::config::generate(),
        },
    }
}

fn load_config(overrides: &Overrides) -> Result<config::Config> {
    let mut config = config::Config::load().context("load config")?;
    overrides.apply(&mut config);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn overrides_replace_config_values() {
        let cli = Cli::parse_from([
            "gchat",
            "exec",
            "-p",
            "Hi",
            "--model",
            "gemini-2.5-pro",
            "--reveal-interval-ms",
            "0",
        ]);
        let mut config = config::Config::default();
        cli.overrides.apply(&mut config);

        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.dispatch.reveal_interval_ms, 0);
        assert_eq!(
            config.dispatch.settle_delay_ms,
            config::DispatchConfig::DEFAULT_SETTLE_DELAY_MS
        );
    }
}
