//! Exec command handler.

use anyhow::{Context, Result};
use gchat_core::config::Config;

use crate::modes;

pub async fn run(prompt: &str, config: &Config) -> Result<()> {
    modes::exec::run_exec(prompt, config)
        .await
        .context("execute prompt")
}
