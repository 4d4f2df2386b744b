//! Runtime execution modes.
//!
//! - `exec`: one prompt, answer revealed on stdout
//! - `chat`: line-based interactive loop with slash commands

use std::sync::Arc;

use anyhow::Result;
use gchat_core::config::Config;
use gchat_core::core::dispatcher::Dispatcher;
use gchat_core::providers::gemini::{GeminiClient, GeminiConfig};

pub mod chat;
pub mod exec;

/// Builds a dispatcher backed by the Gemini client.
pub fn build_dispatcher(config: &Config) -> Result<Dispatcher> {
    let client = GeminiClient::new(GeminiConfig::from_config(config)?)?;
    tracing::debug!(model = client.model(), "gemini client ready");
    Ok(Dispatcher::new(Arc::new(client), config.dispatch.clone()))
}
