//! Gemini API key provider (Generative Language API).

use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::shared::{USER_AGENT, classify_reqwest_error};
use super::{
    CompletionProvider, ProviderError, ProviderErrorKind, ProviderResult, resolve_api_key,
    resolve_base_url,
};
use crate::config::{Config, GenerationConfig};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const API_KEY_ENV: &str = "GEMINI_API_KEY";
const BASE_URL_ENV: &str = "GEMINI_BASE_URL";
const MISSING_KEY_MESSAGE: &str =
    "API key not configured. Set GEMINI_API_KEY or api_key in [providers.gemini].";

/// Gemini API configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// `None` until a key is configured; requests then fail with a
    /// configuration error instead of failing at startup.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub generation: GenerationConfig,
    pub timeout: Option<Duration>,
}

impl GeminiConfig {
    /// Creates a new config from the loaded config file and environment.
    ///
    /// Authentication resolution order:
    /// 1. `api_key` in `[providers.gemini]`
    /// 2. `GEMINI_API_KEY` environment variable
    ///
    /// Base URL resolution order: `GEMINI_BASE_URL`, then config, then default.
    ///
    /// # Errors
    /// Returns an error if a configured base URL is invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider = &config.providers.gemini;
        let api_key = resolve_api_key(provider.api_key.as_deref(), API_KEY_ENV);
        let base_url = resolve_base_url(
            provider.base_url.as_deref(),
            BASE_URL_ENV,
            DEFAULT_BASE_URL,
            "Gemini",
        )?;

        Ok(Self {
            api_key,
            base_url,
            model: config.model.clone(),
            generation: config.generation.clone(),
            timeout: provider.timeout(),
        })
    }
}

/// Gemini client.
pub struct GeminiClient {
    config: GeminiConfig,
    http: reqwest::Client,
}

impl GeminiClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to build HTTP client")?;
        Ok(Self { config, http })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Sends a single-turn prompt and returns the full answer text.
    ///
    /// # Errors
    /// Returns a classified `ProviderError` for missing credentials, transport
    /// failures, non-success statuses and answers without text.
    pub async fn generate(&self, prompt: &str) -> ProviderResult<String> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return Err(ProviderError::configuration(MISSING_KEY_MESSAGE));
        };

        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.model
        );
        let request = build_request(prompt, &self.config.generation);
        debug!(model = %self.config.model, prompt_len = prompt.len(), "gemini request");

        let response = self
            .http
            .post(&url)
            .headers(build_headers(api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;
        if !status.is_success() {
            let err = self.refine_http_error(ProviderError::http_status(status.as_u16(), &body));
            warn!(kind = %err.kind, status = status.as_u16(), "gemini request failed");
            return Err(err);
        }

        let value: Value = serde_json::from_str(&body).map_err(|e| {
            ProviderError::unknown(format!("Failed to parse Gemini response JSON: {e}"))
        })?;
        parse_response(&value)
    }

    fn refine_http_error(&self, mut err: ProviderError) -> ProviderError {
        match err.kind {
            ProviderErrorKind::Configuration => {
                err.message = format!(
                    "API key rejected ({}). Check GEMINI_API_KEY or api_key in [providers.gemini].",
                    err.message
                );
            }
            ProviderErrorKind::Provider if err.message.starts_with("HTTP 404") => {
                err.message = format!(
                    "Model '{}' is not available ({})",
                    self.config.model, err.message
                );
            }
            _ => {}
        }
        err
    }
}

impl CompletionProvider for GeminiClient {
    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, ProviderResult<String>> {
        self.generate(prompt).boxed()
    }
}

fn build_request(prompt: &str, generation: &GenerationConfig) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": prompt }]
        }],
        "generationConfig": {
            "temperature": generation.temperature,
            "topP": generation.top_p,
            "topK": generation.top_k,
            "maxOutputTokens": generation.max_output_tokens,
            "responseMimeType": "text/plain",
        },
    })
}

fn parse_response(value: &Value) -> ProviderResult<String> {
    let parts = value
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array);

    let text: String = parts
        .into_iter()
        .flatten()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();

    if !text.is_empty() {
        return Ok(text);
    }

    if let Some(reason) = value
        .get("promptFeedback")
        .and_then(|feedback| feedback.get("blockReason"))
        .and_then(Value::as_str)
    {
        return Err(ProviderError::new(
            ProviderErrorKind::Provider,
            format!("Prompt was blocked ({reason})"),
        ));
    }

    let finish_reason = value
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("finishReason"))
        .and_then(Value::as_str)
        .unwrap_or("no candidates");
    Err(ProviderError::new(
        ProviderErrorKind::Provider,
        format!("Gemini returned no text ({finish_reason})"),
    ))
}

fn build_headers(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-goog-api-key",
        HeaderValue::from_str(api_key).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    headers.insert("accept", HeaderValue::from_static("application/json"));
    headers.insert("content-type", HeaderValue::from_static("application/json"));
    headers
}
