//! Provider-agnostic types shared across completion backends.

use std::fmt;

use anyhow::{Context, Result};
use serde_json::Value;

/// Standard User-Agent header for gchat API requests.
pub const USER_AGENT: &str = concat!("gchat/", env!("CARGO_PKG_VERSION"));

/// Prefix every displayable error text starts with.
pub const ERROR_MARKER: &str = "Error:";

/// Returns true if `text` is an error payload rather than an answer.
pub fn is_error_text(text: &str) -> bool {
    text.starts_with(ERROR_MARKER)
}

// ============================================================================
// Config resolution helpers
// ============================================================================

/// Resolves an API key with precedence: config > env.
///
/// Returns `None` when neither is set. A missing key is reported when a
/// request is attempted, so the chat surface can display it.
pub fn resolve_api_key(config_api_key: Option<&str>, env_var: &str) -> Option<String> {
    if let Some(key) = config_api_key {
        let trimmed = key.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }

    std::env::var(env_var)
        .ok()
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
}

/// Resolves a base URL with precedence: env > config > default.
///
/// # Errors
/// Returns an error if the env or config value is not a valid URL.
pub fn resolve_base_url(
    config_base_url: Option<&str>,
    env_var: &str,
    default_url: &str,
    provider_name: &str,
) -> Result<String> {
    if let Ok(env_url) = std::env::var(env_var) {
        let trimmed = env_url.trim();
        if !trimmed.is_empty() {
            validate_url(trimmed, provider_name)?;
            return Ok(trimmed.trim_end_matches('/').to_string());
        }
    }

    if let Some(config_url) = config_base_url {
        let trimmed = config_url.trim();
        if !trimmed.is_empty() {
            validate_url(trimmed, provider_name)?;
            return Ok(trimmed.trim_end_matches('/').to_string());
        }
    }

    Ok(default_url.to_string())
}

fn validate_url(url: &str, provider_name: &str) -> Result<()> {
    url::Url::parse(url).with_context(|| format!("Invalid {provider_name} base URL: {url}"))?;
    Ok(())
}

// ============================================================================
// Errors
// ============================================================================

/// Categories of provider errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Credentials missing or rejected
    Configuration,
    /// Rate limit or quota exceeded
    Quota,
    /// Transport failure reaching the provider
    Network,
    /// Provider reachable but returned an application-level failure
    Provider,
    /// Anything uncategorized
    Unknown,
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderErrorKind::Configuration => write!(f, "configuration"),
            ProviderErrorKind::Quota => write!(f, "quota"),
            ProviderErrorKind::Network => write!(f, "network"),
            ProviderErrorKind::Provider => write!(f, "provider"),
            ProviderErrorKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// Structured error from the provider with kind and details.
#[derive(Debug, Clone)]
pub struct ProviderError {
    /// Error category
    pub kind: ProviderErrorKind,
    /// One-line summary
    pub message: String,
    /// Optional additional details (e.g., raw error body)
    pub details: Option<String>,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Configuration, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Network, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Unknown, message)
    }

    /// Creates an error from a non-success HTTP response.
    ///
    /// Reads `error.message` and `error.status` from a JSON body when present
    /// and classifies by status code first, then by the API status and text.
    pub fn http_status(status: u16, body: &str) -> Self {
        let (api_message, api_status) = parse_error_body(body);
        let message = match &api_message {
            Some(msg) => format!("HTTP {status}: {msg}"),
            None => format!("HTTP {status}"),
        };
        let hint = format!(
            "{} {}",
            api_status.as_deref().unwrap_or_default(),
            api_message.as_deref().unwrap_or_default()
        )
        .to_lowercase();

        let kind = match status {
            401 | 403 => ProviderErrorKind::Configuration,
            429 => ProviderErrorKind::Quota,
            _ if hint.contains("resource_exhausted")
                || hint.contains("quota")
                || hint.contains("rate limit") =>
            {
                ProviderErrorKind::Quota
            }
            400 if hint.contains("api key") || hint.contains("api_key") => {
                ProviderErrorKind::Configuration
            }
            _ => ProviderErrorKind::Provider,
        };

        Self {
            kind,
            message,
            details: (!body.is_empty()).then(|| body.to_string()),
        }
    }

    /// Human-readable text for the display surface, starting with
    /// [`ERROR_MARKER`].
    pub fn display_text(&self) -> String {
        match self.kind {
            ProviderErrorKind::Configuration => format!("{ERROR_MARKER} {}", self.message),
            ProviderErrorKind::Quota => format!(
                "{ERROR_MARKER} API quota exceeded or rate limit reached. Please check your Gemini API usage limits."
            ),
            ProviderErrorKind::Network => format!(
                "{ERROR_MARKER} Network connection issue. Please check your internet connection and try again."
            ),
            ProviderErrorKind::Provider | ProviderErrorKind::Unknown => format!(
                "{ERROR_MARKER} {}. Please try again later.",
                self.message.trim_end_matches('.')
            ),
        }
    }
}

fn parse_error_body(body: &str) -> (Option<String>, Option<String>) {
    let Ok(json) = serde_json::from_str::<Value>(body) else {
        return (None, None);
    };
    let Some(error) = json.get("error") else {
        return (None, None);
    };
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string);
    let status = error
        .get("status")
        .and_then(Value::as_str)
        .map(str::to_string);
    (message, status)
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ProviderError {}

/// Result type for provider operations.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Classifies a reqwest error into a `ProviderError`.
pub fn classify_reqwest_error(e: &reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::network(format!("Request timed out: {e}"))
    } else if e.is_connect() {
        ProviderError::network(format!("Connection failed: {e}"))
    } else if e.is_request() {
        ProviderError::network(format!("Request error: {e}"))
    } else if e.is_decode() || e.is_body() {
        ProviderError::unknown(format!("Failed to read response: {e}"))
    } else {
        ProviderError::unknown(format!("Unexpected transport error: {e}"))
    }
}
