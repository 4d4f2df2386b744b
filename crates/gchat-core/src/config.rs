//! Configuration management for gchat.
//!
//! Loads configuration from ${GCHAT_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Returns the default config template with comments.
///
/// This is embedded from default_config.toml at compile time.
/// To update, run `cargo xtask update-default-config`.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

/// Recursively merges items from source table into target table.
fn merge_items(target: &mut toml_edit::Table, source: &toml_edit::Table) {
    use toml_edit::Item;

    for (key, value) in source.iter() {
        match value {
            Item::Value(v) => {
                target[key] = Item::Value(v.clone());
            }
            Item::Table(src_table) => {
                if let Some(Item::Table(target_table)) = target.get_mut(key) {
                    merge_items(target_table, src_table);
                } else {
                    target[key] = Item::Table(src_table.clone());
                }
            }
            Item::ArrayOfTables(src_arr) => {
                target[key] = Item::ArrayOfTables(src_arr.clone());
            }
            Item::None => {}
        }
    }
}

pub mod paths {
    //! Path resolution for gchat configuration and data directories.
    //!
    //! GCHAT_HOME resolution order:
    //! 1. GCHAT_HOME environment variable (if set)
    //! 2. ~/.config/gchat (default)

    use std::path::PathBuf;

    /// Returns the gchat home directory.
    pub fn gchat_home() -> PathBuf {
        if let Ok(home) = std::env::var("GCHAT_HOME")
            && !home.trim().is_empty()
        {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("gchat")
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        gchat_home().join("config.toml")
    }

    /// Returns the directory log files are written to.
    pub fn logs_dir() -> PathBuf {
        gchat_home().join("logs")
    }
}

/// Per-provider connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// API key (overrides the provider's environment variable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Base URL override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Request timeout in seconds (0 disables)
    pub timeout_secs: u64,
}

impl ProviderConfig {
    const DEFAULT_TIMEOUT_SECS: u64 = 60;

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub gemini: ProviderConfig,
}

/// Sampling parameters sent with every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 8192,
        }
    }
}

/// Timing of the prompt dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Pause between cancelling the previous session and activating the next
    pub settle_delay_ms: u64,
    /// Delay before each revealed token
    pub reveal_interval_ms: u64,
}

impl DispatchConfig {
    pub const DEFAULT_SETTLE_DELAY_MS: u64 = 100;
    pub const DEFAULT_REVEAL_INTERVAL_MS: u64 = 100;

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn reveal_interval(&self) -> Duration {
        Duration::from_millis(self.reveal_interval_ms)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: Self::DEFAULT_SETTLE_DELAY_MS,
            reveal_interval_ms: Self::DEFAULT_REVEAL_INTERVAL_MS,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The Gemini model to use
    pub model: String,

    /// Provider configuration (keys, base URLs, timeouts).
    pub providers: ProvidersConfig,

    /// Sampling parameters.
    pub generation: GenerationConfig,

    /// Dispatcher timing.
    pub dispatch: DispatchConfig,
}

impl Config {
    pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Creates a default config file at the given path.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// Generates a fresh config TOML from Rust defaults.
    ///
    /// Uses the embedded template for structure/comments and merges
    /// generated values from `Config::default()` into it.
    ///
    /// # Errors
    /// Returns an error if serialization or template parsing fails.
    pub fn generate() -> Result<String> {
        use toml_edit::DocumentMut;

        let generated_toml = toml::to_string(&Config::default())
            .context("Failed to serialize default config to TOML")?;

        let mut doc: DocumentMut = default_config_template()
            .parse()
            .context("Failed to parse default config template")?;
        let generated_doc: DocumentMut = generated_toml
            .parse()
            .context("Failed to parse generated config")?;

        merge_items(doc.as_table_mut(), generated_doc.as_table());

        Ok(doc.to_string())
    }

    /// Writes config content to a file, creating parent directories as needed.
    /// Uses atomic write (temp file + rename) to prevent corruption.
    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: Self::DEFAULT_MODEL.to_string(),
            providers: ProvidersConfig::default(),
            generation: GenerationConfig::default(),
            dispatch: DispatchConfig::default(),
        }
    }
}
