//! CLI configuration file support
//!
//! Loads configuration from ~/.config/chatrelay/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub telegram: TelegramSection,
    #[serde(default)]
    pub openai: OpenAiSection,
    #[serde(default)]
    pub chat: ChatSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Telegram bot settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelegramSection {
    pub bot_token: Option<String>,
    /// Long-polling timeout in seconds
    pub polling_timeout: Option<u32>,
    /// Bot API server, for self-hosted deployments
    pub api_base: Option<String>,
}

/// Completion service settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpenAiSection {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    /// Retries for transient failures (default: none)
    pub max_retries: Option<u32>,
}

/// Conversation settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatSection {
    pub max_output_tokens: Option<u32>,
    /// Model context window in characters; the history budget is this minus
    /// `max_output_tokens`
    pub context_window: Option<usize>,
    pub greeting: Option<String>,
    pub reset_reply: Option<String>,
    pub send_typing_indicator: Option<bool>,
}

/// Event log settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSection {
    pub event_log: Option<PathBuf>,
    pub log_updates: Option<bool>,
}

impl CliConfig {
    /// Load configuration from `path`, or the default path when `None`.
    ///
    /// A missing file yields the defaults; an unreadable or malformed one is
    /// an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => match Self::default_path() {
                Some(path) => Self::load_from_path(&path),
                None => Ok(Self::default()),
            },
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Get the default configuration file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("chatrelay").join("config.toml"))
    }
}
