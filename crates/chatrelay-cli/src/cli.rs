use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chatrelay")]
#[command(version, about = "ChatRelay - Telegram to chat-completion relay bot")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file (defaults to ~/.config/chatrelay/config.toml)
    #[arg(long, global = true, env = "CHATRELAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub overrides: Overrides,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the relay (default)
    Run,

    /// Validate configuration and check the Telegram bot token
    Check,

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Settings that take precedence over the config file
#[derive(Args, Debug, Clone, Default)]
pub struct Overrides {
    /// Telegram bot token
    #[arg(long, global = true, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    pub bot_token: Option<String>,

    /// OpenAI API key
    #[arg(long, global = true, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Chat model (default: gpt-3.5-turbo)
    #[arg(long, global = true, env = "OPENAI_MODEL")]
    pub model: Option<String>,

    /// OpenAI-compatible API base URL
    #[arg(long, global = true, env = "OPENAI_BASE_URL")]
    pub base_url: Option<String>,

    /// Event log file (default: bot_logs.txt)
    #[arg(long, global = true, env = "CHATRELAY_EVENT_LOG")]
    pub event_log: Option<PathBuf>,

    /// Log every inbound update in full
    #[arg(long, global = true, env = "CHATRELAY_LOG_UPDATES")]
    pub log_updates: bool,
}
