//! Effective relay settings: flags and environment over the config file over
//! built-in defaults.

use anyhow::{Result, bail};
use std::path::PathBuf;

use chatrelay_ai::{LlmRetryConfig, OpenAIClient};
use chatrelay_core::channel::TelegramConfig;
use chatrelay_core::conversation::{ContextBudget, DEFAULT_CONTEXT_WINDOW};
use chatrelay_core::journal::DEFAULT_EVENT_LOG;
use chatrelay_core::runtime::ChatDispatcherConfig;

use super::CliConfig;
use crate::cli::Overrides;

const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Completion client settings
#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub api_key: String,
    pub model: String,
    pub base_url: Option<String>,
    pub max_retries: u32,
}

impl OpenAiSettings {
    pub fn build_client(&self) -> OpenAIClient {
        let retry_config = match self.max_retries {
            0 => LlmRetryConfig::disabled(),
            retries => LlmRetryConfig::default().with_max_retries(retries),
        };

        let client = OpenAIClient::new(&self.api_key)
            .with_model(&self.model)
            .with_retry_config(retry_config);
        match &self.base_url {
            Some(url) => client.with_base_url(url),
            None => client,
        }
    }
}

/// Everything needed to start the relay
#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub telegram: TelegramConfig,
    pub openai: OpenAiSettings,
    pub dispatcher: ChatDispatcherConfig,
    pub event_log: PathBuf,
    pub log_updates: bool,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl RelaySettings {
    pub fn resolve(file: CliConfig, overrides: &Overrides) -> Result<Self> {
        let Some(bot_token) = non_blank(overrides.bot_token.clone())
            .or_else(|| non_blank(file.telegram.bot_token))
        else {
            bail!(
                "Telegram bot token not found: set TELEGRAM_BOT_TOKEN or telegram.bot_token in the config file"
            );
        };
        let Some(api_key) =
            non_blank(overrides.api_key.clone()).or_else(|| non_blank(file.openai.api_key))
        else {
            bail!(
                "OpenAI API key not found: set OPENAI_API_KEY or openai.api_key in the config file"
            );
        };

        let mut telegram = TelegramConfig::new(bot_token);
        if let Some(timeout) = file.telegram.polling_timeout {
            telegram = telegram.with_polling_timeout(timeout);
        }
        if let Some(api_base) = non_blank(file.telegram.api_base) {
            telegram = telegram.with_api_base(api_base);
        }

        let openai = OpenAiSettings {
            api_key,
            model: non_blank(overrides.model.clone())
                .or_else(|| non_blank(file.openai.model))
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: non_blank(overrides.base_url.clone())
                .or_else(|| non_blank(file.openai.base_url)),
            max_retries: file.openai.max_retries.unwrap_or(0),
        };

        let defaults = ChatDispatcherConfig::default();
        let max_output_tokens = file
            .chat
            .max_output_tokens
            .unwrap_or(defaults.max_output_tokens);
        let dispatcher = ChatDispatcherConfig {
            max_output_tokens,
            budget: ContextBudget::new(
                file.chat.context_window.unwrap_or(DEFAULT_CONTEXT_WINDOW),
                max_output_tokens as usize,
            ),
            greeting: file.chat.greeting.unwrap_or(defaults.greeting),
            reset_reply: file.chat.reset_reply.unwrap_or(defaults.reset_reply),
            send_typing_indicator: file
                .chat
                .send_typing_indicator
                .unwrap_or(defaults.send_typing_indicator),
            bot_username: None,
        };

        Ok(Self {
            telegram,
            openai,
            dispatcher,
            event_log: overrides
                .event_log
                .clone()
                .or(file.logging.event_log)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_EVENT_LOG)),
            log_updates: overrides.log_updates || file.logging.log_updates.unwrap_or(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatrelay_ai::LlmClient;

    fn with_secrets() -> Overrides {
        Overrides {
            bot_token: Some("123:ABC".to_string()),
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let settings = RelaySettings::resolve(CliConfig::default(), &with_secrets()).unwrap();

        assert_eq!(settings.telegram.bot_token, "123:ABC");
        assert_eq!(settings.telegram.polling_timeout, 30);
        assert_eq!(settings.openai.model, "gpt-3.5-turbo");
        assert_eq!(settings.openai.max_retries, 0);
        assert_eq!(settings.dispatcher.max_output_tokens, 1000);
        assert_eq!(settings.dispatcher.budget.limit, 3096);
        assert_eq!(settings.dispatcher.reset_reply, "Chat has been reset!");
        assert_eq!(settings.event_log, PathBuf::from("bot_logs.txt"));
        assert!(!settings.log_updates);
    }

    #[test]
    fn test_missing_bot_token() {
        let overrides = Overrides {
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        };

        let error = RelaySettings::resolve(CliConfig::default(), &overrides).unwrap_err();
        assert!(error.to_string().contains("bot token not found"));
    }

    #[test]
    fn test_blank_api_key_is_missing() {
        let mut file = CliConfig::default();
        file.telegram.bot_token = Some("123:ABC".to_string());
        file.openai.api_key = Some("   ".to_string());

        let error = RelaySettings::resolve(file, &Overrides::default()).unwrap_err();
        assert!(error.to_string().contains("API key not found"));
    }

    #[test]
    fn test_overrides_take_precedence_over_file() {
        let mut file = CliConfig::default();
        file.telegram.bot_token = Some("file-token".to_string());
        file.openai.api_key = Some("file-key".to_string());
        file.openai.model = Some("file-model".to_string());
        file.logging.event_log = Some(PathBuf::from("file.txt"));

        let overrides = Overrides {
            bot_token: Some("flag-token".to_string()),
            model: Some("gpt-4o".to_string()),
            event_log: Some(PathBuf::from("flag.txt")),
            ..Default::default()
        };

        let settings = RelaySettings::resolve(file, &overrides).unwrap();
        assert_eq!(settings.telegram.bot_token, "flag-token");
        assert_eq!(settings.openai.api_key, "file-key");
        assert_eq!(settings.openai.model, "gpt-4o");
        assert_eq!(settings.event_log, PathBuf::from("flag.txt"));
    }

    #[test]
    fn test_chat_section_shapes_budget() {
        let mut file = CliConfig::default();
        file.chat.context_window = Some(8000);
        file.chat.max_output_tokens = Some(500);
        file.chat.send_typing_indicator = Some(false);
        file.logging.log_updates = Some(true);

        let settings = RelaySettings::resolve(file, &with_secrets()).unwrap();
        assert_eq!(settings.dispatcher.budget.limit, 7500);
        assert_eq!(settings.dispatcher.max_output_tokens, 500);
        assert!(!settings.dispatcher.send_typing_indicator);
        assert!(settings.log_updates);
    }

    #[test]
    fn test_build_client_uses_model() {
        let settings = RelaySettings::resolve(CliConfig::default(), &with_secrets()).unwrap();
        let client = settings.openai.build_client();

        assert_eq!(client.provider(), "openai");
        assert_eq!(client.model(), "gpt-3.5-turbo");
    }
}
