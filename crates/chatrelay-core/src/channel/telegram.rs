//! Telegram Channel Implementation
//!
//! Implements bidirectional communication with Telegram via Bot API.
//! Supports both sending messages and receiving via long-polling.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::split::{TELEGRAM_MAX_LEN, split_message};
use super::traits::{Channel, InboundStream};
use super::types::{ChannelType, InboundMessage, OutboundMessage, ParseMode};

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";
/// Default timeout for Telegram API calls (seconds)
const API_TIMEOUT_SECS: u64 = 30;
/// Pause after a failed poll before trying again
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Telegram channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token from @BotFather
    pub bot_token: String,
    /// Polling timeout in seconds (default: 30)
    #[serde(default = "default_polling_timeout")]
    pub polling_timeout: u32,
    /// Bot API base URL (default: https://api.telegram.org)
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

fn default_polling_timeout() -> u32 {
    30
}

fn default_api_base() -> String {
    TELEGRAM_API_BASE.to_string()
}

impl TelegramConfig {
    /// Create a new config with just the bot token
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            polling_timeout: default_polling_timeout(),
            api_base: default_api_base(),
        }
    }

    /// Set polling timeout
    pub fn with_polling_timeout(mut self, timeout: u32) -> Self {
        self.polling_timeout = timeout;
        self
    }

    /// Point the channel at a different Bot API server
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }
}

/// Error reported by the Bot API itself (`ok: false`)
#[derive(Debug, thiserror::Error)]
#[error("Telegram API error: {description}")]
struct TelegramApiError {
    description: String,
}

impl TelegramApiError {
    /// Telegram rejected the Markdown markup of the message
    fn is_entity_parse_error(&self) -> bool {
        self.description.contains("can't parse entities")
    }
}

/// Telegram channel implementation
pub struct TelegramChannel {
    config: TelegramConfig,
    client: Client,
    /// Whether polling is active
    polling_active: Arc<AtomicBool>,
    /// Last update ID for long-polling
    last_update_id: Arc<AtomicI64>,
}

impl TelegramChannel {
    /// Parse conversation_id into (chat_id, thread_id)
    /// Format: "chat_id" or "chat_id:thread_id"
    fn parse_conversation_id(conversation_id: &str) -> (String, Option<i64>) {
        match conversation_id.split_once(':') {
            Some((chat_id, thread_part)) => (chat_id.to_string(), thread_part.parse::<i64>().ok()),
            None => (conversation_id.to_string(), None),
        }
    }

    fn build_conversation_id(chat_id: i64, message_thread_id: Option<i64>) -> String {
        match message_thread_id {
            Some(thread_id) => format!("{}:{}", chat_id, thread_id),
            None => chat_id.to_string(),
        }
    }

    /// Create a new Telegram channel
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            config,
            client: Client::new(),
            polling_active: Arc::new(AtomicBool::new(false)),
            last_update_id: Arc::new(AtomicI64::new(0)),
        }
    }

    /// Create with just bot token
    pub fn with_token(bot_token: impl Into<String>) -> Self {
        Self::new(TelegramConfig::new(bot_token))
    }

    /// Return current last processed update ID.
    pub fn last_update_id(&self) -> i64 {
        self.last_update_id.load(Ordering::SeqCst)
    }

    /// Check if polling is currently active
    pub fn is_polling(&self) -> bool {
        self.polling_active.load(Ordering::SeqCst)
    }

    /// Ask the polling task to stop after the in-flight request
    pub fn stop_polling(&self) {
        self.polling_active.store(false, Ordering::SeqCst);
    }

    /// Get the API URL for a method
    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_base, self.config.bot_token, method
        )
    }

    /// Call a Bot API method and unwrap its `result`
    async fn call<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: &serde_json::Value,
        timeout: Duration,
    ) -> Result<T> {
        let response = self
            .client
            .post(self.api_url(method))
            .json(params)
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let api_response: TelegramResponse<T> = serde_json::from_str(&body)
            .map_err(|_| anyhow!("Telegram HTTP error ({}): {}", status, body))?;

        if !api_response.ok {
            return Err(TelegramApiError {
                description: api_response.description.unwrap_or_default(),
            }
            .into());
        }

        api_response
            .result
            .ok_or_else(|| anyhow!("Telegram returned ok but no result"))
    }

    /// Send message via Telegram API
    async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        parse_mode: Option<ParseMode>,
        message_thread_id: Option<i64>,
    ) -> Result<TelegramMessageResponse> {
        let mut params = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });

        if let Some(mode) = parse_mode {
            params["parse_mode"] = serde_json::Value::String(mode.as_str().to_string());
        }

        // Add message_thread_id for Telegram forum/supergroup topics
        if let Some(thread_id) = message_thread_id {
            params["message_thread_id"] = serde_json::Value::Number(thread_id.into());
        }

        self.call(
            "sendMessage",
            &params,
            Duration::from_secs(API_TIMEOUT_SECS),
        )
        .await
    }

    /// Poll for updates using long-polling
    async fn poll_updates(&self) -> Result<Vec<TelegramUpdate>> {
        let offset = self.last_update_id.load(Ordering::SeqCst);
        let params = serde_json::json!({
            "offset": if offset > 0 { offset + 1 } else { 0 },
            "timeout": self.config.polling_timeout,
            "allowed_updates": ["message"],
        });

        let updates: Vec<TelegramUpdate> = self
            .call(
                "getUpdates",
                &params,
                Duration::from_secs(self.config.polling_timeout as u64 + 10),
            )
            .await?;

        if let Some(last) = updates.last() {
            self.last_update_id.store(last.update_id, Ordering::SeqCst);
        }

        Ok(updates)
    }

    /// Convert Telegram update to InboundMessage; non-text updates are dropped
    fn convert_update(update: TelegramUpdate) -> Option<InboundMessage> {
        let message = update.message?;
        let from = message.from?;
        let text = message.text?;
        let conversation_id =
            Self::build_conversation_id(message.chat.id, message.message_thread_id);

        let mut metadata = serde_json::json!({
            "chat_type": message.chat.r#type,
            "chat_title": message.chat.title,
            "update_id": update.update_id,
        });
        if let Some(thread_id) = message.message_thread_id {
            metadata["message_thread_id"] = serde_json::Value::Number(thread_id.into());
        }

        let mut inbound = InboundMessage::new(
            format!("tg_{}", message.message_id),
            ChannelType::Telegram,
            from.id.to_string(),
            conversation_id,
            text,
        )
        .with_metadata(metadata);

        if let Some(name) = from.display_name() {
            inbound = inbound.with_sender_name(name);
        }

        Some(inbound)
    }

    /// Test the connection by calling getMe
    pub async fn test_connection(&self) -> Result<TelegramUser> {
        self.call(
            "getMe",
            &serde_json::json!({}),
            Duration::from_secs(API_TIMEOUT_SECS),
        )
        .await
    }
}

#[async_trait]
impl Channel for TelegramChannel {
    fn channel_type(&self) -> ChannelType {
        ChannelType::Telegram
    }

    fn is_configured(&self) -> bool {
        !self.config.bot_token.is_empty()
    }

    async fn send(&self, message: OutboundMessage) -> Result<()> {
        let (chat_id, thread_id) = Self::parse_conversation_id(&message.conversation_id);

        for chunk in split_message(&message.content, TELEGRAM_MAX_LEN) {
            let result = self
                .send_message(&chat_id, &chunk, message.parse_mode, thread_id)
                .await;

            match result {
                Ok(_) => {}
                Err(e)
                    if message.parse_mode.is_some()
                        && e.downcast_ref::<TelegramApiError>()
                            .is_some_and(TelegramApiError::is_entity_parse_error) =>
                {
                    debug!("Telegram rejected markup, resending as plain text: {}", e);
                    self.send_message(&chat_id, &chunk, None, thread_id).await?;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }

    async fn send_typing(&self, conversation_id: &str) -> Result<()> {
        let (chat_id, thread_id) = Self::parse_conversation_id(conversation_id);
        let mut params = serde_json::json!({
            "chat_id": chat_id,
            "action": "typing",
        });
        if let Some(thread_id) = thread_id {
            params["message_thread_id"] = serde_json::Value::Number(thread_id.into());
        }

        let _: bool = self
            .call(
                "sendChatAction",
                &params,
                Duration::from_secs(API_TIMEOUT_SECS),
            )
            .await?;
        debug!("Sent typing indicator to {}", conversation_id);
        Ok(())
    }

    fn start_receiving(&self) -> Option<InboundStream> {
        if !self.is_configured() {
            return None;
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let channel = TelegramChannel {
            config: self.config.clone(),
            client: self.client.clone(),
            polling_active: self.polling_active.clone(),
            last_update_id: self.last_update_id.clone(),
        };

        channel.polling_active.store(true, Ordering::SeqCst);

        // Spawn polling task
        tokio::spawn(async move {
            info!("Starting Telegram polling");

            while channel.polling_active.load(Ordering::SeqCst) {
                match channel.poll_updates().await {
                    Ok(updates) => {
                        for update in updates {
                            let Some(message) = Self::convert_update(update) else {
                                continue;
                            };
                            debug!(
                                "Received Telegram message: {} from {}",
                                message.id, message.sender_id
                            );
                            if tx.send(message).is_err() {
                                warn!("Message receiver dropped, stopping polling");
                                channel.polling_active.store(false, Ordering::SeqCst);
                                break;
                            }
                        }
                    }
                    Err(e) => {
                        error!("Telegram polling error: {}", e);
                        tokio::time::sleep(POLL_ERROR_BACKOFF).await;
                    }
                }
            }

            info!("Telegram polling stopped");
        });

        Some(Box::pin(
            tokio_stream::wrappers::UnboundedReceiverStream::new(rx),
        ))
    }
}

// ============================================================================
// Telegram API Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct TelegramResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TelegramUpdate {
    update_id: i64,
    message: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize)]
struct TelegramMessage {
    message_id: i64,
    from: Option<TelegramUser>,
    chat: TelegramChat,
    message_thread_id: Option<i64>,
    text: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramUser {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

impl TelegramUser {
    /// Username if set, otherwise "first last"
    pub fn display_name(&self) -> Option<String> {
        if let Some(username) = self.username.as_deref().filter(|u| !u.is_empty()) {
            return Some(username.to_string());
        }

        let full_name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        (!full_name.is_empty()).then_some(full_name)
    }
}

#[derive(Debug, Deserialize)]
struct TelegramChat {
    id: i64,
    r#type: String,
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TelegramMessageResponse {
    #[allow(dead_code)]
    message_id: i64,
}

// ============================================================================
// Tests
// ============================================================================
