//! Chat Dispatcher - relays conversation turns to the completion model.
//!
//! Each chat keeps a rolling history inside the sender's session. A text
//! message is appended to that history, the history is trimmed to the context
//! budget and sent to the model, and the reply is appended and relayed back.

use anyhow::Result;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::channel::{Channel, InboundMessage, OutboundMessage};
use crate::conversation::{ContextBudget, SessionRegistry};
use chatrelay_ai::{AiError, CompletionRequest, LlmClient, Message};

use super::commands::{RouteDecision, route};

/// Greeting sent in reply to `/start`
pub const DEFAULT_GREETING: &str = "Привіт, я - штучний інтелект створений OpenAI!🤖\n\
Я завжди на сторожі, готовий допомогти вам порадами і рішеннями будь-яких питань. \
Мої можливості безмежні, тому не соромтеся звертатися до мене будь-коли.\n\
Я радий бути частиною вашого життя і бажаю успіхів в усіх починаннях!\n\
Запитай в мене щось😏";

/// Confirmation sent in reply to `/reset`
pub const DEFAULT_RESET_REPLY: &str = "Chat has been reset!";

/// Configuration for the ChatDispatcher.
#[derive(Debug, Clone)]
pub struct ChatDispatcherConfig {
    /// Upper bound on the length of the model's reply, in tokens.
    pub max_output_tokens: u32,
    /// Budget the history is trimmed to before each request.
    pub budget: ContextBudget,
    /// Reply to `/start`.
    pub greeting: String,
    /// Reply to `/reset`.
    pub reset_reply: String,
    /// Whether to send typing indicator while waiting for the model.
    pub send_typing_indicator: bool,
    /// The bot's own username; commands addressed to other bots are text.
    pub bot_username: Option<String>,
}

impl Default for ChatDispatcherConfig {
    fn default() -> Self {
        Self {
            max_output_tokens: 1000,
            budget: ContextBudget::default(),
            greeting: DEFAULT_GREETING.to_string(),
            reset_reply: DEFAULT_RESET_REPLY.to_string(),
            send_typing_indicator: true,
            bot_username: None,
        }
    }
}

/// Failure of a chat turn.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The completion service answered with an error; the text is shown to the user.
    #[error("{0}")]
    Upstream(String),
    /// Anything else; logged, never shown to the user.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ChatError {
    /// Sort a completion failure into user-facing or internal.
    pub fn classify(error: AiError) -> Self {
        if let Some(failure) = error.upstream_failure() {
            return Self::Upstream(failure.describe());
        }
        Self::Internal(error.into())
    }

    /// Text to send back to the user, if any.
    pub fn user_message(&self) -> Option<&str> {
        match self {
            Self::Upstream(text) => Some(text.as_str()),
            Self::Internal(_) => None,
        }
    }
}

/// Dispatches inbound messages to command handlers or the completion model.
pub struct ChatDispatcher {
    llm: Arc<dyn LlmClient>,
    channel: Arc<dyn Channel>,
    sessions: Arc<SessionRegistry>,
    config: ChatDispatcherConfig,
}

impl ChatDispatcher {
    /// Create a new ChatDispatcher.
    pub fn new(
        llm: Arc<dyn LlmClient>,
        channel: Arc<dyn Channel>,
        sessions: Arc<SessionRegistry>,
        config: ChatDispatcherConfig,
    ) -> Self {
        Self {
            llm,
            channel,
            sessions,
            config,
        }
    }

    pub fn config(&self) -> &ChatDispatcherConfig {
        &self.config
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    /// Route a message and run the matching operation.
    pub async fn dispatch(&self, message: &InboundMessage) -> Result<()> {
        match route(&message.content, self.config.bot_username.as_deref()) {
            RouteDecision::Start => self.on_start(message).await,
            RouteDecision::Reset => self.on_reset(message).await,
            RouteDecision::Text => self.on_text(message).await,
        }
    }

    /// Send the greeting. Conversation state is left untouched.
    pub async fn on_start(&self, message: &InboundMessage) -> Result<()> {
        debug!("Sending greeting to {}", message.conversation_id);
        self.channel
            .send_text(&message.conversation_id, &self.config.greeting)
            .await
    }

    /// Clear the conversation history and confirm.
    pub async fn on_reset(&self, message: &InboundMessage) -> Result<()> {
        let session = self.sessions.session(&message.sender_id);
        let turn_lock = session.turn_lock(&message.conversation_id);
        let _turn = turn_lock.lock().await;

        session.with_store(|store| store.reset(&message.conversation_id));
        info!(
            "Conversation {} reset by {}",
            message.conversation_id, message.sender_id
        );

        self.channel
            .send_text(&message.conversation_id, &self.config.reset_reply)
            .await
    }

    /// Run one conversation turn.
    ///
    /// Upstream failures are reported to the user and leave the unanswered
    /// user message in the history. Other failures are returned.
    pub async fn on_text(&self, message: &InboundMessage) -> Result<()> {
        let conversation_id = message.conversation_id.as_str();
        let session = self.sessions.session(&message.sender_id);
        let turn_lock = session.turn_lock(conversation_id);
        let _turn = turn_lock.lock().await;

        // 1. Append and trim
        let budget = self.config.budget;
        let (prompt, evicted) = session.with_store(|store| {
            let conversation = store.get_or_create(conversation_id);
            conversation.push(Message::user(&message.content));
            let evicted = conversation.trim(budget);
            (conversation.history.clone(), evicted)
        });
        if evicted > 0 {
            debug!(
                "Evicted {} message(s) from conversation {} to fit {} units",
                evicted, conversation_id, budget.limit
            );
        }

        // 2. Send typing indicator if enabled
        if self.config.send_typing_indicator
            && let Err(e) = self.channel.send_typing(conversation_id).await
        {
            warn!("Failed to send typing indicator: {}", e);
        }

        // 3. Ask the model
        debug!(
            "Requesting completion from {} ({}) with {} message(s)",
            self.llm.provider(),
            self.llm.model(),
            prompt.len()
        );
        let request =
            CompletionRequest::new(prompt).with_max_tokens(self.config.max_output_tokens);
        let response = match self.llm.complete(request).await {
            Ok(response) => response,
            Err(error) => return self.handle_failure(conversation_id, error).await,
        };

        // 4. Record and relay the reply
        let reply = response.message;
        session.with_store(|store| store.append(conversation_id, reply.clone()));

        info!(
            "Relaying reply for conversation {} (output length: {} units)",
            conversation_id,
            reply.content_len()
        );
        self.channel
            .send(OutboundMessage::markdown(conversation_id, reply.content))
            .await
    }

    async fn handle_failure(&self, conversation_id: &str, error: AiError) -> Result<()> {
        match ChatError::classify(error) {
            ChatError::Upstream(text) => {
                warn!(
                    "Completion failed for conversation {}: {}",
                    conversation_id, text
                );
                self.channel.send_text(conversation_id, &text).await
            }
            ChatError::Internal(e) => Err(e),
        }
    }
}
