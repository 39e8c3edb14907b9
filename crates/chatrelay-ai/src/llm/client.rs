//! LLM client trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Chat message role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Content length in UTF-16 code units
    ///
    /// Characters outside the Basic Multilingual Plane (most emoji) count twice.
    pub fn content_len(&self) -> usize {
        self.content.encode_utf16().count()
    }
}

/// LLM completion response
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// The reply, always assistant-role
    pub message: Message,
    pub finish_reason: FinishReason,
    pub usage: Option<TokenUsage>,
}

/// Reason for completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    MaxTokens,
    ContentFilter,
    Other(String),
}

impl FinishReason {
    pub fn from_api(reason: Option<&str>) -> Self {
        match reason {
            Some("stop") | None => Self::Stop,
            Some("length") => Self::MaxTokens,
            Some("content_filter") => Self::ContentFilter,
            Some(other) => Self::Other(other.to_string()),
        }
    }
}

/// Token usage statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// LLM completion request
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    /// Create a new completion request
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Set temperature
    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }
}

/// LLM client trait
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Get provider name
    fn provider(&self) -> &str;

    /// Get model name
    fn model(&self) -> &str;

    /// Complete a chat request
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;
}
