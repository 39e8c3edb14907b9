//! OpenAI LLM provider

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AiError, Result};
use crate::http_client::build_http_client;
use crate::llm::client::{
    CompletionRequest, CompletionResponse, FinishReason, LlmClient, Message, Role, TokenUsage,
};
use crate::llm::retry::{LlmRetryConfig, response_to_error};

const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI client
pub struct OpenAIClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    retry_config: LlmRetryConfig,
}

impl OpenAIClient {
    /// Create a new OpenAI client
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: build_http_client(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            retry_config: LlmRetryConfig::default(),
        }
    }

    /// Set the model to use
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set custom base URL (for API-compatible services)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry_config(mut self, config: LlmRetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    fn build_body(&self, request: &CompletionRequest) -> OpenAIRequest {
        OpenAIRequest {
            model: self.model.clone(),
            messages: request
                .messages
                .iter()
                .map(|m| OpenAIMessage {
                    role: m.role.as_str().to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }

    fn parse_response(&self, data: OpenAIResponse) -> Result<CompletionResponse> {
        let choice = data
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AiError::InvalidFormat("No choices in OpenAI response".to_string()))?;

        if let Some(role) = choice.message.role.as_deref()
            && role != Role::Assistant.as_str()
        {
            tracing::debug!(role, "OpenAI reply carries unexpected role, treating as assistant");
        }

        let content = choice.message.content.ok_or_else(|| {
            AiError::InvalidFormat("OpenAI response message has no content".to_string())
        })?;

        Ok(CompletionResponse {
            message: Message::assistant(content),
            finish_reason: FinishReason::from_api(choice.finish_reason.as_deref()),
            usage: data.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
        })
    }
}

#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIResponseMessage {
    role: Option<String>,
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[async_trait]
impl LlmClient for OpenAIClient {
    fn provider(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let body = self.build_body(&request);
        let mut last_error = None;

        for attempt in 0..=self.retry_config.max_retries {
            let response = match self
                .client
                .post(format!("{}/chat/completions", self.base_url))
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    let error = AiError::Http(e);
                    if !error.is_retryable() || attempt == self.retry_config.max_retries {
                        return Err(error);
                    }
                    let delay = self.retry_config.delay_for(attempt + 1, None);
                    tracing::warn!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis(),
                        "Retrying OpenAI request after connection error"
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(error);
                    continue;
                }
            };

            if response.status().is_success() {
                let data: OpenAIResponse = response.json().await?;
                return self.parse_response(data);
            }

            let error = response_to_error(response, "OpenAI").await;
            if !error.is_retryable() || attempt == self.retry_config.max_retries {
                return Err(error);
            }

            let delay = self
                .retry_config
                .delay_for(attempt + 1, error.retry_after());
            tracing::warn!(
                attempt = attempt + 1,
                delay_ms = delay.as_millis(),
                "Retrying OpenAI request"
            );
            tokio::time::sleep(delay).await;
            last_error = Some(error);
        }

        Err(last_error
            .unwrap_or_else(|| AiError::Llm("OpenAI request failed after retries".to_string())))
    }
}
