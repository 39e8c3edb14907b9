//! Deterministic mock LLM client for orchestration tests.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::{Duration, sleep};

use crate::error::{AiError, Result, UpstreamFailure};

use super::{CompletionRequest, CompletionResponse, FinishReason, LlmClient, Message, TokenUsage};

/// Deterministic step for scripted mock completions.
#[derive(Debug, Clone)]
pub enum MockStepKind {
    /// Return a plain assistant message.
    Text(String),
    /// Fail the way an HTTP error response from the provider would.
    Upstream(UpstreamFailure),
    /// Return an untyped LLM error.
    Error(String),
}

/// Scripted completion step with optional delay.
#[derive(Debug, Clone)]
pub struct MockStep {
    pub delay_ms: u64,
    pub kind: MockStepKind,
}

impl MockStep {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            delay_ms: 0,
            kind: MockStepKind::Text(content.into()),
        }
    }

    pub fn upstream(failure: UpstreamFailure) -> Self {
        Self {
            delay_ms: 0,
            kind: MockStepKind::Upstream(failure),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            delay_ms: 0,
            kind: MockStepKind::Error(message.into()),
        }
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }
}

/// A deterministic mock LLM client driven by scripted steps.
///
/// Every request is recorded so tests can assert on the prompt that was sent.
#[derive(Debug, Clone, Default)]
pub struct MockLlmClient {
    model: String,
    script: Arc<Mutex<VecDeque<MockStep>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockLlmClient {
    pub fn new(model: impl Into<String>) -> Self {
        Self::from_steps(model, Vec::new())
    }

    pub fn from_steps(model: impl Into<String>, steps: Vec<MockStep>) -> Self {
        Self {
            model: model.into(),
            script: Arc::new(Mutex::new(VecDeque::from(steps))),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn push_step(&self, step: MockStep) {
        self.script.lock().await.push_back(step);
    }

    /// All requests received so far, oldest first.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }

    async fn next_step(&self) -> Option<MockStep> {
        self.script.lock().await.pop_front()
    }

    fn usage_for(content_len: usize) -> TokenUsage {
        let completion_tokens = content_len as u32;
        TokenUsage {
            prompt_tokens: 1,
            completion_tokens,
            total_tokens: 1 + completion_tokens,
        }
    }

    fn text_response(content: String) -> CompletionResponse {
        CompletionResponse {
            usage: Some(Self::usage_for(content.len())),
            message: Message::assistant(content),
            finish_reason: FinishReason::Stop,
        }
    }

    fn fallback_response(request: &CompletionRequest) -> CompletionResponse {
        let text = request
            .messages
            .iter()
            .rev()
            .find(|msg| matches!(msg.role, super::Role::User))
            .map(|msg| format!("mock-echo: {}", msg.content))
            .unwrap_or_else(|| "mock-ok".to_string());

        Self::text_response(text)
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    fn provider(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        self.requests.lock().await.push(request.clone());

        let step = self.next_step().await;
        let Some(step) = step else {
            return Ok(Self::fallback_response(&request));
        };

        if step.delay_ms > 0 {
            sleep(Duration::from_millis(step.delay_ms)).await;
        }

        match step.kind {
            MockStepKind::Text(content) => Ok(Self::text_response(content)),
            MockStepKind::Upstream(failure) => Err(AiError::LlmHttp {
                provider: "mock".to_string(),
                failure,
                retry_after_secs: None,
            }),
            MockStepKind::Error(message) => Err(AiError::Llm(message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_client_returns_scripted_text() {
        let client = MockLlmClient::from_steps("mock-model", vec![MockStep::text("hello")]);

        let response = client
            .complete(CompletionRequest::new(vec![Message::user("ping")]))
            .await
            .expect("mock response should succeed");

        assert_eq!(response.message, Message::assistant("hello"));
        assert_eq!(response.finish_reason, FinishReason::Stop);
    }

    #[tokio::test]
    async fn mock_client_echoes_when_script_is_empty() {
        let client = MockLlmClient::new("mock-model");

        let response = client
            .complete(CompletionRequest::new(vec![Message::user("ping")]))
            .await
            .unwrap();

        assert_eq!(response.message.content, "mock-echo: ping");
    }

    #[tokio::test]
    async fn mock_client_returns_scripted_upstream_failure() {
        let client = MockLlmClient::from_steps(
            "mock-model",
            vec![MockStep::upstream(
                UpstreamFailure::new(429).with_message("rate limited"),
            )],
        );

        let error = client
            .complete(CompletionRequest::new(vec![Message::user("ping")]))
            .await
            .unwrap_err();

        assert_eq!(
            error.upstream_failure().and_then(|f| f.message.as_deref()),
            Some("rate limited")
        );
    }

    #[tokio::test]
    async fn mock_client_records_requests() {
        let client = MockLlmClient::new("mock-model");
        client
            .complete(CompletionRequest::new(vec![Message::user("one")]).with_max_tokens(10))
            .await
            .unwrap();

        let requests = client.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].max_tokens, Some(10));
        assert_eq!(requests[0].messages, vec![Message::user("one")]);
    }
}
