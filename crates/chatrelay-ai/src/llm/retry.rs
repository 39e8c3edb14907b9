use std::time::Duration;

use reqwest::Response;
use serde::Deserialize;

use crate::error::{AiError, UpstreamFailure};

#[derive(Debug, Clone)]
pub struct LlmRetryConfig {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for LlmRetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 200,
            max_delay_ms: 5_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl LlmRetryConfig {
    /// Single attempt, no retries.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn delay_for(&self, attempt: u32, retry_after_secs: Option<u64>) -> Duration {
        if let Some(seconds) = retry_after_secs {
            return Duration::from_secs(seconds);
        }

        let multiplier = self
            .backoff_multiplier
            .powi(attempt.saturating_sub(1) as i32);
        let delay = (self.initial_delay_ms as f64 * multiplier) as u64;
        Duration::from_millis(delay.min(self.max_delay_ms))
    }
}

pub fn parse_retry_after(response: &Response) -> Option<u64> {
    response
        .headers()
        .get("retry-after")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok())
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Pull `error.message` out of an OpenAI-style error body.
pub(crate) fn extract_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .and_then(|error| error.message)
        .filter(|message| !message.trim().is_empty())
}

pub async fn response_to_error(response: Response, provider: &str) -> AiError {
    let status = response.status();
    let retry_after = parse_retry_after(&response);
    let body = response.text().await.unwrap_or_default();

    let mut failure = UpstreamFailure::new(status.as_u16());
    if let Some(reason) = status.canonical_reason() {
        failure = failure.with_status_text(reason);
    }
    if let Some(message) = extract_error_message(&body) {
        failure = failure.with_message(message);
    } else if !body.is_empty() {
        // Truncate error body to prevent leaking large or sensitive responses.
        const MAX_ERROR_BODY: usize = 512;
        let preview: String = body.chars().take(MAX_ERROR_BODY).collect();
        tracing::debug!(provider, status = status.as_u16(), body = %preview, "Unstructured error body");
    }

    AiError::LlmHttp {
        provider: provider.to_string(),
        failure,
        retry_after_secs: retry_after,
    }
}
