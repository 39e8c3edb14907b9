//! Error types for the AI module

use thiserror::Error;

/// Details extracted from a failed provider response.
///
/// Every field is optional: a provider may answer with an empty body, a body
/// that is not JSON, or a status code without a registered reason phrase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpstreamFailure {
    /// Human-readable message from the provider's `error.message` field
    pub message: Option<String>,
    /// Canonical reason phrase of the HTTP status (e.g. "Too Many Requests")
    pub status_text: Option<String>,
    /// HTTP status code
    pub status_code: Option<u16>,
}

impl UpstreamFailure {
    pub fn new(status_code: u16) -> Self {
        Self {
            message: None,
            status_text: None,
            status_code: Some(status_code),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        self.message = (!message.trim().is_empty()).then_some(message);
        self
    }

    pub fn with_status_text(mut self, status_text: impl Into<String>) -> Self {
        let status_text = status_text.into();
        self.status_text = (!status_text.trim().is_empty()).then_some(status_text);
        self
    }

    /// Best available description, falling back from the provider message to
    /// the status reason phrase to the bare status code.
    pub fn describe(&self) -> String {
        match (&self.message, &self.status_text, self.status_code) {
            (Some(message), _, _) => message.clone(),
            (None, Some(status_text), _) => status_text.clone(),
            (None, None, Some(code)) => format!("Request failed with status code {}", code),
            (None, None, None) => "Request failed".to_string(),
        }
    }
}

/// AI module error types
#[derive(Error, Debug)]
pub enum AiError {
    #[error("LLM error: {0}")]
    Llm(String),

    #[error("{provider} API error: {}", .failure.describe())]
    LlmHttp {
        provider: String,
        failure: UpstreamFailure,
        retry_after_secs: Option<u64>,
    },

    #[error("Invalid response format: {0}")]
    InvalidFormat(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AiError {
    /// Whether a retry has a reasonable chance of succeeding.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::LlmHttp { failure, .. } => {
                matches!(failure.status_code, Some(408 | 409 | 429 | 500..=599))
            }
            Self::Http(error) => error.is_timeout() || error.is_connect(),
            Self::Llm(message) => {
                let message = message.to_lowercase();
                message.contains("rate limit")
                    || message.contains("overloaded")
                    || message.contains("timeout")
            }
            Self::InvalidFormat(_) | Self::Json(_) => false,
        }
    }

    /// Server-provided retry delay, in seconds.
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            Self::LlmHttp {
                retry_after_secs, ..
            } => *retry_after_secs,
            _ => None,
        }
    }

    /// The structured failure when the provider answered with an HTTP error.
    pub fn upstream_failure(&self) -> Option<&UpstreamFailure> {
        match self {
            Self::LlmHttp { failure, .. } => Some(failure),
            _ => None,
        }
    }
}

/// Result type alias for AI operations
pub type Result<T> = std::result::Result<T, AiError>;
