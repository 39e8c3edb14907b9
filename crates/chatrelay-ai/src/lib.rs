//! ChatRelay AI - chat-completion client layer
//!
//! This crate provides:
//! - A provider-agnostic `LlmClient` trait with role-tagged messages
//! - An OpenAI-compatible chat-completion client
//! - Typed upstream failures for translating provider errors to users
//! - A scripted mock client (feature `test-utils`)

pub mod error;
mod http_client;
pub mod llm;

// Re-export commonly used types
pub use error::{AiError, Result, UpstreamFailure};
pub use llm::{
    CompletionRequest, CompletionResponse, FinishReason, LlmClient, LlmRetryConfig, Message,
    OpenAIClient, Role, TokenUsage,
};

#[cfg(any(test, feature = "test-utils"))]
pub use llm::{MockLlmClient, MockStep};
