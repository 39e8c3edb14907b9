//! ChatRelay core
//!
//! Relays Telegram chats to a chat-completion model while keeping a bounded,
//! per-chat conversation history:
//!
//! - [`conversation`]: context store, budget trimmer and session registry
//! - [`channel`]: messaging transport (Telegram) and outbound logging
//! - [`journal`]: the append-only event log
//! - [`runtime`]: command routing, the chat dispatcher and the inbound loop

pub mod channel;
pub mod conversation;
pub mod journal;
pub mod runtime;

pub use chatrelay_ai::{LlmClient, Message, Role};
