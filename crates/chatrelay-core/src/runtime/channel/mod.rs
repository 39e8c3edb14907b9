//! Channel runtime: command routing, the chat dispatcher and the inbound
//! message loop.

mod chat_dispatcher;
mod commands;
mod handler;

pub use chat_dispatcher::{
    ChatDispatcher, ChatDispatcherConfig, ChatError, DEFAULT_GREETING, DEFAULT_RESET_REPLY,
};
pub use commands::{RouteDecision, route};
pub use handler::{MessageHandlerConfig, start_message_handler};
