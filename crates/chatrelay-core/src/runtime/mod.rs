pub mod channel;

pub use channel::{
    ChatDispatcher, ChatDispatcherConfig, ChatError, MessageHandlerConfig, RouteDecision, route,
    start_message_handler,
};
