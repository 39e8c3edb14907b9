//! Bounded conversation context.
//!
//! Each chat keeps a rolling history of user and assistant turns. Before a
//! request goes out the history is trimmed from the front until its total
//! content length fits the [`ContextBudget`], which leaves room in the model's
//! context window for the reply.

mod session;
mod store;
mod trim;

pub use session::{Session, SessionRegistry};
pub use store::{Conversation, ConversationState, ConversationStore};
pub use trim::{
    ContextBudget, DEFAULT_CONTEXT_WINDOW, DEFAULT_RESERVED_OUTPUT, content_len, trim_history,
};
