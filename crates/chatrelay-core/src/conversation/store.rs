use std::collections::HashMap;

use chatrelay_ai::Message;

use super::trim::{ContextBudget, content_len, trim_history};

/// Whether a conversation has any history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    Empty,
    Active,
}

/// Rolling history of one chat, oldest message first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    pub id: String,
    pub history: Vec<Message>,
}

impl Conversation {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            history: Vec::new(),
        }
    }

    pub fn state(&self) -> ConversationState {
        if self.history.is_empty() {
            ConversationState::Empty
        } else {
            ConversationState::Active
        }
    }

    pub fn push(&mut self, message: Message) {
        self.history.push(message);
    }

    /// Trim the history to `budget`, returning how many messages were evicted
    pub fn trim(&mut self, budget: ContextBudget) -> usize {
        trim_history(&mut self.history, budget)
    }

    pub fn total_len(&self) -> usize {
        content_len(&self.history)
    }
}

/// Conversations of a single session, keyed by chat id.
///
/// None of the operations fail; missing conversations are created on demand.
#[derive(Debug, Default)]
pub struct ConversationStore {
    conversations: HashMap<String, Conversation>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Existing conversation for `id`, or a freshly inserted empty one
    pub fn get_or_create(&mut self, id: &str) -> &mut Conversation {
        self.conversations
            .entry(id.to_string())
            .or_insert_with(|| Conversation::new(id))
    }

    /// Replace the conversation for `id` with an empty one
    pub fn reset(&mut self, id: &str) {
        self.conversations
            .insert(id.to_string(), Conversation::new(id));
    }

    /// Append without enforcing the budget
    pub fn append(&mut self, id: &str, message: Message) {
        self.get_or_create(id).push(message);
    }

    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.conversations.get(id)
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }
}
