use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::store::ConversationStore;

/// State owned by one user session: its conversations and their turn locks.
#[derive(Debug, Default)]
pub struct Session {
    store: Mutex<ConversationStore>,
    turn_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl Session {
    /// Run `f` against the conversation store.
    ///
    /// The lock is synchronous; `f` must not await.
    pub fn with_store<R>(&self, f: impl FnOnce(&mut ConversationStore) -> R) -> R {
        f(&mut self.store.lock())
    }

    /// Lock serialising turns within one conversation.
    ///
    /// Waiters acquire it in arrival order.
    pub fn turn_lock(&self, conversation_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.turn_locks
            .lock()
            .entry(conversation_id.to_string())
            .or_default()
            .clone()
    }
}

/// Maps session keys (Telegram sender ids) to their [`Session`].
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session for `key`, created on first use
    pub fn session(&self, key: &str) -> Arc<Session> {
        self.sessions
            .lock()
            .entry(key.to_string())
            .or_default()
            .clone()
    }

    pub fn get(&self, key: &str) -> Option<Arc<Session>> {
        self.sessions.lock().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}
