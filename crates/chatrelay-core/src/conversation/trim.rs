use chatrelay_ai::Message;

/// Context window the budget is derived from, in UTF-16 code units
pub const DEFAULT_CONTEXT_WINDOW: usize = 4096;
/// Space kept free for the model's reply
pub const DEFAULT_RESERVED_OUTPUT: usize = 1000;

/// Upper bound on the total content length of a history sent to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextBudget {
    pub limit: usize,
}

impl ContextBudget {
    pub fn new(context_window: usize, reserved_output: usize) -> Self {
        Self {
            limit: context_window.saturating_sub(reserved_output),
        }
    }

    pub fn with_limit(limit: usize) -> Self {
        Self { limit }
    }

    pub fn fits(&self, history: &[Message]) -> bool {
        content_len(history) <= self.limit
    }
}

impl Default for ContextBudget {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_WINDOW, DEFAULT_RESERVED_OUTPUT)
    }
}

/// Total content length of `history`, in UTF-16 code units.
pub fn content_len(history: &[Message]) -> usize {
    history.iter().map(Message::content_len).sum()
}

/// Evict the oldest messages until the history fits `budget`.
///
/// Whatever remains is a suffix of the input in its original order. A single
/// message longer than the budget is evicted as well, so the history may end
/// up empty. Returns the number of evicted messages.
pub fn trim_history(history: &mut Vec<Message>, budget: ContextBudget) -> usize {
    let mut total = content_len(history);
    let mut evict = 0;

    while evict < history.len() && total > budget.limit {
        total -= history[evict].content_len();
        evict += 1;
    }

    history.drain(..evict);
    evict
}
