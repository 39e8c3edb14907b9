//! Bot command routing
//!
//! Only `/start` and `/reset` are commands. Anything else, unknown commands
//! included, is forwarded to the model as ordinary text.

/// Routing decision for an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// `/start` - send the greeting.
    Start,
    /// `/reset` - clear the conversation.
    Reset,
    /// Ordinary text for the model.
    Text,
}

/// Decide how to handle message `content`.
///
/// Commands may carry a `@botname` suffix (as Telegram sends them in groups)
/// and trailing arguments, which are ignored. When `bot_username` is known, a
/// command addressed to another bot is plain text; usernames compare
/// case-insensitively.
pub fn route(content: &str, bot_username: Option<&str>) -> RouteDecision {
    let Some(token) = content.split_whitespace().next() else {
        return RouteDecision::Text;
    };
    if !content.starts_with('/') {
        return RouteDecision::Text;
    }

    let (command, addressee) = match token.split_once('@') {
        Some((name, addressee)) => (name, Some(addressee)),
        None => (token, None),
    };
    if let (Some(addressee), Some(own)) = (addressee, bot_username)
        && !addressee.eq_ignore_ascii_case(own)
    {
        return RouteDecision::Text;
    }

    match command {
        "/start" => RouteDecision::Start,
        "/reset" => RouteDecision::Reset,
        _ => RouteDecision::Text,
    }
}
