//! Channel Types
//!
//! Core message types shared by the transport and the runtime.

use serde::{Deserialize, Serialize};

/// Channel type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    Telegram,
}

impl ChannelType {
    /// Display name for logs
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Telegram => "Telegram",
        }
    }
}

impl std::fmt::Display for ChannelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Text formatting applied by the receiving platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseMode {
    Markdown,
}

impl ParseMode {
    /// Value of the Bot API `parse_mode` parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markdown => "Markdown",
        }
    }
}

/// Inbound message from a channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Unique message ID
    pub id: String,
    /// Channel this message came from
    pub channel_type: ChannelType,
    /// Sender identifier (user ID in the channel)
    pub sender_id: String,
    /// Sender display name (if available)
    pub sender_name: Option<String>,
    /// Conversation identifier (chat_id, or chat_id:thread_id for forum topics)
    pub conversation_id: String,
    /// Message text
    pub content: String,
    /// Timestamp (milliseconds since epoch)
    pub timestamp: i64,
    /// Channel-specific metadata
    pub metadata: Option<serde_json::Value>,
}

impl InboundMessage {
    /// Create a new inbound message
    pub fn new(
        id: impl Into<String>,
        channel_type: ChannelType,
        sender_id: impl Into<String>,
        conversation_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            channel_type,
            sender_id: sender_id.into(),
            sender_name: None,
            conversation_id: conversation_id.into(),
            content: content.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            metadata: None,
        }
    }

    /// Set sender name
    pub fn with_sender_name(mut self, name: impl Into<String>) -> Self {
        self.sender_name = Some(name.into());
        self
    }

    /// Set metadata
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Name used when logging who sent the message
    pub fn sender_label(&self) -> &str {
        self.sender_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.sender_id)
    }
}

/// Outbound message to a channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Conversation identifier
    pub conversation_id: String,
    /// Message content
    pub content: String,
    /// Parse mode; `None` sends the text as-is
    pub parse_mode: Option<ParseMode>,
}

impl OutboundMessage {
    /// Plain text reply
    pub fn plain(conversation_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            content: content.into(),
            parse_mode: None,
        }
    }

    /// Formatted (Markdown) reply
    pub fn markdown(conversation_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::plain(conversation_id, content).with_parse_mode(ParseMode::Markdown)
    }

    /// Set parse mode
    pub fn with_parse_mode(mut self, mode: ParseMode) -> Self {
        self.parse_mode = Some(mode);
        self
    }

    /// Whether the platform will render formatting for this message
    pub fn is_formatted(&self) -> bool {
        self.parse_mode.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_type_display_name() {
        assert_eq!(ChannelType::Telegram.display_name(), "Telegram");
        assert_eq!(ChannelType::Telegram.to_string(), "Telegram");
    }

    #[test]
    fn test_outbound_variants() {
        let plain = OutboundMessage::plain("123", "Chat has been reset!");
        assert_eq!(plain.parse_mode, None);
        assert!(!plain.is_formatted());

        let formatted = OutboundMessage::markdown("123", "*bold*");
        assert_eq!(formatted.parse_mode, Some(ParseMode::Markdown));
        assert!(formatted.is_formatted());
        assert_eq!(ParseMode::Markdown.as_str(), "Markdown");
    }

    #[test]
    fn test_inbound_message_builder() {
        let msg = InboundMessage::new(
            "msg-1",
            ChannelType::Telegram,
            "user-123",
            "chat-456",
            "Hello world",
        )
        .with_sender_name("John");

        assert_eq!(msg.id, "msg-1");
        assert_eq!(msg.sender_name, Some("John".to_string()));
        assert_eq!(msg.sender_label(), "John");
    }

    #[test]
    fn test_sender_label_falls_back_to_id() {
        let msg = InboundMessage::new("m", ChannelType::Telegram, "42", "42", "hi");
        assert_eq!(msg.sender_label(), "42");

        let msg = msg.with_sender_name("");
        assert_eq!(msg.sender_label(), "42");
    }
}
