//! Channel Trait Definitions

use anyhow::Result;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use super::types::{ChannelType, InboundMessage, OutboundMessage};

/// Stream of inbound messages produced by a receiving channel
pub type InboundStream = Pin<Box<dyn Stream<Item = InboundMessage> + Send>>;

/// Communication channel trait
///
/// A channel sends replies and, when it supports receiving, yields inbound
/// messages through [`Channel::start_receiving`].
///
/// # Example
///
/// ```ignore
/// struct MyChannel { /* ... */ }
///
/// #[async_trait]
/// impl Channel for MyChannel {
///     fn channel_type(&self) -> ChannelType {
///         ChannelType::Telegram
///     }
///
///     fn is_configured(&self) -> bool {
///         !self.token.is_empty()
///     }
///
///     async fn send(&self, message: OutboundMessage) -> Result<()> {
///         // Send message via API
///         Ok(())
///     }
///
///     fn start_receiving(&self) -> Option<InboundStream> {
///         None
///     }
/// }
/// ```
#[async_trait]
pub trait Channel: Send + Sync {
    /// Get channel type
    fn channel_type(&self) -> ChannelType;

    /// Get channel display name
    fn name(&self) -> &str {
        self.channel_type().display_name()
    }

    /// Check if channel is properly configured
    fn is_configured(&self) -> bool;

    /// Send a message to the channel
    async fn send(&self, message: OutboundMessage) -> Result<()>;

    /// Send a plain text message
    async fn send_text(&self, conversation_id: &str, text: &str) -> Result<()> {
        self.send(OutboundMessage::plain(conversation_id, text)).await
    }

    /// Show a "typing" indicator; channels without one do nothing
    async fn send_typing(&self, _conversation_id: &str) -> Result<()> {
        Ok(())
    }

    /// Start receiving messages (returns None if the channel cannot receive)
    ///
    /// The returned stream is fed by a background task owned by the channel.
    fn start_receiving(&self) -> Option<InboundStream>;
}
