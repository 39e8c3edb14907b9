//! Channel decorator that mirrors formatted replies into the event log.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use super::traits::{Channel, InboundStream};
use super::types::{ChannelType, OutboundMessage};
use crate::journal::EventLog;

/// Wraps a channel and records every formatted outgoing message.
///
/// Plain replies (greeting, reset confirmation, error text) pass through
/// without an entry.
pub struct LoggingChannel<C> {
    inner: C,
    event_log: Arc<dyn EventLog>,
}

impl<C: Channel> LoggingChannel<C> {
    pub fn new(inner: C, event_log: Arc<dyn EventLog>) -> Self {
        Self { inner, event_log }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: Channel> Channel for LoggingChannel<C> {
    fn channel_type(&self) -> ChannelType {
        self.inner.channel_type()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn is_configured(&self) -> bool {
        self.inner.is_configured()
    }

    async fn send(&self, message: OutboundMessage) -> Result<()> {
        if message.is_formatted() {
            self.event_log
                .record(&format!("Outgoing message: {}", message.content))
                .await;
        }
        self.inner.send(message).await
    }

    async fn send_typing(&self, conversation_id: &str) -> Result<()> {
        self.inner.send_typing(conversation_id).await
    }

    fn start_receiving(&self) -> Option<InboundStream> {
        self.inner.start_receiving()
    }
}
