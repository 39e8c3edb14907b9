//! Channel Message Handler
//!
//! Consumes the inbound stream of a channel, records every message in the
//! event log and hands it to the chat dispatcher.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_stream::StreamExt;
use tracing::{debug, error, info, warn};

use crate::channel::{Channel, InboundMessage};
use crate::journal::EventLog;

use super::chat_dispatcher::ChatDispatcher;

#[cfg(test)]
const STREAM_RECONNECT_DELAY: Duration = Duration::from_millis(20);
#[cfg(not(test))]
const STREAM_RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Message handler configuration
#[derive(Debug, Clone, Default)]
pub struct MessageHandlerConfig {
    /// Log every inbound update in full at `info` level
    pub log_updates: bool,
}

/// Start the message handler loop
///
/// Messages of one conversation are processed one after another in arrival
/// order; different conversations are processed concurrently.
pub fn start_message_handler(
    channel: Arc<dyn Channel>,
    dispatcher: Arc<ChatDispatcher>,
    event_log: Arc<dyn EventLog>,
    config: MessageHandlerConfig,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let channel_name = channel.name().to_string();
        info!("Listening for messages on {}", channel_name);

        let mut lanes = ConversationLanes::new(dispatcher, event_log.clone());

        loop {
            let Some(mut stream) = channel.start_receiving() else {
                warn!(
                    "Failed to start message stream for {}, retrying in {:?}",
                    channel_name, STREAM_RECONNECT_DELAY
                );
                sleep(STREAM_RECONNECT_DELAY).await;
                continue;
            };

            while let Some(message) = stream.next().await {
                debug!(
                    "Handler received message {} from {}",
                    message.id, message.conversation_id
                );

                event_log
                    .record(&format!(
                        "Incoming message from {}: {}",
                        message.sender_label(),
                        message.content
                    ))
                    .await;
                if config.log_updates {
                    info!(update = ?message, "Inbound update");
                }

                lanes.submit(message);
            }

            warn!(
                "Message stream ended for {}, restarting in {:?}",
                channel_name, STREAM_RECONNECT_DELAY
            );
            sleep(STREAM_RECONNECT_DELAY).await;
        }
    })
}

/// One sequential worker per (sender, conversation) pair
///
/// A lane with no queued or running message is dropped on the next submit;
/// dropping its sender ends the worker task.
struct ConversationLanes {
    dispatcher: Arc<ChatDispatcher>,
    event_log: Arc<dyn EventLog>,
    lanes: HashMap<String, Lane>,
}

struct Lane {
    tx: mpsc::UnboundedSender<InboundMessage>,
    pending: Arc<AtomicUsize>,
}

impl Lane {
    fn spawn(dispatcher: Arc<ChatDispatcher>, event_log: Arc<dyn EventLog>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<InboundMessage>();
        let pending = Arc::new(AtomicUsize::new(0));
        let in_flight = pending.clone();
        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                handle_message(&dispatcher, event_log.as_ref(), &message).await;
                in_flight.fetch_sub(1, Ordering::AcqRel);
            }
        });
        Self { tx, pending }
    }

    fn is_idle(&self) -> bool {
        self.pending.load(Ordering::Acquire) == 0 || self.tx.is_closed()
    }

    fn send(&self, message: InboundMessage) -> Result<(), InboundMessage> {
        self.pending.fetch_add(1, Ordering::AcqRel);
        self.tx.send(message).map_err(|mpsc::error::SendError(message)| {
            self.pending.fetch_sub(1, Ordering::AcqRel);
            message
        })
    }
}

impl ConversationLanes {
    fn new(dispatcher: Arc<ChatDispatcher>, event_log: Arc<dyn EventLog>) -> Self {
        Self {
            dispatcher,
            event_log,
            lanes: HashMap::new(),
        }
    }

    fn submit(&mut self, message: InboundMessage) {
        let key = format!("{}/{}", message.sender_id, message.conversation_id);
        self.lanes.retain(|k, lane| *k == key || !lane.is_idle());

        let lane = self
            .lanes
            .entry(key.clone())
            .or_insert_with(|| Lane::spawn(self.dispatcher.clone(), self.event_log.clone()));
        let Err(message) = lane.send(message) else {
            return;
        };

        // Worker gone (panicked); start a fresh one.
        warn!("Lane {} stopped, restarting", key);
        let lane = Lane::spawn(self.dispatcher.clone(), self.event_log.clone());
        if lane.send(message).is_ok() {
            self.lanes.insert(key, lane);
        }
    }
}

/// Process a single inbound message
async fn handle_message(
    dispatcher: &ChatDispatcher,
    event_log: &dyn EventLog,
    message: &InboundMessage,
) {
    match dispatcher.dispatch(message).await {
        Ok(()) => {
            debug!("Message {} handled successfully", message.id);
        }
        Err(e) => {
            error!(
                "Error handling message {} from {}: {:#}",
                message.id, message.conversation_id, e
            );
            event_log
                .record(&format!(
                    "Error handling message {} from {}: {:#}",
                    message.id, message.conversation_id, e
                ))
                .await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::mock::CaptureChannel;
    use crate::channel::{ChannelType, InboundStream, OutboundMessage};
    use crate::conversation::SessionRegistry;
    use crate::journal::mock::MemoryEventLog;
    use crate::runtime::channel::ChatDispatcherConfig;
    use anyhow::Result as AnyhowResult;
    use async_trait::async_trait;
    use chatrelay_ai::{Message, MockLlmClient, MockStep};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::sync::Mutex as AsyncMutex;
    use tokio::time::timeout;
    use tokio_stream::iter;

    fn create_message(id: &str, content: &str) -> InboundMessage {
        InboundMessage::new(id, ChannelType::Telegram, "user-1", "chat-1", content)
            .with_sender_name("ada")
    }

    struct ReconnectTestChannel {
        streams: Mutex<VecDeque<Vec<InboundMessage>>>,
        sent_messages: Arc<AsyncMutex<Vec<OutboundMessage>>>,
        start_calls: Arc<AtomicUsize>,
    }

    impl ReconnectTestChannel {
        fn new(batches: Vec<Vec<InboundMessage>>) -> Self {
            Self {
                streams: Mutex::new(VecDeque::from(batches)),
                sent_messages: Arc::new(AsyncMutex::new(Vec::new())),
                start_calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl Channel for ReconnectTestChannel {
        fn channel_type(&self) -> ChannelType {
            ChannelType::Telegram
        }

        fn is_configured(&self) -> bool {
            true
        }

        async fn send(&self, message: OutboundMessage) -> AnyhowResult<()> {
            self.sent_messages.lock().await.push(message);
            Ok(())
        }

        fn start_receiving(&self) -> Option<InboundStream> {
            self.start_calls.fetch_add(1, Ordering::SeqCst);
            let mut streams = self.streams.lock().expect("lock reconnect test streams");
            let batch = streams.pop_front()?;
            Some(Box::pin(iter(batch)))
        }
    }

    fn dispatcher_for(channel: Arc<dyn Channel>, llm: MockLlmClient) -> Arc<ChatDispatcher> {
        Arc::new(ChatDispatcher::new(
            Arc::new(llm),
            channel,
            Arc::new(SessionRegistry::new()),
            ChatDispatcherConfig::default(),
        ))
    }

    async fn wait_for(condition: impl AsyncFn() -> bool) {
        timeout(Duration::from_secs(2), async {
            while !condition().await {
                sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("condition should be reached");
    }

    #[test]
    fn test_config_defaults() {
        assert!(!MessageHandlerConfig::default().log_updates);
    }

    #[tokio::test]
    async fn test_handler_recovers_after_stream_ends() {
        let test_channel = Arc::new(ReconnectTestChannel::new(vec![
            vec![create_message("msg-1", "first")],
            vec![create_message("msg-2", "second")],
        ]));
        let sent_messages = test_channel.sent_messages.clone();
        let start_calls = test_channel.start_calls.clone();
        let event_log = Arc::new(MemoryEventLog::default());

        let dispatcher = dispatcher_for(test_channel.clone(), MockLlmClient::new("mock"));
        let handle = start_message_handler(
            test_channel,
            dispatcher,
            event_log.clone(),
            MessageHandlerConfig::default(),
        );

        wait_for(async || {
            sent_messages.lock().await.len() >= 2 && start_calls.load(Ordering::SeqCst) >= 2
        })
        .await;
        handle.abort();

        let entries = event_log.entries();
        assert!(entries.contains(&"Incoming message from ada: first".to_string()));
        assert!(entries.contains(&"Incoming message from ada: second".to_string()));
    }

    #[tokio::test]
    async fn test_messages_in_a_conversation_keep_arrival_order() {
        let test_channel = Arc::new(ReconnectTestChannel::new(vec![vec![
            create_message("msg-1", "first"),
            create_message("msg-2", "second"),
        ]]));
        let sent_messages = test_channel.sent_messages.clone();
        let llm = MockLlmClient::from_steps(
            "mock",
            vec![MockStep::text("one").with_delay(50), MockStep::text("two")],
        );

        let dispatcher = dispatcher_for(test_channel.clone(), llm.clone());
        let handle = start_message_handler(
            test_channel,
            dispatcher,
            Arc::new(MemoryEventLog::default()),
            MessageHandlerConfig::default(),
        );

        wait_for(async || sent_messages.lock().await.len() >= 2).await;
        handle.abort();

        let requests = llm.requests().await;
        assert_eq!(requests[0].messages, vec![Message::user("first")]);
        assert_eq!(
            requests[1].messages,
            vec![
                Message::user("first"),
                Message::assistant("one"),
                Message::user("second"),
            ]
        );
        let sent = sent_messages.lock().await;
        assert_eq!(sent[0].content, "one");
        assert_eq!(sent[1].content, "two");
    }

    #[tokio::test]
    async fn test_dispatch_errors_are_logged_not_sent() {
        let test_channel = Arc::new(ReconnectTestChannel::new(vec![vec![create_message(
            "msg-1", "hello",
        )]]));
        let sent_messages = test_channel.sent_messages.clone();
        let event_log = Arc::new(MemoryEventLog::default());
        let llm = MockLlmClient::from_steps("mock", vec![MockStep::error("socket closed")]);

        let dispatcher = dispatcher_for(test_channel.clone(), llm);
        let handle = start_message_handler(
            test_channel,
            dispatcher,
            event_log.clone(),
            MessageHandlerConfig { log_updates: true },
        );

        let log = event_log.clone();
        wait_for(async || log.entries().len() >= 2).await;
        handle.abort();

        let entries = event_log.entries();
        assert_eq!(entries[0], "Incoming message from ada: hello");
        assert!(entries[1].starts_with("Error handling message msg-1 from chat-1"));
        assert!(entries[1].contains("socket closed"));
        assert!(sent_messages.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_idle_lanes_are_dropped() {
        let channel = Arc::new(CaptureChannel::default());
        let sent = channel.sent.clone();
        let dispatcher = dispatcher_for(channel, MockLlmClient::new("mock"));
        let mut lanes = ConversationLanes::new(dispatcher, Arc::new(MemoryEventLog::default()));

        lanes.submit(create_message("msg-1", "first"));
        wait_for(async || lanes.lanes.values().all(Lane::is_idle)).await;

        let other = InboundMessage::new("msg-2", ChannelType::Telegram, "user-2", "chat-2", "hi");
        lanes.submit(other);
        assert_eq!(lanes.lanes.len(), 1);
        assert!(lanes.lanes.contains_key("user-2/chat-2"));
        wait_for(async || lanes.lanes.values().all(Lane::is_idle)).await;

        // A dropped lane is recreated on demand.
        lanes.submit(create_message("msg-3", "again"));
        wait_for(async || sent.lock().await.len() >= 3).await;
        assert_eq!(lanes.lanes.len(), 1);
    }

    #[tokio::test]
    async fn test_channel_without_stream_keeps_retrying() {
        let test_channel = Arc::new(ReconnectTestChannel::new(Vec::new()));
        let start_calls = test_channel.start_calls.clone();
        let dispatcher = dispatcher_for(
            Arc::new(CaptureChannel::default()),
            MockLlmClient::new("mock"),
        );

        let handle = start_message_handler(
            test_channel,
            dispatcher,
            Arc::new(MemoryEventLog::default()),
            MessageHandlerConfig::default(),
        );

        wait_for(async || start_calls.load(Ordering::SeqCst) >= 3).await;
        handle.abort();
    }
}
