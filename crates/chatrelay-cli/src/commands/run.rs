use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use chatrelay_ai::LlmClient;
use chatrelay_core::channel::{Channel, LoggingChannel, TelegramChannel};
use chatrelay_core::conversation::SessionRegistry;
use chatrelay_core::journal::{EventLog, FileEventLog};
use chatrelay_core::runtime::{ChatDispatcher, MessageHandlerConfig, start_message_handler};

use crate::config::RelaySettings;

/// Run the relay until Ctrl-C
pub async fn run(settings: RelaySettings) -> Result<()> {
    let event_log: Arc<dyn EventLog> = Arc::new(FileEventLog::new(&settings.event_log));
    let channel = Arc::new(LoggingChannel::new(
        TelegramChannel::new(settings.telegram),
        event_log.clone(),
    ));
    let llm: Arc<dyn LlmClient> = Arc::new(settings.openai.build_client());

    let me = channel
        .inner()
        .test_connection()
        .await
        .context("Failed to reach the Telegram Bot API")?;
    let mut dispatcher_config = settings.dispatcher;
    dispatcher_config.bot_username = me.username;

    info!(
        model = %llm.model(),
        bot = dispatcher_config.bot_username.as_deref().unwrap_or("-"),
        budget = dispatcher_config.budget.limit,
        event_log = %settings.event_log.display(),
        "Starting ChatRelay"
    );

    let dispatcher = Arc::new(ChatDispatcher::new(
        llm,
        channel.clone(),
        Arc::new(SessionRegistry::new()),
        dispatcher_config,
    ));
    let mut handler = start_message_handler(
        channel.clone(),
        dispatcher,
        event_log,
        MessageHandlerConfig {
            log_updates: settings.log_updates,
        },
    );

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for shutdown signal")?;
            info!("Shutting down");
        }
        joined = &mut handler => {
            joined.context("Message handler stopped unexpectedly")?;
        }
    }

    handler.abort();
    channel.inner().stop_polling();
    info!("{} relay stopped", channel.name());
    Ok(())
}
