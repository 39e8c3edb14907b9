use anyhow::{Context, Result};
use colored::Colorize;

use chatrelay_core::channel::TelegramChannel;

use crate::config::RelaySettings;

/// Validate settings and confirm the bot token with Telegram
pub async fn check(settings: RelaySettings) -> Result<()> {
    println!("{} Configuration loaded", "✓".green());
    println!("  model:     {}", settings.openai.model);
    println!("  budget:    {} chars", settings.dispatcher.budget.limit);
    println!("  event log: {}", settings.event_log.display());

    let channel = TelegramChannel::new(settings.telegram);
    let me = channel
        .test_connection()
        .await
        .context("Telegram connection check failed")?;

    let name = me
        .username
        .as_deref()
        .map(|username| format!("@{}", username))
        .or_else(|| me.display_name())
        .unwrap_or_else(|| me.id.to_string());
    println!("{} Connected to Telegram as {}", "✓".green(), name.bold());
    Ok(())
}
