//! Communication Channel Layer
//!
//! Channel-agnostic transport for the relay. A [`Channel`] delivers
//! [`InboundMessage`]s as a stream and accepts [`OutboundMessage`]s in either
//! plain or formatted (Markdown) form.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │   LoggingChannel<C>  (event log tap)    │
//! └─────────────────────────────────────────┘
//!              │
//!              ▼
//! ┌─────────────────────────────────────────┐
//! │         trait Channel                   │
//! │  - send(message)                        │
//! │  - send_typing(conversation)            │
//! │  - start_receiving() -> Stream          │
//! └─────────────────────────────────────────┘
//!              │
//!              ▼
//!          Telegram
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use chatrelay_core::channel::{Channel, LoggingChannel, OutboundMessage, TelegramChannel};
//!
//! let channel = LoggingChannel::new(TelegramChannel::with_token(bot_token), event_log);
//! channel.send(OutboundMessage::markdown("12345", "*Hello*")).await?;
//! ```

mod logging;
mod split;
pub mod telegram;
mod traits;
mod types;

pub use logging::LoggingChannel;
pub use split::split_message;
pub use telegram::{TelegramChannel, TelegramConfig, TelegramUser};
pub use traits::{Channel, InboundStream};
pub use types::{ChannelType, InboundMessage, OutboundMessage, ParseMode};

#[cfg(test)]
pub(crate) use traits::mock;
