//! Append-only event log of inbound and outgoing chat traffic.
//!
//! Each entry is one line: `<ISO-8601 UTC timestamp> - <message>`.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::error;

/// Default event log file name
pub const DEFAULT_EVENT_LOG: &str = "bot_logs.txt";

/// Sink for human-readable event lines.
///
/// Recording never fails from the caller's point of view.
#[async_trait]
pub trait EventLog: Send + Sync {
    async fn record(&self, message: &str);
}

/// Format a single event log line, including the trailing newline.
pub fn format_entry(timestamp: DateTime<Utc>, message: &str) -> String {
    format!(
        "{} - {}\n",
        timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        message
    )
}

/// Event log appending to a file on disk
pub struct FileEventLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileEventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&self, entry: &str) -> std::io::Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(entry.as_bytes()).await?;
        file.flush().await
    }
}

impl Default for FileEventLog {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_LOG)
    }
}

#[async_trait]
impl EventLog for FileEventLog {
    async fn record(&self, message: &str) {
        let entry = format_entry(Utc::now(), message);
        if let Err(e) = self.append(&entry).await {
            error!(path = %self.path.display(), "Failed to write event log: {}", e);
        }
    }
}
