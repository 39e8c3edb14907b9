use anyhow::{Context, Result};
use std::path::PathBuf;

const APP_DIR: &str = "chatrelay";
const LOGS_DIR: &str = "logs";

/// Environment variable to override the data directory.
const DATA_DIR_ENV: &str = "CHATRELAY_DATA_DIR";

/// Resolve the data directory.
/// Priority: CHATRELAY_DATA_DIR env var > platform data dir (e.g. ~/.local/share/chatrelay)
pub fn resolve_data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV)
        && !dir.trim().is_empty()
    {
        return Ok(PathBuf::from(dir));
    }
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR))
        .ok_or_else(|| anyhow::anyhow!("Failed to determine data directory"))
}

/// Ensure the diagnostics log directory exists and return its path.
pub fn ensure_log_dir() -> Result<PathBuf> {
    let dir = resolve_data_dir()?.join(LOGS_DIR);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    Ok(dir)
}
