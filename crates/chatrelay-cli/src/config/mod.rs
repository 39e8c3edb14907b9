mod cli_config;
mod settings;

pub use cli_config::CliConfig;
pub use settings::{OpenAiSettings, RelaySettings};
