use colored::Colorize;

pub fn handle_error(err: anyhow::Error) -> ! {
    eprintln!("{} {:#}", "Error:".red().bold(), err);

    let msg = format!("{:#}", err).to_lowercase();

    if msg.contains("bot token not found") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Set your Telegram bot token with:");
        eprintln!("  {} export TELEGRAM_BOT_TOKEN=<token>", "$".dimmed());
    }

    if msg.contains("api key not found") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Set your OpenAI API key with:");
        eprintln!("  {} export OPENAI_API_KEY=<key>", "$".dimmed());
    }

    if msg.contains("failed to parse config") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Fix the TOML syntax or pass another file with --config.");
    }

    if msg.contains("telegram api error")
        && (msg.contains("unauthorized") || msg.contains("not found"))
    {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Check that the bot token from @BotFather is correct.");
    }

    if msg.contains("connection refused") || msg.contains("network") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Check your internet connection and try again.");
    }

    std::process::exit(1);
}
