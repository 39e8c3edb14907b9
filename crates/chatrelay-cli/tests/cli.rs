use assert_cmd::Command;
use predicates::str::{contains, starts_with};

fn chatrelay() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("chatrelay"));
    cmd.env_remove("TELEGRAM_BOT_TOKEN")
        .env_remove("OPENAI_API_KEY")
        .env_remove("CHATRELAY_CONFIG")
        .env("RUST_LOG", "off");
    cmd
}

#[test]
fn test_cli_help() {
    chatrelay()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("ChatRelay"));
}

#[test]
fn test_cli_version() {
    chatrelay().arg("--version").assert().success();
}

#[test]
fn test_cli_completions() {
    chatrelay()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(starts_with("_chatrelay"));
}

#[test]
fn test_check_without_token_fails() {
    let dir = tempfile::tempdir().unwrap();
    chatrelay()
        .env("CHATRELAY_DATA_DIR", dir.path())
        .args(["check", "--config"])
        .arg(dir.path().join("absent.toml"))
        .assert()
        .failure()
        .stderr(contains("Telegram bot token not found"))
        .stderr(contains("TELEGRAM_BOT_TOKEN"));
}

#[test]
fn test_malformed_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[openai\n").unwrap();

    chatrelay()
        .env("CHATRELAY_DATA_DIR", dir.path())
        .arg("--config")
        .arg(&path)
        .arg("check")
        .assert()
        .failure()
        .stderr(contains("Failed to parse config file"))
        .stderr(contains("config.toml"));
}
