#![allow(dead_code)]

use match_wrapper::process::ProcessCommand;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

pub fn init_test_logger() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_ansi(false)
        .with_test_writer()
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Runs `script` with `sh -c`.
pub fn sh(script: &str) -> ProcessCommand {
    ProcessCommand::Args(vec!["sh".to_string(), "-c".to_string(), script.to_string()])
}

/// A bot answering `answer` to every line except settings and updates.
pub fn answering_bot(answer: &str) -> ProcessCommand {
    sh(&format!(
        r#"while IFS= read -r line; do
  case "$line" in
    settings*|update*) ;;
    *) echo "{answer}" ;;
  esac
done"#
    ))
}

/// A bot that never answers.
pub fn silent_bot() -> ProcessCommand {
    sh("cat > /dev/null")
}

/// An engine echoing every line it receives on stderr, then running `on_line` (a `case` body).
pub fn engine(on_line: &str) -> ProcessCommand {
    sh(&format!(
        r#"while IFS= read -r line; do
  echo "$line" >&2
  case "$line" in
{on_line}
  esac
done"#
    ))
}
