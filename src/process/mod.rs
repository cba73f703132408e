//! Child processes and the pipes used to talk to them.

mod channel;
mod line_queue;
mod stream_reader;

pub use channel::ProcessChannel;
pub use line_queue::{LineQueue, PendingResponse};
pub use stream_reader::Transcript;

use std::fmt::Display;
use std::process::{Child, Stdio};

use anyhow::{bail, Context};
use serde::Deserialize;

/// How to launch a process: a single command line or an explicit argument vector.
///
/// A command line is split on whitespace; it is not interpreted by a shell.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ProcessCommand {
    /// `"python3 bot.py --fast"`
    Line(String),
    /// `["python3", "bot.py", "--fast"]`
    Args(Vec<String>),
}

impl ProcessCommand {
    pub fn parts(&self) -> Vec<String> {
        match self {
            ProcessCommand::Line(line) => line.split_whitespace().map(str::to_string).collect(),
            ProcessCommand::Args(args) => args.clone(),
        }
    }
}

impl From<&str> for ProcessCommand {
    fn from(value: &str) -> Self {
        ProcessCommand::Line(value.to_string())
    }
}

impl From<Vec<String>> for ProcessCommand {
    fn from(value: Vec<String>) -> Self {
        ProcessCommand::Args(value)
    }
}

impl Display for ProcessCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessCommand::Line(line) => write!(f, "{line}"),
            ProcessCommand::Args(args) => write!(f, "[\"{}\"]", args.join("\", \"")),
        }
    }
}

/// Spawns `command` with stdin, stdout and stderr piped.
pub(crate) fn create_process(command: &ProcessCommand) -> anyhow::Result<Child> {
    let parts = command.parts();
    let Some((program, args)) = parts.split_first() else {
        bail!("empty command");
    };
    let mut cmd = std::process::Command::new(program);
    cmd.args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    cmd.spawn()
        .with_context(|| format!("command '{program}' could not be started"))
}
