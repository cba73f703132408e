use std::io::Write;
use std::process::{Child, ChildStdin, ExitStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{debug, instrument, warn};

use super::line_queue::LineQueue;
use super::stream_reader::{StreamReader, Transcript};
use super::{create_process, ProcessCommand};

/// One child process with its outbound pipe and two drained inbound pipes.
///
/// The process is killed and reaped on [`finish`](ProcessChannel::finish), or on drop.
#[derive(Debug)]
pub struct ProcessChannel {
    name: String,
    child: Child,
    stdin: Option<ChildStdin>,
    lines: Arc<LineQueue>,
    stdout: Transcript,
    stderr: Transcript,
    readers: Vec<StreamReader>,
    stop: Arc<AtomicBool>,
    errored: bool,
    exit_code: Option<i32>,
}

impl ProcessChannel {
    const READER_JOIN_DURATION: Duration = Duration::from_millis(500);

    /// Launches `command` and starts draining its stdout and stderr.
    #[instrument(skip(command), fields(%command))]
    pub fn launch(name: &str, command: &ProcessCommand) -> anyhow::Result<ProcessChannel> {
        debug!("executing: {command}");
        let mut child = create_process(command)?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take().context("child stdout not captured")?;
        let stderr = child.stderr.take().context("child stderr not captured")?;

        let lines = Arc::new(LineQueue::new());
        let stop = Arc::new(AtomicBool::new(false));
        let stdout_transcript = Transcript::default();
        let stderr_transcript = Transcript::default();

        let mut channel = ProcessChannel {
            name: name.to_string(),
            child,
            stdin,
            lines: lines.clone(),
            stdout: stdout_transcript.clone(),
            stderr: stderr_transcript.clone(),
            readers: Vec::with_capacity(2),
            stop: stop.clone(),
            errored: false,
            exit_code: None,
        };

        // on error the channel is dropped, which kills the child
        channel.readers.push(StreamReader::spawn(
            format!("{name}-stdout"),
            stdout,
            stdout_transcript,
            Some(lines),
            stop.clone(),
        )?);
        channel.readers.push(StreamReader::spawn(
            format!("{name}-stderr"),
            stderr,
            stderr_transcript,
            None,
            stop,
        )?);

        Ok(channel)
    }

    /// OS process id, used for best-effort resource diagnostics only.
    pub fn pid(&self) -> Option<u32> {
        if self.is_finished() {
            None
        } else {
            Some(self.child.id())
        }
    }

    /// Lines read from the process' stdout that were not consumed yet.
    pub fn lines(&self) -> &LineQueue {
        &self.lines
    }

    /// Writes one line to the process' stdin.
    ///
    /// Returns false once the channel is finished. A broken pipe flags the channel as errored and
    /// finishes it.
    pub fn write(&mut self, line: &str) -> bool {
        if self.is_finished() {
            return false;
        }
        let Some(stdin) = self.stdin.as_mut() else {
            return false;
        };

        let result = stdin
            .write_all(line.as_bytes())
            .and_then(|_| stdin.write_all(b"\n"))
            .and_then(|_| stdin.flush());

        if let Err(e) = result {
            warn!("writing to '{}' failed: {e}", self.name);
            self.errored = true;
            self.finish();
            return false;
        }
        true
    }

    /// Everything the process wrote on stdout so far.
    pub fn stdout(&self) -> String {
        self.stdout.contents()
    }

    /// Everything the process wrote on stderr so far.
    pub fn stderr(&self) -> String {
        self.stderr.contents()
    }

    /// Marks a protocol error: [`finish`](ProcessChannel::finish) will report exit code 1.
    pub fn flag_error(&mut self) {
        self.errored = true;
    }

    pub fn is_errored(&self) -> bool {
        self.errored
    }

    pub fn is_finished(&self) -> bool {
        self.exit_code.is_some()
    }

    /// Ends the process and its communication. Idempotent: later calls return the cached code.
    ///
    /// Returns 1 when an error was flagged or when the process had already exited with a failure
    /// status, 0 otherwise.
    pub fn finish(&mut self) -> i32 {
        if let Some(code) = self.exit_code {
            return code;
        }

        let exited_on_its_own = self.child.try_wait().ok().flatten();

        // dropping stdin closes the pipe
        self.stdin.take();
        self.stop.store(true, Ordering::Relaxed);

        if exited_on_its_own.is_none() {
            if let Err(e) = self.child.kill() {
                debug!("could not kill '{}': {e}", self.name);
            }
        }
        if let Err(e) = self.child.wait() {
            warn!("could not wait for '{}': {e}", self.name);
        }

        for reader in &mut self.readers {
            reader.join(Self::READER_JOIN_DURATION);
        }
        self.lines.close();

        let failed_exit = exited_on_its_own.is_some_and(|status: ExitStatus| !status.success());
        let code = i32::from(self.errored || failed_exit);
        self.exit_code = Some(code);
        debug!("'{}' finished with exit code {code}", self.name);
        code
    }
}

impl Drop for ProcessChannel {
    fn drop(&mut self) {
        if !self.is_finished() {
            self.finish();
        }
    }
}
