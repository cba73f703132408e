//! Request/response behavior shared by the engine and the bots.

use std::time::Duration;

use crate::process::{PendingResponse, ProcessChannel};

/// A process the wrapper can write lines to and wait for answers from.
///
/// Implementors provide the channel, the role-specific [`send`](Responder::send) and
/// [`on_timeout`](Responder::on_timeout) hooks. The waiting logic is shared.
pub trait Responder {
    fn channel(&self) -> &ProcessChannel;

    fn channel_mut(&mut self) -> &mut ProcessChannel;

    /// Writes one line. Returns false if the process can no longer be written to.
    fn send(&mut self, line: &str) -> bool;

    /// Sends a request and waits for its answer, within the role's own time limit.
    fn ask(&mut self, line: &str) -> String;

    /// Called when no answer arrived in time. The returned string is handed to the caller.
    fn on_timeout(&mut self, timeout: Duration) -> String;

    /// Whether lines left over from earlier requests are dropped when a new request starts.
    fn discards_stale_lines(&self) -> bool {
        false
    }

    /// Marks the start of a request. Must be taken before the request line is written.
    fn begin_request(&mut self) -> PendingResponse {
        let lines = self.channel().lines();
        let pending = lines.pending();
        if self.discards_stale_lines() {
            lines.discard_before(&pending);
        }
        pending
    }

    /// Writes `line` then waits up to `timeout` for the first line the process sends back.
    ///
    /// Only that first line is consumed; later lines stay queued. Returns the result of
    /// [`on_timeout`](Responder::on_timeout) if nothing arrives.
    fn request(&mut self, line: &str, timeout: Duration) -> String {
        let pending = self.begin_request();
        self.send(line);
        self.await_response(pending, timeout)
    }

    /// Waits for the answer to a request started with [`begin_request`](Responder::begin_request).
    fn await_response(&mut self, pending: PendingResponse, timeout: Duration) -> String {
        match self.channel().lines().wait_response(pending, timeout) {
            Some(response) => response,
            None => self.on_timeout(timeout),
        }
    }

    /// Ends the process. See [`ProcessChannel::finish`].
    fn finish(&mut self) -> i32 {
        self.channel_mut().finish()
    }

    /// Complete stderr output of the process.
    fn stderr(&self) -> String {
        self.channel().stderr()
    }
}
