//! Thread-safe FIFO of lines read from a process' primary output.
//!
//! One stream reader pushes, the protocol thread consumes. Each line gets a sequence number so a
//! request can tell the lines that arrived before it from its own answer.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct QueueState {
    lines: VecDeque<(u64, String)>,
    next_seq: u64,
    closed: bool,
}

/// Unbounded line queue fed by a background reader.
#[derive(Debug, Default)]
pub struct LineQueue {
    state: Mutex<QueueState>,
    available: Condvar,
}

/// Marks the point after which the next arriving line counts as the answer to a request.
///
/// Consumed by [`LineQueue::wait_response`], so a response can be taken by one waiter only.
#[derive(Debug, PartialEq, Eq)]
pub struct PendingResponse {
    since: u64,
}

impl PendingResponse {
    /// A pending response satisfied by any queued line, including ones already waiting.
    pub fn any() -> PendingResponse {
        PendingResponse { since: 0 }
    }
}

impl LineQueue {
    pub fn new() -> LineQueue {
        LineQueue::default()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, line: String) {
        let mut state = self.lock();
        let seq = state.next_seq;
        state.next_seq += 1;
        state.lines.push_back((seq, line));
        drop(state);
        self.available.notify_all();
    }

    /// No more lines will be pushed. Wakes up every waiter.
    pub fn close(&self) {
        self.lock().closed = true;
        self.available.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn len(&self) -> usize {
        self.lock().lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Starts a request: only lines pushed after this call can answer it.
    pub fn pending(&self) -> PendingResponse {
        PendingResponse {
            since: self.lock().next_seq,
        }
    }

    /// Drops every queued line that arrived before `pending` was taken.
    pub fn discard_before(&self, pending: &PendingResponse) -> usize {
        let mut state = self.lock();
        let before = state.lines.len();
        state.lines.retain(|(seq, _)| *seq >= pending.since);
        before - state.lines.len()
    }

    /// Removes and returns the first line that arrived after `pending` was taken.
    ///
    /// Returns `None` when `timeout` elapses or the queue is closed with no matching line.
    pub fn wait_response(&self, pending: PendingResponse, timeout: Duration) -> Option<String> {
        self.wait_for(timeout, |lines| {
            lines.iter().position(|(seq, _)| *seq >= pending.since)
        })
    }

    /// Removes and returns the oldest queued line, waiting up to `timeout` for one.
    pub fn pop(&self, timeout: Duration) -> Option<String> {
        self.wait_for(timeout, |lines| if lines.is_empty() { None } else { Some(0) })
    }

    fn wait_for<F>(&self, timeout: Duration, find: F) -> Option<String>
    where
        F: Fn(&VecDeque<(u64, String)>) -> Option<usize>,
    {
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.lock();
        loop {
            if let Some(index) = find(&state.lines) {
                return state.lines.remove(index).map(|(_, line)| line);
            }
            if state.closed {
                return None;
            }
            let wait = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return None;
                    }
                    deadline - now
                }
                // timeout too large to represent: wait in chunks
                None => Duration::from_secs(3600),
            };
            state = self
                .available
                .wait_timeout(state, wait)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }
}
