use std::io::{BufRead, BufReader, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{trace, warn};

use super::line_queue::LineQueue;

/// Append-only transcript of everything a stream produced.
#[derive(Debug, Default, Clone)]
pub struct Transcript(Arc<Mutex<String>>);

impl Transcript {
    fn append_line(&self, line: &str) {
        let mut data = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        data.push_str(line);
        data.push('\n');
    }

    pub fn contents(&self) -> String {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// Background thread draining one output stream of a child process.
#[derive(Debug)]
pub struct StreamReader {
    label: String,
    handle: Option<JoinHandle<()>>,
}

impl StreamReader {
    /// Spawns a reader thread. Every line goes to `transcript`, and to `queue` when one is given.
    pub fn spawn<R: Read + Send + 'static>(
        label: String,
        stream: R,
        transcript: Transcript,
        queue: Option<Arc<LineQueue>>,
        stop: Arc<AtomicBool>,
    ) -> anyhow::Result<StreamReader> {
        let thread_label = label.clone();
        let handle = thread::Builder::new()
            .name(label.clone())
            .spawn(move || read_lines(&thread_label, stream, &transcript, queue.as_deref(), &stop))?;
        Ok(StreamReader {
            label,
            handle: Some(handle),
        })
    }

    /// Waits up to `max_duration` for the reader to reach end of stream.
    ///
    /// A reader still blocked afterwards (e.g. a grandchild keeps the pipe open) is detached.
    pub fn join(&mut self, max_duration: Duration) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        let deadline = Instant::now() + max_duration;
        while !handle.is_finished() {
            if Instant::now() > deadline {
                warn!("stream reader '{}' still blocked, detaching it", self.label);
                return;
            }
            thread::sleep(Duration::from_millis(1).min(max_duration / 10));
        }
        if handle.join().is_err() {
            warn!("stream reader '{}' panicked", self.label);
        }
    }
}

fn read_lines<R: Read>(
    label: &str,
    stream: R,
    transcript: &Transcript,
    queue: Option<&LineQueue>,
    stop: &AtomicBool,
) {
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                if buf.last() == Some(&b'\n') {
                    buf.pop();
                }
                if buf.last() == Some(&b'\r') {
                    buf.pop();
                }
                let line = String::from_utf8_lossy(&buf).into_owned();
                trace!(stream = label, %line);
                transcript.append_line(&line);
                if let Some(queue) = queue {
                    queue.push(line);
                }
            }
            Err(e) => {
                trace!("stream '{label}' read error: {e}");
                break;
            }
        }
        if stop.load(Ordering::Relaxed) {
            break;
        }
    }
    if let Some(queue) = queue {
        queue.close();
    }
}
