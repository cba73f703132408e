//! Per-bot time and error accounting.

use std::time::Duration;

/// Time allowance of a bot, in milliseconds.
///
/// Depletes by the measured response time and replenishes by a fixed grant per move, capped at
/// `max`. `current` always stays within `0..=max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timebank {
    current: u64,
    max: u64,
    increment: u64,
}

impl Timebank {
    /// A full timebank.
    pub fn new(max: Duration, increment: Duration) -> Timebank {
        let max = millis(max);
        Timebank {
            current: max,
            max,
            increment: millis(increment),
        }
    }

    pub fn current(&self) -> u64 {
        self.current
    }

    pub fn current_duration(&self) -> Duration {
        Duration::from_millis(self.current)
    }

    pub fn max(&self) -> u64 {
        self.max
    }

    /// Accounts for one response: `current = min(max, max(current - elapsed, 0) + increment)`.
    pub fn update(&mut self, elapsed_ms: u64) {
        self.current = self
            .current
            .saturating_sub(elapsed_ms)
            .saturating_add(self.increment)
            .min(self.max);
    }

    /// Overwrites the remaining time, raising the ceiling if needed.
    pub fn reset(&mut self, current: Duration) {
        self.current = millis(current);
        self.max = self.max.max(self.current);
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Counts timeouts against a limit. Past the limit the bot forfeits all remaining moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorCounter {
    count: u32,
    limit: u32,
}

impl ErrorCounter {
    pub fn new(limit: u32) -> ErrorCounter {
        ErrorCounter { count: 0, limit }
    }

    /// Records one error and returns true if the limit is now exceeded.
    pub fn add(&mut self) -> bool {
        self.count = self.count.saturating_add(1);
        self.exceeded()
    }

    pub fn exceeded(&self) -> bool {
        self.count > self.limit
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}
