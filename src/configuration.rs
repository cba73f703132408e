//! Settings of the match wrapper
//!
//! Configuration can be created programmatically using [`Configuration::new()`] or by reading
//! environment variables using [`Configuration::from_env()`]. It is handed explicitly to the
//! engine, the players, the router and the runners.
//!
//! # Environment Variables
//!
//! All values are optional. Flags are enabled by the (case-insensitive) value `"true"`.
//!
//! - `WRAPPER_TIMEBANK_MAX_MS` — Maximum timebank of a bot (default: `10000`)
//! - `WRAPPER_TIME_PER_MOVE_MS` — Time added to the timebank after each move (default: `500`)
//! - `WRAPPER_MAX_TIMEOUTS` — Timeouts tolerated before a bot forfeits its moves (default: `2`)
//! - `WRAPPER_ENGINE_TIMEOUT_MS` — Time the engine gets to answer (default: `10000`)
//! - `WRAPPER_MAX_MEMORY_MB` — Bot memory usage above which a warning is logged, `0` disables the
//!   check (default: `0`)
//! - `WRAPPER_PROPAGATE_BOT_EXIT_CODE` — Report a failing bot in the wrapper exit code (default: `false`)
//! - `WRAPPER_DEBUG` — Debug logs and extra output files (default: `false`)
//! - `WRAPPER_LOG` — Log to a file instead of stdout (default: `false`)

use std::time::Duration;

/// Configuration of timebanks, timeouts and wrapper behaviors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Configuration {
    pub(crate) timebank_max: Duration,
    pub(crate) time_per_move: Duration,
    pub(crate) max_timeouts: u32,
    pub(crate) engine_timeout: Duration,
    pub(crate) max_memory: u64,
    pub(crate) propagate_bot_exit_code: bool,
    pub(crate) debug: bool,
    pub(crate) log: bool,
}

impl Configuration {
    /// Create a new configuration with default parameters.
    ///
    /// By default:
    /// - Bots get a 10 seconds timebank, refilled by 500ms per move.
    /// - Bots forfeit their moves after their third timeout.
    /// - The engine gets 10 seconds to answer.
    /// - Bot memory usage is not checked.
    /// - Bot exit codes do not change the wrapper exit code.
    /// - Logs go to stdout at info level.
    pub fn new() -> Self {
        Self {
            timebank_max: Duration::from_millis(10_000),
            time_per_move: Duration::from_millis(500),
            max_timeouts: 2,
            engine_timeout: Duration::from_millis(10_000),
            max_memory: 0,
            propagate_bot_exit_code: false,
            debug: false,
            log: false,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Unset or unparsable variables keep their default value.
    pub fn from_env() -> Self {
        fn get_env_flag(var: &str, default: bool) -> bool {
            match std::env::var(var) {
                Ok(val) => val.eq_ignore_ascii_case("true"),
                Err(_) => default,
            }
        }

        fn get_env_number(var: &str) -> Option<u64> {
            std::env::var(var).ok()?.trim().parse().ok()
        }

        let default = Self::new();
        Self {
            timebank_max: get_env_number("WRAPPER_TIMEBANK_MAX_MS")
                .map_or(default.timebank_max, Duration::from_millis),
            time_per_move: get_env_number("WRAPPER_TIME_PER_MOVE_MS")
                .map_or(default.time_per_move, Duration::from_millis),
            max_timeouts: get_env_number("WRAPPER_MAX_TIMEOUTS")
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(default.max_timeouts),
            engine_timeout: get_env_number("WRAPPER_ENGINE_TIMEOUT_MS")
                .map_or(default.engine_timeout, Duration::from_millis),
            max_memory: get_env_number("WRAPPER_MAX_MEMORY_MB")
                .map_or(default.max_memory, |mb| mb.saturating_mul(1_000_000)),
            propagate_bot_exit_code: get_env_flag(
                "WRAPPER_PROPAGATE_BOT_EXIT_CODE",
                default.propagate_bot_exit_code,
            ),
            debug: get_env_flag("WRAPPER_DEBUG", default.debug),
            log: get_env_flag("WRAPPER_LOG", default.log),
        }
    }

    /// Set the maximum (and initial) timebank of every bot.
    pub fn with_timebank_max(mut self, value: Duration) -> Self {
        self.timebank_max = value;
        self
    }

    /// Set the time added to a bot's timebank after each move.
    pub fn with_time_per_move(mut self, value: Duration) -> Self {
        self.time_per_move = value;
        self
    }

    /// Set how many timeouts a bot may have before all its further moves are skipped.
    ///
    /// The bot is shut down on timeout number `value + 1`.
    pub fn with_max_timeouts(mut self, value: u32) -> Self {
        self.max_timeouts = value;
        self
    }

    /// Set how long the engine may take to answer or to send its next message.
    pub fn with_engine_timeout(mut self, value: Duration) -> Self {
        self.engine_timeout = value;
        self
    }

    /// Set the memory usage (in MB) above which a warning is added to a bot's log. `0` disables it.
    pub fn with_max_memory(mut self, megabytes: u64) -> Self {
        self.max_memory = megabytes.saturating_mul(1_000_000);
        self
    }

    /// Enable or disable reporting failing bots in the exit code.
    pub fn with_propagate_bot_exit_code(mut self, value: bool) -> Self {
        self.propagate_bot_exit_code = value;
        self
    }

    /// Enable or disable debug mode.
    pub fn with_debug(mut self, value: bool) -> Self {
        self.debug = value;
        self
    }

    /// Enable or disable logging to file.
    pub fn with_log(mut self, value: bool) -> Self {
        self.log = value;
        self
    }

    pub fn timebank_max(&self) -> Duration {
        self.timebank_max
    }

    pub fn time_per_move(&self) -> Duration {
        self.time_per_move
    }

    pub fn max_timeouts(&self) -> u32 {
        self.max_timeouts
    }

    pub fn engine_timeout(&self) -> Duration {
        self.engine_timeout
    }

    /// Memory warning threshold in bytes, `0` when disabled.
    pub fn max_memory(&self) -> u64 {
        self.max_memory
    }

    pub fn debug(&self) -> bool {
        self.debug
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Configuration::default();
        assert_eq!(config.timebank_max(), Duration::from_millis(10_000));
        assert_eq!(config.time_per_move(), Duration::from_millis(500));
        assert_eq!(config.max_timeouts(), 2);
        assert_eq!(config.max_memory(), 0);
        assert!(!config.propagate_bot_exit_code);
    }

    #[test]
    fn builder_overrides() {
        let config = Configuration::new()
            .with_timebank_max(Duration::from_secs(2))
            .with_time_per_move(Duration::from_millis(100))
            .with_max_timeouts(0)
            .with_max_memory(512)
            .with_debug(true);
        assert_eq!(config.timebank_max(), Duration::from_secs(2));
        assert_eq!(config.time_per_move(), Duration::from_millis(100));
        assert_eq!(config.max_timeouts(), 0);
        assert_eq!(config.max_memory(), 512_000_000);
        assert!(config.debug());
    }

    // single test: the process environment is shared by every test thread
    #[test]
    fn from_env_reads_wrapper_variables() {
        const VARS: [(&str, &str); 8] = [
            ("WRAPPER_TIMEBANK_MAX_MS", "2500"),
            ("WRAPPER_TIME_PER_MOVE_MS", " 50 "),
            ("WRAPPER_MAX_TIMEOUTS", "5"),
            ("WRAPPER_ENGINE_TIMEOUT_MS", "soon"),
            ("WRAPPER_MAX_MEMORY_MB", "256"),
            ("WRAPPER_PROPAGATE_BOT_EXIT_CODE", "TRUE"),
            ("WRAPPER_DEBUG", "yes"),
            ("WRAPPER_LOG", "true"),
        ];
        for (var, value) in VARS {
            std::env::set_var(var, value);
        }

        let config = Configuration::from_env();
        assert_eq!(config.timebank_max(), Duration::from_millis(2500));
        assert_eq!(config.time_per_move(), Duration::from_millis(50));
        assert_eq!(config.max_timeouts(), 5);
        // unparsable
        assert_eq!(config.engine_timeout(), Duration::from_millis(10_000));
        assert_eq!(config.max_memory(), 256_000_000);
        assert!(config.propagate_bot_exit_code);
        assert!(!config.debug());
        assert!(config.log);

        std::env::set_var("WRAPPER_MAX_TIMEOUTS", "99999999999");
        assert_eq!(Configuration::from_env().max_timeouts(), 2);

        for (var, _) in VARS {
            std::env::remove_var(var);
        }
        assert_eq!(Configuration::from_env(), Configuration::new());
    }
}
