use std::time::{Duration, Instant};

use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};
use tracing::{debug, info, instrument, warn};

use crate::budget::{ErrorCounter, Timebank};
use crate::configuration::Configuration;
use crate::process::{PendingResponse, ProcessChannel, ProcessCommand};
use crate::responder::Responder;

/// Bot answers meaning "no move", compared case-insensitively.
pub const NULL_MOVES: [&str; 2] = ["no_moves", "pass"];
/// What a null move is turned into.
pub const PASS_RESPONSE: &str = "pass";
/// What an empty or skipped answer is turned into.
pub const NULL_RESPONSE: &str = "null";

/// Canonicalizes a bot answer: null moves become `pass`, nothing becomes `null`.
pub fn normalize_response(response: &str) -> String {
    if NULL_MOVES
        .iter()
        .any(|null_move| response.eq_ignore_ascii_case(null_move))
    {
        PASS_RESPONSE.to_string()
    } else if response.is_empty() {
        NULL_RESPONSE.to_string()
    } else {
        response.to_string()
    }
}

/// A bot process with its timebank, timeout count and diagnostic log ("dump").
#[derive(Debug)]
pub struct Player {
    id: usize,
    channel: ProcessChannel,
    timebank: Timebank,
    errors: ErrorCounter,
    dump: String,
    response_times: Vec<u64>,
    max_memory: u64,
    propagate_exit_code: bool,
    system: Option<System>,
}

impl Player {
    #[instrument(skip(config))]
    pub fn launch(
        command: &ProcessCommand,
        id: usize,
        config: Configuration,
    ) -> anyhow::Result<Player> {
        let channel = ProcessChannel::launch(&format!("player{id}"), command)?;
        Ok(Player::with_channel(channel, id, config))
    }

    fn with_channel(channel: ProcessChannel, id: usize, config: Configuration) -> Player {
        Player {
            id,
            channel,
            timebank: Timebank::new(config.timebank_max, config.time_per_move),
            errors: ErrorCounter::new(config.max_timeouts),
            dump: String::new(),
            response_times: vec![],
            max_memory: config.max_memory,
            propagate_exit_code: config.propagate_bot_exit_code,
            system: None,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn timebank(&self) -> &Timebank {
        &self.timebank
    }

    /// Overwrites the remaining time of this bot.
    pub fn set_timebank(&mut self, timebank: Duration) {
        self.timebank.reset(timebank);
    }

    /// Number of timeouts so far.
    pub fn timeouts(&self) -> u32 {
        self.errors.count()
    }

    /// True once the bot had too many timeouts and all its moves are skipped.
    pub fn is_forfeited(&self) -> bool {
        self.errors.exceeded()
    }

    /// Everything sent to and received from the bot, plus warnings.
    pub fn dump(&self) -> &str {
        &self.dump
    }

    /// Response time of each answered (or timed out) request, in milliseconds.
    pub fn response_times(&self) -> &[u64] {
        &self.response_times
    }

    pub fn add_to_dump(&mut self, line: &str) {
        self.dump.push_str(line);
        self.dump.push('\n');
    }

    /// Waits for the bot's next line without sending anything first.
    pub fn get_response(&mut self) -> String {
        if self.errors.exceeded() {
            return self.skip_move();
        }
        self.collect_response(PendingResponse::any())
    }

    fn skip_move(&mut self) -> String {
        let message = format!(
            "Maximum number ({}) of time-outs reached: skipping all moves.",
            self.errors.limit()
        );
        self.add_to_dump(&message);
        NULL_RESPONSE.to_string()
    }

    fn collect_response(&mut self, pending: PendingResponse) -> String {
        let timeout = self.timebank.current_duration();
        let start = Instant::now();

        let response = self.await_response(pending, timeout);

        let elapsed = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.response_times.push(elapsed);
        self.timebank.update(elapsed);
        debug!(
            player = self.id,
            elapsed,
            timebank = self.timebank.current(),
            %response
        );

        self.check_memory();

        self.bot_dump(&response);
        normalize_response(&response)
    }

    fn bot_dump(&mut self, response: &str) {
        self.add_to_dump(&format!("Output from your bot: \"{response}\""));
    }

    /// Adds a warning to the dump if the bot uses more memory than allowed. Never fails.
    fn check_memory(&mut self) {
        if self.max_memory == 0 {
            return;
        }
        let Some(pid) = self.channel.pid() else {
            return;
        };
        let pid = Pid::from_u32(pid);
        let system = self.system.get_or_insert_with(System::new);
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );
        let Some(used) = system.process(pid).map(|process| process.memory()) else {
            return;
        };
        if used > self.max_memory {
            let warning = format!(
                "Warning: Your bot is using a lot of memory ({}Mb), this might cause it to time out. Recommended maximum: {}Mb",
                used / 1_000_000,
                self.max_memory / 1_000_000
            );
            self.add_to_dump(&warning);
        }
    }
}

impl Responder for Player {
    fn channel(&self) -> &ProcessChannel {
        &self.channel
    }

    fn channel_mut(&mut self) -> &mut ProcessChannel {
        &mut self.channel
    }

    fn discards_stale_lines(&self) -> bool {
        true
    }

    fn send(&mut self, line: &str) -> bool {
        self.add_to_dump(line);
        let was_finished = self.channel.is_finished();
        if !self.channel.write(line) {
            if !was_finished {
                self.add_to_dump("Write to bot failed, shutting down...");
            }
            return false;
        }
        true
    }

    /// Sends `<command> <timebank>` and waits for the answer within the timebank.
    ///
    /// Once the bot forfeited, returns `null` without writing or waiting.
    fn ask(&mut self, command: &str) -> String {
        if self.errors.exceeded() {
            return self.skip_move();
        }
        let line = format!("{command} {}", self.timebank.current());
        let pending = self.begin_request();
        self.send(&line);
        self.collect_response(pending)
    }

    fn on_timeout(&mut self, timeout: Duration) -> String {
        warn!(player = self.id, "response timed out ({}ms)", timeout.as_millis());
        self.add_to_dump(&format!(
            "Response timed out ({}ms), let your bot return '{}' instead of nothing or make it faster.",
            timeout.as_millis(),
            NULL_MOVES[0]
        ));
        self.channel.flag_error();
        if self.errors.add() {
            self.finish();
        }
        String::new()
    }

    fn finish(&mut self) -> i32 {
        let already_finished = self.channel.is_finished();
        let exit_status = self.channel.finish();
        if !already_finished {
            info!("Bot {} shut down.", self.id);
        }
        if self.propagate_exit_code {
            exit_status
        } else {
            0
        }
    }
}
