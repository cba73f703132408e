use std::time::Duration;

use tracing::{debug, error, info, instrument};

use crate::configuration::Configuration;
use crate::player::Player;
use crate::process::{ProcessChannel, ProcessCommand};
use crate::responder::Responder;

/// The game engine process.
///
/// The engine drives the match: besides answering requests, it emits unsolicited lines that
/// [`get_message`](Engine::get_message) hands out in arrival order.
#[derive(Debug)]
pub struct Engine {
    channel: ProcessChannel,
    timeout: Duration,
    configuration: String,
}

impl Engine {
    /// Launches the engine. `configuration` is forwarded to it as is.
    #[instrument(skip(config, configuration))]
    pub fn launch(
        command: &ProcessCommand,
        configuration: String,
        config: Configuration,
    ) -> anyhow::Result<Engine> {
        let channel = ProcessChannel::launch("engine", command)?;
        Ok(Engine {
            channel,
            timeout: config.engine_timeout,
            configuration,
        })
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Waits for the next line the engine sends, whether it was asked for or not.
    ///
    /// Returns an empty string on timeout.
    pub fn get_message(&mut self) -> String {
        match self.channel.lines().pop(self.timeout) {
            Some(message) => {
                debug!("Engine out: '{message}'");
                message
            }
            None => self.on_timeout(self.timeout),
        }
    }

    /// Sends `bot_ids 0,1,...` for the given roster.
    pub fn send_player_roster(&mut self, players: &[Player]) -> bool {
        let ids = (0..players.len())
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.send(&format!("bot_ids {ids}"))
    }

    /// Sends `configuration <payload>`.
    pub fn send_configuration(&mut self) -> bool {
        let line = format!("configuration {}", self.configuration);
        self.send(&line)
    }

    pub fn is_errored(&self) -> bool {
        self.channel.is_errored()
    }
}

impl Responder for Engine {
    fn channel(&self) -> &ProcessChannel {
        &self.channel
    }

    fn channel_mut(&mut self) -> &mut ProcessChannel {
        &mut self.channel
    }

    fn send(&mut self, line: &str) -> bool {
        debug!("Engine in: '{line}'");
        self.channel.write(line)
    }

    fn ask(&mut self, line: &str) -> String {
        let timeout = self.timeout;
        self.request(line, timeout)
    }

    fn on_timeout(&mut self, timeout: Duration) -> String {
        error!("Engine took too long! ({}ms)", timeout.as_millis());
        self.channel.flag_error();
        String::new()
    }

    fn finish(&mut self) -> i32 {
        if self.channel.is_finished() {
            return self.channel.finish();
        }
        let exit_status = self.channel.finish();
        info!("Engine shut down.");
        let errors = self.channel.stderr();
        if !errors.is_empty() {
            info!("ENGINE ERROR LOG:\n{errors}\nEND ENGINE ERROR LOG");
        }
        exit_status
    }
}
