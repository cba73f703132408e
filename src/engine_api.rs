//! Routes the engine's commands to the bots and their answers back to the engine.
//!
//! The engine speaks a small line-based vocabulary:
//!
//! | engine line | effect |
//! |---|---|
//! | `bot <N> ask <payload>` | ask bot N, reply `bot <N> <response>` to the engine |
//! | `bot <N> send <payload>` | forward the payload to bot N |
//! | `bot all send <payload>` | forward the payload to every bot |
//! | `bot <N> warning <payload>` | add the payload to bot N's log |
//! | `ok` | nothing |
//! | `end` or empty line | end of the match |
//!
//! Anything else ends the match as a protocol violation.

use std::fmt::Display;

use tracing::{debug, error, info, instrument, warn};

use crate::configuration::Configuration;
use crate::engine::Engine;
use crate::player::Player;
use crate::responder::Responder;

/// One line from the engine, parsed. Matching is case-sensitive and first-match-wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineCommand<'a> {
    Ask { bot: usize, payload: &'a str },
    Send { bot: usize, payload: &'a str },
    Warning { bot: usize, payload: &'a str },
    Broadcast { payload: &'a str },
    Ok,
    End,
    Unknown,
}

impl<'a> EngineCommand<'a> {
    pub fn parse(line: &'a str) -> EngineCommand<'a> {
        if line.is_empty() || line == "end" {
            return EngineCommand::End;
        }
        if line == "ok" {
            return EngineCommand::Ok;
        }

        let Some((target, action)) = line
            .strip_prefix("bot ")
            .and_then(|rest| rest.split_once(' '))
        else {
            return EngineCommand::Unknown;
        };

        if target == "all" {
            return match action.strip_prefix("send ") {
                Some(payload) => EngineCommand::Broadcast { payload },
                None => EngineCommand::Unknown,
            };
        }

        if target.is_empty() || !target.bytes().all(|b| b.is_ascii_digit()) {
            return EngineCommand::Unknown;
        }
        let Ok(bot) = target.parse::<usize>() else {
            return EngineCommand::Unknown;
        };

        if let Some(payload) = action.strip_prefix("ask ") {
            EngineCommand::Ask { bot, payload }
        } else if let Some(payload) = action.strip_prefix("send ") {
            EngineCommand::Send { bot, payload }
        } else if let Some(payload) = action.strip_prefix("warning ") {
            EngineCommand::Warning { bot, payload }
        } else {
            EngineCommand::Unknown
        }
    }
}

/// Where the router is in the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterState {
    Setup,
    Configured,
    Running,
    Ended,
}

/// How a match ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterOutcome {
    /// The engine ended the match.
    Completed,
    /// The engine did not answer `ok` to `initialize`.
    HandshakeFailed { response: String },
    /// The engine sent a line outside the vocabulary, or addressed a bot that does not exist.
    ProtocolViolation { line: String },
}

impl RouterOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RouterOutcome::Completed)
    }
}

impl Display for RouterOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouterOutcome::Completed => write!(f, "completed"),
            RouterOutcome::HandshakeFailed { response } => {
                write!(f, "unexpected response to 'initialize': '{response}'")
            }
            RouterOutcome::ProtocolViolation { line } => {
                write!(f, "'{line}' did not match any action")
            }
        }
    }
}

/// Drives a match from handshake to end, relaying lines between the engine and the bots.
#[derive(Debug)]
pub struct EngineApi {
    engine: Engine,
    players: Vec<Player>,
    config: Configuration,
    state: RouterState,
    outcome: Option<RouterOutcome>,
}

impl EngineApi {
    /// `players` is the roster: a bot's index in it is its number in the protocol.
    pub fn new(engine: Engine, players: Vec<Player>, config: Configuration) -> EngineApi {
        EngineApi {
            engine,
            players,
            config,
            state: RouterState::Setup,
            outcome: None,
        }
    }

    pub fn state(&self) -> RouterState {
        self.state
    }

    pub fn outcome(&self) -> Option<&RouterOutcome> {
        self.outcome.as_ref()
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn players_mut(&mut self) -> &mut [Player] {
        &mut self.players
    }

    /// Runs a whole match. Protocol problems end the match and are reported in the outcome.
    #[instrument(skip_all)]
    pub fn run(&mut self) -> RouterOutcome {
        let response = self.engine.ask("initialize");
        if response != "ok" {
            error!("Unexpected response: '{response}' to message: 'initialize'");
            return self.end(RouterOutcome::HandshakeFailed { response });
        }

        self.state = RouterState::Configured;

        info!("Engine initialized. Sending settings to engine..");
        self.engine.send_player_roster(&self.players);
        self.engine.send_configuration();

        info!("Settings sent to engine. Sending settings to bots...");
        self.send_bot_settings();

        info!("Settings sent to bots. Starting engine...");
        self.engine.send("start");
        self.state = RouterState::Running;

        info!("Engine started. Playing game...");
        while self.state == RouterState::Running {
            let message = self.engine.get_message();
            self.handle(&message);
        }

        self.outcome.clone().unwrap_or(RouterOutcome::Completed)
    }

    /// Interprets one engine line. Ends the match on `end`, an empty line or an unknown line.
    pub fn handle(&mut self, message: &str) {
        match EngineCommand::parse(message) {
            EngineCommand::Ask { bot, payload } => {
                let Some(player) = self.players.get_mut(bot) else {
                    return self.unknown_bot(message);
                };
                let response = player.ask(payload);
                self.engine.send(&format!("bot {bot} {response}"));
            }
            EngineCommand::Send { bot, payload } => {
                let Some(player) = self.players.get_mut(bot) else {
                    return self.unknown_bot(message);
                };
                player.send(payload);
            }
            EngineCommand::Warning { bot, payload } => {
                let Some(player) = self.players.get_mut(bot) else {
                    return self.unknown_bot(message);
                };
                player.add_to_dump(payload);
            }
            EngineCommand::Broadcast { payload } => self.broadcast(payload),
            EngineCommand::Ok => {}
            EngineCommand::End => {
                debug!("engine ended the match");
                self.end(RouterOutcome::Completed);
            }
            EngineCommand::Unknown => {
                warn!("'{message}' did not match any action");
                self.end(RouterOutcome::ProtocolViolation {
                    line: message.to_string(),
                });
            }
        }
    }

    fn unknown_bot(&mut self, message: &str) {
        warn!("'{message}' addresses a bot outside the roster");
        self.end(RouterOutcome::ProtocolViolation {
            line: message.to_string(),
        });
    }

    fn end(&mut self, outcome: RouterOutcome) -> RouterOutcome {
        self.state = RouterState::Ended;
        self.outcome = Some(outcome.clone());
        outcome
    }

    fn broadcast(&mut self, message: &str) {
        for player in &mut self.players {
            player.send(message);
        }
    }

    /// Sends the settings every bot needs before the game starts.
    fn send_bot_settings(&mut self) {
        let player_names = self
            .players
            .iter()
            .map(|player| format!("player{}", player.id()))
            .collect::<Vec<_>>()
            .join(",");
        let names_line = format!("settings player_names {player_names}");
        self.engine.send(&names_line);
        self.broadcast(&names_line);

        let timebank = self.config.timebank_max.as_millis();
        let time_per_move = self.config.time_per_move.as_millis();
        for player in &mut self.players {
            let id = player.id();
            player.send(&format!("settings your_bot player{id}"));
            player.send(&format!("settings timebank {timebank}"));
            player.send(&format!("settings time_per_move {time_per_move}"));
        }
    }

    /// Asks the engine for the details of the game, e.g. the winner.
    pub fn ask_game_details(&mut self) -> String {
        self.engine.ask("details")
    }

    /// Asks the engine for the played game, for the visualizer.
    pub fn ask_played_game(&mut self) -> String {
        self.engine.ask("game")
    }
}
