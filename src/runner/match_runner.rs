use std::time::Duration;

use anyhow::{bail, Context};
use tracing::{info, instrument};

use crate::configuration::Configuration;
use crate::engine::Engine;
use crate::engine_api::{EngineApi, RouterOutcome};
use crate::player::Player;
use crate::responder::Responder;

use super::results::{ErrorMessage, MatchResult, PlayerResult, RunStatus};
use super::run_config::MatchConfig;
use super::Runner;

/// Runs a match between one engine and its bots.
#[derive(Debug)]
pub struct MatchRunner {
    api: EngineApi,
    outcome: Option<RouterOutcome>,
    results: Option<MatchResult>,
}

impl MatchRunner {
    /// Launches the engine, then every bot in order. A bot's position is its number in the game.
    ///
    /// # Errors
    /// Returns an error if a process could not be started. Already started processes are killed.
    #[instrument(skip_all)]
    pub fn prepare(match_config: &MatchConfig, config: Configuration) -> anyhow::Result<MatchRunner> {
        if match_config.bots.is_empty() {
            bail!("No bots found in configuration");
        }

        let engine = Engine::launch(
            &match_config.engine.command,
            match_config.engine.configuration.to_string(),
            config,
        )
        .context("Failed to start engine.")?;

        let players = match_config
            .bots
            .iter()
            .enumerate()
            .map(|(id, bot)| {
                Player::launch(&bot.command, id, config)
                    .with_context(|| format!("Failed to start bot {id}."))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(MatchRunner::new(EngineApi::new(engine, players, config)))
    }

    /// Wraps already launched processes.
    pub fn new(api: EngineApi) -> MatchRunner {
        MatchRunner {
            api,
            outcome: None,
            results: None,
        }
    }

    pub fn api(&self) -> &EngineApi {
        &self.api
    }

    pub fn outcome(&self) -> Option<&RouterOutcome> {
        self.outcome.as_ref()
    }
}

impl Runner for MatchRunner {
    type Results = MatchResult;

    fn run(&mut self) {
        let outcome = self.api.run();
        info!("match {outcome}");
        self.outcome = Some(outcome);
    }

    fn postrun(&mut self, time_elapsed: Duration) -> i32 {
        let outcome = self.outcome.clone().unwrap_or(RouterOutcome::Completed);

        let (details, game) = match outcome {
            RouterOutcome::HandshakeFailed { .. } => (String::new(), String::new()),
            _ => (self.api.ask_game_details(), self.api.ask_played_game()),
        };

        let mut players_status = 0;
        let mut players = Vec::with_capacity(self.api.players().len());
        for player in self.api.players_mut() {
            players_status += player.finish();
            let response_times = player.response_times().to_vec();
            players.push(PlayerResult {
                log: player.dump().to_string(),
                errors: player.stderr(),
                total_response_time: response_times.iter().sum(),
                response_times,
            });
        }

        let engine_errored = self.api.engine().is_errored();
        let engine_status = self.api.engine_mut().finish();

        let error = if !outcome.is_success() {
            Some(outcome.to_string())
        } else if engine_errored {
            Some("Engine did not respond in time".to_string())
        } else {
            None
        };
        let status = if error.is_some() {
            RunStatus::Error
        } else {
            RunStatus::Ok
        };
        let error = error.map(|message| ErrorMessage { message });

        self.results = Some(MatchResult {
            status,
            error,
            time_elapsed: u64::try_from(time_elapsed.as_millis()).unwrap_or(u64::MAX),
            details,
            game,
            players,
        });

        i32::from(players_status + engine_status > 0 || !outcome.is_success())
    }

    fn results(&self) -> Option<&MatchResult> {
        self.results.as_ref()
    }
}
