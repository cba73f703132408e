use std::time::Duration;

use anyhow::Context;
use tracing::{info, instrument, warn};

use crate::configuration::Configuration;
use crate::engine::Engine;
use crate::player::Player;
use crate::responder::Responder;

use super::results::{ErrorMessage, RunStatus, ScenarioResult, SubjectResult};
use super::run_config::{ScenarioConfig, SubjectKind};
use super::Runner;

const DEFAULT_SCENARIO_TIMEOUT: Duration = Duration::from_millis(2000);

/// The single process a scenario is fed to.
#[derive(Debug)]
pub enum Subject {
    Bot(Player),
    Engine(Engine),
}

impl Subject {
    fn send(&mut self, line: &str) -> bool {
        match self {
            Subject::Bot(player) => player.send(line),
            Subject::Engine(engine) => engine.send(line),
        }
    }

    fn set_timeout(&mut self, timeout: Duration) {
        match self {
            Subject::Bot(player) => player.set_timebank(timeout),
            Subject::Engine(engine) => engine.set_timeout(timeout),
        }
    }

    /// `None` when the subject did not answer in time.
    fn ask(&mut self, line: &str) -> Option<String> {
        match self {
            Subject::Bot(player) => {
                let timeouts = player.timeouts();
                let response = player.ask(line);
                (player.timeouts() == timeouts).then_some(response)
            }
            Subject::Engine(engine) => {
                let response = engine.ask(line);
                (!response.is_empty()).then_some(response)
            }
        }
    }

    fn finish(&mut self) -> i32 {
        match self {
            Subject::Bot(player) => player.finish(),
            Subject::Engine(engine) => engine.finish(),
        }
    }

    fn result(&self) -> SubjectResult {
        match self {
            Subject::Bot(player) => SubjectResult {
                errors: player.stderr(),
                log: Some(player.dump().to_string()),
            },
            Subject::Engine(engine) => SubjectResult {
                errors: engine.stderr(),
                log: None,
            },
        }
    }
}

/// Feeds a list of lines to a bot or an engine and checks it answers every `action` line in time.
#[derive(Debug)]
pub struct ScenarioRunner {
    subject: Subject,
    scenario: Vec<String>,
    error: Option<String>,
    results: Option<ScenarioResult>,
}

impl ScenarioRunner {
    /// Launches the subject. A bot subject is player 0.
    #[instrument(skip_all, fields(kind = ?scenario_config.subject.kind))]
    pub fn prepare(
        scenario_config: &ScenarioConfig,
        config: Configuration,
    ) -> anyhow::Result<ScenarioRunner> {
        let subject_config = &scenario_config.subject;
        let subject = match subject_config.kind {
            SubjectKind::Bot => Subject::Bot(
                Player::launch(&subject_config.command, 0, config).context("Failed to start bot.")?,
            ),
            SubjectKind::Engine => Subject::Engine(
                Engine::launch(
                    &subject_config.command,
                    subject_config.configuration.to_string(),
                    config,
                )
                .context("Failed to start engine.")?,
            ),
        };
        Ok(ScenarioRunner::new(subject, scenario_config.scenario.clone()))
    }

    pub fn new(subject: Subject, scenario: Vec<String>) -> ScenarioRunner {
        ScenarioRunner {
            subject,
            scenario,
            error: None,
            results: None,
        }
    }

    fn play(&mut self) -> Result<(), String> {
        let timeout = scenario_timeout(&self.scenario);
        for line in &self.scenario {
            if line.is_empty() {
                continue;
            }
            if line.split(' ').next() != Some("action") {
                self.subject.send(line);
                continue;
            }

            // the subject appends its own timebank to the request
            let action = strip_action_time(line);
            self.subject.set_timeout(timeout);
            if self.subject.ask(action).is_none() {
                return Err(format!("Response timed out ({}ms)", timeout.as_millis()));
            }
        }
        Ok(())
    }
}

/// The value of the first `<any> timebank <ms>` line, or 2 seconds.
pub(crate) fn scenario_timeout(scenario: &[String]) -> Duration {
    let timebank = scenario.iter().find_map(|line| {
        let mut split = line.split(' ');
        let _ = split.next();
        if split.next() != Some("timebank") {
            return None;
        }
        split.next()?.parse::<u64>().ok()
    });
    match timebank {
        Some(ms) => Duration::from_millis(ms),
        None => {
            warn!("Failed to read timebank from scenario");
            DEFAULT_SCENARIO_TIMEOUT
        }
    }
}

/// `action move 2000` becomes `action move`; anything else is kept.
pub(crate) fn strip_action_time(action: &str) -> &str {
    let split = action.split(' ').collect::<Vec<_>>();
    if split.len() != 3 || split[2].parse::<i64>().is_err() {
        return action;
    }
    &action[..split[0].len() + 1 + split[1].len()]
}

impl Runner for ScenarioRunner {
    type Results = ScenarioResult;

    fn run(&mut self) {
        if let Err(message) = self.play() {
            warn!("scenario failed: {message}");
            self.error = Some(message);
        } else {
            info!("scenario passed");
        }
    }

    fn postrun(&mut self, _time_elapsed: Duration) -> i32 {
        self.subject.finish();
        let error = self.error.take().map(|message| ErrorMessage { message });
        self.results = Some(ScenarioResult {
            status: if error.is_none() {
                RunStatus::Ok
            } else {
                RunStatus::Error
            },
            subject: self.subject.result(),
            error,
        });
        0
    }

    fn results(&self) -> Option<&ScenarioResult> {
        self.results.as_ref()
    }
}
