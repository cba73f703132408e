//! Orchestration of a whole run: launching the processes, driving them, reporting the results.
//!
//! A run is either a [`MatchRunner`] (engine + bots playing a game) or a [`ScenarioRunner`]
//! (a scripted list of lines fed to a single bot or engine, used as an input test).

mod match_runner;
mod results;
mod run_config;
mod scenario_runner;

pub use match_runner::MatchRunner;
pub use results::{ErrorMessage, MatchResult, PlayerResult, RunStatus, ScenarioResult, SubjectResult};
pub use run_config::{
    BotConfig, EngineConfig, MatchConfig, RunConfig, RunMode, ScenarioConfig, SubjectConfig,
    SubjectKind, WrapperSettings,
};
pub use scenario_runner::{ScenarioRunner, Subject};

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::Serialize;

/// A kind of run driven by the binary.
pub trait Runner {
    /// The report produced once the run is over.
    type Results: Serialize;

    /// Drives the processes until the run is over. Problems are recorded in the results.
    fn run(&mut self);

    /// Shuts every process down and builds the results. Returns the exit status of the run.
    fn postrun(&mut self, time_elapsed: Duration) -> i32;

    /// Available after [`postrun`](Runner::postrun).
    fn results(&self) -> Option<&Self::Results>;
}

/// Writes `results` as JSON to `path`.
pub fn save_results<T: Serialize>(results: &T, path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string(results).context("could not serialize results")?;
    std::fs::write(path, json).with_context(|| format!("could not write {}", path.display()))
}
